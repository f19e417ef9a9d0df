//! Return of a delivery with optional RMA creation.
//!
//! The return wizard flow is split the same way the host splits it: the
//! backend owns pickings, moves, locations and RMA records, while this module
//! decides which location a return may go to and which RMAs it raises.

pub mod backend;
pub mod domain;
pub mod export;
pub mod location;
pub mod memory;
pub(crate) mod policy;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use backend::{RepositoryError, StockBackend};
pub use domain::{
    AddressType, CompanyId, Location, LocationId, MoveId, Partner, PartnerId, Picking, PickingId,
    PickingState, PickingType, PickingTypeCode, PickingTypeId, PickingTypePreference, ProductId,
    ReturnLine, ReturnRequest, ReturnShipment, ReturnShipmentOrder, RmaDraft, RmaId, RmaRecord,
    RmaState, SaleOrder, SaleOrderId, StockMove, UomId, Warehouse, WarehouseId,
};
pub use export::write_rma_csv;
pub use location::{LocationFilter, LocationTree};
pub use memory::InMemoryStock;
pub use policy::LocationOnchange;
pub use router::returns_router;
pub use service::{ReturnOutcome, ReturnServiceError, StockReturnService};

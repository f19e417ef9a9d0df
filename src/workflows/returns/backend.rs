use super::domain::{
    Location, LocationId, MoveId, Partner, PartnerId, Picking, PickingId, PickingType,
    PickingTypeId, ReturnShipment, ReturnShipmentOrder, RmaDraft, RmaId, RmaRecord, SaleOrder,
    SaleOrderId, StockMove, Warehouse, WarehouseId,
};

/// Host document operations the return policy runs against.
///
/// Lookups return `Ok(None)` for missing records; errors are reserved for the
/// host refusing or failing the operation.
pub trait StockBackend: Send + Sync {
    fn picking(&self, id: PickingId) -> Result<Option<Picking>, RepositoryError>;
    fn picking_type(&self, id: PickingTypeId) -> Result<Option<PickingType>, RepositoryError>;
    fn stock_move(&self, id: MoveId) -> Result<Option<StockMove>, RepositoryError>;
    fn moves(&self, picking: PickingId) -> Result<Vec<StockMove>, RepositoryError>;
    fn warehouse(&self, id: WarehouseId) -> Result<Option<Warehouse>, RepositoryError>;
    fn warehouses(&self) -> Result<Vec<Warehouse>, RepositoryError>;
    fn locations(&self) -> Result<Vec<Location>, RepositoryError>;
    fn partner(&self, id: PartnerId) -> Result<Option<Partner>, RepositoryError>;
    fn sale_order(&self, id: SaleOrderId) -> Result<Option<SaleOrder>, RepositoryError>;

    /// Location the return wizard proposes when nothing else is selected.
    fn default_return_location(
        &self,
        picking: &Picking,
    ) -> Result<Option<LocationId>, RepositoryError>;

    /// Invoice address of a partner, falling back to the partner itself.
    fn invoice_address(&self, partner: PartnerId) -> Result<Option<PartnerId>, RepositoryError>;

    fn create_return_shipment(
        &self,
        order: ReturnShipmentOrder<'_>,
    ) -> Result<ReturnShipment, RepositoryError>;

    fn create_rma(&self, draft: RmaDraft) -> Result<RmaRecord, RepositoryError>;

    fn rmas_for_picking(&self, picking: PickingId) -> Result<Vec<RmaRecord>, RepositoryError>;

    /// Remove a return shipment and the RMAs raised against it.
    fn discard_returns(&self, picking: PickingId, rmas: &[RmaId]) -> Result<(), RepositoryError>;
}

/// Error enumeration for backend failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Rejected(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

record_id!(
    /// Customer, vendor, or address contact.
    PartnerId
);
record_id!(PickingId);
record_id!(PickingTypeId);
record_id!(MoveId);
record_id!(LocationId);
record_id!(WarehouseId);
record_id!(ProductId);
record_id!(UomId);
record_id!(CompanyId);
record_id!(SaleOrderId);
record_id!(RmaId);

/// Operation type of a picking, mirrored read-only onto the return request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickingTypeCode {
    Incoming,
    Outgoing,
    Internal,
}

impl PickingTypeCode {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Incoming => "Vendors",
            Self::Outgoing => "Customers",
            Self::Internal => "Internal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickingType {
    pub id: PickingTypeId,
    pub name: String,
    pub code: PickingTypeCode,
    pub warehouse_id: Option<WarehouseId>,
    pub return_picking_type_id: Option<PickingTypeId>,
    pub default_location_src_id: Option<LocationId>,
    pub default_location_dest_id: Option<LocationId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickingState {
    Draft,
    Assigned,
    Done,
    Cancelled,
}

/// Shipment document grouping one or more stock moves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Picking {
    pub id: PickingId,
    pub name: String,
    pub partner_id: Option<PartnerId>,
    pub location_id: LocationId,
    pub location_dest_id: LocationId,
    pub picking_type_id: PickingTypeId,
    pub sale_order_id: Option<SaleOrderId>,
    pub origin: Option<String>,
    pub state: PickingState,
    pub move_ids: Vec<MoveId>,
}

/// Single product-quantity line within a picking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockMove {
    pub id: MoveId,
    pub picking_id: PickingId,
    pub origin_returned_move_id: Option<MoveId>,
    pub product_id: ProductId,
    pub quantity: f64,
    pub uom_id: UomId,
    pub location_id: LocationId,
    pub location_dest_id: LocationId,
    pub company_id: CompanyId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: WarehouseId,
    pub name: String,
    /// Staging location for stock awaiting RMA processing.
    pub rma_location_id: Option<LocationId>,
    /// Receipt type used for returns that raise RMAs.
    pub rma_in_type_id: Option<PickingTypeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub parent_id: Option<LocationId>,
    pub return_location: bool,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressType {
    Contact,
    Invoice,
    Delivery,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partner {
    pub id: PartnerId,
    pub name: String,
    pub parent_id: Option<PartnerId>,
    pub address_type: AddressType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleOrder {
    pub id: SaleOrderId,
    pub name: String,
    pub partner_id: PartnerId,
    pub partner_invoice_id: PartnerId,
}

/// Quantity to send back for one move of the source picking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnLine {
    pub move_id: MoveId,
    pub product_id: ProductId,
    pub quantity: f64,
    #[serde(default)]
    pub to_refund: bool,
}

/// Transient wizard state for a single "return the delivery" action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnRequest {
    pub picking_id: PickingId,
    #[serde(default)]
    pub create_rma: bool,
    pub location_id: Option<LocationId>,
    #[serde(default)]
    pub lines: Vec<ReturnLine>,
    /// Type code of the source picking; filled in when the request is prepared.
    #[serde(skip_deserializing)]
    picking_type_code: Option<PickingTypeCode>,
}

impl ReturnRequest {
    pub fn new(picking_id: PickingId) -> Self {
        Self {
            picking_id,
            create_rma: false,
            location_id: None,
            lines: Vec::new(),
            picking_type_code: None,
        }
    }

    pub fn source_picking_type(&self) -> Option<PickingTypeCode> {
        self.picking_type_code
    }

    pub(crate) fn mirror_picking_type(&mut self, code: PickingTypeCode) {
        self.picking_type_code = Some(code);
    }

    pub fn returned_quantity(&self) -> f64 {
        self.lines.iter().map(|line| line.quantity).sum()
    }
}

/// Whether the host should duplicate the source picking type or switch to the warehouse's RMA receipt type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickingTypePreference {
    Standard,
    Rma,
}

/// Everything the host needs to build the return shipment.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnShipmentOrder<'a> {
    pub source: &'a Picking,
    pub location_id: LocationId,
    pub lines: &'a [ReturnLine],
    pub picking_type: PickingTypePreference,
}

/// Reference to the return shipment the host created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnShipment {
    pub picking_id: PickingId,
    pub picking_type_id: PickingTypeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RmaState {
    Draft,
    Confirmed,
}

impl RmaState {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Confirmed => "confirmed",
        }
    }
}

/// Field values for an RMA that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RmaDraft {
    pub partner_id: PartnerId,
    pub partner_invoice_id: Option<PartnerId>,
    pub origin: String,
    pub picking_id: PickingId,
    pub move_id: Option<MoveId>,
    pub product_id: ProductId,
    pub quantity: f64,
    pub uom_id: UomId,
    pub reception_move_id: MoveId,
    pub company_id: CompanyId,
    pub location_id: LocationId,
    pub state: RmaState,
    pub date: NaiveDateTime,
}

/// Stored RMA as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RmaRecord {
    pub id: RmaId,
    pub name: String,
    #[serde(flatten)]
    pub fields: RmaDraft,
}

impl RmaRecord {
    pub fn state(&self) -> RmaState {
        self.fields.state
    }
}

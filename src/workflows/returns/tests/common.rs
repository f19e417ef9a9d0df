use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::response::Response;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::config::ReturnsConfig;
use crate::workflows::returns::backend::{RepositoryError, StockBackend};
use crate::workflows::returns::domain::{
    AddressType, CompanyId, Location, LocationId, MoveId, Partner, PartnerId, Picking, PickingId,
    PickingState, PickingType, PickingTypeCode, PickingTypeId, ProductId, ReturnShipment,
    ReturnShipmentOrder, RmaDraft, RmaId, RmaRecord, SaleOrder, SaleOrderId, StockMove, UomId,
    Warehouse, WarehouseId,
};
use crate::workflows::returns::memory::InMemoryStock;
use crate::workflows::returns::service::StockReturnService;

pub(super) const WH_STOCK: LocationId = LocationId(2);
pub(super) const WH_RMA: LocationId = LocationId(3);
pub(super) const WH_RMA_QUARANTINE: LocationId = LocationId(4);
pub(super) const CUSTOMERS: LocationId = LocationId(5);
pub(super) const WH_RETURNS: LocationId = LocationId(6);
pub(super) const WH2_RMA: LocationId = LocationId(13);

pub(super) const RECEIPTS: PickingTypeId = PickingTypeId(31);
pub(super) const RMA_RECEIPTS: PickingTypeId = PickingTypeId(33);

pub(super) const ACME: PartnerId = PartnerId(40);
pub(super) const ACME_BILLING: PartnerId = PartnerId(41);
pub(super) const GLOBEX_HQ: PartnerId = PartnerId(44);

/// Delivered to Acme, two lines, no sales order.
pub(super) const ACME_DELIVERY: PickingId = PickingId(60);
/// Internal transfer without a customer.
pub(super) const ANONYMOUS_TRANSFER: PickingId = PickingId(63);
/// Delivered to Globex against SO050.
pub(super) const GLOBEX_DELIVERY: PickingId = PickingId(65);

pub(super) const PRODUCT_A: ProductId = ProductId(70);
pub(super) const PRODUCT_B: ProductId = ProductId(71);

pub(super) fn fixed_clock() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, 2)
        .and_then(|date| date.and_hms_opt(10, 0, 0))
        .expect("valid timestamp")
}

fn location(id: u64, name: &str, parent: Option<u64>, return_location: bool) -> Location {
    Location {
        id: LocationId(id),
        name: name.to_string(),
        parent_id: parent.map(LocationId),
        return_location,
        active: true,
    }
}

fn partner(id: PartnerId, name: &str, parent: Option<PartnerId>, kind: AddressType) -> Partner {
    Partner {
        id,
        name: name.to_string(),
        parent_id: parent,
        address_type: kind,
    }
}

fn delivery_move(id: u64, product: ProductId, quantity: f64) -> StockMove {
    StockMove {
        id: MoveId(id),
        picking_id: PickingId(0),
        origin_returned_move_id: None,
        product_id: product,
        quantity,
        uom_id: UomId(1),
        location_id: WH_STOCK,
        location_dest_id: CUSTOMERS,
        company_id: CompanyId(1),
    }
}

fn delivery(
    id: PickingId,
    name: &str,
    partner: Option<PartnerId>,
    picking_type: u64,
    sale_order: Option<SaleOrderId>,
) -> Picking {
    Picking {
        id,
        name: name.to_string(),
        partner_id: partner,
        location_id: WH_STOCK,
        location_dest_id: CUSTOMERS,
        picking_type_id: PickingTypeId(picking_type),
        sale_order_id: sale_order,
        origin: None,
        state: PickingState::Done,
        move_ids: Vec::new(),
    }
}

/// Two warehouses, each with an RMA staging location, and three done deliveries.
pub(super) fn seeded_stock() -> InMemoryStock {
    let stock = InMemoryStock::default();
    for loc in [
        location(1, "WH", None, false),
        location(2, "WH/Stock", Some(1), false),
        location(3, "WH/RMA", Some(1), false),
        location(4, "WH/RMA/Quarantine", Some(3), false),
        location(5, "Partners/Customers", None, false),
        location(6, "WH/Returns", Some(1), true),
        location(11, "WH2", None, false),
        location(13, "WH2/RMA", Some(11), false),
        location(14, "WH2/Stock", Some(11), false),
    ] {
        stock.insert_location(loc).expect("location stored");
    }

    stock
        .insert_warehouse(Warehouse {
            id: WarehouseId(20),
            name: "Main Warehouse".to_string(),
            rma_location_id: Some(WH_RMA),
            rma_in_type_id: Some(RMA_RECEIPTS),
        })
        .expect("warehouse stored");
    stock
        .insert_warehouse(Warehouse {
            id: WarehouseId(21),
            name: "Overflow".to_string(),
            rma_location_id: Some(WH2_RMA),
            rma_in_type_id: None,
        })
        .expect("warehouse stored");

    for kind in [
        PickingType {
            id: PickingTypeId(30),
            name: "Delivery Orders".to_string(),
            code: PickingTypeCode::Outgoing,
            warehouse_id: Some(WarehouseId(20)),
            return_picking_type_id: Some(RECEIPTS),
            default_location_src_id: Some(WH_STOCK),
            default_location_dest_id: Some(CUSTOMERS),
        },
        PickingType {
            id: RECEIPTS,
            name: "Receipts".to_string(),
            code: PickingTypeCode::Incoming,
            warehouse_id: Some(WarehouseId(20)),
            return_picking_type_id: None,
            default_location_src_id: None,
            default_location_dest_id: Some(WH_RETURNS),
        },
        PickingType {
            id: PickingTypeId(32),
            name: "Internal Transfers".to_string(),
            code: PickingTypeCode::Internal,
            warehouse_id: None,
            return_picking_type_id: None,
            default_location_src_id: Some(WH_STOCK),
            default_location_dest_id: Some(WH_STOCK),
        },
        PickingType {
            id: RMA_RECEIPTS,
            name: "RMA Receipts".to_string(),
            code: PickingTypeCode::Incoming,
            warehouse_id: Some(WarehouseId(20)),
            return_picking_type_id: None,
            default_location_src_id: None,
            default_location_dest_id: Some(WH_RMA),
        },
    ] {
        stock.insert_picking_type(kind).expect("picking type stored");
    }

    for contact in [
        partner(ACME, "Acme", None, AddressType::Contact),
        partner(ACME_BILLING, "Acme, Billing", Some(ACME), AddressType::Invoice),
        partner(PartnerId(42), "Globex", None, AddressType::Contact),
        partner(PartnerId(43), "Globex, Accounts", Some(PartnerId(42)), AddressType::Invoice),
        partner(GLOBEX_HQ, "Globex HQ", None, AddressType::Invoice),
    ] {
        stock.insert_partner(contact).expect("partner stored");
    }

    stock
        .insert_sale_order(SaleOrder {
            id: SaleOrderId(50),
            name: "SO050".to_string(),
            partner_id: PartnerId(42),
            partner_invoice_id: GLOBEX_HQ,
        })
        .expect("sale order stored");

    stock
        .insert_picking(
            delivery(ACME_DELIVERY, "WH/OUT/00001", Some(ACME), 30, None),
            vec![
                delivery_move(61, PRODUCT_A, 10.0),
                delivery_move(62, PRODUCT_B, 5.0),
            ],
        )
        .expect("picking stored");
    stock
        .insert_picking(
            delivery(ANONYMOUS_TRANSFER, "WH/INT/00002", None, 32, None),
            vec![delivery_move(64, PRODUCT_A, 3.0)],
        )
        .expect("picking stored");
    stock
        .insert_picking(
            delivery(
                GLOBEX_DELIVERY,
                "WH/OUT/00003",
                Some(PartnerId(42)),
                30,
                Some(SaleOrderId(50)),
            ),
            vec![delivery_move(66, PRODUCT_B, 2.0)],
        )
        .expect("picking stored");

    stock
}

pub(super) fn build_service() -> (StockReturnService<InMemoryStock>, Arc<InMemoryStock>) {
    build_service_with(ReturnsConfig::default())
}

pub(super) fn build_service_with(
    config: ReturnsConfig,
) -> (StockReturnService<InMemoryStock>, Arc<InMemoryStock>) {
    let stock = Arc::new(seeded_stock());
    let service = StockReturnService::new(stock.clone(), config).with_clock(fixed_clock);
    (service, stock)
}

/// Delegates to the seeded stock but refuses RMA creation after `allowed` successes.
pub(super) struct FlakyRmaBackend {
    pub(super) inner: InMemoryStock,
    allowed: usize,
    created: AtomicUsize,
    discard_fails: bool,
}

impl FlakyRmaBackend {
    pub(super) fn failing_after(allowed: usize) -> Self {
        Self {
            inner: seeded_stock(),
            allowed,
            created: AtomicUsize::new(0),
            discard_fails: false,
        }
    }

    /// Also fail the compensating discard.
    pub(super) fn refusing_discard(mut self) -> Self {
        self.discard_fails = true;
        self
    }
}

impl StockBackend for FlakyRmaBackend {
    fn picking(&self, id: PickingId) -> Result<Option<Picking>, RepositoryError> {
        self.inner.picking(id)
    }

    fn picking_type(&self, id: PickingTypeId) -> Result<Option<PickingType>, RepositoryError> {
        self.inner.picking_type(id)
    }

    fn stock_move(&self, id: MoveId) -> Result<Option<StockMove>, RepositoryError> {
        self.inner.stock_move(id)
    }

    fn moves(&self, picking: PickingId) -> Result<Vec<StockMove>, RepositoryError> {
        self.inner.moves(picking)
    }

    fn warehouse(&self, id: WarehouseId) -> Result<Option<Warehouse>, RepositoryError> {
        self.inner.warehouse(id)
    }

    fn warehouses(&self) -> Result<Vec<Warehouse>, RepositoryError> {
        self.inner.warehouses()
    }

    fn locations(&self) -> Result<Vec<Location>, RepositoryError> {
        self.inner.locations()
    }

    fn partner(&self, id: PartnerId) -> Result<Option<Partner>, RepositoryError> {
        self.inner.partner(id)
    }

    fn sale_order(&self, id: SaleOrderId) -> Result<Option<SaleOrder>, RepositoryError> {
        self.inner.sale_order(id)
    }

    fn default_return_location(
        &self,
        picking: &Picking,
    ) -> Result<Option<LocationId>, RepositoryError> {
        self.inner.default_return_location(picking)
    }

    fn invoice_address(&self, partner: PartnerId) -> Result<Option<PartnerId>, RepositoryError> {
        self.inner.invoice_address(partner)
    }

    fn create_return_shipment(
        &self,
        order: ReturnShipmentOrder<'_>,
    ) -> Result<ReturnShipment, RepositoryError> {
        self.inner.create_return_shipment(order)
    }

    fn create_rma(&self, draft: RmaDraft) -> Result<RmaRecord, RepositoryError> {
        if self.created.fetch_add(1, Ordering::SeqCst) >= self.allowed {
            return Err(RepositoryError::Unavailable("rma table locked".to_string()));
        }
        self.inner.create_rma(draft)
    }

    fn rmas_for_picking(&self, picking: PickingId) -> Result<Vec<RmaRecord>, RepositoryError> {
        self.inner.rmas_for_picking(picking)
    }

    fn discard_returns(&self, picking: PickingId, rmas: &[RmaId]) -> Result<(), RepositoryError> {
        if self.discard_fails {
            return Err(RepositoryError::Unavailable("picking locked".to_string()));
        }
        self.inner.discard_returns(picking, rmas)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

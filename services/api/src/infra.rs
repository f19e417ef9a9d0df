use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use stock_rma::workflows::returns::{
    AddressType, CompanyId, InMemoryStock, Location, LocationId, MoveId, Partner, PartnerId,
    Picking, PickingId, PickingState, PickingType, PickingTypeCode, PickingTypeId, ProductId,
    RepositoryError, StockMove, UomId, Warehouse, WarehouseId,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Delivery returned by the demo commands.
pub(crate) const DEMO_DELIVERY: PickingId = PickingId(60);

fn location(id: u64, name: &str, parent: Option<u64>, return_location: bool) -> Location {
    Location {
        id: LocationId(id),
        name: name.to_string(),
        parent_id: parent.map(LocationId),
        return_location,
        active: true,
    }
}

fn delivered(id: u64, product: u64, quantity: f64) -> StockMove {
    StockMove {
        id: MoveId(id),
        picking_id: DEMO_DELIVERY,
        origin_returned_move_id: None,
        product_id: ProductId(product),
        quantity,
        uom_id: UomId(1),
        location_id: LocationId(2),
        location_dest_id: LocationId(5),
        company_id: CompanyId(1),
    }
}

/// Two warehouses with RMA staging areas and one delivery to Acme
/// (10 units of product 70 and 5 units of product 71).
pub(crate) fn demo_stock() -> Result<InMemoryStock, RepositoryError> {
    let stock = InMemoryStock::default();
    for loc in [
        location(1, "WH", None, false),
        location(2, "WH/Stock", Some(1), false),
        location(3, "WH/RMA", Some(1), false),
        location(5, "Partners/Customers", None, false),
        location(6, "WH/Returns", Some(1), true),
        location(11, "EU", None, false),
        location(13, "EU/RMA", Some(11), false),
    ] {
        stock.insert_location(loc)?;
    }

    stock.insert_warehouse(Warehouse {
        id: WarehouseId(20),
        name: "Main Warehouse".to_string(),
        rma_location_id: Some(LocationId(3)),
        rma_in_type_id: Some(PickingTypeId(33)),
    })?;
    stock.insert_warehouse(Warehouse {
        id: WarehouseId(21),
        name: "EU Warehouse".to_string(),
        rma_location_id: Some(LocationId(13)),
        rma_in_type_id: None,
    })?;

    stock.insert_picking_type(PickingType {
        id: PickingTypeId(30),
        name: "Delivery Orders".to_string(),
        code: PickingTypeCode::Outgoing,
        warehouse_id: Some(WarehouseId(20)),
        return_picking_type_id: Some(PickingTypeId(31)),
        default_location_src_id: Some(LocationId(2)),
        default_location_dest_id: Some(LocationId(5)),
    })?;
    stock.insert_picking_type(PickingType {
        id: PickingTypeId(31),
        name: "Receipts".to_string(),
        code: PickingTypeCode::Incoming,
        warehouse_id: Some(WarehouseId(20)),
        return_picking_type_id: None,
        default_location_src_id: None,
        default_location_dest_id: Some(LocationId(6)),
    })?;
    stock.insert_picking_type(PickingType {
        id: PickingTypeId(33),
        name: "RMA Receipts".to_string(),
        code: PickingTypeCode::Incoming,
        warehouse_id: Some(WarehouseId(20)),
        return_picking_type_id: None,
        default_location_src_id: None,
        default_location_dest_id: Some(LocationId(3)),
    })?;

    stock.insert_partner(Partner {
        id: PartnerId(40),
        name: "Acme".to_string(),
        parent_id: None,
        address_type: AddressType::Contact,
    })?;
    stock.insert_partner(Partner {
        id: PartnerId(41),
        name: "Acme, Accounts Payable".to_string(),
        parent_id: Some(PartnerId(40)),
        address_type: AddressType::Invoice,
    })?;

    stock.insert_picking(
        Picking {
            id: DEMO_DELIVERY,
            name: "WH/OUT/00060".to_string(),
            partner_id: Some(PartnerId(40)),
            location_id: LocationId(2),
            location_dest_id: LocationId(5),
            picking_type_id: PickingTypeId(30),
            sale_order_id: None,
            origin: None,
            state: PickingState::Done,
            move_ids: Vec::new(),
        },
        vec![delivered(61, 70, 10.0), delivered(62, 71, 5.0)],
    )?;

    Ok(stock)
}

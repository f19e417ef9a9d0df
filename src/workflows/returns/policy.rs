use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::domain::{
    LocationId, PartnerId, Picking, RmaDraft, RmaState, SaleOrder, StockMove, Warehouse,
};
use super::location::LocationFilter;

pub(crate) const MISSING_CUSTOMER: &str =
    "Customer must be specified on the source shipment before RMAs can be created.";

pub(crate) const LOCATION_NOT_ALLOWED: &str =
    "The return location is not allowed for this kind of return.";

/// Result of flipping the "create RMA" toggle on a return request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationOnchange {
    pub location_id: Option<LocationId>,
    pub domain: LocationFilter,
}

/// Restricts the return location to the RMA staging subtree of every warehouse.
pub(crate) fn rma_location_filter(warehouses: &[Warehouse]) -> LocationFilter {
    LocationFilter::child_of(
        warehouses
            .iter()
            .filter_map(|warehouse| warehouse.rma_location_id),
    )
}

pub(crate) fn standard_location_filter(source: &Picking) -> LocationFilter {
    LocationFilter::SourceOrReturn {
        source: source.location_id,
    }
}

/// A linked sales order's invoice address wins over the customer's own.
pub(crate) fn resolve_invoice_partner(
    sale_order: Option<&SaleOrder>,
    customer_invoice_address: Option<PartnerId>,
) -> Option<PartnerId> {
    match sale_order {
        Some(order) => Some(order.partner_invoice_id),
        None => customer_invoice_address,
    }
}

/// Shared fields of every RMA raised from one return.
pub(crate) struct RmaContext<'a> {
    pub source: &'a Picking,
    pub partner_id: PartnerId,
    pub partner_invoice_id: Option<PartnerId>,
    pub date: NaiveDateTime,
}

impl RmaContext<'_> {
    /// Links the new receipt line to the outbound line it reverses.
    pub(crate) fn draft_for(
        &self,
        reception: &StockMove,
        origin: Option<&StockMove>,
    ) -> RmaDraft {
        RmaDraft {
            partner_id: self.partner_id,
            partner_invoice_id: self.partner_invoice_id,
            origin: self.source.name.clone(),
            picking_id: self.source.id,
            move_id: reception.origin_returned_move_id,
            product_id: origin
                .map(|origin| origin.product_id)
                .unwrap_or(reception.product_id),
            quantity: reception.quantity,
            uom_id: reception.uom_id,
            reception_move_id: reception.id,
            company_id: reception.company_id,
            location_id: reception.location_dest_id,
            state: RmaState::Confirmed,
            date: self.date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::returns::domain::{
        CompanyId, MoveId, PickingId, PickingState, PickingTypeId, ProductId, SaleOrderId, UomId,
        WarehouseId,
    };
    use chrono::NaiveDate;

    fn warehouse(id: u64, rma_location: Option<u64>) -> Warehouse {
        Warehouse {
            id: WarehouseId(id),
            name: format!("WH{id}"),
            rma_location_id: rma_location.map(LocationId),
            rma_in_type_id: None,
        }
    }

    fn source() -> Picking {
        Picking {
            id: PickingId(10),
            name: "WH/OUT/00010".to_string(),
            partner_id: Some(PartnerId(1)),
            location_id: LocationId(20),
            location_dest_id: LocationId(90),
            picking_type_id: PickingTypeId(2),
            sale_order_id: None,
            origin: None,
            state: PickingState::Done,
            move_ids: vec![MoveId(100)],
        }
    }

    #[test]
    fn rma_filter_skips_warehouses_without_staging_location() {
        let filter = rma_location_filter(&[
            warehouse(1, Some(30)),
            warehouse(2, None),
            warehouse(3, Some(31)),
        ]);
        assert_eq!(
            filter,
            LocationFilter::child_of([LocationId(30), LocationId(31)])
        );
    }

    #[test]
    fn sale_order_invoice_address_takes_precedence() {
        let order = SaleOrder {
            id: SaleOrderId(4),
            name: "SO004".to_string(),
            partner_id: PartnerId(1),
            partner_invoice_id: PartnerId(7),
        };

        assert_eq!(
            resolve_invoice_partner(Some(&order), Some(PartnerId(2))),
            Some(PartnerId(7))
        );
        assert_eq!(
            resolve_invoice_partner(None, Some(PartnerId(2))),
            Some(PartnerId(2))
        );
        assert_eq!(resolve_invoice_partner(None, None), None);
    }

    #[test]
    fn draft_copies_reception_line_and_origin_product() {
        let picking = source();
        let context = RmaContext {
            source: &picking,
            partner_id: PartnerId(1),
            partner_invoice_id: Some(PartnerId(3)),
            date: NaiveDate::from_ymd_opt(2025, 3, 1)
                .and_then(|date| date.and_hms_opt(9, 0, 0))
                .expect("valid timestamp"),
        };
        let origin = StockMove {
            id: MoveId(100),
            picking_id: picking.id,
            origin_returned_move_id: None,
            product_id: ProductId(5),
            quantity: 10.0,
            uom_id: UomId(1),
            location_id: LocationId(20),
            location_dest_id: LocationId(90),
            company_id: CompanyId(1),
        };
        let reception = StockMove {
            id: MoveId(200),
            picking_id: PickingId(11),
            origin_returned_move_id: Some(MoveId(100)),
            product_id: ProductId(5),
            quantity: 4.0,
            uom_id: UomId(1),
            location_id: LocationId(90),
            location_dest_id: LocationId(30),
            company_id: CompanyId(1),
        };

        let draft = context.draft_for(&reception, Some(&origin));
        assert_eq!(draft.origin, "WH/OUT/00010");
        assert_eq!(draft.move_id, Some(MoveId(100)));
        assert_eq!(draft.reception_move_id, MoveId(200));
        assert_eq!(draft.quantity, 4.0);
        assert_eq!(draft.location_id, LocationId(30));
        assert_eq!(draft.state, RmaState::Confirmed);
    }
}

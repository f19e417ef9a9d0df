use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use super::backend::{RepositoryError, StockBackend};
use super::domain::{
    AddressType, Location, LocationId, MoveId, Partner, PartnerId, Picking, PickingId,
    PickingState, PickingType, PickingTypeId, PickingTypePreference, ReturnShipment,
    ReturnShipmentOrder, RmaDraft, RmaId, RmaRecord, SaleOrder, SaleOrderId, StockMove, Warehouse,
    WarehouseId,
};

pub(crate) const EMPTY_RETURN: &str = "Please specify at least one non-zero quantity.";

#[derive(Debug, Default)]
struct StockState {
    next_id: u64,
    return_sequence: u64,
    rma_sequence: u64,
    pickings: BTreeMap<PickingId, Picking>,
    picking_types: BTreeMap<PickingTypeId, PickingType>,
    moves: BTreeMap<MoveId, StockMove>,
    warehouses: BTreeMap<WarehouseId, Warehouse>,
    locations: BTreeMap<LocationId, Location>,
    partners: BTreeMap<PartnerId, Partner>,
    sale_orders: BTreeMap<SaleOrderId, SaleOrder>,
    rmas: BTreeMap<RmaId, RmaRecord>,
}

impl StockState {
    /// Ids are shared across record kinds and start above any seeded id.
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn reserve(&mut self, id: u64) {
        self.next_id = self.next_id.max(id);
    }
}

/// Reference host keeping every document in process memory.
#[derive(Debug, Default)]
pub struct InMemoryStock {
    state: Mutex<StockState>,
}

impl InMemoryStock {
    fn lock(&self) -> Result<MutexGuard<'_, StockState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("stock state poisoned".to_string()))
    }

    pub fn insert_location(&self, location: Location) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        state.reserve(location.id.0);
        state.locations.insert(location.id, location);
        Ok(())
    }

    pub fn insert_warehouse(&self, warehouse: Warehouse) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        state.reserve(warehouse.id.0);
        state.warehouses.insert(warehouse.id, warehouse);
        Ok(())
    }

    pub fn insert_picking_type(&self, picking_type: PickingType) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        state.reserve(picking_type.id.0);
        state.picking_types.insert(picking_type.id, picking_type);
        Ok(())
    }

    pub fn insert_partner(&self, partner: Partner) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        state.reserve(partner.id.0);
        state.partners.insert(partner.id, partner);
        Ok(())
    }

    pub fn insert_sale_order(&self, order: SaleOrder) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        state.reserve(order.id.0);
        state.sale_orders.insert(order.id, order);
        Ok(())
    }

    /// Store a picking together with its moves; `move_ids` is rebuilt from `moves`.
    pub fn insert_picking(
        &self,
        mut picking: Picking,
        moves: Vec<StockMove>,
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        state.reserve(picking.id.0);
        picking.move_ids = moves.iter().map(|stock_move| stock_move.id).collect();
        for mut stock_move in moves {
            state.reserve(stock_move.id.0);
            stock_move.picking_id = picking.id;
            state.moves.insert(stock_move.id, stock_move);
        }
        state.pickings.insert(picking.id, picking);
        Ok(())
    }

    pub fn rmas(&self) -> Result<Vec<RmaRecord>, RepositoryError> {
        Ok(self.lock()?.rmas.values().cloned().collect())
    }

    pub fn picking_count(&self) -> Result<usize, RepositoryError> {
        Ok(self.lock()?.pickings.len())
    }

    pub fn move_count(&self) -> Result<usize, RepositoryError> {
        Ok(self.lock()?.moves.len())
    }
}

impl StockBackend for InMemoryStock {
    fn picking(&self, id: PickingId) -> Result<Option<Picking>, RepositoryError> {
        Ok(self.lock()?.pickings.get(&id).cloned())
    }

    fn picking_type(&self, id: PickingTypeId) -> Result<Option<PickingType>, RepositoryError> {
        Ok(self.lock()?.picking_types.get(&id).cloned())
    }

    fn stock_move(&self, id: MoveId) -> Result<Option<StockMove>, RepositoryError> {
        Ok(self.lock()?.moves.get(&id).cloned())
    }

    fn moves(&self, picking: PickingId) -> Result<Vec<StockMove>, RepositoryError> {
        let state = self.lock()?;
        let Some(document) = state.pickings.get(&picking) else {
            return Ok(Vec::new());
        };
        Ok(document
            .move_ids
            .iter()
            .filter_map(|id| state.moves.get(id).cloned())
            .collect())
    }

    fn warehouse(&self, id: WarehouseId) -> Result<Option<Warehouse>, RepositoryError> {
        Ok(self.lock()?.warehouses.get(&id).cloned())
    }

    fn warehouses(&self) -> Result<Vec<Warehouse>, RepositoryError> {
        Ok(self.lock()?.warehouses.values().cloned().collect())
    }

    fn locations(&self) -> Result<Vec<Location>, RepositoryError> {
        Ok(self
            .lock()?
            .locations
            .values()
            .filter(|location| location.active)
            .cloned()
            .collect())
    }

    fn partner(&self, id: PartnerId) -> Result<Option<Partner>, RepositoryError> {
        Ok(self.lock()?.partners.get(&id).cloned())
    }

    fn sale_order(&self, id: SaleOrderId) -> Result<Option<SaleOrder>, RepositoryError> {
        Ok(self.lock()?.sale_orders.get(&id).cloned())
    }

    fn default_return_location(
        &self,
        picking: &Picking,
    ) -> Result<Option<LocationId>, RepositoryError> {
        let state = self.lock()?;
        let return_destination = state
            .picking_types
            .get(&picking.picking_type_id)
            .and_then(|kind| kind.return_picking_type_id)
            .and_then(|id| state.picking_types.get(&id))
            .and_then(|kind| kind.default_location_dest_id)
            .and_then(|id| state.locations.get(&id))
            .filter(|location| location.return_location)
            .map(|location| location.id);

        Ok(Some(return_destination.unwrap_or(picking.location_id)))
    }

    /// The partner itself when it is an invoice address, else the first invoice
    /// contact among its descendants (nearest generation first), else the partner.
    fn invoice_address(&self, partner: PartnerId) -> Result<Option<PartnerId>, RepositoryError> {
        let state = self.lock()?;
        let Some(root) = state.partners.get(&partner) else {
            return Ok(None);
        };
        if root.address_type == AddressType::Invoice {
            return Ok(Some(partner));
        }

        let mut visited = BTreeSet::from([partner]);
        let mut frontier = vec![partner];
        while !frontier.is_empty() {
            let children: Vec<&Partner> = state
                .partners
                .values()
                .filter(|candidate| {
                    candidate
                        .parent_id
                        .is_some_and(|parent| frontier.contains(&parent))
                        && !visited.contains(&candidate.id)
                })
                .collect();
            if let Some(contact) = children
                .iter()
                .find(|candidate| candidate.address_type == AddressType::Invoice)
            {
                return Ok(Some(contact.id));
            }
            frontier = children.iter().map(|candidate| candidate.id).collect();
            visited.extend(frontier.iter().copied());
        }
        Ok(Some(partner))
    }

    fn create_return_shipment(
        &self,
        order: ReturnShipmentOrder<'_>,
    ) -> Result<ReturnShipment, RepositoryError> {
        let lines: Vec<_> = order
            .lines
            .iter()
            .filter(|line| line.quantity > 0.0)
            .collect();
        if lines.is_empty() {
            return Err(RepositoryError::Rejected(EMPTY_RETURN.to_string()));
        }

        let mut state = self.lock()?;
        let source_type = state
            .picking_types
            .get(&order.source.picking_type_id)
            .cloned()
            .ok_or_else(|| {
                RepositoryError::NotFound(format!("picking type {}", order.source.picking_type_id))
            })?;

        let rma_type = match order.picking_type {
            PickingTypePreference::Rma => source_type
                .warehouse_id
                .and_then(|id| state.warehouses.get(&id))
                .and_then(|warehouse| warehouse.rma_in_type_id),
            PickingTypePreference::Standard => None,
        };
        let picking_type_id = rma_type
            .or(source_type.return_picking_type_id)
            .unwrap_or(source_type.id);

        let mut origins = Vec::with_capacity(lines.len());
        for line in lines {
            let origin = state
                .moves
                .get(&line.move_id)
                .ok_or_else(|| RepositoryError::NotFound(format!("stock move {}", line.move_id)))?;
            if origin.picking_id != order.source.id {
                return Err(RepositoryError::Rejected(format!(
                    "stock move {} does not belong to {}",
                    origin.id, order.source.name
                )));
            }
            origins.push((line.quantity, origin.clone()));
        }

        // Nothing is written until every line has been checked.
        let picking_id = PickingId(state.allocate());
        let mut move_ids = Vec::with_capacity(origins.len());
        for (quantity, origin) in origins {
            let id = MoveId(state.allocate());
            state.moves.insert(
                id,
                StockMove {
                    id,
                    picking_id,
                    origin_returned_move_id: Some(origin.id),
                    product_id: origin.product_id,
                    quantity,
                    uom_id: origin.uom_id,
                    location_id: order.source.location_dest_id,
                    location_dest_id: order.location_id,
                    company_id: origin.company_id,
                },
            );
            move_ids.push(id);
        }

        state.return_sequence += 1;
        let name = format!("RET/{:05}", state.return_sequence);
        state.pickings.insert(
            picking_id,
            Picking {
                id: picking_id,
                name,
                partner_id: order.source.partner_id,
                location_id: order.source.location_dest_id,
                location_dest_id: order.location_id,
                picking_type_id,
                sale_order_id: order.source.sale_order_id,
                origin: Some(format!("Return of {}", order.source.name)),
                state: PickingState::Assigned,
                move_ids,
            },
        );

        Ok(ReturnShipment {
            picking_id,
            picking_type_id,
        })
    }

    fn create_rma(&self, draft: RmaDraft) -> Result<RmaRecord, RepositoryError> {
        let mut state = self.lock()?;
        let id = RmaId(state.allocate());
        state.rma_sequence += 1;
        let record = RmaRecord {
            id,
            name: format!("RMA/{:05}", state.rma_sequence),
            fields: draft,
        };
        state.rmas.insert(id, record.clone());
        Ok(record)
    }

    fn rmas_for_picking(&self, picking: PickingId) -> Result<Vec<RmaRecord>, RepositoryError> {
        Ok(self
            .lock()?
            .rmas
            .values()
            .filter(|rma| rma.fields.picking_id == picking)
            .cloned()
            .collect())
    }

    fn discard_returns(&self, picking: PickingId, rmas: &[RmaId]) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        for id in rmas {
            state.rmas.remove(id);
        }
        if let Some(document) = state.pickings.remove(&picking) {
            for id in &document.move_ids {
                state.moves.remove(id);
            }
        }
        Ok(())
    }
}

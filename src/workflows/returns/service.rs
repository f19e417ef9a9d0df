use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use tracing::{debug, info, warn};

use super::backend::{RepositoryError, StockBackend};
use super::domain::{
    Location, LocationId, Picking, PickingId, PickingTypePreference, ReturnLine, ReturnRequest,
    ReturnShipment, ReturnShipmentOrder, RmaId, RmaRecord,
};
use super::location::{LocationFilter, LocationTree};
use super::policy::{
    resolve_invoice_partner, rma_location_filter, standard_location_filter, LocationOnchange,
    RmaContext, LOCATION_NOT_ALLOWED, MISSING_CUSTOMER,
};
use crate::config::ReturnsConfig;

/// Return-with-RMA workflow layered over a host backend.
pub struct StockReturnService<B> {
    backend: Arc<B>,
    config: ReturnsConfig,
    clock: fn() -> NaiveDateTime,
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Outcome of [`StockReturnService::create_returns`].
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnOutcome {
    pub shipment: ReturnShipment,
    pub rmas: Vec<RmaRecord>,
}

impl<B> StockReturnService<B>
where
    B: StockBackend + 'static,
{
    pub fn new(backend: Arc<B>, config: ReturnsConfig) -> Self {
        Self {
            backend,
            config,
            clock: local_now,
        }
    }

    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Build a fresh request for `picking_id` with one line per move and the default location.
    pub fn prepare(&self, picking_id: PickingId) -> Result<ReturnRequest, ReturnServiceError> {
        let source = self.source_picking(picking_id)?;
        let mut request = ReturnRequest::new(picking_id);
        request.lines = self
            .backend
            .moves(picking_id)?
            .into_iter()
            .map(|stock_move| ReturnLine {
                move_id: stock_move.id,
                product_id: stock_move.product_id,
                quantity: stock_move.quantity,
                to_refund: false,
            })
            .collect();
        self.mirror_picking_type(&mut request, &source)?;

        if self.config.create_rma_by_default {
            request.create_rma = true;
            self.on_toggle_create_rma(&mut request, true)?;
        } else {
            request.location_id = self.backend.default_return_location(&source)?;
        }
        Ok(request)
    }

    /// Apply the "create RMA" toggle, returning the new location and its allowed domain.
    pub fn on_toggle_create_rma(
        &self,
        request: &mut ReturnRequest,
        enabled: bool,
    ) -> Result<LocationOnchange, ReturnServiceError> {
        let source = self.source_picking(request.picking_id)?;
        self.mirror_picking_type(request, &source)?;
        request.create_rma = enabled;

        let domain = if enabled {
            let warehouse = match self.backend.picking_type(source.picking_type_id)? {
                Some(kind) => match kind.warehouse_id {
                    Some(id) => self.backend.warehouse(id)?,
                    None => None,
                },
                None => None,
            };
            request.location_id = warehouse.and_then(|warehouse| warehouse.rma_location_id);
            rma_location_filter(&self.backend.warehouses()?)
        } else {
            request.location_id = self.backend.default_return_location(&source)?;
            standard_location_filter(&source)
        };

        debug!(
            picking = %source.name,
            enabled,
            location = ?request.location_id,
            "create RMA toggled"
        );

        Ok(LocationOnchange {
            location_id: request.location_id,
            domain,
        })
    }

    /// Locations currently selectable for `request`.
    pub fn allowed_locations(
        &self,
        request: &ReturnRequest,
    ) -> Result<Vec<Location>, ReturnServiceError> {
        let source = self.source_picking(request.picking_id)?;
        let domain = self.location_domain(&source, request.create_rma)?;
        let tree = LocationTree::new(self.backend.locations()?);
        Ok(domain.select(&tree).into_iter().cloned().collect())
    }

    /// Create the return shipment and, when requested, one confirmed RMA per returned line.
    pub fn create_returns(
        &self,
        request: &ReturnRequest,
    ) -> Result<ReturnOutcome, ReturnServiceError> {
        let source = self.source_picking(request.picking_id)?;
        let location_id = match request.location_id {
            Some(id) => id,
            None => self.backend.default_return_location(&source)?.ok_or_else(|| {
                ReturnServiceError::Validation("Return location is required.".to_string())
            })?,
        };

        if !request.create_rma {
            self.check_location(&source, location_id, false)?;
            let shipment = self.create_shipment(
                request,
                &source,
                location_id,
                PickingTypePreference::Standard,
            )?;
            return Ok(ReturnOutcome {
                shipment,
                rmas: Vec::new(),
            });
        }

        let partner_id = source
            .partner_id
            .ok_or_else(|| ReturnServiceError::Validation(MISSING_CUSTOMER.to_string()))?;
        self.check_location(&source, location_id, true)?;
        let sale_order = match source.sale_order_id {
            Some(id) => self.backend.sale_order(id)?,
            None => None,
        };
        let customer_invoice = match sale_order {
            Some(_) => None,
            None => self.backend.invoice_address(partner_id)?,
        };
        let context = RmaContext {
            source: &source,
            partner_id,
            partner_invoice_id: resolve_invoice_partner(sale_order.as_ref(), customer_invoice),
            date: (self.clock)(),
        };

        let shipment =
            self.create_shipment(request, &source, location_id, PickingTypePreference::Rma)?;

        let mut created: Vec<RmaRecord> = Vec::new();
        match self.raise_rmas(&context, &shipment, &mut created) {
            Ok(()) => {
                info!(
                    picking = %source.name,
                    return_picking = %shipment.picking_id,
                    rmas = created.len(),
                    "confirmed RMAs raised for return"
                );
                Ok(ReturnOutcome {
                    shipment,
                    rmas: created,
                })
            }
            Err(err) => {
                warn!(
                    picking = %source.name,
                    return_picking = %shipment.picking_id,
                    created = created.len(),
                    error = %err,
                    "RMA creation failed"
                );
                if self.config.compensate_on_failure {
                    let ids: Vec<RmaId> = created.iter().map(|rma| rma.id).collect();
                    if let Err(discard_err) =
                        self.backend.discard_returns(shipment.picking_id, &ids)
                    {
                        warn!(
                            picking = %source.name,
                            return_picking = %shipment.picking_id,
                            error = %discard_err,
                            "could not discard partial return"
                        );
                    }
                }
                Err(err)
            }
        }
    }

    /// Reject a return location outside the domain offered for the current toggle state.
    fn check_location(
        &self,
        source: &Picking,
        location_id: LocationId,
        create_rma: bool,
    ) -> Result<(), ReturnServiceError> {
        let domain = self.location_domain(source, create_rma)?;
        let tree = LocationTree::new(self.backend.locations()?);
        let allowed = tree
            .get(location_id)
            .is_some_and(|location| domain.accepts(location, &tree));
        if !allowed {
            return Err(ReturnServiceError::Validation(format!(
                "{LOCATION_NOT_ALLOWED} ({location_id})"
            )));
        }
        Ok(())
    }

    fn location_domain(
        &self,
        source: &Picking,
        create_rma: bool,
    ) -> Result<LocationFilter, ReturnServiceError> {
        Ok(if create_rma {
            rma_location_filter(&self.backend.warehouses()?)
        } else {
            standard_location_filter(source)
        })
    }

    fn raise_rmas(
        &self,
        context: &RmaContext<'_>,
        shipment: &ReturnShipment,
        created: &mut Vec<RmaRecord>,
    ) -> Result<(), ReturnServiceError> {
        for reception in self.backend.moves(shipment.picking_id)? {
            let origin = match reception.origin_returned_move_id {
                Some(id) => self.backend.stock_move(id)?,
                None => None,
            };
            let rma = self
                .backend
                .create_rma(context.draft_for(&reception, origin.as_ref()))?;
            created.push(rma);
        }
        Ok(())
    }

    fn create_shipment(
        &self,
        request: &ReturnRequest,
        source: &Picking,
        location_id: LocationId,
        picking_type: PickingTypePreference,
    ) -> Result<ReturnShipment, ReturnServiceError> {
        let shipment = self
            .backend
            .create_return_shipment(ReturnShipmentOrder {
                source,
                location_id,
                lines: &request.lines,
                picking_type,
            })
            .map_err(|err| match err {
                RepositoryError::Rejected(message) => ReturnServiceError::Validation(message),
                other => ReturnServiceError::Repository(other),
            })?;
        debug!(
            picking = %source.name,
            return_picking = %shipment.picking_id,
            ?picking_type,
            "return shipment created"
        );
        Ok(shipment)
    }

    /// RMAs raised against a source picking.
    pub fn rmas_for_picking(
        &self,
        picking_id: PickingId,
    ) -> Result<Vec<RmaRecord>, ReturnServiceError> {
        Ok(self.backend.rmas_for_picking(picking_id)?)
    }

    fn source_picking(&self, picking_id: PickingId) -> Result<Picking, ReturnServiceError> {
        self.backend
            .picking(picking_id)?
            .ok_or_else(|| RepositoryError::NotFound(format!("picking {picking_id}")).into())
    }

    fn mirror_picking_type(
        &self,
        request: &mut ReturnRequest,
        source: &Picking,
    ) -> Result<(), ReturnServiceError> {
        if let Some(kind) = self.backend.picking_type(source.picking_type_id)? {
            request.mirror_picking_type(kind.code);
        }
        Ok(())
    }
}

/// Error raised by the return service.
#[derive(Debug, thiserror::Error)]
pub enum ReturnServiceError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

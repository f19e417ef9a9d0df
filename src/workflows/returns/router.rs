use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::backend::StockBackend;
use super::domain::{LocationId, PickingId, ReturnRequest, ReturnShipment, RmaRecord};
use super::location::LocationFilter;
use super::service::StockReturnService;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct ToggleRmaPayload {
    pub request: ReturnRequest,
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct ToggleRmaResponse {
    pub request: ReturnRequest,
    pub location_id: Option<LocationId>,
    pub domain: LocationFilter,
}

#[derive(Debug, Serialize)]
pub struct CreateReturnsResponse {
    #[serde(flatten)]
    pub shipment: ReturnShipment,
    pub rmas: Vec<RmaRecord>,
}

/// Router builder exposing the return wizard over HTTP.
pub fn returns_router<B>(service: Arc<StockReturnService<B>>) -> Router
where
    B: StockBackend + 'static,
{
    Router::new()
        .route(
            "/api/v1/pickings/:picking_id/return",
            get(prepare_handler::<B>),
        )
        .route("/api/v1/pickings/:picking_id/rmas", get(rmas_handler::<B>))
        .route("/api/v1/returns/onchange", post(toggle_handler::<B>))
        .route("/api/v1/returns", post(create_handler::<B>))
        .with_state(service)
}

pub(crate) async fn prepare_handler<B>(
    State(service): State<Arc<StockReturnService<B>>>,
    Path(picking_id): Path<u64>,
) -> Result<Json<ReturnRequest>, AppError>
where
    B: StockBackend + 'static,
{
    let request = service.prepare(PickingId(picking_id))?;
    Ok(Json(request))
}

pub(crate) async fn toggle_handler<B>(
    State(service): State<Arc<StockReturnService<B>>>,
    Json(payload): Json<ToggleRmaPayload>,
) -> Result<Json<ToggleRmaResponse>, AppError>
where
    B: StockBackend + 'static,
{
    let ToggleRmaPayload {
        mut request,
        enabled,
    } = payload;
    let onchange = service.on_toggle_create_rma(&mut request, enabled)?;
    Ok(Json(ToggleRmaResponse {
        request,
        location_id: onchange.location_id,
        domain: onchange.domain,
    }))
}

pub(crate) async fn create_handler<B>(
    State(service): State<Arc<StockReturnService<B>>>,
    Json(request): Json<ReturnRequest>,
) -> Result<(StatusCode, Json<CreateReturnsResponse>), AppError>
where
    B: StockBackend + 'static,
{
    let outcome = service.create_returns(&request)?;
    Ok((
        StatusCode::CREATED,
        Json(CreateReturnsResponse {
            shipment: outcome.shipment,
            rmas: outcome.rmas,
        }),
    ))
}

pub(crate) async fn rmas_handler<B>(
    State(service): State<Arc<StockReturnService<B>>>,
    Path(picking_id): Path<u64>,
) -> Result<Json<Vec<RmaRecord>>, AppError>
where
    B: StockBackend + 'static,
{
    Ok(Json(service.rmas_for_picking(PickingId(picking_id))?))
}

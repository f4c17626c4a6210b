use actix_web::{web, HttpResponse};
use paylink::{
    link, resolver, CreateRequest, CreatedRequest, FulfillmentReport, PaymentService, RequestId,
    ResolveError, ServiceError,
};

use crate::error::ServerError;
use crate::metrics::{lookup_result, REQUEST_LOOKUPS, SETTLEMENT_REPORTS};
use crate::state::AppState;

fn require_tracked<S: PaymentService>(state: &AppState<S>) -> Result<(), ServerError> {
    if state.tracked_available() {
        Ok(())
    } else {
        Err(ServerError::NotConfigured)
    }
}

/// POST /api/requests - Mint a tracked request
pub async fn create_request<S: PaymentService + 'static>(
    body: web::Json<CreateRequest>,
    state: web::Data<AppState<S>>,
) -> Result<HttpResponse, ServerError> {
    require_tracked(&state)?;
    let created = state.service.create_request(&body).await?;

    let base = &state.config.app.app_base_url;
    let link = link::normalize_service_link(base, &created.link)
        .unwrap_or_else(|_| link::tracked_url(base, &created.request_id));
    tracing::info!(request_id = %created.request_id, "tracked request created");

    Ok(HttpResponse::Created().json(CreatedRequest {
        request_id: created.request_id,
        link,
    }))
}

/// GET /api/requests/{id} - Payment details of a tracked request
pub async fn get_request<S: PaymentService + 'static>(
    path: web::Path<String>,
    state: web::Data<AppState<S>>,
) -> Result<HttpResponse, ServerError> {
    let request_id = RequestId::new(&path)?;
    require_tracked(&state)?;

    let result = resolver::resolve_by_identifier(&request_id, &state.service).await;
    let label = lookup_result(&result, |e| {
        matches!(e, ResolveError::LoadFailed(ServiceError::NotFound(_)))
    });
    REQUEST_LOOKUPS.with_label_values(&[label]).inc();

    Ok(HttpResponse::Ok().json(result?))
}

/// POST /api/requests/{id}/fulfillment - Relay a settlement report
pub async fn submit_fulfillment<S: PaymentService + 'static>(
    path: web::Path<String>,
    body: web::Json<FulfillmentReport>,
    state: web::Data<AppState<S>>,
) -> Result<HttpResponse, ServerError> {
    let request_id = RequestId::new(&path)?;
    if body.request_id != request_id {
        return Err(ServerError::BadRequest(
            "requestId in body does not match the path".to_string(),
        ));
    }
    require_tracked(&state)?;

    match state.service.submit_fulfillment(&body).await {
        Ok(()) => {
            SETTLEMENT_REPORTS.with_label_values(&["ok"]).inc();
            tracing::info!(request_id = %request_id, tx_hash = %body.tx_hash, "settlement recorded");
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "status": "recorded",
                "requestId": request_id,
            })))
        }
        Err(e) => {
            SETTLEMENT_REPORTS.with_label_values(&["error"]).inc();
            tracing::error!(request_id = %request_id, error = %e, "settlement relay failed");
            Err(e.into())
        }
    }
}

pub fn configure<S: PaymentService + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/requests", web::post().to(create_request::<S>))
        .route("/api/requests/{id}", web::get().to(get_request::<S>))
        .route(
            "/api/requests/{id}/fulfillment",
            web::post().to(submit_fulfillment::<S>),
        );
}

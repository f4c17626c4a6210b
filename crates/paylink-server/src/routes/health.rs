use actix_web::{web, HttpRequest, HttpResponse};
use paylink::PaymentService;

use crate::metrics::REGISTRY;
use crate::security::bearer_matches;
use crate::state::AppState;

/// GET /health - Health check endpoint
pub async fn health<S: PaymentService + 'static>(state: web::Data<AppState<S>>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "paylink-server",
        "version": env!("CARGO_PKG_VERSION"),
        "linkMode": state.config.app.link_mode,
        "defaultChain": state.config.app.default_chain,
        "trackedRequests": state.tracked_available(),
    }))
}

/// GET /metrics - Prometheus metrics endpoint (optionally auth-gated)
pub async fn metrics<S: PaymentService + 'static>(
    req: HttpRequest,
    state: web::Data<AppState<S>>,
) -> HttpResponse {
    if let Some(ref expected_token) = state.config.metrics_token {
        let header = req
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok());
        if !bearer_matches(header, expected_token) {
            return HttpResponse::Unauthorized().json(serde_json::json!({
                "error": "unauthorized",
                "message": "Valid Bearer token required for /metrics"
            }));
        }
    }

    use prometheus::Encoder;

    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return HttpResponse::InternalServerError().body("Failed to encode metrics");
    }

    let output = String::from_utf8(buffer).unwrap_or_default();
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(output)
}

pub fn configure<S: PaymentService + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::<S>))
        .route("/metrics", web::get().to(metrics::<S>));
}

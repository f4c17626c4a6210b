use actix_web::{web, HttpResponse};
use paylink::{link, resolver, validate, PaymentForm, PaymentService};
use serde::Deserialize;

use crate::error::ServerError;
use crate::metrics::LINKS_CREATED;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LinkQuery {
    pub link: String,
}

/// POST /api/links - Validate a payment form and produce its link
pub async fn create_link<S: PaymentService + 'static>(
    body: web::Json<PaymentForm>,
    state: web::Data<AppState<S>>,
) -> Result<HttpResponse, ServerError> {
    let mut request = validate(&body)?;
    if !request.is_advanced_mode {
        request.chain = state.config.app.default_chain;
    }

    let generated = link::generate(&request, &state.config.app, &state.service).await?;
    LINKS_CREATED
        .with_label_values(&[&generated.mode.to_string()])
        .inc();
    tracing::info!(mode = %generated.mode, path = %generated.path, "payment link created");

    Ok(HttpResponse::Created().json(generated))
}

/// GET /api/links/decode?link= - Decode a link without resolving it
pub async fn decode_link(query: web::Query<LinkQuery>) -> Result<HttpResponse, ServerError> {
    let descriptor = link::decode(&query.link)?;
    Ok(HttpResponse::Ok().json(descriptor))
}

/// GET /api/links/resolve?link= - Payment details for any link
///
/// A link without a chain means [`paylink::DEFAULT_CHAIN`], whatever this
/// server creates new links on.
pub async fn resolve_link<S: PaymentService + 'static>(
    query: web::Query<LinkQuery>,
    state: web::Data<AppState<S>>,
) -> Result<HttpResponse, ServerError> {
    let descriptor = link::decode(&query.link)?;
    if matches!(descriptor, paylink::PaymentDescriptor::ByIdentifier { .. })
        && !state.tracked_available()
    {
        return Err(ServerError::NotConfigured);
    }
    let details = resolver::resolve(&descriptor, &state.service, paylink::DEFAULT_CHAIN).await?;
    Ok(HttpResponse::Ok().json(details))
}

pub fn configure<S: PaymentService + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/links", web::post().to(create_link::<S>))
        .route("/api/links/decode", web::get().to(decode_link))
        .route("/api/links/resolve", web::get().to(resolve_link::<S>));
}

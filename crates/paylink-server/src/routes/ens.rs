use actix_web::{web, HttpResponse};
use paylink::validation::is_ens_name;
use paylink::{ens, PaymentService, ServiceError};

use crate::error::ServerError;
use crate::state::AppState;

/// GET /api/ens/{name} - Address an ENS name points at
pub async fn resolve_name<S: PaymentService + 'static>(
    path: web::Path<String>,
    state: web::Data<AppState<S>>,
) -> Result<HttpResponse, ServerError> {
    let name = path.into_inner().trim().to_lowercase();
    if !is_ens_name(&name) {
        return Err(ServerError::BadRequest(format!("'{name}' is not an ENS name")));
    }

    match ens::resolve_name(&state.ens, &name).await {
        Ok(address) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "name": name,
            "address": address,
        }))),
        Err(ServiceError::NotFound(_)) => Err(ServerError::UnknownName(name)),
        Err(e) => {
            tracing::warn!(name = %name, error = %e, "ENS lookup failed");
            Err(e.into())
        }
    }
}

pub fn configure<S: PaymentService + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/ens/{name}", web::get().to(resolve_name::<S>));
}

pub mod config;
pub mod cors;
pub mod error;
pub mod metrics;
pub mod routes;
pub mod security;
pub mod state;

pub use config::ServerConfig;
pub use error::ServerError;
pub use state::AppState;

use actix_web::web;
use paylink::PaymentService;

/// Mount every API route for a service implementation.
pub fn configure<S: PaymentService + 'static>(cfg: &mut web::ServiceConfig) {
    routes::health::configure::<S>(cfg);
    routes::links::configure::<S>(cfg);
    routes::requests::configure::<S>(cfg);
    routes::ens::configure::<S>(cfg);
}

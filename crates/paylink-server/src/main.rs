use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::{middleware::Logger, web, App, HttpServer};
use paylink::PeanutClient;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use paylink_server::{config::ServerConfig, metrics::register_metrics, state::AppState};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration (.env first, if present)
    let config = ServerConfig::from_env().expect("Failed to load configuration");
    let port = config.port;
    let allowed_origins = config.allowed_origins.clone();
    let rate_limit_rpm = config.rate_limit_rpm;
    let spa_dir = config.spa_dir.clone();

    tracing::info!("Starting paylink-server on port {}", port);
    tracing::info!("Public base URL: {}", config.app.app_base_url);
    tracing::info!(
        "Link mode: {} (default chain {})",
        config.app.link_mode,
        config.app.default_chain
    );
    tracing::info!(
        "Tracked requests: {}",
        if config.app.api_key.is_some() {
            "enabled"
        } else {
            "disabled (PEANUT_API_KEY not set)"
        }
    );

    // Register Prometheus metrics
    register_metrics();

    // Create shared state
    let state_data = web::Data::new(AppState::new(config));

    // Configure rate limiter
    let governor_conf = GovernorConfigBuilder::default()
        .requests_per_minute(rate_limit_rpm as u64)
        .finish()
        .expect("Failed to create rate limiter config");

    if let Some(ref dir) = spa_dir {
        tracing::info!("Serving SPA from: {}", dir);
    }

    HttpServer::new(move || {
        let cors = paylink_server::cors::build_cors(&allowed_origins);

        let mut app = App::new()
            .app_data(state_data.clone())
            .app_data(web::JsonConfig::default().limit(64 * 1024))
            .wrap(Logger::default())
            .wrap(cors)
            .wrap(Governor::new(&governor_conf))
            .configure(paylink_server::configure::<PeanutClient>);

        // Serve SPA static files last (catch-all) so /pay/... deep links load the app
        if let Some(ref dir) = spa_dir {
            let index_path = format!("{}/index.html", dir);
            app = app.service(
                actix_files::Files::new("/", dir)
                    .index_file("index.html")
                    .default_handler(web::to(move || {
                        let path = index_path.clone();
                        async move { actix_files::NamedFile::open_async(path).await }
                    })),
            );
        }

        app
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}

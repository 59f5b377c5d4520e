use std::sync::Arc;

use actix_web::web;
use dotenvy::dotenv;
use storefront_admin::config::AppConfig;
use storefront_admin::domain::pricing::PriceResolver;
use storefront_admin::infrastructure::diesel_store::DieselStore;
use storefront_admin::infrastructure::notifier::LogNotifier;
use storefront_admin::{build_server, create_pool, run_migrations, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().expect("Invalid configuration");

    let pool = create_pool(
        &config.database_url,
        config.pool_size,
        config.connection_timeout,
    )
    .expect("Failed to create database connection pool");
    run_migrations(&pool).expect("Failed to run database migrations");

    let state = web::Data::new(AppState::new(
        Arc::new(DieselStore::new(pool)),
        Arc::new(LogNotifier),
        PriceResolver::new(config.converter.clone()),
        config.limits,
    ));

    log::info!("Starting server at http://{}:{}", config.host, config.port);
    log::info!(
        "API docs at http://{}:{}/swagger-ui/",
        config.host,
        config.port
    );

    build_server(state, &config.host, config.port)?.await
}

use std::io;
use std::sync::Arc;

use actix_web::middleware::from_fn;
use actix_web::{web, App, HttpServer};
use inventory_backend::api::routes::{self, AppState};
use inventory_backend::application::{CategoryCache, CategoryService, ProductService};
use inventory_backend::config::{AppConfig, LoggingConfig};
use inventory_backend::infrastructure::db::{migrations::run_migrations, pool::create_pool};
use inventory_backend::infrastructure::repositories::{
    CategoryRepositoryImpl, ProductRepositoryImpl,
};
use inventory_backend::middleware::request_logging::log_request;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

fn init_tracing(logging: &LoggingConfig) {
    let json_layer = logging.json_format.then(|| {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
    });
    let plain_layer = (!logging.json_format).then(fmt::layer);

    tracing_subscriber::registry()
        .with(EnvFilter::new(logging.level.clone()))
        .with(json_layer)
        .with(plain_layer)
        .init();
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().map_err(|e| io::Error::other(e.to_string()))?;
    config.validate().map_err(io::Error::other)?;

    init_tracing(&config.logging);

    let pool = create_pool(&config.database)
        .await
        .map_err(io::Error::other)?;
    run_migrations(&pool).await.map_err(io::Error::other)?;

    let category_repo = Arc::new(CategoryRepositoryImpl::new(pool.clone()));
    let product_repo = Arc::new(ProductRepositoryImpl::new(pool.clone()));
    let cache = Arc::new(CategoryCache::new(&config.cache));

    let state = AppState {
        category_service: Arc::new(CategoryService::new(category_repo.clone(), cache)),
        product_service: Arc::new(ProductService::new(product_repo, category_repo)),
        app_environment: config.app.environment.clone(),
        db_pool: Some(pool),
    };

    let bind_host = config.app.host.clone();
    let bind_port = config.app.port;
    info!(
        host = %bind_host,
        port = bind_port,
        environment = %state.app_environment,
        "starting inventory service"
    );

    HttpServer::new(move || {
        App::new()
            .wrap(from_fn(log_request))
            .app_data(web::Data::new(state.clone()))
            .configure(routes::configure)
    })
    .bind((bind_host, bind_port))?
    .run()
    .await
}

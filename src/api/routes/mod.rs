use std::sync::Arc;

use actix_web::{web, HttpResponse};
use sqlx::PgPool;

use crate::application::{CategoryService, ProductService};
use crate::error::{AppError, AppResult};

pub mod categories;
pub mod products;

#[derive(Clone)]
pub struct AppState {
    pub category_service: Arc<CategoryService>,
    pub product_service: Arc<ProductService>,
    pub app_environment: String,
    pub db_pool: Option<PgPool>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .service(
            web::scope("/api/v1")
                .configure(categories::configure)
                .configure(products::configure),
        )
        .route("/health", web::get().to(health))
        .route("/ready", web::get().to(ready));
}

/// Extractor failures are reported with the standard JSON error body.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _| AppError::BadRequest(err.to_string()).into())
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _| AppError::BadRequest(err.to_string()).into())
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|err, _| AppError::BadRequest(err.to_string()).into())
}

async fn health() -> &'static str {
    "ok"
}

async fn ready(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let pool = state
        .db_pool
        .as_ref()
        .ok_or_else(|| AppError::ServiceUnavailable {
            service: "database".to_string(),
            message: "Service not ready: no database pool configured".to_string(),
        })?;

    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::ServiceUnavailable {
            service: "database".to_string(),
            message: format!("Service not ready: {e}"),
        })?;
    Ok(HttpResponse::Ok().body("ready"))
}

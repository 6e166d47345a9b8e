use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::api::dtos::{
    CreateProductRequest, CreateSkuRequest, PaginationParams, UpdateProductRequest,
};
use crate::api::routes::AppState;
use crate::error::AppResult;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/products", web::post().to(create_product))
        .route("/products/{id}", web::get().to(get_product))
        .route("/products/{id}", web::put().to(update_product))
        .route("/products/{id}", web::delete().to(delete_product))
        .route("/products/{id}/skus", web::post().to(add_sku))
        .route("/products/{id}/skus", web::get().to(list_skus))
        .route("/skus/{id}", web::delete().to(delete_sku));
}

async fn create_product(
    state: web::Data<AppState>,
    payload: web::Json<CreateProductRequest>,
) -> AppResult<HttpResponse> {
    let result = state
        .product_service
        .create_product(payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(result))
}

async fn get_product(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let result = state.product_service.get_product(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(result))
}

async fn update_product(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    payload: web::Json<UpdateProductRequest>,
) -> AppResult<HttpResponse> {
    let result = state
        .product_service
        .update_product(path.into_inner(), payload.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(result))
}

async fn delete_product(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state
        .product_service
        .delete_product(path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn add_sku(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    payload: web::Json<CreateSkuRequest>,
) -> AppResult<HttpResponse> {
    let result = state
        .product_service
        .add_sku(path.into_inner(), payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(result))
}

async fn list_skus(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let result = state.product_service.list_skus(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(result))
}

async fn delete_sku(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    state.product_service.delete_sku(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Mounted under the `/categories` scope.
pub(super) async fn list_category_products(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<PaginationParams>,
) -> AppResult<HttpResponse> {
    let result = state
        .product_service
        .list_by_category(path.into_inner(), query.page, query.per_page)
        .await?;
    Ok(HttpResponse::Ok().json(result))
}

use actix_web::{web, HttpResponse};
use uuid::Uuid;
use validator::Validate;

use crate::api::dtos::{
    build_category_tree, ActivateCategoryQuery, CategoryDetailResponse, CategoryResponse,
    CategorySearchQuery, CreateCategoryRequest, HierarchyQuery, MoveCategoryRequest,
    PaginatedResponse, UpdateCategoryRequest,
};
use crate::api::routes::AppState;
use crate::application::pagination::normalize_pagination;
use crate::domain::Category;
use crate::error::AppResult;

pub fn configure(cfg: &mut web::ServiceConfig) {
    // Fixed segments go before `/{id}` so they are not parsed as ids.
    cfg.service(
        web::scope("/categories")
            .route("", web::get().to(list_roots))
            .route("", web::post().to(create_category))
            .route("/search", web::get().to(search_categories))
            .route("/hierarchy", web::get().to(get_hierarchy))
            .route("/tree", web::get().to(get_tree))
            .route("/{id}", web::get().to(get_category))
            .route("/{id}", web::put().to(update_category))
            .route("/{id}", web::delete().to(delete_category))
            .route("/{id}/children", web::get().to(get_children))
            .route("/{id}/path", web::get().to(get_path))
            .route(
                "/{id}/products",
                web::get().to(super::products::list_category_products),
            )
            .route("/{id}/move", web::put().to(move_category))
            .route("/{id}/activate", web::post().to(activate_category))
            .route("/{id}/deactivate", web::post().to(deactivate_category)),
    );
}

fn to_responses(categories: Vec<Category>) -> Vec<CategoryResponse> {
    categories.into_iter().map(CategoryResponse::from).collect()
}

async fn list_roots(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let roots = state.category_service.get_root_categories().await?;
    Ok(HttpResponse::Ok().json(to_responses(roots)))
}

async fn create_category(
    state: web::Data<AppState>,
    payload: web::Json<CreateCategoryRequest>,
) -> AppResult<HttpResponse> {
    let payload = payload.into_inner();
    payload.validate()?;
    let (input, parent_id) = payload.into_parts();

    let created = state.category_service.create(input, parent_id).await?;
    Ok(HttpResponse::Created().json(CategoryResponse::from(created)))
}

async fn search_categories(
    state: web::Data<AppState>,
    query: web::Query<CategorySearchQuery>,
) -> AppResult<HttpResponse> {
    let (page, per_page, _) = normalize_pagination(query.page, query.per_page);
    let (items, total) = state
        .category_service
        .search(query.to_params(), page, per_page)
        .await?;

    Ok(HttpResponse::Ok().json(PaginatedResponse::new(
        to_responses(items),
        total,
        page,
        per_page,
    )))
}

async fn get_hierarchy(
    state: web::Data<AppState>,
    query: web::Query<HierarchyQuery>,
) -> AppResult<HttpResponse> {
    let categories = state.category_service.get_hierarchy(query.root_id).await?;
    Ok(HttpResponse::Ok().json(to_responses(categories)))
}

async fn get_tree(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let forest = state.category_service.get_hierarchy(None).await?;
    Ok(HttpResponse::Ok().json(build_category_tree(forest)))
}

async fn get_category(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let category = state.category_service.get_by_id(id).await?;
    let product_count = state.category_service.product_count(id).await?;

    Ok(HttpResponse::Ok().json(CategoryDetailResponse {
        category: category.into(),
        product_count,
    }))
}

async fn update_category(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    payload: web::Json<UpdateCategoryRequest>,
) -> AppResult<HttpResponse> {
    let payload = payload.into_inner();
    payload.validate()?;

    let updated = state
        .category_service
        .update(path.into_inner(), payload.into())
        .await?;
    Ok(HttpResponse::Ok().json(CategoryResponse::from(updated)))
}

async fn delete_category(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state.category_service.delete(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn get_children(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let children = state
        .category_service
        .get_children(path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(to_responses(children)))
}

async fn get_path(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let ancestors = state.category_service.get_path(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(to_responses(ancestors)))
}

async fn move_category(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    payload: web::Json<MoveCategoryRequest>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    state
        .category_service
        .move_category(id, payload.parent_id)
        .await?;

    let moved = state.category_service.get_by_id(id).await?;
    Ok(HttpResponse::Ok().json(CategoryResponse::from(moved)))
}

/// `POST /categories/{id}/activate[?include_children=true]`
///
/// Responds 422 `BUSINESS_RULE_VIOLATION` when the category's parent is inactive;
/// activate the parent first. Without `include_children` only the category itself
/// changes.
async fn activate_category(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<ActivateCategoryQuery>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    state
        .category_service
        .activate(id, query.include_children)
        .await?;

    let category = state.category_service.get_by_id(id).await?;
    Ok(HttpResponse::Ok().json(CategoryResponse::from(category)))
}

async fn deactivate_category(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    state.category_service.deactivate(id).await?;

    let category = state.category_service.get_by_id(id).await?;
    Ok(HttpResponse::Ok().json(CategoryResponse::from(category)))
}

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::test::TestRequest;
use serde_json::json;
use uuid::Uuid;

use crate::common::fixtures::{self, category, inactive};
use crate::common::mock_app_state;
use crate::common::mocks::{MockCategoryRepo, MockProductRepo};
use crate::{json_body, send};

#[actix_rt::test]
async fn create_product_returns_created() {
    let phones = category("Phones", None);
    let category_repo = Arc::new(MockCategoryRepo::with_categories(vec![phones.clone()]));
    let product_repo = Arc::new(MockProductRepo::default());
    let state = mock_app_state(category_repo, product_repo.clone());

    let response = send(
        &state,
        TestRequest::post().uri("/api/v1/products").set_json(json!({
            "category_id": phones.id,
            "name": "Pixel 9",
            "price": "799.00"
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["name"], "Pixel 9");
    assert_eq!(body["price"], "799.00");
    assert_eq!(body["skus"], json!([]));
    let id: Uuid = body["id"].as_str().unwrap().parse().unwrap();
    assert!(product_repo.stored(id).is_some());
}

#[actix_rt::test]
async fn create_product_in_inactive_category_is_unprocessable() {
    let archived = inactive(category("Archived", None));
    let state = mock_app_state(
        Arc::new(MockCategoryRepo::with_categories(vec![archived.clone()])),
        Arc::new(MockProductRepo::default()),
    );

    let response = send(
        &state,
        TestRequest::post().uri("/api/v1/products").set_json(json!({
            "category_id": archived.id,
            "name": "Old Phone",
            "price": "10"
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_rt::test]
async fn product_with_skus_round_trip() {
    let phones = category("Phones", None);
    let product = fixtures::product(phones.id, "Pixel");
    let product_repo = Arc::new(MockProductRepo::default());
    product_repo.push(product.clone());
    let state = mock_app_state(
        Arc::new(MockCategoryRepo::with_categories(vec![phones])),
        product_repo,
    );

    let created = send(
        &state,
        TestRequest::post()
            .uri(&format!("/api/v1/products/{}/skus", product.id))
            .set_json(json!({ "code": "px-128", "price": "19.99" })),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let sku = json_body(created).await;
    assert_eq!(sku["code"], "PX-128");

    let duplicate = send(
        &state,
        TestRequest::post()
            .uri(&format!("/api/v1/products/{}/skus", product.id))
            .set_json(json!({ "code": "PX-128", "price": "19.99" })),
    )
    .await;
    assert_eq!(duplicate.status(), StatusCode::BAD_REQUEST);

    let fetched = send(
        &state,
        TestRequest::get().uri(&format!("/api/v1/products/{}", product.id)),
    )
    .await;
    assert_eq!(fetched.status(), StatusCode::OK);
    let fetched = json_body(fetched).await;
    assert_eq!(fetched["skus"].as_array().unwrap().len(), 1);

    let deleted = send(
        &state,
        TestRequest::delete().uri(&format!("/api/v1/skus/{}", sku["id"].as_str().unwrap())),
    )
    .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let listed = send(
        &state,
        TestRequest::get().uri(&format!("/api/v1/products/{}/skus", product.id)),
    )
    .await;
    assert_eq!(json_body(listed).await, json!([]));
}

#[actix_rt::test]
async fn category_products_are_paginated() {
    let phones = category("Phones", None);
    let product_repo = Arc::new(MockProductRepo::default());
    for name in ["A", "B", "C"] {
        product_repo.push(fixtures::product(phones.id, name));
    }
    let state = mock_app_state(
        Arc::new(MockCategoryRepo::with_categories(vec![phones.clone()])),
        product_repo,
    );

    let response = send(
        &state,
        TestRequest::get().uri(&format!(
            "/api/v1/categories/{}/products?page=1&per_page=2",
            phones.id
        )),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["total"], 3);
    assert_eq!(body["total_pages"], 2);
    assert_eq!(body["items"][0]["name"], "A");
}

#[actix_rt::test]
async fn update_and_delete_product() {
    let phones = category("Phones", None);
    let product = fixtures::product(phones.id, "Pixel");
    let product_repo = Arc::new(MockProductRepo::default());
    product_repo.push(product.clone());
    let state = mock_app_state(
        Arc::new(MockCategoryRepo::with_categories(vec![phones])),
        product_repo.clone(),
    );

    let updated = send(
        &state,
        TestRequest::put()
            .uri(&format!("/api/v1/products/{}", product.id))
            .set_json(json!({ "name": "Pixel Pro", "is_active": false })),
    )
    .await;
    assert_eq!(updated.status(), StatusCode::OK);
    let body = json_body(updated).await;
    assert_eq!(body["name"], "Pixel Pro");
    assert_eq!(body["is_active"], false);
    assert_eq!(body["version"], 1);

    let deleted = send(
        &state,
        TestRequest::delete().uri(&format!("/api/v1/products/{}", product.id)),
    )
    .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
    assert!(product_repo.stored(product.id).unwrap().deleted_at.is_some());

    let missing = send(
        &state,
        TestRequest::get().uri(&format!("/api/v1/products/{}", product.id)),
    )
    .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

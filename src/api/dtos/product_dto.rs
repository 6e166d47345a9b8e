use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::{Product, Sku};

use super::common::default_true;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    pub category_id: Uuid,

    #[validate(length(min = 1, max = 255))]
    pub name: String,

    pub description: Option<String>,

    pub price: Decimal,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProductRequest {
    pub category_id: Option<Uuid>,
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSkuRequest {
    #[validate(length(min = 1, max = 64))]
    pub code: String,
    pub price: Decimal,
    pub attributes: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub is_active: bool,
    pub skus: Vec<SkuResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

impl ProductResponse {
    pub fn from_parts(product: Product, skus: Vec<Sku>) -> Self {
        Self {
            id: product.id,
            category_id: product.category_id,
            name: product.name,
            description: product.description,
            price: product.price,
            is_active: product.is_active,
            skus: skus.into_iter().map(SkuResponse::from).collect(),
            created_at: product.created_at,
            updated_at: product.updated_at,
            version: product.version,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SkuResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub code: String,
    pub price: Decimal,
    pub attributes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Sku> for SkuResponse {
    fn from(sku: Sku) -> Self {
        Self {
            id: sku.id,
            product_id: sku.product_id,
            code: sku.code,
            price: sku.price,
            attributes: sku.attributes,
            is_active: sku.is_active,
            created_at: sku.created_at,
        }
    }
}

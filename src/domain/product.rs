use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::errors::DomainError;

pub const MAX_PRODUCT_NAME_LENGTH: usize = 255;
pub const MAX_SKU_CODE_LENGTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub version: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Sku {
    pub id: Uuid,
    pub product_id: Uuid,
    pub code: String,
    pub price: Decimal,
    pub attributes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

pub fn validate_product_name(raw: &str) -> Result<String, DomainError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(DomainError::invalid("name", "product name must not be empty"));
    }
    if name.chars().count() > MAX_PRODUCT_NAME_LENGTH {
        return Err(DomainError::invalid(
            "name",
            format!("product name must be at most {MAX_PRODUCT_NAME_LENGTH} characters"),
        ));
    }
    Ok(name.to_string())
}

pub fn validate_price(price: Decimal) -> Result<(), DomainError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(DomainError::invalid("price", "must be zero or greater"));
    }
    Ok(())
}

/// SKU codes are compared upper-cased so `abc-1` and `ABC-1` collide.
pub fn normalize_sku_code(raw: &str) -> Result<String, DomainError> {
    let code = raw.trim();
    if code.is_empty() {
        return Err(DomainError::invalid("code", "sku code must not be empty"));
    }
    if code.chars().count() > MAX_SKU_CODE_LENGTH {
        return Err(DomainError::invalid(
            "code",
            format!("sku code must be at most {MAX_SKU_CODE_LENGTH} characters"),
        ));
    }
    if code.chars().any(char::is_whitespace) {
        return Err(DomainError::invalid("code", "sku code must not contain whitespace"));
    }
    Ok(code.to_uppercase())
}

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::api::dtos::{
    CreateProductRequest, CreateSkuRequest, PaginatedResponse, ProductResponse, SkuResponse,
    UpdateProductRequest,
};
use crate::domain::product::{normalize_sku_code, validate_price, validate_product_name};
use crate::domain::{Product, Sku};
use crate::error::{AppError, AppResult};
use crate::infrastructure::repositories::{CategoryRepository, ProductRepository};

use super::pagination::normalize_pagination;

#[derive(Clone)]
pub struct ProductService {
    product_repo: Arc<dyn ProductRepository>,
    category_repo: Arc<dyn CategoryRepository>,
}

impl ProductService {
    pub fn new(
        product_repo: Arc<dyn ProductRepository>,
        category_repo: Arc<dyn CategoryRepository>,
    ) -> Self {
        Self {
            product_repo,
            category_repo,
        }
    }

    pub async fn create_product(&self, payload: CreateProductRequest) -> AppResult<ProductResponse> {
        payload.validate()?;
        let name = validate_product_name(&payload.name)?;
        validate_price(payload.price)?;
        self.ensure_category_accepts_products(payload.category_id)
            .await?;

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            category_id: payload.category_id,
            name,
            description: payload.description,
            price: payload.price,
            is_active: payload.is_active,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            version: 0,
        };

        info!(
            action = "product.create",
            target = %product.id,
            category_id = %product.category_id
        );
        let created = self.product_repo.create(&product).await?;
        Ok(ProductResponse::from_parts(created, Vec::new()))
    }

    pub async fn get_product(&self, id: Uuid) -> AppResult<ProductResponse> {
        let product = self.load_product(id).await?;
        let skus = self.product_repo.find_skus(id).await?;
        Ok(ProductResponse::from_parts(product, skus))
    }

    pub async fn list_by_category(
        &self,
        category_id: Uuid,
        page: i64,
        per_page: i64,
    ) -> AppResult<PaginatedResponse<ProductResponse>> {
        self.category_repo
            .find_by_id(category_id)
            .await?
            .ok_or_else(|| AppError::not_found("category", category_id))?;

        let (page, per_page, offset) = normalize_pagination(page, per_page);
        let products = self
            .product_repo
            .find_by_category(category_id, per_page, offset)
            .await?;
        let total = self.product_repo.count_by_category(category_id).await?;

        let items = products
            .into_iter()
            .map(|product| ProductResponse::from_parts(product, Vec::new()))
            .collect();
        Ok(PaginatedResponse::new(items, total, page, per_page))
    }

    pub async fn update_product(
        &self,
        id: Uuid,
        payload: UpdateProductRequest,
    ) -> AppResult<ProductResponse> {
        payload.validate()?;
        let mut product = self.load_product(id).await?;

        if let Some(category_id) = payload.category_id {
            if category_id != product.category_id {
                self.ensure_category_accepts_products(category_id).await?;
                product.category_id = category_id;
            }
        }
        if let Some(name) = payload.name.as_deref() {
            product.name = validate_product_name(name)?;
        }
        if let Some(description) = payload.description {
            product.description = Some(description);
        }
        if let Some(price) = payload.price {
            validate_price(price)?;
            product.price = price;
        }
        if let Some(is_active) = payload.is_active {
            product.is_active = is_active;
        }

        info!(
            action = "product.update",
            target = %id,
            category_id = %product.category_id
        );
        let updated = self.product_repo.update(&product).await?;
        let skus = self.product_repo.find_skus(id).await?;
        Ok(ProductResponse::from_parts(updated, skus))
    }

    /// Soft-deletes the product and its skus.
    pub async fn delete_product(&self, id: Uuid) -> AppResult<()> {
        self.load_product(id).await?;
        info!(action = "product.delete", target = %id);
        self.product_repo.soft_delete(id).await
    }

    pub async fn add_sku(&self, product_id: Uuid, payload: CreateSkuRequest) -> AppResult<SkuResponse> {
        payload.validate()?;
        self.load_product(product_id).await?;
        let code = normalize_sku_code(&payload.code)?;
        validate_price(payload.price)?;

        if self.product_repo.find_sku_by_code(&code).await?.is_some() {
            return Err(AppError::validation_error(format!(
                "code: a sku with code '{code}' already exists"
            )));
        }

        let now = Utc::now();
        let sku = Sku {
            id: Uuid::new_v4(),
            product_id,
            code,
            price: payload.price,
            attributes: payload.attributes,
            is_active: payload.is_active,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        info!(
            action = "sku.create",
            target = %sku.id,
            product_id = %product_id,
            code = %sku.code
        );
        let created = self.product_repo.create_sku(&sku).await?;
        Ok(created.into())
    }

    pub async fn list_skus(&self, product_id: Uuid) -> AppResult<Vec<SkuResponse>> {
        self.load_product(product_id).await?;
        let skus = self.product_repo.find_skus(product_id).await?;
        Ok(skus.into_iter().map(SkuResponse::from).collect())
    }

    pub async fn delete_sku(&self, id: Uuid) -> AppResult<()> {
        self.product_repo
            .find_sku_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("sku", id))?;
        info!(action = "sku.delete", target = %id);
        self.product_repo.soft_delete_sku(id).await
    }

    async fn load_product(&self, id: Uuid) -> AppResult<Product> {
        self.product_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("product", id))
    }

    async fn ensure_category_accepts_products(&self, category_id: Uuid) -> AppResult<()> {
        let category = self
            .category_repo
            .find_by_id(category_id)
            .await?
            .ok_or_else(|| AppError::not_found("category", category_id))?;

        if !category.is_active {
            return Err(AppError::BusinessRule(format!(
                "category {category_id} is inactive"
            )));
        }
        Ok(())
    }
}

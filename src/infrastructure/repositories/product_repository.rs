use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{Product, Sku};
use crate::error::{AppError, AppResult};

use super::traits::ProductRepository;

const PRODUCT_COLUMNS: &str = "id, category_id, name, description, price, is_active, \
     created_at, updated_at, deleted_at, version";
const SKU_COLUMNS: &str =
    "id, product_id, code, price, attributes, is_active, created_at, updated_at, deleted_at";

pub struct ProductRepositoryImpl {
    pool: PgPool,
}

impl ProductRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for ProductRepositoryImpl {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Product>> {
        let sql =
            format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND deleted_at IS NULL");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    async fn find_by_category(
        &self,
        category_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE category_id = $1 AND deleted_at IS NULL \
             ORDER BY name ASC, created_at ASC \
             LIMIT $2 OFFSET $3"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(category_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    async fn count_by_category(&self, category_id: Uuid) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM products WHERE category_id = $1 AND deleted_at IS NULL",
        )
        .bind(category_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn create(&self, product: &Product) -> AppResult<Product> {
        let sql = format!(
            "INSERT INTO products \
             (id, category_id, name, description, price, is_active, created_at, updated_at, \
              deleted_at, version) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NULL, 0) \
             RETURNING {PRODUCT_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Product>(&sql)
            .bind(product.id)
            .bind(product.category_id)
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.price)
            .bind(product.is_active)
            .bind(product.created_at)
            .bind(product.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn update(&self, product: &Product) -> AppResult<Product> {
        let sql = format!(
            "UPDATE products SET \
             category_id = $2, name = $3, description = $4, price = $5, is_active = $6, \
             updated_at = NOW(), version = version + 1 \
             WHERE id = $1 AND version = $7 AND deleted_at IS NULL \
             RETURNING {PRODUCT_COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(product.id)
            .bind(product.category_id)
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.price)
            .bind(product.is_active)
            .bind(product.version)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| {
                AppError::Conflict(format!("product {} was modified concurrently", product.id))
            })
    }

    async fn soft_delete(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE products SET deleted_at = NOW(), updated_at = NOW(), version = version + 1 \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("product", id));
        }

        sqlx::query(
            "UPDATE skus SET deleted_at = NOW(), updated_at = NOW() \
             WHERE product_id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_skus(&self, product_id: Uuid) -> AppResult<Vec<Sku>> {
        let sql = format!(
            "SELECT {SKU_COLUMNS} FROM skus \
             WHERE product_id = $1 AND deleted_at IS NULL \
             ORDER BY code ASC"
        );
        let skus = sqlx::query_as::<_, Sku>(&sql)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(skus)
    }

    async fn find_sku_by_id(&self, id: Uuid) -> AppResult<Option<Sku>> {
        let sql = format!("SELECT {SKU_COLUMNS} FROM skus WHERE id = $1 AND deleted_at IS NULL");
        let sku = sqlx::query_as::<_, Sku>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(sku)
    }

    async fn find_sku_by_code(&self, code: &str) -> AppResult<Option<Sku>> {
        let sql =
            format!("SELECT {SKU_COLUMNS} FROM skus WHERE code = $1 AND deleted_at IS NULL");
        let sku = sqlx::query_as::<_, Sku>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(sku)
    }

    async fn create_sku(&self, sku: &Sku) -> AppResult<Sku> {
        let sql = format!(
            "INSERT INTO skus \
             (id, product_id, code, price, attributes, is_active, created_at, updated_at, \
              deleted_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NULL) \
             RETURNING {SKU_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Sku>(&sql)
            .bind(sku.id)
            .bind(sku.product_id)
            .bind(&sku.code)
            .bind(sku.price)
            .bind(&sku.attributes)
            .bind(sku.is_active)
            .bind(sku.created_at)
            .bind(sku.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn soft_delete_sku(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE skus SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("sku", id));
        }
        Ok(())
    }
}

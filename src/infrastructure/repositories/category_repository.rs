use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::domain::{Category, CategorySearchParams};
use crate::error::{AppError, AppResult};

use super::traits::CategoryRepository;
use super::utils::{contains_pattern, prefix_pattern};

const CATEGORY_COLUMNS: &str = "id, name, description, parent_id, path, level, sort_order, \
     is_active, metadata, created_at, updated_at, deleted_at, version";

pub struct CategoryRepositoryImpl {
    pool: PgPool,
}

impl CategoryRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_search_filters(builder: &mut QueryBuilder<'_, Postgres>, params: &CategorySearchParams) {
    if let Some(name) = params.name.as_deref() {
        builder.push(" AND name ILIKE ");
        builder.push_bind(contains_pattern(name));
        builder.push(" ESCAPE '\\'");
    }
    if let Some(parent_id) = params.parent_id {
        builder.push(" AND parent_id = ");
        builder.push_bind(parent_id);
    }
    if let Some(level) = params.level {
        builder.push(" AND level = ");
        builder.push_bind(level);
    }
    if let Some(is_active) = params.is_active {
        builder.push(" AND is_active = ");
        builder.push_bind(is_active);
    }
}

#[async_trait]
impl CategoryRepository for CategoryRepositoryImpl {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Category>> {
        let sql =
            format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1 AND deleted_at IS NULL");
        let category = sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(category)
    }

    async fn find_roots(&self) -> AppResult<Vec<Category>> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories \
             WHERE parent_id IS NULL AND deleted_at IS NULL \
             ORDER BY sort_order ASC, name ASC"
        );
        let roots = sqlx::query_as::<_, Category>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(roots)
    }

    async fn find_children(&self, parent_id: Uuid) -> AppResult<Vec<Category>> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories \
             WHERE parent_id = $1 AND deleted_at IS NULL \
             ORDER BY sort_order ASC, name ASC"
        );
        let children = sqlx::query_as::<_, Category>(&sql)
            .bind(parent_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(children)
    }

    async fn find_by_path_prefix(&self, prefix: &str) -> AppResult<Vec<Category>> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories \
             WHERE path LIKE $1 ESCAPE '\\' AND deleted_at IS NULL \
             ORDER BY path ASC"
        );
        let subtree = sqlx::query_as::<_, Category>(&sql)
            .bind(prefix_pattern(prefix))
            .fetch_all(&self.pool)
            .await?;
        Ok(subtree)
    }

    async fn find_by_level(&self, level: i32) -> AppResult<Vec<Category>> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories \
             WHERE level = $1 AND deleted_at IS NULL \
             ORDER BY sort_order ASC, name ASC"
        );
        let categories = sqlx::query_as::<_, Category>(&sql)
            .bind(level)
            .fetch_all(&self.pool)
            .await?;
        Ok(categories)
    }

    async fn find_by_name(
        &self,
        parent_id: Option<Uuid>,
        name: &str,
    ) -> AppResult<Option<Category>> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories \
             WHERE parent_id IS NOT DISTINCT FROM $1 AND name = $2 AND deleted_at IS NULL \
             LIMIT 1"
        );
        let category = sqlx::query_as::<_, Category>(&sql)
            .bind(parent_id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(category)
    }

    async fn find_all_active(&self) -> AppResult<Vec<Category>> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories \
             WHERE is_active = TRUE AND deleted_at IS NULL \
             ORDER BY path ASC"
        );
        let categories = sqlx::query_as::<_, Category>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(categories)
    }

    async fn search(
        &self,
        params: &CategorySearchParams,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Category>> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE deleted_at IS NULL"
        ));
        push_search_filters(&mut builder, params);
        builder.push(" ORDER BY sort_order ASC, name ASC LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        let categories = builder
            .build_query_as::<Category>()
            .fetch_all(&self.pool)
            .await?;
        Ok(categories)
    }

    async fn count_search(&self, params: &CategorySearchParams) -> AppResult<i64> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) AS count FROM categories WHERE deleted_at IS NULL",
        );
        push_search_filters(&mut builder, params);

        let (count,): (i64,) = builder.build_query_as().fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn count_products(&self, category_id: Uuid) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM products WHERE category_id = $1 AND deleted_at IS NULL",
        )
        .bind(category_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn count_products_in(&self, category_ids: &[Uuid]) -> AppResult<i64> {
        if category_ids.is_empty() {
            return Ok(0);
        }
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM products WHERE category_id = ANY($1) AND deleted_at IS NULL",
        )
        .bind(category_ids)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn create(&self, category: &Category) -> AppResult<Category> {
        let sql = format!(
            "INSERT INTO categories \
             (id, name, description, parent_id, path, level, sort_order, is_active, metadata, \
              created_at, updated_at, deleted_at, version) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NULL, 0) \
             RETURNING {CATEGORY_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Category>(&sql)
            .bind(category.id)
            .bind(&category.name)
            .bind(&category.description)
            .bind(category.parent_id)
            .bind(&category.path)
            .bind(category.level)
            .bind(category.sort_order)
            .bind(category.is_active)
            .bind(&category.metadata)
            .bind(category.created_at)
            .bind(category.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn save_all(
        &self,
        categories: &[Category],
        guards: &[Category],
    ) -> AppResult<Vec<Category>> {
        let sql = format!(
            "UPDATE categories SET \
             name = $2, description = $3, parent_id = $4, path = $5, level = $6, \
             sort_order = $7, is_active = $8, metadata = $9, deleted_at = $10, \
             updated_at = NOW(), version = version + 1 \
             WHERE id = $1 AND version = $11 \
             RETURNING {CATEGORY_COLUMNS}"
        );

        let mut tx = self.pool.begin().await?;

        for guard in guards {
            let locked = sqlx::query_scalar::<_, Uuid>(
                "SELECT id FROM categories \
                 WHERE id = $1 AND version = $2 AND deleted_at IS NULL \
                 FOR UPDATE",
            )
            .bind(guard.id)
            .bind(guard.version)
            .fetch_optional(&mut *tx)
            .await?;

            if locked.is_none() {
                return Err(AppError::Conflict(format!(
                    "category {} was modified concurrently",
                    guard.id
                )));
            }
        }

        let mut saved = Vec::with_capacity(categories.len());
        for category in categories {
            let row = sqlx::query_as::<_, Category>(&sql)
                .bind(category.id)
                .bind(&category.name)
                .bind(&category.description)
                .bind(category.parent_id)
                .bind(&category.path)
                .bind(category.level)
                .bind(category.sort_order)
                .bind(category.is_active)
                .bind(&category.metadata)
                .bind(category.deleted_at)
                .bind(category.version)
                .fetch_optional(&mut *tx)
                .await?;

            // Dropping `tx` on the early return rolls the whole batch back.
            let Some(row) = row else {
                return Err(AppError::Conflict(format!(
                    "category {} was modified concurrently",
                    category.id
                )));
            };
            saved.push(row);
        }
        tx.commit().await?;

        Ok(saved)
    }
}

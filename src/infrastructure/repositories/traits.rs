use crate::domain::{Category, CategorySearchParams, Product, Sku};
use crate::error::AppResult;
use async_trait::async_trait;
use uuid::Uuid;

/// Storage for the category forest.
///
/// Every finder is scoped to rows whose `deleted_at` is unset. List finders order by
/// `sort_order, name` except the path-based ones, which order by `path`.
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Category>>;
    async fn find_roots(&self) -> AppResult<Vec<Category>>;
    async fn find_children(&self, parent_id: Uuid) -> AppResult<Vec<Category>>;
    /// Rows whose path starts with `prefix`, the owner of the prefix included.
    async fn find_by_path_prefix(&self, prefix: &str) -> AppResult<Vec<Category>>;
    async fn find_by_level(&self, level: i32) -> AppResult<Vec<Category>>;
    /// Exact-name lookup among the siblings under `parent_id` (roots when `None`).
    async fn find_by_name(
        &self,
        parent_id: Option<Uuid>,
        name: &str,
    ) -> AppResult<Option<Category>>;
    /// Active rows across the whole forest, ordered by path.
    async fn find_all_active(&self) -> AppResult<Vec<Category>>;
    async fn search(
        &self,
        params: &CategorySearchParams,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Category>>;
    async fn count_search(&self, params: &CategorySearchParams) -> AppResult<i64> {
        const PAGE_SIZE: i64 = 1_000;

        let mut total = 0_i64;
        let mut offset = 0_i64;
        loop {
            let items = self.search(params, PAGE_SIZE, offset).await?;
            let count = items.len() as i64;
            total = total.saturating_add(count);

            if count < PAGE_SIZE || offset > i64::MAX - PAGE_SIZE {
                break;
            }
            offset += PAGE_SIZE;
        }

        Ok(total)
    }
    /// Non-deleted products attached directly to the category.
    async fn count_products(&self, category_id: Uuid) -> AppResult<i64>;
    async fn count_products_in(&self, category_ids: &[Uuid]) -> AppResult<i64> {
        let mut total = 0_i64;
        for category_id in category_ids {
            total = total.saturating_add(self.count_products(*category_id).await?);
        }
        Ok(total)
    }
    async fn create(&self, category: &Category) -> AppResult<Category>;
    /// Persists every row in one transaction. Each row must still carry the
    /// stored `version`; a stale row aborts the whole batch with `Conflict`.
    ///
    /// `guards` are rows the caller read to decide the write is legal (a move's new
    /// ancestor chain). They are not written, but are locked and version-checked in
    /// the same transaction, so a concurrent change to any of them is a `Conflict`.
    async fn save_all(
        &self,
        categories: &[Category],
        guards: &[Category],
    ) -> AppResult<Vec<Category>>;
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Product>>;
    async fn find_by_category(
        &self,
        category_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Product>>;
    async fn count_by_category(&self, category_id: Uuid) -> AppResult<i64>;
    async fn create(&self, product: &Product) -> AppResult<Product>;
    async fn update(&self, product: &Product) -> AppResult<Product>;
    /// Soft-deletes the product together with its skus.
    async fn soft_delete(&self, id: Uuid) -> AppResult<()>;

    async fn find_skus(&self, product_id: Uuid) -> AppResult<Vec<Sku>>;
    async fn find_sku_by_id(&self, id: Uuid) -> AppResult<Option<Sku>>;
    async fn find_sku_by_code(&self, code: &str) -> AppResult<Option<Sku>>;
    async fn create_sku(&self, sku: &Sku) -> AppResult<Sku>;
    async fn soft_delete_sku(&self, id: Uuid) -> AppResult<()>;
}

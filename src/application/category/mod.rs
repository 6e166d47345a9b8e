use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::domain::category::{validate_category_name, validate_depth, validate_sort_order};
use crate::domain::{Category, CategoryPatch, CategorySearchParams, NewCategory};
use crate::error::{AppError, AppResult};
use crate::infrastructure::repositories::CategoryRepository;

use super::pagination::normalize_pagination;

pub mod cache;
pub mod tree;
pub mod validation;

pub use cache::{CategoryCache, CategoryView};

/// Rows a move writes, and the rows its legality was judged on.
struct MovePlan {
    /// The moved node first, then its descendants with repaired paths.
    rows: Vec<Category>,
    /// The new ancestor chain, candidate parent first. Version-checked, never written.
    guards: Vec<Category>,
}

/// Owns the category forest: placement, moves, cascades and hierarchy reads.
#[derive(Clone)]
pub struct CategoryService {
    category_repo: Arc<dyn CategoryRepository>,
    cache: Arc<CategoryCache>,
}

impl CategoryService {
    pub fn new(category_repo: Arc<dyn CategoryRepository>, cache: Arc<CategoryCache>) -> Self {
        Self {
            category_repo,
            cache,
        }
    }

    pub async fn create(&self, input: NewCategory, parent_id: Option<Uuid>) -> AppResult<Category> {
        let name = validate_category_name(&input.name)?;
        validate_sort_order(input.sort_order)?;

        let parent = match parent_id {
            Some(parent_id) => {
                let parent = validation::load_parent(&*self.category_repo, parent_id).await?;
                validation::ensure_parent_active(&parent)?;
                validate_depth(parent.level + 1)?;
                Some(parent)
            }
            None => None,
        };
        validation::ensure_unique_sibling_name(&*self.category_repo, parent_id, &name, None)
            .await?;

        let id = Uuid::new_v4();
        let now = Utc::now();
        let mut category = Category {
            id,
            name,
            description: input.description,
            parent_id: None,
            path: String::new(),
            level: 0,
            sort_order: input.sort_order,
            is_active: input.is_active,
            metadata: input.metadata,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            version: 0,
        };
        category.place_under(parent.as_ref());

        info!(
            action = "category.create",
            target = %id,
            name = %category.name,
            parent_id = ?parent_id,
            level = category.level
        );
        let created = self.category_repo.create(&category).await?;
        self.cache.invalidate();

        Ok(created)
    }

    pub async fn update(&self, id: Uuid, patch: CategoryPatch) -> AppResult<Category> {
        let current = self.get_by_id(id).await?;
        if patch.is_empty() {
            return Ok(current);
        }

        let name = match patch.name.as_deref() {
            Some(raw) => validate_category_name(raw)?,
            None => current.name.clone(),
        };
        if let Some(sort_order) = patch.sort_order {
            validate_sort_order(sort_order)?;
        }

        let new_parent_id = patch
            .parent_id
            .filter(|requested| *requested != current.parent_id);

        let MovePlan {
            rows: mut batch,
            guards,
        } = match new_parent_id {
            Some(new_parent_id) => self.plan_move(current, new_parent_id, &name).await?,
            None => {
                if name != current.name {
                    validation::ensure_unique_sibling_name(
                        &*self.category_repo,
                        current.parent_id,
                        &name,
                        Some(id),
                    )
                    .await?;
                }
                MovePlan {
                    rows: vec![current],
                    guards: Vec::new(),
                }
            }
        };

        if let Some(node) = batch.first_mut() {
            node.name = name;
            if let Some(description) = patch.description {
                node.description = Some(description);
            }
            if let Some(sort_order) = patch.sort_order {
                node.sort_order = sort_order;
            }
            if let Some(metadata) = patch.metadata {
                node.metadata = Some(metadata);
            }
        }

        info!(
            action = "category.update",
            target = %id,
            moved = new_parent_id.is_some(),
            rows = batch.len()
        );
        let saved = self.category_repo.save_all(&batch, &guards).await?;
        self.cache.invalidate();

        saved
            .into_iter()
            .next()
            .ok_or_else(|| AppError::not_found("category", id))
    }

    pub async fn move_category(&self, id: Uuid, new_parent_id: Option<Uuid>) -> AppResult<()> {
        let category = self.get_by_id(id).await?;
        let previous_parent_id = category.parent_id;
        let name = category.name.clone();

        let plan = self.plan_move(category, new_parent_id, &name).await?;

        info!(
            action = "category.move",
            target = %id,
            from = ?previous_parent_id,
            to = ?new_parent_id,
            descendants = plan.rows.len().saturating_sub(1)
        );
        self.category_repo
            .save_all(&plan.rows, &plan.guards)
            .await?;
        self.cache.invalidate();

        Ok(())
    }

    /// Soft-deletes the category and its whole subtree.
    ///
    /// Refused while the category or any descendant still holds products.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let category = self.get_by_id(id).await?;

        if self.category_repo.count_products(id).await? > 0 {
            return Err(AppError::BusinessRule(
                "cannot delete: category has products".to_string(),
            ));
        }

        let descendant_ids = self
            .category_repo
            .find_by_path_prefix(&category.path)
            .await?
            .into_iter()
            .filter(|descendant| descendant.id != id)
            .map(|descendant| descendant.id)
            .collect::<Vec<_>>();
        if self.category_repo.count_products_in(&descendant_ids).await? > 0 {
            return Err(AppError::BusinessRule(
                "cannot delete: a descendant category has products".to_string(),
            ));
        }

        let mut subtree = tree::collect_subtree(&*self.category_repo, category).await?;
        let deleted_at = Utc::now();
        for node in subtree.iter_mut() {
            node.deleted_at = Some(deleted_at);
        }

        info!(
            action = "category.delete",
            target = %id,
            rows = subtree.len()
        );
        self.category_repo.save_all(&subtree, &[]).await?;
        self.cache.invalidate();

        Ok(())
    }

    /// Activates the category, and its descendants when `include_children` is set.
    ///
    /// A category under an inactive parent cannot be activated.
    pub async fn activate(&self, id: Uuid, include_children: bool) -> AppResult<()> {
        let category = self.get_by_id(id).await?;

        if let Some(parent_id) = category.parent_id {
            if let Some(parent) = self.category_repo.find_by_id(parent_id).await? {
                validation::ensure_parent_active(&parent)?;
            }
        }

        let targets = if include_children {
            tree::collect_subtree(&*self.category_repo, category).await?
        } else {
            vec![category]
        };

        self.set_active(id, targets, true, "category.activate")
            .await
    }

    /// Deactivates the category together with every descendant.
    pub async fn deactivate(&self, id: Uuid) -> AppResult<()> {
        let category = self.get_by_id(id).await?;
        let subtree = tree::collect_subtree(&*self.category_repo, category).await?;

        self.set_active(id, subtree, false, "category.deactivate")
            .await
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Category> {
        self.category_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("category", id))
    }

    pub async fn get_root_categories(&self) -> AppResult<Vec<Category>> {
        let roots = self
            .cache
            .get_or_load(CategoryView::Roots, || self.category_repo.find_roots())
            .await?;
        Ok(roots.as_ref().clone())
    }

    pub async fn get_children(&self, parent_id: Uuid) -> AppResult<Vec<Category>> {
        self.get_by_id(parent_id).await?;
        self.category_repo.find_children(parent_id).await
    }

    /// Ancestors of `id` from the root down, `id` included.
    ///
    /// Built from parent pointers. A missing or deleted ancestor cuts the path short.
    pub async fn get_path(&self, id: Uuid) -> AppResult<Vec<Category>> {
        let category = self.get_by_id(id).await?;

        let mut seen = std::collections::HashSet::from([category.id]);
        let mut cursor = category.parent_id;
        let mut path = vec![category];

        while let Some(parent_id) = cursor {
            if !seen.insert(parent_id) {
                break;
            }
            let Some(parent) = self.category_repo.find_by_id(parent_id).await? else {
                break;
            };
            cursor = parent.parent_id;
            path.push(parent);
        }

        path.reverse();
        Ok(path)
    }

    /// The subtree under `root_id` (root included), or every active category when omitted.
    pub async fn get_hierarchy(&self, root_id: Option<Uuid>) -> AppResult<Vec<Category>> {
        match root_id {
            Some(root_id) => {
                let root = self.get_by_id(root_id).await?;
                self.category_repo.find_by_path_prefix(&root.path).await
            }
            None => {
                let forest = self
                    .cache
                    .get_or_load(CategoryView::Forest, || {
                        self.category_repo.find_all_active()
                    })
                    .await?;
                Ok(forest.as_ref().clone())
            }
        }
    }

    /// Filtered, paginated search. Returns the page and the total match count.
    pub async fn search(
        &self,
        mut params: CategorySearchParams,
        page: i64,
        per_page: i64,
    ) -> AppResult<(Vec<Category>, i64)> {
        params.name = params
            .name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        let (_, per_page, offset) = normalize_pagination(page, per_page);
        let items = self
            .category_repo
            .search(&params, per_page, offset)
            .await?;
        let total = self.category_repo.count_search(&params).await?;

        Ok((items, total))
    }

    pub async fn get_by_level(&self, level: i32) -> AppResult<Vec<Category>> {
        if level < 0 {
            return Err(AppError::validation_error(
                "level: must be zero or greater",
            ));
        }
        self.category_repo.find_by_level(level).await
    }

    pub async fn product_count(&self, id: Uuid) -> AppResult<i64> {
        self.get_by_id(id).await?;
        self.category_repo.count_products(id).await
    }

    /// Validates a move of `category` under `new_parent_id`.
    async fn plan_move(
        &self,
        category: Category,
        new_parent_id: Option<Uuid>,
        name: &str,
    ) -> AppResult<MovePlan> {
        let guards = match new_parent_id {
            Some(parent_id) => {
                validation::ensure_not_descendant(&*self.category_repo, category.id, parent_id)
                    .await?
            }
            None => Vec::new(),
        };
        // The parent is placed from the same read its version is pinned at.
        let new_parent = match new_parent_id {
            Some(parent_id) => {
                let parent = guards
                    .first()
                    .cloned()
                    .ok_or_else(|| AppError::not_found("parent category", parent_id))?;
                validation::ensure_parent_active(&parent)?;
                Some(parent)
            }
            None => None,
        };

        let subtree = self
            .category_repo
            .find_by_path_prefix(&category.path)
            .await?;
        let new_level = new_parent.as_ref().map_or(0, |parent| parent.level + 1);
        validate_depth(new_level + tree::subtree_height(&category, &subtree))?;

        validation::ensure_unique_sibling_name(
            &*self.category_repo,
            new_parent_id,
            name,
            Some(category.id),
        )
        .await?;

        let mut moved = category;
        moved.place_under(new_parent.as_ref());
        let descendants = subtree
            .into_iter()
            .filter(|descendant| descendant.id != moved.id)
            .collect::<Vec<_>>();
        let repaired = tree::repair_descendants(&moved, descendants);

        let mut batch = Vec::with_capacity(repaired.len() + 1);
        batch.push(moved);
        batch.extend(repaired);
        Ok(MovePlan {
            rows: batch,
            guards,
        })
    }

    async fn set_active(
        &self,
        id: Uuid,
        targets: Vec<Category>,
        is_active: bool,
        action: &'static str,
    ) -> AppResult<()> {
        let changed = targets
            .into_iter()
            .filter(|category| category.is_active != is_active)
            .map(|mut category| {
                category.is_active = is_active;
                category
            })
            .collect::<Vec<_>>();

        info!(action = action, target = %id, rows = changed.len());
        if changed.is_empty() {
            return Ok(());
        }

        self.category_repo.save_all(&changed, &[]).await?;
        self.cache.invalidate();
        Ok(())
    }
}

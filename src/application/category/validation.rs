use std::collections::HashSet;

use uuid::Uuid;

use crate::domain::Category;
use crate::error::{AppError, AppResult};
use crate::infrastructure::repositories::CategoryRepository;

pub async fn load_parent(
    category_repo: &dyn CategoryRepository,
    parent_id: Uuid,
) -> AppResult<Category> {
    category_repo
        .find_by_id(parent_id)
        .await?
        .ok_or_else(|| AppError::not_found("parent category", parent_id))
}

pub fn ensure_parent_active(parent: &Category) -> AppResult<()> {
    if !parent.is_active {
        return Err(AppError::BusinessRule(format!(
            "parent category {} is inactive",
            parent.id
        )));
    }
    Ok(())
}

/// Rejects placing `category_id` under `parent_id` when the parent is the node itself
/// or one of its descendants. Walks parent pointers from the candidate up to a root.
///
/// Returns the ancestors it read, candidate parent first, so the caller can pin
/// their versions when it writes.
pub async fn ensure_not_descendant(
    category_repo: &dyn CategoryRepository,
    category_id: Uuid,
    parent_id: Uuid,
) -> AppResult<Vec<Category>> {
    if parent_id == category_id {
        return Err(AppError::validation_error(
            "parent_id: category cannot be its own parent",
        ));
    }

    let mut visited = HashSet::new();
    let mut chain = Vec::new();
    let mut cursor = parent_id;

    loop {
        if !visited.insert(cursor) {
            return Err(AppError::validation_error(
                "parent_id: category hierarchy contains a cycle",
            ));
        }

        // A missing or deleted ancestor ends the chain.
        let Some(ancestor) = category_repo.find_by_id(cursor).await? else {
            return Ok(chain);
        };

        if ancestor.id == category_id {
            return Err(AppError::validation_error(
                "parent_id: moving a category under its own descendant would create a cycle",
            ));
        }

        let next_cursor = ancestor.parent_id;
        chain.push(ancestor);
        let Some(next_cursor) = next_cursor else {
            return Ok(chain);
        };
        cursor = next_cursor;
    }
}

/// Fails when a non-deleted sibling other than `exclude_id` already uses `name`.
pub async fn ensure_unique_sibling_name(
    category_repo: &dyn CategoryRepository,
    parent_id: Option<Uuid>,
    name: &str,
    exclude_id: Option<Uuid>,
) -> AppResult<()> {
    let existing = category_repo.find_by_name(parent_id, name).await?;
    match existing {
        Some(sibling) if Some(sibling.id) != exclude_id => {
            let scope = if parent_id.is_some() {
                "under the same parent"
            } else {
                "at the root level"
            };
            Err(AppError::validation_error(format!(
                "name: a category named '{name}' already exists {scope}"
            )))
        }
        _ => Ok(()),
    }
}

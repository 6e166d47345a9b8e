use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::errors::DomainError;

/// Deepest level a category may occupy. Roots are level 0.
pub const MAX_CATEGORY_DEPTH: i32 = 10;
pub const MAX_CATEGORY_NAME_LENGTH: usize = 255;
pub const FORBIDDEN_NAME_CHARACTERS: &[char] = &['<', '>', '&', '"', '\'', '/', '\\'];

/// A node in the category forest.
///
/// `parent_id` is the source of truth for ancestry. `path` and `level` are
/// derived from it and must be recomputed whenever the parent chain changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    pub path: String,
    pub level: i32,
    pub sort_order: i32,
    pub is_active: bool,
    pub metadata: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub version: i64,
}

impl Category {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// True when `self` sits strictly below the node owning `ancestor_path`.
    pub fn is_descendant_path_of(&self, ancestor_path: &str) -> bool {
        self.path.len() > ancestor_path.len() && self.path.starts_with(ancestor_path)
    }

    /// Re-derives `level` and `path` from the given parent (or as a root).
    pub fn place_under(&mut self, parent: Option<&Category>) {
        match parent {
            Some(parent) => {
                self.parent_id = Some(parent.id);
                self.level = parent.level + 1;
                self.path = child_path(&parent.path, self.id);
            }
            None => {
                self.parent_id = None;
                self.level = 0;
                self.path = root_path(self.id);
            }
        }
    }
}

/// Attributes accepted when creating a category. The parent is supplied separately.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
    pub metadata: Option<String>,
}

/// Partial update. Absent fields are left untouched.
///
/// `parent_id` distinguishes "not mentioned" (`None`) from "move to root" (`Some(None)`).
#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
    pub metadata: Option<String>,
    pub parent_id: Option<Option<Uuid>>,
}

impl CategoryPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.sort_order.is_none()
            && self.metadata.is_none()
            && self.parent_id.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CategorySearchParams {
    pub name: Option<String>,
    pub parent_id: Option<Uuid>,
    pub level: Option<i32>,
    pub is_active: Option<bool>,
}

pub fn root_path(id: Uuid) -> String {
    format!("/{id}/")
}

pub fn child_path(parent_path: &str, id: Uuid) -> String {
    format!("{parent_path}{id}/")
}

/// Trims and checks a category name, returning the normalized value.
pub fn validate_category_name(raw: &str) -> Result<String, DomainError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(DomainError::invalid("name", "category name must not be empty"));
    }
    if name.chars().count() > MAX_CATEGORY_NAME_LENGTH {
        return Err(DomainError::invalid(
            "name",
            format!("category name must be at most {MAX_CATEGORY_NAME_LENGTH} characters"),
        ));
    }
    if name.contains(FORBIDDEN_NAME_CHARACTERS) {
        return Err(DomainError::invalid(
            "name",
            "category name contains forbidden characters (<>&\"'/\\)",
        ));
    }
    Ok(name.to_string())
}

pub fn validate_sort_order(sort_order: i32) -> Result<(), DomainError> {
    if sort_order < 0 {
        return Err(DomainError::invalid("sort_order", "must be zero or greater"));
    }
    Ok(())
}

pub fn validate_depth(level: i32) -> Result<(), DomainError> {
    if level > MAX_CATEGORY_DEPTH {
        return Err(DomainError::DepthExceeded {
            level,
            max: MAX_CATEGORY_DEPTH,
        });
    }
    Ok(())
}

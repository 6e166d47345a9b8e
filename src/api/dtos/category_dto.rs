use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::{Category, CategoryPatch, CategorySearchParams, NewCategory};

use super::common::{default_page, default_per_page, default_true, deserialize_optional_field};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub sort_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub metadata: Option<String>,
}

impl CreateCategoryRequest {
    pub fn into_parts(self) -> (NewCategory, Option<Uuid>) {
        let input = NewCategory {
            name: self.name,
            description: self.description,
            sort_order: self.sort_order,
            is_active: self.is_active,
            metadata: self.metadata,
        };
        (input, self.parent_id)
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub sort_order: Option<i32>,
    pub metadata: Option<String>,
    /// `null` moves the category to the root level; omitting it leaves the parent alone.
    #[serde(default, deserialize_with = "deserialize_optional_field")]
    pub parent_id: Option<Option<Uuid>>,
}

impl From<UpdateCategoryRequest> for CategoryPatch {
    fn from(request: UpdateCategoryRequest) -> Self {
        Self {
            name: request.name,
            description: request.description,
            sort_order: request.sort_order,
            metadata: request.metadata,
            parent_id: request.parent_id,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MoveCategoryRequest {
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ActivateCategoryQuery {
    #[serde(default)]
    pub include_children: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct HierarchyQuery {
    pub root_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CategorySearchQuery {
    pub name: Option<String>,
    pub parent_id: Option<Uuid>,
    pub level: Option<i32>,
    pub is_active: Option<bool>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

impl CategorySearchQuery {
    pub fn to_params(&self) -> CategorySearchParams {
        CategorySearchParams {
            name: self.name.clone(),
            parent_id: self.parent_id,
            level: self.level,
            is_active: self.is_active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryResponse {
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
    pub version: i64,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            description: category.description,
            parent_id: category.parent_id,
            path: category.path,
            level: category.level,
            sort_order: category.sort_order,
            is_active: category.is_active,
            metadata: category.metadata,
            created_at: category.created_at,
            updated_at: category.updated_at,
            version: category.version,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryDetailResponse {
    #[serde(flatten)]
    pub category: CategoryResponse,
    pub product_count: i64,
}

#[derive(Debug, Serialize)]
pub struct CategoryTreeNode {
    #[serde(flatten)]
    pub category: CategoryResponse,
    pub children: Vec<CategoryTreeNode>,
}

/// Nests a flat category list under its parents.
///
/// Categories whose parent is not in the list become top-level nodes. Siblings are
/// ordered by `sort_order` then `name`.
pub fn build_category_tree(categories: Vec<Category>) -> Vec<CategoryTreeNode> {
    let present = categories
        .iter()
        .map(|category| category.id)
        .collect::<HashSet<_>>();

    let mut ordered = categories;
    ordered.sort_by(|left, right| right.level.cmp(&left.level));

    // Deepest first, so every node's children are complete before it is built.
    let mut built_children: HashMap<Uuid, Vec<CategoryTreeNode>> = HashMap::new();
    let mut roots = Vec::new();
    for category in ordered {
        let mut children = built_children.remove(&category.id).unwrap_or_default();
        sort_siblings(&mut children);

        let parent_id = category.parent_id.filter(|id| present.contains(id));
        let node = CategoryTreeNode {
            category: category.into(),
            children,
        };
        match parent_id {
            Some(parent_id) => built_children.entry(parent_id).or_default().push(node),
            None => roots.push(node),
        }
    }

    sort_siblings(&mut roots);
    roots
}

fn sort_siblings(nodes: &mut [CategoryTreeNode]) {
    nodes.sort_by(|left, right| {
        left.category
            .sort_order
            .cmp(&right.category.sort_order)
            .then_with(|| left.category.name.cmp(&right.category.name))
    });
}

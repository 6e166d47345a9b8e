use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::domain::category::child_path;
use crate::domain::Category;
use crate::error::AppResult;
use crate::infrastructure::repositories::CategoryRepository;

/// Collects `root` and every non-deleted descendant by following parent pointers.
///
/// Uses an explicit stack so depth is bounded by memory, not by the call stack.
pub async fn collect_subtree(
    category_repo: &dyn CategoryRepository,
    root: Category,
) -> AppResult<Vec<Category>> {
    let mut visited = HashSet::from([root.id]);
    let mut pending = vec![root.id];
    let mut subtree = vec![root];

    while let Some(parent_id) = pending.pop() {
        for child in category_repo.find_children(parent_id).await? {
            if !visited.insert(child.id) {
                continue;
            }
            pending.push(child.id);
            subtree.push(child);
        }
    }

    Ok(subtree)
}

/// Re-derives `level` and `path` for every descendant of `moved`.
///
/// Each node is placed from its own direct parent, processed in ascending old level
/// so a parent is always settled before its children.
pub fn repair_descendants(moved: &Category, mut descendants: Vec<Category>) -> Vec<Category> {
    descendants.sort_by_key(|category| category.level);

    let mut placed: HashMap<Uuid, (String, i32)> = HashMap::new();
    placed.insert(moved.id, (moved.path.clone(), moved.level));

    for descendant in descendants.iter_mut() {
        let Some(parent_id) = descendant.parent_id else {
            continue;
        };
        if let Some((parent_path, parent_level)) = placed.get(&parent_id) {
            descendant.level = parent_level + 1;
            descendant.path = child_path(parent_path, descendant.id);
        }
        placed.insert(descendant.id, (descendant.path.clone(), descendant.level));
    }

    descendants
}

/// How many levels the subtree extends below its root.
pub fn subtree_height(root: &Category, subtree: &[Category]) -> i32 {
    subtree
        .iter()
        .map(|category| category.level - root.level)
        .max()
        .unwrap_or(0)
        .max(0)
}

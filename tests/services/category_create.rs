use std::sync::Arc;

use actix_rt::test;
use chrono::Utc;
use inventory_backend::domain::category::MAX_CATEGORY_DEPTH;
use inventory_backend::domain::NewCategory;
use inventory_backend::error::AppError;
use uuid::Uuid;

use crate::common::category_service;
use crate::common::fixtures::{self, new_category};
use crate::common::mocks::MockCategoryRepo;

#[test]
async fn create_root_gets_root_path_and_level_zero() {
    let repo = Arc::new(MockCategoryRepo::default());
    let service = category_service(repo.clone());

    let created = service
        .create(new_category("Electronics"), None)
        .await
        .expect("root should be created");

    assert_eq!(created.level, 0);
    assert_eq!(created.path, format!("/{}/", created.id));
    assert!(created.parent_id.is_none());
    assert_eq!(repo.stored(created.id), Some(created));
}

#[test]
async fn create_child_extends_parent_path() {
    let repo = Arc::new(MockCategoryRepo::default());
    let service = category_service(repo);

    let root = service
        .create(new_category("Electronics"), None)
        .await
        .unwrap();
    let child = service
        .create(new_category("Phones"), Some(root.id))
        .await
        .unwrap();

    assert_eq!(child.parent_id, Some(root.id));
    assert_eq!(child.level, 1);
    assert_eq!(child.path, format!("/{}/{}/", root.id, child.id));
}

#[test]
async fn create_then_move_to_root_matches_walkthrough() {
    let repo = Arc::new(MockCategoryRepo::default());
    let service = category_service(repo);

    let electronics = service
        .create(new_category("Electronics"), None)
        .await
        .unwrap();
    assert_eq!(electronics.path, format!("/{}/", electronics.id));

    let phones = service
        .create(new_category("Phones"), Some(electronics.id))
        .await
        .unwrap();
    assert_eq!(phones.path, format!("/{}/{}/", electronics.id, phones.id));
    assert_eq!(phones.level, 1);

    service.move_category(phones.id, None).await.unwrap();

    let moved = service.get_by_id(phones.id).await.unwrap();
    assert_eq!(moved.path, format!("/{}/", phones.id));
    assert_eq!(moved.level, 0);
    assert!(moved.parent_id.is_none());
}

#[test]
async fn create_trims_name_and_keeps_attributes() {
    let service = category_service(Arc::new(MockCategoryRepo::default()));

    let created = service
        .create(
            NewCategory {
                name: "  Power Tools ".to_string(),
                description: Some("Drills and saws".to_string()),
                sort_order: 4,
                is_active: true,
                metadata: Some(r#"{"icon":"drill"}"#.to_string()),
            },
            None,
        )
        .await
        .unwrap();

    assert_eq!(created.name, "Power Tools");
    assert_eq!(created.description.as_deref(), Some("Drills and saws"));
    assert_eq!(created.sort_order, 4);
    assert_eq!(created.metadata.as_deref(), Some(r#"{"icon":"drill"}"#));
    assert_eq!(created.version, 0);
}

#[test]
async fn create_rejects_invalid_names() {
    let service = category_service(Arc::new(MockCategoryRepo::default()));

    for name in ["", "   ", "Tools<script>", "A/B", &"x".repeat(256)] {
        let error = service
            .create(new_category(name), None)
            .await
            .expect_err("invalid name should be rejected");
        assert!(
            matches!(error, AppError::ValidationError { .. }),
            "{name:?} gave {error:?}"
        );
    }
}

#[test]
async fn create_rejects_negative_sort_order() {
    let service = category_service(Arc::new(MockCategoryRepo::default()));

    let error = service
        .create(
            NewCategory {
                sort_order: -1,
                ..new_category("Tools")
            },
            None,
        )
        .await
        .unwrap_err();

    assert!(matches!(error, AppError::ValidationError { message, .. } if message.contains("sort_order")));
}

#[test]
async fn create_under_unknown_parent_is_not_found() {
    let service = category_service(Arc::new(MockCategoryRepo::default()));

    let error = service
        .create(new_category("Phones"), Some(Uuid::new_v4()))
        .await
        .unwrap_err();

    assert!(matches!(error, AppError::NotFound(_)));
}

#[test]
async fn create_under_deleted_parent_is_not_found() {
    let mut parent = fixtures::category("Archive", None);
    parent.deleted_at = Some(Utc::now());
    let repo = Arc::new(MockCategoryRepo::with_categories(vec![parent.clone()]));
    let service = category_service(repo);

    let error = service
        .create(new_category("Old"), Some(parent.id))
        .await
        .unwrap_err();

    assert!(matches!(error, AppError::NotFound(_)));
}

#[test]
async fn create_under_inactive_parent_is_business_error() {
    let parent = fixtures::inactive(fixtures::category("Seasonal", None));
    let repo = Arc::new(MockCategoryRepo::with_categories(vec![parent.clone()]));
    let service = category_service(repo);

    let error = service
        .create(new_category("Christmas"), Some(parent.id))
        .await
        .unwrap_err();

    assert!(matches!(error, AppError::BusinessRule(message) if message.contains("inactive")));
}

#[test]
async fn create_enforces_max_depth() {
    let nodes = fixtures::chain(MAX_CATEGORY_DEPTH as usize + 1);
    let deepest = nodes.last().cloned().unwrap();
    let second_deepest = nodes[nodes.len() - 2].clone();
    assert_eq!(deepest.level, MAX_CATEGORY_DEPTH);

    let repo = Arc::new(MockCategoryRepo::with_categories(nodes));
    let service = category_service(repo);

    let error = service
        .create(new_category("Too Deep"), Some(deepest.id))
        .await
        .unwrap_err();
    assert!(
        matches!(error, AppError::ValidationError { message, .. } if message.contains("maximum category depth"))
    );

    let sibling = service
        .create(new_category("Deep Enough"), Some(second_deepest.id))
        .await
        .unwrap();
    assert_eq!(sibling.level, MAX_CATEGORY_DEPTH);
}

#[test]
async fn duplicate_root_names_are_rejected() {
    let service = category_service(Arc::new(MockCategoryRepo::default()));

    service
        .create(new_category("Electronics"), None)
        .await
        .unwrap();
    let error = service
        .create(new_category("Electronics"), None)
        .await
        .unwrap_err();

    assert!(matches!(error, AppError::ValidationError { message, .. } if message.contains("root level")));
}

#[test]
async fn duplicate_sibling_names_are_rejected_only_under_same_parent() {
    let service = category_service(Arc::new(MockCategoryRepo::default()));
    let electronics = service
        .create(new_category("Electronics"), None)
        .await
        .unwrap();
    let toys = service.create(new_category("Toys"), None).await.unwrap();

    service
        .create(new_category("Phones"), Some(electronics.id))
        .await
        .unwrap();
    let error = service
        .create(new_category("Phones"), Some(electronics.id))
        .await
        .unwrap_err();
    assert!(matches!(error, AppError::ValidationError { .. }));

    service
        .create(new_category("Phones"), Some(toys.id))
        .await
        .expect("same name under another parent is fine");
}

#[test]
async fn name_of_deleted_sibling_can_be_reused() {
    let service = category_service(Arc::new(MockCategoryRepo::default()));
    let first = service
        .create(new_category("Clearance"), None)
        .await
        .unwrap();
    service.delete(first.id).await.unwrap();

    let second = service
        .create(new_category("Clearance"), None)
        .await
        .expect("deleted names are free again");
    assert_ne!(first.id, second.id);
}

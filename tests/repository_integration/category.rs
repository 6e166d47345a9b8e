use std::sync::Arc;

use inventory_backend::application::{CategoryCache, CategoryService};
use inventory_backend::domain::CategorySearchParams;
use inventory_backend::error::AppError;
use inventory_backend::infrastructure::repositories::{
    CategoryRepository, CategoryRepositoryImpl, ProductRepository, ProductRepositoryImpl,
};

use crate::common::fixtures::{self, category, new_category};
use crate::common::TestDb;

#[tokio::test]
async fn create_and_find_round_trips_hierarchy_columns() {
    let Some(db) = TestDb::new().await else {
        return;
    };
    let repo = CategoryRepositoryImpl::new(db.pool().clone());

    let root = repo.create(&category("Electronics", None)).await.unwrap();
    let child = repo
        .create(&category("Phones", Some(&root)))
        .await
        .unwrap();

    let found = repo.find_by_id(child.id).await.unwrap().unwrap();
    assert_eq!(found.parent_id, Some(root.id));
    assert_eq!(found.path, format!("/{}/{}/", root.id, child.id));
    assert_eq!(found.level, 1);
    assert_eq!(found.version, 0);

    let roots = repo.find_roots().await.unwrap();
    assert_eq!(roots.len(), 1);
    assert_eq!(repo.find_children(root.id).await.unwrap().len(), 1);
    assert_eq!(repo.find_by_level(1).await.unwrap()[0].id, child.id);
}

#[tokio::test]
async fn path_prefix_returns_subtree_in_path_order() {
    let Some(db) = TestDb::new().await else {
        return;
    };
    let repo = CategoryRepositoryImpl::new(db.pool().clone());

    let root = repo.create(&category("Home", None)).await.unwrap();
    let kitchen = repo.create(&category("Kitchen", Some(&root))).await.unwrap();
    let knives = repo
        .create(&category("Knives", Some(&kitchen)))
        .await
        .unwrap();
    repo.create(&category("Garden", None)).await.unwrap();

    let subtree = repo.find_by_path_prefix(&root.path).await.unwrap();
    let ids = subtree.iter().map(|node| node.id).collect::<Vec<_>>();

    assert_eq!(ids, [root.id, kitchen.id, knives.id]);
}

#[tokio::test]
async fn save_all_bumps_versions_and_rejects_stale_rows() {
    let Some(db) = TestDb::new().await else {
        return;
    };
    let repo = CategoryRepositoryImpl::new(db.pool().clone());
    let a = repo.create(&category("A", None)).await.unwrap();
    let b = repo.create(&category("B", None)).await.unwrap();

    let mut renamed_a = a.clone();
    renamed_a.name = "A2".to_string();
    let mut renamed_b = b.clone();
    renamed_b.name = "B2".to_string();
    let saved = repo
        .save_all(&[renamed_a.clone(), renamed_b.clone()], &[])
        .await
        .unwrap();
    assert_eq!(saved[0].version, 1);
    assert_eq!(saved[1].version, 1);

    // Second row is stale, so the first row's change must roll back too.
    let mut fresh_a = saved[0].clone();
    fresh_a.name = "A3".to_string();
    let mut stale_b = renamed_b;
    stale_b.name = "B3".to_string();
    let error = repo.save_all(&[fresh_a, stale_b], &[]).await.unwrap_err();

    assert!(matches!(error, AppError::Conflict(_)));
    assert_eq!(repo.find_by_id(a.id).await.unwrap().unwrap().name, "A2");
    assert_eq!(repo.find_by_id(b.id).await.unwrap().unwrap().name, "B2");
}

#[tokio::test]
async fn save_all_rejects_stale_guard_rows_without_writing() {
    let Some(db) = TestDb::new().await else {
        return;
    };
    let repo = CategoryRepositoryImpl::new(db.pool().clone());
    let a = repo.create(&category("A", None)).await.unwrap();
    let b = repo.create(&category("B", None)).await.unwrap();

    let mut moved_a = a.clone();
    moved_a.place_under(Some(&b));

    // Another request touched B after it was read as A's new parent.
    let mut renamed_b = b.clone();
    renamed_b.name = "B2".to_string();
    repo.save_all(&[renamed_b], &[]).await.unwrap();

    let error = repo
        .save_all(&[moved_a.clone()], &[b.clone()])
        .await
        .unwrap_err();
    assert!(matches!(error, AppError::Conflict(_)));
    let stored_a = repo.find_by_id(a.id).await.unwrap().unwrap();
    assert_eq!(stored_a.parent_id, None);
    assert_eq!(stored_a.version, 0);

    let fresh_b = repo.find_by_id(b.id).await.unwrap().unwrap();
    let saved = repo.save_all(&[moved_a], &[fresh_b.clone()]).await.unwrap();
    assert_eq!(saved[0].parent_id, Some(b.id));
    assert_eq!(
        repo.find_by_id(b.id).await.unwrap().unwrap().version,
        fresh_b.version
    );
}

#[tokio::test]
async fn sibling_name_index_rejects_duplicates_but_allows_deleted() {
    let Some(db) = TestDb::new().await else {
        return;
    };
    let repo = CategoryRepositoryImpl::new(db.pool().clone());
    let original = repo.create(&category("Sale", None)).await.unwrap();

    let error = repo.create(&category("Sale", None)).await.unwrap_err();
    assert!(matches!(error, AppError::ValidationError { .. }));

    let mut deleted = original;
    deleted.deleted_at = Some(chrono::Utc::now());
    repo.save_all(&[deleted], &[]).await.unwrap();

    repo.create(&category("Sale", None))
        .await
        .expect("deleted sibling frees the name");
}

#[tokio::test]
async fn search_is_case_insensitive_and_escapes_wildcards() {
    let Some(db) = TestDb::new().await else {
        return;
    };
    let repo = CategoryRepositoryImpl::new(db.pool().clone());
    repo.create(&category("Phone Cases", None)).await.unwrap();
    repo.create(&category("Headphones", None)).await.unwrap();
    repo.create(&category("100% Cotton", None)).await.unwrap();

    let params = CategorySearchParams {
        name: Some("PHONE".to_string()),
        ..CategorySearchParams::default()
    };
    assert_eq!(repo.search(&params, 10, 0).await.unwrap().len(), 2);
    assert_eq!(repo.count_search(&params).await.unwrap(), 2);

    let wildcard = CategorySearchParams {
        name: Some("%".to_string()),
        ..CategorySearchParams::default()
    };
    let found = repo.search(&wildcard, 10, 0).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "100% Cotton");
}

#[tokio::test]
async fn service_move_and_delete_against_postgres() {
    let Some(db) = TestDb::new().await else {
        return;
    };
    let category_repo = Arc::new(CategoryRepositoryImpl::new(db.pool().clone()));
    let product_repo = ProductRepositoryImpl::new(db.pool().clone());
    let service = CategoryService::new(category_repo.clone(), Arc::new(CategoryCache::default()));

    let electronics = service
        .create(new_category("Electronics"), None)
        .await
        .unwrap();
    let phones = service
        .create(new_category("Phones"), Some(electronics.id))
        .await
        .unwrap();
    let android = service
        .create(new_category("Android"), Some(phones.id))
        .await
        .unwrap();

    service.move_category(phones.id, None).await.unwrap();
    let android_after = service.get_by_id(android.id).await.unwrap();
    assert_eq!(android_after.path, format!("/{}/{}/", phones.id, android.id));
    assert_eq!(android_after.level, 1);

    product_repo
        .create(&fixtures::product(android.id, "Pixel"))
        .await
        .unwrap();
    let error = service.delete(phones.id).await.unwrap_err();
    assert!(matches!(error, AppError::BusinessRule(message) if message.contains("descendant")));

    service.delete(electronics.id).await.unwrap();
    assert!(category_repo
        .find_by_id(electronics.id)
        .await
        .unwrap()
        .is_none());
    assert_eq!(category_repo.find_by_path_prefix("/").await.unwrap().len(), 2);
}

use std::collections::HashSet;
use std::sync::Arc;

use actix_rt::test;
use inventory_backend::application::CategoryService;
use inventory_backend::error::AppError;
use uuid::Uuid;

use crate::common::category_service;
use crate::common::fixtures::category;
use crate::common::mocks::MockCategoryRepo;

use self::yielding::YieldingRepo;

fn interleaved_service(repo: Arc<MockCategoryRepo>) -> CategoryService {
    CategoryService::new(
        Arc::new(YieldingRepo { inner: repo }),
        Arc::new(inventory_backend::application::CategoryCache::default()),
    )
}

fn assert_acyclic(repo: &MockCategoryRepo, ids: &[Uuid]) {
    for id in ids {
        let mut seen = HashSet::new();
        let mut cursor = Some(*id);
        while let Some(current) = cursor {
            assert!(seen.insert(current), "parent chain of {id} loops");
            cursor = repo.stored(current).and_then(|node| node.parent_id);
        }
    }
}

fn exactly_one_conflict(first: Result<(), AppError>, second: Result<(), AppError>) {
    match (first, second) {
        (Ok(()), Err(AppError::Conflict(_))) | (Err(AppError::Conflict(_)), Ok(())) => {}
        other => panic!("expected one move to commit and one to conflict, got {other:?}"),
    }
}

#[test]
async fn cross_moves_of_two_roots_cannot_both_commit() {
    let a = category("A", None);
    let b = category("B", None);
    let repo = Arc::new(MockCategoryRepo::with_categories(vec![a.clone(), b.clone()]));
    let service = interleaved_service(repo.clone());

    let (first, second) = tokio::join!(
        service.move_category(a.id, Some(b.id)),
        service.move_category(b.id, Some(a.id)),
    );

    exactly_one_conflict(first, second);
    assert_acyclic(&repo, &[a.id, b.id]);
}

#[test]
async fn move_conflicts_when_a_higher_ancestor_moves_underneath_it() {
    let g = category("G", None);
    let p = category("P", Some(&g));
    let x = category("X", None);
    let repo = Arc::new(MockCategoryRepo::with_categories(vec![
        g.clone(),
        p.clone(),
        x.clone(),
    ]));
    let service = interleaved_service(repo.clone());

    // X under P reads the chain P, G; G under X would close the loop.
    let (first, second) = tokio::join!(
        service.move_category(x.id, Some(p.id)),
        service.move_category(g.id, Some(x.id)),
    );

    exactly_one_conflict(first, second);
    assert_acyclic(&repo, &[g.id, p.id, x.id]);
}

#[test]
async fn sequential_cross_moves_reject_the_cycle() {
    let a = category("A", None);
    let b = category("B", None);
    let repo = Arc::new(MockCategoryRepo::with_categories(vec![a.clone(), b.clone()]));
    let service = category_service(repo.clone());

    service.move_category(a.id, Some(b.id)).await.unwrap();
    let error = service
        .move_category(b.id, Some(a.id))
        .await
        .unwrap_err();

    assert!(matches!(error, AppError::ValidationError { message, .. } if message.contains("cycle")));
    assert_acyclic(&repo, &[a.id, b.id]);
}

#[test]
async fn save_with_stale_guard_writes_nothing() {
    use inventory_backend::infrastructure::repositories::CategoryRepository;

    let a = category("A", None);
    let b = category("B", None);
    let repo = MockCategoryRepo::with_categories(vec![a.clone(), b.clone()]);
    repo.bump_version(b.id);

    let mut moved = a.clone();
    moved.place_under(Some(&b));
    let error = repo.save_all(&[moved], &[b.clone()]).await.unwrap_err();

    assert!(matches!(error, AppError::Conflict(_)));
    assert_eq!(repo.stored(a.id), Some(a));
}

/// Repository that yields to the scheduler before every call, so two service
/// operations joined on one task interleave their reads and writes.
mod yielding {
    use std::sync::Arc;

    use async_trait::async_trait;
    use inventory_backend::domain::{Category, CategorySearchParams};
    use inventory_backend::error::AppResult;
    use inventory_backend::infrastructure::repositories::CategoryRepository;
    use tokio::task::yield_now;
    use uuid::Uuid;

    use crate::common::mocks::MockCategoryRepo;

    pub struct YieldingRepo {
        pub inner: Arc<MockCategoryRepo>,
    }

    #[async_trait]
    impl CategoryRepository for YieldingRepo {
        async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Category>> {
            yield_now().await;
            self.inner.find_by_id(id).await
        }

        async fn find_roots(&self) -> AppResult<Vec<Category>> {
            yield_now().await;
            self.inner.find_roots().await
        }

        async fn find_children(&self, parent_id: Uuid) -> AppResult<Vec<Category>> {
            yield_now().await;
            self.inner.find_children(parent_id).await
        }

        async fn find_by_path_prefix(&self, prefix: &str) -> AppResult<Vec<Category>> {
            yield_now().await;
            self.inner.find_by_path_prefix(prefix).await
        }

        async fn find_by_level(&self, level: i32) -> AppResult<Vec<Category>> {
            yield_now().await;
            self.inner.find_by_level(level).await
        }

        async fn find_by_name(
            &self,
            parent_id: Option<Uuid>,
            name: &str,
        ) -> AppResult<Option<Category>> {
            yield_now().await;
            self.inner.find_by_name(parent_id, name).await
        }

        async fn find_all_active(&self) -> AppResult<Vec<Category>> {
            yield_now().await;
            self.inner.find_all_active().await
        }

        async fn search(
            &self,
            params: &CategorySearchParams,
            limit: i64,
            offset: i64,
        ) -> AppResult<Vec<Category>> {
            yield_now().await;
            self.inner.search(params, limit, offset).await
        }

        async fn count_products(&self, category_id: Uuid) -> AppResult<i64> {
            yield_now().await;
            self.inner.count_products(category_id).await
        }

        async fn create(&self, category: &Category) -> AppResult<Category> {
            yield_now().await;
            self.inner.create(category).await
        }

        async fn save_all(
            &self,
            categories: &[Category],
            guards: &[Category],
        ) -> AppResult<Vec<Category>> {
            yield_now().await;
            self.inner.save_all(categories, guards).await
        }
    }
}

//! Lending workflow tests against the in-memory catalog store

use std::sync::Arc;

use shelfmark_server::{
    config::ImportConfig,
    error::AppError,
    models::{NewBook, NewUser},
    repository::{CatalogStore, InMemoryCatalogStore, LendFilter},
    services::Services,
};
use tokio::task::JoinSet;
use tokio_test::assert_ok;

const BOOK_ID: i32 = 1;

async fn setup(stock: i32, users: i32) -> (InMemoryCatalogStore, Services) {
    let store = InMemoryCatalogStore::new();
    store
        .insert_book(&NewBook {
            id: BOOK_ID,
            title: "Dune".to_string(),
            author: "Herbert".to_string(),
            isbn: "ISBN1".to_string(),
            stock,
        })
        .await
        .unwrap();
    for id in 1..=users {
        store
            .insert_user(&NewUser {
                id,
                name: format!("reader-{}", id),
            })
            .await
            .unwrap();
    }

    let services = Services::new(Arc::new(store.clone()), &ImportConfig::default());
    (store, services)
}

#[tokio::test]
async fn test_stock_never_goes_negative() {
    let (store, services) = setup(3, 1).await;

    for expected in [2, 1, 0] {
        let receipt = services.lending.lend(BOOK_ID, 1).await.unwrap();
        assert_eq!(receipt.remaining_stock, expected);
    }

    let err = services.lending.lend(BOOK_ID, 1).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::InsufficientStock {
            book_id: BOOK_ID,
            available: 0,
            requested: 1
        }
    ));
    assert_eq!(store.get_book_stock(BOOK_ID).await.unwrap(), Some(0));
    assert_eq!(store.lend_count().await, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_lends_never_oversell() {
    const STOCK: i32 = 5;
    const REQUESTS: i32 = 40;

    let (store, services) = setup(STOCK, REQUESTS).await;

    let mut tasks = JoinSet::new();
    for user_id in 1..=REQUESTS {
        let lending = services.lending.clone();
        tasks.spawn(async move { lending.lend(BOOK_ID, user_id).await });
    }

    let mut successes = 0;
    let mut insufficient = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined.unwrap() {
            Ok(_) => successes += 1,
            Err(AppError::InsufficientStock { .. }) => insufficient += 1,
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    assert_eq!(successes, STOCK);
    assert_eq!(insufficient, REQUESTS - STOCK);
    assert_eq!(store.get_book_stock(BOOK_ID).await.unwrap(), Some(0));
    assert_eq!(store.lend_count().await, STOCK as usize);
}

#[tokio::test]
async fn test_stock_update_failure_rolls_back_lend() {
    let (store, services) = setup(2, 1).await;
    store.fail_stock_updates(true);

    let err = services.lending.lend(BOOK_ID, 1).await.unwrap_err();
    assert!(matches!(err, AppError::StorageFailure(_)));
    assert_eq!(store.lend_count().await, 0);
    assert_eq!(store.get_book_stock(BOOK_ID).await.unwrap(), Some(2));

    store.fail_stock_updates(false);
    assert_ok!(services.lending.lend(BOOK_ID, 1).await);
    assert_eq!(store.lend_count().await, 1);
    assert_eq!(store.get_book_stock(BOOK_ID).await.unwrap(), Some(1));
}

#[tokio::test]
async fn test_lend_insert_failure_leaves_stock_untouched() {
    let (store, services) = setup(2, 1).await;
    store.fail_lend_inserts(true);

    let err = services.lending.lend(BOOK_ID, 1).await.unwrap_err();
    assert!(matches!(err, AppError::StorageFailure(_)));
    assert_eq!(store.lend_count().await, 0);
    assert_eq!(store.get_book_stock(BOOK_ID).await.unwrap(), Some(2));
}

#[tokio::test]
async fn test_commit_failure_is_storage_failure() {
    let (store, services) = setup(2, 1).await;
    store.fail_commits(true);

    let err = services.lending.lend(BOOK_ID, 1).await.unwrap_err();
    assert!(matches!(err, AppError::StorageFailure(_)));
    assert_eq!(store.lend_count().await, 0);
    assert_eq!(store.get_book_stock(BOOK_ID).await.unwrap(), Some(2));
}

#[tokio::test]
async fn test_unknown_book_or_user_is_not_found() {
    let (store, services) = setup(2, 1).await;

    assert!(matches!(
        services.lending.lend(99, 1).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        services.lending.lend(BOOK_ID, 99).await,
        Err(AppError::NotFound(_))
    ));
    assert_eq!(store.get_book_stock(BOOK_ID).await.unwrap(), Some(2));
    assert_eq!(store.lend_count().await, 0);
}

#[tokio::test]
async fn test_stock_reads_are_repeatable() {
    let (store, services) = setup(7, 1).await;

    let first = store.get_book_stock(BOOK_ID).await.unwrap();
    let second = store.get_book_stock(BOOK_ID).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(services.lending.book_stock(BOOK_ID).await.unwrap(), 7);
    assert_eq!(store.get_book_stock(404).await.unwrap(), None);
}

#[tokio::test]
async fn test_lends_are_listed_per_user_and_book() {
    let (store, services) = setup(5, 2).await;

    services.lending.lend(BOOK_ID, 1).await.unwrap();
    services.lending.lend(BOOK_ID, 2).await.unwrap();
    services.lending.lend(BOOK_ID, 2).await.unwrap();

    let for_user = services.lending.lends_for_user(2).await.unwrap();
    assert_eq!(for_user.len(), 2);
    assert!(for_user.iter().all(|lend| lend.user_id == 2));

    let for_book = store.list_lends(LendFilter::Book(BOOK_ID)).await.unwrap();
    assert_eq!(for_book.len(), 3);

    assert!(matches!(
        services.lending.lends_for_user(42).await,
        Err(AppError::NotFound(_))
    ));
}

//! Postgres catalog store tests
//!
//! Need a reachable database: DATABASE_URL=postgres://... cargo test -- --ignored

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::task::JoinSet;

use shelfmark_server::{
    config::ImportConfig,
    error::AppError,
    models::{NewBook, NewUser},
    repository::{CatalogStore, LendFilter, Repository},
    services::Services,
};

const SCHEMA: &str = include_str!("../sql/schema.sql");

async fn repository() -> Repository {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(&url)
        .await
        .expect("Failed to connect to database");

    let statements = SCHEMA
        .split(';')
        .map(|s| {
            s.lines()
                .filter(|l| !l.trim_start().starts_with("--"))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .filter(|s| !s.trim().is_empty());
    for statement in statements {
        sqlx::query(&statement).execute(&pool).await.unwrap();
    }

    Repository::new(pool, 5_000)
}

async fn reset(repo: &Repository, book_id: i32, stock: i32, users: std::ops::RangeInclusive<i32>) {
    sqlx::query("DELETE FROM lends WHERE book_id = $1")
        .bind(book_id)
        .execute(&repo.pool)
        .await
        .unwrap();
    sqlx::query("DELETE FROM books WHERE id = $1")
        .bind(book_id)
        .execute(&repo.pool)
        .await
        .unwrap();
    repo.insert_book(&NewBook {
        id: book_id,
        title: "Dune".to_string(),
        author: "Herbert".to_string(),
        isbn: "ISBN1".to_string(),
        stock,
    })
    .await
    .unwrap();

    for id in users {
        sqlx::query("INSERT INTO users (id, name) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING")
            .bind(id)
            .bind(format!("reader-{}", id))
            .execute(&repo.pool)
            .await
            .unwrap();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn test_row_lock_prevents_overselling() {
    const BOOK_ID: i32 = 900_001;
    const STOCK: i32 = 3;

    let repo = repository().await;
    reset(&repo, BOOK_ID, STOCK, 900_001..=900_016).await;
    let services = Services::new(Arc::new(repo.clone()), &ImportConfig::default());

    let mut tasks = JoinSet::new();
    for user_id in 900_001..=900_016 {
        let lending = services.lending.clone();
        tasks.spawn(async move { lending.lend(BOOK_ID, user_id).await });
    }

    let mut successes = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined.unwrap() {
            Ok(_) => successes += 1,
            Err(AppError::InsufficientStock { .. }) => {}
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    assert_eq!(successes, STOCK);
    assert_eq!(repo.get_book_stock(BOOK_ID).await.unwrap(), Some(0));
    let lends = repo.list_lends(LendFilter::Book(BOOK_ID)).await.unwrap();
    assert_eq!(lends.len(), STOCK as usize);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_ids_are_conflicts() {
    const BOOK_ID: i32 = 900_101;

    let repo = repository().await;
    reset(&repo, BOOK_ID, 1, 900_101..=900_101).await;

    let err = repo
        .insert_user(&NewUser {
            id: 900_101,
            name: "again".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

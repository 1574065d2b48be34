//! Postgres-backed tests for the update services: unresolved references must
//! leave the database untouched, and the root entity is checked before its
//! referenced entities. The image store is a stub that is never reached
//! because no test sends a file.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use livraria_cache::TtlCache;
use livraria_cdn::{CdnError, ImagePipeline, RemoteFile, RemoteImageStore};
use livraria_core::config::ImageConfig;
use livraria_core::models::{UpdateProductRequest, UpdateUserRequest};
use livraria_core::AppError;
use livraria_db::{
    with_transaction, AuthorRepository, CategoryRepository, ProductColumns, ProductRepository,
    PublisherRepository, RoleRepository, UserRepository,
};
use livraria_services::{ProductService, UserService};

struct OfflineStore;

#[async_trait]
impl RemoteImageStore for OfflineStore {
    async fn upload(
        &self,
        _filename: &str,
        _folder: &str,
        _content_type: &str,
        _data: Bytes,
    ) -> Result<RemoteFile, CdnError> {
        Err(CdnError::Request("offline".to_string()))
    }

    async fn find_file_id(&self, _name: &str) -> Result<Option<String>, CdnError> {
        Ok(None)
    }

    async fn delete(&self, _file_id: &str) -> Result<(), CdnError> {
        Ok(())
    }
}

fn pipeline() -> Arc<ImagePipeline> {
    let rules = ImageConfig {
        max_file_size_bytes: 5 * 1024 * 1024,
        allowed_content_types: vec!["image/jpeg".to_string(), "image/png".to_string()],
        min_width: 10,
        max_width: 4096,
        min_height: 10,
        max_height: 4096,
        min_aspect_ratio: 0.1,
        max_aspect_ratio: 10.0,
        output_max_dimension: 800,
        output_jpeg_quality: 85,
    };
    Arc::new(ImagePipeline::new(
        Arc::new(OfflineStore),
        rules,
        TtlCache::new(10, Duration::from_secs(60)),
    ))
}

fn product_service(pool: &PgPool) -> ProductService {
    ProductService::new(
        pool.clone(),
        ProductRepository::new(pool.clone()),
        CategoryRepository::new(pool.clone()),
        PublisherRepository::new(pool.clone()),
        AuthorRepository::new(pool.clone()),
        pipeline(),
    )
}

struct Seeded {
    product_id: Uuid,
    category_id: Uuid,
    publisher_id: Uuid,
    author_id: Uuid,
}

async fn seed_product(pool: &PgPool) -> Seeded {
    let category = CategoryRepository::new(pool.clone())
        .create("Fiction", None)
        .await
        .unwrap();
    let publisher = PublisherRepository::new(pool.clone())
        .create("Acme Press", None)
        .await
        .unwrap();
    let author = AuthorRepository::new(pool.clone())
        .create("Ada", None, None)
        .await
        .unwrap();

    let products = ProductRepository::new(pool.clone());
    let product_id = Uuid::new_v4();
    let (category_id, publisher_id, author_id) = (category.id, publisher.id, author.id);
    with_transaction(pool, move |tx| {
        Box::pin(async move {
            products
                .insert_tx(
                    tx,
                    product_id,
                    ProductColumns {
                        title: "Original title",
                        description: None,
                        price: Decimal::new(1999, 2),
                        page_count: 320,
                        isbn10: "0306406152",
                        isbn13: "9780306406157",
                        language: "pt",
                        image_url: None,
                        category_id,
                        publisher_id,
                    },
                )
                .await?;
            products
                .replace_authors_tx(tx, product_id, &[author_id])
                .await?;
            Ok(())
        })
    })
    .await
    .unwrap();

    Seeded {
        product_id,
        category_id,
        publisher_id,
        author_id,
    }
}

fn update_request(seeded: &Seeded, author_ids: Vec<Uuid>) -> UpdateProductRequest {
    UpdateProductRequest {
        title: "Rewritten".to_string(),
        description: None,
        price: Decimal::new(2999, 2),
        page_count: 400,
        isbn10: "0306406152".to_string(),
        isbn13: "9780306406157".to_string(),
        language: "pt".to_string(),
        category_id: seeded.category_id,
        publisher_id: seeded.publisher_id,
        author_ids,
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn unresolved_author_reference_writes_nothing(pool: PgPool) {
    let seeded = seed_product(&pool).await;
    let service = product_service(&pool);

    let request = update_request(&seeded, vec![seeded.author_id, Uuid::new_v4()]);
    let err = service
        .update(seeded.product_id, request, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {:?}", err);

    let product = ProductRepository::new(pool.clone())
        .find_hydrated(seeded.product_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(product.record.title, "Original title");
    let authors: Vec<Uuid> = product.authors.iter().map(|a| a.id).collect();
    assert_eq!(authors, vec![seeded.author_id]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn unresolved_category_reference_writes_nothing(pool: PgPool) {
    let seeded = seed_product(&pool).await;
    let service = product_service(&pool);

    let mut request = update_request(&seeded, vec![seeded.author_id]);
    request.category_id = Uuid::new_v4();
    let err = service
        .update(seeded.product_id, request, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {:?}", err);

    let product = ProductRepository::new(pool.clone())
        .find_hydrated(seeded.product_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(product.record.title, "Original title");
    assert_eq!(product.record.category_id, seeded.category_id);
}

#[sqlx::test(migrations = "../../migrations")]
async fn missing_user_reported_before_missing_role(pool: PgPool) {
    let service = UserService::new(
        pool.clone(),
        UserRepository::new(pool.clone()),
        RoleRepository::new(pool.clone()),
        pipeline(),
    );

    // Both the user and the role are unknown; the root row wins.
    let request = UpdateUserRequest {
        name: "Nobody".to_string(),
        email: "nobody@example.com".to_string(),
        role_ids: vec![Uuid::new_v4()],
    };
    let err = service
        .update(Uuid::new_v4(), request, None)
        .await
        .unwrap_err();

    match err {
        AppError::NotFound(msg) => assert!(msg.starts_with("User"), "got {}", msg),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

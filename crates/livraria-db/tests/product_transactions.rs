//! Postgres-backed tests for the atomic scalar + association update
//! sequence. Each test gets its own database from the sqlx test harness with
//! the workspace migrations applied.

use livraria_core::AppError;
use livraria_db::{
    with_transaction, AuthorRepository, CategoryRepository, ProductColumns, ProductRepository,
    PublisherRepository,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

struct Fixture {
    products: ProductRepository,
    product_id: Uuid,
    category_id: Uuid,
    publisher_id: Uuid,
    author_a: Uuid,
    author_b: Uuid,
}

fn columns(title: &'static str, category_id: Uuid, publisher_id: Uuid) -> ProductColumns<'static> {
    ProductColumns {
        title,
        description: None,
        price: Decimal::new(1999, 2),
        page_count: 320,
        isbn10: "0306406152",
        isbn13: "9780306406157",
        language: "pt",
        image_url: None,
        category_id,
        publisher_id,
    }
}

/// One category, one publisher, two authors, and a product titled
/// "Original title" associated with `author_a` only.
async fn seed(pool: &PgPool) -> Fixture {
    let categories = CategoryRepository::new(pool.clone());
    let publishers = PublisherRepository::new(pool.clone());
    let authors = AuthorRepository::new(pool.clone());
    let products = ProductRepository::new(pool.clone());

    let category = categories.create("Fiction", None).await.unwrap();
    let publisher = publishers
        .create("Acme Press", Some("Lisbon"))
        .await
        .unwrap();
    let author_a = authors.create("Ada", None, None).await.unwrap().id;
    let author_b = authors.create("Bruno", None, None).await.unwrap().id;

    let product_id = Uuid::new_v4();
    let repo = products.clone();
    let (category_id, publisher_id) = (category.id, publisher.id);
    with_transaction(pool, move |tx| {
        Box::pin(async move {
            repo.insert_tx(
                tx,
                product_id,
                columns("Original title", category_id, publisher_id),
            )
            .await?;
            repo.replace_authors_tx(tx, product_id, &[author_a]).await?;
            Ok(())
        })
    })
    .await
    .unwrap();

    Fixture {
        products,
        product_id,
        category_id,
        publisher_id,
        author_a,
        author_b,
    }
}

async fn author_ids(products: &ProductRepository, id: Uuid) -> Vec<Uuid> {
    products
        .find_hydrated(id)
        .await
        .unwrap()
        .unwrap()
        .authors
        .iter()
        .map(|a| a.id)
        .collect()
}

#[sqlx::test(migrations = "../../migrations")]
async fn failed_association_replacement_rolls_back_scalar_update(pool: PgPool) {
    let f = seed(&pool).await;

    let repo = f.products.clone();
    let id = f.product_id;
    let good = f.author_a;
    let (category_id, publisher_id) = (f.category_id, f.publisher_id);
    let err = with_transaction(&pool, move |tx| {
        Box::pin(async move {
            repo.update_scalars_tx(tx, id, columns("Rewritten", category_id, publisher_id))
                .await?;
            // The second id violates the author foreign key.
            repo.replace_authors_tx(tx, id, &[good, Uuid::new_v4()])
                .await?;
            Ok(())
        })
    })
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::Transaction(_)), "got {:?}", err);

    // The rollback must undo the scalar update and the association delete
    // that preceded the failing insert.
    let product = f.products.find_hydrated(id).await.unwrap().unwrap();
    assert_eq!(product.record.title, "Original title");
    assert_eq!(author_ids(&f.products, id).await, vec![f.author_a]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn committed_update_replaces_association_set_wholesale(pool: PgPool) {
    let f = seed(&pool).await;

    let repo = f.products.clone();
    let id = f.product_id;
    let replacement = f.author_b;
    let (category_id, publisher_id) = (f.category_id, f.publisher_id);
    with_transaction(&pool, move |tx| {
        Box::pin(async move {
            repo.update_scalars_tx(tx, id, columns("Second edition", category_id, publisher_id))
                .await?;
            repo.replace_authors_tx(tx, id, &[replacement]).await?;
            Ok(())
        })
    })
    .await
    .unwrap();

    let product = f.products.find_hydrated(id).await.unwrap().unwrap();
    assert_eq!(product.record.title, "Second edition");
    assert_eq!(author_ids(&f.products, id).await, vec![f.author_b]);
}

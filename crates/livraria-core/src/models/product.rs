use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::author::Author;
use super::category::Category;
use super::publisher::Publisher;

/// Product row as persisted. Foreign references are plain ids here; the
/// hydrated aggregate is [`Product`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ProductRecord {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub page_count: i32,
    pub isbn10: String,
    pub isbn13: String,
    pub language: String,
    pub image_url: Option<String>,
    pub category_id: Uuid,
    pub publisher_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fully hydrated product aggregate: the root row plus its resolved category,
/// publisher and author set. This is what update/create return after commit.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    #[serde(flatten)]
    pub record: ProductRecord,
    pub category: Category,
    pub publisher: Publisher,
    pub authors: Vec<Author>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[validate(range(min = 1, message = "Page count must be positive"))]
    pub page_count: i32,
    pub isbn10: String,
    pub isbn13: String,
    #[validate(length(min = 2, max = 32))]
    pub language: String,
    pub category_id: Uuid,
    pub publisher_id: Uuid,
    /// Must be non-empty; every id must resolve to an existing author.
    pub author_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[validate(range(min = 1, message = "Page count must be positive"))]
    pub page_count: i32,
    pub isbn10: String,
    pub isbn13: String,
    #[validate(length(min = 2, max = 32))]
    pub language: String,
    pub category_id: Uuid,
    pub publisher_id: Uuid,
    /// Replaces the association set wholesale inside the update transaction.
    pub author_ids: Vec<Uuid>,
}

//! Domain models and request DTOs.
//!
//! Models mirror database rows (`sqlx::FromRow` behind the `sqlx` feature);
//! request DTOs carry `validator` constraints and are mapped to rows by the
//! services, never implicitly.

pub mod author;
pub mod category;
pub mod image;
pub mod product;
pub mod publisher;
pub mod user;

pub use author::{Author, CreateAuthorRequest, UpdateAuthorRequest};
pub use category::{Category, CreateCategoryRequest, UpdateCategoryRequest};
pub use image::{ResourceClass, UploadedImage, ValidationResult};
pub use product::{CreateProductRequest, Product, ProductRecord, UpdateProductRequest};
pub use publisher::{CreatePublisherRequest, Publisher, UpdatePublisherRequest};
pub use user::{CreateUserRequest, Role, UpdateUserRequest, User, UserRecord};

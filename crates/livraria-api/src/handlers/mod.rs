pub mod auth;
pub mod authors;
pub mod categories;
pub mod health;
pub mod products;
pub mod publishers;
pub mod users;

mod multipart;

pub(crate) use multipart::parse_entity_multipart;

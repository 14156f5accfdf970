pub mod catalog;
pub mod controllers;
pub mod image_codec;
pub mod session;

pub use catalog::{CatalogApi, CatalogError, TmdbClient};
pub use session::{SessionError, SessionManager};

pub mod api;
pub mod image_source;
pub mod models;

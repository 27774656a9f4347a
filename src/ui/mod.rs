pub mod app;
pub mod browse;
pub mod input;
pub mod keys;
pub mod pagination;
pub mod reader;
pub mod request;
pub mod ui;

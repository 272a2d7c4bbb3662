pub mod config;
pub mod feed;
pub mod loader;
pub mod page;

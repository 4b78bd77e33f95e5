pub mod analytics;
pub mod config;
pub mod models;
pub mod output;
pub mod store;

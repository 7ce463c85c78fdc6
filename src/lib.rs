pub mod assistant;
pub mod auth;
pub mod cache;
pub mod commands;
pub mod config;
pub mod context;
pub mod database;
pub mod datasets;
pub mod error;
pub mod health;
pub mod openai;
pub mod routes;
pub mod server;
pub mod test_utils;

pub use config::Config;
pub use error::AppError;
pub use server::Server;

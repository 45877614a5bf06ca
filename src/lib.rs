pub mod ai;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod foods;
pub mod meals;
pub mod nutrition;
pub mod profiles;
pub mod state;
pub mod stats;
pub mod store;

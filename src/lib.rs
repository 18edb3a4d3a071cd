pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod observability;
pub mod provider;
pub mod relay;
pub mod repositories;
pub mod services;

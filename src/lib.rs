pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod query;
pub mod services;
pub mod state;
pub mod timestamp;

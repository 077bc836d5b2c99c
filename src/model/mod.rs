pub mod apperror;
pub mod config;
pub mod graph;
pub mod models;
pub mod relations;

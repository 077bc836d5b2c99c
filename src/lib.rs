//! Persistence and REST api for software consumption metrics.
//!
//! Consumptions own measures and methods, methods pair with one other method, releases group
//! methods and own software.

pub mod api;
pub mod dao;
pub mod model;
pub mod service;

//! Conduit - Article publishing backend
//!
//! Articles with a denormalized favorite counter, served over HTTP from
//! either an in-memory store or a relational database.

pub mod api;
pub mod app;
pub mod config;
pub mod db;
pub mod models;
pub mod services;

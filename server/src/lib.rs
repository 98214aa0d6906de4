//! Read-only HTTP API over a blockchain indexer's ClickHouse database

pub mod api;
pub mod app;
pub mod core;
pub mod data;
pub mod domain;
pub mod utils;

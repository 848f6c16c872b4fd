//! Data models for cart items, stores and configuration.

pub mod config;
pub mod item;
pub mod store;

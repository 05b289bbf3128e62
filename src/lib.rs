//! Foodgram - recipe sharing backend
//!
//! This library provides the core functionality for the Foodgram service:
//! recipes with tags and ingredients, favorites, author subscriptions,
//! shopping carts with an aggregated plain-text shopping list, and short
//! recipe links.
//!
//! # Features
//! - **server**: HTTP server mode (default)
//! - **cli**: Command-line subcommands (data loading, config generation)
//!
//! # Architecture
//! - `storage`: SeaORM storage backend and data access
//! - `services`: Business logic (shopping list aggregation, short link allocation, ...)
//! - `api`: HTTP handlers and middleware
//! - `config`: Configuration management
//! - `runtime`: Application lifecycle and execution modes
//! - `system`: Logging setup

pub mod api;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod errors;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;

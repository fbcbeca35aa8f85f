//! geoprovider - a remote GeoJSON feature provider
//!
//! Wraps an external HTTP API (or a simulated point process) and serves its
//! records as searchable GeoJSON features.
//!
//! # Features
//! - **server**: HTTP server mode (default)
//! - **cli**: Command-line interface
//!
//! # Architecture
//! - `provider`: search requests, query translation, upstream access, feature conversion
//! - `api`: HTTP services and middleware
//! - `interfaces`: User interfaces (CLI)
//! - `config`: Configuration management
//! - `runtime`: Application lifecycle and execution modes
//! - `system`: Logging

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod provider;
pub mod runtime;
pub mod system;

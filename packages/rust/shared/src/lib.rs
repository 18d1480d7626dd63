//! Shared types, error model, and configuration for docgraph.
//!
//! This crate is the foundation depended on by all other docgraph crates.
//! It provides:
//! - [`DocGraphError`], the unified error type
//! - The table model ([`Table`], [`Column`], [`Value`])
//! - Configuration ([`AppConfig`], per-verb sections, config loading)

pub mod config;
pub mod error;
pub mod table;
pub mod value;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BaseDocumentsConfig, EdgeDegreeConfig, config_dir, config_file_path, init_config,
    init_config_in, load_config, load_config_from,
};
pub use error::{DocGraphError, Result};
pub use table::{Column, Table};
pub use value::{JoinKey, Value};

pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod document;
pub mod domain;
pub mod sql;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::LocalStorage;
pub use app::pipelines::ReportPipeline;
pub use config::TomlConfig;
pub use core::engine::MigrationEngine;
pub use domain::model::{DocumentStatus, MigrationReport};
pub use sql::{convert, pretty_print, rewrite};
pub use utils::error::{MigrateError, Result};

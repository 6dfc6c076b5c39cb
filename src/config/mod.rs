//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → WatchConfig (validated, immutable)
//!     → CLI overrides applied by the binary, then re-validated
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; a watcher restart re-reads it
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, read_config, ConfigError};
pub use schema::{
    ActionsConfig, MetadataConfig, ObservabilityConfig, PollerConfig, SchedulerConfig,
    WatchConfig,
};
pub use validation::{validate_config, ValidationError};

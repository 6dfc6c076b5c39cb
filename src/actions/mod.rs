//! Operator actions.
//!
//! # Data Flow
//! ```text
//! rebalance signal  → BackgroundActions (on_rebalance, tracked task)
//! deadline reached  → CommandRunner (on_termination, in order)
//! exit              → BackgroundActions::drain (bounded wait, then abort)
//! ```

pub mod background;
pub mod runner;

pub use background::{BackgroundActions, DrainReport};
pub use runner::{ActionError, CommandRunner};

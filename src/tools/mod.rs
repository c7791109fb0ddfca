//! Typed wrappers around the external tools the pipeline drives
//!
//! Each wrapper only builds [`converge::Invocation`]s and interprets their
//! output; all process handling lives behind [`converge::CommandExecutor`].

pub mod db;
pub mod wp;

pub use db::Database;
pub use wp::Wp;

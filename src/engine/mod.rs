//! Provisioning engine for siteup
//!
//! The engine is split into:
//! 1. Probing - Observe files, database state and backups
//! 2. Planning - Pick prerequisites and the single terminal action
//! 3. Driving - Run the chosen actions, the bootstrap extras, and the
//!    steps that happen on every run

pub mod bootstrap;
pub mod machine;
pub mod planner;
pub mod probe;
pub mod version;

pub use machine::{Provisioner, RunReport};

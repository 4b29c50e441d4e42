//! Fixture materialization.
//!
//! Fixture factory, blueprints, YAML documents, the `loadfixtures` command,
//! settings and test-case helpers.

pub use fixtura_seeding::*;

//! Management commands.
//!
//! - [`LoadFixturesCommand`] - write fixture files into a factory

pub mod loadfixtures;

pub use loadfixtures::{LoadFixturesArgs, LoadFixturesCommand, LoadFixturesOptions};

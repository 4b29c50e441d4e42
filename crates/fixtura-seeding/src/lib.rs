//! Fixture graph materialization for fixtura.
//!
//! This crate turns declarative fixture documents into persisted records:
//!
//! - **References**: fields may point at earlier fixtures with
//!   `=>Model.identifier`, including the record being created
//! - **Blueprints**: named per-model defaults and `beforeCreate` /
//!   `afterCreate` callbacks
//! - **Raw tables**: names that are not models are inserted directly and
//!   can be referenced like any other fixture
//! - **Commands**: `loadfixtures` for writing fixture files in order
//!
//! # Quick Start
//!
//! ```
//! use fixtura_db::{MemoryStore, ModelSchema};
//! use fixtura_seeding::prelude::*;
//!
//! let store = MemoryStore::new()
//! 	.with_model(ModelSchema::new("Category").field("Title").has_one("Parent", "Category"));
//! let mut factory = FixtureFactory::new(store);
//!
//! let fixture = YamlFixture::new(
//! 	"Category:\n  root:\n    Title: Root\n    Parent: =>Category.root\n",
//! );
//! fixture.write_into(&mut factory)?;
//!
//! let root = factory.get("Category", "root")?.unwrap();
//! assert_eq!(root.foreign_key("Parent"), root.id());
//! # Ok::<(), SeedingError>(())
//! ```
//!
//! # Architecture
//!
//! - [`FixtureFactory`](fixtures::FixtureFactory) owns the store, the
//!   [`FixtureRegistry`](fixtures::FixtureRegistry) and the blueprints
//! - [`Blueprint`](fixtures::Blueprint) performs the write sequence for one record
//! - [`ValueResolver`](fixtures::ValueResolver) turns parsed
//!   [`FixtureValue`](fixtures::FixtureValue)s into stored values
//! - [`YamlFixture`](fixtures::YamlFixture) reads documents and writes them into a factory
//! - [`settings`] and [`testing`] provide configuration and test-case helpers

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod commands;
pub mod error;
pub mod fixtures;
pub mod prelude;
pub mod settings;
pub mod testing;

// Re-export commonly used types at crate root
pub use error::{SeedingError, SeedingResult};
pub use fixtures::{
	Blueprint, FieldMap, FixtureFactory, FixtureFormat, FixtureRegistry, FixtureValue, YamlFixture,
};

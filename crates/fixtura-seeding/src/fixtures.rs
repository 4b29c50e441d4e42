//! Fixture materialization.
//!
//! - [`FixtureValue`] / [`ValueResolver`] - parsed field values and
//!   `=>Model.identifier` reference resolution
//! - [`FixtureRegistry`] - identifier to persisted id mapping
//! - [`Blueprint`] - per-model defaults and callbacks
//! - [`FixtureFactory`] - creates records and owns the registry
//! - [`FixtureDocument`] / [`YamlFixture`] - document parsing and loading

pub mod blueprint;
pub mod document;
pub mod factory;
pub mod format;
pub mod parser;
pub mod registry;
pub mod value;

pub use blueprint::{
	Blueprint, CallbackContext, CallbackId, CallbackKind, DefaultFn, DefaultValue, FixtureCallback,
};
pub use document::{FixtureDocument, LoadResult, ModelBlock, YamlFixture};
pub use factory::FixtureFactory;
pub use format::FixtureFormat;
pub use parser::FixtureParser;
pub use registry::FixtureRegistry;
pub use value::{
	FieldMap, FixtureRef, FixtureValue, REFERENCE_SENTINEL, RelationItem, RelationTarget,
	ValueResolver,
};

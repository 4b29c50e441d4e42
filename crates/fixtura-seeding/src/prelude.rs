//! Convenience re-exports for common usage.
//!
//! ```
//! use fixtura_seeding::prelude::*;
//! ```

// Error types
pub use crate::error::{SeedingError, SeedingResult};

// Fixture types
pub use crate::fixtures::{
	Blueprint, CallbackContext, CallbackKind, DefaultValue, FieldMap, FixtureDocument,
	FixtureFactory, FixtureFormat, FixtureRef, FixtureRegistry, FixtureValue, LoadResult,
	ValueResolver, YamlFixture,
};

// Command types
pub use crate::commands::{LoadFixturesArgs, LoadFixturesCommand, LoadFixturesOptions};

// Settings and test helpers
pub use crate::settings::{ConfigSource, FixtureSettings, SettingsBuilder};
pub use crate::testing::FixtureTestCase;

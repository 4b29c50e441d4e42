//! # fixtura
//!
//! Declarative fixture graphs for tests and seed data.
//!
//! Fixture documents describe records as `model -> identifier -> fields`.
//! Fields can point at other fixtures with `=>Model.identifier`; the
//! materializer writes records in document order, resolves references into
//! persisted ids and remembers every id so tests can look records up by
//! identifier later.
//!
//! ## Feature Flags
//!
//! - `minimal` - persistence boundary and in-memory store ([`db`])
//! - `seeding` - fixture factory, YAML loading, settings ([`seeding`])
//! - `full` (default) - everything
//!
//! ## Quick Example
//!
//! ```rust
//! # #[cfg(feature = "seeding")]
//! # fn main() -> Result<(), fixtura::seeding::SeedingError> {
//! use fixtura::prelude::*;
//!
//! let store = MemoryStore::new()
//! 	.with_model(
//! 		ModelSchema::new("Team")
//! 			.field("Title")
//! 			.has_many("Players", "Player"),
//! 	)
//! 	.with_model(ModelSchema::new("Player").field("Name").has_one("Team", "Team"));
//! let mut factory = FixtureFactory::new(store);
//!
//! YamlFixture::new(
//! 	"Player:\n  joe:\n    Name: Joe\nTeam:\n  reds:\n    Title: Reds\n    Players: =>Player.joe\n",
//! )
//! .write_into(&mut factory)?;
//!
//! let reds = factory.get("Team", "reds")?.unwrap();
//! let players = factory.store().related("Team", reds.id().unwrap(), "Players")?;
//! assert_eq!(players[0].id, factory.get_id("Player", "joe").unwrap());
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "seeding"))]
//! # fn main() {}
//! ```

#[cfg(feature = "minimal")]
pub mod db;
#[cfg(feature = "seeding")]
pub mod seeding;

#[cfg(feature = "minimal")]
pub use fixtura_db::{DbError, DbResult, MemoryStore, ModelSchema, Record, RecordId, Store};

#[cfg(feature = "seeding")]
pub use fixtura_seeding::{
	Blueprint, FieldMap, FixtureFactory, FixtureValue, SeedingError, SeedingResult, YamlFixture,
};

/// Prelude module for convenient imports
pub mod prelude {
	#[cfg(feature = "minimal")]
	pub use crate::db::{
		Link, MemoryStore, ModelSchema, Record, RecordId, RelationKind, SchemaProvider, Store,
	};

	#[cfg(feature = "seeding")]
	pub use fixtura_seeding::prelude::*;
}

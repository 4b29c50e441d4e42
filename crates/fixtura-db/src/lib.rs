//! Persistence boundary for the fixtura fixture materializer.
//!
//! The fixture factory never talks to a database directly. It consumes two
//! capabilities defined here:
//!
//! - [`SchemaProvider`] - introspection of models, fields and relations
//! - [`Store`] - record persistence, relation sets and raw table access
//!
//! [`MemoryStore`] implements both in process and is what the fixture tests
//! run against.
//!
//! # Example
//!
//! ```
//! use fixtura_db::{MemoryStore, ModelSchema, Store};
//!
//! let mut store = MemoryStore::new()
//! 	.with_model(ModelSchema::new("Team").field("Title"))
//! 	.with_model(ModelSchema::new("Player").field("Name").has_one("Team", "Team"));
//!
//! let mut team = store.instantiate("Team").unwrap();
//! team.set("Title", "Reds");
//! let team_id = store.write(&mut team).unwrap();
//!
//! let mut player = store.instantiate("Player").unwrap();
//! player.set("TeamID", team_id);
//! store.write(&mut player).unwrap();
//! assert_eq!(player.foreign_key("Team"), Some(team_id));
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod memory;
pub mod record;
pub mod schema;
pub mod store;

pub use error::{DbError, DbResult};
pub use memory::MemoryStore;
pub use record::{
	CREATED_FIELD, Fields, ID_FIELD, LAST_EDITED_FIELD, Link, Record, RecordId, class_field,
	foreign_key_field, value_as_id,
};
pub use schema::{ModelSchema, POLYMORPHIC_TARGET, Relation, RelationKind, SchemaProvider};
pub use store::Store;

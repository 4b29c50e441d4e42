//! Persistence boundary.
//!
//! Models, records, the [`Store`] trait and the in-memory reference store.
//!
//! ```rust
//! use fixtura::db::{MemoryStore, ModelSchema, SchemaProvider};
//!
//! let store = MemoryStore::new().with_model(ModelSchema::new("Team").with_table("teams"));
//! assert_eq!(store.model_for_table("teams").as_deref(), Some("Team"));
//! ```

pub use fixtura_db::*;

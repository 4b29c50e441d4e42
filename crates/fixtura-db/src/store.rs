//! The persistence capability consumed by the fixture materializer.

use crate::error::{DbError, DbResult};
use crate::record::{Fields, Link, Record, RecordId};
use crate::schema::SchemaProvider;

/// Persistence boundary.
///
/// All calls are synchronous and blocking. Implementations are free to back
/// this with a real database; [`MemoryStore`](crate::MemoryStore) keeps
/// everything in process.
pub trait Store: SchemaProvider {
	/// Creates a blank, unsaved record of `model`.
	fn instantiate(&self, model: &str) -> DbResult<Record> {
		if self.has_model(model) {
			Ok(Record::new(model))
		} else {
			Err(DbError::UnknownModel(model.to_string()))
		}
	}

	/// Inserts or updates `record`, assigning its id on first insert.
	///
	/// A record carrying an id that has no row yet is inserted under that
	/// id, which requires explicit ids to be permitted on its table.
	fn write(&mut self, record: &mut Record) -> DbResult<RecordId>;

	/// Deletes a model row together with the relation sets it owns.
	fn delete(&mut self, model: &str, id: RecordId) -> DbResult<()>;

	/// Fetches a model row.
	fn get_by_id(&self, model: &str, id: RecordId) -> DbResult<Option<Record>>;

	/// Replaces the whole relation set `relation` of the record.
	fn replace_related(
		&mut self,
		model: &str,
		id: RecordId,
		relation: &str,
		links: Vec<Link>,
	) -> DbResult<()>;

	/// Returns the relation set `relation` of the record.
	fn related(&self, model: &str, id: RecordId, relation: &str) -> DbResult<Vec<Link>>;

	/// Inserts a row directly into `table`, bypassing models.
	fn insert_raw(&mut self, table: &str, fields: Fields) -> DbResult<RecordId>;

	/// Updates columns of an existing row without write side effects.
	fn update_raw(&mut self, table: &str, id: RecordId, fields: Fields) -> DbResult<()>;

	/// Deletes a row directly from `table`.
	fn delete_raw(&mut self, table: &str, id: RecordId) -> DbResult<()>;

	/// Permits or forbids writing explicit primary keys into `table`.
	fn set_explicit_ids(&mut self, table: &str, allowed: bool);

	/// Returns true if explicit primary keys are currently permitted in `table`.
	fn explicit_ids(&self, table: &str) -> bool;
}

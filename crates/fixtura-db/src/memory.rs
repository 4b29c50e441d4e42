//! In-process reference [`Store`].

use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{DbError, DbResult};
use crate::record::{
	CREATED_FIELD, Fields, ID_FIELD, LAST_EDITED_FIELD, Link, Record, RecordId, value_as_id,
};
use crate::schema::{ModelSchema, RelationKind, SchemaProvider};
use crate::store::Store;

#[derive(Debug)]
struct Table {
	rows: BTreeMap<RecordId, Fields>,
	next_id: RecordId,
	explicit_ids: bool,
}

impl Default for Table {
	fn default() -> Self {
		Self {
			rows: BTreeMap::new(),
			next_id: 1,
			explicit_ids: false,
		}
	}
}

impl Table {
	fn allocate_id(&mut self) -> RecordId {
		let id = self.next_id;
		self.next_id += 1;
		id
	}

	fn claim_id(&mut self, table: &str, id: RecordId) -> DbResult<()> {
		let next = id.checked_add(1).ok_or_else(|| DbError::InvalidValue {
			field: ID_FIELD.to_string(),
			message: format!("primary key {} in {} leaves no room for further ids", id, table),
		})?;
		self.next_id = self.next_id.max(next);
		Ok(())
	}
}

type RelationKey = (String, RecordId, String);

/// Store keeping tables and relation sets in memory.
///
/// Behaves like a typical ORM backed database for the purposes of fixture
/// loading:
///
/// - ids auto increment per table and explicit ids are rejected unless
///   permitted through [`Store::set_explicit_ids`]
/// - `Created` is stamped on insert and kept on update, `LastEdited` is
///   stamped on every write
/// - an owned to-many child belongs to a single owner per relation
///
/// # Example
///
/// ```
/// use fixtura_db::{MemoryStore, ModelSchema, Store};
///
/// let mut store = MemoryStore::new().with_model(ModelSchema::new("Team").field("Title"));
/// let mut team = store.instantiate("Team").unwrap();
/// team.set("Title", "Reds");
/// let id = store.write(&mut team).unwrap();
/// assert_eq!(id, 1);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
	schemas: IndexMap<String, ModelSchema>,
	tables: HashMap<String, Table>,
	relations: HashMap<RelationKey, Vec<Link>>,
}

impl MemoryStore {
	/// Creates an empty store without models.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a model, builder style.
	pub fn with_model(mut self, schema: ModelSchema) -> Self {
		self.register_model(schema);
		self
	}

	/// Registers a model.
	pub fn register_model(&mut self, schema: ModelSchema) {
		self.tables.entry(schema.table().to_string()).or_default();
		self.schemas.insert(schema.name().to_string(), schema);
	}

	/// Returns a raw row.
	pub fn row(&self, table: &str, id: RecordId) -> Option<&Fields> {
		self.tables.get(table).and_then(|t| t.rows.get(&id))
	}

	/// Returns the number of rows in `table`.
	pub fn row_count(&self, table: &str) -> usize {
		self.tables.get(table).map_or(0, |t| t.rows.len())
	}

	/// Returns the names of all tables, registered or created by raw inserts.
	pub fn table_names(&self) -> Vec<String> {
		let mut names: Vec<String> = self.tables.keys().cloned().collect();
		names.sort();
		names
	}

	fn model_table(&self, model: &str) -> DbResult<String> {
		self.table_name(model)
			.ok_or_else(|| DbError::UnknownModel(model.to_string()))
	}

	fn timestamp() -> Value {
		Value::String(chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string())
	}
}

impl SchemaProvider for MemoryStore {
	fn model(&self, model: &str) -> Option<&ModelSchema> {
		self.schemas.get(model)
	}

	fn model_names(&self) -> Vec<String> {
		self.schemas.keys().cloned().collect()
	}
}

impl Store for MemoryStore {
	fn write(&mut self, record: &mut Record) -> DbResult<RecordId> {
		let table_name = self.model_table(record.model())?;
		let table = self.tables.entry(table_name.clone()).or_default();
		let now = Self::timestamp();

		let existing = record
			.id()
			.and_then(|id| table.rows.get(&id))
			.map(|row| row.get(CREATED_FIELD).cloned());
		let id = match (record.id(), existing) {
			(Some(id), Some(created)) => {
				if let Some(created) = created
					&& record.get(CREATED_FIELD).is_none()
				{
					record.set(CREATED_FIELD, created);
				}
				id
			}
			(Some(id), None) => {
				if !table.explicit_ids {
					return Err(DbError::ExplicitIdRejected {
						table: table_name,
						id,
					});
				}
				table.claim_id(&table_name, id)?;
				record.set(CREATED_FIELD, now.clone());
				id
			}
			(None, _) => {
				let id = table.allocate_id();
				record.set_id(id);
				record.set(CREATED_FIELD, now.clone());
				id
			}
		};
		record.set(LAST_EDITED_FIELD, now);
		table.rows.insert(id, record.fields().clone());
		tracing::trace!(table = %table_name, id, "row written");
		Ok(id)
	}

	fn delete(&mut self, model: &str, id: RecordId) -> DbResult<()> {
		let table_name = self.model_table(model)?;
		let removed = self
			.tables
			.get_mut(&table_name)
			.and_then(|t| t.rows.remove(&id));
		if removed.is_none() {
			return Err(DbError::RecordNotFound {
				table: table_name,
				id,
			});
		}
		self.relations
			.retain(|(owner, owner_id, _), _| !(owner == model && *owner_id == id));
		Ok(())
	}

	fn get_by_id(&self, model: &str, id: RecordId) -> DbResult<Option<Record>> {
		let table_name = self.model_table(model)?;
		Ok(self
			.row(&table_name, id)
			.map(|fields| Record::from_row(model, id, fields.clone())))
	}

	fn replace_related(
		&mut self,
		model: &str,
		id: RecordId,
		relation: &str,
		links: Vec<Link>,
	) -> DbResult<()> {
		let kind = self
			.model(model)
			.ok_or_else(|| DbError::UnknownModel(model.to_string()))?
			.to_many_relation(relation)
			.map(|(kind, _)| kind)
			.ok_or_else(|| DbError::UnknownRelation {
				model: model.to_string(),
				relation: relation.to_string(),
			})?;

		if kind == RelationKind::ToManyOwned {
			for ((owner, owner_id, name), existing) in self.relations.iter_mut() {
				if owner == model && name == relation && *owner_id != id {
					existing.retain(|link| !links.iter().any(|l| l.id == link.id));
				}
			}
		}

		self.relations
			.insert((model.to_string(), id, relation.to_string()), links);
		Ok(())
	}

	fn related(&self, model: &str, id: RecordId, relation: &str) -> DbResult<Vec<Link>> {
		if !self.has_model(model) {
			return Err(DbError::UnknownModel(model.to_string()));
		}
		Ok(self
			.relations
			.get(&(model.to_string(), id, relation.to_string()))
			.cloned()
			.unwrap_or_default())
	}

	fn insert_raw(&mut self, table: &str, mut fields: Fields) -> DbResult<RecordId> {
		let explicit = match fields.shift_remove(ID_FIELD) {
			Some(value) => Some(value_as_id(&value).ok_or_else(|| DbError::InvalidValue {
				field: ID_FIELD.to_string(),
				message: format!("{} is not a valid primary key", value),
			})?),
			None => None,
		};

		let entry = self.tables.entry(table.to_string()).or_default();
		let id = match explicit {
			Some(id) if entry.rows.contains_key(&id) => {
				return Err(DbError::InvalidValue {
					field: ID_FIELD.to_string(),
					message: format!("duplicate primary key {} in {}", id, table),
				});
			}
			Some(id) => {
				entry.claim_id(table, id)?;
				id
			}
			None => entry.allocate_id(),
		};
		entry.rows.insert(id, fields);
		Ok(id)
	}

	fn update_raw(&mut self, table: &str, id: RecordId, fields: Fields) -> DbResult<()> {
		let row = self
			.tables
			.get_mut(table)
			.ok_or_else(|| DbError::UnknownTable(table.to_string()))?
			.rows
			.get_mut(&id)
			.ok_or_else(|| DbError::RecordNotFound {
				table: table.to_string(),
				id,
			})?;
		row.extend(fields);
		Ok(())
	}

	fn delete_raw(&mut self, table: &str, id: RecordId) -> DbResult<()> {
		self.tables
			.get_mut(table)
			.ok_or_else(|| DbError::UnknownTable(table.to_string()))?
			.rows
			.remove(&id)
			.map(|_| ())
			.ok_or_else(|| DbError::RecordNotFound {
				table: table.to_string(),
				id,
			})
	}

	fn set_explicit_ids(&mut self, table: &str, allowed: bool) {
		self.tables.entry(table.to_string()).or_default().explicit_ids = allowed;
	}

	fn explicit_ids(&self, table: &str) -> bool {
		self.tables.get(table).is_some_and(|t| t.explicit_ids)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};
	use serde_json::json;

	#[fixture]
	fn store() -> MemoryStore {
		MemoryStore::new()
			.with_model(
				ModelSchema::new("Team")
					.field("Title")
					.has_many("Players", "Player")
					.many_many("Sponsors", "Sponsor"),
			)
			.with_model(ModelSchema::new("Player").field("Name").has_one("Team", "Team"))
			.with_model(ModelSchema::new("Sponsor").with_table("sponsors").field("Name"))
	}

	#[rstest]
	fn test_write_assigns_sequential_ids(mut store: MemoryStore) {
		let mut a = store.instantiate("Team").unwrap();
		let mut b = store.instantiate("Team").unwrap();
		assert_eq!(store.write(&mut a).unwrap(), 1);
		assert_eq!(store.write(&mut b).unwrap(), 2);
		assert_eq!(a.id(), Some(1));
		assert!(a.get(CREATED_FIELD).is_some());
		assert!(a.get(LAST_EDITED_FIELD).is_some());
	}

	#[rstest]
	fn test_instantiate_unknown_model(store: MemoryStore) {
		assert!(matches!(
			store.instantiate("Coach"),
			Err(DbError::UnknownModel(_))
		));
	}

	#[rstest]
	fn test_explicit_id_requires_permission(mut store: MemoryStore) {
		let mut team = store.instantiate("Team").unwrap();
		team.set_id(40);
		assert!(matches!(
			store.write(&mut team),
			Err(DbError::ExplicitIdRejected { id: 40, .. })
		));

		store.set_explicit_ids("Team", true);
		assert_eq!(store.write(&mut team).unwrap(), 40);
		store.set_explicit_ids("Team", false);

		let mut next = store.instantiate("Team").unwrap();
		assert_eq!(store.write(&mut next).unwrap(), 41);
	}

	#[rstest]
	fn test_get_by_id_uses_table_name(mut store: MemoryStore) {
		let mut sponsor = store.instantiate("Sponsor").unwrap();
		sponsor.set("Name", "Acme");
		let id = store.write(&mut sponsor).unwrap();

		assert_eq!(store.row_count("sponsors"), 1);
		let loaded = store.get_by_id("Sponsor", id).unwrap().unwrap();
		assert_eq!(loaded.get_str("Name"), Some("Acme"));
	}

	#[rstest]
	fn test_owned_relation_is_exclusive(mut store: MemoryStore) {
		store
			.replace_related("Team", 1, "Players", vec![Link::new(10), Link::new(11)])
			.unwrap();
		store
			.replace_related("Team", 2, "Players", vec![Link::new(11)])
			.unwrap();

		let first: Vec<RecordId> = store
			.related("Team", 1, "Players")
			.unwrap()
			.iter()
			.map(|l| l.id)
			.collect();
		assert_eq!(first, vec![10]);
	}

	#[rstest]
	fn test_shared_relation_is_not_exclusive(mut store: MemoryStore) {
		store
			.replace_related("Team", 1, "Sponsors", vec![Link::new(5)])
			.unwrap();
		store
			.replace_related("Team", 2, "Sponsors", vec![Link::new(5)])
			.unwrap();
		assert_eq!(store.related("Team", 1, "Sponsors").unwrap().len(), 1);
	}

	#[rstest]
	fn test_replace_related_unknown_relation(mut store: MemoryStore) {
		let result = store.replace_related("Team", 1, "Coaches", vec![]);
		assert!(matches!(result, Err(DbError::UnknownRelation { .. })));
	}

	#[rstest]
	fn test_delete_drops_owned_relation_sets(mut store: MemoryStore) {
		let mut team = store.instantiate("Team").unwrap();
		let id = store.write(&mut team).unwrap();
		store
			.replace_related("Team", id, "Sponsors", vec![Link::new(1)])
			.unwrap();

		store.delete("Team", id).unwrap();
		assert!(store.get_by_id("Team", id).unwrap().is_none());
		assert!(store.related("Team", id, "Sponsors").unwrap().is_empty());
		assert!(matches!(
			store.delete("Team", id),
			Err(DbError::RecordNotFound { .. })
		));
	}

	#[rstest]
	fn test_raw_rows(mut store: MemoryStore) {
		let mut fields = Fields::new();
		fields.insert("Key".to_string(), json!("a"));
		let id = store.insert_raw("Lookup", fields).unwrap();
		assert_eq!(id, 1);

		let mut update = Fields::new();
		update.insert("Key".to_string(), json!("b"));
		store.update_raw("Lookup", id, update).unwrap();
		assert_eq!(store.row("Lookup", id).unwrap()["Key"], json!("b"));

		store.delete_raw("Lookup", id).unwrap();
		assert_eq!(store.row_count("Lookup"), 0);
	}

	#[rstest]
	fn test_raw_insert_with_explicit_id(mut store: MemoryStore) {
		let mut fields = Fields::new();
		fields.insert(ID_FIELD.to_string(), json!(7));
		assert_eq!(store.insert_raw("Lookup", fields.clone()).unwrap(), 7);
		assert!(matches!(
			store.insert_raw("Lookup", fields),
			Err(DbError::InvalidValue { .. })
		));
		assert_eq!(store.insert_raw("Lookup", Fields::new()).unwrap(), 8);
	}

	#[rstest]
	fn test_largest_explicit_id_is_rejected(mut store: MemoryStore) {
		let mut fields = Fields::new();
		fields.insert(ID_FIELD.to_string(), json!(RecordId::MAX));
		assert!(matches!(
			store.insert_raw("Lookup", fields),
			Err(DbError::InvalidValue { .. })
		));
		assert_eq!(store.row_count("Lookup"), 0);

		store.set_explicit_ids("Team", true);
		let mut team = store.instantiate("Team").unwrap();
		team.set_id(RecordId::MAX);
		assert!(matches!(
			store.write(&mut team),
			Err(DbError::InvalidValue { .. })
		));
		assert!(store.get_by_id("Team", RecordId::MAX).unwrap().is_none());
	}

	#[rstest]
	fn test_update_keeps_created_stamp(mut store: MemoryStore) {
		store.set_explicit_ids("Team", true);
		let mut first = store.instantiate("Team").unwrap();
		first.set_id(7);
		first.set("Title", "x");
		store.write(&mut first).unwrap();
		let created = first.get(CREATED_FIELD).cloned().unwrap();

		// a fresh record written over the same id is an update
		let mut second = store.instantiate("Team").unwrap();
		second.set_id(7);
		second.set("Title", "y");
		store.write(&mut second).unwrap();

		let stored = store.get_by_id("Team", 7).unwrap().unwrap();
		assert_eq!(stored.get_str("Title"), Some("y"));
		assert_eq!(stored.get(CREATED_FIELD), Some(&created));
		assert_eq!(second.get(CREATED_FIELD), Some(&created));
	}

	#[rstest]
	fn test_explicit_ids_flag(mut store: MemoryStore) {
		assert!(!store.explicit_ids("Team"));
		store.set_explicit_ids("Team", true);
		assert!(store.explicit_ids("Team"));
		assert!(!store.explicit_ids("Player"));
	}
}

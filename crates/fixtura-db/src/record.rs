//! Records as seen across the persistence boundary.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Persisted primary key.
pub type RecordId = u64;

/// Ordered field values of a record or a raw row.
pub type Fields = IndexMap<String, Value>;

/// Name of the primary key column.
pub const ID_FIELD: &str = "ID";

/// Audit field stamped on every write.
pub const LAST_EDITED_FIELD: &str = "LastEdited";

/// Audit field stamped on insert.
pub const CREATED_FIELD: &str = "Created";

/// Returns the foreign key column backing a to-one relation.
///
/// # Example
///
/// ```
/// # use fixtura_db::foreign_key_field;
/// assert_eq!(foreign_key_field("Team"), "TeamID");
/// ```
pub fn foreign_key_field(relation: &str) -> String {
	format!("{}ID", relation)
}

/// Returns the column recording the target model of a polymorphic to-one relation.
pub fn class_field(relation: &str) -> String {
	format!("{}Class", relation)
}

/// A single model instance.
///
/// `id` is `None` until the first successful write, unless the caller
/// assigns an explicit primary key beforehand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
	model: String,
	id: Option<RecordId>,
	fields: Fields,
}

impl Record {
	/// Creates a blank, unsaved record of `model`.
	pub fn new(model: impl Into<String>) -> Self {
		Self {
			model: model.into(),
			id: None,
			fields: Fields::new(),
		}
	}

	/// Creates a record from an existing row.
	pub fn from_row(model: impl Into<String>, id: RecordId, fields: Fields) -> Self {
		Self {
			model: model.into(),
			id: Some(id),
			fields,
		}
	}

	/// Returns the model name.
	pub fn model(&self) -> &str {
		&self.model
	}

	/// Returns the primary key, if any.
	pub fn id(&self) -> Option<RecordId> {
		self.id
	}

	/// Assigns the primary key.
	pub fn set_id(&mut self, id: RecordId) {
		self.id = Some(id);
	}

	/// Returns a field value.
	pub fn get(&self, field: &str) -> Option<&Value> {
		self.fields.get(field)
	}

	/// Returns a field value as a string slice.
	pub fn get_str(&self, field: &str) -> Option<&str> {
		self.fields.get(field).and_then(Value::as_str)
	}

	/// Sets a field value.
	pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
		self.fields.insert(field.into(), value.into());
	}

	/// Returns the id stored in the foreign key column of `relation`.
	pub fn foreign_key(&self, relation: &str) -> Option<RecordId> {
		self.fields
			.get(&foreign_key_field(relation))
			.and_then(value_as_id)
	}

	/// Returns all field values.
	pub fn fields(&self) -> &Fields {
		&self.fields
	}

	/// Returns all field values mutably.
	pub fn fields_mut(&mut self) -> &mut Fields {
		&mut self.fields
	}
}

/// Member of a to-many relation set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
	/// Related record id.
	pub id: RecordId,
	/// Extra per-link fields, only meaningful for shared relations.
	#[serde(default, skip_serializing_if = "IndexMap::is_empty")]
	pub extra: Fields,
}

impl Link {
	/// Creates a link without extra fields.
	pub fn new(id: RecordId) -> Self {
		Self {
			id,
			extra: Fields::new(),
		}
	}

	/// Creates a link carrying extra fields.
	pub fn with_extra(id: RecordId, extra: Fields) -> Self {
		Self { id, extra }
	}
}

/// Interprets a stored value as a primary key.
///
/// Accepts unsigned integers and strings made of digits.
pub fn value_as_id(value: &Value) -> Option<RecordId> {
	match value {
		Value::Number(n) => n.as_u64(),
		Value::String(s) => s.trim().parse().ok(),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_new_record_is_unsaved() {
		let record = Record::new("Team");
		assert_eq!(record.model(), "Team");
		assert!(record.id().is_none());
		assert!(record.fields().is_empty());
	}

	#[rstest]
	fn test_foreign_key_reads_id_column() {
		let mut record = Record::new("Player");
		record.set("TeamID", 4);
		assert_eq!(record.foreign_key("Team"), Some(4));
		assert_eq!(record.foreign_key("Coach"), None);
	}

	#[rstest]
	#[case(json!(3), Some(3))]
	#[case(json!("12"), Some(12))]
	#[case(json!(" 8 "), Some(8))]
	#[case(json!("abc"), None)]
	#[case(json!(-1), None)]
	#[case(json!(null), None)]
	fn test_value_as_id(#[case] value: Value, #[case] expected: Option<RecordId>) {
		assert_eq!(value_as_id(&value), expected);
	}
}

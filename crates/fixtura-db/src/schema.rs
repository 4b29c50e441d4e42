//! Model schema descriptions and the introspection capability.
//!
//! A [`ModelSchema`] describes one model: its table, its scalar fields and
//! its relations. [`SchemaProvider`] is the introspection interface the
//! fixture materializer consumes to classify fixture fields.

use indexmap::IndexMap;

/// Relation target marking a polymorphic to-one relation.
///
/// A polymorphic relation stores the referenced model next to the foreign
/// key, in the `<Relation>Class` column.
pub const POLYMORPHIC_TARGET: &str = "*";

/// Classification of a field name against a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
	/// Plain column.
	Scalar,
	/// Single related record stored as a foreign key.
	ToOne,
	/// Exclusively owned child collection.
	ToManyOwned,
	/// Many-to-many collection, optionally with per-link extra fields.
	ToManyShared,
}

impl RelationKind {
	/// Returns true for both to-many kinds.
	pub fn is_to_many(&self) -> bool {
		matches!(self, Self::ToManyOwned | Self::ToManyShared)
	}
}

/// A named relation and the model it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
	/// Relation name as used in fixture documents.
	pub name: String,
	/// Target model, or [`POLYMORPHIC_TARGET`].
	pub target: String,
}

impl Relation {
	/// Creates a relation.
	pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			target: target.into(),
		}
	}

	/// Returns true if the relation may point at any model.
	pub fn is_polymorphic(&self) -> bool {
		self.target == POLYMORPHIC_TARGET
	}
}

/// Schema of a single model.
///
/// # Example
///
/// ```
/// use fixtura_db::{ModelSchema, RelationKind};
///
/// let schema = ModelSchema::new("Player")
/// 	.field("Name")
/// 	.has_one("Team", "Team")
/// 	.many_many("Tags", "Tag");
///
/// assert_eq!(schema.table(), "Player");
/// assert_eq!(schema.relation_kinds("Team"), vec![RelationKind::ToOne]);
/// assert_eq!(schema.relation_kinds("Name"), vec![RelationKind::Scalar]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSchema {
	name: String,
	table: String,
	fields: Vec<String>,
	to_one: IndexMap<String, Relation>,
	to_many_owned: IndexMap<String, Relation>,
	to_many_shared: IndexMap<String, Relation>,
}

impl ModelSchema {
	/// Creates a schema whose table name equals the model name.
	pub fn new(name: impl Into<String>) -> Self {
		let name = name.into();
		Self {
			table: name.clone(),
			name,
			fields: Vec::new(),
			to_one: IndexMap::new(),
			to_many_owned: IndexMap::new(),
			to_many_shared: IndexMap::new(),
		}
	}

	/// Overrides the table name.
	pub fn with_table(mut self, table: impl Into<String>) -> Self {
		self.table = table.into();
		self
	}

	/// Declares a scalar field.
	pub fn field(mut self, name: impl Into<String>) -> Self {
		self.fields.push(name.into());
		self
	}

	/// Declares several scalar fields.
	pub fn fields<I, S>(mut self, names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.fields.extend(names.into_iter().map(Into::into));
		self
	}

	/// Declares a to-one relation.
	pub fn has_one(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
		let relation = Relation::new(name, target);
		self.to_one.insert(relation.name.clone(), relation);
		self
	}

	/// Declares an exclusively owned to-many relation.
	pub fn has_many(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
		let relation = Relation::new(name, target);
		self.to_many_owned.insert(relation.name.clone(), relation);
		self
	}

	/// Declares a shared many-to-many relation.
	pub fn many_many(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
		let relation = Relation::new(name, target);
		self.to_many_shared.insert(relation.name.clone(), relation);
		self
	}

	/// Returns the model name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Returns the table name.
	pub fn table(&self) -> &str {
		&self.table
	}

	/// Returns the declared scalar fields.
	pub fn field_names(&self) -> &[String] {
		&self.fields
	}

	/// Returns true if `name` is a declared scalar field or a foreign key /
	/// class column derived from a to-one relation.
	pub fn has_field(&self, name: &str) -> bool {
		if self.fields.iter().any(|f| f == name) {
			return true;
		}
		self.to_one.values().any(|relation| {
			name.strip_prefix(relation.name.as_str())
				.is_some_and(|suffix| suffix == "ID" || (relation.is_polymorphic() && suffix == "Class"))
		})
	}

	/// Returns the to-one relations.
	pub fn to_one(&self) -> impl Iterator<Item = &Relation> {
		self.to_one.values()
	}

	/// Returns the owned to-many relations.
	pub fn to_many_owned(&self) -> impl Iterator<Item = &Relation> {
		self.to_many_owned.values()
	}

	/// Returns the shared to-many relations.
	pub fn to_many_shared(&self) -> impl Iterator<Item = &Relation> {
		self.to_many_shared.values()
	}

	/// Looks up a to-one relation by its name or by its `<name>ID` column.
	pub fn to_one_relation(&self, field: &str) -> Option<&Relation> {
		self.to_one.get(field).or_else(|| {
			field
				.strip_suffix("ID")
				.and_then(|relation| self.to_one.get(relation))
		})
	}

	/// Looks up a to-many relation of either kind.
	pub fn to_many_relation(&self, field: &str) -> Option<(RelationKind, &Relation)> {
		self.to_many_owned
			.get(field)
			.map(|r| (RelationKind::ToManyOwned, r))
			.or_else(|| {
				self.to_many_shared
					.get(field)
					.map(|r| (RelationKind::ToManyShared, r))
			})
	}

	/// Returns every relation kind `field` classifies as.
	///
	/// A well formed schema yields exactly one kind; more than one signals
	/// an ambiguous declaration the caller must reject.
	pub fn relation_kinds(&self, field: &str) -> Vec<RelationKind> {
		let mut kinds = Vec::new();
		if self.to_many_owned.contains_key(field) {
			kinds.push(RelationKind::ToManyOwned);
		}
		if self.to_many_shared.contains_key(field) {
			kinds.push(RelationKind::ToManyShared);
		}
		if kinds.is_empty() && self.to_one_relation(field).is_some() {
			kinds.push(RelationKind::ToOne);
		}
		if kinds.is_empty() {
			kinds.push(RelationKind::Scalar);
		}
		kinds
	}
}

/// Schema introspection capability.
///
/// Implemented by whichever persistence layer backs the fixtures.
pub trait SchemaProvider {
	/// Returns the schema of `model`.
	fn model(&self, model: &str) -> Option<&ModelSchema>;

	/// Returns every known model name.
	fn model_names(&self) -> Vec<String>;

	/// Returns true if `model` is a known model.
	fn has_model(&self, model: &str) -> bool {
		self.model(model).is_some()
	}

	/// Returns the declared scalar fields of `model`.
	fn field_names(&self, model: &str) -> Vec<String> {
		self.model(model)
			.map(|schema| schema.field_names().to_vec())
			.unwrap_or_default()
	}

	/// Returns the to-one relations of `model`.
	fn to_one_relations(&self, model: &str) -> Vec<Relation> {
		self.model(model)
			.map(|schema| schema.to_one().cloned().collect())
			.unwrap_or_default()
	}

	/// Returns the owned to-many relations of `model`.
	fn to_many_owned_relations(&self, model: &str) -> Vec<Relation> {
		self.model(model)
			.map(|schema| schema.to_many_owned().cloned().collect())
			.unwrap_or_default()
	}

	/// Returns the shared to-many relations of `model`.
	fn to_many_shared_relations(&self, model: &str) -> Vec<Relation> {
		self.model(model)
			.map(|schema| schema.to_many_shared().cloned().collect())
			.unwrap_or_default()
	}

	/// Returns the table backing `model`.
	fn table_name(&self, model: &str) -> Option<String> {
		self.model(model).map(|schema| schema.table().to_string())
	}

	/// Returns the model stored in `table`.
	fn model_for_table(&self, table: &str) -> Option<String> {
		self.model_names().into_iter().find(|name| {
			self.model(name)
				.is_some_and(|schema| schema.table() == table)
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn category() -> ModelSchema {
		ModelSchema::new("Category")
			.with_table("category")
			.field("Title")
			.has_one("Parent", "Category")
			.has_one("Owner", POLYMORPHIC_TARGET)
			.has_many("Children", "Category")
			.many_many("Tags", "Tag")
	}

	#[rstest]
	#[case("Title", RelationKind::Scalar)]
	#[case("Parent", RelationKind::ToOne)]
	#[case("ParentID", RelationKind::ToOne)]
	#[case("Children", RelationKind::ToManyOwned)]
	#[case("Tags", RelationKind::ToManyShared)]
	#[case("Unknown", RelationKind::Scalar)]
	fn test_relation_kinds(#[case] field: &str, #[case] kind: RelationKind) {
		assert_eq!(category().relation_kinds(field), vec![kind]);
	}

	#[rstest]
	fn test_ambiguous_relation_reports_both_kinds() {
		let schema = ModelSchema::new("Team")
			.has_many("Players", "Player")
			.many_many("Players", "Player");
		assert_eq!(
			schema.relation_kinds("Players"),
			vec![RelationKind::ToManyOwned, RelationKind::ToManyShared]
		);
	}

	#[rstest]
	fn test_has_field_includes_foreign_keys() {
		let schema = category();
		assert!(schema.has_field("Title"));
		assert!(schema.has_field("ParentID"));
		assert!(schema.has_field("OwnerClass"));
		assert!(!schema.has_field("ParentClass"));
		assert!(!schema.has_field("Missing"));
	}

	#[rstest]
	fn test_polymorphic_relation() {
		let schema = category();
		assert!(schema.to_one_relation("Owner").unwrap().is_polymorphic());
		assert!(!schema.to_one_relation("ParentID").unwrap().is_polymorphic());
	}
}

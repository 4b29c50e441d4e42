//! Fixture field values and reference resolution.
//!
//! Raw document values are parsed once, on ingestion, into [`FixtureValue`].
//! The `=>Model.identifier` micro syntax never leaves this module as a
//! string; consumers match on the parsed variants and resolve them through
//! a [`ValueResolver`].

use std::fmt;

use fixtura_db::{Fields, Link, RecordId, value_as_id};
use indexmap::IndexMap;
use serde_json::Value;

use super::FixtureRegistry;
use crate::error::{SeedingError, SeedingResult};

/// Prefix marking a value as a fixture reference.
pub const REFERENCE_SENTINEL: &str = "=>";

/// Reference to a fixture by model and identifier.
///
/// # Example
///
/// ```
/// # use fixtura_seeding::fixtures::FixtureRef;
/// let reference = FixtureRef::parse("=>Team.reds").unwrap();
/// assert_eq!(reference.model, "Team");
/// assert_eq!(reference.identifier, "reds");
/// assert_eq!(reference.to_string(), "=>Team.reds");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FixtureRef {
	/// Model (or raw table) the fixture was registered under.
	pub model: String,
	/// Fixture identifier.
	pub identifier: String,
}

impl FixtureRef {
	/// Creates a reference.
	pub fn new(model: impl Into<String>, identifier: impl Into<String>) -> Self {
		Self {
			model: model.into(),
			identifier: identifier.into(),
		}
	}

	/// Returns true if `raw` uses the reference syntax.
	pub fn is_reference(raw: &str) -> bool {
		raw.trim_start().starts_with(REFERENCE_SENTINEL)
	}

	/// Parses `=>Model.identifier`.
	///
	/// The remainder after the sentinel is split on the first `.`, so
	/// identifiers may themselves contain dots.
	pub fn parse(raw: &str) -> SeedingResult<Self> {
		let trimmed = raw.trim();
		let body = trimmed.strip_prefix(REFERENCE_SENTINEL).ok_or_else(|| {
			SeedingError::InvalidArgument(format!("\"{}\" is not a fixture reference", raw))
		})?;

		match body.split_once('.') {
			Some((model, identifier)) if !model.is_empty() && !identifier.is_empty() => {
				Ok(Self::new(model, identifier))
			}
			_ => Err(SeedingError::InvalidArgument(format!(
				"Bad fixture lookup identifier: {}",
				trimmed
			))),
		}
	}
}

impl fmt::Display for FixtureRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}{}.{}", REFERENCE_SENTINEL, self.model, self.identifier)
	}
}

/// What a to-many relation item points at.
#[derive(Debug, Clone, PartialEq)]
pub enum RelationTarget {
	/// A fixture reference, resolved through the registry.
	Reference(FixtureRef),
	/// An already persisted id.
	Id(RecordId),
}

/// One entry of a to-many relation value.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationItem {
	/// Linked record.
	pub target: RelationTarget,
	/// Extra per-link fields (shared relations only).
	pub extra: Fields,
}

impl RelationItem {
	/// Creates an item without extra fields.
	pub fn new(target: RelationTarget) -> Self {
		Self {
			target,
			extra: Fields::new(),
		}
	}

	fn parse_target(raw: &str) -> SeedingResult<RelationTarget> {
		let raw = raw.trim();
		if FixtureRef::is_reference(raw) {
			return FixtureRef::parse(raw).map(RelationTarget::Reference);
		}
		raw.parse::<RecordId>()
			.map(RelationTarget::Id)
			.map_err(|_| SeedingError::InvalidArgument(format!("Invalid relation item \"{}\"", raw)))
	}

	/// Parses a single sequence entry.
	///
	/// Accepted shapes: `"=>Tag.t1"`, `12`, `"12"` and a single entry map
	/// `{"=>Tag.t1": {Weight: 2}}` carrying extra fields.
	pub fn parse(value: Value) -> SeedingResult<Self> {
		match value {
			Value::String(raw) => Ok(Self::new(Self::parse_target(&raw)?)),
			Value::Number(ref n) => n
				.as_u64()
				.map(|id| Self::new(RelationTarget::Id(id)))
				.ok_or_else(|| {
					SeedingError::InvalidArgument(format!("Invalid relation item {}", value))
				}),
			Value::Object(map) => {
				let mut entries = map.into_iter();
				let (Some((key, extra)), None) = (entries.next(), entries.next()) else {
					return Err(SeedingError::InvalidArgument(
						"Relation items with extra fields must have exactly one key".to_string(),
					));
				};
				let extra = match extra {
					Value::Object(fields) => fields.into_iter().collect(),
					Value::Null => Fields::new(),
					other => {
						return Err(SeedingError::InvalidArgument(format!(
							"Extra fields for \"{}\" must be a map, got {}",
							key, other
						)));
					}
				};
				Ok(Self {
					target: Self::parse_target(&key)?,
					extra,
				})
			}
			other => Err(SeedingError::InvalidArgument(format!(
				"Invalid relation item {}",
				other
			))),
		}
	}
}

/// A parsed fixture field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FixtureValue {
	/// Explicitly empty; lets blueprint defaults apply.
	Unset,
	/// Plain value, stored as given.
	Literal(Value),
	/// Single `=>Model.identifier` reference.
	Reference(FixtureRef),
	/// Multi-valued relation content.
	ReferenceList(Vec<RelationItem>),
}

impl FixtureValue {
	/// Parses a raw document value.
	///
	/// # Example
	///
	/// ```
	/// # use fixtura_seeding::fixtures::FixtureValue;
	/// # use serde_json::json;
	/// assert!(matches!(
	/// 	FixtureValue::parse(json!("=>Team.t1")).unwrap(),
	/// 	FixtureValue::Reference(_)
	/// ));
	/// assert!(matches!(
	/// 	FixtureValue::parse(json!("=>Tag.a, =>Tag.b")).unwrap(),
	/// 	FixtureValue::ReferenceList(items) if items.len() == 2
	/// ));
	/// assert_eq!(
	/// 	FixtureValue::parse(json!(42)).unwrap(),
	/// 	FixtureValue::Literal(json!(42))
	/// );
	/// ```
	pub fn parse(value: Value) -> SeedingResult<Self> {
		match value {
			Value::Null => Ok(Self::Unset),
			Value::String(raw) if FixtureRef::is_reference(&raw) => {
				if raw.contains(',') {
					raw.split(',')
						.map(|item| RelationItem::parse(Value::String(item.to_string())))
						.collect::<SeedingResult<Vec<_>>>()
						.map(Self::ReferenceList)
				} else {
					FixtureRef::parse(&raw).map(Self::Reference)
				}
			}
			Value::Array(items) => items
				.into_iter()
				.map(RelationItem::parse)
				.collect::<SeedingResult<Vec<_>>>()
				.map(Self::ReferenceList),
			other => Ok(Self::Literal(other)),
		}
	}

	/// Creates a literal value.
	pub fn literal(value: impl Into<Value>) -> Self {
		Self::Literal(value.into())
	}

	/// Creates a reference value.
	pub fn reference(model: impl Into<String>, identifier: impl Into<String>) -> Self {
		Self::Reference(FixtureRef::new(model, identifier))
	}

	/// Returns true for [`FixtureValue::Unset`].
	pub fn is_unset(&self) -> bool {
		matches!(self, Self::Unset)
	}

	/// Returns the literal value, if this is one.
	pub fn as_literal(&self) -> Option<&Value> {
		match self {
			Self::Literal(value) => Some(value),
			_ => None,
		}
	}

	/// Returns true if the value contains any fixture reference.
	pub fn has_reference(&self) -> bool {
		match self {
			Self::Reference(_) => true,
			Self::ReferenceList(items) => items
				.iter()
				.any(|item| matches!(item.target, RelationTarget::Reference(_))),
			_ => false,
		}
	}
}

impl From<FixtureRef> for FixtureValue {
	fn from(reference: FixtureRef) -> Self {
		Self::Reference(reference)
	}
}

/// Ordered field name to value map of one fixture record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
	entries: IndexMap<String, FixtureValue>,
}

impl FieldMap {
	/// Creates an empty field map.
	pub fn new() -> Self {
		Self::default()
	}

	/// Parses a JSON object into a field map.
	///
	/// `null` is accepted as an empty map.
	///
	/// # Example
	///
	/// ```
	/// # use fixtura_seeding::fixtures::FieldMap;
	/// # use serde_json::json;
	/// let fields = FieldMap::from_json(json!({"Name": "Joe", "Team": "=>Team.t1"})).unwrap();
	/// assert_eq!(fields.len(), 2);
	/// assert!(fields.get("Team").unwrap().has_reference());
	/// ```
	pub fn from_json(value: Value) -> SeedingResult<Self> {
		match value {
			Value::Object(map) => map
				.into_iter()
				.map(|(name, raw)| Ok((name, FixtureValue::parse(raw)?)))
				.collect(),
			Value::Null => Ok(Self::new()),
			other => Err(SeedingError::ParseError(format!(
				"Expected a map of fields, got {}",
				other
			))),
		}
	}

	/// Inserts a parsed value, returning the previous one.
	pub fn insert(&mut self, name: impl Into<String>, value: FixtureValue) -> Option<FixtureValue> {
		self.entries.insert(name.into(), value)
	}

	/// Parses and inserts a raw value.
	pub fn insert_raw(&mut self, name: impl Into<String>, value: Value) -> SeedingResult<()> {
		self.entries.insert(name.into(), FixtureValue::parse(value)?);
		Ok(())
	}

	/// Returns the value of `name`.
	pub fn get(&self, name: &str) -> Option<&FixtureValue> {
		self.entries.get(name)
	}

	/// Returns the value of `name` mutably.
	pub fn get_mut(&mut self, name: &str) -> Option<&mut FixtureValue> {
		self.entries.get_mut(name)
	}

	/// Removes `name`, keeping the order of the remaining fields.
	pub fn remove(&mut self, name: &str) -> Option<FixtureValue> {
		self.entries.shift_remove(name)
	}

	/// Returns true if `name` holds a value other than [`FixtureValue::Unset`].
	pub fn is_set(&self, name: &str) -> bool {
		self.entries.get(name).is_some_and(|value| !value.is_unset())
	}

	/// Returns true if `name` is present, even as [`FixtureValue::Unset`].
	pub fn contains(&self, name: &str) -> bool {
		self.entries.contains_key(name)
	}

	/// Iterates over fields in document order.
	pub fn iter(&self) -> impl Iterator<Item = (&String, &FixtureValue)> {
		self.entries.iter()
	}

	/// Returns the number of fields.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns true if there are no fields.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

impl FromIterator<(String, FixtureValue)> for FieldMap {
	fn from_iter<I: IntoIterator<Item = (String, FixtureValue)>>(iter: I) -> Self {
		Self {
			entries: iter.into_iter().collect(),
		}
	}
}

impl<'a> IntoIterator for &'a FieldMap {
	type Item = (&'a String, &'a FixtureValue);
	type IntoIter = indexmap::map::Iter<'a, String, FixtureValue>;

	fn into_iter(self) -> Self::IntoIter {
		self.entries.iter()
	}
}

/// Resolves parsed values against a [`FixtureRegistry`].
///
/// Resolution is a pure lookup. A reference to a fixture that is not
/// registered yet, whether missing or defined later in the document, fails
/// with [`SeedingError::UnresolvedReference`].
#[derive(Debug, Clone, Copy)]
pub struct ValueResolver<'a> {
	registry: &'a FixtureRegistry,
}

impl<'a> ValueResolver<'a> {
	/// Creates a resolver over `registry`.
	pub fn new(registry: &'a FixtureRegistry) -> Self {
		Self { registry }
	}

	/// Looks up the persisted id of `reference`.
	pub fn resolve_reference(&self, reference: &FixtureRef) -> SeedingResult<RecordId> {
		self.registry
			.get(&reference.model, &reference.identifier)
			.ok_or_else(|| SeedingError::UnresolvedReference(reference.to_string()))
	}

	/// Resolves a value destined for a plain column.
	pub fn scalar(&self, field: &str, value: &FixtureValue) -> SeedingResult<Value> {
		match value {
			FixtureValue::Unset => Ok(Value::Null),
			FixtureValue::Literal(value) => Ok(value.clone()),
			FixtureValue::Reference(reference) => self.resolve_reference(reference).map(Value::from),
			FixtureValue::ReferenceList(_) => Err(SeedingError::InvalidArgument(format!(
				"Field \"{}\" cannot hold a list of references",
				field
			))),
		}
	}

	/// Resolves a to-one value into the foreign key and, for references,
	/// the referenced model.
	pub fn to_one(
		&self,
		relation: &str,
		value: &FixtureValue,
	) -> SeedingResult<(Value, Option<String>)> {
		match value {
			FixtureValue::Reference(reference) => Ok((
				Value::from(self.resolve_reference(reference)?),
				Some(reference.model.clone()),
			)),
			other => self.scalar(relation, other).map(|value| (value, None)),
		}
	}

	/// Resolves a to-many value into the full link list.
	///
	/// Literal strings are split on commas and every item must be a numeric
	/// id or a reference. `Unset` resolves to an empty list.
	pub fn links(&self, relation: &str, value: &FixtureValue) -> SeedingResult<Vec<Link>> {
		let invalid = |item: &dyn fmt::Display| {
			SeedingError::InvalidArgument(format!(
				"Invalid format for relation \"{}\" (\"{}\")",
				relation, item
			))
		};

		match value {
			FixtureValue::Unset => Ok(Vec::new()),
			FixtureValue::Reference(reference) => {
				Ok(vec![Link::new(self.resolve_reference(reference)?)])
			}
			FixtureValue::ReferenceList(items) => items
				.iter()
				.map(|item| {
					let id = match &item.target {
						RelationTarget::Reference(reference) => self.resolve_reference(reference)?,
						RelationTarget::Id(id) => *id,
					};
					Ok(Link::with_extra(id, item.extra.clone()))
				})
				.collect(),
			FixtureValue::Literal(Value::String(raw)) if raw.trim().is_empty() => Ok(Vec::new()),
			FixtureValue::Literal(Value::String(raw)) => raw
				.split(',')
				.map(str::trim)
				.map(|item| {
					match RelationItem::parse_target(item).map_err(|_| invalid(&item))? {
						RelationTarget::Reference(reference) => {
							self.resolve_reference(&reference).map(Link::new)
						}
						RelationTarget::Id(id) => Ok(Link::new(id)),
					}
				})
				.collect(),
			FixtureValue::Literal(literal) => value_as_id(literal)
				.map(|id| vec![Link::new(id)])
				.ok_or_else(|| invalid(literal)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};
	use serde_json::json;

	#[fixture]
	fn registry() -> FixtureRegistry {
		let mut registry = FixtureRegistry::new();
		registry.set("Team", "t1", 1);
		registry.set("Tag", "a", 10);
		registry.set("Tag", "b", 11);
		registry
	}

	#[rstest]
	#[case("=>Team")]
	#[case("=>.t1")]
	#[case("=>Team.")]
	fn test_bad_reference_is_invalid_argument(#[case] raw: &str) {
		assert!(matches!(
			FixtureRef::parse(raw),
			Err(SeedingError::InvalidArgument(_))
		));
		assert!(matches!(
			FixtureValue::parse(json!(raw)),
			Err(SeedingError::InvalidArgument(_))
		));
	}

	#[rstest]
	fn test_identifier_may_contain_dots() {
		let reference = FixtureRef::parse("=>File.logo.png").unwrap();
		assert_eq!(reference.model, "File");
		assert_eq!(reference.identifier, "logo.png");
	}

	#[rstest]
	#[case(json!("Reds"))]
	#[case(json!("12"))]
	#[case(json!(12))]
	#[case(json!(true))]
	#[case(json!("a => b"))]
	fn test_non_references_pass_through(#[case] raw: Value) {
		assert_eq!(
			FixtureValue::parse(raw.clone()).unwrap(),
			FixtureValue::Literal(raw)
		);
	}

	#[rstest]
	fn test_null_is_unset() {
		assert!(FixtureValue::parse(Value::Null).unwrap().is_unset());
	}

	#[rstest]
	fn test_sequence_with_extra_fields() {
		let value = FixtureValue::parse(json!(["=>Tag.a", {"=>Tag.b": {"Weight": 2}}, 5])).unwrap();
		let FixtureValue::ReferenceList(items) = value else {
			panic!("expected a reference list");
		};
		assert_eq!(items.len(), 3);
		assert!(items[0].extra.is_empty());
		assert_eq!(items[1].extra["Weight"], json!(2));
		assert_eq!(items[2].target, RelationTarget::Id(5));
	}

	#[rstest]
	fn test_sequence_rejects_garbage() {
		assert!(matches!(
			FixtureValue::parse(json!(["=>Tag.a", "nonsense"])),
			Err(SeedingError::InvalidArgument(_))
		));
	}

	#[rstest]
	fn test_resolve_scalar(registry: FixtureRegistry) {
		let resolver = ValueResolver::new(&registry);
		assert_eq!(
			resolver
				.scalar("TeamID", &FixtureValue::reference("Team", "t1"))
				.unwrap(),
			json!(1)
		);
		assert_eq!(
			resolver
				.scalar("Title", &FixtureValue::literal("Reds"))
				.unwrap(),
			json!("Reds")
		);
	}

	#[rstest]
	fn test_unresolved_reference_names_value(registry: FixtureRegistry) {
		let resolver = ValueResolver::new(&registry);
		let error = resolver
			.scalar("TeamID", &FixtureValue::reference("Team", "missing"))
			.unwrap_err();
		assert!(matches!(error, SeedingError::UnresolvedReference(ref v) if v == "=>Team.missing"));
	}

	#[rstest]
	fn test_links_from_comma_list(registry: FixtureRegistry) {
		let resolver = ValueResolver::new(&registry);
		let value = FixtureValue::parse(json!("=>Tag.a, =>Tag.b")).unwrap();
		let ids: Vec<RecordId> = resolver
			.links("Tags", &value)
			.unwrap()
			.into_iter()
			.map(|l| l.id)
			.collect();
		assert_eq!(ids, vec![10, 11]);
	}

	#[rstest]
	fn test_links_from_numeric_literal(registry: FixtureRegistry) {
		let resolver = ValueResolver::new(&registry);
		let links = resolver
			.links("Tags", &FixtureValue::literal("3, 4"))
			.unwrap();
		assert_eq!(links, vec![Link::new(3), Link::new(4)]);
		let mixed = resolver
			.links("Tags", &FixtureValue::literal("3, =>Tag.b"))
			.unwrap();
		assert_eq!(mixed, vec![Link::new(3), Link::new(11)]);
		assert!(
			resolver
				.links("Tags", &FixtureValue::literal(""))
				.unwrap()
				.is_empty()
		);
	}

	#[rstest]
	fn test_links_reject_malformed_literal(registry: FixtureRegistry) {
		let resolver = ValueResolver::new(&registry);
		let error = resolver
			.links("Tags", &FixtureValue::literal("Tag.a"))
			.unwrap_err();
		assert!(matches!(error, SeedingError::InvalidArgument(ref m) if m.contains("Tags")));
	}

	#[rstest]
	fn test_field_map_from_json_rejects_scalars() {
		assert!(matches!(
			FieldMap::from_json(json!("oops")),
			Err(SeedingError::ParseError(_))
		));
		assert!(FieldMap::from_json(Value::Null).unwrap().is_empty());
	}
}

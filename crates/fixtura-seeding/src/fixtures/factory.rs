//! The fixture factory.
//!
//! [`FixtureFactory`] owns the store, the identifier registry and the named
//! blueprints. It is the entry point for creating fixtures programmatically
//! and the target [`YamlFixture`](super::YamlFixture) documents are written
//! into.

use std::fmt;
use std::sync::Arc;

use fixtura_db::{DbError, Fields, Record, RecordId, SchemaProvider, Store};
use indexmap::IndexMap;

use super::{Blueprint, DefaultValue, FieldMap, FixtureRegistry, ValueResolver};
use crate::error::{SeedingError, SeedingResult};

/// Creates fixture records and remembers their ids.
///
/// # Example
///
/// ```
/// use fixtura_db::{MemoryStore, ModelSchema};
/// use fixtura_seeding::fixtures::{FieldMap, FixtureFactory};
/// use serde_json::json;
///
/// let store = MemoryStore::new()
/// 	.with_model(ModelSchema::new("Team").field("Title"))
/// 	.with_model(ModelSchema::new("Player").field("Name").has_one("Team", "Team"));
/// let mut factory = FixtureFactory::new(store);
///
/// let team = factory
/// 	.create_object("Team", "reds", FieldMap::from_json(json!({"Title": "Reds"})).unwrap())
/// 	.unwrap();
/// let player = factory
/// 	.create_object(
/// 		"Player",
/// 		"joe",
/// 		FieldMap::from_json(json!({"Name": "Joe", "Team": "=>Team.reds"})).unwrap(),
/// 	)
/// 	.unwrap();
///
/// assert_eq!(player.foreign_key("Team"), team.id());
/// assert_eq!(factory.get_id("Team", "reds"), team.id());
/// ```
pub struct FixtureFactory {
	store: Box<dyn Store>,
	registry: FixtureRegistry,
	blueprints: IndexMap<String, Arc<Blueprint>>,
}

impl FixtureFactory {
	/// Creates a factory writing into `store`.
	pub fn new(store: impl Store + 'static) -> Self {
		Self {
			store: Box::new(store),
			registry: FixtureRegistry::new(),
			blueprints: IndexMap::new(),
		}
	}

	/// Defines a blueprint for model `name` with the given defaults,
	/// replacing any blueprint of that name.
	pub fn define(
		&mut self,
		name: impl Into<String>,
		defaults: IndexMap<String, DefaultValue>,
	) -> &mut Self {
		let blueprint = Blueprint::new(name).with_defaults(defaults);
		self.define_blueprint(blueprint)
	}

	/// Registers a pre-built blueprint under its name.
	///
	/// Several blueprints may target the same model under different names.
	pub fn define_blueprint(&mut self, blueprint: Blueprint) -> &mut Self {
		tracing::debug!(
			blueprint = %blueprint.name(),
			model = %blueprint.model(),
			"blueprint defined"
		);
		self.blueprints
			.insert(blueprint.name().to_string(), Arc::new(blueprint));
		self
	}

	/// Returns the blueprint registered as `name`.
	pub fn blueprint(&self, name: &str) -> Option<&Blueprint> {
		self.blueprints.get(name).map(Arc::as_ref)
	}

	/// Returns the blueprint registered as `name` for modification.
	pub fn blueprint_mut(&mut self, name: &str) -> Option<&mut Blueprint> {
		self.blueprints.get_mut(name).map(Arc::make_mut)
	}

	/// Creates a record through the blueprint `name` and registers it
	/// under the blueprint's target model.
	///
	/// A default blueprint targeting model `name` is created on first use.
	pub fn create_object(
		&mut self,
		name: &str,
		identifier: &str,
		fields: FieldMap,
	) -> SeedingResult<Record> {
		let blueprint = Arc::clone(
			self.blueprints
				.entry(name.to_string())
				.or_insert_with(|| Arc::new(Blueprint::new(name))),
		);
		blueprint.create_object(identifier, fields, self)
	}

	/// Inserts a row straight into `table`, bypassing the model layer, and
	/// registers its id under the table name.
	///
	/// References are resolved; `Unset` values are written as `null`.
	pub fn create_raw(
		&mut self,
		table: &str,
		identifier: &str,
		fields: FieldMap,
	) -> SeedingResult<RecordId> {
		let resolver = ValueResolver::new(&self.registry);
		let row = fields
			.iter()
			.map(|(name, value)| Ok((name.clone(), resolver.scalar(name, value)?)))
			.collect::<SeedingResult<Fields>>()?;

		let id = self.store.insert_raw(table, row)?;
		self.registry.set(table, identifier, id);
		tracing::debug!(table = %table, identifier = %identifier, id, "raw fixture inserted");
		Ok(id)
	}

	/// Fetches the record registered as `(model, identifier)`.
	///
	/// `model` may also be a table name, which is resolved to its model.
	/// Returns `Ok(None)` if nothing is registered or the row is gone.
	///
	/// # Errors
	///
	/// [`SeedingError::InvalidArgument`] if `model` names neither a model
	/// nor a model's table.
	pub fn get(&self, model: &str, identifier: &str) -> SeedingResult<Option<Record>> {
		let Some(id) = self.get_id(model, identifier) else {
			return Ok(None);
		};

		let model_name = if self.store.has_model(model) {
			model.to_string()
		} else {
			self.store.model_for_table(model).ok_or_else(|| {
				SeedingError::InvalidArgument(format!(
					"\"{}\" is neither a model nor a table",
					model
				))
			})?
		};
		Ok(self.store.get_by_id(&model_name, id)?)
	}

	/// Returns the id registered as `(model, identifier)`.
	pub fn get_id(&self, model: &str, identifier: &str) -> Option<RecordId> {
		self.registry.get(model, identifier)
	}

	/// Returns all identifiers registered for `model`.
	pub fn get_ids(&self, model: &str) -> Option<&IndexMap<String, RecordId>> {
		self.registry.get_all(model)
	}

	/// Overrides the id registered as `(model, identifier)`.
	///
	/// Nothing is persisted; later references resolve to `id`.
	pub fn set_id(&mut self, model: impl Into<String>, identifier: impl Into<String>, id: RecordId) {
		self.registry.set(model, identifier, id);
	}

	/// Deletes the records behind registered fixtures of one model, or of
	/// all models.
	///
	/// Rows that no longer exist are skipped. The registry keeps its
	/// entries unless `forget_mapping` is set.
	pub fn clear(&mut self, model: Option<&str>, forget_mapping: bool) -> SeedingResult<()> {
		let models: Vec<String> = match model {
			Some(model) => vec![model.to_string()],
			None => self.registry.models().map(str::to_string).collect(),
		};

		for name in &models {
			let Some(ids) = self.registry.get_all(name) else {
				continue;
			};
			let ids: Vec<RecordId> = ids.values().copied().collect();

			let mut deleted = 0usize;
			if self.store.has_model(name) {
				for id in ids {
					if self.store.get_by_id(name, id)?.is_some() {
						self.store.delete(name, id)?;
						deleted += 1;
					}
				}
			} else {
				for id in ids {
					match self.store.delete_raw(name, id) {
						Ok(()) => deleted += 1,
						Err(DbError::RecordNotFound { .. } | DbError::UnknownTable(_)) => {}
						Err(e) => return Err(e.into()),
					}
				}
			}
			tracing::debug!(model = %name, deleted, "fixtures cleared");
		}

		if forget_mapping {
			self.registry.clear(model);
		}
		Ok(())
	}

	/// Returns the identifier registry.
	pub fn registry(&self) -> &FixtureRegistry {
		&self.registry
	}

	/// Returns the identifier registry for modification.
	pub fn registry_mut(&mut self) -> &mut FixtureRegistry {
		&mut self.registry
	}

	/// Returns the store.
	pub fn store(&self) -> &dyn Store {
		self.store.as_ref()
	}

	/// Returns the store for modification.
	pub fn store_mut(&mut self) -> &mut dyn Store {
		self.store.as_mut()
	}

	/// Returns the names of all defined blueprints.
	pub fn blueprint_names(&self) -> impl Iterator<Item = &str> {
		self.blueprints.keys().map(String::as_str)
	}
}

impl fmt::Debug for FixtureFactory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FixtureFactory")
			.field("registry", &self.registry)
			.field("blueprints", &self.blueprints.keys().collect::<Vec<_>>())
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use fixtura_db::{MemoryStore, ModelSchema};
	use rstest::{fixture, rstest};
	use serde_json::{Value, json};

	#[fixture]
	fn factory() -> FixtureFactory {
		let store = MemoryStore::new()
			.with_model(
				ModelSchema::new("Team")
					.field("Title")
					.has_many("Players", "Player")
					.many_many("Sponsors", "Sponsor"),
			)
			.with_model(ModelSchema::new("Player").field("Name").has_one("Team", "Team"))
			.with_model(
				ModelSchema::new("Sponsor")
					.with_table("sponsors")
					.field("Name"),
			)
			.with_model(
				ModelSchema::new("Category")
					.field("Title")
					.has_one("Parent", "Category"),
			);
		FixtureFactory::new(store)
	}

	fn fields(value: Value) -> FieldMap {
		FieldMap::from_json(value).unwrap()
	}

	#[rstest]
	fn test_team_and_players(mut factory: FixtureFactory) {
		let team = factory
			.create_object("Team", "t1", fields(json!({"Title": "Reds"})))
			.unwrap();
		let p1 = factory
			.create_object("Player", "p1", fields(json!({"Name": "A", "Team": "=>Team.t1"})))
			.unwrap();
		let p2 = factory
			.create_object("Player", "p2", fields(json!({"Name": "B", "TeamID": "=>Team.t1"})))
			.unwrap();

		assert_eq!(p1.foreign_key("Team"), team.id());
		assert_eq!(p2.foreign_key("Team"), team.id());
		assert_eq!(factory.get_ids("Player").unwrap().len(), 2);
	}

	#[rstest]
	fn test_forward_reference_fails(mut factory: FixtureFactory) {
		let result = factory.create_object(
			"Player",
			"p1",
			fields(json!({"Name": "A", "Team": "=>Team.missing"})),
		);
		assert!(
			matches!(result, Err(SeedingError::UnresolvedReference(ref v)) if v == "=>Team.missing")
		);
	}

	#[rstest]
	fn test_self_reference(mut factory: FixtureFactory) {
		let category = factory
			.create_object(
				"Category",
				"cat1",
				fields(json!({"Title": "Root", "ParentID": "=>Category.cat1"})),
			)
			.unwrap();
		let id = factory.get_id("Category", "cat1");
		assert_eq!(category.foreign_key("Parent"), id);

		let stored = factory.get("Category", "cat1").unwrap().unwrap();
		assert_eq!(stored.foreign_key("Parent"), id);
	}

	#[rstest]
	fn test_recreate_replaces_to_many_set(mut factory: FixtureFactory) {
		for name in ["a", "b", "c"] {
			factory
				.create_object("Sponsor", name, fields(json!({"Name": name})))
				.unwrap();
		}
		factory
			.create_object(
				"Team",
				"t1",
				fields(json!({"ID": 7, "Sponsors": "=>Sponsor.a, =>Sponsor.b"})),
			)
			.unwrap();
		factory
			.create_object("Team", "t1", fields(json!({"ID": 7, "Sponsors": "=>Sponsor.c"})))
			.unwrap();

		let links = factory.store().related("Team", 7, "Sponsors").unwrap();
		let ids: Vec<RecordId> = links.iter().map(|link| link.id).collect();
		assert_eq!(ids, vec![factory.get_id("Sponsor", "c").unwrap()]);
	}

	#[rstest]
	fn test_raw_rows_are_reference_targets(mut factory: FixtureFactory) {
		let sponsor = factory
			.create_raw("sponsors", "raw1", fields(json!({"Name": "Acme"})))
			.unwrap();
		factory
			.create_object("Team", "t1", fields(json!({"Sponsors": ["=>sponsors.raw1"]})))
			.unwrap();

		let team_id = factory.get_id("Team", "t1").unwrap();
		let links = factory.store().related("Team", team_id, "Sponsors").unwrap();
		assert_eq!(links[0].id, sponsor);

		// the table name resolves to its model
		let record = factory.get("sponsors", "raw1").unwrap().unwrap();
		assert_eq!(record.model(), "Sponsor");
		assert_eq!(record.get_str("Name"), Some("Acme"));
	}

	#[rstest]
	fn test_raw_insert_resolves_references(mut factory: FixtureFactory) {
		factory
			.create_object("Team", "t1", fields(json!({"Title": "Reds"})))
			.unwrap();
		factory
			.create_raw(
				"audit_log",
				"entry1",
				fields(json!({"TeamID": "=>Team.t1", "Note": null})),
			)
			.unwrap();
		assert!(factory.get_id("audit_log", "entry1").is_some());

		let missing = factory.create_raw(
			"audit_log",
			"entry2",
			fields(json!({"TeamID": "=>Team.t2"})),
		);
		assert!(matches!(missing, Err(SeedingError::UnresolvedReference(_))));
	}

	#[rstest]
	fn test_raw_insert_rejects_exhausted_id(mut factory: FixtureFactory) {
		let result = factory.create_raw("audit_log", "e1", fields(json!({"ID": RecordId::MAX})));
		assert!(matches!(
			result,
			Err(SeedingError::Persistence(DbError::InvalidValue { .. }))
		));
		assert!(factory.get_id("audit_log", "e1").is_none());
	}

	#[rstest]
	fn test_get_unknown_name(mut factory: FixtureFactory) {
		factory.set_id("Nonsense", "x", 1);
		assert!(matches!(
			factory.get("Nonsense", "x"),
			Err(SeedingError::InvalidArgument(_))
		));
		assert!(factory.get("Team", "nothing").unwrap().is_none());
	}

	#[rstest]
	fn test_clear_keeps_mapping(mut factory: FixtureFactory) {
		factory
			.create_object("Team", "t1", fields(json!({"Title": "Reds"})))
			.unwrap();
		let id = factory.get_id("Team", "t1").unwrap();

		factory.clear(None, false).unwrap();
		assert!(factory.store().get_by_id("Team", id).unwrap().is_none());
		assert_eq!(factory.get_id("Team", "t1"), Some(id));

		// clearing again skips rows that are already gone
		factory.clear(Some("Team"), true).unwrap();
		assert_eq!(factory.get_id("Team", "t1"), None);
	}

	#[rstest]
	fn test_clear_raw_table(mut factory: FixtureFactory) {
		factory
			.create_raw("audit_log", "e1", fields(json!({"ID": 5, "Note": "x"})))
			.unwrap();
		factory.clear(Some("audit_log"), false).unwrap();

		// the explicit id is free again once the row is deleted
		factory
			.create_raw("audit_log", "e1", fields(json!({"ID": 5, "Note": "y"})))
			.unwrap();
	}

	#[rstest]
	fn test_named_blueprints_share_model(mut factory: FixtureFactory) {
		let mut defaults = IndexMap::new();
		defaults.insert("Title".to_string(), DefaultValue::value("Default team"));
		factory.define("Team", defaults);
		factory.define_blueprint(
			Blueprint::new("ReserveTeam")
				.with_model("Team")
				.with_default("Title", DefaultValue::value("Reserves")),
		);

		let first = factory
			.create_object("Team", "first", FieldMap::new())
			.unwrap();
		let reserve = factory
			.create_object("ReserveTeam", "reserve", FieldMap::new())
			.unwrap();

		assert_eq!(first.get_str("Title"), Some("Default team"));
		assert_eq!(reserve.get_str("Title"), Some("Reserves"));
		assert_eq!(reserve.model(), "Team");
		// ids are registered under the target model, not the blueprint name
		assert!(factory.get_id("Team", "reserve").is_some());
		assert!(factory.get_ids("ReserveTeam").is_none());
	}

	#[rstest]
	fn test_blueprint_mut(mut factory: FixtureFactory) {
		factory.define("Team", IndexMap::new());
		factory
			.blueprint_mut("Team")
			.unwrap()
			.set_defaults(IndexMap::from([(
				"Title".to_string(),
				DefaultValue::value("Changed"),
			)]));

		let team = factory
			.create_object("Team", "t1", FieldMap::new())
			.unwrap();
		assert_eq!(team.get_str("Title"), Some("Changed"));
		assert_eq!(factory.blueprint_names().collect::<Vec<_>>(), vec!["Team"]);
	}
}

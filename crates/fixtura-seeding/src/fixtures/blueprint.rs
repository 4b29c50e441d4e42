//! Blueprints: per-model recipes for materializing fixture records.
//!
//! A blueprint knows the model it creates, default field values and the
//! callbacks to run around creation. [`Blueprint::create_object`] performs
//! the write sequence that makes references, including reflexive ones,
//! resolvable.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use fixtura_db::{
	Fields, ID_FIELD, LAST_EDITED_FIELD, Record, RelationKind, SchemaProvider, Store, class_field,
	foreign_key_field, value_as_id,
};
use indexmap::IndexMap;
use serde_json::Value;

use super::{FieldMap, FixtureFactory, FixtureRegistry, ValueResolver};
use crate::error::{SeedingError, SeedingResult};

/// Lifecycle point a callback is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackKind {
	/// Runs before the record is instantiated; may rewrite the field map.
	BeforeCreate,
	/// Runs with the finished record.
	AfterCreate,
}

impl CallbackKind {
	/// Returns the name used to register callbacks by string.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::BeforeCreate => "beforeCreate",
			Self::AfterCreate => "afterCreate",
		}
	}
}

impl FromStr for CallbackKind {
	type Err = SeedingError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"beforeCreate" | "before_create" => Ok(Self::BeforeCreate),
			"afterCreate" | "after_create" => Ok(Self::AfterCreate),
			other => Err(SeedingError::InvalidArgument(format!(
				"Unknown callback \"{}\"",
				other
			))),
		}
	}
}

impl fmt::Display for CallbackKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Arguments handed to a blueprint callback.
///
/// The factory is passed mutably so callbacks can adjust the registry or
/// create further fixtures; registry changes are visible immediately.
pub struct CallbackContext<'a> {
	/// Identifier of the fixture being created.
	pub identifier: &'a str,
	/// Field map of the fixture being created.
	pub fields: &'a mut FieldMap,
	/// The finished record; only set for [`CallbackKind::AfterCreate`].
	pub record: Option<&'a Record>,
	/// Owning factory.
	pub factory: &'a mut FixtureFactory,
}

/// Blueprint callback.
pub type FixtureCallback =
	Arc<dyn Fn(&mut CallbackContext<'_>) -> SeedingResult<()> + Send + Sync>;

/// Handle returned by [`Blueprint::add_callback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(usize);

/// Default producer receiving the record so far, the field map and the registry.
pub type DefaultFn = Arc<dyn Fn(&Record, &FieldMap, &FixtureRegistry) -> Value + Send + Sync>;

/// Default value of a blueprint field.
#[derive(Clone)]
pub enum DefaultValue {
	/// Fixed value.
	Static(Value),
	/// Value computed per record.
	Computed(DefaultFn),
}

impl DefaultValue {
	/// Creates a fixed default.
	pub fn value(value: impl Into<Value>) -> Self {
		Self::Static(value.into())
	}

	/// Creates a computed default.
	pub fn computed<F>(producer: F) -> Self
	where
		F: Fn(&Record, &FieldMap, &FixtureRegistry) -> Value + Send + Sync + 'static,
	{
		Self::Computed(Arc::new(producer))
	}

	fn produce(&self, record: &Record, fields: &FieldMap, registry: &FixtureRegistry) -> Value {
		match self {
			Self::Static(value) => value.clone(),
			Self::Computed(producer) => producer(record, fields, registry),
		}
	}
}

impl fmt::Debug for DefaultValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Static(value) => f.debug_tuple("Static").field(value).finish(),
			Self::Computed(_) => f.write_str("Computed(..)"),
		}
	}
}

/// Recipe for creating records of one model.
///
/// # Example
///
/// ```
/// use fixtura_seeding::fixtures::{Blueprint, DefaultValue};
///
/// let blueprint = Blueprint::new("AdminMember")
/// 	.with_model("Member")
/// 	.with_default("IsAdmin", DefaultValue::value(true));
///
/// assert_eq!(blueprint.name(), "AdminMember");
/// assert_eq!(blueprint.model(), "Member");
/// ```
#[derive(Clone)]
pub struct Blueprint {
	name: String,
	model: String,
	defaults: IndexMap<String, DefaultValue>,
	before_create: Vec<(CallbackId, FixtureCallback)>,
	after_create: Vec<(CallbackId, FixtureCallback)>,
	next_callback: usize,
}

impl Blueprint {
	/// Creates a blueprint whose target model equals its name.
	pub fn new(name: impl Into<String>) -> Self {
		let name = name.into();
		Self {
			model: name.clone(),
			name,
			defaults: IndexMap::new(),
			before_create: Vec::new(),
			after_create: Vec::new(),
			next_callback: 0,
		}
	}

	/// Sets the target model, builder style.
	pub fn with_model(mut self, model: impl Into<String>) -> Self {
		self.model = model.into();
		self
	}

	/// Adds a default, builder style.
	pub fn with_default(mut self, field: impl Into<String>, value: DefaultValue) -> Self {
		self.defaults.insert(field.into(), value);
		self
	}

	/// Replaces all defaults, builder style.
	pub fn with_defaults(mut self, defaults: IndexMap<String, DefaultValue>) -> Self {
		self.defaults = defaults;
		self
	}

	/// Adds a `beforeCreate` callback, builder style.
	pub fn before_create<F>(mut self, callback: F) -> Self
	where
		F: Fn(&mut CallbackContext<'_>) -> SeedingResult<()> + Send + Sync + 'static,
	{
		self.add_callback(CallbackKind::BeforeCreate, callback);
		self
	}

	/// Adds an `afterCreate` callback, builder style.
	pub fn after_create<F>(mut self, callback: F) -> Self
	where
		F: Fn(&mut CallbackContext<'_>) -> SeedingResult<()> + Send + Sync + 'static,
	{
		self.add_callback(CallbackKind::AfterCreate, callback);
		self
	}

	/// Returns the name fixtures documents use for this blueprint.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Returns the target model.
	pub fn model(&self) -> &str {
		&self.model
	}

	/// Sets the target model.
	pub fn set_model(&mut self, model: impl Into<String>) {
		self.model = model.into();
	}

	/// Returns the defaults.
	pub fn defaults(&self) -> &IndexMap<String, DefaultValue> {
		&self.defaults
	}

	/// Replaces all defaults.
	pub fn set_defaults(&mut self, defaults: IndexMap<String, DefaultValue>) {
		self.defaults = defaults;
	}

	/// Registers a callback and returns a handle for removing it again.
	pub fn add_callback<F>(&mut self, kind: CallbackKind, callback: F) -> CallbackId
	where
		F: Fn(&mut CallbackContext<'_>) -> SeedingResult<()> + Send + Sync + 'static,
	{
		let id = CallbackId(self.next_callback);
		self.next_callback += 1;
		let callback: FixtureCallback = Arc::new(callback);
		match kind {
			CallbackKind::BeforeCreate => self.before_create.push((id, callback)),
			CallbackKind::AfterCreate => self.after_create.push((id, callback)),
		}
		id
	}

	/// Registers a callback by kind name (`"beforeCreate"`, `"afterCreate"`).
	pub fn add_named_callback<F>(&mut self, kind: &str, callback: F) -> SeedingResult<CallbackId>
	where
		F: Fn(&mut CallbackContext<'_>) -> SeedingResult<()> + Send + Sync + 'static,
	{
		let kind = kind.parse::<CallbackKind>()?;
		Ok(self.add_callback(kind, callback))
	}

	/// Removes a callback; returns false if it was not registered.
	pub fn remove_callback(&mut self, kind: CallbackKind, id: CallbackId) -> bool {
		let callbacks = self.callbacks_mut(kind);
		let before = callbacks.len();
		callbacks.retain(|(existing, _)| *existing != id);
		callbacks.len() != before
	}

	fn callbacks(&self, kind: CallbackKind) -> &[(CallbackId, FixtureCallback)] {
		match kind {
			CallbackKind::BeforeCreate => &self.before_create,
			CallbackKind::AfterCreate => &self.after_create,
		}
	}

	fn callbacks_mut(&mut self, kind: CallbackKind) -> &mut Vec<(CallbackId, FixtureCallback)> {
		match kind {
			CallbackKind::BeforeCreate => &mut self.before_create,
			CallbackKind::AfterCreate => &mut self.after_create,
		}
	}

	fn invoke(
		&self,
		kind: CallbackKind,
		identifier: &str,
		fields: &mut FieldMap,
		record: Option<&Record>,
		factory: &mut FixtureFactory,
	) -> SeedingResult<()> {
		for (_, callback) in self.callbacks(kind) {
			let mut context = CallbackContext {
				identifier,
				fields: &mut *fields,
				record,
				factory: &mut *factory,
			};
			callback(&mut context)?;
		}
		Ok(())
	}

	/// Materializes one fixture record.
	///
	/// Scalar fields and defaults are written first and the id is
	/// registered before any relation is resolved, so a record may refer to
	/// itself. A failure between writes leaves the partially populated
	/// record in the store.
	///
	/// # Errors
	///
	/// - [`SeedingError::InvalidArgument`] for an unknown target model, a
	///   relation declared as both owned and shared, malformed relation
	///   values or references assigned to undeclared fields
	/// - [`SeedingError::UnresolvedReference`] for references to fixtures
	///   that are not registered yet
	/// - [`SeedingError::Persistence`] when the store rejects a write
	pub fn create_object(
		&self,
		identifier: &str,
		mut fields: FieldMap,
		factory: &mut FixtureFactory,
	) -> SeedingResult<Record> {
		let schema = factory.store().model(&self.model).cloned().ok_or_else(|| {
			SeedingError::InvalidArgument(format!(
				"Blueprint \"{}\" targets unknown model \"{}\"",
				self.name, self.model
			))
		})?;

		self.invoke(
			CallbackKind::BeforeCreate,
			identifier,
			&mut fields,
			None,
			factory,
		)?;

		let table = schema.table().to_string();
		let mut record = factory.store().instantiate(&self.model)?;

		if let Some(value) = fields.get(ID_FIELD).filter(|value| !value.is_unset()) {
			let resolved = ValueResolver::new(factory.registry()).scalar(ID_FIELD, value)?;
			let id = value_as_id(&resolved).ok_or_else(|| {
				SeedingError::InvalidArgument(format!(
					"{} is not a valid ID for fixture \"{}\"",
					resolved, identifier
				))
			})?;
			record.set_id(id);

			let store = factory.store_mut();
			let permitted = store.explicit_ids(&table);
			store.set_explicit_ids(&table, true);
			let written = store.write(&mut record);
			store.set_explicit_ids(&table, permitted);
			written?;
		}

		for (field, default) in &self.defaults {
			if fields.is_set(field) {
				continue;
			}
			let value = default.produce(&record, &fields, factory.registry());
			record.set(field.clone(), value);
		}

		let mut relations = Vec::new();
		let resolver = ValueResolver::new(factory.registry());
		for (name, value) in &fields {
			if name == ID_FIELD || value.is_unset() {
				continue;
			}
			match schema.relation_kinds(name).as_slice() {
				[RelationKind::Scalar] => {
					if value.has_reference() && !schema.has_field(name) {
						return Err(SeedingError::InvalidArgument(format!(
							"\"{}\" is neither a relation nor a field of \"{}\"",
							name, self.model
						)));
					}
					record.set(name.clone(), resolver.scalar(name, value)?);
				}
				[kind] => relations.push((name.clone(), *kind)),
				_ => {
					return Err(SeedingError::InvalidArgument(format!(
						"{} is both has_many and many_many on \"{}\"",
						name, self.model
					)));
				}
			}
		}

		let id = factory.store_mut().write(&mut record)?;
		factory
			.registry_mut()
			.set(self.model.clone(), identifier, id);

		for (name, kind) in relations {
			let Some(value) = fields.get(&name) else {
				continue;
			};
			match kind {
				RelationKind::ToManyOwned | RelationKind::ToManyShared => {
					let links = ValueResolver::new(factory.registry()).links(&name, value)?;
					if kind == RelationKind::ToManyOwned
						&& links.iter().any(|link| !link.extra.is_empty())
					{
						return Err(SeedingError::InvalidArgument(format!(
							"Extra fields are only supported on many_many relations (\"{}\" on \"{}\")",
							name, self.model
						)));
					}
					factory
						.store_mut()
						.replace_related(&self.model, id, &name, links)?;
				}
				RelationKind::ToOne => {
					let Some(relation) = schema.to_one_relation(&name) else {
						continue;
					};
					let (foreign_key, target) =
						ValueResolver::new(factory.registry()).to_one(&name, value)?;
					record.set(foreign_key_field(&relation.name), foreign_key);
					if relation.is_polymorphic()
						&& let Some(target) = target
					{
						record.set(class_field(&relation.name), target);
					}
				}
				RelationKind::Scalar => {}
			}
		}

		factory.store_mut().write(&mut record)?;

		if let Some(value) = fields
			.get(LAST_EDITED_FIELD)
			.filter(|value| !value.is_unset())
		{
			let resolved = ValueResolver::new(factory.registry()).scalar(LAST_EDITED_FIELD, value)?;
			let mut update = Fields::new();
			update.insert(LAST_EDITED_FIELD.to_string(), resolved.clone());
			factory.store_mut().update_raw(&table, id, update)?;
			record.set(LAST_EDITED_FIELD, resolved);
		}

		tracing::debug!(
			blueprint = %self.name,
			model = %self.model,
			identifier = %identifier,
			id,
			"fixture created"
		);

		self.invoke(
			CallbackKind::AfterCreate,
			identifier,
			&mut fields,
			Some(&record),
			factory,
		)?;

		Ok(record)
	}
}

impl fmt::Debug for Blueprint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Blueprint")
			.field("name", &self.name)
			.field("model", &self.model)
			.field("defaults", &self.defaults)
			.field("before_create", &self.before_create.len())
			.field("after_create", &self.after_create.len())
			.finish()
	}
}

//! Fixture identifier registry.
//!
//! Maps `(model, identifier)` pairs from fixture documents to the ids the
//! store assigned. It is the single source of truth for reference
//! resolution and is owned by one [`FixtureFactory`](super::FixtureFactory);
//! there is no global instance.

use fixtura_db::RecordId;
use indexmap::IndexMap;

/// Two level `model -> identifier -> id` map.
///
/// Not thread safe; fixture loading is sequential.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixtureRegistry {
	entries: IndexMap<String, IndexMap<String, RecordId>>,
}

impl FixtureRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Records `id` for `(model, identifier)`, replacing any previous id.
	pub fn set(&mut self, model: impl Into<String>, identifier: impl Into<String>, id: RecordId) {
		self.entries
			.entry(model.into())
			.or_default()
			.insert(identifier.into(), id);
	}

	/// Returns the id registered for `(model, identifier)`.
	pub fn get(&self, model: &str, identifier: &str) -> Option<RecordId> {
		self.entries
			.get(model)
			.and_then(|ids| ids.get(identifier))
			.copied()
	}

	/// Returns every identifier registered for `model`.
	///
	/// `None` means the model was never touched; an empty map means all of
	/// its entries were removed.
	pub fn get_all(&self, model: &str) -> Option<&IndexMap<String, RecordId>> {
		self.entries.get(model)
	}

	/// Removes one entry, returning its id.
	pub fn remove(&mut self, model: &str, identifier: &str) -> Option<RecordId> {
		self.entries
			.get_mut(model)
			.and_then(|ids| ids.shift_remove(identifier))
	}

	/// Removes the entries of one model, or of all models.
	pub fn clear(&mut self, model: Option<&str>) {
		match model {
			Some(model) => {
				self.entries.shift_remove(model);
			}
			None => self.entries.clear(),
		}
	}

	/// Returns the models that have been touched, in registration order.
	pub fn models(&self) -> impl Iterator<Item = &str> {
		self.entries.keys().map(String::as_str)
	}

	/// Returns the total number of registered identifiers.
	pub fn len(&self) -> usize {
		self.entries.values().map(IndexMap::len).sum()
	}

	/// Returns true if no identifiers are registered.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

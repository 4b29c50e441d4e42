//! Helpers for tests that run against fixture files.
//!
//! ```
//! use fixtura_db::{MemoryStore, ModelSchema};
//! use fixtura_seeding::settings::FixtureSettings;
//! use fixtura_seeding::testing::FixtureTestCase;
//!
//! let store = MemoryStore::new().with_model(ModelSchema::new("Team").field("Title"));
//! let mut case = FixtureTestCase::with_documents(
//! 	store,
//! 	FixtureSettings::default(),
//! 	&["Team:\n  reds:\n    Title: Reds\n"],
//! )
//! .unwrap();
//!
//! let team = case.obj_from_fixture("Team", "reds").unwrap();
//! assert_eq!(team.get_str("Title"), Some("Reds"));
//! case.tear_down().unwrap();
//! ```

use fixtura_db::{Record, RecordId, Store};

use crate::commands::LoadFixturesCommand;
use crate::error::{SeedingError, SeedingResult};
use crate::fixtures::{FixtureFactory, LoadResult, YamlFixture};
use crate::settings::FixtureSettings;

/// A fresh factory with the configured fixtures loaded.
#[derive(Debug)]
pub struct FixtureTestCase {
	factory: FixtureFactory,
	settings: FixtureSettings,
	loaded: LoadResult,
}

impl FixtureTestCase {
	/// Loads `settings.fixture_files` into a new factory over `store`.
	///
	/// Listed files must exist.
	pub fn set_up(store: impl Store + 'static, settings: FixtureSettings) -> SeedingResult<Self> {
		let mut factory = FixtureFactory::new(store);
		let loaded = if settings.fixture_files.is_empty() {
			LoadResult::new()
		} else {
			let (args, options) = LoadFixturesCommand::from_settings(&settings);
			LoadFixturesCommand::new().execute(args, options, &mut factory)?
		};
		Ok(Self {
			factory,
			settings,
			loaded,
		})
	}

	/// Like [`set_up`](Self::set_up), then writes inline documents in order.
	pub fn with_documents(
		store: impl Store + 'static,
		settings: FixtureSettings,
		documents: &[&str],
	) -> SeedingResult<Self> {
		let mut case = Self::set_up(store, settings)?;
		for document in documents {
			let loaded = YamlFixture::from_string(*document).write_into(&mut case.factory)?;
			case.loaded.merge(loaded);
		}
		Ok(case)
	}

	/// Returns the factory.
	pub fn factory(&self) -> &FixtureFactory {
		&self.factory
	}

	/// Returns the factory for creating further fixtures.
	pub fn factory_mut(&mut self) -> &mut FixtureFactory {
		&mut self.factory
	}

	/// Returns what was loaded during set up.
	pub fn load_result(&self) -> &LoadResult {
		&self.loaded
	}

	/// Returns the id of a fixture.
	///
	/// # Errors
	///
	/// [`SeedingError::FixtureNotFound`] if nothing is registered.
	pub fn id_from_fixture(&self, model: &str, identifier: &str) -> SeedingResult<RecordId> {
		self.factory
			.get_id(model, identifier)
			.ok_or_else(|| not_found(model, identifier))
	}

	/// Returns every id registered for `model`, in creation order.
	pub fn all_fixture_ids(&self, model: &str) -> Vec<RecordId> {
		self.factory
			.get_ids(model)
			.map(|ids| ids.values().copied().collect())
			.unwrap_or_default()
	}

	/// Fetches the record behind a fixture.
	///
	/// # Errors
	///
	/// [`SeedingError::FixtureNotFound`] if nothing is registered or the
	/// record no longer exists.
	pub fn obj_from_fixture(&self, model: &str, identifier: &str) -> SeedingResult<Record> {
		self.factory
			.get(model, identifier)?
			.ok_or_else(|| not_found(model, identifier))
	}

	/// Deletes every fixture record; forgets the mapping when the settings
	/// ask for it.
	pub fn tear_down(&mut self) -> SeedingResult<()> {
		self.factory.clear(None, self.settings.forget_on_clear)
	}
}

fn not_found(model: &str, identifier: &str) -> SeedingError {
	SeedingError::FixtureNotFound {
		model: model.to_string(),
		identifier: identifier.to_string(),
	}
}

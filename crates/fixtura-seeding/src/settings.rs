//! Layered settings for fixture loading.
//!
//! Values are merged from several sources in priority order (environment
//! variables > TOML file > defaults) and deserialized into
//! [`FixtureSettings`].
//!
//! Recognized keys:
//!
//! | Key | Type | Default |
//! |---|---|---|
//! | `base_path` | path | `.` |
//! | `fixture_files` | list of paths | empty |
//! | `forget_on_clear` | bool | `true` |
//! | `verbosity` | 0..=2 | `1` |

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{SeedingError, SeedingResult};

/// Default prefix of environment variables read by [`EnvSource`].
pub const ENV_PREFIX: &str = "FIXTURA_";

/// Default settings file name, looked up relative to the working directory.
pub const SETTINGS_FILE: &str = "fixtura.toml";

/// Trait for configuration sources
pub trait ConfigSource {
	/// Load configuration from this source
	fn load(&self) -> SeedingResult<IndexMap<String, Value>>;

	/// Get the priority of this source (higher = more important)
	fn priority(&self) -> u8;

	/// Get a description of this source
	fn description(&self) -> String;
}

/// Environment variable configuration source
pub struct EnvSource {
	prefix: String,
}

impl EnvSource {
	/// Creates a source reading `FIXTURA_*` variables.
	pub fn new() -> Self {
		Self {
			prefix: ENV_PREFIX.to_string(),
		}
	}

	/// Set the prefix filter for environment variables
	///
	/// # Examples
	///
	/// ```
	/// use fixtura_seeding::settings::EnvSource;
	///
	/// let source = EnvSource::new().with_prefix("MYAPP_FIXTURES_");
	/// ```
	pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = prefix.into();
		self
	}

	fn parse_value(key: &str, value: String) -> Value {
		match key {
			"fixture_files" => Value::Array(
				value
					.split(',')
					.map(str::trim)
					.filter(|s| !s.is_empty())
					.map(|s| Value::String(s.to_string()))
					.collect(),
			),
			"forget_on_clear" => match value.trim().to_lowercase().as_str() {
				"true" | "1" | "yes" | "on" => Value::Bool(true),
				"false" | "0" | "no" | "off" => Value::Bool(false),
				_ => Value::String(value),
			},
			"verbosity" => value
				.trim()
				.parse::<u64>()
				.map(Value::from)
				.unwrap_or(Value::String(value)),
			_ => Value::String(value),
		}
	}
}

impl Default for EnvSource {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigSource for EnvSource {
	fn load(&self) -> SeedingResult<IndexMap<String, Value>> {
		let mut config = IndexMap::new();

		for (key, value) in std::env::vars() {
			let Some(clean_key) = key.strip_prefix(&self.prefix) else {
				continue;
			};
			let lower_key = clean_key.to_lowercase();
			let parsed = Self::parse_value(&lower_key, value);
			config.insert(lower_key, parsed);
		}

		Ok(config)
	}

	fn priority(&self) -> u8 {
		100
	}

	fn description(&self) -> String {
		format!("Environment variables (prefix: {})", self.prefix)
	}
}

/// TOML file configuration source
///
/// A missing file contributes nothing.
pub struct TomlFileSource {
	path: PathBuf,
}

impl TomlFileSource {
	/// Create a new TOML file configuration source
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl ConfigSource for TomlFileSource {
	fn load(&self) -> SeedingResult<IndexMap<String, Value>> {
		if !self.path.exists() {
			return Ok(IndexMap::new());
		}

		let content = fs::read_to_string(&self.path)?;
		let toml_value: toml::Value = toml::from_str(&content)?;

		match serde_json::to_value(&toml_value)? {
			Value::Object(map) => Ok(map.into_iter().collect()),
			_ => Err(SeedingError::ParseError(format!(
				"Expected a table at the root of {}",
				self.path.display()
			))),
		}
	}

	fn priority(&self) -> u8 {
		50
	}

	fn description(&self) -> String {
		format!("TOML file: {}", self.path.display())
	}
}

/// Default values configuration source
#[derive(Default)]
pub struct DefaultSource {
	values: IndexMap<String, Value>,
}

impl DefaultSource {
	/// Create a new, empty default values source
	pub fn new() -> Self {
		Self::default()
	}

	/// Add a default value for a configuration key
	///
	/// # Examples
	///
	/// ```
	/// use fixtura_seeding::settings::DefaultSource;
	/// use serde_json::Value;
	///
	/// let source = DefaultSource::new()
	/// 	.with_value("verbosity", Value::from(2));
	/// ```
	pub fn with_value(mut self, key: impl Into<String>, value: Value) -> Self {
		self.values.insert(key.into(), value);
		self
	}
}

impl ConfigSource for DefaultSource {
	fn load(&self) -> SeedingResult<IndexMap<String, Value>> {
		Ok(self.values.clone())
	}

	fn priority(&self) -> u8 {
		0
	}

	fn description(&self) -> String {
		"Default values".to_string()
	}
}

/// Settings used by the `loadfixtures` command and [`FixtureTestCase`](crate::testing::FixtureTestCase).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureSettings {
	/// Directory relative fixture paths are resolved against.
	pub base_path: PathBuf,
	/// Fixture files to load, in order.
	pub fixture_files: Vec<PathBuf>,
	/// Whether tearing down forgets the identifier mapping too.
	pub forget_on_clear: bool,
	/// 0 = silent, 1 = summary, 2 = per file.
	pub verbosity: u8,
}

impl Default for FixtureSettings {
	fn default() -> Self {
		Self {
			base_path: PathBuf::from("."),
			fixture_files: Vec::new(),
			forget_on_clear: true,
			verbosity: 1,
		}
	}
}

impl FixtureSettings {
	/// Loads settings from `fixtura.toml` and `FIXTURA_*` variables.
	pub fn load() -> SeedingResult<Self> {
		Self::load_from(SETTINGS_FILE)
	}

	/// Loads settings from the given TOML file and `FIXTURA_*` variables.
	pub fn load_from(path: impl AsRef<Path>) -> SeedingResult<Self> {
		SettingsBuilder::new()
			.add_source(TomlFileSource::new(path.as_ref()))
			.add_source(EnvSource::new())
			.build()
	}

	/// Returns the fixture files resolved against `base_path`.
	pub fn resolved_fixture_files(&self) -> Vec<PathBuf> {
		self.fixture_files
			.iter()
			.map(|file| self.resolve(file))
			.collect()
	}

	/// Resolves `path` against `base_path` unless it is absolute.
	pub fn resolve(&self, path: &Path) -> PathBuf {
		if path.is_absolute() {
			path.to_path_buf()
		} else {
			self.base_path.join(path)
		}
	}

	fn validate(&self) -> SeedingResult<()> {
		if self.verbosity > 2 {
			return Err(SeedingError::ValidationError {
				field: "verbosity".to_string(),
				message: format!("must be between 0 and 2, got {}", self.verbosity),
			});
		}
		Ok(())
	}
}

/// Merges configuration sources into [`FixtureSettings`].
#[derive(Default)]
pub struct SettingsBuilder {
	sources: Vec<Box<dyn ConfigSource>>,
}

impl SettingsBuilder {
	/// Creates a builder without sources.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a source.
	pub fn add_source(mut self, source: impl ConfigSource + 'static) -> Self {
		self.sources.push(Box::new(source));
		self
	}

	/// Merges the sources and returns the raw key/value map.
	///
	/// Sources with a higher priority override lower ones; among equal
	/// priorities the one added last wins.
	pub fn merged(&self) -> SeedingResult<IndexMap<String, Value>> {
		let mut sources: Vec<&dyn ConfigSource> = self.sources.iter().map(|s| s.as_ref()).collect();
		sources.sort_by_key(|source| source.priority());

		let mut merged = IndexMap::new();
		for source in sources {
			let values = source.load()?;
			tracing::trace!(source = %source.description(), keys = values.len(), "settings source loaded");
			merged.extend(values);
		}
		Ok(merged)
	}

	/// Builds the settings.
	///
	/// # Errors
	///
	/// Returns an error if a source cannot be read, a value has the wrong
	/// type or validation fails.
	pub fn build(&self) -> SeedingResult<FixtureSettings> {
		let merged = self.merged()?;
		let settings: FixtureSettings =
			serde_json::from_value(Value::Object(merged.into_iter().collect()))?;
		settings.validate()?;
		Ok(settings)
	}
}

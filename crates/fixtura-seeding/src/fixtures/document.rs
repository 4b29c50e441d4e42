//! Fixture documents and the YAML fixture loader.
//!
//! A fixture document has three nesting levels: model (or raw table) name,
//! record identifier, field map.
//!
//! ```yaml
//! Team:
//!   reds:
//!     Title: Reds
//! Player:
//!   joe:
//!     Name: Joe
//!     Team: =>Team.reds
//! ```
//!
//! Blocks are written in document order; references only resolve to
//! records written earlier (or to the record itself).

use std::path::{Path, PathBuf};

use fixtura_db::SchemaProvider;
use indexmap::IndexMap;

use super::{FieldMap, FixtureFactory, FixtureFormat, FixtureParser};
use crate::error::{SeedingError, SeedingResult};

/// Records of one model (or raw table), in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelBlock {
	/// Model, blueprint or raw table name.
	pub model: String,
	/// Identifier to field map.
	pub records: IndexMap<String, FieldMap>,
}

impl ModelBlock {
	/// Creates a block.
	pub fn new(model: impl Into<String>, records: IndexMap<String, FieldMap>) -> Self {
		Self {
			model: model.into(),
			records,
		}
	}

	/// Returns the number of records in the block.
	pub fn len(&self) -> usize {
		self.records.len()
	}

	/// Returns true if the block has no records.
	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}
}

/// Parsed fixture document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixtureDocument {
	blocks: Vec<ModelBlock>,
	source: Option<String>,
}

impl FixtureDocument {
	/// Parses a document from a string.
	///
	/// # Example
	///
	/// ```
	/// use fixtura_seeding::fixtures::{FixtureDocument, FixtureFormat};
	///
	/// let document = FixtureDocument::parse("Team:\n  t1:\n    Title: Reds\n", FixtureFormat::Yaml)
	/// 	.unwrap();
	/// assert_eq!(document.blocks()[0].model, "Team");
	/// assert_eq!(document.len(), 1);
	/// ```
	pub fn parse(content: &str, format: FixtureFormat) -> SeedingResult<Self> {
		FixtureParser::new().parse_string(content, format)
	}

	/// Creates a document from blocks.
	pub fn from_blocks(blocks: Vec<ModelBlock>) -> Self {
		Self {
			blocks,
			source: None,
		}
	}

	/// Sets the source the document was read from.
	pub fn with_source(mut self, source: impl Into<String>) -> Self {
		self.source = Some(source.into());
		self
	}

	/// Returns the source the document was read from, if any.
	pub fn source(&self) -> Option<&str> {
		self.source.as_deref()
	}

	/// Returns the blocks in document order.
	pub fn blocks(&self) -> &[ModelBlock] {
		&self.blocks
	}

	/// Returns the total number of records.
	pub fn len(&self) -> usize {
		self.blocks.iter().map(ModelBlock::len).sum()
	}

	/// Returns true if the document has no records.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl IntoIterator for FixtureDocument {
	type Item = ModelBlock;
	type IntoIter = std::vec::IntoIter<ModelBlock>;

	fn into_iter(self) -> Self::IntoIter {
		self.blocks.into_iter()
	}
}

/// Statistics of one or more fixture loads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadResult {
	/// Total number of records written.
	pub records_loaded: usize,
	/// Records written per model or raw table, in first-seen order.
	pub per_model: IndexMap<String, usize>,
	/// Names that were written as raw tables.
	pub raw_tables: Vec<String>,
	/// Sources that were skipped because they do not exist.
	pub skipped_sources: Vec<String>,
}

impl LoadResult {
	/// Creates an empty result.
	pub fn new() -> Self {
		Self::default()
	}

	fn record(&mut self, model: &str) {
		self.records_loaded += 1;
		*self.per_model.entry(model.to_string()).or_default() += 1;
	}

	/// Returns the number of records written for `model`.
	pub fn count(&self, model: &str) -> usize {
		self.per_model.get(model).copied().unwrap_or(0)
	}

	/// Adds the statistics of `other`.
	pub fn merge(&mut self, other: LoadResult) {
		self.records_loaded += other.records_loaded;
		for (model, count) in other.per_model {
			*self.per_model.entry(model).or_default() += count;
		}
		for table in other.raw_tables {
			if !self.raw_tables.contains(&table) {
				self.raw_tables.push(table);
			}
		}
		self.skipped_sources.extend(other.skipped_sources);
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum FixtureSource {
	File(PathBuf),
	Inline(String),
}

/// A fixture document given as a file path or inline content.
///
/// # Example
///
/// ```
/// use fixtura_db::{MemoryStore, ModelSchema};
/// use fixtura_seeding::fixtures::{FixtureFactory, YamlFixture};
///
/// let store = MemoryStore::new().with_model(ModelSchema::new("Team").field("Title"));
/// let mut factory = FixtureFactory::new(store);
///
/// let fixture = YamlFixture::new("Team:\n  reds:\n    Title: Reds\n");
/// let result = fixture.write_into(&mut factory).unwrap();
///
/// assert_eq!(result.count("Team"), 1);
/// assert!(factory.get_id("Team", "reds").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YamlFixture {
	source: FixtureSource,
}

impl YamlFixture {
	/// Creates a fixture from a path or from inline content.
	///
	/// Input containing a newline is treated as document content, anything
	/// else as a file path.
	pub fn new(file_or_string: impl Into<String>) -> Self {
		let input = file_or_string.into();
		if input.contains('\n') {
			Self::from_string(input)
		} else {
			Self::from_file(input)
		}
	}

	/// Creates a fixture backed by a file.
	pub fn from_file(path: impl Into<PathBuf>) -> Self {
		Self {
			source: FixtureSource::File(path.into()),
		}
	}

	/// Creates a fixture from inline content.
	pub fn from_string(content: impl Into<String>) -> Self {
		Self {
			source: FixtureSource::Inline(content.into()),
		}
	}

	/// Resolves a relative file path against `base`.
	pub fn with_base_path(mut self, base: impl AsRef<Path>) -> Self {
		if let FixtureSource::File(path) = &self.source
			&& path.is_relative()
		{
			self.source = FixtureSource::File(base.as_ref().join(path));
		}
		self
	}

	/// Returns the file path, for file backed fixtures.
	pub fn file_name(&self) -> Option<&Path> {
		match &self.source {
			FixtureSource::File(path) => Some(path),
			FixtureSource::Inline(_) => None,
		}
	}

	/// Returns the inline content, for string backed fixtures.
	pub fn fixture_string(&self) -> Option<&str> {
		match &self.source {
			FixtureSource::File(_) => None,
			FixtureSource::Inline(content) => Some(content),
		}
	}

	/// Reads and parses the document.
	///
	/// Returns `Ok(None)` when the file does not exist or is a directory.
	///
	/// # Errors
	///
	/// [`SeedingError::UnsupportedExtension`] for files that are neither
	/// YAML nor JSON, and any parse error of the content.
	pub fn document(&self) -> SeedingResult<Option<FixtureDocument>> {
		match &self.source {
			FixtureSource::Inline(content) => {
				FixtureDocument::parse(content, FixtureFormat::Yaml).map(Some)
			}
			FixtureSource::File(path) => {
				if !path.is_file() {
					return Ok(None);
				}
				match FixtureParser::new().parse_file(path) {
					Ok(document) => Ok(Some(document)),
					Err(SeedingError::FileNotFound(_)) => Ok(None),
					Err(e) => Err(e),
				}
			}
		}
	}

	/// Writes every record of the document into `factory`.
	///
	/// Names the store knows as models, and names of defined blueprints, go
	/// through [`FixtureFactory::create_object`]; everything else is
	/// inserted as a raw table row through [`FixtureFactory::create_raw`].
	/// The first failing record aborts the load; records before it stay
	/// written.
	pub fn write_into(&self, factory: &mut FixtureFactory) -> SeedingResult<LoadResult> {
		let mut result = LoadResult::new();
		let Some(document) = self.document()? else {
			let skipped = self
				.file_name()
				.map(|path| path.display().to_string())
				.unwrap_or_default();
			tracing::warn!(source = %skipped, "fixture file not found, skipping");
			result.skipped_sources.push(skipped);
			return Ok(result);
		};

		let source = document.source().unwrap_or("<inline>").to_string();
		for block in document {
			let typed =
				factory.store().has_model(&block.model) || factory.blueprint(&block.model).is_some();
			if !typed && !block.is_empty() && !result.raw_tables.contains(&block.model) {
				result.raw_tables.push(block.model.clone());
			}

			for (identifier, fields) in block.records {
				if typed {
					factory.create_object(&block.model, &identifier, fields)?;
				} else {
					factory.create_raw(&block.model, &identifier, fields)?;
				}
				result.record(&block.model);
			}
		}

		tracing::info!(
			source = %source,
			records = result.records_loaded,
			models = result.per_model.len(),
			"fixtures loaded"
		);
		Ok(result)
	}
}

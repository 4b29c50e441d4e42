//! loadfixtures command implementation.
//!
//! This command writes fixture files into a [`FixtureFactory`].

use std::path::PathBuf;

use crate::error::{SeedingError, SeedingResult};
use crate::fixtures::{FixtureFactory, LoadResult, YamlFixture};
use crate::settings::FixtureSettings;

/// Arguments for the loadfixtures command.
#[derive(Debug, Clone, Default)]
pub struct LoadFixturesArgs {
	/// Fixture file paths to load, in order.
	pub fixture_paths: Vec<PathBuf>,
}

/// Options for the loadfixtures command.
#[derive(Debug, Clone, Default)]
pub struct LoadFixturesOptions {
	/// Directory relative fixture paths are resolved against.
	pub base_path: Option<PathBuf>,

	/// Skip missing files instead of failing.
	pub ignore_missing: bool,

	/// Verbosity level.
	pub verbosity: u8,
}

impl LoadFixturesOptions {
	/// Creates new default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the base path.
	pub fn with_base_path(mut self, base_path: impl Into<PathBuf>) -> Self {
		self.base_path = Some(base_path.into());
		self
	}

	/// Sets ignore missing flag.
	pub fn with_ignore_missing(mut self, ignore: bool) -> Self {
		self.ignore_missing = ignore;
		self
	}

	/// Sets verbosity level.
	pub fn with_verbosity(mut self, level: u8) -> Self {
		self.verbosity = level;
		self
	}
}

/// The loadfixtures command.
///
/// # Example
///
/// ```no_run
/// use fixtura_db::{MemoryStore, ModelSchema};
/// use fixtura_seeding::commands::{LoadFixturesArgs, LoadFixturesCommand, LoadFixturesOptions};
/// use fixtura_seeding::fixtures::FixtureFactory;
///
/// let mut factory = FixtureFactory::new(
/// 	MemoryStore::new().with_model(ModelSchema::new("Team").field("Title")),
/// );
/// let args = LoadFixturesArgs {
/// 	fixture_paths: vec!["fixtures/teams.yml".into()],
/// };
/// let options = LoadFixturesOptions::new().with_verbosity(1);
/// let result = LoadFixturesCommand::new()
/// 	.execute(args, options, &mut factory)
/// 	.unwrap();
/// assert!(result.records_loaded > 0);
/// ```
#[derive(Debug, Default)]
pub struct LoadFixturesCommand;

impl LoadFixturesCommand {
	/// Creates a new loadfixtures command.
	pub fn new() -> Self {
		Self
	}

	/// Returns the command name.
	pub fn name(&self) -> &str {
		"loadfixtures"
	}

	/// Returns the command description.
	pub fn description(&self) -> &str {
		"Writes the named YAML fixture file(s) into the store"
	}

	/// Returns the command help text.
	pub fn help(&self) -> &str {
		r#"
Usage: loadfixtures [options] fixture [fixture ...]

Writes the named YAML fixture file(s) into the store, in order.

Arguments:
  fixture              One or more fixture files to load

Options:
  --base-path DIR      Resolve relative fixture paths against DIR
  --ignore-missing     Skip fixture files that do not exist
  --verbosity LEVEL    Verbosity level (0=minimal, 1=normal, 2=verbose)
"#
	}

	/// Builds arguments and options from settings.
	pub fn from_settings(settings: &FixtureSettings) -> (LoadFixturesArgs, LoadFixturesOptions) {
		let args = LoadFixturesArgs {
			fixture_paths: settings.fixture_files.clone(),
		};
		let options = LoadFixturesOptions::new()
			.with_base_path(settings.base_path.clone())
			.with_verbosity(settings.verbosity);
		(args, options)
	}

	/// Executes the loadfixtures command.
	///
	/// Files are written in order into `factory`; references may point at
	/// records from earlier files.
	pub fn execute(
		&self,
		args: LoadFixturesArgs,
		options: LoadFixturesOptions,
		factory: &mut FixtureFactory,
	) -> SeedingResult<LoadResult> {
		if args.fixture_paths.is_empty() {
			return Err(SeedingError::ValidationError {
				field: "fixture_paths".to_string(),
				message: "At least one fixture file must be specified".to_string(),
			});
		}

		let paths: Vec<PathBuf> = args
			.fixture_paths
			.into_iter()
			.map(|path| match &options.base_path {
				Some(base) if path.is_relative() => base.join(path),
				_ => path,
			})
			.collect();

		if !options.ignore_missing {
			for path in &paths {
				if !path.is_file() {
					return Err(SeedingError::FileNotFound(path.display().to_string()));
				}
			}
		}

		let mut result = LoadResult::new();
		for path in paths {
			let loaded = YamlFixture::from_file(&path).write_into(factory)?;
			if options.verbosity > 1 {
				tracing::info!(
					file = %path.display(),
					records = loaded.records_loaded,
					"fixture file loaded"
				);
			}
			result.merge(loaded);
		}

		if options.verbosity > 0 {
			self.report(&result);
		}

		Ok(result)
	}

	fn report(&self, result: &LoadResult) {
		tracing::info!("Installed {} object(s)", result.records_loaded);

		for (model, count) in &result.per_model {
			tracing::debug!(model = %model, count, "objects installed");
		}

		if !result.skipped_sources.is_empty() {
			tracing::warn!(skipped = ?result.skipped_sources, "fixture files skipped");
		}
	}
}

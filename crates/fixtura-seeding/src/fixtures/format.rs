//! Fixture file formats.

use std::path::Path;

/// Supported fixture document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum FixtureFormat {
	/// YAML (default).
	#[default]
	Yaml,

	/// JSON, same three level shape as YAML.
	Json,
}

impl FixtureFormat {
	/// Determines the fixture format from a file extension.
	///
	/// # Example
	///
	/// ```
	/// # use fixtura_seeding::fixtures::FixtureFormat;
	/// assert_eq!(FixtureFormat::from_extension("yml"), Some(FixtureFormat::Yaml));
	/// assert_eq!(FixtureFormat::from_extension("JSON"), Some(FixtureFormat::Json));
	/// assert_eq!(FixtureFormat::from_extension("csv"), None);
	/// ```
	pub fn from_extension(ext: &str) -> Option<Self> {
		match ext.to_lowercase().as_str() {
			"yaml" | "yml" => Some(Self::Yaml),
			"json" => Some(Self::Json),
			_ => None,
		}
	}

	/// Determines the fixture format from a file path.
	pub fn from_path(path: &Path) -> Option<Self> {
		path.extension()
			.and_then(|ext| ext.to_str())
			.and_then(Self::from_extension)
	}

	/// Returns the default file extension for this format.
	pub fn extension(&self) -> &'static str {
		match self {
			Self::Yaml => "yml",
			Self::Json => "json",
		}
	}
}

impl std::fmt::Display for FixtureFormat {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Yaml => write!(f, "YAML"),
			Self::Json => write!(f, "JSON"),
		}
	}
}

//! Test data loader helper.
//!
//! Provides convenient access to the fixture documents under `tests/data`.

use std::path::{Path, PathBuf};

/// Test data loader for fixture files.
pub struct TestDataLoader {
	base_path: PathBuf,
}

impl TestDataLoader {
	/// Create a new test data loader rooted at this crate's `tests/data`.
	pub fn new() -> Self {
		Self {
			base_path: Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data"),
		}
	}

	/// Returns the base directory.
	pub fn base_path(&self) -> &Path {
		&self.base_path
	}

	/// Returns the path of a YAML test document.
	///
	/// # Arguments
	///
	/// * `name` - Name of the test data file (without .yml extension)
	pub fn yaml_path(&self, name: &str) -> PathBuf {
		self.base_path.join(format!("{}.yml", name))
	}

	/// Load YAML test data by name.
	///
	/// # Panics
	///
	/// Panics if the file cannot be read.
	pub fn load_yaml(&self, name: &str) -> String {
		let path = self.yaml_path(name);
		std::fs::read_to_string(&path)
			.unwrap_or_else(|_| panic!("Failed to load test data: {:?}", path))
	}
}

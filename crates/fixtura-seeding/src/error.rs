//! Error types for the seeding module.
//!
//! This module defines the error types used throughout the fixtura-seeding crate.

use fixtura_db::DbError;
use thiserror::Error;

/// Errors that can occur while materializing fixtures.
#[derive(Debug, Error)]
pub enum SeedingError {
	/// A `=>Model.identifier` reference points at a fixture that was not
	/// created yet.
	#[error("No fixture definitions found for \"{0}\"")]
	UnresolvedReference(String),

	/// Malformed reference, ambiguous relation, unknown callback kind or an
	/// unusable blueprint target.
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),

	/// The store rejected an operation.
	#[error("Persistence error: {0}")]
	Persistence(#[from] DbError),

	/// The fixture document has an unexpected shape.
	#[error("Parse error: {0}")]
	ParseError(String),

	/// Validation failed for a specific field.
	#[error("Validation error: {field}: {message}")]
	ValidationError {
		/// Field that failed validation.
		field: String,
		/// Validation error message.
		message: String,
	},

	/// A fixture lookup from test code found nothing.
	#[error("Couldn't find object '{identifier}' (model: {model})")]
	FixtureNotFound {
		/// Model that was searched.
		model: String,
		/// Fixture identifier.
		identifier: String,
	},

	/// I/O operation failed.
	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),

	/// YAML deserialization error.
	#[error("YAML error: {0}")]
	YamlError(#[from] serde_yaml::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	JsonError(#[from] serde_json::Error),

	/// TOML settings error.
	#[error("TOML error: {0}")]
	TomlError(#[from] toml::de::Error),

	/// Fixture file not found.
	#[error("Fixture file not found: {0}")]
	FileNotFound(String),

	/// Unsupported file extension.
	#[error("Unsupported file extension: {0}")]
	UnsupportedExtension(String),
}

/// Result type alias for seeding operations.
pub type SeedingResult<T> = Result<T, SeedingError>;

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_unresolved_reference_names_value() {
		let error = SeedingError::UnresolvedReference("=>Team.missing".to_string());
		assert_eq!(
			error.to_string(),
			"No fixture definitions found for \"=>Team.missing\""
		);
	}

	#[rstest]
	fn test_validation_error() {
		let error = SeedingError::ValidationError {
			field: "fixture_paths".to_string(),
			message: "at least one fixture file must be specified".to_string(),
		};
		assert_eq!(
			error.to_string(),
			"Validation error: fixture_paths: at least one fixture file must be specified"
		);
	}

	#[rstest]
	fn test_db_error_from() {
		let seeding_error: SeedingError = DbError::UnknownModel("Coach".to_string()).into();
		assert!(matches!(seeding_error, SeedingError::Persistence(_)));
	}

	#[rstest]
	fn test_yaml_error_from() {
		let yaml_error =
			serde_yaml::from_str::<serde_yaml::Value>("key: [unclosed").unwrap_err();
		let seeding_error: SeedingError = yaml_error.into();
		assert!(matches!(seeding_error, SeedingError::YamlError(_)));
	}
}

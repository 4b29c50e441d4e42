//! Error types for the persistence boundary.

use thiserror::Error;

use crate::RecordId;

/// Errors raised by a [`Store`](crate::Store) implementation.
#[derive(Debug, Error)]
pub enum DbError {
	/// The model is not described by the schema.
	#[error("Unknown model: {0}")]
	UnknownModel(String),

	/// The table has never been created.
	#[error("Unknown table: {0}")]
	UnknownTable(String),

	/// No row exists for the given table and id.
	#[error("Record not found: {table}#{id}")]
	RecordNotFound {
		/// Table that was searched.
		table: String,
		/// Missing primary key.
		id: RecordId,
	},

	/// An explicit primary key was written while explicit ids are disabled.
	#[error("Explicit primary key {id} rejected for table {table}")]
	ExplicitIdRejected {
		/// Target table.
		table: String,
		/// Rejected primary key.
		id: RecordId,
	},

	/// The relation is not a to-many relation of the model.
	#[error("Unknown relation {relation} on model {model}")]
	UnknownRelation {
		/// Owning model.
		model: String,
		/// Relation name.
		relation: String,
	},

	/// A value could not be stored.
	#[error("Invalid value for {field}: {message}")]
	InvalidValue {
		/// Offending field.
		field: String,
		/// Reason.
		message: String,
	},
}

/// Result type alias for store operations.
pub type DbResult<T> = Result<T, DbError>;

//! Fixture document parsing.
//!
//! Both formats are normalized into a `serde_json::Value` tree with string
//! keys before the document structure is validated, so YAML mappings keyed
//! by numbers (`1: {Title: ...}`) become identifiers `"1"`.

use std::path::Path;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::{FieldMap, FixtureDocument, FixtureFormat, ModelBlock};
use crate::error::{SeedingError, SeedingResult};

/// Parser for fixture documents.
#[derive(Debug, Default)]
pub struct FixtureParser;

impl FixtureParser {
	/// Creates a new fixture parser.
	pub fn new() -> Self {
		Self
	}

	/// Parses a fixture file, detecting the format from its extension.
	///
	/// # Errors
	///
	/// Returns an error if:
	/// - The file extension is not recognized
	/// - The file cannot be read
	/// - The content is not a valid fixture document
	pub fn parse_file(&self, path: &Path) -> SeedingResult<FixtureDocument> {
		let format = FixtureFormat::from_path(path).ok_or_else(|| {
			SeedingError::UnsupportedExtension(
				path.extension()
					.and_then(|e| e.to_str())
					.unwrap_or("(none)")
					.to_string(),
			)
		})?;

		let content = std::fs::read_to_string(path).map_err(|e| {
			if e.kind() == std::io::ErrorKind::NotFound {
				SeedingError::FileNotFound(path.display().to_string())
			} else {
				SeedingError::IoError(e)
			}
		})?;

		Ok(self
			.parse_string(&content, format)?
			.with_source(path.display().to_string()))
	}

	/// Parses a fixture document from a string.
	///
	/// Empty (or whitespace only) content is an empty document.
	pub fn parse_string(&self, content: &str, format: FixtureFormat) -> SeedingResult<FixtureDocument> {
		if content.trim().is_empty() {
			return Ok(FixtureDocument::default());
		}

		let root = match format {
			FixtureFormat::Json => serde_json::from_str(content)?,
			FixtureFormat::Yaml => yaml_to_json(serde_yaml::from_str(content)?)?,
		};
		self.parse_value(root)
	}

	/// Builds a document from an already parsed value tree.
	pub fn parse_value(&self, root: Value) -> SeedingResult<FixtureDocument> {
		let models = match root {
			Value::Object(models) => models,
			Value::Null => return Ok(FixtureDocument::default()),
			other => {
				return Err(SeedingError::ParseError(format!(
					"Expected a map of models at the document root, got {}",
					type_name(&other)
				)));
			}
		};

		let mut blocks = Vec::with_capacity(models.len());
		for (model, records) in models {
			let records = match records {
				Value::Object(records) => records,
				Value::Null => Map::new(),
				other => {
					return Err(SeedingError::ParseError(format!(
						"Expected a map of records for \"{}\", got {}",
						model,
						type_name(&other)
					)));
				}
			};

			let mut parsed = IndexMap::with_capacity(records.len());
			for (identifier, fields) in records {
				let fields = match fields {
					Value::Object(_) | Value::Null => FieldMap::from_json(fields)?,
					other => {
						return Err(SeedingError::ParseError(format!(
							"Expected a map of fields for \"{}.{}\", got {}",
							model,
							identifier,
							type_name(&other)
						)));
					}
				};
				parsed.insert(identifier, fields);
			}
			blocks.push(ModelBlock::new(model, parsed));
		}

		Ok(FixtureDocument::from_blocks(blocks))
	}
}

fn type_name(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "a boolean",
		Value::Number(_) => "a number",
		Value::String(_) => "a string",
		Value::Array(_) => "a sequence",
		Value::Object(_) => "a map",
	}
}

fn yaml_key(key: serde_yaml::Value) -> SeedingResult<String> {
	match key {
		serde_yaml::Value::String(key) => Ok(key),
		serde_yaml::Value::Number(key) => Ok(key.to_string()),
		serde_yaml::Value::Bool(key) => Ok(key.to_string()),
		other => Err(SeedingError::ParseError(format!(
			"Unsupported mapping key {:?}",
			other
		))),
	}
}

/// Converts a YAML tree into JSON, stringifying scalar mapping keys.
fn yaml_to_json(value: serde_yaml::Value) -> SeedingResult<Value> {
	Ok(match value {
		serde_yaml::Value::Null => Value::Null,
		serde_yaml::Value::Bool(b) => Value::Bool(b),
		serde_yaml::Value::Number(n) => {
			if let Some(u) = n.as_u64() {
				Value::from(u)
			} else if let Some(i) = n.as_i64() {
				Value::from(i)
			} else {
				n.as_f64()
					.and_then(serde_json::Number::from_f64)
					.map(Value::Number)
					.unwrap_or(Value::Null)
			}
		}
		serde_yaml::Value::String(s) => Value::String(s),
		serde_yaml::Value::Sequence(items) => Value::Array(
			items
				.into_iter()
				.map(yaml_to_json)
				.collect::<SeedingResult<Vec<_>>>()?,
		),
		serde_yaml::Value::Mapping(mapping) => {
			let mut object = Map::with_capacity(mapping.len());
			for (key, value) in mapping {
				object.insert(yaml_key(key)?, yaml_to_json(value)?);
			}
			Value::Object(object)
		}
		serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value)?,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fixtures::FixtureValue;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_parse_yaml_keeps_document_order() {
		let parser = FixtureParser::new();
		let yaml = r#"
Team:
  t1:
    Title: Reds
  t2:
    Title: Blues
Player:
  p1:
    Name: Joe
    Team: =>Team.t1
"#;
		let document = parser.parse_string(yaml, FixtureFormat::Yaml).unwrap();
		let models: Vec<&str> = document.blocks().iter().map(|b| b.model.as_str()).collect();
		assert_eq!(models, vec!["Team", "Player"]);

		let team = &document.blocks()[0];
		assert_eq!(team.records.keys().collect::<Vec<_>>(), vec!["t1", "t2"]);

		let player = &document.blocks()[1].records["p1"];
		assert!(matches!(player.get("Team"), Some(FixtureValue::Reference(_))));
		assert_eq!(document.len(), 3);
	}

	#[rstest]
	fn test_parse_yaml_numeric_identifiers_and_null_bodies() {
		let parser = FixtureParser::new();
		let document = parser
			.parse_string("Team:\n  1:\n  2:\n    Title: Two\n", FixtureFormat::Yaml)
			.unwrap();
		let team = &document.blocks()[0];
		assert!(team.records["1"].is_empty());
		assert_eq!(
			team.records["2"].get("Title"),
			Some(&FixtureValue::literal("Two"))
		);
	}

	#[rstest]
	#[case("")]
	#[case("   \n")]
	fn test_parse_empty(#[case] content: &str) {
		let parser = FixtureParser::new();
		assert!(
			parser
				.parse_string(content, FixtureFormat::Yaml)
				.unwrap()
				.is_empty()
		);
	}

	#[rstest]
	fn test_parse_json() {
		let parser = FixtureParser::new();
		let document = parser
			.parse_string(
				r#"{"Team": {"t1": {"Title": "Reds", "Sponsors": ["=>Sponsor.s1"]}}}"#,
				FixtureFormat::Json,
			)
			.unwrap();
		let fields = &document.blocks()[0].records["t1"];
		assert!(matches!(
			fields.get("Sponsors"),
			Some(FixtureValue::ReferenceList(items)) if items.len() == 1
		));
	}

	#[rstest]
	#[case("- a\n- b\n")]
	#[case("Team: nope\n")]
	#[case("Team:\n  t1: [1, 2]\n")]
	fn test_parse_rejects_wrong_shapes(#[case] content: &str) {
		let parser = FixtureParser::new();
		assert!(matches!(
			parser.parse_string(content, FixtureFormat::Yaml),
			Err(SeedingError::ParseError(_))
		));
	}

	#[rstest]
	fn test_parse_yaml_syntax_error() {
		let parser = FixtureParser::new();
		assert!(matches!(
			parser.parse_string("Team: [unclosed", FixtureFormat::Yaml),
			Err(SeedingError::YamlError(_))
		));
	}

	#[rstest]
	fn test_parse_file_unsupported_extension() {
		let parser = FixtureParser::new();
		assert!(matches!(
			parser.parse_file(Path::new("fixtures.csv")),
			Err(SeedingError::UnsupportedExtension(ref ext)) if ext == "csv"
		));
		assert!(matches!(
			parser.parse_file(Path::new("/nonexistent/fixtures.yml")),
			Err(SeedingError::FileNotFound(_))
		));
	}

	#[rstest]
	fn test_yaml_to_json_nested_values() {
		let yaml: serde_yaml::Value =
			serde_yaml::from_str("a: [1, -2, 1.5, true, ~]\nb: {3: x}\n").unwrap();
		assert_eq!(
			yaml_to_json(yaml).unwrap(),
			json!({"a": [1, -2, 1.5, true, null], "b": {"3": "x"}})
		);
	}
}

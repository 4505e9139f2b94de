//! Strict keyword extraction from raw JSON Schema documents
//!
//! The canonicalizer rejects malformed keyword shapes here, up front, so the
//! kernels never see an invalid schema. Each accessor validates the Draft-04
//! shape of one keyword and reports `InvalidSchema` with a JSON-pointer-ish
//! location on mismatch.

use num_rational::BigRational;
use num_traits::Zero;
use serde_json::{Map, Value};
use subsume_core::error::{Error, Result};
use subsume_core::number::rational_from_number;
use subsume_core::types::BaseType;

/// A validated view over one raw schema object
#[derive(Debug)]
pub struct RawSchema<'a> {
    object: &'a Map<String, Value>,
    location: String,
}

impl<'a> RawSchema<'a> {
    /// Wrap a schema value, requiring it to be a JSON object
    pub fn new(value: &'a Value, location: &str) -> Result<RawSchema<'a>> {
        match value {
            Value::Object(object) => Ok(RawSchema {
                object,
                location: location.to_string(),
            }),
            other => Err(Error::invalid_schema(
                location,
                format!("schema must be an object, found {}", type_name(other)),
            )),
        }
    }

    /// The schema's location in the enclosing document
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Location of a keyword under this schema
    pub fn keyword_location(&self, keyword: &str) -> String {
        format!("{}/{keyword}", self.location)
    }

    /// Raw keyword access
    pub fn get(&self, keyword: &str) -> Option<&'a Value> {
        self.object.get(keyword)
    }

    /// `$ref`, when present
    pub fn reference(&self) -> Result<Option<&'a str>> {
        self.string_keyword("$ref")
    }

    /// The listed base types: `type` as string or array, `None` when absent
    pub fn types(&self) -> Result<Option<Vec<BaseType>>> {
        let Some(value) = self.get("type") else {
            return Ok(None);
        };
        let location = self.keyword_location("type");
        match value {
            Value::String(name) => {
                let base = BaseType::from_keyword(name).ok_or_else(|| {
                    Error::invalid_schema(&location, format!("unknown type '{name}'"))
                })?;
                Ok(Some(vec![base]))
            }
            Value::Array(names) => {
                if names.is_empty() {
                    return Err(Error::invalid_schema(&location, "type array must not be empty"));
                }
                let mut bases = Vec::with_capacity(names.len());
                for name in names {
                    let Value::String(name) = name else {
                        return Err(Error::invalid_schema(
                            &location,
                            "type array entries must be strings",
                        ));
                    };
                    let base = BaseType::from_keyword(name).ok_or_else(|| {
                        Error::invalid_schema(&location, format!("unknown type '{name}'"))
                    })?;
                    if !bases.contains(&base) {
                        bases.push(base);
                    }
                }
                Ok(Some(bases))
            }
            other => Err(Error::invalid_schema(
                &location,
                format!("'type' must be a string or array, found {}", type_name(other)),
            )),
        }
    }

    /// `enum` values (must be a non-empty array)
    pub fn enumeration(&self) -> Result<Option<&'a Vec<Value>>> {
        let Some(value) = self.get("enum") else {
            return Ok(None);
        };
        let location = self.keyword_location("enum");
        match value {
            Value::Array(values) if !values.is_empty() => Ok(Some(values)),
            Value::Array(_) => Err(Error::invalid_schema(&location, "'enum' must not be empty")),
            other => Err(Error::invalid_schema(
                &location,
                format!("'enum' must be an array, found {}", type_name(other)),
            )),
        }
    }

    /// `const` value
    pub fn const_value(&self) -> Option<&'a Value> {
        self.get("const")
    }

    /// `stype` annotation
    pub fn stype(&self) -> Result<Option<&'a str>> {
        self.string_keyword("stype")
    }

    /// A numeric keyword as an exact rational
    pub fn number_keyword(&self, keyword: &str) -> Result<Option<BigRational>> {
        let Some(value) = self.get(keyword) else {
            return Ok(None);
        };
        let location = self.keyword_location(keyword);
        let Value::Number(n) = value else {
            return Err(Error::invalid_schema(
                &location,
                format!("'{keyword}' must be a number, found {}", type_name(value)),
            ));
        };
        rational_from_number(n)
            .map(Some)
            .ok_or_else(|| Error::invalid_schema(&location, format!("'{keyword}' is not finite")))
    }

    /// `multipleOf` (must be positive)
    pub fn multiple_of(&self) -> Result<Option<BigRational>> {
        let Some(m) = self.number_keyword("multipleOf")? else {
            return Ok(None);
        };
        if m <= BigRational::zero() {
            return Err(Error::invalid_schema(
                self.keyword_location("multipleOf"),
                "'multipleOf' must be positive",
            ));
        }
        Ok(Some(m))
    }

    /// A boolean keyword (Draft-04 `exclusiveMinimum`/`exclusiveMaximum`,
    /// `uniqueItems`)
    pub fn bool_keyword(&self, keyword: &str) -> Result<Option<bool>> {
        let Some(value) = self.get(keyword) else {
            return Ok(None);
        };
        match value {
            Value::Bool(b) => Ok(Some(*b)),
            other => Err(Error::invalid_schema(
                self.keyword_location(keyword),
                format!("'{keyword}' must be a boolean, found {}", type_name(other)),
            )),
        }
    }

    /// A non-negative integer keyword (lengths, counts)
    pub fn count_keyword(&self, keyword: &str) -> Result<Option<u64>> {
        let Some(value) = self.get(keyword) else {
            return Ok(None);
        };
        let location = self.keyword_location(keyword);
        value
            .as_u64()
            .map(Some)
            .ok_or_else(|| {
                Error::invalid_schema(
                    &location,
                    format!(
                        "'{keyword}' must be a non-negative integer, found {}",
                        type_name(value)
                    ),
                )
            })
    }

    /// A string keyword
    pub fn string_keyword(&self, keyword: &str) -> Result<Option<&'a str>> {
        let Some(value) = self.get(keyword) else {
            return Ok(None);
        };
        match value {
            Value::String(s) => Ok(Some(s)),
            other => Err(Error::invalid_schema(
                self.keyword_location(keyword),
                format!("'{keyword}' must be a string, found {}", type_name(other)),
            )),
        }
    }

    /// A keyword holding an array of subschemas (`allOf`, `anyOf`, `oneOf`)
    pub fn schema_array(&self, keyword: &str) -> Result<Option<&'a Vec<Value>>> {
        let Some(value) = self.get(keyword) else {
            return Ok(None);
        };
        let location = self.keyword_location(keyword);
        match value {
            Value::Array(items) if !items.is_empty() => Ok(Some(items)),
            Value::Array(_) => Err(Error::invalid_schema(
                &location,
                format!("'{keyword}' must not be empty"),
            )),
            other => Err(Error::invalid_schema(
                &location,
                format!("'{keyword}' must be an array, found {}", type_name(other)),
            )),
        }
    }

    /// `required`: deduplicated, sorted property names
    pub fn required(&self) -> Result<Vec<String>> {
        let Some(value) = self.get("required") else {
            return Ok(Vec::new());
        };
        let location = self.keyword_location("required");
        let Value::Array(names) = value else {
            return Err(Error::invalid_schema(
                &location,
                format!("'required' must be an array, found {}", type_name(value)),
            ));
        };
        let mut out = Vec::with_capacity(names.len());
        for name in names {
            let Value::String(name) = name else {
                return Err(Error::invalid_schema(
                    &location,
                    "'required' entries must be strings",
                ));
            };
            if !out.contains(name) {
                out.push(name.clone());
            }
        }
        out.sort();
        Ok(out)
    }

    /// A keyword holding a map of subschemas (`properties`,
    /// `patternProperties`, `$defs`, `definitions`)
    pub fn schema_map(&self, keyword: &str) -> Result<Option<&'a Map<String, Value>>> {
        let Some(value) = self.get(keyword) else {
            return Ok(None);
        };
        match value {
            Value::Object(map) => Ok(Some(map)),
            other => Err(Error::invalid_schema(
                self.keyword_location(keyword),
                format!("'{keyword}' must be an object, found {}", type_name(other)),
            )),
        }
    }

    /// `additionalProperties` / `additionalItems`: boolean or subschema
    pub fn additional(&self, keyword: &str) -> Result<Option<BoolOrSchema<'a>>> {
        let Some(value) = self.get(keyword) else {
            return Ok(None);
        };
        match value {
            Value::Bool(b) => Ok(Some(BoolOrSchema::Bool(*b))),
            Value::Object(_) => Ok(Some(BoolOrSchema::Schema(value))),
            other => Err(Error::invalid_schema(
                self.keyword_location(keyword),
                format!(
                    "'{keyword}' must be a boolean or schema, found {}",
                    type_name(other)
                ),
            )),
        }
    }

    /// `items`: single subschema or positional array
    pub fn items(&self) -> Result<Option<ItemsShape<'a>>> {
        let Some(value) = self.get("items") else {
            return Ok(None);
        };
        match value {
            Value::Object(_) => Ok(Some(ItemsShape::Single(value))),
            Value::Array(tuple) => Ok(Some(ItemsShape::Tuple(tuple))),
            other => Err(Error::invalid_schema(
                self.keyword_location("items"),
                format!("'items' must be a schema or array, found {}", type_name(other)),
            )),
        }
    }
}

/// `additionalProperties` / `additionalItems` payloads
pub enum BoolOrSchema<'a> {
    Bool(bool),
    Schema(&'a Value),
}

/// `items` payloads
pub enum ItemsShape<'a> {
    Single(&'a Value),
    Tuple(&'a Vec<Value>),
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rejects_non_object_schema() {
        let err = RawSchema::new(&json!(3), "").unwrap_err();
        assert!(matches!(err, Error::InvalidSchema { .. }));
    }

    #[test]
    fn test_type_shapes() {
        let schema = json!({"type": "integer"});
        let raw = RawSchema::new(&schema, "").unwrap();
        assert_eq!(raw.types().unwrap(), Some(vec![BaseType::Integer]));

        let schema = json!({"type": ["integer", "string", "integer"]});
        let raw = RawSchema::new(&schema, "").unwrap();
        assert_eq!(
            raw.types().unwrap(),
            Some(vec![BaseType::Integer, BaseType::String])
        );

        let schema = json!({"type": 3});
        let raw = RawSchema::new(&schema, "").unwrap();
        assert!(raw.types().is_err());

        let schema = json!({"type": "float"});
        let raw = RawSchema::new(&schema, "").unwrap();
        assert!(raw.types().is_err());
    }

    #[test]
    fn test_numeric_keyword_validation() {
        let schema = json!({"minimum": "3"});
        let raw = RawSchema::new(&schema, "").unwrap();
        let err = raw.number_keyword("minimum").unwrap_err();
        assert!(err.to_string().contains("minimum"));

        let schema = json!({"multipleOf": 0});
        let raw = RawSchema::new(&schema, "").unwrap();
        assert!(raw.multiple_of().is_err());

        let schema = json!({"multipleOf": 0.5});
        let raw = RawSchema::new(&schema, "").unwrap();
        assert!(raw.multiple_of().unwrap().is_some());
    }

    #[test]
    fn test_required_sorted_dedup() {
        let schema = json!({"required": ["b", "a", "b"]});
        let raw = RawSchema::new(&schema, "").unwrap();
        assert_eq!(raw.required().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_error_location_includes_path() {
        let schema = json!({"minLength": -1});
        let raw = RawSchema::new(&schema, "/properties/name").unwrap();
        let err = raw.count_keyword("minLength").unwrap_err();
        assert!(err.to_string().contains("/properties/name/minLength"));
    }
}

//! `$ref` resolution within a single schema document
//!
//! Only intra-document references are supported (`#`, `#/definitions/...`,
//! `#/$defs/...`, or any other fragment pointer into the root document);
//! the engine never fetches anything. Unresolvable references surface as
//! [`Error::UnresolvedReference`].

use serde_json::Value;
use subsume_core::error::{Error, Result};

/// Resolver for JSON-pointer fragments against a root document
pub struct RefTable<'a> {
    root: &'a Value,
}

impl<'a> RefTable<'a> {
    /// Build a table over the document that owns the references
    pub fn new(root: &'a Value) -> RefTable<'a> {
        RefTable { root }
    }

    /// Resolve a `$ref` string to its target subschema.
    ///
    /// The reference itself (not the target) is the identity used for
    /// cycle detection, so callers key their in-progress maps by it.
    pub fn resolve(&self, reference: &str, location: &str) -> Result<&'a Value> {
        let Some(pointer) = reference.strip_prefix('#') else {
            return Err(Error::unresolved_reference(reference, location));
        };
        if pointer.is_empty() {
            return Ok(self.root);
        }
        if !pointer.starts_with('/') {
            return Err(Error::unresolved_reference(reference, location));
        }

        let mut current = self.root;
        for token in pointer[1..].split('/') {
            let token = unescape_token(token);
            current = match current {
                Value::Object(map) => map
                    .get(token.as_ref())
                    .ok_or_else(|| Error::unresolved_reference(reference, location))?,
                Value::Array(items) => {
                    let index: usize = token
                        .parse()
                        .map_err(|_| Error::unresolved_reference(reference, location))?;
                    items
                        .get(index)
                        .ok_or_else(|| Error::unresolved_reference(reference, location))?
                }
                _ => return Err(Error::unresolved_reference(reference, location)),
            };
        }
        Ok(current)
    }
}

/// JSON-pointer token unescaping: `~1` is `/`, `~0` is `~`
fn unescape_token(token: &str) -> std::borrow::Cow<'_, str> {
    if token.contains('~') {
        std::borrow::Cow::Owned(token.replace("~1", "/").replace("~0", "~"))
    } else {
        std::borrow::Cow::Borrowed(token)
    }
}

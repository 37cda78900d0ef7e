//! Declared key layouts per object type.
//!
//! The order of an object type's key fields decides which prefixes can be
//! queried, and it must never change while data exists. Keeping it in an
//! [`ObjectSchema`] lets every encode, decode and plan call check arity
//! instead of trusting callers to pass fields in the right shape.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use bytes::Bytes;
use common::BytesRange;
use serde::{Deserialize, Serialize};

use crate::codec::{self, MAX_SEGMENT_LEN};
use crate::error::{Error, Result};
use crate::planner;

/// The key layout of one object type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSchema {
    /// Namespace tag shared by every record of this family.
    pub object_type: String,
    /// Names of the key fields, in key order.
    pub key_fields: Vec<String>,
}

impl ObjectSchema {
    pub fn new<I, S>(object_type: impl Into<String>, key_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            object_type: object_type.into(),
            key_fields: key_fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Number of key fields.
    pub fn arity(&self) -> usize {
        self.key_fields.len()
    }

    /// Position of a key field by name.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.key_fields.iter().position(|f| f == name)
    }

    pub fn validate(&self) -> Result<()> {
        if self.object_type.is_empty() {
            return Err(Error::InvalidSchema(
                "object type must not be empty".to_string(),
            ));
        }
        if self.object_type.len() > MAX_SEGMENT_LEN {
            return Err(Error::InvalidSchema(format!(
                "object type is {} bytes, limit is {}",
                self.object_type.len(),
                MAX_SEGMENT_LEN
            )));
        }
        if self.key_fields.is_empty() {
            return Err(Error::InvalidSchema(format!(
                "{} declares no key fields",
                self.object_type
            )));
        }
        if self.key_fields.len() > MAX_SEGMENT_LEN {
            return Err(Error::InvalidSchema(format!(
                "{} declares {} key fields, limit is {}",
                self.object_type,
                self.key_fields.len(),
                MAX_SEGMENT_LEN
            )));
        }
        for (i, name) in self.key_fields.iter().enumerate() {
            if self.key_fields[..i].contains(name) {
                return Err(Error::InvalidSchema(format!(
                    "{} declares key field '{}' twice",
                    self.object_type, name
                )));
            }
        }
        Ok(())
    }

    /// Fails unless `actual` equals the declared arity.
    pub fn check_arity(&self, actual: usize) -> Result<()> {
        if actual != self.arity() {
            return Err(Error::ArityMismatch {
                object_type: self.object_type.clone(),
                expected: self.arity(),
                actual,
            });
        }
        Ok(())
    }

    /// Encodes the physical key of a full tuple.
    pub fn encode_key<S: AsRef<str>>(&self, fields: &[S]) -> Result<Bytes> {
        self.check_arity(fields.len())?;
        codec::encode_key(&self.object_type, fields)
    }

    /// Plans the scan range for the first `prefix.len()` key fields.
    pub fn prefix_range<S: AsRef<str>>(&self, prefix: &[S]) -> Result<BytesRange> {
        planner::plan_prefix_range(&self.object_type, self.arity(), prefix)
    }

    /// Decodes a physical key, checking it belongs to this object type.
    pub fn decode_key(&self, key: &[u8]) -> Result<Vec<String>> {
        let decoded = codec::decode_key(key)?;
        if decoded.object_type != self.object_type {
            return Err(Error::Internal(format!(
                "key of object type {} found while reading {}",
                decoded.object_type, self.object_type
            )));
        }
        if decoded.fields.len() != self.arity() {
            return Err(Error::Internal(format!(
                "key with {} fields found for {}, which declares {}",
                decoded.fields.len(),
                self.object_type,
                self.arity()
            )));
        }
        Ok(decoded.fields)
    }

    /// Orders named field values into key order.
    ///
    /// Every declared key field must be named exactly once; unknown names
    /// are rejected.
    pub fn key_from_named(&self, named: &[(&str, &str)]) -> Result<Vec<String>> {
        let mut fields: Vec<Option<String>> = vec![None; self.arity()];
        for (name, value) in named {
            let index = self.field_index(name).ok_or_else(|| {
                Error::InvalidInput(format!(
                    "{} has no key field '{}'",
                    self.object_type, name
                ))
            })?;
            if fields[index].replace((*value).to_string()).is_some() {
                return Err(Error::InvalidInput(format!(
                    "key field '{}' given twice",
                    name
                )));
            }
        }
        fields
            .into_iter()
            .zip(&self.key_fields)
            .map(|(value, name)| {
                value.ok_or_else(|| {
                    Error::InvalidInput(format!("missing key field '{}'", name))
                })
            })
            .collect()
    }
}

/// All object schemas known to a store, keyed by object type.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Arc<ObjectSchema>>,
}

impl SchemaRegistry {
    /// Builds a registry, validating every schema.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidSchema`] for a malformed schema or an object type
    /// declared twice.
    pub fn new(schemas: impl IntoIterator<Item = ObjectSchema>) -> Result<Self> {
        let mut registry = Self::default();
        for schema in schemas {
            registry.register(schema)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, schema: ObjectSchema) -> Result<()> {
        schema.validate()?;
        match self.schemas.entry(schema.object_type.clone()) {
            Entry::Occupied(_) => Err(Error::InvalidSchema(format!(
                "object type {} registered twice",
                schema.object_type
            ))),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(schema));
                Ok(())
            }
        }
    }

    /// Looks up the schema for an object type.
    pub fn get(&self, object_type: &str) -> Result<&Arc<ObjectSchema>> {
        self.schemas
            .get(object_type)
            .ok_or_else(|| Error::UnknownObjectType(object_type.to_string()))
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObjectSchema> {
        self.schemas.values().map(|schema| &**schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marble() -> ObjectSchema {
        ObjectSchema::new("Marble", ["color", "name"])
    }

    #[test]
    fn should_register_and_look_up_schema() {
        // given
        let registry = SchemaRegistry::new([marble()]).unwrap();

        // when
        let schema = registry.get("Marble").unwrap();

        // then
        assert_eq!(schema.arity(), 2);
        assert_eq!(schema.field_index("name"), Some(1));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn should_reject_unknown_object_type() {
        let registry = SchemaRegistry::new([marble()]).unwrap();
        assert_eq!(
            registry.get("Car").unwrap_err(),
            Error::UnknownObjectType("Car".to_string())
        );
    }

    #[test]
    fn should_reject_duplicate_object_type() {
        let result = SchemaRegistry::new([marble(), ObjectSchema::new("Marble", ["id"])]);
        assert!(matches!(result, Err(Error::InvalidSchema(msg)) if msg.contains("twice")));
    }

    #[test]
    fn should_reject_schema_without_key_fields() {
        let schema = ObjectSchema::new("Marble", Vec::<String>::new());
        assert!(matches!(schema.validate(), Err(Error::InvalidSchema(_))));
    }

    #[test]
    fn should_reject_duplicate_key_field_names() {
        let schema = ObjectSchema::new("Marble", ["color", "color"]);
        assert!(matches!(schema.validate(), Err(Error::InvalidSchema(_))));
    }

    #[test]
    fn should_reject_empty_object_type() {
        let schema = ObjectSchema::new("", ["id"]);
        assert!(matches!(schema.validate(), Err(Error::InvalidSchema(_))));
    }

    #[test]
    fn should_check_arity_before_encoding() {
        assert_eq!(
            marble().encode_key(&["blue"]),
            Err(Error::ArityMismatch {
                object_type: "Marble".to_string(),
                expected: 2,
                actual: 1,
            })
        );
    }

    #[test]
    fn should_decode_own_keys_only() {
        // given
        let schema = marble();
        let own = schema.encode_key(&["blue", "rose"]).unwrap();
        let foreign = codec::encode_key("Car", &["blue", "rose"]).unwrap();

        // then
        assert_eq!(schema.decode_key(&own).unwrap(), vec!["blue", "rose"]);
        assert!(matches!(schema.decode_key(&foreign), Err(Error::Internal(_))));
    }

    #[test]
    fn should_order_named_fields_into_key_order() {
        // when
        let fields = marble()
            .key_from_named(&[("name", "rose"), ("color", "blue")])
            .unwrap();

        // then
        assert_eq!(fields, vec!["blue", "rose"]);
    }

    #[test]
    fn should_reject_missing_or_unknown_named_fields() {
        let schema = marble();
        assert!(schema.key_from_named(&[("color", "blue")]).is_err());
        assert!(
            schema
                .key_from_named(&[("color", "blue"), ("name", "rose"), ("size", "35")])
                .is_err()
        );
        assert!(
            schema
                .key_from_named(&[("color", "blue"), ("color", "red")])
                .is_err()
        );
    }

    #[test]
    fn should_plan_range_with_declared_arity() {
        // given
        let schema = marble();

        // when
        let range = schema.prefix_range(&["blue"]).unwrap();

        // then
        assert!(range.contains(&schema.encode_key(&["blue", "rose"]).unwrap()));
        assert!(!range.contains(&schema.encode_key(&["red", "rose"]).unwrap()));
    }
}

//! Resource materializer
//!
//! Turns decoded JSON into [`Resource`]s:
//!
//! - an object with a `"data"` key is a collection; each element of the list
//!   becomes a record, sharing the caller's parent context
//! - any other object is a record; nested objects carrying `"type"` or
//!   `"data"` are materialized recursively with the current object as their
//!   parent, everything else is copied verbatim
//! - a record inside a typed parent gets a back-relation to it
//! - the kind comes from the record's own `"type"`, else from the parent's

use super::model::{BackRelation, Collection, Field, Materialized, Resource};
use super::registry::{ResourceKind, TypeRegistry};
use crate::api::error::{Error, Result, SchemaError};
use serde_json::{Map, Value};

type Object = Map<String, Value>;

#[derive(Debug, Clone, Default)]
pub struct Materializer {
    registry: TypeRegistry,
}

impl Materializer {
    pub fn new(registry: TypeRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Materialize a decoded response. `parent` is the JSON object the value
    /// was reached through, if any.
    pub fn materialize(&self, json: &Value, parent: Option<&Object>) -> Result<Materialized> {
        let Value::Object(object) = json else {
            return Err(Error::InvalidResponse(format!(
                "expected a JSON object, got {}",
                json_kind(json)
            )));
        };

        if object.contains_key("data") {
            Ok(Materialized::Many(self.collection(object, parent)?))
        } else {
            Ok(Materialized::One(self.record(object, parent)?))
        }
    }

    fn collection(&self, envelope: &Object, parent: Option<&Object>) -> Result<Collection> {
        let Some(Value::Array(elements)) = envelope.get("data") else {
            return Err(Error::InvalidResponse(
                "\"data\" is not a list".to_string(),
            ));
        };

        let items = elements
            .iter()
            .map(|element| match element {
                Value::Object(object) => self.record(object, parent),
                other => Err(Error::InvalidResponse(format!(
                    "\"data\" element is {}, expected an object",
                    json_kind(other)
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Collection::new(items, envelope.clone()))
    }

    fn record(&self, object: &Object, parent: Option<&Object>) -> Result<Resource> {
        let mut fields = Vec::with_capacity(object.len());
        for (key, value) in object {
            let field = match value {
                Value::Object(nested) if nested.contains_key("data") => {
                    Field::Collection(self.collection(nested, Some(object))?)
                }
                Value::Object(nested) if nested.contains_key("type") => {
                    Field::Resource(Box::new(self.record(nested, Some(object))?))
                }
                other => Field::Value(other.clone()),
            };
            fields.push((key.clone(), field));
        }

        let back_relation = parent.and_then(|p| {
            p.get("type")
                .and_then(Value::as_str)
                .map(|tag| BackRelation::new(tag, p.clone()))
        });

        let kind = self.resolve_kind(object, parent)?;
        Ok(Resource::new(kind, fields, back_relation))
    }

    fn resolve_kind(&self, object: &Object, parent: Option<&Object>) -> Result<ResourceKind> {
        let tag = object
            .get("type")
            .or_else(|| parent.and_then(|p| p.get("type")))
            .map(tag_string);

        let Some(tag) = tag else {
            tracing::error!("Response record has no type tag and no typed parent");
            return Err(SchemaError::MissingType.into());
        };

        self.registry.get(&tag).ok_or_else(|| {
            tracing::error!("Response type tag '{}' is not registered", tag);
            SchemaError::UnregisteredType(tag).into()
        })
    }
}

fn tag_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn materializer() -> Materializer {
        Materializer::new(TypeRegistry::default())
    }

    fn one(json: Value) -> Resource {
        match materializer().materialize(&json, None).unwrap() {
            Materialized::One(r) => r,
            Materialized::Many(_) => panic!("expected a single resource"),
        }
    }

    #[test]
    fn test_flat_record() {
        let json = json!({"id": 1, "type": "genre", "name": "Techno", "slug": "techno"});
        let genre = one(json.clone());
        assert_eq!(genre.kind(), ResourceKind::Genre);
        assert_eq!(genre.len(), 4);
        assert_eq!(genre.to_value(), json);
        assert!(genre.back_relation().is_none());
    }

    #[test]
    fn test_nested_typed_object_becomes_resource() {
        let json = json!({
            "id": 7,
            "type": "release",
            "name": "Homework",
            "label": {"id": 3, "type": "label", "name": "Virgin"}
        });
        let release = one(json.clone());

        let label = release.get("label").and_then(Field::as_resource).unwrap();
        assert_eq!(label.kind(), ResourceKind::Label);

        let back = label.back_relation().unwrap();
        assert_eq!(back.tag(), "release");
        assert_eq!(back.record().get("name"), Some(&json!("Homework")));

        // back-relation stays out of the field set
        assert!(!label.contains_key("release"));
        assert_eq!(release.to_value(), json);
    }

    #[test]
    fn test_untyped_nested_objects_are_copied() {
        let json = json!({
            "type": "track",
            "images": {"large": {"url": "https://example.com/a.jpg"}},
            "artists": [{"type": "artist", "name": "Daft Punk"}]
        });
        let track = one(json.clone());
        assert!(matches!(track.get("images"), Some(Field::Value(_))));
        // lists are copied verbatim, even when their elements are typed
        assert!(matches!(track.get("artists"), Some(Field::Value(_))));
        assert_eq!(track.to_value(), json);
    }

    #[test]
    fn test_top_level_collection() {
        let json = json!({
            "count": 2,
            "data": [
                {"id": 1, "type": "track", "title": "One"},
                {"id": 2, "type": "track", "title": "Two"}
            ]
        });
        let Materialized::Many(collection) = materializer().materialize(&json, None).unwrap()
        else {
            panic!("expected a collection");
        };
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.items()[1].name(), Some("Two"));
        assert_eq!(collection.meta("count"), Some(&json!(2)));
        assert_eq!(collection.to_value(), json);
    }

    #[test]
    fn test_untyped_elements_take_parent_type() {
        let json = json!({
            "id": 9,
            "type": "artist",
            "name": "Daft Punk",
            "releases": {"data": [{"id": 1, "name": "Homework"}, {"id": 2, "name": "Discovery"}]}
        });
        let artist = one(json.clone());

        let releases = artist.get("releases").and_then(Field::as_collection).unwrap();
        assert_eq!(releases.len(), 2);
        for release in releases {
            // falls back to the parent's tag
            assert_eq!(release.kind(), ResourceKind::Artist);
            assert_eq!(release.back_relation().unwrap().tag(), "artist");
        }
        assert_eq!(artist.to_value(), json);
    }

    #[test]
    fn test_collection_elements_share_caller_parent() {
        let mut parent = Map::new();
        parent.insert("id".to_string(), json!(9));
        parent.insert("type".to_string(), json!("artist"));

        let json = json!({"data": [{"id": 1, "type": "release"}]});
        let items = materializer()
            .materialize(&json, Some(&parent))
            .unwrap()
            .into_resources();

        assert_eq!(items[0].kind(), ResourceKind::Release);
        assert_eq!(items[0].back_relation().unwrap().record(), &parent);
    }

    #[test]
    fn test_unregistered_type_is_schema_error() {
        let err = materializer()
            .materialize(&json!({"type": "podcast"}), None)
            .unwrap_err();
        assert!(matches!(err, Error::Schema(SchemaError::UnregisteredType(ref t)) if t == "podcast"));
    }

    #[test]
    fn test_missing_type_is_schema_error() {
        let err = materializer()
            .materialize(&json!({"id": 1}), None)
            .unwrap_err();
        assert!(matches!(err, Error::Schema(SchemaError::MissingType)));
    }

    #[test]
    fn test_nested_unregistered_type_fails_whole_record() {
        let json = json!({"type": "track", "owner": {"type": "podcast"}});
        assert!(materializer().materialize(&json, None).is_err());
    }

    #[test]
    fn test_malformed_data() {
        let m = materializer();
        assert!(matches!(
            m.materialize(&json!({"data": {"id": 1}}), None),
            Err(Error::InvalidResponse(_))
        ));
        assert!(matches!(
            m.materialize(&json!({"data": [1, 2]}), None),
            Err(Error::InvalidResponse(_))
        ));
        assert!(matches!(
            m.materialize(&json!([{"type": "track"}]), None),
            Err(Error::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_custom_registry() {
        let registry = TypeRegistry::new().with("musical_key", ResourceKind::MusicalKey);
        let m = Materializer::new(registry);
        let key = m
            .materialize(&json!({"type": "musical_key", "name": "A min"}), None)
            .unwrap()
            .into_single()
            .unwrap();
        assert_eq!(key.kind(), ResourceKind::MusicalKey);
        assert!(m.materialize(&json!({"type": "track"}), None).is_err());
    }
}

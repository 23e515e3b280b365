//! Catalog resources
//!
//! A [`Resource`] is an immutable record built from one JSON object. Field
//! order and field names are kept exactly as received; nested typed objects
//! become nested resources and `"data"` envelopes become [`Collection`]s.
//! [`Resource::to_value`] gives back the original JSON.

use super::registry::ResourceKind;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// One field of a resource
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// Copied verbatim from the response
    Value(Value),
    /// Nested object carrying a `"type"` tag
    Resource(Box<Resource>),
    /// Nested object carrying a `"data"` list
    Collection(Collection),
}

impl Field {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Field::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_resource(&self) -> Option<&Resource> {
        match self {
            Field::Resource(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&Collection> {
        match self {
            Field::Collection(c) => Some(c),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Field::Value(v) => v.clone(),
            Field::Resource(r) => r.to_value(),
            Field::Collection(c) => c.to_value(),
        }
    }
}

/// Ordered resources taken from a `"data"` envelope.
///
/// The envelope's other keys (counts, paging info) are kept as metadata.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Collection {
    items: Vec<Resource>,
    // Full envelope in received order; "data" holds a placeholder
    envelope: Map<String, Value>,
}

impl Collection {
    pub(crate) fn new(items: Vec<Resource>, mut envelope: Map<String, Value>) -> Self {
        envelope.insert("data".to_string(), Value::Null);
        Self { items, envelope }
    }

    pub fn items(&self) -> &[Resource] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Resource> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Resource> {
        self.items.iter()
    }

    /// Envelope entry other than `"data"`
    pub fn meta(&self, key: &str) -> Option<&Value> {
        if key == "data" {
            return None;
        }
        self.envelope.get(key)
    }

    pub fn to_value(&self) -> Value {
        let mut envelope = self.envelope.clone();
        envelope.insert(
            "data".to_string(),
            Value::Array(self.items.iter().map(Resource::to_value).collect()),
        );
        Value::Object(envelope)
    }
}

impl IntoIterator for Collection {
    type Item = Resource;
    type IntoIter = std::vec::IntoIter<Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Resource;
    type IntoIter = std::slice::Iter<'a, Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Structural parent of a nested resource, keyed by the parent's type tag.
///
/// Kept outside the field set so the round-trip stays exact.
#[derive(Debug, Clone, PartialEq)]
pub struct BackRelation {
    tag: String,
    record: Map<String, Value>,
}

impl BackRelation {
    pub(crate) fn new(tag: &str, record: Map<String, Value>) -> Self {
        Self {
            tag: tag.to_string(),
            record,
        }
    }

    /// The parent's type tag, e.g. `"release"` for a track nested in a release
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The parent's raw JSON object
    pub fn record(&self) -> &Map<String, Value> {
        &self.record
    }
}

/// A typed catalog record
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    kind: ResourceKind,
    fields: Vec<(String, Field)>,
    back_relation: Option<BackRelation>,
}

impl Resource {
    pub(crate) fn new(
        kind: ResourceKind,
        fields: Vec<(String, Field)>,
        back_relation: Option<BackRelation>,
    ) -> Self {
        Self {
            kind,
            fields,
            back_relation,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn get(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, f)| f)
    }

    /// Plain JSON value of a verbatim field
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.get(key).and_then(Field::as_value)
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.value(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Field names in response order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(k, f)| (k.as_str(), f))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The `"type"` tag of the record, or the kind's tag when the record was
    /// typed through its parent
    pub fn type_tag(&self) -> &str {
        self.str_field("type").unwrap_or_else(|| self.kind.tag())
    }

    /// The `"id"` field as a string; numeric ids are stringified
    pub fn id(&self) -> Option<String> {
        match self.value("id")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// `"name"`, falling back to `"title"`
    pub fn name(&self) -> Option<&str> {
        self.str_field("name").or_else(|| self.str_field("title"))
    }

    pub fn back_relation(&self) -> Option<&BackRelation> {
        self.back_relation.as_ref()
    }

    /// The collection field belonging to this resource's own kind
    pub fn primary_collection(&self) -> Option<&Field> {
        self.get(self.kind.collection_field())
    }

    pub fn artists(&self) -> Option<&Field> {
        self.get(ResourceKind::Artist.collection_field())
    }

    pub fn charts(&self) -> Option<&Field> {
        self.get(ResourceKind::Chart.collection_field())
    }

    pub fn genres(&self) -> Option<&Field> {
        self.get(ResourceKind::Genre.collection_field())
    }

    pub fn labels(&self) -> Option<&Field> {
        self.get(ResourceKind::Label.collection_field())
    }

    pub fn musical_keys(&self) -> Option<&Field> {
        self.get(ResourceKind::MusicalKey.collection_field())
    }

    pub fn releases(&self) -> Option<&Field> {
        self.get(ResourceKind::Release.collection_field())
    }

    pub fn tracks(&self) -> Option<&Field> {
        self.get(ResourceKind::Track.collection_field())
    }

    /// Flatten back to a JSON object map
    pub fn to_map(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|(k, f)| (k.clone(), f.to_value()))
            .collect()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.to_map())
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "<{}: {}>", self.kind, name),
            None => write!(f, "<{}>", self.kind),
        }
    }
}

impl Serialize for Resource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl Serialize for Collection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// Result of materializing one response
#[derive(Debug, Clone, PartialEq)]
pub enum Materialized {
    One(Resource),
    Many(Collection),
}

impl Materialized {
    /// All resources, in order
    pub fn into_resources(self) -> Vec<Resource> {
        match self {
            Materialized::One(r) => vec![r],
            Materialized::Many(c) => c.into_items(),
        }
    }

    /// The single resource, also accepting a one-element collection
    pub fn into_single(self) -> Option<Resource> {
        match self {
            Materialized::One(r) => Some(r),
            Materialized::Many(c) if c.len() == 1 => c.into_items().pop(),
            Materialized::Many(_) => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Materialized::One(r) => r.to_value(),
            Materialized::Many(c) => c.to_value(),
        }
    }
}

impl Serialize for Materialized {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn track() -> Resource {
        Resource::new(
            ResourceKind::Track,
            vec![
                ("id".to_string(), Field::Value(json!(12857425))),
                ("type".to_string(), Field::Value(json!("track"))),
                ("title".to_string(), Field::Value(json!("Around the World"))),
                ("artists".to_string(), Field::Value(json!([{"name": "Daft Punk"}]))),
            ],
            None,
        )
    }

    #[test]
    fn test_accessors() {
        let t = track();
        assert_eq!(t.id().as_deref(), Some("12857425"));
        assert_eq!(t.type_tag(), "track");
        assert_eq!(t.name(), Some("Around the World"));
        assert!(t.artists().is_some());
        assert!(t.tracks().is_none());
        assert!(t.primary_collection().is_none());
        assert_eq!(t.keys().collect::<Vec<_>>(), vec!["id", "type", "title", "artists"]);
    }

    #[test]
    fn test_display() {
        assert_eq!(track().to_string(), "<Track: Around the World>");
        let bare = Resource::new(ResourceKind::Genre, vec![], None);
        assert_eq!(bare.to_string(), "<Genre>");
    }

    #[test]
    fn test_type_tag_falls_back_to_kind() {
        let untyped = Resource::new(
            ResourceKind::Release,
            vec![("id".to_string(), Field::Value(json!("42")))],
            None,
        );
        assert_eq!(untyped.type_tag(), "release");
        assert_eq!(untyped.id().as_deref(), Some("42"));
    }

    #[test]
    fn test_collection_round_trip_keeps_envelope() {
        let mut envelope = Map::new();
        envelope.insert("count".to_string(), json!(1));
        envelope.insert("data".to_string(), json!([]));
        envelope.insert("page".to_string(), json!("1/1"));
        let collection = Collection::new(vec![track()], envelope);

        assert_eq!(collection.meta("count"), Some(&json!(1)));
        assert_eq!(collection.meta("data"), None);

        let value = collection.to_value();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["count", "data", "page"]);
        assert_eq!(value["data"][0]["title"], "Around the World");
    }

    #[test]
    fn test_into_single() {
        assert!(Materialized::One(track()).into_single().is_some());

        let one = Collection::new(vec![track()], Map::new());
        assert!(Materialized::Many(one).into_single().is_some());

        let two = Collection::new(vec![track(), track()], Map::new());
        assert!(Materialized::Many(two.clone()).into_single().is_none());
        assert_eq!(Materialized::Many(two).into_resources().len(), 2);
    }

    #[test]
    fn test_serialize_as_original_json() {
        let out = serde_json::to_value(track()).unwrap();
        assert_eq!(
            out,
            json!({
                "id": 12857425,
                "type": "track",
                "title": "Around the World",
                "artists": [{"name": "Daft Punk"}]
            })
        );
    }
}

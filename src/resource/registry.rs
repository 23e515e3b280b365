//! Type registry - maps API type tags to resource kinds
//!
//! The registry is built once and handed to the client at construction.
//! There is no global instance: tests and callers with a different API
//! contract build their own.

use std::collections::HashMap;
use std::fmt;

/// The catalog resource variants.
///
/// Variants only differ by the name of their primary collection field,
/// so this is a tag on [`Resource`](super::Resource) rather than seven types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Artist,
    Chart,
    Genre,
    Label,
    MusicalKey,
    Release,
    Track,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 7] = [
        ResourceKind::Artist,
        ResourceKind::Chart,
        ResourceKind::Genre,
        ResourceKind::Label,
        ResourceKind::MusicalKey,
        ResourceKind::Release,
        ResourceKind::Track,
    ];

    /// Type tag used by the API and in catalog URLs
    pub fn tag(self) -> &'static str {
        match self {
            ResourceKind::Artist => "artist",
            ResourceKind::Chart => "chart",
            ResourceKind::Genre => "genre",
            ResourceKind::Label => "label",
            ResourceKind::MusicalKey => "key",
            ResourceKind::Release => "release",
            ResourceKind::Track => "track",
        }
    }

    /// Name of the collection field exposed by the kind's accessor
    pub fn collection_field(self) -> &'static str {
        match self {
            ResourceKind::Artist => "artists",
            ResourceKind::Chart => "charts",
            ResourceKind::Genre => "genres",
            ResourceKind::Label => "labels",
            ResourceKind::MusicalKey => "musical_keys",
            ResourceKind::Release => "releases",
            ResourceKind::Track => "tracks",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Artist => "Artist",
            ResourceKind::Chart => "Chart",
            ResourceKind::Genre => "Genre",
            ResourceKind::Label => "Label",
            ResourceKind::MusicalKey => "MusicalKey",
            ResourceKind::Release => "Release",
            ResourceKind::Track => "Track",
        };
        f.write_str(name)
    }
}

/// Mapping from type tag to [`ResourceKind`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRegistry {
    kinds: HashMap<String, ResourceKind>,
}

impl TypeRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self {
            kinds: HashMap::new(),
        }
    }

    /// Register `tag`, replacing any previous mapping
    pub fn register(&mut self, tag: &str, kind: ResourceKind) -> &mut Self {
        self.kinds.insert(tag.to_string(), kind);
        self
    }

    /// Builder-style [`register`](Self::register)
    pub fn with(mut self, tag: &str, kind: ResourceKind) -> Self {
        self.register(tag, kind);
        self
    }

    pub fn get(&self, tag: &str) -> Option<ResourceKind> {
        self.kinds.get(tag).copied()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.kinds.contains_key(tag)
    }

    /// All registered tags, sorted
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.kinds.keys().map(|s| s.as_str()).collect();
        tags.sort_unstable();
        tags
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl Default for TypeRegistry {
    /// Every kind under its own tag
    fn default() -> Self {
        ResourceKind::ALL
            .iter()
            .fold(Self::new(), |registry, kind| registry.with(kind.tag(), *kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_has_every_kind() {
        let registry = TypeRegistry::default();
        assert_eq!(registry.len(), 7);
        for kind in ResourceKind::ALL {
            assert_eq!(registry.get(kind.tag()), Some(kind));
        }
    }

    #[test]
    fn test_unknown_tag() {
        let registry = TypeRegistry::default();
        assert_eq!(registry.get("podcast"), None);
        assert!(!registry.contains("bogus_type"));
    }

    #[test]
    fn test_register_alias() {
        let registry = TypeRegistry::default().with("musical_key", ResourceKind::MusicalKey);
        assert_eq!(registry.get("musical_key"), Some(ResourceKind::MusicalKey));
        assert_eq!(registry.get("key"), Some(ResourceKind::MusicalKey));
    }

    #[test]
    fn test_tags_sorted() {
        let registry = TypeRegistry::default();
        assert_eq!(
            registry.tags(),
            vec!["artist", "chart", "genre", "key", "label", "release", "track"]
        );
    }

    #[test]
    fn test_collection_fields() {
        assert_eq!(ResourceKind::Artist.collection_field(), "artists");
        assert_eq!(ResourceKind::MusicalKey.collection_field(), "musical_keys");
        assert_eq!(ResourceKind::MusicalKey.to_string(), "MusicalKey");
    }

    #[test]
    fn test_empty_registry() {
        let registry = TypeRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.tags().is_empty());
    }
}

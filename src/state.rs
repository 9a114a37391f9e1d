// src/state.rs
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identity::Party;

/// Record of an asset instance coming into existence.
///
/// Invariants:
/// - all fields are set once at construction and never mutated
/// - `participants()` is exactly `[author]`
///
/// Construction performs no validation; whether the identifiers are
/// acceptable is decided by the verification ruleset, not the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetInstanceCreated {
    asset_instance_id: String,
    asset_definition_id: String,
    author: Party,
    content_hash: String,
}

impl AssetInstanceCreated {
    pub fn new(
        asset_instance_id: impl Into<String>,
        asset_definition_id: impl Into<String>,
        author: Party,
        content_hash: impl Into<String>,
    ) -> Self {
        Self {
            asset_instance_id: asset_instance_id.into(),
            asset_definition_id: asset_definition_id.into(),
            author,
            content_hash: content_hash.into(),
        }
    }

    pub fn asset_instance_id(&self) -> &str {
        &self.asset_instance_id
    }

    pub fn asset_definition_id(&self) -> &str {
        &self.asset_definition_id
    }

    pub fn author(&self) -> &Party {
        &self.author
    }

    /// Fingerprint of the associated off-ledger content.
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// Identities entitled to see and hold this record. Authorship implies
    /// sole visibility, so this is always exactly the author.
    pub fn participants(&self) -> Vec<&Party> {
        vec![&self.author]
    }
}

impl fmt::Display for AssetInstanceCreated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AssetInstanceCreated(assetInstanceID={}, assetDefinitionID={}, author={}, contentHash={})",
            self.asset_instance_id, self.asset_definition_id, self.author, self.content_hash
        )
    }
}

/// Record of an asset definition (schema/type) coming into existence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDefinitionCreated {
    asset_definition_id: String,
    author: Party,
    definition_hash: String,
}

impl AssetDefinitionCreated {
    pub fn new(
        asset_definition_id: impl Into<String>,
        author: Party,
        definition_hash: impl Into<String>,
    ) -> Self {
        Self {
            asset_definition_id: asset_definition_id.into(),
            author,
            definition_hash: definition_hash.into(),
        }
    }

    pub fn asset_definition_id(&self) -> &str {
        &self.asset_definition_id
    }

    pub fn author(&self) -> &Party {
        &self.author
    }

    pub fn definition_hash(&self) -> &str {
        &self.definition_hash
    }

    pub fn participants(&self) -> Vec<&Party> {
        vec![&self.author]
    }
}

impl fmt::Display for AssetDefinitionCreated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AssetDefinitionCreated(assetDefinitionID={}, author={}, definitionHash={})",
            self.asset_definition_id, self.author, self.definition_hash
        )
    }
}

/// Record of a batch of instance creations pinned by one fingerprint.
///
/// The batch content itself lives off-ledger; the hash binds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetInstanceBatchCreated {
    batch_hash: String,
    author: Party,
}

impl AssetInstanceBatchCreated {
    pub fn new(batch_hash: impl Into<String>, author: Party) -> Self {
        Self {
            batch_hash: batch_hash.into(),
            author,
        }
    }

    pub fn batch_hash(&self) -> &str {
        &self.batch_hash
    }

    pub fn author(&self) -> &Party {
        &self.author
    }

    pub fn participants(&self) -> Vec<&Party> {
        vec![&self.author]
    }
}

impl fmt::Display for AssetInstanceBatchCreated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AssetInstanceBatchCreated(batchHash={}, author={})",
            self.batch_hash, self.author
        )
    }
}

/// Record of an author-scoped property assignment on an existing instance.
///
/// Unlike the creation records, property assignments may recur for the
/// same key; each assignment is its own trail entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetInstancePropertySet {
    asset_instance_id: String,
    asset_definition_id: String,
    author: Party,
    key: String,
    value: String,
}

impl AssetInstancePropertySet {
    pub fn new(
        asset_instance_id: impl Into<String>,
        asset_definition_id: impl Into<String>,
        author: Party,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            asset_instance_id: asset_instance_id.into(),
            asset_definition_id: asset_definition_id.into(),
            author,
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn asset_instance_id(&self) -> &str {
        &self.asset_instance_id
    }

    pub fn asset_definition_id(&self) -> &str {
        &self.asset_definition_id
    }

    pub fn author(&self) -> &Party {
        &self.author
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn participants(&self) -> Vec<&Party> {
        vec![&self.author]
    }
}

impl fmt::Display for AssetInstancePropertySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AssetInstancePropertySet(assetInstanceID={}, assetDefinitionID={}, author={}, key={}, value={})",
            self.asset_instance_id, self.asset_definition_id, self.author, self.key, self.value
        )
    }
}

/// Variant tag of an asset event, used for ruleset lookup and storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    DefinitionCreated,
    InstanceCreated,
    InstanceBatchCreated,
    InstancePropertySet,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DefinitionCreated => "asset_definition_created",
            Self::InstanceCreated => "asset_instance_created",
            Self::InstanceBatchCreated => "asset_instance_batch_created",
            Self::InstancePropertySet => "asset_instance_property_set",
        }
    }

    /// Whether events of this kind are unique by their natural identifier.
    /// Creations are; property assignments recur.
    pub fn is_unique(&self) -> bool {
        !matches!(self, Self::InstancePropertySet)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The closed set of asset event states.
///
/// Every variant is an immutable value exposing the same capability set:
/// an author and a participant list that is exactly `[author]`. Consumers
/// match on the variant rather than downcasting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetEvent {
    DefinitionCreated(AssetDefinitionCreated),
    InstanceCreated(AssetInstanceCreated),
    InstanceBatchCreated(AssetInstanceBatchCreated),
    InstancePropertySet(AssetInstancePropertySet),
}

impl AssetEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::DefinitionCreated(_) => EventKind::DefinitionCreated,
            Self::InstanceCreated(_) => EventKind::InstanceCreated,
            Self::InstanceBatchCreated(_) => EventKind::InstanceBatchCreated,
            Self::InstancePropertySet(_) => EventKind::InstancePropertySet,
        }
    }

    pub fn author(&self) -> &Party {
        match self {
            Self::DefinitionCreated(e) => e.author(),
            Self::InstanceCreated(e) => e.author(),
            Self::InstanceBatchCreated(e) => e.author(),
            Self::InstancePropertySet(e) => e.author(),
        }
    }

    pub fn participants(&self) -> Vec<&Party> {
        match self {
            Self::DefinitionCreated(e) => e.participants(),
            Self::InstanceCreated(e) => e.participants(),
            Self::InstanceBatchCreated(e) => e.participants(),
            Self::InstancePropertySet(e) => e.participants(),
        }
    }

    /// Natural identifier of the fact this event records. Duplicate
    /// detection for unique kinds keys on this value.
    pub fn natural_id(&self) -> String {
        match self {
            Self::DefinitionCreated(e) => e.asset_definition_id().to_string(),
            Self::InstanceCreated(e) => e.asset_instance_id().to_string(),
            Self::InstanceBatchCreated(e) => e.batch_hash().to_string(),
            Self::InstancePropertySet(e) => {
                format!("{}/{}", e.asset_instance_id(), e.key())
            }
        }
    }

    /// The stream whose per-author order this event participates in.
    pub fn topic(&self) -> &str {
        match self {
            Self::DefinitionCreated(e) => e.asset_definition_id(),
            Self::InstanceCreated(e) => e.asset_definition_id(),
            Self::InstanceBatchCreated(e) => e.batch_hash(),
            Self::InstancePropertySet(e) => e.asset_instance_id(),
        }
    }
}

impl fmt::Display for AssetEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DefinitionCreated(e) => e.fmt(f),
            Self::InstanceCreated(e) => e.fmt(f),
            Self::InstanceBatchCreated(e) => e.fmt(f),
            Self::InstancePropertySet(e) => e.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_created_round_trip() {
        let event = AssetInstanceCreated::new(
            "AI-1",
            "AD-9",
            Party::new("Alice"),
            "sha256:abcd",
        );

        assert_eq!(event.asset_instance_id(), "AI-1");
        assert_eq!(event.asset_definition_id(), "AD-9");
        assert_eq!(event.author(), &Party::new("Alice"));
        assert_eq!(event.content_hash(), "sha256:abcd");
    }

    #[test]
    fn test_participants_is_exactly_author() {
        let author = Party::new("Alice");
        let event = AssetInstanceCreated::new("AI-1", "AD-9", author.clone(), "sha256:abcd");

        assert_eq!(event.participants(), vec![&author]);

        let definition = AssetDefinitionCreated::new("AD-9", author.clone(), "blake3:1111");
        assert_eq!(definition.participants(), vec![&author]);

        let batch = AssetInstanceBatchCreated::new("blake3:2222", author.clone());
        assert_eq!(batch.participants(), vec![&author]);

        let property =
            AssetInstancePropertySet::new("AI-1", "AD-9", author.clone(), "color", "red");
        assert_eq!(property.participants(), vec![&author]);
    }

    #[test]
    fn test_instance_created_rendering() {
        let event = AssetInstanceCreated::new(
            "AI-1",
            "AD-9",
            Party::new("Alice"),
            "sha256:abcd",
        );

        assert_eq!(
            event.to_string(),
            "AssetInstanceCreated(assetInstanceID=AI-1, assetDefinitionID=AD-9, author=Alice, contentHash=sha256:abcd)"
        );
    }

    #[test]
    fn test_rendering_is_a_function_of_fields() {
        let a = AssetInstanceCreated::new("AI-1", "AD-9", Party::new("Alice"), "sha256:abcd");
        let b = AssetInstanceCreated::new("AI-1", "AD-9", Party::new("Alice"), "sha256:abcd");
        assert_eq!(a.to_string(), b.to_string());

        let other_instance =
            AssetInstanceCreated::new("AI-2", "AD-9", Party::new("Alice"), "sha256:abcd");
        let other_definition =
            AssetInstanceCreated::new("AI-1", "AD-8", Party::new("Alice"), "sha256:abcd");
        let other_author =
            AssetInstanceCreated::new("AI-1", "AD-9", Party::new("Bob"), "sha256:abcd");
        let other_hash =
            AssetInstanceCreated::new("AI-1", "AD-9", Party::new("Alice"), "sha256:ffff");

        for other in [other_instance, other_definition, other_author, other_hash] {
            assert_ne!(a.to_string(), other.to_string());
        }
    }

    #[test]
    fn test_event_accessors_delegate() {
        let author = Party::new("Alice");
        let event = AssetEvent::InstanceCreated(AssetInstanceCreated::new(
            "AI-1",
            "AD-9",
            author.clone(),
            "sha256:abcd",
        ));

        assert_eq!(event.kind(), EventKind::InstanceCreated);
        assert_eq!(event.author(), &author);
        assert_eq!(event.participants(), vec![&author]);
        assert_eq!(event.natural_id(), "AI-1");
        assert_eq!(event.topic(), "AD-9");
        assert_eq!(
            event.to_string(),
            "AssetInstanceCreated(assetInstanceID=AI-1, assetDefinitionID=AD-9, author=Alice, contentHash=sha256:abcd)"
        );
    }

    #[test]
    fn test_natural_ids() {
        let author = Party::new("Alice");

        let definition =
            AssetEvent::DefinitionCreated(AssetDefinitionCreated::new("AD-9", author.clone(), "h"));
        assert_eq!(definition.natural_id(), "AD-9");
        assert!(definition.kind().is_unique());

        let batch = AssetEvent::InstanceBatchCreated(AssetInstanceBatchCreated::new(
            "blake3:2222",
            author.clone(),
        ));
        assert_eq!(batch.natural_id(), "blake3:2222");
        assert!(batch.kind().is_unique());

        let property = AssetEvent::InstancePropertySet(AssetInstancePropertySet::new(
            "AI-1", "AD-9", author, "color", "red",
        ));
        assert_eq!(property.natural_id(), "AI-1/color");
        assert!(!property.kind().is_unique());
    }
}

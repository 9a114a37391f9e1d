// src/lib.rs
pub mod adapters;
pub mod contract;
pub mod error;
pub mod identity;
pub mod ordering;
pub mod state;
pub mod transaction;

pub use contract::{Command, LedgerTransaction};
pub use error::TrailError;
pub use identity::Party;
pub use ordering::OrderingContext;
pub use state::{
    AssetDefinitionCreated, AssetEvent, AssetInstanceBatchCreated, AssetInstanceCreated,
    AssetInstancePropertySet, EventKind,
};
pub use transaction::{RecordedEvent, TransactionRecord};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use std::sync::Arc;
use uuid::Uuid;

/// Fingerprint off-ledger content for use as an event's content hash.
pub fn content_fingerprint(content: &[u8]) -> String {
    format!("blake3:{}", blake3::hash(content).to_hex())
}

/// Internal trail storage trait
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Append a verified record. Implementors MUST:
    /// 1. Reject natural-id duplicates for unique event kinds — DuplicateEvent
    /// 2. Reject ordering assignments with per-stream nonce gaps — NonceGap
    /// 3. Persist the record and all of its events together or not at all
    async fn record(&self, record: &TransactionRecord) -> Result<(), TrailError>;

    // READ OPERATIONS
    async fn get_event(&self, event_id: &str) -> Result<RecordedEvent, TrailError>;
    async fn get_record(&self, record_id: Uuid) -> Result<TransactionRecord, TrailError>;
    async fn events_for_author(&self, author: &Party) -> Result<Vec<RecordedEvent>, TrailError>;
    async fn events_for_participant(
        &self,
        party: &Party,
    ) -> Result<Vec<RecordedEvent>, TrailError>;
    async fn events_between(
        &self,
        timespan: &[DateTime<Utc>; 2],
    ) -> Result<Vec<RecordedEvent>, TrailError>;

    /// Assign the next position in the (topic, author) stream. First call
    /// on a fresh stream returns 0; every later call returns the previous
    /// value plus one.
    async fn next_nonce(&self, topic: &str, author: &Party) -> Result<u64, TrailError>;
}

/// Initialize the trail system with a store
pub struct TrailSystem {
    store: Arc<dyn EventStore>,
}

impl TrailSystem {
    pub fn new(store: Box<dyn EventStore>) -> Self {
        Self {
            store: store.into(),
        }
    }

    /// Get store reference
    pub fn store(&self) -> &dyn EventStore {
        self.store.as_ref()
    }

    /// Get store Arc (for sharing with collaborators)
    pub fn store_arc(&self) -> Arc<dyn EventStore> {
        Arc::clone(&self.store)
    }

    /// Verify a proposal, freeze it into a record, assign stream
    /// positions, and append it to the store.
    pub async fn record(&self, proposal: LedgerTransaction) -> Result<TransactionRecord, TrailError> {
        contract::verify(&proposal)?;

        let mut ordering = Vec::with_capacity(proposal.outputs().len());
        for event in proposal.outputs() {
            let nonce = self.store.next_nonce(event.topic(), event.author()).await?;
            ordering.push(OrderingContext::with_nonce(
                event.topic(),
                event.author().clone(),
                nonce,
            ));
        }

        for event in proposal.outputs() {
            counter!("trail.events.total", "kind" => event.kind().as_str()).increment(1);
        }

        let record = TransactionRecord::new(proposal.into_outputs(), ordering);
        histogram!("trail.record.events").record(record.events().len() as f64);

        let result = self.store.record(&record).await;

        counter!("trail.records.total",
            "status" => if result.is_ok() { "success" } else { "failed" }
        )
        .increment(1);

        result.map(|_| record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_fingerprint_is_deterministic() {
        let a = content_fingerprint(b"asset content");
        let b = content_fingerprint(b"asset content");
        assert_eq!(a, b);
        assert!(a.starts_with("blake3:"));

        assert_ne!(a, content_fingerprint(b"other content"));
    }
}

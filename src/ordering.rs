// src/ordering.rs
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identity::Party;

/// Per-(topic, author) position in an event stream.
///
/// The nonce is the only state in this crate with a transition, and the
/// transition is one-way: a context is never rewound, only advanced by
/// exactly one. Fresh streams start at nonce 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderingContext {
    topic: String,
    author: Party,
    nonce: u64,
}

impl OrderingContext {
    /// Start of a stream: nonce 0.
    pub fn new(topic: impl Into<String>, author: Party) -> Self {
        Self {
            topic: topic.into(),
            author,
            nonce: 0,
        }
    }

    /// A context at a store-assigned position.
    pub fn with_nonce(topic: impl Into<String>, author: Party, nonce: u64) -> Self {
        Self {
            topic: topic.into(),
            author,
            nonce,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn author(&self) -> &Party {
        &self.author
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// The successor context: same stream, nonce + 1.
    pub fn advanced(&self) -> Self {
        Self {
            topic: self.topic.clone(),
            author: self.author.clone(),
            nonce: self.nonce + 1,
        }
    }

    /// Whether `self` is the direct successor of `prev` in the same stream.
    pub fn follows(&self, prev: &OrderingContext) -> bool {
        self.topic == prev.topic && self.author == prev.author && self.nonce == prev.nonce + 1
    }
}

impl fmt::Display for OrderingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OrderingContext(topic={}, author={}, nonce={})",
            self.topic, self.author, self.nonce
        )
    }
}

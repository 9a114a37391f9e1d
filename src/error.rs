// src/error.rs
use std::fmt;

use uuid::Uuid;

use crate::state::EventKind;

#[derive(Debug)]
pub enum TrailError {
    UnexpectedInputs(usize),
    MissingOutput,
    MultipleOutputs(usize),
    CommandMismatch { expected: EventKind, found: EventKind },
    MissingAuthorSignature(String),
    EmptyPropertyKey,
    DuplicateEvent(String),
    EventNotFound(String),
    RecordNotFound(Uuid),
    NonceGap { topic: String, expected: u64, found: u64 },
    Storage(String),
}

impl fmt::Display for TrailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedInputs(n) => {
                write!(f, "Creation consumes no inputs, got {}", n)
            }
            Self::MissingOutput => write!(f, "Transaction produced no output state"),
            Self::MultipleOutputs(n) => {
                write!(f, "Expected exactly one output state, got {}", n)
            }
            Self::CommandMismatch { expected, found } => {
                write!(f, "Command expects {} output, got {}", expected, found)
            }
            Self::MissingAuthorSignature(party) => {
                write!(f, "Author {} is not a signer", party)
            }
            Self::EmptyPropertyKey => write!(f, "Property key must not be empty"),
            Self::DuplicateEvent(id) => write!(f, "Duplicate event: {}", id),
            Self::EventNotFound(id) => write!(f, "Event not found: {}", id),
            Self::RecordNotFound(id) => write!(f, "Record not found: {}", id),
            Self::NonceGap {
                topic,
                expected,
                found,
            } => {
                write!(
                    f,
                    "Nonce gap on topic {}: expected {}, found {}",
                    topic, expected, found
                )
            }
            Self::Storage(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for TrailError {}

// src/identity.rs
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque handle for a network identity.
///
/// Parties are issued by the hosting platform's identity registry; this
/// crate only carries them by name and never constructs or validates the
/// underlying identity. The handle is comparable and hashable so it can
/// key visibility sets and nonce streams.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Party {
    name: String,
}

impl Party {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

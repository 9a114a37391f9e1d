// src/contract.rs
use serde::{Deserialize, Serialize};

use crate::error::TrailError;
use crate::identity::Party;
use crate::state::{AssetEvent, EventKind};

/// Intent of a proposed transaction, one per event variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    CreateAssetDefinition,
    CreateAssetInstance,
    CreateAssetInstanceBatch,
    SetAssetInstanceProperty,
}

impl Command {
    /// The event variant this command must produce.
    pub fn expected_kind(&self) -> EventKind {
        match self {
            Self::CreateAssetDefinition => EventKind::DefinitionCreated,
            Self::CreateAssetInstance => EventKind::InstanceCreated,
            Self::CreateAssetInstanceBatch => EventKind::InstanceBatchCreated,
            Self::SetAssetInstanceProperty => EventKind::InstancePropertySet,
        }
    }
}

/// A proposed transaction over asset events: not yet a fact.
///
/// Proposals carry the full Corda-style shape (consumed inputs, produced
/// outputs, signers, command) even though every current command is
/// append-only; the ruleset rejects any consumed input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerTransaction {
    inputs: Vec<AssetEvent>,
    outputs: Vec<AssetEvent>,
    signers: Vec<Party>,
    command: Command,
}

impl LedgerTransaction {
    pub fn new(
        command: Command,
        inputs: Vec<AssetEvent>,
        outputs: Vec<AssetEvent>,
        signers: Vec<Party>,
    ) -> Self {
        Self {
            inputs,
            outputs,
            signers,
            command,
        }
    }

    pub fn inputs(&self) -> &[AssetEvent] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[AssetEvent] {
        &self.outputs
    }

    pub fn signers(&self) -> &[Party] {
        &self.signers
    }

    pub fn command(&self) -> Command {
        self.command
    }

    pub(crate) fn into_outputs(self) -> Vec<AssetEvent> {
        self.outputs
    }
}

/// Verification function gating one event variant.
pub type VerifyFn = fn(&LedgerTransaction) -> Result<(), TrailError>;

/// Ruleset registry: maps each event variant to the function that gates
/// its creation. The table is total over the closed variant set, so the
/// association is resolved at compile time and lookup cannot miss.
pub fn verifier(kind: EventKind) -> VerifyFn {
    match kind {
        EventKind::DefinitionCreated => verify_definition_created,
        EventKind::InstanceCreated => verify_instance_created,
        EventKind::InstanceBatchCreated => verify_instance_batch_created,
        EventKind::InstancePropertySet => verify_instance_property_set,
    }
}

/// Verify a proposal against the ruleset registered for its command.
pub fn verify(tx: &LedgerTransaction) -> Result<(), TrailError> {
    verifier(tx.command().expected_kind())(tx)
}

/// Shape shared by every command: nothing consumed, exactly one output,
/// output variant matches the command, and the author signs.
fn verify_creation_shape(tx: &LedgerTransaction) -> Result<&AssetEvent, TrailError> {
    if !tx.inputs().is_empty() {
        return Err(TrailError::UnexpectedInputs(tx.inputs().len()));
    }

    let output = match tx.outputs() {
        [] => return Err(TrailError::MissingOutput),
        [output] => output,
        outputs => return Err(TrailError::MultipleOutputs(outputs.len())),
    };

    let expected = tx.command().expected_kind();
    if output.kind() != expected {
        return Err(TrailError::CommandMismatch {
            expected,
            found: output.kind(),
        });
    }

    if !tx.signers().contains(output.author()) {
        return Err(TrailError::MissingAuthorSignature(
            output.author().name().to_string(),
        ));
    }

    Ok(output)
}

fn verify_definition_created(tx: &LedgerTransaction) -> Result<(), TrailError> {
    verify_creation_shape(tx).map(|_| ())
}

fn verify_instance_created(tx: &LedgerTransaction) -> Result<(), TrailError> {
    verify_creation_shape(tx).map(|_| ())
}

fn verify_instance_batch_created(tx: &LedgerTransaction) -> Result<(), TrailError> {
    verify_creation_shape(tx).map(|_| ())
}

fn verify_instance_property_set(tx: &LedgerTransaction) -> Result<(), TrailError> {
    let output = verify_creation_shape(tx)?;

    if let AssetEvent::InstancePropertySet(property) = output {
        if property.key().is_empty() {
            return Err(TrailError::EmptyPropertyKey);
        }
    }

    Ok(())
}

/// Transaction lifecycle
///
/// The build -> externally-sign -> submit -> apply pipeline. `tx_builder`
/// freezes balanced transfer lists; the coordinator quotes against fresh
/// reserves, tracks each built transaction in the pending store, and
/// applies local effects only after the ledger confirms.
pub mod coordinator;
pub mod tx_builder;

pub use coordinator::{BuiltTransaction, LifecycleCoordinator, SubmitOutcome};

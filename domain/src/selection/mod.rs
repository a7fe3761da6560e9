//! Backend selection policy.
//!
//! Decides, once per process, which backend is primary and which (if any)
//! is the fallback. See [`policy::select`] for the decision table.

pub mod policy;

pub use policy::{
    DeploymentEnvironment, DeploymentSignals, Selection, SelectionInputs, SelectionMode,
    ServicePriority, select,
};

//! Error types for the `nebula-economy` crate.

use nebula_types::Resources;

/// Errors that can occur while spending or computing resources.
#[derive(Debug, thiserror::Error)]
pub enum EconomyError {
    /// The stock does not cover the requested cost.
    #[error("insufficient resources: need {required:?}, have {available:?}")]
    InsufficientResources {
        /// What was requested.
        required: Resources,
        /// What was in stock.
        available: Resources,
    },

    /// Arithmetic overflow during a checked operation.
    #[error("arithmetic overflow in economy calculation")]
    ArithmeticOverflow,
}

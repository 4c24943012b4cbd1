// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Error types for the backflow reactive streaming library
//!
//! Every failure that travels through a pipeline is a [`FlowError`]. Failures are
//! terminal: a subscriber receives at most one of them, after which the attachment
//! is over.
//!
//! # Examples
//!
//! ```
//! use backflow_core::{FlowError, Result};
//!
//! fn validate(n: u64) -> Result<u64> {
//!     if n == 0 {
//!         return Err(FlowError::invalid_demand(n));
//!     }
//!     Ok(n)
//! }
//!
//! assert!(validate(0).unwrap_err().is_protocol_violation());
//! ```

/// Root error type for all backflow operations
///
/// This enum encompasses the protocol violations, user-code failures and
/// upstream failures a subscriber can observe.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// A subscriber requested a non-positive amount of items
    #[error("Invalid demand: requested {requested}, must be greater than zero")]
    InvalidDemand {
        /// The amount that was requested
        requested: u64,
    },

    /// A producer or consumer broke the subscription contract
    ///
    /// Typical causes are subscribing the same subscriber twice or signaling
    /// in an order the protocol forbids.
    #[error("Protocol violation: {context}")]
    ProtocolViolation {
        /// What was violated
        context: String,
    },

    /// Stream processing encountered an error
    ///
    /// This is a general error for stream operations that don't fit
    /// other specific categories.
    #[error("Stream processing error: {context}")]
    StreamProcessingError {
        /// Description of what went wrong during stream processing
        context: String,
    },

    /// Custom error from user code
    ///
    /// This wraps errors produced by user-provided functions and callbacks,
    /// allowing them to be propagated as a terminal failure.
    #[error("User error: {0}")]
    UserError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// User-provided callback function panicked
    ///
    /// Predicates, comparators and mapping functions are called behind a guard;
    /// a panic is caught there and delivered downstream as this variant.
    #[error("User callback panicked: {context}")]
    CallbackPanic {
        /// The panic payload, when it was a string
        context: String,
    },

    /// An emitter had no demand and was configured to fail instead of buffering
    #[error("Overflow: {context}")]
    Overflow {
        /// Context about the overflow
        context: String,
    },
}

impl FlowError {
    /// Create an invalid-demand error for the requested amount
    #[must_use]
    pub const fn invalid_demand(requested: u64) -> Self {
        Self::InvalidDemand { requested }
    }

    /// Create a protocol violation with the given context
    pub fn protocol_violation(context: impl Into<String>) -> Self {
        Self::ProtocolViolation {
            context: context.into(),
        }
    }

    /// Create a stream processing error with the given context
    pub fn stream_error(context: impl Into<String>) -> Self {
        Self::StreamProcessingError {
            context: context.into(),
        }
    }

    /// Create an overflow error with the given context
    pub fn overflow(context: impl Into<String>) -> Self {
        Self::Overflow {
            context: context.into(),
        }
    }

    /// Create a callback panic error with the given context
    pub fn callback_panic(context: impl Into<String>) -> Self {
        Self::CallbackPanic {
            context: context.into(),
        }
    }

    /// Wrap a user error
    pub fn user_error(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::UserError(Box::new(error))
    }

    /// Returns `true` for errors raised because the subscription contract was broken.
    #[must_use]
    pub const fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            Self::InvalidDemand { .. } | Self::ProtocolViolation { .. }
        )
    }

    /// Returns `true` for errors raised by user-supplied code.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(self, Self::UserError(_) | Self::CallbackPanic { .. })
    }
}

/// Specialized Result type for backflow operations
///
/// # Examples
///
/// ```
/// use backflow_core::Result;
///
/// fn process() -> Result<String> {
///     Ok("processed".to_string())
/// }
/// ```
pub type Result<T> = std::result::Result<T, FlowError>;

impl Clone for FlowError {
    fn clone(&self) -> Self {
        match self {
            Self::InvalidDemand { requested } => Self::InvalidDemand {
                requested: *requested,
            },
            Self::ProtocolViolation { context } => Self::ProtocolViolation {
                context: context.clone(),
            },
            Self::StreamProcessingError { context } => Self::StreamProcessingError {
                context: context.clone(),
            },
            // The boxed source cannot be cloned, keep its message
            Self::UserError(e) => Self::StreamProcessingError {
                context: format!("User error: {e}"),
            },
            Self::CallbackPanic { context } => Self::CallbackPanic {
                context: context.clone(),
            },
            Self::Overflow { context } => Self::Overflow {
                context: context.clone(),
            },
        }
    }
}

//! Unified error types for the TON signing core.
//!
//! All public operations report failures through this module so callers
//! receive a consistent `{code, message}` envelope instead of a raised fault.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for all signing operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TonError {
    pub code: ErrorCode,
    pub message: String,
}

impl TonError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    // Convenience constructors
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParams, msg)
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::General, msg)
    }
}

impl fmt::Display for TonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for TonError {}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Caller supplied insufficient or self-contradictory data: missing key
    /// material, mismatched signature/key list lengths, unsupported wallet
    /// version, unsupported action variant.
    InvalidParams,
    /// Failure while constructing or serializing the wallet message, such as
    /// address text that does not parse or a cell capacity overflow.
    General,
}

/// Result type alias for signing operations
pub type TonResult<T> = Result<T, TonError>;

// Conversions from lower-layer error types. Everything that goes wrong while
// building the wallet message is a `general` failure as far as callers are
// concerned; the message keeps the detail.

impl From<crate::cell::CellError> for TonError {
    fn from(e: crate::cell::CellError) -> Self {
        TonError::general(e.to_string())
    }
}

impl From<crate::address::AddressError> for TonError {
    fn from(e: crate::address::AddressError) -> Self {
        TonError::general(e.to_string())
    }
}

impl From<serde_json::Error> for TonError {
    fn from(e: serde_json::Error) -> Self {
        TonError::general(e.to_string())
    }
}

impl From<hex::FromHexError> for TonError {
    fn from(e: hex::FromHexError) -> Self {
        TonError::invalid_params(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = TonError::invalid_params("Unsupported wallet version");

        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("invalid_params"));
        assert!(json.contains("Unsupported wallet version"));
    }

    #[test]
    fn test_error_code_round_trip() {
        let json = serde_json::to_string(&ErrorCode::General).unwrap();
        assert_eq!(json, "\"general\"");

        let code: ErrorCode = serde_json::from_str("\"invalid_params\"").unwrap();
        assert_eq!(code, ErrorCode::InvalidParams);
    }

    #[test]
    fn test_display() {
        let err = TonError::general("boc too short");
        assert_eq!(err.to_string(), "[General] boc too short");
    }
}

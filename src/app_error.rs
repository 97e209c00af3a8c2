//! Numeric error codes reserved per owner, in the JSON-RPC manner.
//!
//! Each subsystem reserves a closed interval of codes from a
//! [`CodeRegistry`] and defines its error kinds inside that interval.
//! Reservations may not overlap.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Codes owned by the JSON-RPC protocol itself.
pub const JSON_RPC_RESERVED: (i32, i32) = (-32768, -32000);

/// An error as sent across an RPC boundary.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{message} (code {code})")]
pub struct ResponseError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReservationError {
    #[error("invalid code range {from}..={to}: start is greater than end")]
    Inverted { from: i32, to: i32 },

    #[error("error codes from {from} to {to} are reserved for {owner} errors")]
    Overlap { from: i32, to: i32, owner: String },

    #[error("{code} should be between {from} and {to} for {owner} errors")]
    OutOfRange {
        code: i32,
        from: i32,
        to: i32,
        owner: String,
    },
}

/// Sorted set of non-overlapping code intervals.
#[derive(Debug, Clone)]
pub struct CodeRegistry {
    // start -> (end, owner)
    reserved: BTreeMap<i32, (i32, String)>,
}

impl Default for CodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeRegistry {
    /// A registry with the JSON-RPC pre-defined range already taken.
    pub fn new() -> Self {
        let (from, to) = JSON_RPC_RESERVED;
        let mut reserved = BTreeMap::new();
        reserved.insert(from, (to, "JSON-RPC pre-defined".to_string()));
        Self { reserved }
    }

    /// Reserve `from..=to` for `owner`.
    ///
    /// # Errors
    /// Fails if `from > to` or the interval intersects an existing one.
    pub fn reserve(
        &mut self,
        from: i32,
        to: i32,
        owner: impl Into<String>,
    ) -> Result<CodeRange, ReservationError> {
        if from > to {
            return Err(ReservationError::Inverted { from, to });
        }
        // The only candidates are the last interval starting at or before
        // `to`; anything earlier ends before it starts.
        if let Some((&start, (end, owner))) = self.reserved.range(..=to).next_back()
            && *end >= from
        {
            return Err(ReservationError::Overlap {
                from: start,
                to: *end,
                owner: owner.clone(),
            });
        }
        let owner = owner.into();
        self.reserved.insert(from, (to, owner.clone()));
        tracing::debug!(from, to, owner = %owner, "reserved error codes");
        Ok(CodeRange { from, to, owner })
    }

    /// Owner of the interval containing `code`.
    pub fn owner_of(&self, code: i32) -> Option<&str> {
        let (_, (end, owner)) = self.reserved.range(..=code).next_back()?;
        (code <= *end).then_some(owner.as_str())
    }

    pub fn len(&self) -> usize {
        self.reserved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reserved.is_empty()
    }
}

/// An interval reserved by one owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeRange {
    from: i32,
    to: i32,
    owner: String,
}

impl CodeRange {
    pub const fn bounds(&self) -> (i32, i32) {
        (self.from, self.to)
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub const fn contains(&self, code: i32) -> bool {
        self.from <= code && code <= self.to
    }

    /// Define an error kind with the given code.
    ///
    /// # Errors
    /// Fails if `code` lies outside this range.
    pub fn define(&self, code: i32) -> Result<ErrorCode, ReservationError> {
        if !self.contains(code) {
            return Err(ReservationError::OutOfRange {
                code,
                from: self.from,
                to: self.to,
                owner: self.owner.clone(),
            });
        }
        Ok(ErrorCode { code })
    }
}

impl fmt::Display for CodeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}, {}]", self.owner, self.from, self.to)
    }
}

/// A defined error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode {
    code: i32,
}

impl ErrorCode {
    pub const fn code(self) -> i32 {
        self.code
    }

    pub fn create(self, message: impl Into<String>, data: Option<serde_json::Value>) -> ResponseError {
        ResponseError {
            code: self.code,
            message: message.into(),
            data,
        }
    }

    /// Whether `error` carries this code.
    pub const fn is(self, error: &ResponseError) -> bool {
        error.code == self.code
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_json_rpc_range_is_preseeded() {
        let registry = CodeRegistry::new();
        assert_eq!(registry.owner_of(-32600), Some("JSON-RPC pre-defined"));
        assert_eq!(registry.owner_of(-31999), None);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_reserve_rejects_overlap_with_json_rpc() {
        let mut registry = CodeRegistry::new();
        let err = registry.reserve(-32100, -31000, "mine").unwrap_err();
        assert_eq!(
            err,
            ReservationError::Overlap {
                from: -32768,
                to: -32000,
                owner: "JSON-RPC pre-defined".to_string(),
            }
        );
    }

    #[test]
    fn test_reserve_detects_overlap_from_either_side() {
        let mut registry = CodeRegistry::new();
        registry.reserve(100, 199, "a").unwrap();
        assert!(registry.reserve(50, 100, "b").is_err());
        assert!(registry.reserve(199, 250, "c").is_err());
        assert!(registry.reserve(120, 130, "d").is_err());
        assert!(registry.reserve(0, 1000, "e").is_err());
        registry.reserve(200, 299, "f").unwrap();
        registry.reserve(0, 99, "g").unwrap();
        assert_eq!(registry.owner_of(250), Some("f"));
    }

    #[test]
    fn test_reserve_rejects_inverted_bounds() {
        let mut registry = CodeRegistry::new();
        assert_eq!(
            registry.reserve(10, 5, "x").unwrap_err(),
            ReservationError::Inverted { from: 10, to: 5 }
        );
    }

    #[test]
    fn test_define_checks_the_code_itself() {
        let mut registry = CodeRegistry::new();
        let range = registry.reserve(1000, 1099, "editor").unwrap();
        assert!(range.define(1000).is_ok());
        assert!(range.define(1099).is_ok());
        assert!(matches!(
            range.define(1100),
            Err(ReservationError::OutOfRange { code: 1100, .. })
        ));
    }

    #[test]
    fn test_create_and_is() {
        let mut registry = CodeRegistry::new();
        let range = registry.reserve(1000, 1099, "editor").unwrap();
        let not_found = range.define(1001).unwrap();
        let other = range.define(1002).unwrap();
        let error = not_found.create("missing", Some(json!({ "uri": "a" })));
        assert!(not_found.is(&error));
        assert!(!other.is(&error));
        assert_eq!(error.to_string(), "missing (code 1001)");
        let wire = serde_json::to_value(&error).unwrap();
        assert_eq!(wire, json!({ "code": 1001, "message": "missing", "data": { "uri": "a" } }));
    }
}

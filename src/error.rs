//! Error types shared by the structure algorithms.
//!
//! Only genuine faults are reported here. Degenerate inputs such as an
//! acyclic graph handed to the ring finder or a pattern that does not occur
//! in a target are answered with empty results, never with an error.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructureError {
    /// A connector refers to a node index that does not exist.
    #[error("connector {connector} references missing node {node}")]
    DanglingConnector { connector: usize, node: usize },

    /// A connector whose two ends are the same node.
    #[error("connector {connector} connects node {node} to itself")]
    DegenerateConnector { connector: usize, node: usize },

    /// A sub-group has external connections but no usable anchor node.
    #[error("sub-group node {node} has no usable anchor")]
    InvalidAnchor { node: usize },

    #[error("canonicalization executor `{0}` is not registered")]
    ExecutorNotFound(String),

    #[error("no canonicalization executor is registered")]
    NoExecutorRegistered,

    /// All-rings enumeration produced more intermediate paths than allowed.
    #[error("ring enumeration exceeded the limit of {limit} paths")]
    RingLimitExceeded { limit: usize },

    #[error("sub-structure search exceeded the limit of {limit} steps")]
    SearchLimitExceeded { limit: usize },

    #[error("operation cancelled")]
    Cancelled,

    #[error("unknown element symbol `{0}`")]
    UnknownElement(String),
}

pub type Result<T> = std::result::Result<T, StructureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_object() {
        let err = StructureError::DanglingConnector {
            connector: 3,
            node: 9,
        };
        assert_eq!(err.to_string(), "connector 3 references missing node 9");

        let err = StructureError::ExecutorNotFound("inchi".into());
        assert_eq!(
            err.to_string(),
            "canonicalization executor `inchi` is not registered"
        );
    }
}

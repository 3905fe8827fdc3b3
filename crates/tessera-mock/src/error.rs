//! Error types for mock configuration and verification
//!
//! Configuration errors are raised at DSL call time; verification errors
//! carry an expected-vs-actual description.

/// Mock configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MockError {
    /// An outcome was declared without a pending `given`
    #[error("{operation} called before given: declare the call shape first")]
    OrderingViolation {
        /// The finalizing operation that was called
        operation: &'static str,
    },

    /// No member with that name on the contract
    #[error("contract {contract} has no member named '{member}'")]
    UnknownMember {
        /// Contract name
        contract: &'static str,
        /// Requested member name
        member: String,
    },

    /// Member exists but no overload takes the given parameter types
    #[error("no overload of '{member}' takes ({}); candidates: {}", .actual.join(", "), .candidates.join("; "))]
    ArgumentMismatch {
        /// Requested member name
        member: String,
        /// Declared overloads of the member
        candidates: Vec<String>,
        /// Parameter types implied by the matchers
        actual: Vec<&'static str>,
    },

    /// Configured value type differs from the member's return type
    #[error("'{member}' returns {expected}, but the configured outcome produces {actual}")]
    ReturnTypeMismatch {
        /// Member signature
        member: String,
        /// Declared return type
        expected: &'static str,
        /// Configured value type
        actual: &'static str,
    },
}

/// Call verification failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    /// Blank member name passed to a verifier
    #[error("member name must be provided")]
    EmptyMemberName,

    /// Expected at least one call, saw none
    #[error("expected {mock}.{member} to be called, but it was never called")]
    NeverCalled {
        /// Mock label
        mock: String,
        /// Member name
        member: String,
    },

    /// Exact call count differs
    #[error("expected {mock}.{member} to be called {expected} times but was {actual}")]
    CallCountMismatch {
        /// Mock label
        mock: String,
        /// Member name
        member: String,
        /// Expected count
        expected: usize,
        /// Recorded count
        actual: usize,
    },

    /// No verifier has been bound to the slot yet
    #[error("no verifier bound: the mock has not been built yet")]
    Unbound,
}

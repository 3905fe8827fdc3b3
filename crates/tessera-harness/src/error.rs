//! Error types for harness resolution and scenarios

use indexmap::IndexSet;
use std::fmt::Write as _;
use tessera_mock::{MockError, VerificationError};

/// One constructor that could not be satisfied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorAttempt {
    /// Rendered parameter list, e.g. `(Arc<dyn Clock>, u32)`
    pub signature: String,

    /// Parameter types missing from the registration table
    pub missing: Vec<&'static str>,
}

/// Dependency resolution failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// Neither registered nor constructible from registered dependencies
    #[error("{}", render_unresolvable(.type_name, .attempts, .missing))]
    Unresolvable {
        /// Requested type
        type_name: &'static str,
        /// Constructors tried, most parameters first
        attempts: Vec<ConstructorAttempt>,
        /// De-duplicated union of missing types, first-seen order
        missing: Vec<&'static str>,
    },
}

impl ResolveError {
    /// Build the diagnostic for `type_name` from its failed attempts
    #[must_use]
    pub fn unresolvable(type_name: &'static str, attempts: Vec<ConstructorAttempt>) -> Self {
        let missing: IndexSet<&'static str> = attempts
            .iter()
            .flat_map(|attempt| attempt.missing.iter().copied())
            .collect();

        Self::Unresolvable {
            type_name,
            attempts,
            missing: missing.into_iter().collect(),
        }
    }

    /// Missing types across all attempts
    #[must_use]
    pub fn missing(&self) -> &[&'static str] {
        match self {
            Self::Unresolvable { missing, .. } => missing,
        }
    }
}

fn render_unresolvable(
    type_name: &str,
    attempts: &[ConstructorAttempt],
    missing: &[&'static str],
) -> String {
    let mut out = format!("could not resolve type '{type_name}'\nattempted constructors:");
    for attempt in attempts {
        let _ = write!(
            out,
            "\n  {} - missing: {}",
            attempt.signature,
            attempt.missing.join(", ")
        );
    }
    if missing.is_empty() {
        out.push_str(
            "\nno satisfiable constructor: declare one via Constructible::constructors \
             or register an instance with the harness",
        );
    } else {
        let _ = write!(
            out,
            "\nregister the following dependency types with the harness via with_dependency: {}",
            missing.join(", ")
        );
    }
    out
}

/// Harness configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HarnessError {
    /// Mock configuration failed inside `with_mock`
    #[error("mock configuration failed: {0}")]
    Mock(#[from] MockError),

    /// An arrange callback reported a failure
    #[error("arrange failed: {0}")]
    Arrange(String),
}

/// Result assertion failure: expected vs. actual
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected {subject} to be {expected} but was {actual}")]
pub struct AssertionError {
    /// What was checked, e.g. `result` or `result.total`
    pub subject: String,
    /// Expected rendering
    pub expected: String,
    /// Actual rendering
    pub actual: String,
}

/// Scenario failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScenarioError {
    /// Replaying an arrange callback failed
    #[error(transparent)]
    Arrange(#[from] HarnessError),

    /// The handler could not be resolved
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// `assert_result` before any completed act
    #[error("assert_result requires a completed act")]
    NotActed,

    /// A result assertion failed
    #[error(transparent)]
    Assertion(#[from] AssertionError),

    /// A verifier check failed
    #[error(transparent)]
    Verification(#[from] VerificationError),

    /// The act operation failed
    #[error("act failed: {0}")]
    Act(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(signature: &str, missing: &[&'static str]) -> ConstructorAttempt {
        ConstructorAttempt {
            signature: signature.to_string(),
            missing: missing.to_vec(),
        }
    }

    #[test]
    fn missing_union_is_deduplicated_in_first_seen_order() {
        let err = ResolveError::unresolvable(
            "Report",
            vec![
                attempt("(Clock, Store)", &["Clock", "Store"]),
                attempt("(Clock)", &["Clock"]),
            ],
        );
        assert_eq!(err.missing(), ["Clock", "Store"]);
    }

    #[test]
    fn message_lists_attempts_and_missing_types() {
        let err = ResolveError::unresolvable("Report", vec![attempt("(Clock)", &["Clock"])]);
        let text = err.to_string();
        assert!(text.starts_with("could not resolve type 'Report'"));
        assert!(text.contains("(Clock) - missing: Clock"));
        assert!(text.contains("register the following dependency types"));
    }

    #[test]
    fn message_without_constructors() {
        let text = ResolveError::unresolvable("Opaque", Vec::new()).to_string();
        assert!(text.contains("no satisfiable constructor"));
    }

    #[test]
    fn assertion_message_is_expected_vs_actual() {
        let err = AssertionError {
            subject: "result".to_string(),
            expected: "5".to_string(),
            actual: "4".to_string(),
        };
        assert_eq!(err.to_string(), "expected result to be 5 but was 4");
    }
}

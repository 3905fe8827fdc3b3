//! Call verification
//!
//! Matching is by member name only: overloads sharing a name are counted
//! together.

use crate::engine::{BehaviorEngine, InvocationRecord};
use crate::error::VerificationError;
use std::sync::Arc;

/// Read-only query surface over a mock's recorded calls
#[derive(Debug, Clone)]
pub struct CallVerifier {
    engine: Arc<BehaviorEngine>,
}

impl CallVerifier {
    /// Verifier over `engine`
    #[inline]
    #[must_use]
    pub fn new(engine: Arc<BehaviorEngine>) -> Self {
        Self { engine }
    }

    /// Fails unless `name` was called at least once
    ///
    /// # Errors
    /// [`VerificationError::EmptyMemberName`] for a blank name,
    /// [`VerificationError::NeverCalled`] otherwise.
    pub fn should_have_been_called(&self, name: &str) -> Result<(), VerificationError> {
        let name = checked(name)?;
        if self.engine.count_named(name) == 0 {
            return Err(VerificationError::NeverCalled {
                mock: self.engine.label().to_string(),
                member: name.to_string(),
            });
        }
        Ok(())
    }

    /// Fails unless `name` was called exactly `times` times
    ///
    /// # Errors
    /// [`VerificationError::EmptyMemberName`] for a blank name,
    /// [`VerificationError::CallCountMismatch`] otherwise.
    pub fn should_have_been_called_times(
        &self,
        name: &str,
        times: usize,
    ) -> Result<(), VerificationError> {
        let name = checked(name)?;
        let actual = self.engine.count_named(name);
        if actual != times {
            return Err(VerificationError::CallCountMismatch {
                mock: self.engine.label().to_string(),
                member: name.to_string(),
                expected: times,
                actual,
            });
        }
        Ok(())
    }

    /// Fails if `name` was called at all
    ///
    /// # Errors
    /// See [`Self::should_have_been_called_times`].
    pub fn should_not_have_been_called(&self, name: &str) -> Result<(), VerificationError> {
        self.should_have_been_called_times(name, 0)
    }

    /// Number of calls recorded for `name`
    #[must_use]
    pub fn call_count(&self, name: &str) -> usize {
        self.engine.count_named(name)
    }

    /// Every recorded call, in record order
    #[must_use]
    pub fn invocations(&self) -> Vec<InvocationRecord> {
        self.engine.invocations()
    }

    /// Recorded calls of `name`, in record order
    #[must_use]
    pub fn invocations_of(&self, name: &str) -> Vec<InvocationRecord> {
        self.engine
            .invocations()
            .into_iter()
            .filter(|record| record.name() == name)
            .collect()
    }

    /// Label of the verified mock
    #[inline]
    #[must_use]
    pub fn mock_label(&self) -> &str {
        self.engine.label()
    }
}

fn checked(name: &str) -> Result<&str, VerificationError> {
    if name.trim().is_empty() {
        Err(VerificationError::EmptyMemberName)
    } else {
        Ok(name)
    }
}

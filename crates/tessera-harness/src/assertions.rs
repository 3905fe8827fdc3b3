//! Assertions over a scenario's last result
//!
//! Every check returns `Result<&Self, AssertionError>` so checks chain with
//! `?`:
//!
//! ```
//! use tessera_harness::ResultAssertions;
//!
//! # fn main() -> Result<(), tessera_harness::AssertionError> {
//! let total = (3_u32, "EUR");
//! ResultAssertions::new(&total)
//!     .with_property(|t| t.0, 3)?
//!     .and_also()
//!     .with_named_property("currency", |t| t.1, "EUR")?;
//! # Ok(())
//! # }
//! ```

use crate::error::AssertionError;
use std::fmt::Debug;

/// Assertion context over a borrowed result
#[derive(Debug, Clone, Copy)]
pub struct ResultAssertions<'a, T> {
    value: &'a T,
}

impl<'a, T: Debug> ResultAssertions<'a, T> {
    /// Assert over `value`
    #[inline]
    #[must_use]
    pub fn new(value: &'a T) -> Self {
        Self { value }
    }

    /// The asserted value
    #[inline]
    #[must_use]
    pub fn value(&self) -> &'a T {
        self.value
    }

    /// Fails unless the result equals `expected`
    ///
    /// # Errors
    /// [`AssertionError`] with both renderings.
    pub fn have_value<U>(&self, expected: U) -> Result<&Self, AssertionError>
    where
        T: PartialEq<U>,
        U: Debug,
    {
        if *self.value == expected {
            return Ok(self);
        }
        Err(mismatch("result", &expected, self.value))
    }

    /// Fails unless `selector(result)` equals `expected`
    ///
    /// # Errors
    /// [`AssertionError`] naming the property.
    pub fn with_property<P, F>(&self, selector: F, expected: P) -> Result<&Self, AssertionError>
    where
        F: FnOnce(&T) -> P,
        P: PartialEq + Debug,
    {
        self.with_named_property("property", selector, expected)
    }

    /// [`Self::with_property`] with a label for the message
    ///
    /// # Errors
    /// [`AssertionError`] naming `label`.
    pub fn with_named_property<P, F>(
        &self,
        label: &str,
        selector: F,
        expected: P,
    ) -> Result<&Self, AssertionError>
    where
        F: FnOnce(&T) -> P,
        P: PartialEq + Debug,
    {
        let actual = selector(self.value);
        if actual == expected {
            return Ok(self);
        }
        Err(mismatch(&format!("result.{label}"), &expected, &actual))
    }

    /// Fails unless `predicate` holds for the result
    ///
    /// # Errors
    /// [`AssertionError`] describing the predicate by `label`.
    pub fn satisfy<F>(&self, label: &str, predicate: F) -> Result<&Self, AssertionError>
    where
        F: FnOnce(&T) -> bool,
    {
        if predicate(self.value) {
            return Ok(self);
        }
        Err(AssertionError {
            subject: String::from("result"),
            expected: label.to_string(),
            actual: format!("{:?}", self.value),
        })
    }

    /// Chaining accessor; returns the same context
    #[inline]
    #[must_use]
    pub fn and_also(&self) -> &Self {
        self
    }
}

impl<T: Debug> ResultAssertions<'_, Option<T>> {
    /// Fails when the result is `None`
    ///
    /// # Errors
    /// [`AssertionError`] when absent.
    pub fn not_be_null(&self) -> Result<&Self, AssertionError> {
        if self.value.is_some() {
            return Ok(self);
        }
        Err(AssertionError {
            subject: String::from("result"),
            expected: String::from("present"),
            actual: String::from("None"),
        })
    }
}

fn mismatch(subject: &str, expected: &dyn Debug, actual: &dyn Debug) -> AssertionError {
    AssertionError {
        subject: subject.to_string(),
        expected: format!("{expected:?}"),
        actual: format!("{actual:?}"),
    }
}

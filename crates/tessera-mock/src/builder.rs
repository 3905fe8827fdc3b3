//! Fluent mock configuration
//!
//! Two-phase: [`MockBuilder::given`] captures a pending call shape, and one
//! of `then_returns`, `then_throws` or `then_computes` turns it into a rule.
//!
//! ```
//! # use tessera_mock::{mock_contract, any, eq, MockBuilder};
//! # pub trait Counter: Send + Sync { fn bump(&self, by: u32) -> u32; }
//! # mock_contract! { pub struct CounterProxy for dyn Counter { fn bump(&self, by: u32) -> u32; } }
//! # fn main() -> Result<(), tessera_mock::MockError> {
//! let mut counter = MockBuilder::<dyn Counter>::new();
//! counter.given("bump", [eq(0_u32)])?.then_throws(String::from("zero step"))?;
//! counter.given("bump", [any::<u32>()])?.then_returns(1_u32)?;
//! let mock = counter.build();
//!
//! assert_eq!(mock.proxy.bump(5), 1);
//! # Ok(())
//! # }
//! ```

use crate::engine::{BehaviorEngine, BehaviorRule};
use crate::error::MockError;
use crate::matcher::ArgumentMatcher;
use crate::outcome::{Fault, Outcome, ReturnValue};
use crate::proxy::{Contract, ProxyFactory};
use crate::signature::{MemberId, Returnable};
use crate::value::{Args, ParamType};
use crate::verifier::CallVerifier;
use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

struct PendingShape {
    member: MemberId,
    matchers: Vec<ArgumentMatcher>,
}

/// Stateful DSL configuring one mock of contract `C`
pub struct MockBuilder<C: Contract + ?Sized> {
    engine: Arc<BehaviorEngine>,
    pending: Option<PendingShape>,
    _contract: PhantomData<fn(&C)>,
}

impl<C: Contract + ?Sized> MockBuilder<C> {
    /// Builder for a fresh engine labelled with the contract name
    #[must_use]
    pub fn new() -> Self {
        Self::with_engine(BehaviorEngine::new(ProxyFactory::shape::<C>()))
    }

    /// Builder whose mock is labelled `label` in logs and verifier messages
    #[must_use]
    pub fn named(label: impl Into<String>) -> Self {
        Self::with_engine(BehaviorEngine::new(ProxyFactory::shape::<C>()).with_label(label))
    }

    fn with_engine(engine: BehaviorEngine) -> Self {
        Self {
            engine: Arc::new(engine),
            pending: None,
            _contract: PhantomData,
        }
    }

    /// Declare the call shape the next outcome applies to
    ///
    /// The overload is picked by `name` and the matchers' parameter types.
    /// Declaring a new shape while one is pending replaces it.
    ///
    /// # Errors
    /// [`MockError::UnknownMember`] or [`MockError::ArgumentMismatch`] when no
    /// member fits.
    pub fn given<I>(&mut self, name: &str, matchers: I) -> Result<&mut Self, MockError>
    where
        I: IntoIterator<Item = ArgumentMatcher>,
    {
        let matchers: Vec<ArgumentMatcher> = matchers.into_iter().collect();
        let params: Vec<ParamType> = matchers.iter().map(ArgumentMatcher::param_type).collect();
        let member = self.engine.shape().resolve(name, &params)?;

        if self
            .pending
            .replace(PendingShape { member, matchers })
            .is_some()
        {
            tracing::debug!(mock = %self.engine.label(), member = name, "replaced pending call shape");
        }
        Ok(self)
    }

    /// Finalize the pending shape with a fixed return value
    ///
    /// Deferred members take an already-completed value, see
    /// [`completed`](crate::completed).
    ///
    /// # Errors
    /// - [`MockError::OrderingViolation`] without a pending `given`
    /// - [`MockError::ReturnTypeMismatch`] if `R` is not the member's return type
    pub fn then_returns<R: Returnable>(&mut self, value: R) -> Result<&mut Self, MockError> {
        let pending = self.take_pending::<R>("then_returns")?;
        let value: ReturnValue = Arc::new(value);
        self.commit(pending, Outcome::Return(value))
    }

    /// Finalize the pending shape with a fault
    ///
    /// # Errors
    /// [`MockError::OrderingViolation`] without a pending `given`
    pub fn then_throws<E>(&mut self, fault: E) -> Result<&mut Self, MockError>
    where
        E: Clone + fmt::Debug + Send + Sync + 'static,
    {
        let pending = self
            .pending
            .take()
            .ok_or(MockError::OrderingViolation {
                operation: "then_throws",
            })?;
        self.commit(pending, Outcome::Fault(Fault::new(fault)))
    }

    /// Finalize the pending shape with a value computed from the actual
    /// arguments of each call
    ///
    /// # Errors
    /// - [`MockError::OrderingViolation`] without a pending `given`
    /// - [`MockError::ReturnTypeMismatch`] if `R` is not the member's return type
    pub fn then_computes<R, F>(&mut self, compute: F) -> Result<&mut Self, MockError>
    where
        R: Returnable,
        F: Fn(&Args) -> R + Send + Sync + 'static,
    {
        let pending = self.take_pending::<R>("then_computes")?;
        let compute = move |args: &Args| -> ReturnValue { Arc::new(compute(args)) };
        self.commit(pending, Outcome::Compute(Arc::new(compute)))
    }

    /// Whether a `given` is waiting for its outcome
    #[inline]
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Bind the proxy and hand out proxy plus verifier
    ///
    /// A still-pending shape is dropped.
    #[must_use]
    pub fn build(self) -> Mock<C> {
        if self.pending.is_some() {
            tracing::warn!(mock = %self.engine.label(), "given without outcome discarded at build");
        }
        Mock {
            proxy: ProxyFactory::create::<C>(Arc::clone(&self.engine)),
            verifier: CallVerifier::new(self.engine),
        }
    }

    fn take_pending<R: Returnable>(
        &mut self,
        operation: &'static str,
    ) -> Result<PendingShape, MockError> {
        let member = self
            .pending
            .as_ref()
            .map(|pending| pending.member)
            .ok_or(MockError::OrderingViolation { operation })?;

        if let Some(signature) = self.engine.shape().member(member) {
            if signature.returns() != ParamType::of::<R>() {
                return Err(MockError::ReturnTypeMismatch {
                    member: signature.to_string(),
                    expected: signature.returns().name(),
                    actual: type_name::<R>(),
                });
            }
        }

        self.pending
            .take()
            .ok_or(MockError::OrderingViolation { operation })
    }

    fn commit(&mut self, pending: PendingShape, outcome: Outcome) -> Result<&mut Self, MockError> {
        self.engine
            .register_behavior(BehaviorRule::new(pending.member, pending.matchers, outcome))?;
        Ok(self)
    }
}

impl<C: Contract + ?Sized> Default for MockBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Contract + ?Sized> fmt::Debug for MockBuilder<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockBuilder")
            .field("mock", &self.engine.label())
            .field("pending", &self.pending.is_some())
            .finish_non_exhaustive()
    }
}

/// A built mock: the contract instance and its verifier
pub struct Mock<C: ?Sized> {
    /// Proxy implementing the contract
    pub proxy: Arc<C>,

    /// Read-only view of the proxy's recorded calls
    pub verifier: CallVerifier,
}

impl<C: ?Sized> Mock<C> {
    /// Split into proxy and verifier
    #[must_use]
    pub fn into_parts(self) -> (Arc<C>, CallVerifier) {
        (self.proxy, self.verifier)
    }
}

impl<C: ?Sized> fmt::Debug for Mock<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mock")
            .field("verifier", &self.verifier)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{any, eq};
    use crate::signature::{completed, Deferred};
    use futures::executor::block_on;
    use pretty_assertions::assert_eq;

    trait Store: Send + Sync {
        fn get(&self, key: String) -> Option<u64>;
        fn put(&self, key: String, value: u64) -> bool;
        fn load(&self, key: String) -> Deferred<u64>;
    }

    crate::mock_contract! {
        struct StoreProxy for dyn Store {
            fn get(&self, key: String) -> Option<u64>;
            fn put(&self, key: String, value: u64) -> bool;
            fn load(&self, key: String) -> Deferred<u64>;
        }
    }

    #[test]
    fn outcome_without_given_is_an_ordering_violation() {
        let mut builder = MockBuilder::<dyn Store>::new();
        let err = builder.then_returns(true).unwrap_err();
        assert_eq!(
            err,
            MockError::OrderingViolation {
                operation: "then_returns"
            }
        );

        let err = builder.then_throws(String::from("x")).unwrap_err();
        assert_eq!(
            err,
            MockError::OrderingViolation {
                operation: "then_throws"
            }
        );
    }

    #[test]
    fn outcome_clears_pending_shape() {
        let mut builder = MockBuilder::<dyn Store>::new();
        builder.given("put", [any::<String>(), any::<u64>()]).unwrap();
        assert!(builder.has_pending());
        builder.then_returns(true).unwrap();
        assert!(!builder.has_pending());
        assert!(matches!(
            builder.then_returns(false),
            Err(MockError::OrderingViolation { .. })
        ));
    }

    #[test]
    fn return_type_is_checked() {
        let mut builder = MockBuilder::<dyn Store>::new();
        let err = builder
            .given("get", [any::<String>()])
            .unwrap()
            .then_returns(5_u64)
            .unwrap_err();
        assert!(matches!(err, MockError::ReturnTypeMismatch { .. }));
        assert!(builder.has_pending());
    }

    #[test]
    fn unknown_member_and_wrong_types_fail_at_given() {
        let mut builder = MockBuilder::<dyn Store>::new();
        assert!(matches!(
            builder.given("delete", [any::<String>()]),
            Err(MockError::UnknownMember { .. })
        ));
        assert!(matches!(
            builder.given("get", [eq(5_u32)]),
            Err(MockError::ArgumentMismatch { .. })
        ));
    }

    #[test]
    fn second_given_replaces_first() {
        let mut builder = MockBuilder::<dyn Store>::new();
        builder.given("get", [eq(String::from("a"))]).unwrap();
        builder
            .given("get", [eq(String::from("b"))])
            .unwrap()
            .then_returns(Some(2_u64))
            .unwrap();
        let mock = builder.build();

        assert_eq!(mock.proxy.get(String::from("a")), None);
        assert_eq!(mock.proxy.get(String::from("b")), Some(2));
    }

    #[test]
    fn computed_outcome_uses_call_arguments() {
        let mut builder = MockBuilder::<dyn Store>::new();
        builder
            .given("put", [any::<String>(), any::<u64>()])
            .unwrap()
            .then_computes(|args: &Args| args.get::<u64>(1).is_some_and(|v| *v > 10))
            .unwrap();
        let mock = builder.build();

        assert!(mock.proxy.put(String::from("k"), 11));
        assert!(!mock.proxy.put(String::from("k"), 3));
    }

    #[test]
    fn deferred_members_return_configured_value_as_is() {
        let mut builder = MockBuilder::<dyn Store>::new();
        builder
            .given("load", [eq(String::from("answer"))])
            .unwrap()
            .then_returns(completed(42_u64))
            .unwrap();
        let mock = builder.build();

        assert_eq!(block_on(mock.proxy.load(String::from("answer"))), 42);
        assert_eq!(block_on(mock.proxy.load(String::from("other"))), 0);
    }

    #[test]
    fn named_mock_label_reaches_verifier() {
        let mock = MockBuilder::<dyn Store>::named("primary-store").build();
        let err = mock.verifier.should_have_been_called("get").unwrap_err();
        assert!(err.to_string().contains("primary-store.get"));
    }
}

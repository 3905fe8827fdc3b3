//! Rule outcomes and configured faults

use crate::value::Args;
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

/// Erased value produced by a matched rule
pub type ReturnValue = Arc<dyn Any + Send + Sync>;

/// Computation evaluated against the actual arguments of a call
pub type Computation = Arc<dyn Fn(&Args) -> ReturnValue + Send + Sync>;

/// Erased fault value
///
/// Blanket-implemented for every `Clone + Debug` value, so any error type a
/// contract exposes can be configured as a fault.
pub trait FaultPayload: Any + fmt::Debug + Send + Sync {
    /// Upcast for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Raise this fault as a panic carrying a clone of the original value
    fn raise(&self) -> !;

    /// Concrete type name
    fn type_name(&self) -> &'static str;
}

impl<T> FaultPayload for T
where
    T: Any + Clone + fmt::Debug + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn raise(&self) -> ! {
        std::panic::panic_any(self.clone())
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

/// A configured error outcome
///
/// Propagated to the proxy caller unchanged: as `Err(e)` when the member
/// returns `Result<_, E>`, otherwise as a panic whose payload is the fault.
#[derive(Clone)]
pub struct Fault {
    payload: Arc<dyn FaultPayload>,
}

impl Fault {
    /// Wrap a fault value
    ///
    /// An existing [`Fault`] is taken as is rather than wrapped again.
    #[must_use]
    pub fn new<E>(fault: E) -> Self
    where
        E: Clone + fmt::Debug + Send + Sync + 'static,
    {
        if let Some(fault) = (&fault as &dyn Any).downcast_ref::<Fault>() {
            return fault.clone();
        }
        Self {
            payload: Arc::new(fault),
        }
    }

    /// Borrow the fault as `E`
    #[inline]
    #[must_use]
    pub fn downcast_ref<E: 'static>(&self) -> Option<&E> {
        self.payload().as_any().downcast_ref::<E>()
    }

    /// Clone the fault out as `E`
    #[inline]
    #[must_use]
    pub fn downcast<E: Clone + 'static>(&self) -> Option<E> {
        self.downcast_ref::<E>().cloned()
    }

    /// Whether the fault is an `E`
    #[inline]
    #[must_use]
    pub fn is<E: 'static>(&self) -> bool {
        self.payload().as_any().is::<E>()
    }

    /// Concrete type name of the fault
    #[inline]
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.payload().type_name()
    }

    /// Panic with the fault value as payload
    pub fn raise(&self) -> ! {
        self.payload().raise()
    }

    // `Arc<dyn FaultPayload>` is itself a `FaultPayload`; always dispatch on the inner value.
    fn payload(&self) -> &dyn FaultPayload {
        &*self.payload
    }
}

impl fmt::Debug for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.payload(), f)
    }
}

/// What a matched behavior rule produces
///
/// Exactly one of return value, fault or computed action.
#[derive(Clone)]
pub enum Outcome {
    /// Return a fixed value
    Return(ReturnValue),

    /// Raise a fault
    Fault(Fault),

    /// Compute the value from the actual arguments
    Compute(Computation),
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Return(_) => f.write_str("Return(..)"),
            Self::Fault(fault) => f.debug_tuple("Fault").field(fault).finish(),
            Self::Compute(_) => f.write_str("Compute(..)"),
        }
    }
}

/// Successful result of an engine invocation
#[derive(Clone)]
pub enum Reply {
    /// A rule matched and produced this value
    Value(ReturnValue),

    /// No rule matched; the caller substitutes the member's neutral default
    Neutral,
}

impl Reply {
    /// Whether no rule matched
    #[inline]
    #[must_use]
    pub fn is_neutral(&self) -> bool {
        matches!(self, Self::Neutral)
    }
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(_) => f.write_str("Value(..)"),
            Self::Neutral => f.write_str("Neutral"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    #[derive(Debug, Clone, PartialEq)]
    struct Overdrawn(u32);

    #[test]
    fn fault_downcasts_to_configured_type() {
        let fault = Fault::new(Overdrawn(5));
        assert!(fault.is::<Overdrawn>());
        assert_eq!(fault.downcast::<Overdrawn>(), Some(Overdrawn(5)));
        assert!(fault.downcast_ref::<String>().is_none());
    }

    #[test]
    fn existing_fault_is_not_wrapped_again() {
        let fault = Fault::new(Fault::new(Overdrawn(2)));
        assert!(fault.is::<Overdrawn>());
        assert!(!fault.is::<Fault>());
        assert_eq!(fault.type_name(), std::any::type_name::<Overdrawn>());
    }

    #[test]
    fn raised_fault_carries_original_value() {
        let fault = Fault::new(Overdrawn(9));
        let payload = catch_unwind(AssertUnwindSafe(|| fault.raise())).unwrap_err();
        assert_eq!(payload.downcast_ref::<Overdrawn>(), Some(&Overdrawn(9)));
    }
}

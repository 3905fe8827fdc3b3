//! Per-position argument matchers
//!
//! Matchers are first-class values: [`any`] accepts every value of a
//! parameter type, [`eq`] captures its expected value at configuration time.

use crate::value::{arg, Arg, Argument, ParamType};
use std::fmt;

/// Matcher for one argument position
#[derive(Clone)]
pub enum ArgumentMatcher {
    /// Accepts any value of the parameter type
    Wildcard(ParamType),

    /// Accepts values equal to the captured one
    Literal(Arg),
}

impl ArgumentMatcher {
    /// Parameter type this matcher stands for
    #[must_use]
    pub fn param_type(&self) -> ParamType {
        match self {
            Self::Wildcard(param) => *param,
            Self::Literal(expected) => expected.param_type(),
        }
    }

    /// Whether `actual` satisfies this position
    #[must_use]
    pub fn accepts(&self, actual: &Arg) -> bool {
        match self {
            Self::Wildcard(_) => true,
            Self::Literal(expected) => expected.dyn_eq(actual.as_ref()),
        }
    }

    /// Whether this is a wildcard
    #[inline]
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard(_))
    }
}

impl fmt::Debug for ArgumentMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wildcard(param) => write!(f, "any::<{param}>()"),
            Self::Literal(expected) => write!(f, "eq({expected:?})"),
        }
    }
}

/// Wildcard for a `T` parameter
#[inline]
#[must_use]
pub fn any<T: 'static>() -> ArgumentMatcher {
    ArgumentMatcher::Wildcard(ParamType::of::<T>())
}

/// Literal match on `value`
///
/// The value is moved in now, so later changes to the caller's variables
/// cannot alter the rule.
#[inline]
#[must_use]
pub fn eq<T: Argument>(value: T) -> ArgumentMatcher {
    ArgumentMatcher::Literal(arg(value))
}

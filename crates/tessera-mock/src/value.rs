//! Dynamically typed argument values
//!
//! Call sites hand their arguments to the engine as [`Arg`]s so that rules
//! for members of any arity and parameter type share one representation.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Type identity of a parameter or return value
///
/// Compares by [`TypeId`]; the name is kept for diagnostics only.
#[derive(Clone, Copy)]
pub struct ParamType {
    id: TypeId,
    name: &'static str,
}

impl ParamType {
    /// Identity of `T`
    #[inline]
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Underlying type id
    #[inline]
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ParamType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ParamType {}

impl Hash for ParamType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A value that can travel through the engine as a call argument
///
/// Blanket-implemented for every `'static` type with `Debug + PartialEq`.
/// Equality across different concrete types is always `false`.
pub trait Argument: Any + fmt::Debug + Send + Sync {
    /// Upcast for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Value equality against another erased argument
    fn dyn_eq(&self, other: &dyn Argument) -> bool;

    /// Type identity of the concrete value
    fn param_type(&self) -> ParamType;
}

impl<T> Argument for T
where
    T: Any + fmt::Debug + PartialEq + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn Argument) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }

    fn param_type(&self) -> ParamType {
        ParamType::of::<T>()
    }
}

/// Shared, type-erased argument value
pub type Arg = Arc<dyn Argument>;

/// Erase a value into an [`Arg`]
#[inline]
pub fn arg<T: Argument>(value: T) -> Arg {
    Arc::new(value)
}

/// Ordered argument snapshot of one call
#[derive(Debug, Clone, Default)]
pub struct Args {
    values: Vec<Arg>,
}

impl Args {
    /// Wrap already-erased values
    #[inline]
    #[must_use]
    pub fn from_values(values: Vec<Arg>) -> Self {
        Self { values }
    }

    /// Typed access to the argument at `index`
    ///
    /// Returns `None` when out of range or of another type.
    #[must_use]
    pub fn get<T: 'static>(&self, index: usize) -> Option<&T> {
        self.values
            .get(index)
            .and_then(|value| value.as_any().downcast_ref::<T>())
    }

    /// Erased argument at `index`
    #[inline]
    #[must_use]
    pub fn raw(&self, index: usize) -> Option<&Arg> {
        self.values.get(index)
    }

    /// Number of arguments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True for zero-arity calls
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate erased arguments in call order
    pub fn iter(&self) -> impl Iterator<Item = &Arg> {
        self.values.iter()
    }

    /// Parameter types of the captured values
    #[must_use]
    pub fn param_types(&self) -> Vec<ParamType> {
        self.values.iter().map(|value| value.param_type()).collect()
    }
}

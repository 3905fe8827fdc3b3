//! Constructor descriptors
//!
//! Types the harness can build declare their constructors up front through
//! [`Constructible`]. Each [`Constructor`] wraps a plain function and derives
//! its parameter types from the function signature.
//!
//! ```
//! use std::sync::Arc;
//! use tessera_harness::{Constructible, Constructor};
//!
//! pub trait Clock: Send + Sync {}
//!
//! #[derive(Clone)]
//! pub struct Audit {
//!     clock: Arc<dyn Clock>,
//! }
//!
//! impl Audit {
//!     pub fn new(clock: Arc<dyn Clock>) -> Self {
//!         Self { clock }
//!     }
//! }
//!
//! impl Constructible for Audit {
//!     fn constructors() -> Vec<Constructor<Self>> {
//!         vec![Constructor::new(Audit::new)]
//!     }
//! }
//! ```

use std::any::Any;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;
use tessera_mock::ParamType;

/// Registered instance, erased
pub type Dependency = Arc<dyn Any + Send + Sync>;

/// A function usable as a constructor
///
/// Implemented for every `Fn(A1, .., An) -> T` with up to eight parameters,
/// each `Clone + Send + Sync + 'static`. `Marker` only disambiguates arities.
pub trait Factory<T, Marker>: Send + Sync + 'static {
    /// Parameter types in declaration order
    fn params() -> Vec<ParamType>;

    /// Call with dependencies in parameter order; `None` on a type mismatch
    fn call(&self, deps: &[Dependency]) -> Option<T>;
}

macro_rules! impl_factory {
    ($($ty:ident $name:ident),*) => {
        impl<T, F, $($ty,)*> Factory<T, fn($($ty,)*) -> T> for F
        where
            F: Fn($($ty),*) -> T + Send + Sync + 'static,
            $($ty: Clone + Send + Sync + 'static,)*
        {
            fn params() -> Vec<ParamType> {
                vec![$(ParamType::of::<$ty>()),*]
            }

            #[allow(unused_mut, unused_variables)]
            fn call(&self, deps: &[Dependency]) -> Option<T> {
                let mut deps = deps.iter();
                $(let $name = deps.next()?.downcast_ref::<$ty>()?.clone();)*
                Some(self($($name),*))
            }
        }
    };
}

impl_factory!();
impl_factory!(A1 a1);
impl_factory!(A1 a1, A2 a2);
impl_factory!(A1 a1, A2 a2, A3 a3);
impl_factory!(A1 a1, A2 a2, A3 a3, A4 a4);
impl_factory!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5);
impl_factory!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6);
impl_factory!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7);
impl_factory!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7, A8 a8);

/// Declarative description of one way to build a `T`
pub struct Constructor<T> {
    params: Vec<ParamType>,
    build: Box<dyn Fn(&[Dependency]) -> Option<T> + Send + Sync>,
}

impl<T: 'static> Constructor<T> {
    /// Describe `factory` as a constructor
    #[must_use]
    pub fn new<F, Marker>(factory: F) -> Self
    where
        F: Factory<T, Marker>,
    {
        Self {
            params: F::params(),
            build: Box::new(move |deps| factory.call(deps)),
        }
    }

    /// Parameter types in order
    #[inline]
    #[must_use]
    pub fn params(&self) -> &[ParamType] {
        &self.params
    }

    /// Parameter count
    #[inline]
    #[must_use]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Parameter list rendered as `(A, B)`
    #[must_use]
    pub fn signature(&self) -> String {
        let names: Vec<&str> = self.params.iter().map(ParamType::name).collect();
        format!("({})", names.join(", "))
    }

    pub(crate) fn invoke(&self, deps: &[Dependency]) -> Option<T> {
        (self.build)(deps)
    }
}

impl<T> fmt::Debug for Constructor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Types the harness may construct when they are not registered
///
/// The default lists no constructors: such types resolve only from a
/// registration.
pub trait Constructible: Sized + 'static {
    /// Public constructors of the type, in any order
    fn constructors() -> Vec<Constructor<Self>> {
        Vec::new()
    }
}

impl<T: ?Sized + 'static> Constructible for Arc<T> {}
impl<T: 'static> Constructible for Option<T> {}
impl<T: 'static> Constructible for Vec<T> {}
impl<T: 'static> Constructible for VecDeque<T> {}
impl<T: 'static> Constructible for HashSet<T> {}
impl<K: 'static, V: 'static> Constructible for HashMap<K, V> {}
impl<K: 'static, V: 'static> Constructible for BTreeMap<K, V> {}

macro_rules! registration_only {
    ($($ty:ty),* $(,)?) => {
        $(impl Constructible for $ty {})*
    };
}

registration_only!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, String,
);

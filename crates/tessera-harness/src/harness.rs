//! Per-test registration table and constructor-based resolver
//!
//! # Resolution
//!
//! [`Harness::resolve`] first looks the type up directly. Otherwise it tries
//! the type's constructors, most parameters first, and invokes the first one
//! whose every parameter is registered. Constructed instances are not cached:
//! each call may build a new one.

use crate::constructor::{Constructible, Dependency};
use crate::error::{ConstructorAttempt, ResolveError};
use parking_lot::RwLock;
use std::any::{type_name, TypeId};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tessera_mock::ParamType;

/// Releases resources held by a registered instance
///
/// Every type registered with
/// [`HarnessBuilder::with_dependency`](crate::HarnessBuilder::with_dependency)
/// implements this trait. The default `dispose` does nothing, so types
/// without resources opt in with an empty impl:
///
/// ```
/// use tessera_harness::Disposable;
///
/// #[derive(Clone)]
/// pub struct Port(pub u16);
///
/// impl Disposable for Port {}
/// ```
///
/// Contracts registered directly as `Arc<dyn Trait>` need
/// `impl Disposable for dyn Trait {}`; mocks registered through
/// [`HarnessBuilder::with_mock`](crate::HarnessBuilder::with_mock) do not.
pub trait Disposable: Send + Sync {
    /// Release held resources; called at most once per harness
    fn dispose(&self) {}
}

impl<T: Disposable + ?Sized> Disposable for Arc<T> {
    fn dispose(&self) {
        (**self).dispose();
    }
}

impl<T: Disposable> Disposable for Option<T> {
    fn dispose(&self) {
        if let Some(value) = self {
            value.dispose();
        }
    }
}

impl<T: Disposable> Disposable for Vec<T> {
    fn dispose(&self) {
        self.iter().for_each(Disposable::dispose);
    }
}

impl<T: Disposable> Disposable for VecDeque<T> {
    fn dispose(&self) {
        self.iter().for_each(Disposable::dispose);
    }
}

impl<T: Disposable> Disposable for HashSet<T> {
    fn dispose(&self) {
        self.iter().for_each(Disposable::dispose);
    }
}

impl<K: Send + Sync, V: Disposable> Disposable for HashMap<K, V> {
    fn dispose(&self) {
        self.values().for_each(Disposable::dispose);
    }
}

impl<K: Send + Sync, V: Disposable> Disposable for BTreeMap<K, V> {
    fn dispose(&self) {
        self.values().for_each(Disposable::dispose);
    }
}

macro_rules! nothing_to_dispose {
    ($($ty:ty),* $(,)?) => {
        $(impl Disposable for $ty {})*
    };
}

nothing_to_dispose!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, String,
);

/// One entry of the registration table
#[derive(Clone)]
pub(crate) struct Registration {
    pub(crate) value: Dependency,
    pub(crate) type_name: &'static str,
    pub(crate) disposer: Option<fn(&Dependency)>,
}

impl Registration {
    /// Entry released through its [`Disposable`] impl
    pub(crate) fn new<T: Disposable + 'static>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_name: type_name::<T>(),
            disposer: Some(dispose_as::<T>),
        }
    }

    /// Entry with nothing to release, used for mock proxies
    pub(crate) fn untracked<T: Send + Sync + 'static>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_name: type_name::<T>(),
            disposer: None,
        }
    }
}

fn dispose_as<T: Disposable + 'static>(value: &Dependency) {
    if let Some(value) = value.downcast_ref::<T>() {
        value.dispose();
    }
}

/// Immutable snapshot of a [`HarnessBuilder`](crate::HarnessBuilder)
pub struct Harness {
    registrations: RwLock<HashMap<TypeId, Registration>>,
    disposed: AtomicBool,
}

impl Harness {
    pub(crate) fn from_registrations(registrations: HashMap<TypeId, Registration>) -> Self {
        Self {
            registrations: RwLock::new(registrations),
            disposed: AtomicBool::new(false),
        }
    }

    /// Registered instance of `T`, cloned out
    ///
    /// Registering an `Arc` makes this return the same allocation.
    #[must_use]
    pub fn get<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
        self.registrations
            .read()
            .get(&TypeId::of::<T>())
            .and_then(|registration| registration.value.downcast_ref::<T>())
            .cloned()
    }

    /// Registered instance of `T`, or one built from its constructors
    ///
    /// # Errors
    /// [`ResolveError::Unresolvable`] when `T` is not registered and none of
    /// its constructors can be satisfied from the registration table.
    pub fn resolve<T>(&self) -> Result<T, ResolveError>
    where
        T: Constructible + Clone + Send + Sync,
    {
        if let Some(instance) = self.get::<T>() {
            return Ok(instance);
        }

        let mut constructors = T::constructors();
        constructors.sort_by(|a, b| b.arity().cmp(&a.arity()));

        let mut attempts = Vec::with_capacity(constructors.len());
        for constructor in &constructors {
            let (deps, missing) = self.collect(constructor.params());
            tracing::debug!(
                target_type = type_name::<T>(),
                constructor = %constructor.signature(),
                missing = missing.len(),
                "resolution attempt"
            );

            if missing.is_empty() {
                if let Some(instance) = constructor.invoke(&deps) {
                    return Ok(instance);
                }
            }
            attempts.push(ConstructorAttempt {
                signature: constructor.signature(),
                missing,
            });
        }

        let err = ResolveError::unresolvable(type_name::<T>(), attempts);
        tracing::warn!(target_type = type_name::<T>(), missing = ?err.missing(), "unresolvable type");
        Err(err)
    }

    fn collect(&self, params: &[ParamType]) -> (Vec<Dependency>, Vec<&'static str>) {
        let registrations = self.registrations.read();
        let mut deps = Vec::with_capacity(params.len());
        let mut missing = Vec::new();
        for param in params {
            match registrations.get(&param.id()) {
                Some(registration) => deps.push(Arc::clone(&registration.value)),
                None => missing.push(param.name()),
            }
        }
        (deps, missing)
    }

    /// Whether `T` has a direct registration
    #[must_use]
    pub fn is_registered<T: 'static>(&self) -> bool {
        self.registrations.read().contains_key(&TypeId::of::<T>())
    }

    /// Number of registrations
    #[must_use]
    pub fn len(&self) -> usize {
        self.registrations.read().len()
    }

    /// Whether nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registrations.read().is_empty()
    }

    /// Names of the registered types, sorted
    #[must_use]
    pub fn registered_types(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self
            .registrations
            .read()
            .values()
            .map(|registration| registration.type_name)
            .collect();
        names.sort_unstable();
        names
    }

    /// Whether [`Self::dispose`] has run
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Dispose every registration and clear the table
    ///
    /// Idempotent; also runs on drop.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }

        let registrations = std::mem::take(&mut *self.registrations.write());
        let mut disposed = 0_usize;
        for registration in registrations.values() {
            if let Some(dispose) = registration.disposer {
                dispose(&registration.value);
                disposed += 1;
            }
        }
        tracing::debug!(
            registrations = registrations.len(),
            disposed,
            "harness disposed"
        );
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Harness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Harness")
            .field("registered", &self.registered_types())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

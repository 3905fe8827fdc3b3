//! Harness registration builder

use crate::error::HarnessError;
use crate::harness::{Disposable, Harness, Registration};
use parking_lot::Mutex;
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tessera_mock::{CallVerifier, Contract, MockBuilder, MockError, VerificationError};

/// Accumulates registrations for a [`Harness`]
///
/// One entry per type; a later registration of the same type overwrites the
/// earlier one.
#[derive(Clone, Default)]
pub struct HarnessBuilder {
    registrations: HashMap<TypeId, Registration>,
}

impl HarnessBuilder {
    /// Empty builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `instance` as the `T` dependency
    ///
    /// Contracts are registered as `Arc<dyn Trait>`. The instance is
    /// disposed with the harness through its [`Disposable`] impl.
    pub fn with_dependency<T>(&mut self, instance: T) -> &mut Self
    where
        T: Disposable + Clone + 'static,
    {
        self.insert::<T>(Registration::new(instance))
    }

    /// Overwrite the `T` registration; identical to [`Self::with_dependency`]
    pub fn replace<T>(&mut self, instance: T) -> &mut Self
    where
        T: Disposable + Clone + 'static,
    {
        self.with_dependency(instance)
    }

    /// Configure a mock of `C` and register its proxy as `Arc<C>`
    ///
    /// # Errors
    /// [`HarnessError::Mock`] when `configure` fails.
    pub fn with_mock<C, F>(&mut self, configure: F) -> Result<&mut Self, HarnessError>
    where
        C: Contract + ?Sized,
        F: FnOnce(&mut MockBuilder<C>) -> Result<(), MockError>,
    {
        self.register_mock(configure).map(|_| self)
    }

    /// Like [`Self::with_mock`], also binding the mock's verifier to `slot`
    ///
    /// Each call rebinds the slot to the newest mock.
    ///
    /// # Errors
    /// [`HarnessError::Mock`] when `configure` fails; the slot is unchanged.
    pub fn with_mock_verified<C, F>(
        &mut self,
        configure: F,
        slot: &VerifierSlot,
    ) -> Result<&mut Self, HarnessError>
    where
        C: Contract + ?Sized,
        F: FnOnce(&mut MockBuilder<C>) -> Result<(), MockError>,
    {
        let verifier = self.register_mock(configure)?;
        slot.bind(verifier);
        Ok(self)
    }

    fn register_mock<C, F>(&mut self, configure: F) -> Result<CallVerifier, HarnessError>
    where
        C: Contract + ?Sized,
        F: FnOnce(&mut MockBuilder<C>) -> Result<(), MockError>,
    {
        let mut builder = MockBuilder::<C>::new();
        configure(&mut builder)?;
        let (proxy, verifier) = builder.build().into_parts();
        self.insert::<Arc<C>>(Registration::untracked(proxy));
        Ok(verifier)
    }

    fn insert<T: 'static>(&mut self, registration: Registration) -> &mut Self {
        if self
            .registrations
            .insert(TypeId::of::<T>(), registration)
            .is_some()
        {
            tracing::debug!(
                dependency = std::any::type_name::<T>(),
                "registration overwritten"
            );
        }
        self
    }

    /// Whether `T` is registered
    #[must_use]
    pub fn is_registered<T: 'static>(&self) -> bool {
        self.registrations.contains_key(&TypeId::of::<T>())
    }

    /// Number of registrations
    #[must_use]
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Whether nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Snapshot the table into a harness
    ///
    /// The builder stays usable; later changes do not reach built harnesses.
    #[must_use]
    pub fn build(&self) -> Harness {
        tracing::debug!(registrations = self.registrations.len(), "harness built");
        Harness::from_registrations(self.registrations.clone())
    }
}

impl fmt::Debug for HarnessBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self
            .registrations
            .values()
            .map(|registration| registration.type_name)
            .collect();
        names.sort_unstable();
        f.debug_struct("HarnessBuilder")
            .field("registered", &names)
            .finish()
    }
}

/// Output binding for a mock's verifier
///
/// Cheap to clone; clones share the binding.
#[derive(Clone, Default)]
pub struct VerifierSlot {
    inner: Arc<Mutex<Option<CallVerifier>>>,
}

impl VerifierSlot {
    /// Unbound slot
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind to `verifier`, replacing any earlier binding
    pub fn bind(&self, verifier: CallVerifier) {
        *self.inner.lock() = Some(verifier);
    }

    /// The currently bound verifier
    ///
    /// # Errors
    /// [`VerificationError::Unbound`] before the first bind.
    pub fn current(&self) -> Result<CallVerifier, VerificationError> {
        self.inner.lock().clone().ok_or(VerificationError::Unbound)
    }

    /// Whether a verifier is bound
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.inner.lock().is_some()
    }
}

impl fmt::Debug for VerifierSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifierSlot")
            .field("bound", &self.is_bound())
            .finish()
    }
}

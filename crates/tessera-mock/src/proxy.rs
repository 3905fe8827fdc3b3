//! Contract proxies
//!
//! A contract is an ordinary trait with `Send + Sync` supertraits. The
//! [`mock_contract!`](crate::mock_contract) macro generates, per contract, a
//! proxy struct whose every method forwards `(member, args)` to
//! [`ProxyCore::dispatch`], plus the [`Contract`] impl on `dyn Trait` that
//! describes the contract shape and binds proxies to engines.
//!
//! Shapes are built once per contract type and cached process-wide; only the
//! bound engine varies per proxy.

use crate::engine::BehaviorEngine;
use crate::error::MockError;
use crate::outcome::Reply;
use crate::signature::{ContractShape, Returnable};
use crate::value::Args;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

/// A mockable contract, implemented for `dyn Trait`
///
/// Usually generated by [`mock_contract!`](crate::mock_contract).
pub trait Contract: Send + Sync + 'static {
    /// Describe every member of the contract
    fn describe() -> ContractShape;

    /// Create a proxy forwarding every call to `core`
    fn bind(core: ProxyCore) -> Arc<Self>;
}

/// Dispatch handle held by every generated proxy
#[derive(Clone)]
pub struct ProxyCore {
    engine: Arc<BehaviorEngine>,
}

impl ProxyCore {
    /// Bind to an engine
    #[inline]
    #[must_use]
    pub fn new(engine: Arc<BehaviorEngine>) -> Self {
        Self { engine }
    }

    /// Bound engine
    #[inline]
    #[must_use]
    pub fn engine(&self) -> &Arc<BehaviorEngine> {
        &self.engine
    }

    /// Forward a call on `method` to the engine and convert its reply
    ///
    /// Unmatched calls return `R::neutral()`. A fault is handed back as a
    /// value when `R` can carry it (`Result<_, E>` with a fault of type `E`)
    /// and raised as a panic carrying the fault otherwise. A computed value
    /// of the wrong type is raised as a [`MockError::ReturnTypeMismatch`]
    /// panic.
    pub fn dispatch<R: Returnable>(&self, method: &'static str, args: Args) -> R {
        let Some(member) = self.engine.shape().by_method(method) else {
            tracing::warn!(
                mock = %self.engine.label(),
                method,
                "call to a method missing from the contract shape"
            );
            return R::neutral();
        };

        match self.engine.invoke(member, args) {
            Ok(Reply::Value(value)) => {
                if let Some(value) = value.downcast_ref::<R>() {
                    return value.clone();
                }
                let mismatch = MockError::ReturnTypeMismatch {
                    member: method.to_string(),
                    expected: std::any::type_name::<R>(),
                    actual: "a value of another type",
                };
                tracing::error!(
                    mock = %self.engine.label(),
                    %mismatch,
                    "computed value has the wrong type"
                );
                std::panic::panic_any(mismatch)
            }
            Ok(Reply::Neutral) => R::neutral(),
            Err(fault) => match R::from_fault(&fault) {
                Some(value) => value,
                None => fault.raise(),
            },
        }
    }
}

impl fmt::Debug for ProxyCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyCore")
            .field("mock", &self.engine.label())
            .field("calls", &self.engine.invocation_count())
            .finish()
    }
}

static SHAPES: Lazy<DashMap<TypeId, Arc<ContractShape>>> = Lazy::new(DashMap::new);

/// Creates proxies and owns the process-wide shape cache
#[derive(Debug, Clone, Copy, Default)]
pub struct ProxyFactory;

impl ProxyFactory {
    /// Shape of contract `C`, described on first use
    #[must_use]
    pub fn shape<C: Contract + ?Sized>() -> Arc<ContractShape> {
        let key = TypeId::of::<C>();
        if let Some(shape) = SHAPES.get(&key) {
            return Arc::clone(shape.value());
        }

        let entry = SHAPES.entry(key).or_insert_with(|| {
            let shape = C::describe();
            tracing::debug!(
                contract = shape.contract(),
                members = shape.len(),
                "cached contract shape"
            );
            Arc::new(shape)
        });
        Arc::clone(entry.value())
    }

    /// Bind a new proxy for `C` to `engine`
    #[must_use]
    pub fn create<C: Contract + ?Sized>(engine: Arc<BehaviorEngine>) -> Arc<C> {
        C::bind(ProxyCore::new(engine))
    }

    /// Number of cached contract shapes
    #[must_use]
    pub fn cached_shapes() -> usize {
        SHAPES.len()
    }
}

/// Generate a proxy for a contract trait
///
/// The member list mirrors the trait's methods. Parameters must be owned
/// `Debug + PartialEq + Send + Sync + 'static` values and return types must
/// implement [`Returnable`]. `#[member = "name"]` makes a method an overload
/// of another member name.
///
/// ```
/// use tessera_mock::{mock_contract, MockBuilder, eq};
///
/// pub trait Pricing: Send + Sync {
///     fn price(&self, sku: String) -> u32;
///     fn price_in(&self, sku: String, currency: String) -> u32;
/// }
///
/// mock_contract! {
///     pub struct PricingProxy for dyn Pricing {
///         fn price(&self, sku: String) -> u32;
///         #[member = "price"]
///         fn price_in(&self, sku: String, currency: String) -> u32;
///     }
/// }
///
/// # fn main() -> Result<(), tessera_mock::MockError> {
/// let mut builder = MockBuilder::<dyn Pricing>::new();
/// builder.given("price", [eq(String::from("A1"))])?.then_returns(12_u32)?;
/// let mock = builder.build();
///
/// assert_eq!(mock.proxy.price(String::from("A1")), 12);
/// assert_eq!(mock.proxy.price_in(String::from("A1"), String::from("EUR")), 0);
/// assert_eq!(mock.verifier.call_count("price"), 2);
/// # Ok(())
/// # }
/// ```
#[macro_export]
macro_rules! mock_contract {
    (
        $(#[$meta:meta])*
        $vis:vis struct $proxy:ident for dyn $contract:path {
            $(
                $(#[member = $alias:literal])?
                fn $method:ident(&self $(, $arg:ident : $ty:ty)* $(,)?) $(-> $ret:ty)?;
            )*
        }
    ) => {
        $(#[$meta])*
        $vis struct $proxy {
            core: $crate::ProxyCore,
        }

        impl ::std::fmt::Debug for $proxy {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.debug_struct(::std::stringify!($proxy))
                    .field("core", &self.core)
                    .finish()
            }
        }

        impl $contract for $proxy {
            $(
                fn $method(&self $(, $arg: $ty)*) -> $crate::__return_type!($($ret)?) {
                    self.core.dispatch(
                        ::std::stringify!($method),
                        $crate::Args::from_values(::std::vec![$($crate::arg($arg)),*]),
                    )
                }
            )*
        }

        impl $crate::Contract for dyn $contract {
            fn describe() -> $crate::ContractShape {
                $crate::ContractShape::new(::std::stringify!($contract))
                    $(
                        .with_member($crate::CallSignature::of::<$crate::__return_type!($($ret)?)>(
                            ::std::stringify!($method),
                            $crate::__member_name!($method $(, $alias)?),
                            ::std::vec![$($crate::ParamType::of::<$ty>()),*],
                        ))
                    )*
            }

            fn bind(core: $crate::ProxyCore) -> ::std::sync::Arc<Self> {
                ::std::sync::Arc::new($proxy { core })
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __return_type {
    () => { () };
    ($ret:ty) => { $ret };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __member_name {
    ($method:ident) => { ::std::stringify!($method) };
    ($method:ident, $alias:literal) => { $alias };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::MockBuilder;
    use crate::matcher::{any, eq};

    trait Ledger: Send + Sync {
        fn balance(&self, account: u32) -> i64;
        fn owner(&self, account: u32) -> Option<String>;
        fn close(&self, account: u32);
    }

    crate::mock_contract! {
        struct LedgerProxy for dyn Ledger {
            fn balance(&self, account: u32) -> i64;
            fn owner(&self, account: u32) -> Option<String>;
            fn close(&self, account: u32);
        }
    }

    #[test]
    fn shape_lists_members_in_declaration_order() {
        let shape = ProxyFactory::shape::<dyn Ledger>();
        let names: Vec<_> = shape.members().map(|(_, s)| s.name()).collect();
        assert_eq!(names, ["balance", "owner", "close"]);
        assert_eq!(shape.contract(), "Ledger");
    }

    #[test]
    fn shape_is_described_once() {
        let first = ProxyFactory::shape::<dyn Ledger>();
        let second = ProxyFactory::shape::<dyn Ledger>();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(ProxyFactory::cached_shapes() >= 1);
    }

    #[test]
    fn unit_members_are_recorded() {
        let mock = MockBuilder::<dyn Ledger>::new().build();
        mock.proxy.close(7);
        assert_eq!(mock.verifier.call_count("close"), 1);
    }

    #[test]
    fn configured_values_flow_through_proxy() {
        let mut builder = MockBuilder::<dyn Ledger>::new();
        builder
            .given("balance", [eq(1_u32)])
            .unwrap()
            .then_returns(250_i64)
            .unwrap();
        builder
            .given("owner", [any::<u32>()])
            .unwrap()
            .then_returns(Some(String::from("ada")))
            .unwrap();
        let mock = builder.build();

        assert_eq!(mock.proxy.balance(1), 250);
        assert_eq!(mock.proxy.balance(2), 0);
        assert_eq!(mock.proxy.owner(9).as_deref(), Some("ada"));
    }

    #[test]
    fn mistyped_computed_value_is_raised() {
        use crate::engine::BehaviorRule;
        use crate::outcome::{Computation, Outcome, ReturnValue};
        use std::panic::{catch_unwind, AssertUnwindSafe};

        let engine = Arc::new(BehaviorEngine::new(ProxyFactory::shape::<dyn Ledger>()));
        let balance = engine.shape().by_method("balance").unwrap();
        let compute: Computation = Arc::new(|_: &Args| -> ReturnValue { Arc::new(1_u8) });
        engine
            .register_behavior(BehaviorRule::new(
                balance,
                vec![any::<u32>()],
                Outcome::Compute(compute),
            ))
            .unwrap();
        let ledger = ProxyFactory::create::<dyn Ledger>(Arc::clone(&engine));

        let payload = catch_unwind(AssertUnwindSafe(|| ledger.balance(3))).unwrap_err();
        assert!(matches!(
            payload.downcast_ref::<MockError>(),
            Some(MockError::ReturnTypeMismatch { .. })
        ));
        assert_eq!(engine.invocation_count(), 1);
    }

    #[test]
    fn proxies_share_shape_but_not_engines() {
        let a = MockBuilder::<dyn Ledger>::new().build();
        let b = MockBuilder::<dyn Ledger>::new().build();
        a.proxy.close(1);

        assert_eq!(a.verifier.call_count("close"), 1);
        assert_eq!(b.verifier.call_count("close"), 0);
    }
}

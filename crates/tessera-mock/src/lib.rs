//! Tessera Mock - contract proxies for unit tests
//!
//! Synthesizes fake implementations of contract traits and lets a test:
//! - Declare how calls respond (`given` shape, then an outcome)
//! - Replay the first matching rule, in registration order
//! - Fall back to a neutral default for unmatched calls
//! - Verify recorded calls by member name
//!
//! # Example
//!
//! ```rust
//! use tessera_mock::{any, eq, mock_contract, MockBuilder};
//!
//! pub trait Calculator: Send + Sync {
//!     fn add(&self, a: i32, b: i32) -> i32;
//! }
//!
//! mock_contract! {
//!     pub struct CalculatorProxy for dyn Calculator {
//!         fn add(&self, a: i32, b: i32) -> i32;
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut calculator = MockBuilder::<dyn Calculator>::new();
//! calculator.given("add", [eq(1), eq(2)])?.then_returns(5)?;
//! calculator.given("add", [any::<i32>(), any::<i32>()])?.then_returns(42)?;
//! let mock = calculator.build();
//!
//! assert_eq!(mock.proxy.add(1, 2), 5);
//! assert_eq!(mock.proxy.add(9, 9), 42);
//! mock.verifier.should_have_been_called_times("add", 2)?;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod builder;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod outcome;
pub mod proxy;
pub mod signature;
pub mod value;
pub mod verifier;

// Re-exports for convenience
pub use builder::{Mock, MockBuilder};
pub use engine::{BehaviorEngine, BehaviorRule, InvocationRecord};
pub use error::{MockError, VerificationError};
pub use matcher::{any, eq, ArgumentMatcher};
pub use outcome::{Computation, Fault, FaultPayload, Outcome, Reply, ReturnValue};
pub use proxy::{Contract, ProxyCore, ProxyFactory};
pub use signature::{
    completed, CallSignature, ContractShape, Deferred, MemberId, ReturnShape, Returnable,
};
pub use value::{arg, Arg, Args, Argument, ParamType};
pub use verifier::CallVerifier;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for configuring and verifying mocks
    pub use crate::{
        any, completed, eq, mock_contract, Args, CallVerifier, Contract, Deferred, Mock,
        MockBuilder, MockError, VerificationError,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Tessera Harness - per-test dependency resolution and scenarios
//!
//! Builds the system under test from registered dependencies and mocks:
//! - Registers plain instances, disposables and configured mocks
//! - Resolves types by direct lookup, then by declared constructors
//! - Reports every unmet constructor parameter when resolution fails
//! - Drives Arrange/Act/Assert over a fresh harness per act
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tessera_harness::{Constructible, Constructor, HarnessBuilder, VerifierSlot};
//! use tessera_mock::{any, mock_contract};
//!
//! pub trait Outbox: Send + Sync {
//!     fn push(&self, message: String) -> bool;
//! }
//!
//! mock_contract! {
//!     pub struct OutboxProxy for dyn Outbox {
//!         fn push(&self, message: String) -> bool;
//!     }
//! }
//!
//! #[derive(Clone)]
//! pub struct Signup {
//!     outbox: Arc<dyn Outbox>,
//! }
//!
//! impl Constructible for Signup {
//!     fn constructors() -> Vec<Constructor<Self>> {
//!         vec![Constructor::new(|outbox: Arc<dyn Outbox>| Signup { outbox })]
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let outbox = VerifierSlot::new();
//! let mut builder = HarnessBuilder::new();
//! builder.with_mock_verified::<dyn Outbox, _>(
//!     |m| {
//!         m.given("push", [any::<String>()])?.then_returns(true)?;
//!         Ok(())
//!     },
//!     &outbox,
//! )?;
//!
//! let harness = builder.build();
//! let signup = harness.resolve::<Signup>()?;
//! assert!(signup.outbox.push(String::from("welcome")));
//! outbox.current()?.should_have_been_called("push")?;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod assertions;
pub mod builder;
pub mod cancellation;
pub mod config;
pub mod constructor;
pub mod error;
pub mod harness;
pub mod scenario;
pub mod telemetry;

// Re-exports for convenience
pub use assertions::ResultAssertions;
pub use builder::{HarnessBuilder, VerifierSlot};
pub use cancellation::CancellationToken;
pub use config::ScenarioConfig;
pub use constructor::{Constructible, Constructor, Dependency, Factory};
pub use error::{AssertionError, ConstructorAttempt, HarnessError, ResolveError, ScenarioError};
pub use harness::{Disposable, Harness};
pub use scenario::{Scenario, ScenarioState};
pub use telemetry::init_tracing;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for arranging, acting and asserting
    pub use crate::{
        CancellationToken, Constructible, Constructor, Disposable, Harness, HarnessBuilder,
        Scenario, ScenarioError, VerifierSlot,
    };
    pub use tessera_mock::prelude::*;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

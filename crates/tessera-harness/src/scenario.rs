//! Arrange/Act/Assert orchestration
//!
//! Arrange callbacks accumulate and are replayed, in order, into a fresh
//! [`HarnessBuilder`] on every act. Each act therefore runs against a new
//! harness and new mocks: call history of a mock from an earlier act is not
//! carried over, and a [`VerifierSlot`](crate::VerifierSlot) bound inside an
//! arrange callback is rebound to the newest mock.
//!
//! ```
//! use tessera_harness::{Constructible, Constructor, Scenario};
//!
//! #[derive(Clone)]
//! struct Doubler;
//!
//! impl Constructible for Doubler {
//!     fn constructors() -> Vec<Constructor<Self>> {
//!         vec![Constructor::new(|| Doubler)]
//!     }
//! }
//!
//! # fn main() -> Result<(), tessera_harness::ScenarioError> {
//! let mut scenario = Scenario::for_sync_handler(|_: Doubler, n: u32| n * 2);
//! assert_eq!(scenario.act_blocking(21)?, 42);
//! scenario.assert_result(|result| {
//!     result.have_value(42)?;
//!     Ok(())
//! })?;
//! # Ok(())
//! # }
//! ```

use crate::assertions::ResultAssertions;
use crate::builder::HarnessBuilder;
use crate::cancellation::CancellationToken;
use crate::config::ScenarioConfig;
use crate::constructor::Constructible;
use crate::error::{AssertionError, HarnessError, ScenarioError};
use crate::harness::Harness;
use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::Instrument;

/// Lifecycle of a [`Scenario`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenarioState {
    /// No arrange callback yet
    Unarranged,

    /// At least one arrange callback, no completed act
    Arranged,

    /// At least one act completed; a result is available
    Acted,
}

type Arranger = Box<dyn Fn(&mut HarnessBuilder) -> Result<(), HarnessError> + Send + Sync>;

type ActFn<In, Out> = Box<
    dyn Fn(Arc<Harness>, In, CancellationToken) -> BoxFuture<'static, Result<Out, ScenarioError>>
        + Send
        + Sync,
>;

/// Arrange/Act/Assert driver
pub struct Scenario<In, Out> {
    config: ScenarioConfig,
    arrangers: Vec<Arranger>,
    act: ActFn<In, Out>,
    state: ScenarioState,
    last: Option<Out>,
}

impl<In, Out> Scenario<In, Out>
where
    In: Send + 'static,
    Out: Clone + Send + 'static,
{
    /// Scenario whose act receives the harness directly
    #[must_use]
    pub fn for_act<F, Fut>(act: F) -> Self
    where
        F: Fn(Arc<Harness>, In, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Out, ScenarioError>> + Send + 'static,
    {
        Self {
            config: ScenarioConfig::default(),
            arrangers: Vec::new(),
            act: Box::new(
                move |harness: Arc<Harness>, input: In, token: CancellationToken| {
                    act(harness, input, token).boxed()
                },
            ),
            state: ScenarioState::Unarranged,
            last: None,
        }
    }

    /// Scenario resolving `H` from the harness and awaiting `handler`
    #[must_use]
    pub fn for_handler<H, F, Fut>(handler: F) -> Self
    where
        H: Constructible + Clone + Send + Sync,
        F: Fn(H, In, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Out> + Send + 'static,
    {
        let handler = Arc::new(handler);
        Self::for_act(move |harness, input, token| {
            run_handler::<H, _, _, _, _>(harness, Arc::clone(&handler), input, token)
        })
    }

    /// Scenario resolving `H` from the harness and calling `handler`
    #[must_use]
    pub fn for_sync_handler<H, F>(handler: F) -> Self
    where
        H: Constructible + Clone + Send + Sync,
        F: Fn(H, In) -> Out + Send + Sync + 'static,
    {
        Self::for_handler(move |resolved: H, input: In, _token: CancellationToken| {
            futures::future::ready(handler(resolved, input))
        })
    }

    /// With configuration
    #[must_use]
    pub fn with_config(mut self, config: ScenarioConfig) -> Self {
        self.config = config;
        self
    }

    /// Append an arrange callback
    ///
    /// Callbacks run on every act, in the order added; later registrations
    /// for a type overwrite earlier ones.
    pub fn arrange<F>(&mut self, arrange: F) -> &mut Self
    where
        F: Fn(&mut HarnessBuilder) -> Result<(), HarnessError> + Send + Sync + 'static,
    {
        self.arrangers.push(Box::new(arrange));
        if self.state == ScenarioState::Unarranged {
            self.state = ScenarioState::Arranged;
        }
        self
    }

    /// Run the act with a fresh cancellation token
    ///
    /// # Errors
    /// See [`Self::act_with_cancellation`].
    pub async fn act(&mut self, input: In) -> Result<Out, ScenarioError> {
        self.act_with_cancellation(input, CancellationToken::new())
            .await
    }

    /// Replay arrangements into a new harness, run the act, dispose the
    /// harness and keep the result
    ///
    /// `token` is handed to the act unchanged. A failed act leaves the state
    /// and the previous result untouched.
    ///
    /// # Errors
    /// - [`ScenarioError::Arrange`] when an arrange callback fails
    /// - [`ScenarioError::Resolve`] when the handler cannot be resolved
    /// - whatever the act operation returns
    pub async fn act_with_cancellation(
        &mut self,
        input: In,
        token: CancellationToken,
    ) -> Result<Out, ScenarioError> {
        let mut builder = HarnessBuilder::new();
        for arrange in &self.arrangers {
            arrange(&mut builder)?;
        }
        let harness = Arc::new(builder.build());

        let span = tracing::info_span!(
            "scenario.act",
            scenario = %self.config.name,
            arrangers = self.arrangers.len()
        );
        let outcome = (self.act)(Arc::clone(&harness), input, token)
            .instrument(span)
            .await;
        harness.dispose();

        let result = outcome?;
        self.last = Some(result.clone());
        self.state = ScenarioState::Acted;
        Ok(result)
    }

    /// Drive [`Self::act`] to completion on the current thread
    ///
    /// # Errors
    /// See [`Self::act_with_cancellation`].
    pub fn act_blocking(&mut self, input: In) -> Result<Out, ScenarioError> {
        futures::executor::block_on(self.act(input))
    }

    /// Run assertion predicates against the last result
    ///
    /// # Errors
    /// [`ScenarioError::NotActed`] before the first completed act, or the
    /// first failing assertion.
    pub fn assert_result<F>(&self, check: F) -> Result<(), ScenarioError>
    where
        Out: fmt::Debug,
        F: FnOnce(&ResultAssertions<'_, Out>) -> Result<(), AssertionError>,
    {
        let last = match (&self.state, &self.last) {
            (ScenarioState::Acted, Some(last)) => last,
            _ => return Err(ScenarioError::NotActed),
        };
        check(&ResultAssertions::new(last))?;
        Ok(())
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn state(&self) -> ScenarioState {
        self.state
    }

    /// Result of the last completed act
    #[inline]
    #[must_use]
    pub fn last_result(&self) -> Option<&Out> {
        self.last.as_ref()
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }
}

async fn run_handler<H, In, Out, F, Fut>(
    harness: Arc<Harness>,
    handler: Arc<F>,
    input: In,
    token: CancellationToken,
) -> Result<Out, ScenarioError>
where
    H: Constructible + Clone + Send + Sync,
    F: Fn(H, In, CancellationToken) -> Fut,
    Fut: Future<Output = Out>,
{
    let resolved = harness.resolve::<H>()?;
    drop(harness);
    Ok(handler(resolved, input, token).await)
}

impl<In, Out: fmt::Debug> fmt::Debug for Scenario<In, Out> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("config", &self.config)
            .field("arrangers", &self.arrangers.len())
            .field("state", &self.state)
            .field("last", &self.last)
            .finish_non_exhaustive()
    }
}

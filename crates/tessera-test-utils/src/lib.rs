//! Testing utilities for Tessera workspace
//!
//! Shared contracts, proxies, handlers and fixtures.

#![allow(missing_docs)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tessera_harness::{CancellationToken, Constructible, Constructor, Disposable};
use tessera_mock::{mock_contract, Deferred};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MathFault {
    #[error("division by zero")]
    DivideByZero,
    #[error("arithmetic overflow")]
    Overflow,
}

pub trait Calculator: Send + Sync {
    fn add(&self, a: i32, b: i32) -> i32;
    fn add_f64(&self, a: f64, b: f64) -> f64;
    fn divide(&self, a: i32, b: i32) -> Result<i32, MathFault>;
    fn multiply_async(&self, a: i32, b: i32) -> Deferred<i32>;
    fn get_text(&self) -> Option<String>;
    fn reset(&self);
}

mock_contract! {
    /// Proxy for [`Calculator`]; `add_f64` is the `f64` overload of `add`
    pub struct CalculatorProxy for dyn Calculator {
        fn add(&self, a: i32, b: i32) -> i32;
        #[member = "add"]
        fn add_f64(&self, a: f64, b: f64) -> f64;
        fn divide(&self, a: i32, b: i32) -> Result<i32, MathFault>;
        fn multiply_async(&self, a: i32, b: i32) -> Deferred<i32>;
        fn get_text(&self) -> Option<String>;
        fn reset(&self);
    }
}

pub trait Greeter: Send + Sync {
    fn greet(&self, name: String) -> String;
}

mock_contract! {
    pub struct GreeterProxy for dyn Greeter {
        fn greet(&self, name: String) -> String;
    }
}

pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

impl Disposable for dyn Clock {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now_millis(&self) -> u64 {
        self.0
    }
}

pub fn fixed_clock(millis: u64) -> Arc<dyn Clock> {
    Arc::new(FixedClock(millis))
}

/// Single-constructor handler over a calculator
#[derive(Clone)]
pub struct SumHandler {
    calculator: Arc<dyn Calculator>,
}

impl SumHandler {
    pub fn new(calculator: Arc<dyn Calculator>) -> Self {
        Self { calculator }
    }

    pub fn handle(&self, (a, b): (i32, i32)) -> i32 {
        self.calculator.add(a, b)
    }

    pub fn calculator(&self) -> &Arc<dyn Calculator> {
        &self.calculator
    }
}

impl Constructible for SumHandler {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::new(SumHandler::new)]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub total: i32,
    pub stamped_at: Option<u64>,
}

/// Two constructors: with and without a clock
#[derive(Clone)]
pub struct ReportHandler {
    calculator: Arc<dyn Calculator>,
    clock: Option<Arc<dyn Clock>>,
}

impl ReportHandler {
    pub fn new(calculator: Arc<dyn Calculator>) -> Self {
        Self {
            calculator,
            clock: None,
        }
    }

    pub fn with_clock(calculator: Arc<dyn Calculator>, clock: Arc<dyn Clock>) -> Self {
        Self {
            calculator,
            clock: Some(clock),
        }
    }

    pub fn handle(&self, a: i32, b: i32) -> Report {
        Report {
            total: self.calculator.add(a, b),
            stamped_at: self.clock.as_ref().map(|clock| clock.now_millis()),
        }
    }
}

impl Constructible for ReportHandler {
    fn constructors() -> Vec<Constructor<Self>> {
        // Declared narrowest first; the harness orders by parameter count.
        vec![
            Constructor::new(ReportHandler::new),
            Constructor::new(ReportHandler::with_clock),
        ]
    }
}

/// Asynchronous handler observing cancellation
#[derive(Clone)]
pub struct GreetingHandler {
    greeter: Arc<dyn Greeter>,
}

impl GreetingHandler {
    pub fn new(greeter: Arc<dyn Greeter>) -> Self {
        Self { greeter }
    }

    pub async fn handle(self, name: String, token: CancellationToken) -> Option<String> {
        if token.is_cancelled() {
            return None;
        }
        Some(self.greeter.greet(name))
    }
}

impl Constructible for GreetingHandler {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::new(GreetingHandler::new)]
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExpressionFault {
    #[error("syntax error: {0}")]
    Syntax(String),
    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),
}

/// Opaque expression-language collaborator
pub trait ExpressionEvaluator: Send + Sync {
    fn evaluate(&self, expression: String) -> Result<f64, ExpressionFault>;
}

impl Disposable for dyn ExpressionEvaluator {}

mock_contract! {
    pub struct ExpressionEvaluatorProxy for dyn ExpressionEvaluator {
        fn evaluate(&self, expression: String) -> Result<f64, ExpressionFault>;
    }
}

/// Evaluator answering from a fixed table of known expressions
#[derive(Debug, Clone, Default)]
pub struct TableEvaluator {
    known: HashMap<String, f64>,
}

impl TableEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, expression: &str, value: f64) -> Self {
        self.known.insert(expression.to_string(), value);
        self
    }
}

impl ExpressionEvaluator for TableEvaluator {
    fn evaluate(&self, expression: String) -> Result<f64, ExpressionFault> {
        if expression.trim().is_empty() {
            return Err(ExpressionFault::Syntax(String::from("empty expression")));
        }
        self.known
            .get(&expression)
            .copied()
            .ok_or(ExpressionFault::UnknownIdentifier(expression))
    }
}

/// Handler consuming the expression collaborator
#[derive(Clone)]
pub struct FormulaHandler {
    evaluator: Arc<dyn ExpressionEvaluator>,
}

impl FormulaHandler {
    pub fn new(evaluator: Arc<dyn ExpressionEvaluator>) -> Self {
        Self { evaluator }
    }

    pub fn handle(&self, formula: String) -> Result<f64, ExpressionFault> {
        self.evaluator.evaluate(formula)
    }
}

impl Constructible for FormulaHandler {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::new(FormulaHandler::new)]
    }
}

/// Disposable counting its disposals
#[derive(Debug, Clone, Default)]
pub struct TrackingResource {
    disposals: Arc<AtomicUsize>,
}

impl TrackingResource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disposals(&self) -> usize {
        self.disposals.load(Ordering::SeqCst)
    }
}

impl Disposable for TrackingResource {
    fn dispose(&self) {
        self.disposals.fetch_add(1, Ordering::SeqCst);
    }
}

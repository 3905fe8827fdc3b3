//! Behavior engine
//!
//! Owns the ordered behavior rules of one mock, records every invocation and
//! replays the outcome of the first matching rule.
//!
//! # Matching
//!
//! Rules for a member are scanned in registration order and the **first**
//! rule whose matchers accept the arguments wins. Specificity plays no part:
//! a wildcard rule registered before a literal rule shadows it.

use crate::error::MockError;
use crate::matcher::ArgumentMatcher;
use crate::outcome::{Fault, Outcome, Reply};
use crate::signature::{ContractShape, MemberId};
use crate::value::Args;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

/// One declared behavior: member, per-position matchers, outcome
#[derive(Debug, Clone)]
pub struct BehaviorRule {
    member: MemberId,
    matchers: Vec<ArgumentMatcher>,
    outcome: Outcome,
}

impl BehaviorRule {
    /// Create rule
    #[inline]
    #[must_use]
    pub fn new(member: MemberId, matchers: Vec<ArgumentMatcher>, outcome: Outcome) -> Self {
        Self {
            member,
            matchers,
            outcome,
        }
    }

    /// Target member
    #[inline]
    #[must_use]
    pub fn member(&self) -> MemberId {
        self.member
    }

    /// Argument matchers
    #[inline]
    #[must_use]
    pub fn matchers(&self) -> &[ArgumentMatcher] {
        &self.matchers
    }

    /// Configured outcome
    #[inline]
    #[must_use]
    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Whether every position accepts the actual argument
    #[must_use]
    pub fn matches(&self, args: &Args) -> bool {
        self.matchers.len() == args.len()
            && self
                .matchers
                .iter()
                .zip(args.iter())
                .all(|(matcher, actual)| matcher.accepts(actual))
    }
}

/// A recorded call
#[derive(Debug, Clone)]
pub struct InvocationRecord {
    member: MemberId,
    name: &'static str,
    args: Args,
    sequence: u64,
    at: DateTime<Utc>,
}

impl InvocationRecord {
    /// Invoked member
    #[inline]
    #[must_use]
    pub fn member(&self) -> MemberId {
        self.member
    }

    /// Member name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Argument snapshot
    #[inline]
    #[must_use]
    pub fn args(&self) -> &Args {
        &self.args
    }

    /// Position in the engine's record list
    #[inline]
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Wall-clock time of the call
    #[inline]
    #[must_use]
    pub fn at(&self) -> DateTime<Utc> {
        self.at
    }
}

/// Rule store and call recorder of one mock
///
/// Shared between the proxy and its verifier; recording is safe under
/// concurrent calls and never loses a record.
#[derive(Debug)]
pub struct BehaviorEngine {
    label: String,
    shape: Arc<ContractShape>,
    rules: RwLock<HashMap<MemberId, Vec<BehaviorRule>>>,
    calls: Mutex<Vec<InvocationRecord>>,
}

impl BehaviorEngine {
    /// Create engine for a contract shape, labelled with the contract name
    #[must_use]
    pub fn new(shape: Arc<ContractShape>) -> Self {
        Self {
            label: shape.contract().to_string(),
            shape,
            rules: RwLock::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Override the label used in logs and verification messages
    #[inline]
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Label
    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Contract shape this engine serves
    #[inline]
    #[must_use]
    pub fn shape(&self) -> &Arc<ContractShape> {
        &self.shape
    }

    /// Append a rule to its member's list
    ///
    /// Rules are never replaced; later rules only apply when earlier ones
    /// do not match.
    ///
    /// # Errors
    /// - [`MockError::UnknownMember`] if the member is not in the shape
    /// - [`MockError::ArgumentMismatch`] if the matcher count differs from
    ///   the member's arity
    /// - [`MockError::ReturnTypeMismatch`] if a fixed return value is not of
    ///   the member's return type
    pub fn register_behavior(&self, rule: BehaviorRule) -> Result<(), MockError> {
        let signature = self
            .shape
            .member(rule.member())
            .ok_or_else(|| MockError::UnknownMember {
                contract: self.shape.contract(),
                member: format!("#{}", rule.member().index()),
            })?;

        if signature.arity() != rule.matchers().len() {
            return Err(MockError::ArgumentMismatch {
                member: signature.name().to_string(),
                candidates: vec![signature.to_string()],
                actual: rule
                    .matchers()
                    .iter()
                    .map(|matcher| matcher.param_type().name())
                    .collect(),
            });
        }

        if let Outcome::Return(value) = rule.outcome() {
            if (**value).type_id() != signature.returns().id() {
                return Err(MockError::ReturnTypeMismatch {
                    member: signature.to_string(),
                    expected: signature.returns().name(),
                    actual: "a value of another type",
                });
            }
        }

        tracing::debug!(
            mock = %self.label,
            member = %signature,
            outcome = ?rule.outcome(),
            "registered behavior"
        );

        self.rules.write().entry(rule.member()).or_default().push(rule);
        Ok(())
    }

    /// Record the call, then replay the first matching rule's outcome
    ///
    /// # Errors
    /// Returns the configured [`Fault`] when the matched rule is a fault.
    /// Unmatched calls never fail; they yield [`Reply::Neutral`].
    pub fn invoke(&self, member: MemberId, args: Args) -> Result<Reply, Fault> {
        let name = self.shape.member(member).map_or("<unknown>", |s| s.name());

        {
            let mut calls = self.calls.lock();
            let sequence = calls.len() as u64;
            calls.push(InvocationRecord {
                member,
                name,
                args: args.clone(),
                sequence,
                at: Utc::now(),
            });
        }

        let outcome = self
            .rules
            .read()
            .get(&member)
            .and_then(|rules| rules.iter().find(|rule| rule.matches(&args)))
            .map(|rule| rule.outcome().clone());

        tracing::trace!(
            mock = %self.label,
            member = name,
            args = ?args,
            matched = outcome.is_some(),
            "invocation"
        );

        match outcome {
            None => Ok(Reply::Neutral),
            Some(Outcome::Return(value)) => Ok(Reply::Value(value)),
            Some(Outcome::Fault(fault)) => Err(fault),
            Some(Outcome::Compute(compute)) => Ok(Reply::Value(compute(&args))),
        }
    }

    /// Snapshot of all recorded calls in record order
    #[must_use]
    pub fn invocations(&self) -> Vec<InvocationRecord> {
        self.calls.lock().clone()
    }

    /// Number of recorded calls
    #[must_use]
    pub fn invocation_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Number of recorded calls whose member name is `name`
    #[must_use]
    pub fn count_named(&self, name: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|record| record.name() == name)
            .count()
    }

    /// Number of rules registered for `member`
    #[must_use]
    pub fn rule_count(&self, member: MemberId) -> usize {
        self.rules.read().get(&member).map_or(0, Vec::len)
    }
}

//! Call signatures, contract shapes and returnable types
//!
//! A [`ContractShape`] is the declarative description of a contract: one
//! [`CallSignature`] per member. Overloads share a member name and are told
//! apart by their full parameter-type sequence.

use crate::error::MockError;
use crate::outcome::Fault;
use crate::value::ParamType;
use futures::future::Ready;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt;
use std::hash::Hash;

/// Deferred result returned by asynchronous members
///
/// Always already completed; the proxy never wraps or awaits.
pub type Deferred<T> = Ready<T>;

/// Build an already-completed [`Deferred`] value
#[inline]
pub fn completed<T>(value: T) -> Deferred<T> {
    futures::future::ready(value)
}

/// Return-type category of a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnShape {
    /// Returns nothing; the call is only recorded
    Unit,

    /// Plain value; neutral default is zero/false/empty
    Value,

    /// Optional value; neutral default is `None`
    Reference,

    /// Deferred (future-shaped) result
    Deferred,
}

/// Types a mocked member may return
///
/// Supplies the neutral default used when no rule matches, and optionally
/// converts a configured [`Fault`] into a regular return value (`Err(e)` for
/// `Result`-returning members).
///
/// Implement it for your own value types with [`returnable!`](crate::returnable).
pub trait Returnable: Clone + Send + Sync + 'static {
    /// Return-type category
    const SHAPE: ReturnShape;

    /// Value returned when no rule matches
    fn neutral() -> Self;

    /// Convert a fault into a return value, if this type can carry it
    fn from_fault(_fault: &Fault) -> Option<Self> {
        None
    }
}

/// Implement [`Returnable`] as a value-shaped type whose neutral default is
/// `Default::default()`
#[macro_export]
macro_rules! returnable {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::Returnable for $ty {
                const SHAPE: $crate::ReturnShape = $crate::ReturnShape::Value;

                fn neutral() -> Self {
                    <$ty as ::std::default::Default>::default()
                }
            }
        )*
    };
}

returnable!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, String,
);

impl Returnable for () {
    const SHAPE: ReturnShape = ReturnShape::Unit;

    fn neutral() -> Self {}
}

impl<T: Clone + Send + Sync + 'static> Returnable for Option<T> {
    const SHAPE: ReturnShape = ReturnShape::Reference;

    fn neutral() -> Self {
        None
    }
}

impl<T: Clone + Send + Sync + 'static> Returnable for Vec<T> {
    const SHAPE: ReturnShape = ReturnShape::Value;

    fn neutral() -> Self {
        Vec::new()
    }
}

impl<T: Clone + Send + Sync + 'static> Returnable for VecDeque<T> {
    const SHAPE: ReturnShape = ReturnShape::Value;

    fn neutral() -> Self {
        VecDeque::new()
    }
}

impl<K, V> Returnable for HashMap<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    const SHAPE: ReturnShape = ReturnShape::Value;

    fn neutral() -> Self {
        HashMap::new()
    }
}

impl<T> Returnable for HashSet<T>
where
    T: Clone + Eq + Hash + Send + Sync + 'static,
{
    const SHAPE: ReturnShape = ReturnShape::Value;

    fn neutral() -> Self {
        HashSet::new()
    }
}

impl<K, V> Returnable for BTreeMap<K, V>
where
    K: Clone + Ord + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    const SHAPE: ReturnShape = ReturnShape::Value;

    fn neutral() -> Self {
        BTreeMap::new()
    }
}

impl<T, E> Returnable for Result<T, E>
where
    T: Returnable,
    E: Clone + Send + Sync + 'static,
{
    const SHAPE: ReturnShape = T::SHAPE;

    fn neutral() -> Self {
        Ok(T::neutral())
    }

    fn from_fault(fault: &Fault) -> Option<Self> {
        fault.downcast::<E>().map(Err)
    }
}

impl<T: Returnable> Returnable for Deferred<T> {
    const SHAPE: ReturnShape = ReturnShape::Deferred;

    fn neutral() -> Self {
        completed(T::neutral())
    }

    fn from_fault(fault: &Fault) -> Option<Self> {
        T::from_fault(fault).map(completed)
    }
}

/// Index of a member within its [`ContractShape`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberId(usize);

impl MemberId {
    /// Position in declaration order
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Identity of one contract member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSignature {
    method: &'static str,
    name: &'static str,
    params: Vec<ParamType>,
    returns: ParamType,
    shape: ReturnShape,
}

impl CallSignature {
    /// Signature of a member returning `R`
    ///
    /// `method` is the implementing Rust method; `name` is the member name
    /// used for rule declaration and verification (shared by overloads).
    #[must_use]
    pub fn of<R: Returnable>(
        method: &'static str,
        name: &'static str,
        params: Vec<ParamType>,
    ) -> Self {
        Self {
            method,
            name,
            params,
            returns: ParamType::of::<R>(),
            shape: R::SHAPE,
        }
    }

    /// Implementing method
    #[inline]
    #[must_use]
    pub fn method(&self) -> &'static str {
        self.method
    }

    /// Member name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Ordered parameter types
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

    /// Concrete return type
    #[inline]
    #[must_use]
    pub fn returns(&self) -> ParamType {
        self.returns
    }

    /// Return-type category
    #[inline]
    #[must_use]
    pub fn shape(&self) -> ReturnShape {
        self.shape
    }

    /// Whether `params` is exactly this member's parameter sequence
    #[must_use]
    pub fn accepts(&self, params: &[ParamType]) -> bool {
        self.params.as_slice() == params
    }
}

impl fmt::Display for CallSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        write!(f, ") -> {}", self.returns)
    }
}

/// Declarative description of a contract
#[derive(Debug, Clone)]
pub struct ContractShape {
    contract: &'static str,
    members: Vec<CallSignature>,
    by_method: HashMap<&'static str, MemberId>,
}

impl ContractShape {
    /// Empty shape for `contract`
    #[must_use]
    pub fn new(contract: &'static str) -> Self {
        Self {
            contract,
            members: Vec::new(),
            by_method: HashMap::new(),
        }
    }

    /// Append a member
    #[must_use]
    pub fn with_member(mut self, signature: CallSignature) -> Self {
        let id = MemberId(self.members.len());
        self.by_method.insert(signature.method(), id);
        self.members.push(signature);
        self
    }

    /// Contract name
    #[inline]
    #[must_use]
    pub fn contract(&self) -> &'static str {
        self.contract
    }

    /// Signature of member `id`
    #[inline]
    #[must_use]
    pub fn member(&self, id: MemberId) -> Option<&CallSignature> {
        self.members.get(id.0)
    }

    /// Member implemented by `method`
    #[inline]
    #[must_use]
    pub fn by_method(&self, method: &str) -> Option<MemberId> {
        self.by_method.get(method).copied()
    }

    /// Iterate members in declaration order
    pub fn members(&self) -> impl Iterator<Item = (MemberId, &CallSignature)> {
        self.members
            .iter()
            .enumerate()
            .map(|(i, signature)| (MemberId(i), signature))
    }

    /// Number of members
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the contract has no members
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Resolve an overload by member name and full parameter-type sequence
    ///
    /// # Errors
    /// - [`MockError::UnknownMember`] if no member has that name
    /// - [`MockError::ArgumentMismatch`] if no overload takes `params`
    pub fn resolve(&self, name: &str, params: &[ParamType]) -> Result<MemberId, MockError> {
        let mut candidates = Vec::new();
        for (id, signature) in self.members() {
            if signature.name() != name {
                continue;
            }
            if signature.accepts(params) {
                return Ok(id);
            }
            candidates.push(signature.to_string());
        }

        if candidates.is_empty() {
            return Err(MockError::UnknownMember {
                contract: self.contract,
                member: name.to_string(),
            });
        }

        Err(MockError::ArgumentMismatch {
            member: name.to_string(),
            candidates,
            actual: params.iter().map(ParamType::name).collect(),
        })
    }
}

//! Query variables and the arguments of query calls.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::models::Value;

const ID_ALPHABET: [char; 36] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i',
    'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];
const ID_SUFFIX_LEN: usize = 7;

/// Identifier of a query variable, used as the key of constraints and of
/// result-row bindings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VarId(String);

impl VarId {
    /// Allocate a fresh random id (`var_` followed by 7 base-36 characters).
    pub(crate) fn generate() -> Self {
        Self(format!(
            "var_{}",
            nanoid::nanoid!(ID_SUFFIX_LEN, &ID_ALPHABET)
        ))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A typed placeholder for an unbound query slot.
///
/// Two variables are the same iff their ids are equal. The type must be a
/// concrete type: the abstract `Actor` and `Resource` types are not allowed.
#[derive(Debug, Clone, Eq)]
pub struct Variable {
    var_type: String,
    id: VarId,
}

impl Variable {
    /// Declare a new variable of the given type.
    #[must_use]
    pub fn typed(var_type: impl Into<String>) -> Self {
        Self {
            var_type: var_type.into(),
            id: VarId::generate(),
        }
    }

    #[must_use]
    pub fn var_type(&self) -> &str {
        &self.var_type
    }

    #[must_use]
    pub fn id(&self) -> &VarId {
        &self.id
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Variable {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Variable {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

/// One argument of a [`QueryFact`]: either an unbound variable or a
/// concrete value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryArg {
    Var(Variable),
    Val(Value),
}

impl From<Variable> for QueryArg {
    fn from(v: Variable) -> Self {
        Self::Var(v)
    }
}

impl From<&Variable> for QueryArg {
    fn from(v: &Variable) -> Self {
        Self::Var(v.clone())
    }
}

impl From<Value> for QueryArg {
    fn from(v: Value) -> Self {
        Self::Val(v)
    }
}

impl From<&Value> for QueryArg {
    fn from(v: &Value) -> Self {
        Self::Val(v.clone())
    }
}

/// A single relational test, e.g. `allow(User:alice, action, repo)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFact {
    pub predicate: String,
    pub args: Vec<QueryArg>,
}

impl QueryFact {
    #[must_use]
    pub fn new(predicate: impl Into<String>, args: Vec<QueryArg>) -> Self {
        Self {
            predicate: predicate.into(),
            args,
        }
    }
}

/// Build a [`QueryFact`] from any mix of [`Variable`]s and [`Value`]s.
///
/// ```
/// use oso_cloud_sdk::{Value, Variable, query_fact};
///
/// let actor = Value::new("User", "alice");
/// let repo = Variable::typed("Repo");
/// let fact = query_fact!("allow", actor, Value::string("read"), &repo);
/// assert_eq!(fact.args.len(), 3);
/// ```
#[macro_export]
macro_rules! query_fact {
    ($predicate:expr $(, $arg:expr)* $(,)?) => {
        $crate::QueryFact::new($predicate, vec![$($crate::QueryArg::from($arg)),*])
    };
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generated_ids_have_expected_shape() {
        let v = Variable::typed("Repo");
        let id = v.id().as_str();

        assert!(id.starts_with("var_"));
        assert_eq!(id.len(), 4 + ID_SUFFIX_LEN);
        assert!(id[4..].chars().all(|c| ID_ALPHABET.contains(&c)));
        assert_eq!(v.var_type(), "Repo");
    }

    #[test]
    fn ids_are_practically_unique() {
        let ids: HashSet<VarId> = (0..1000)
            .map(|_| Variable::typed("String").id().clone())
            .collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn identity_is_by_id() {
        let a = Variable::typed("Repo");
        let a2 = a.clone();
        let b = Variable::typed("Repo");

        assert_eq!(a, a2);
        assert_ne!(a, b);
    }

    #[test]
    fn macro_accepts_mixed_arguments() {
        let repo = Variable::typed("Repo");
        let fact = crate::query_fact!("allow", Value::new("User", "alice"), Value::string("read"), &repo);

        assert_eq!(fact.predicate, "allow");
        assert_eq!(fact.args[2], QueryArg::Var(repo));
    }
}

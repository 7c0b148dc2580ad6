//! Domain models for Oso Cloud.
//!
//! Facts are the unit of authorization data: a predicate applied to a list of
//! concrete [`Value`]s. Patterns match stored facts by position.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::OsoCloudError;

/// A concrete, fully specified entity or literal, e.g. `User:alice`.
///
/// Both fields must be non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Value {
    #[serde(rename = "type")]
    pub value_type: String,
    pub id: String,
}

impl Value {
    #[must_use]
    pub fn new(value_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            value_type: value_type.into(),
            id: id.into(),
        }
    }

    /// A `String` literal.
    #[must_use]
    pub fn string(s: impl Into<String>) -> Self {
        Self::new("String", s)
    }

    /// An `Integer` literal.
    #[must_use]
    pub fn integer(i: i64) -> Self {
        Self::new("Integer", i.to_string())
    }

    /// A `Boolean` literal.
    #[must_use]
    pub fn boolean(b: bool) -> Self {
        Self::new("Boolean", if b { "true" } else { "false" })
    }

    /// Check that both the type and the id are non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`OsoCloudError::InvalidValue`] naming the empty field.
    pub fn validate(&self) -> Result<(), OsoCloudError> {
        if self.value_type.is_empty() {
            return Err(OsoCloudError::InvalidValue(
                "Value must have a non-empty type".to_owned(),
            ));
        }
        if self.id.is_empty() {
            return Err(OsoCloudError::InvalidValue(
                "Value must have a non-empty id".to_owned(),
            ));
        }
        Ok(())
    }
}

/// A predicate applied to concrete values, e.g.
/// `has_role(User:alice, String:owner, Repo:acme)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub predicate: String,
    pub args: Vec<Value>,
}

impl Fact {
    #[must_use]
    pub fn new(predicate: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            predicate: predicate.into(),
            args,
        }
    }

    /// Validate the predicate and every argument.
    ///
    /// # Errors
    ///
    /// Returns [`OsoCloudError::InvalidValue`] if the predicate is empty or
    /// any argument is invalid.
    pub fn validate(&self) -> Result<(), OsoCloudError> {
        if self.predicate.is_empty() {
            return Err(OsoCloudError::InvalidValue(
                "Fact must have a non-empty predicate".to_owned(),
            ));
        }
        self.args.iter().try_for_each(Value::validate)
    }
}

/// One argument position of a [`FactPattern`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ValuePattern {
    /// Matches any value.
    #[default]
    Any,
    /// Matches any value of the given type.
    OfType(String),
    /// Matches exactly this value.
    Exact(Value),
}

impl ValuePattern {
    fn validate(&self) -> Result<(), OsoCloudError> {
        match self {
            Self::Any => Ok(()),
            Self::OfType(t) if t.is_empty() => Err(OsoCloudError::InvalidValue(
                "ValueOfType must have a non-empty type".to_owned(),
            )),
            Self::OfType(_) => Ok(()),
            Self::Exact(v) => v.validate(),
        }
    }

    pub(crate) fn value_type(&self) -> Option<&str> {
        match self {
            Self::Any => None,
            Self::OfType(t) => Some(t),
            Self::Exact(v) => Some(&v.value_type),
        }
    }

    pub(crate) fn id(&self) -> Option<&str> {
        match self {
            Self::Exact(v) => Some(&v.id),
            Self::Any | Self::OfType(_) => None,
        }
    }
}

impl From<Value> for ValuePattern {
    fn from(value: Value) -> Self {
        Self::Exact(value)
    }
}

impl Serialize for ValuePattern {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Wire<'a> {
            #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
            value_type: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            id: Option<&'a str>,
        }

        Wire {
            value_type: self.value_type(),
            id: self.id(),
        }
        .serialize(serializer)
    }
}

/// Matches stored facts by predicate and per-position [`ValuePattern`]s.
///
/// ```
/// use oso_cloud_sdk::{FactPattern, Value, ValuePattern};
///
/// // every `has_role` fact for alice on any Repo
/// let pattern = FactPattern::new(
///     "has_role",
///     vec![
///         Value::new("User", "alice").into(),
///         ValuePattern::Any,
///         ValuePattern::OfType("Repo".to_owned()),
///     ],
/// );
/// assert_eq!(pattern.args.len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactPattern {
    pub predicate: String,
    pub args: Vec<ValuePattern>,
}

impl FactPattern {
    #[must_use]
    pub fn new(predicate: impl Into<String>, args: Vec<ValuePattern>) -> Self {
        Self {
            predicate: predicate.into(),
            args,
        }
    }

    /// Validate the predicate and every argument pattern.
    ///
    /// # Errors
    ///
    /// Returns [`OsoCloudError::InvalidValue`] for an empty predicate, an empty
    /// `OfType` type or an invalid exact value.
    pub fn validate(&self) -> Result<(), OsoCloudError> {
        if self.predicate.is_empty() {
            return Err(OsoCloudError::InvalidValue(
                "FactPattern must have a non-empty predicate".to_owned(),
            ));
        }
        self.args.iter().try_for_each(ValuePattern::validate)
    }

    /// Query-string encoding used by the fact listing endpoint:
    /// `predicate`, then `args.N.type` / `args.N.id` for constrained positions.
    #[must_use]
    pub fn to_query_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("predicate".to_owned(), self.predicate.clone())];
        for (i, arg) in self.args.iter().enumerate() {
            if let Some(t) = arg.value_type() {
                params.push((format!("args.{i}.type"), t.to_owned()));
            }
            if let Some(id) = arg.id() {
                params.push((format!("args.{i}.id"), id.to_owned()));
            }
        }
        params
    }
}

impl From<Fact> for FactPattern {
    fn from(fact: Fact) -> Self {
        Self {
            predicate: fact.predicate,
            args: fact.args.into_iter().map(ValuePattern::Exact).collect(),
        }
    }
}

/// Metadata about the active policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyMetadata {
    #[serde(default)]
    pub resources: HashMap<String, ResourceMetadata>,
}

/// Roles, permissions and relations declared for one resource type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMetadata {
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub relations: HashMap<String, String>,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn literal_helpers() {
        assert_eq!(Value::string("read"), Value::new("String", "read"));
        assert_eq!(Value::integer(-7), Value::new("Integer", "-7"));
        assert_eq!(Value::boolean(true), Value::new("Boolean", "true"));
        assert_eq!(Value::boolean(false), Value::new("Boolean", "false"));
    }

    #[test]
    fn value_validation_rejects_empty_fields() {
        assert!(Value::new("User", "alice").validate().is_ok());
        assert!(matches!(
            Value::new("", "alice").validate(),
            Err(OsoCloudError::InvalidValue(_))
        ));
        assert!(matches!(
            Value::new("User", "").validate(),
            Err(OsoCloudError::InvalidValue(_))
        ));
    }

    #[test]
    fn fact_serializes_with_typed_args() {
        let fact = Fact::new(
            "has_role",
            vec![
                Value::new("User", "alice"),
                Value::string("owner"),
                Value::new("Repo", "acme"),
            ],
        );

        assert_eq!(
            serde_json::to_value(&fact).unwrap(),
            json!({
                "predicate": "has_role",
                "args": [
                    {"type": "User", "id": "alice"},
                    {"type": "String", "id": "owner"},
                    {"type": "Repo", "id": "acme"},
                ]
            })
        );
    }

    #[test]
    fn fact_pattern_wire_format() {
        let pattern = FactPattern::new(
            "has_role",
            vec![
                Value::new("User", "alice").into(),
                ValuePattern::Any,
                ValuePattern::OfType("Repo".to_owned()),
            ],
        );

        assert_eq!(
            serde_json::to_value(&pattern).unwrap(),
            json!({
                "predicate": "has_role",
                "args": [
                    {"type": "User", "id": "alice"},
                    {},
                    {"type": "Repo"},
                ]
            })
        );
    }

    #[test]
    fn fact_pattern_query_params_skip_wildcards() {
        let pattern = FactPattern::new(
            "has_role",
            vec![
                ValuePattern::Any,
                Value::string("member").into(),
                ValuePattern::OfType("Repo".to_owned()),
            ],
        );

        assert_eq!(
            pattern.to_query_params(),
            vec![
                ("predicate".to_owned(), "has_role".to_owned()),
                ("args.1.type".to_owned(), "String".to_owned()),
                ("args.1.id".to_owned(), "member".to_owned()),
                ("args.2.type".to_owned(), "Repo".to_owned()),
            ]
        );
    }

    #[test]
    fn fact_converts_into_exact_pattern() {
        let fact = Fact::new("is_public", vec![Value::new("Repo", "acme")]);
        let pattern: FactPattern = fact.into();

        assert_eq!(
            pattern.args,
            vec![ValuePattern::Exact(Value::new("Repo", "acme"))]
        );
    }

    #[test]
    fn pattern_validation() {
        let empty_type = FactPattern::new("p", vec![ValuePattern::OfType(String::new())]);
        assert!(empty_type.validate().is_err());

        let empty_predicate = FactPattern::new("", vec![]);
        assert!(empty_predicate.validate().is_err());

        let ok = FactPattern::new("p", vec![ValuePattern::Any]);
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn policy_metadata_tolerates_missing_fields() {
        let metadata: PolicyMetadata = serde_json::from_value(json!({
            "resources": {
                "Repo": {"roles": ["member"], "permissions": ["read"]}
            }
        }))
        .unwrap();

        let repo = &metadata.resources["Repo"];
        assert_eq!(repo.roles, vec!["member"]);
        assert!(repo.relations.is_empty());
    }
}

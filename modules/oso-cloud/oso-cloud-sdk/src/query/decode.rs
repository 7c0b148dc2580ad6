//! Shape-driven decoding of result rows.
//!
//! The same row set is reshaped according to the [`Selector`] the caller
//! passes:
//!
//! | selector | result |
//! |----------|--------|
//! | `Exists` | `true` iff there is at least one row |
//! | `Var(v)` | unique values of `v`, in first-seen order |
//! | `Tuple([..])` | one tuple per row, in row order, not deduplicated |
//! | `Group(k, inner)` | unique values of `k` mapped to `inner` decoded over the rows sharing that value |
//!
//! Unbound bindings (the empty string) are reported as [`WILDCARD`].

use std::collections::{HashMap, HashSet};

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::error::QueryError;
use crate::query::variable::Variable;
use crate::query::wire::ResultRow;

/// Marker for a binding that matched without naming a specific value.
pub const WILDCARD: &str = "*";

/// What to extract from the result rows of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Exists,
    Var(Variable),
    Tuple(Vec<Selector>),
    Group(Variable, Box<Selector>),
}

impl Selector {
    /// Group by `key`, decoding `inner` within each group.
    #[must_use]
    pub fn group(key: &Variable, inner: impl Into<Selector>) -> Self {
        Self::Group(key.clone(), Box::new(inner.into()))
    }

    /// Build a grouping selector from a map of `{key: inner}`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::MultiKeyMapUnsupported`] unless the map has
    /// exactly one entry.
    pub fn from_map<I>(map: I) -> Result<Self, QueryError>
    where
        I: IntoIterator<Item = (Variable, Selector)>,
    {
        let mut entries: Vec<(Variable, Selector)> = map.into_iter().collect();
        if entries.len() != 1 {
            return Err(QueryError::MultiKeyMapUnsupported {
                len: entries.len(),
            });
        }
        let (key, inner) = entries.remove(0);
        Ok(Self::Group(key, Box::new(inner)))
    }

    fn shape(&self) -> &'static str {
        match self {
            Self::Exists => "exists",
            Self::Var(_) => "variable",
            Self::Tuple(_) => "tuple",
            Self::Group(..) => "group",
        }
    }
}

impl From<Variable> for Selector {
    fn from(v: Variable) -> Self {
        Self::Var(v)
    }
}

impl From<&Variable> for Selector {
    fn from(v: &Variable) -> Self {
        Self::Var(v.clone())
    }
}

impl From<Vec<Variable>> for Selector {
    fn from(vs: Vec<Variable>) -> Self {
        Self::Tuple(vs.into_iter().map(Self::Var).collect())
    }
}

impl From<&[Variable]> for Selector {
    fn from(vs: &[Variable]) -> Self {
        Self::Tuple(vs.iter().cloned().map(Self::Var).collect())
    }
}

impl From<Vec<Selector>> for Selector {
    fn from(items: Vec<Selector>) -> Self {
        Self::Tuple(items)
    }
}

/// One element of a decoded tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Item {
    Value(String),
    Tuple(Vec<Item>),
}

impl Item {
    #[must_use]
    pub fn as_value(&self) -> Option<&str> {
        match self {
            Self::Value(v) => Some(v),
            Self::Tuple(_) => None,
        }
    }
}

/// Decoded query results; the variant mirrors the selector shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Exists(bool),
    Values(Vec<String>),
    Rows(Vec<Vec<Item>>),
    /// Group key to decoded group, in first-seen key order.
    Groups(Vec<(String, Decoded)>),
}

impl Decoded {
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Exists(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_values(&self) -> Option<&[String]> {
        match self {
            Self::Values(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_rows(&self) -> Option<&[Vec<Item>]> {
        match self {
            Self::Rows(r) => Some(r),
            _ => None,
        }
    }

    /// Look up one group of a [`Decoded::Groups`] result.
    #[must_use]
    pub fn group(&self, key: &str) -> Option<&Decoded> {
        match self {
            Self::Groups(groups) => groups.iter().find(|(k, _)| k == key).map(|(_, d)| d),
            _ => None,
        }
    }

    /// Keys of a [`Decoded::Groups`] result, in first-seen order.
    #[must_use]
    pub fn group_keys(&self) -> Vec<&str> {
        match self {
            Self::Groups(groups) => groups.iter().map(|(k, _)| k.as_str()).collect(),
            _ => Vec::new(),
        }
    }
}

impl Serialize for Decoded {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Exists(b) => serializer.serialize_bool(*b),
            Self::Values(values) => values.serialize(serializer),
            Self::Rows(rows) => {
                let mut seq = serializer.serialize_seq(Some(rows.len()))?;
                for row in rows {
                    seq.serialize_element(row)?;
                }
                seq.end()
            }
            Self::Groups(groups) => {
                let mut map = serializer.serialize_map(Some(groups.len()))?;
                for (key, group) in groups {
                    map.serialize_entry(key, group)?;
                }
                map.end()
            }
        }
    }
}

/// Decode `rows` into the shape described by `selector`.
///
/// # Errors
///
/// - [`QueryError::UnsupportedSelectorShape`] for `Exists` or `Group` nested
///   inside a tuple
/// - [`QueryError::MissingBinding`] if a row lacks a grouping key variable
pub fn decode(rows: &[ResultRow], selector: &Selector) -> Result<Decoded, QueryError> {
    let rows: Vec<&ResultRow> = rows.iter().collect();
    decode_rows(&rows, selector)
}

fn decode_rows(rows: &[&ResultRow], selector: &Selector) -> Result<Decoded, QueryError> {
    match selector {
        Selector::Exists => Ok(Decoded::Exists(!rows.is_empty())),
        Selector::Var(var) => Ok(Decoded::Values(unique_values(rows.iter().copied(), var))),
        Selector::Tuple(items) => rows
            .iter()
            .map(|row| {
                items
                    .iter()
                    .map(|item| decode_item(row, item))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Decoded::Rows),
        Selector::Group(key, inner) => {
            let mut groups: Vec<(String, Vec<&ResultRow>)> = Vec::new();
            let mut index: HashMap<String, usize> = HashMap::new();
            for &row in rows {
                let raw = row
                    .get(key.id().as_str())
                    .ok_or_else(|| QueryError::MissingBinding {
                        id: key.id().to_string(),
                    })?;
                let group_key = normalize(raw);
                if let Some(&i) = index.get(&group_key) {
                    groups[i].1.push(row);
                } else {
                    index.insert(group_key.clone(), groups.len());
                    groups.push((group_key, vec![row]));
                }
            }
            groups
                .into_iter()
                .map(|(group_key, members)| Ok((group_key, decode_rows(&members, inner)?)))
                .collect::<Result<Vec<_>, QueryError>>()
                .map(Decoded::Groups)
        }
    }
}

/// Unique bindings of `var`, in first-seen row order.
pub fn unique_values<'a>(
    rows: impl IntoIterator<Item = &'a ResultRow>,
    var: &Variable,
) -> Vec<String> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .map(|row| binding(row, var))
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

/// One projection of `vars` per row, in row order.
pub fn combinations(rows: &[ResultRow], vars: &[Variable]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| vars.iter().map(|var| binding(row, var)).collect())
        .collect()
}

fn decode_item(row: &ResultRow, selector: &Selector) -> Result<Item, QueryError> {
    match selector {
        Selector::Var(var) => Ok(Item::Value(binding(row, var))),
        Selector::Tuple(items) => items
            .iter()
            .map(|item| decode_item(row, item))
            .collect::<Result<Vec<_>, _>>()
            .map(Item::Tuple),
        Selector::Exists | Selector::Group(..) => Err(QueryError::UnsupportedSelectorShape {
            shape: selector.shape(),
        }),
    }
}

fn binding(row: &ResultRow, var: &Variable) -> String {
    normalize(row.get(var.id().as_str()).map_or("", String::as_str))
}

fn normalize(raw: &str) -> String {
    if raw.is_empty() {
        WILDCARD.to_owned()
    } else {
        raw.to_owned()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    struct Fixture {
        action: Variable,
        repo: Variable,
        rows: Vec<ResultRow>,
    }

    fn row(pairs: &[(&Variable, &str)]) -> ResultRow {
        pairs
            .iter()
            .map(|(v, val)| (v.id().to_string(), (*val).to_owned()))
            .collect()
    }

    fn fixture() -> Fixture {
        let action = Variable::typed("String");
        let repo = Variable::typed("Repo");
        let rows = vec![
            row(&[(&action, "read"), (&repo, "acme")]),
            row(&[(&action, "read"), (&repo, "anvil")]),
            row(&[(&action, "write"), (&repo, "anvil")]),
        ];
        Fixture { action, repo, rows }
    }

    #[test]
    fn exists_reflects_row_count() {
        let f = fixture();
        assert_eq!(decode(&f.rows, &Selector::Exists).unwrap(), Decoded::Exists(true));
        assert_eq!(decode(&[], &Selector::Exists).unwrap(), Decoded::Exists(false));
    }

    #[test]
    fn single_variable_is_deduplicated_in_first_seen_order() {
        let f = fixture();
        let decoded = decode(&f.rows, &Selector::from(&f.repo)).unwrap();
        assert_eq!(
            decoded,
            Decoded::Values(vec!["acme".to_owned(), "anvil".to_owned()])
        );
    }

    #[test]
    fn tuple_keeps_every_row_in_order() {
        let f = fixture();
        let decoded = decode(&f.rows, &Selector::from(vec![f.action.clone(), f.repo.clone()])).unwrap();

        assert_eq!(
            serde_json::to_value(&decoded).unwrap(),
            json!([["read", "acme"], ["read", "anvil"], ["write", "anvil"]])
        );
    }

    #[test]
    fn tuple_duplicates_are_kept() {
        let action = Variable::typed("String");
        let rows = vec![row(&[(&action, "read")]), row(&[(&action, "read")])];

        let decoded = decode(&rows, &Selector::from(vec![action])).unwrap();
        assert_eq!(decoded.as_rows().unwrap().len(), 2);
    }

    #[test]
    fn group_maps_keys_to_inner_values() {
        let f = fixture();
        let decoded = decode(&f.rows, &Selector::group(&f.repo, &f.action)).unwrap();

        assert_eq!(decoded.group_keys(), vec!["acme", "anvil"]);
        assert_eq!(
            serde_json::to_value(&decoded).unwrap(),
            json!({"acme": ["read"], "anvil": ["read", "write"]})
        );
    }

    #[test]
    fn nested_groups_group_twice() {
        let org = Variable::typed("Org");
        let repo = Variable::typed("Repo");
        let action = Variable::typed("String");
        let rows = vec![
            row(&[(&org, "o1"), (&repo, "acme"), (&action, "read")]),
            row(&[(&org, "o1"), (&repo, "acme"), (&action, "write")]),
            row(&[(&org, "o1"), (&repo, "anvil"), (&action, "read")]),
            row(&[(&org, "o2"), (&repo, "zeta"), (&action, "read")]),
        ];

        let selector = Selector::group(&org, Selector::group(&repo, &action));
        let decoded = decode(&rows, &selector).unwrap();

        assert_eq!(
            serde_json::to_value(&decoded).unwrap(),
            json!({
                "o1": {"acme": ["read", "write"], "anvil": ["read"]},
                "o2": {"zeta": ["read"]},
            })
        );
    }

    #[test]
    fn group_of_tuples() {
        let f = fixture();
        let selector = Selector::group(&f.repo, vec![f.action.clone()]);
        let decoded = decode(&f.rows, &selector).unwrap();

        assert_eq!(
            serde_json::to_value(&decoded).unwrap(),
            json!({"acme": [["read"]], "anvil": [["read"], ["write"]]})
        );
    }

    #[test]
    fn nested_tuple_inside_tuple() {
        let f = fixture();
        let selector = Selector::Tuple(vec![
            Selector::from(&f.repo),
            Selector::from(vec![f.action.clone()]),
        ]);
        let decoded = decode(&f.rows[..1], &selector).unwrap();

        assert_eq!(
            decoded,
            Decoded::Rows(vec![vec![
                Item::Value("acme".to_owned()),
                Item::Tuple(vec![Item::Value("read".to_owned())]),
            ]])
        );
    }

    #[test]
    fn accessors_reach_into_decoded_shapes() {
        let f = fixture();

        let grouped = decode(&f.rows, &Selector::group(&f.repo, &f.action)).unwrap();
        assert_eq!(
            grouped.group("anvil").and_then(Decoded::as_values),
            Some(&["read".to_owned(), "write".to_owned()][..])
        );
        assert_eq!(grouped.group("missing"), None);
        assert_eq!(Decoded::Exists(true).group("acme"), None);

        let rows = decode(
            &f.rows[..1],
            &Selector::Tuple(vec![
                Selector::from(&f.repo),
                Selector::from(vec![f.action.clone()]),
            ]),
        )
        .unwrap();
        let first = &rows.as_rows().unwrap()[0];
        assert_eq!(first[0].as_value(), Some("acme"));
        assert_eq!(first[1].as_value(), None);
    }

    #[test]
    fn wildcard_normalized_in_every_shape() {
        let repo = Variable::typed("Repo");
        let action = Variable::typed("String");
        let rows = vec![row(&[(&repo, ""), (&action, "")])];

        assert_eq!(
            decode(&rows, &Selector::from(&repo)).unwrap(),
            Decoded::Values(vec![WILDCARD.to_owned()])
        );
        assert_eq!(
            serde_json::to_value(decode(&rows, &Selector::from(vec![repo.clone()])).unwrap())
                .unwrap(),
            json!([["*"]])
        );
        assert_eq!(
            serde_json::to_value(decode(&rows, &Selector::group(&repo, &action)).unwrap())
                .unwrap(),
            json!({"*": ["*"]})
        );
    }

    #[test]
    fn shapes_are_mutually_consistent() {
        let f = fixture();

        let exists = decode(&f.rows, &Selector::Exists).unwrap();
        let values = decode(&f.rows, &Selector::from(&f.repo)).unwrap();
        let tuples = decode(&f.rows, &Selector::from(vec![f.repo.clone()])).unwrap();
        let groups = decode(&f.rows, &Selector::group(&f.repo, &f.action)).unwrap();

        assert_eq!(exists.as_bool(), Some(true));
        let values = values.as_values().unwrap();
        assert_eq!(groups.group_keys(), values.iter().map(String::as_str).collect::<Vec<_>>());
        assert_eq!(tuples.as_rows().unwrap().len(), f.rows.len());
    }

    #[test]
    fn unsupported_shapes_inside_tuple() {
        let f = fixture();

        let err = decode(&f.rows, &Selector::Tuple(vec![Selector::Exists])).unwrap_err();
        assert_eq!(err, QueryError::UnsupportedSelectorShape { shape: "exists" });

        let err = decode(
            &f.rows,
            &Selector::Tuple(vec![Selector::group(&f.repo, &f.action)]),
        )
        .unwrap_err();
        assert_eq!(err, QueryError::UnsupportedSelectorShape { shape: "group" });
    }

    #[test]
    fn group_key_missing_from_row() {
        let f = fixture();
        let other = Variable::typed("Org");

        let err = decode(&f.rows, &Selector::group(&other, &f.action)).unwrap_err();
        assert!(matches!(err, QueryError::MissingBinding { .. }));
    }

    #[test]
    fn from_map_requires_exactly_one_entry() {
        let f = fixture();

        let ok = Selector::from_map([(f.repo.clone(), Selector::from(&f.action))]).unwrap();
        assert_eq!(ok, Selector::group(&f.repo, &f.action));

        let err = Selector::from_map([
            (f.repo.clone(), Selector::from(&f.action)),
            (f.action.clone(), Selector::from(&f.repo)),
        ])
        .unwrap_err();
        assert_eq!(err, QueryError::MultiKeyMapUnsupported { len: 2 });

        let err = Selector::from_map(Vec::new()).unwrap_err();
        assert_eq!(err, QueryError::MultiKeyMapUnsupported { len: 0 });
    }
}

//! Wire representation of queries and their results.

use std::collections::{BTreeMap, HashMap};

use serde::ser::SerializeTuple;
use serde::{Deserialize, Serialize, Serializer};

use crate::models::Fact;
use crate::query::constraint::Constraint;
use crate::query::variable::VarId;

/// One satisfying assignment: variable id to bound value id.
///
/// An empty string means "matched, but not bound to a specific value".
pub type ResultRow = HashMap<String, String>;

/// A predicate call with its arguments already resolved to variable ids.
/// Serialized as `[name, [var_id, ...]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryCall {
    pub predicate: String,
    pub args: Vec<VarId>,
}

impl Serialize for QueryCall {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tup = serializer.serialize_tuple(2)?;
        tup.serialize_element(&self.predicate)?;
        tup.serialize_element(&self.args)?;
        tup.end()
    }
}

/// The query document sent to the evaluation endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireQuery {
    pub predicate: QueryCall,
    pub calls: Vec<QueryCall>,
    pub constraints: BTreeMap<VarId, Constraint>,
    pub context_facts: Vec<Fact>,
}

/// Rows returned by the query evaluation endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResults {
    #[serde(default)]
    pub results: Vec<ResultRow>,
}

/// How a local query should be compiled to SQL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LocalQueryMode {
    /// Select one row per authorized combination, one column per variable.
    /// An empty map selects a single boolean `result` column.
    Select {
        query_vars_to_output_column_names: BTreeMap<String, String>,
    },
    /// A boolean expression over `output_column_name` for a `WHERE` clause.
    Filter {
        output_column_name: String,
        query_var: String,
    },
}

/// Response of every local-query endpoint: opaque SQL text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalQueryResult {
    pub sql: String,
}

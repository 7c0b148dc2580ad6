//! Immutable query builder.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::api::QueryEvaluator;
use crate::error::{OsoCloudError, QueryError};
use crate::models::Fact;
use crate::query::constraint::ConstraintStore;
use crate::query::decode::{self, Decoded, Selector};
use crate::query::variable::{QueryFact, Variable};
use crate::query::wire::{LocalQueryMode, QueryCall, ResultRow, WireQuery};

/// A composed, not-yet-executed query.
///
/// Every chaining operation returns a new builder and leaves `self`
/// untouched, so one builder can serve as the shared prefix of several
/// queries. The first failing operation poisons the chain: later operations
/// are no-ops and the error is returned by the evaluation method.
///
/// ```ignore
/// let action = Variable::typed("String");
/// let repo = Variable::typed("Repo");
///
/// let actions_by_repo = oso
///     .build_query(query_fact!("allow", Value::new("User", "alice"), &action, &repo))
///     .in_values(&repo, ["acme", "anvil"])
///     .evaluate(&Selector::group(&repo, &action))
///     .await?;
/// ```
#[derive(Clone)]
pub struct QueryBuilder {
    evaluator: Arc<dyn QueryEvaluator>,
    predicate: QueryCall,
    calls: Vec<QueryCall>,
    constraints: ConstraintStore,
    context_facts: Vec<Fact>,
    error: Option<QueryError>,
}

impl fmt::Debug for QueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("predicate", &self.predicate)
            .field("calls", &self.calls)
            .field("constraints", &self.constraints)
            .field("context_facts", &self.context_facts)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl QueryBuilder {
    /// Start a query rooted at `fact`.
    #[must_use]
    pub fn new(evaluator: Arc<dyn QueryEvaluator>, fact: QueryFact) -> Self {
        let mut constraints = ConstraintStore::default();
        let name = fact.predicate.clone();
        let (predicate, error) = match resolve_call(&mut constraints, fact) {
            Ok(call) => (call, None),
            Err(e) => (
                QueryCall {
                    predicate: name,
                    args: Vec::new(),
                },
                Some(e),
            ),
        };
        Self {
            evaluator,
            predicate,
            calls: Vec::new(),
            constraints,
            context_facts: Vec::new(),
            error,
        }
    }

    /// Add a conjunctive condition.
    #[must_use]
    pub fn and(&self, fact: QueryFact) -> Self {
        self.derive(move |next| {
            let call = resolve_call(&mut next.constraints, fact)?;
            next.calls.push(call);
            Ok(())
        })
    }

    /// Restrict `var` to one of `values`.
    ///
    /// Fails if `var` is not used by any call of this query, or if it was
    /// already restricted.
    #[must_use]
    pub fn in_values<I>(&self, var: &Variable, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.derive(|next| next.constraints.restrict(var, values))
    }

    /// Add facts that hold only while this query is evaluated.
    ///
    /// Repeated calls accumulate.
    #[must_use]
    pub fn with_context_facts(&self, facts: impl IntoIterator<Item = Fact>) -> Self {
        self.derive(|next| {
            next.context_facts.extend(facts);
            Ok(())
        })
    }

    /// The sticky error of this chain, if any.
    #[must_use]
    pub fn error(&self) -> Option<&QueryError> {
        self.error.as_ref()
    }

    /// Serialize the query into its wire form.
    ///
    /// # Errors
    ///
    /// Returns the sticky error if any builder operation failed.
    pub fn to_wire_query(&self) -> Result<WireQuery, QueryError> {
        if let Some(e) = &self.error {
            return Err(e.clone());
        }
        Ok(WireQuery {
            predicate: self.predicate.clone(),
            calls: self.calls.clone(),
            constraints: self.constraints.snapshot(),
            context_facts: self.context_facts.clone(),
        })
    }

    /// Whether the query has at least one solution.
    ///
    /// # Errors
    ///
    /// The sticky builder error, or any delivery error.
    pub async fn evaluate_exists(&self) -> Result<bool, OsoCloudError> {
        Ok(!self.fetch_rows().await?.is_empty())
    }

    /// Unique values bound to `var`, in first-seen order.
    ///
    /// # Errors
    ///
    /// The sticky builder error, or any delivery error.
    pub async fn evaluate_values(&self, var: &Variable) -> Result<Vec<String>, OsoCloudError> {
        let rows = self.fetch_rows().await?;
        Ok(decode::unique_values(&rows, var))
    }

    /// One tuple of `vars` per solution, in result order, with duplicates.
    ///
    /// # Errors
    ///
    /// The sticky builder error, or any delivery error.
    pub async fn evaluate_combinations(
        &self,
        vars: &[Variable],
    ) -> Result<Vec<Vec<String>>, OsoCloudError> {
        let rows = self.fetch_rows().await?;
        Ok(decode::combinations(&rows, vars))
    }

    /// Evaluate the query and reshape the results as `selector` describes.
    ///
    /// # Errors
    ///
    /// The sticky builder error, a decoding error for an unsupported
    /// selector, or any delivery error.
    pub async fn evaluate(&self, selector: &Selector) -> Result<Decoded, OsoCloudError> {
        let rows = self.fetch_rows().await?;
        Ok(decode::decode(&rows, selector)?)
    }

    /// [`evaluate`](Self::evaluate), deserialized into `T`.
    ///
    /// ```ignore
    /// let by_repo: HashMap<String, Vec<String>> =
    ///     query.evaluate_as(&Selector::group(&repo, &action)).await?;
    /// ```
    ///
    /// # Errors
    ///
    /// As [`evaluate`](Self::evaluate), plus [`OsoCloudError::Decode`] if the
    /// decoded shape does not fit `T`.
    pub async fn evaluate_as<T: DeserializeOwned>(
        &self,
        selector: &Selector,
    ) -> Result<T, OsoCloudError> {
        let decoded = self.evaluate(selector).await?;
        serde_json::to_value(&decoded)
            .and_then(serde_json::from_value)
            .map_err(|e| OsoCloudError::Decode(e.to_string()))
    }

    /// SQL selecting one row per solution, with one column per entry of
    /// `columns` (column name to variable). An empty map selects a single
    /// boolean `result` column.
    ///
    /// # Errors
    ///
    /// The sticky builder error, [`QueryError::DuplicatedVariable`] if one
    /// variable is bound to two columns, or any delivery error.
    pub async fn evaluate_local_select(
        &self,
        columns: &BTreeMap<String, Variable>,
    ) -> Result<String, OsoCloudError> {
        let query = self.to_wire_query()?;
        let mut seen = HashSet::new();
        let mut vars_to_columns = BTreeMap::new();
        for (column, var) in columns {
            if !seen.insert(var.id()) {
                return Err(QueryError::DuplicatedVariable {
                    var_type: var.var_type().to_owned(),
                }
                .into());
            }
            vars_to_columns.insert(var.id().to_string(), column.clone());
        }
        let mode = LocalQueryMode::Select {
            query_vars_to_output_column_names: vars_to_columns,
        };
        self.evaluator.evaluate_query_local(&query, &mode).await
    }

    /// SQL boolean expression over `column` for use in a `WHERE` clause,
    /// true for rows whose value is an authorized binding of `var`.
    ///
    /// # Errors
    ///
    /// The sticky builder error, or any delivery error.
    pub async fn evaluate_local_filter(
        &self,
        column: &str,
        var: &Variable,
    ) -> Result<String, OsoCloudError> {
        let query = self.to_wire_query()?;
        let mode = LocalQueryMode::Filter {
            output_column_name: column.to_owned(),
            query_var: var.id().to_string(),
        };
        self.evaluator.evaluate_query_local(&query, &mode).await
    }

    async fn fetch_rows(&self) -> Result<Vec<ResultRow>, OsoCloudError> {
        let query = self.to_wire_query()?;
        Ok(self.evaluator.evaluate_query(&query).await?.results)
    }

    fn derive(&self, op: impl FnOnce(&mut Self) -> Result<(), QueryError>) -> Self {
        let mut next = self.clone();
        if next.error.is_none()
            && let Err(e) = op(&mut next)
        {
            next.error = Some(e);
        }
        next
    }
}

fn resolve_call(store: &mut ConstraintStore, fact: QueryFact) -> Result<QueryCall, QueryError> {
    if fact.predicate.is_empty() {
        return Err(QueryError::InvalidArgument {
            reason: "query predicate must be non-empty".to_owned(),
        });
    }
    let args = fact
        .args
        .iter()
        .map(|arg| store.push_arg(arg))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(QueryCall {
        predicate: fact.predicate,
        args,
    })
}

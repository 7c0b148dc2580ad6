//! Client traits for Oso Cloud.

use async_trait::async_trait;

use crate::batch::BatchTransaction;
use crate::error::OsoCloudError;
use crate::models::{Fact, FactPattern, PolicyMetadata, Value};
use crate::query::{LocalQueryMode, QueryResults, WireQuery};

/// Evaluates serialized queries on behalf of a [`QueryBuilder`](crate::QueryBuilder).
#[async_trait]
pub trait QueryEvaluator: Send + Sync {
    /// Evaluate a query and return its result rows.
    ///
    /// # Errors
    ///
    /// Any [`OsoCloudError`] raised while delivering the request.
    async fn evaluate_query(&self, query: &WireQuery) -> Result<QueryResults, OsoCloudError>;

    /// Compile a query to SQL against the local data bindings.
    ///
    /// The SQL text is returned verbatim.
    ///
    /// # Errors
    ///
    /// Any [`OsoCloudError`] raised while delivering the request.
    async fn evaluate_query_local(
        &self,
        query: &WireQuery,
        mode: &LocalQueryMode,
    ) -> Result<String, OsoCloudError>;
}

/// Public API of an Oso Cloud client.
///
/// Read operations may be served by a configured fallback host; writes
/// advance the client's causal offset so later reads observe them.
#[async_trait]
pub trait OsoCloudClient: QueryEvaluator {
    /// Check whether `actor` may perform `action` on `resource`.
    ///
    /// # Errors
    ///
    /// Returns [`OsoCloudError::InvalidValue`] for malformed values, or any
    /// delivery error.
    async fn authorize(
        &self,
        actor: &Value,
        action: &str,
        resource: &Value,
        context_facts: &[Fact],
    ) -> Result<bool, OsoCloudError>;

    /// Filter `resources` down to those `actor` may perform `action` on.
    ///
    /// # Errors
    ///
    /// Returns [`OsoCloudError::InvalidValue`] for malformed values, or any
    /// delivery error.
    async fn authorize_resources(
        &self,
        actor: &Value,
        action: &str,
        resources: &[Value],
        context_facts: &[Fact],
    ) -> Result<Vec<Value>, OsoCloudError>;

    /// Ids of every `resource_type` resource `actor` may perform `action` on.
    ///
    /// # Errors
    ///
    /// Returns [`OsoCloudError::InvalidValue`] for malformed values, or any
    /// delivery error.
    async fn list(
        &self,
        actor: &Value,
        action: &str,
        resource_type: &str,
        context_facts: &[Fact],
    ) -> Result<Vec<String>, OsoCloudError>;

    /// Actions `actor` may perform on `resource`.
    ///
    /// # Errors
    ///
    /// Returns [`OsoCloudError::InvalidValue`] for malformed values, or any
    /// delivery error.
    async fn actions(
        &self,
        actor: &Value,
        resource: &Value,
        context_facts: &[Fact],
    ) -> Result<Vec<String>, OsoCloudError>;

    /// SQL selecting a single boolean `allowed` column for an authorize check
    /// evaluated against local data.
    ///
    /// # Errors
    ///
    /// Returns [`OsoCloudError::InvalidValue`] for malformed values, or any
    /// delivery error.
    async fn authorize_local(
        &self,
        actor: &Value,
        action: &str,
        resource: &Value,
        context_facts: &[Fact],
    ) -> Result<String, OsoCloudError>;

    /// SQL filter over `column` selecting authorized `resource_type` ids.
    ///
    /// # Errors
    ///
    /// Returns [`OsoCloudError::InvalidValue`] for malformed values, or any
    /// delivery error.
    async fn list_local(
        &self,
        actor: &Value,
        action: &str,
        resource_type: &str,
        column: &str,
        context_facts: &[Fact],
    ) -> Result<String, OsoCloudError>;

    /// SQL selecting the actions `actor` may perform on `resource`.
    ///
    /// # Errors
    ///
    /// Returns [`OsoCloudError::InvalidValue`] for malformed values, or any
    /// delivery error.
    async fn actions_local(
        &self,
        actor: &Value,
        resource: &Value,
        context_facts: &[Fact],
    ) -> Result<String, OsoCloudError>;

    /// Store a fact.
    ///
    /// # Errors
    ///
    /// Returns [`OsoCloudError::InvalidValue`] for a malformed fact, or any
    /// delivery error.
    async fn insert(&self, fact: &Fact) -> Result<(), OsoCloudError>;

    /// Delete every stored fact matching `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`OsoCloudError::InvalidValue`] for a malformed pattern, or any
    /// delivery error.
    async fn delete(&self, pattern: &FactPattern) -> Result<(), OsoCloudError>;

    /// Apply a batch of inserts and deletes atomically.
    ///
    /// # Errors
    ///
    /// Any delivery error.
    async fn batch(&self, transaction: &BatchTransaction) -> Result<(), OsoCloudError>;

    /// List stored facts matching `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`OsoCloudError::InvalidValue`] for a malformed pattern, or any
    /// delivery error.
    async fn get(&self, pattern: &FactPattern) -> Result<Vec<Fact>, OsoCloudError>;

    /// Replace the active policy with `src`.
    ///
    /// # Errors
    ///
    /// Any delivery error, including a policy the service fails to parse.
    async fn policy(&self, src: &str) -> Result<(), OsoCloudError>;

    /// Resources, roles and permissions declared by the active policy.
    ///
    /// # Errors
    ///
    /// Any delivery error.
    async fn policy_metadata(&self) -> Result<PolicyMetadata, OsoCloudError>;
}

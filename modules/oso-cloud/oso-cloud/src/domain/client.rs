//! Concrete Oso Cloud client.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use oso_cloud_sdk::query::LocalQueryResult;
use oso_cloud_sdk::{
    BatchTransaction, Fact, FactPattern, LocalQueryMode, OsoCloudClient, OsoCloudError,
    PolicyMetadata, QueryBuilder, QueryEvaluator, QueryFact, QueryResults, Value, WireQuery,
};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::executor::Executor;
use super::payloads::{
    ActionsRequest, AuthorizeRequest, AuthorizeResourcesRequest, AuthorizeResourcesResponse,
    AuthorizeResponse, ListRequest, LocalQueryRequest, PolicyMetadataResponse, PolicyRequest,
    StringResults,
};
use super::request::RequestDescriptor;
use crate::config::OsoCloudConfig;

/// Oso Cloud client.
///
/// Cheap to clone (`Arc` inside); clones share the connection pool and the
/// causal offset.
#[derive(Debug, Clone)]
pub struct OsoCloud {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    executor: Executor,
    data_bindings: String,
}

impl OsoCloud {
    /// Create a client. Reads the data bindings file, if configured.
    ///
    /// # Errors
    ///
    /// [`OsoCloudError::Config`] if the data bindings file cannot be read or
    /// the HTTP client cannot be built.
    pub fn new(config: &OsoCloudConfig) -> Result<Self, OsoCloudError> {
        let data_bindings = match &config.data_bindings {
            Some(path) => std::fs::read_to_string(path).map_err(|e| {
                OsoCloudError::Config(format!(
                    "failed to read data bindings {}: {e}",
                    path.display()
                ))
            })?,
            None => String::new(),
        };
        Ok(Self {
            inner: Arc::new(Inner {
                executor: Executor::new(config)?,
                data_bindings,
            }),
        })
    }

    /// Start a query rooted at `fact`, evaluated by this client.
    #[must_use]
    pub fn build_query(&self, fact: QueryFact) -> QueryBuilder {
        QueryBuilder::new(Arc::new(self.clone()), fact)
    }

    /// Offset token of the most recent write made through this client.
    #[must_use]
    pub fn causal_offset(&self) -> Option<String> {
        self.inner.executor.offset().current()
    }

    async fn execute(
        &self,
        op: &'static str,
        request: &RequestDescriptor,
    ) -> Result<Bytes, OsoCloudError> {
        self.inner
            .executor
            .execute(request)
            .await
            .map_err(|e| log_and_return(op, e))
    }

    async fn call<T: DeserializeOwned>(
        &self,
        op: &'static str,
        request: &RequestDescriptor,
    ) -> Result<T, OsoCloudError> {
        let body = self.execute(op, request).await?;
        serde_json::from_slice(&body)
            .map_err(|e| log_and_return(op, OsoCloudError::Decode(e.to_string())))
    }

    async fn local_query<Q: Serialize + Sync>(
        &self,
        op: &'static str,
        path: &'static str,
        query: &Q,
        column: Option<&str>,
        mode: Option<&LocalQueryMode>,
    ) -> Result<String, OsoCloudError> {
        let body = LocalQueryRequest {
            query,
            data_bindings: &self.inner.data_bindings,
            column,
            mode,
        };
        let request = RequestDescriptor::post(path, &body)?;
        let result: LocalQueryResult = self.call(op, &request).await?;
        Ok(result.sql)
    }
}

fn log_and_return(op: &str, e: OsoCloudError) -> OsoCloudError {
    tracing::error!(operation = op, error = ?e, "Oso Cloud call failed");
    e
}

#[async_trait]
impl QueryEvaluator for OsoCloud {
    async fn evaluate_query(&self, query: &WireQuery) -> Result<QueryResults, OsoCloudError> {
        let request = RequestDescriptor::post("/evaluate_query", query)?;
        self.call("evaluate_query", &request).await
    }

    async fn evaluate_query_local(
        &self,
        query: &WireQuery,
        mode: &LocalQueryMode,
    ) -> Result<String, OsoCloudError> {
        self.local_query(
            "evaluate_query_local",
            "/evaluate_query_local",
            query,
            None,
            Some(mode),
        )
        .await
    }
}

#[async_trait]
impl OsoCloudClient for OsoCloud {
    async fn authorize(
        &self,
        actor: &Value,
        action: &str,
        resource: &Value,
        context_facts: &[Fact],
    ) -> Result<bool, OsoCloudError> {
        actor.validate()?;
        resource.validate()?;
        let body = AuthorizeRequest {
            actor_type: &actor.value_type,
            actor_id: &actor.id,
            action,
            resource_type: &resource.value_type,
            resource_id: &resource.id,
            context_facts,
        };
        let request = RequestDescriptor::post("/authorize", &body)?;
        let response: AuthorizeResponse = self.call("authorize", &request).await?;
        Ok(response.allowed)
    }

    async fn authorize_resources(
        &self,
        actor: &Value,
        action: &str,
        resources: &[Value],
        context_facts: &[Fact],
    ) -> Result<Vec<Value>, OsoCloudError> {
        actor.validate()?;
        if resources.is_empty() {
            return Ok(Vec::new());
        }
        resources.iter().try_for_each(Value::validate)?;
        let body = AuthorizeResourcesRequest {
            actor_type: &actor.value_type,
            actor_id: &actor.id,
            action,
            resources,
            context_facts,
        };
        let request = RequestDescriptor::post("/authorize_resources", &body)?;
        let response: AuthorizeResourcesResponse =
            self.call("authorize_resources", &request).await?;
        Ok(response.results)
    }

    async fn list(
        &self,
        actor: &Value,
        action: &str,
        resource_type: &str,
        context_facts: &[Fact],
    ) -> Result<Vec<String>, OsoCloudError> {
        actor.validate()?;
        let body = ListRequest {
            actor_type: &actor.value_type,
            actor_id: &actor.id,
            action,
            resource_type,
            context_facts,
        };
        let request = RequestDescriptor::post("/list", &body)?;
        let response: StringResults = self.call("list", &request).await?;
        Ok(response.results)
    }

    async fn actions(
        &self,
        actor: &Value,
        resource: &Value,
        context_facts: &[Fact],
    ) -> Result<Vec<String>, OsoCloudError> {
        actor.validate()?;
        resource.validate()?;
        let body = ActionsRequest {
            actor_type: &actor.value_type,
            actor_id: &actor.id,
            resource_type: &resource.value_type,
            resource_id: &resource.id,
            context_facts,
        };
        let request = RequestDescriptor::post("/actions", &body)?;
        let response: StringResults = self.call("actions", &request).await?;
        Ok(response.results)
    }

    async fn authorize_local(
        &self,
        actor: &Value,
        action: &str,
        resource: &Value,
        context_facts: &[Fact],
    ) -> Result<String, OsoCloudError> {
        actor.validate()?;
        resource.validate()?;
        let query = AuthorizeRequest {
            actor_type: &actor.value_type,
            actor_id: &actor.id,
            action,
            resource_type: &resource.value_type,
            resource_id: &resource.id,
            context_facts,
        };
        self.local_query("authorize_local", "/authorize_query", &query, None, None)
            .await
    }

    async fn list_local(
        &self,
        actor: &Value,
        action: &str,
        resource_type: &str,
        column: &str,
        context_facts: &[Fact],
    ) -> Result<String, OsoCloudError> {
        actor.validate()?;
        let query = ListRequest {
            actor_type: &actor.value_type,
            actor_id: &actor.id,
            action,
            resource_type,
            context_facts,
        };
        self.local_query("list_local", "/list_query", &query, Some(column), None)
            .await
    }

    async fn actions_local(
        &self,
        actor: &Value,
        resource: &Value,
        context_facts: &[Fact],
    ) -> Result<String, OsoCloudError> {
        actor.validate()?;
        resource.validate()?;
        let query = ActionsRequest {
            actor_type: &actor.value_type,
            actor_id: &actor.id,
            resource_type: &resource.value_type,
            resource_id: &resource.id,
            context_facts,
        };
        self.local_query("actions_local", "/actions_query", &query, None, None)
            .await
    }

    async fn insert(&self, fact: &Fact) -> Result<(), OsoCloudError> {
        fact.validate()?;
        let request = RequestDescriptor::post("/facts", fact)?.mutating();
        self.execute("insert", &request).await?;
        Ok(())
    }

    async fn delete(&self, pattern: &FactPattern) -> Result<(), OsoCloudError> {
        pattern.validate()?;
        let request = RequestDescriptor::delete("/facts", pattern)?.mutating();
        self.execute("delete", &request).await?;
        Ok(())
    }

    async fn batch(&self, transaction: &BatchTransaction) -> Result<(), OsoCloudError> {
        if transaction.is_empty() {
            return Ok(());
        }
        let request = RequestDescriptor::post("/batch", transaction)?.mutating();
        self.execute("batch", &request).await?;
        Ok(())
    }

    async fn get(&self, pattern: &FactPattern) -> Result<Vec<Fact>, OsoCloudError> {
        pattern.validate()?;
        let request = RequestDescriptor::get("/facts").with_query(pattern.to_query_params());
        let facts: Option<Vec<Fact>> = self.call("get", &request).await?;
        Ok(facts.unwrap_or_default())
    }

    async fn policy(&self, src: &str) -> Result<(), OsoCloudError> {
        let body = PolicyRequest {
            filename: None,
            src,
        };
        let request = RequestDescriptor::post("/policy", &body)?.mutating();
        self.execute("policy", &request).await?;
        Ok(())
    }

    async fn policy_metadata(&self) -> Result<PolicyMetadata, OsoCloudError> {
        let request = RequestDescriptor::get("/policy_metadata");
        let response: PolicyMetadataResponse = self.call("policy_metadata", &request).await?;
        Ok(response.metadata)
    }
}

//! Request and response bodies of the Oso Cloud endpoints.

use oso_cloud_sdk::{Fact, LocalQueryMode, PolicyMetadata, Value};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct AuthorizeRequest<'a> {
    pub actor_type: &'a str,
    pub actor_id: &'a str,
    pub action: &'a str,
    pub resource_type: &'a str,
    pub resource_id: &'a str,
    pub context_facts: &'a [Fact],
}

#[derive(Debug, Deserialize)]
pub struct AuthorizeResponse {
    pub allowed: bool,
}

#[derive(Debug, Serialize)]
pub struct AuthorizeResourcesRequest<'a> {
    pub actor_type: &'a str,
    pub actor_id: &'a str,
    pub action: &'a str,
    pub resources: &'a [Value],
    pub context_facts: &'a [Fact],
}

#[derive(Debug, Deserialize)]
pub struct AuthorizeResourcesResponse {
    #[serde(default)]
    pub results: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct ListRequest<'a> {
    pub actor_type: &'a str,
    pub actor_id: &'a str,
    pub action: &'a str,
    pub resource_type: &'a str,
    pub context_facts: &'a [Fact],
}

#[derive(Debug, Serialize)]
pub struct ActionsRequest<'a> {
    pub actor_type: &'a str,
    pub actor_id: &'a str,
    pub resource_type: &'a str,
    pub resource_id: &'a str,
    pub context_facts: &'a [Fact],
}

/// Response of `list` and `actions`.
#[derive(Debug, Deserialize)]
pub struct StringResults {
    #[serde(default)]
    pub results: Vec<String>,
}

/// Body of every local-query endpoint: the query plus the data bindings,
/// and for some endpoints an output column or a compilation mode.
#[derive(Debug, Serialize)]
pub struct LocalQueryRequest<'a, Q> {
    pub query: &'a Q,
    pub data_bindings: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<&'a str>,
    #[serde(flatten)]
    pub mode: Option<&'a LocalQueryMode>,
}

#[derive(Debug, Serialize)]
pub struct PolicyRequest<'a> {
    pub filename: Option<&'a str>,
    pub src: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct PolicyMetadataResponse {
    pub metadata: PolicyMetadata,
}

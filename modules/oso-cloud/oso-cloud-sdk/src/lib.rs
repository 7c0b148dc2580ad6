#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Oso Cloud SDK
//!
//! This crate provides the public API of the Oso Cloud client:
//!
//! - [`OsoCloudClient`] - Client trait implemented by the `oso-cloud` crate
//! - [`QueryEvaluator`] - Query evaluation seam used by [`QueryBuilder`]
//! - [`Value`], [`Fact`], [`FactPattern`], [`BatchTransaction`] - Data model
//! - [`QueryBuilder`], [`Variable`], [`Selector`] - Query composition and decoding
//! - [`OsoCloudError`], [`QueryError`] - Error types
//!
//! ## Usage
//!
//! ```ignore
//! use oso_cloud_sdk::{OsoCloudClient, Selector, Value, Variable, query_fact};
//!
//! let alice = Value::new("User", "alice");
//! let repo = Value::new("Repo", "acme");
//! let allowed = oso.authorize(&alice, "read", &repo, &[]).await?;
//!
//! let action = Variable::typed("String");
//! let repos = Variable::typed("Repo");
//! let by_repo = oso
//!     .build_query(query_fact!("allow", &alice, &action, &repos))
//!     .evaluate(&Selector::group(&repos, &action))
//!     .await?;
//! ```

pub mod api;
pub mod batch;
pub mod error;
pub mod models;
pub mod query;

// Re-export main types at crate root
pub use api::{OsoCloudClient, QueryEvaluator};
pub use batch::{BatchTransaction, FactChangeset};
pub use error::{OsoCloudError, QueryError};
pub use models::{Fact, FactPattern, PolicyMetadata, ResourceMetadata, Value, ValuePattern};
pub use query::{
    Decoded, Item, LocalQueryMode, QueryArg, QueryBuilder, QueryFact, QueryResults, ResultRow,
    Selector, VarId, Variable, WireQuery, decode,
};

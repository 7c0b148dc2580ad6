//! Oso Cloud Client
//!
//! HTTP implementation of [`oso_cloud_sdk::OsoCloudClient`]. Every call goes
//! through one executor that retries transient failures, replays read-only
//! calls against an optional fallback host, and carries the causal offset of
//! the latest write on subsequent requests.
//!
//! ```ignore
//! let oso = OsoCloud::new(&OsoCloudConfig {
//!     api_key: SecretString::from(std::env::var("OSO_AUTH")?),
//!     ..OsoCloudConfig::default()
//! })?;
//! ```
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod domain;

pub use config::{OsoCloudConfig, RetryConfig};
pub use domain::OsoCloud;

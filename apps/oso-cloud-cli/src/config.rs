//! Client configuration: defaults, then an optional YAML file, then
//! `OSO_CLOUD_*` environment variables (`__` separates nested keys, e.g.
//! `OSO_CLOUD_RETRY__MAX_RETRIES`).

use std::path::Path;

use anyhow::{Context, bail};
use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use oso_cloud::OsoCloudConfig;

const ENV_PREFIX: &str = "OSO_CLOUD_";

/// # Errors
///
/// Fails if `path` does not exist or the merged configuration is invalid.
pub fn load(path: Option<&Path>) -> anyhow::Result<OsoCloudConfig> {
    let mut figment = Figment::new();
    if let Some(path) = path {
        if !path.is_file() {
            bail!("config file {} not found", path.display());
        }
        figment = figment.merge(Yaml::file(path));
    }
    extract(&figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
}

fn extract(figment: &Figment) -> anyhow::Result<OsoCloudConfig> {
    figment
        .extract()
        .context("invalid Oso Cloud configuration")
}

//! Command-line arguments.

use std::path::PathBuf;

use anyhow::bail;
use clap::{Parser, Subcommand};
use oso_cloud_sdk::{Fact, FactPattern, Value, ValuePattern};

/// Placeholder matching any value in a fact pattern.
const ANY: &str = "_";

#[derive(Debug, Parser)]
#[command(name = "oso-cloud", version, about = "Query and update Oso Cloud")]
pub struct Cli {
    /// YAML configuration file. `OSO_CLOUD_*` environment variables override it.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Values are written `Type:id`, e.g. `User:alice`. In patterns, `_` matches
/// anything and `Type:_` matches any value of that type.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check whether an actor may perform an action on a resource.
    Authorize {
        actor: String,
        action: String,
        resource: String,
    },
    /// List ids of the resources of a type an actor may act on.
    List {
        actor: String,
        action: String,
        resource_type: String,
    },
    /// List the actions an actor may perform on a resource.
    Actions { actor: String, resource: String },
    /// Insert a fact, e.g. `tell has_role User:alice String:owner Repo:acme`.
    Tell { predicate: String, args: Vec<String> },
    /// Delete every fact matching a pattern.
    Delete { predicate: String, args: Vec<String> },
    /// List the facts matching a pattern.
    Get { predicate: String, args: Vec<String> },
    /// Replace the active policy with the contents of a Polar file.
    Policy { file: PathBuf },
    /// Show the resources, roles and permissions of the active policy.
    PolicyMetadata,
}

/// Parse `Type:id`.
///
/// # Errors
///
/// Fails without a `:` separator or with an empty type or id.
pub fn parse_value(arg: &str) -> anyhow::Result<Value> {
    let Some((value_type, id)) = arg.split_once(':') else {
        bail!("expected `Type:id`, got `{arg}`");
    };
    let value = Value::new(value_type, id);
    value.validate()?;
    Ok(value)
}

/// Parse `_`, `Type:_` or `Type:id`.
///
/// # Errors
///
/// Same as [`parse_value`] for anything other than a wildcard.
pub fn parse_value_pattern(arg: &str) -> anyhow::Result<ValuePattern> {
    if arg == ANY {
        return Ok(ValuePattern::Any);
    }
    match arg.split_once(':') {
        Some((value_type, ANY)) if !value_type.is_empty() => {
            Ok(ValuePattern::OfType(value_type.to_owned()))
        }
        _ => parse_value(arg).map(ValuePattern::Exact),
    }
}

/// # Errors
///
/// Fails if any argument is not a valid value.
pub fn parse_fact(predicate: &str, args: &[String]) -> anyhow::Result<Fact> {
    let args = args
        .iter()
        .map(|arg| parse_value(arg))
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(Fact::new(predicate, args))
}

/// # Errors
///
/// Fails if any argument is not a valid pattern.
pub fn parse_pattern(predicate: &str, args: &[String]) -> anyhow::Result<FactPattern> {
    let args = args
        .iter()
        .map(|arg| parse_value_pattern(arg))
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(FactPattern::new(predicate, args))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn values() {
        assert_eq!(
            parse_value("User:alice").unwrap(),
            Value::new("User", "alice")
        );
        // only the first colon separates
        assert_eq!(
            parse_value("Url:https://example.com").unwrap(),
            Value::new("Url", "https://example.com")
        );
        assert!(parse_value("alice").is_err());
        assert!(parse_value(":alice").is_err());
        assert!(parse_value("User:").is_err());
    }

    #[test]
    fn patterns() {
        assert_eq!(parse_value_pattern("_").unwrap(), ValuePattern::Any);
        assert_eq!(
            parse_value_pattern("Repo:_").unwrap(),
            ValuePattern::OfType("Repo".to_owned())
        );
        assert_eq!(
            parse_value_pattern("Repo:acme").unwrap(),
            ValuePattern::Exact(Value::new("Repo", "acme"))
        );
        assert!(parse_value_pattern(":_").is_err());
    }

    #[test]
    fn fact_and_pattern() {
        let args = ["User:alice".to_owned(), "String:owner".to_owned()];
        let fact = parse_fact("has_role", &args).unwrap();
        assert_eq!(fact.args.len(), 2);

        let args = ["User:alice".to_owned(), "_".to_owned()];
        let pattern = parse_pattern("has_role", &args).unwrap();
        assert_eq!(pattern.args[1], ValuePattern::Any);

        assert!(parse_fact("has_role", &["_".to_owned()]).is_err());
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "oso-cloud",
            "--log-level",
            "debug",
            "authorize",
            "User:alice",
            "read",
            "Repo:acme",
        ])
        .unwrap();

        assert_eq!(cli.log_level, "debug");
        assert!(matches!(cli.command, Command::Authorize { ref action, .. } if action == "read"));

        let cli = Cli::try_parse_from(["oso-cloud", "policy-metadata"]).unwrap();
        assert!(matches!(cli.command, Command::PolicyMetadata));
    }
}

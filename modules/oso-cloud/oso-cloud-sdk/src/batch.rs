//! Grouping of fact inserts and deletes into a single request.

use serde::Serialize;

use crate::error::OsoCloudError;
use crate::models::{Fact, FactPattern};

/// A run of consecutive operations of the same kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FactChangeset {
    Inserts { inserts: Vec<Fact> },
    Deletes { deletes: Vec<FactPattern> },
}

/// Ordered list of fact inserts and deletes sent as one batch call.
///
/// Consecutive inserts share a changeset, as do consecutive deletes; the
/// relative order of inserts and deletes is preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BatchTransaction {
    changesets: Vec<FactChangeset>,
}

impl BatchTransaction {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a fact insert.
    ///
    /// # Errors
    ///
    /// Returns [`OsoCloudError::InvalidValue`] if the fact is malformed.
    pub fn insert(&mut self, fact: Fact) -> Result<(), OsoCloudError> {
        fact.validate()?;
        if let Some(FactChangeset::Inserts { inserts }) = self.changesets.last_mut() {
            inserts.push(fact);
        } else {
            self.changesets.push(FactChangeset::Inserts {
                inserts: vec![fact],
            });
        }
        Ok(())
    }

    /// Queue the deletion of a fact, or of every fact matching a pattern.
    ///
    /// # Errors
    ///
    /// Returns [`OsoCloudError::InvalidValue`] if the pattern is malformed.
    pub fn delete(&mut self, pattern: impl Into<FactPattern>) -> Result<(), OsoCloudError> {
        let pattern = pattern.into();
        pattern.validate()?;
        if let Some(FactChangeset::Deletes { deletes }) = self.changesets.last_mut() {
            deletes.push(pattern);
        } else {
            self.changesets.push(FactChangeset::Deletes {
                deletes: vec![pattern],
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn changesets(&self) -> &[FactChangeset] {
        &self.changesets
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changesets.is_empty()
    }
}

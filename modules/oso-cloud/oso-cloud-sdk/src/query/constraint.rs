//! Constraint store: the allowed bindings of every variable in a query.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::QueryError;
use crate::models::Value;
use crate::query::variable::{QueryArg, VarId, Variable};

/// Type tag plus optional finite set of allowed ids for one variable.
///
/// `ids == None` means unconstrained: any id of the type matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Constraint {
    #[serde(rename = "type")]
    pub constraint_type: String,
    pub ids: Option<Vec<String>>,
}

impl Constraint {
    fn any(constraint_type: &str) -> Self {
        Self {
            constraint_type: constraint_type.to_owned(),
            ids: None,
        }
    }

    fn exactly(value: &Value) -> Self {
        Self {
            constraint_type: value.value_type.clone(),
            ids: Some(vec![value.id.clone()]),
        }
    }
}

/// Mapping from variable id to its [`Constraint`].
///
/// Every variable referenced by a query call has exactly one entry. Values
/// are stored as fresh single-use variables constrained to that one id, so
/// the wire format only ever refers to variable ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConstraintStore {
    entries: BTreeMap<VarId, Constraint>,
}

impl ConstraintStore {
    /// Register a call argument and return the variable id it is bound to.
    ///
    /// Variables reuse their existing entry; values always get a new
    /// synthetic variable, even if the same value was pushed before.
    pub(crate) fn push_arg(&mut self, arg: &QueryArg) -> Result<VarId, QueryError> {
        match arg {
            QueryArg::Var(var) => {
                if var.var_type().is_empty() {
                    return Err(QueryError::InvalidArgument {
                        reason: format!("variable `{}` must have a non-empty type", var.id()),
                    });
                }
                self.entries
                    .entry(var.id().clone())
                    .or_insert_with(|| Constraint::any(var.var_type()));
                Ok(var.id().clone())
            }
            QueryArg::Val(value) => {
                if value.value_type.is_empty() || value.id.is_empty() {
                    return Err(QueryError::InvalidArgument {
                        reason: "Value must have a non-empty type and id".to_owned(),
                    });
                }
                let synthetic = Variable::typed(value.value_type.clone());
                let id = synthetic.id().clone();
                self.entries.insert(id.clone(), Constraint::exactly(value));
                Ok(id)
            }
        }
    }

    /// Restrict a variable to a finite set of ids. Allowed once per variable.
    pub(crate) fn restrict(&mut self, var: &Variable, ids: Vec<String>) -> Result<(), QueryError> {
        let constraint = self
            .entries
            .get_mut(var.id())
            .ok_or_else(|| QueryError::UnknownVariable {
                id: var.id().to_string(),
            })?;
        if constraint.ids.is_some() {
            return Err(QueryError::AlreadyConstrained {
                id: var.id().to_string(),
            });
        }
        constraint.ids = Some(ids);
        Ok(())
    }

    /// Owned copy of the entries, keyed by variable id.
    pub(crate) fn snapshot(&self) -> BTreeMap<VarId, Constraint> {
        self.entries.clone()
    }

    #[cfg(test)]
    pub(crate) fn get(&self, id: &VarId) -> Option<&Constraint> {
        self.entries.get(id)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

//! Query composition and result decoding.
//!
//! A query is a conjunction of predicate calls over [`Variable`]s and
//! concrete values. Each variable carries a [`Constraint`]; evaluation returns
//! result rows which [`decode`] reshapes according to a [`Selector`].

mod builder;
mod constraint;
mod decode;
mod variable;
mod wire;

pub use builder::QueryBuilder;
pub use constraint::Constraint;
pub use decode::{Decoded, Item, Selector, WILDCARD, decode};
pub use variable::{QueryArg, QueryFact, VarId, Variable};
pub use wire::{LocalQueryMode, LocalQueryResult, QueryCall, QueryResults, ResultRow, WireQuery};

//! Mapping of query result rows onto metric records.
//!
//! Column roles are decided once per query by [`classify`], after which
//! every row of that query is turned into a [`MetricRecord`] by [`decode`].

mod classify;
mod decode;
mod types;

pub use classify::{classify, Classification, ColumnRole};
pub use decode::decode;
pub use types::{FieldValue, MetricRecord};

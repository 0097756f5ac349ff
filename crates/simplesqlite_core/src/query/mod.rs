//! Query predicates applied by the table repository.

pub mod filter;

pub use filter::{CompareOp, Filter};

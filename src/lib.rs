//! flowlint reorders TypeScript for top-down readability: guard clauses
//! before the setup they skip, derived values next to their inputs,
//! placeholder declarations next to their first use, observable side effects
//! ahead of unrelated setup, and class members in call order.
//!
//! Every suggested move is backed by a dependency analysis: a statement only
//! crosses pure declarations that neither declare nor read anything it
//! depends on, so applying the fixes never changes behavior. Fixes are plain
//! text splices over the original source; formatting and comments survive.

pub mod analyzer;
pub mod block_reorder;
pub mod dependency;
pub mod edit;
pub mod file_handler;
pub mod member_graph;
pub mod parser;
pub mod purity;
pub mod report;

pub use analyzer::{analyze_source, fix_source, FixOutcome};
pub use report::{Violation, ViolationKind};

/// TidyFrame - Deferred Column Expressions over In-Memory Tables
///
/// An in-memory columnar table library with deferred column expressions and
/// a verb pipeline (filter, group_by, summarize, mutate, select). An
/// expression is captured unevaluated together with the lexical bindings at
/// its call site, then resolved later against a table, preferring columns
/// over same-named outer bindings.

pub mod capture;
pub mod column;
pub mod error;
pub mod expr;
pub mod group;
pub mod pipeline;
pub mod table;

mod eval;
mod verbs;

pub use capture::{Capture, Env};
pub use column::{Column, ColumnType, ColumnValue};
pub use error::{FrameError, Result};
pub use expr::{parse_expr, AggFunc, BinaryOp, Expr, LiteralValue, UnaryOp};
pub use group::GroupedTable;
pub use pipeline::{Pipeline, Step};
pub use table::{Schema, Table};

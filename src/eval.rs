//! Deferred evaluation of captured expressions against a table scope.
//!
//! A [`Scope`] names the rows an evaluation may see: the whole table, or
//! one group's rows. Evaluation comes in two shapes:
//!
//! - per-row (`eval_at_row`): names resolve to the current row's column
//!   values; aggregate calls reduce over every row in scope, window-style.
//! - per-group (`eval_grouped`): one scalar per scope; bare column names
//!   are only legal inside aggregate calls.
//!
//! Name resolution always prefers a table column over a same-named
//! environment binding. A name found in neither place is an error at
//! evaluation time, never at capture time.
//!
//! Null semantics follow the source material: arithmetic and comparisons
//! over null yield null, logical AND/OR are three-valued, and aggregates
//! skip nulls.

use crate::capture::{Capture, Env};
use crate::column::ColumnValue;
use crate::error::{FrameError, Result};
use crate::expr::{AggFunc, BinaryOp, Expr, LiteralValue, UnaryOp};
use crate::table::Table;

/// The rows visible to one evaluation: the whole table, or a group subset.
/// Row indices are absolute table indices.
pub(crate) struct Scope<'a> {
    table: &'a Table,
    rows: Option<&'a [usize]>,
    env: &'a Env,
}

impl<'a> Scope<'a> {
    pub(crate) fn table(table: &'a Table, env: &'a Env) -> Self {
        Scope {
            table,
            rows: None,
            env,
        }
    }

    pub(crate) fn group(table: &'a Table, rows: &'a [usize], env: &'a Env) -> Self {
        Scope {
            table,
            rows: Some(rows),
            env,
        }
    }

    fn n_rows(&self) -> usize {
        self.rows.map_or(self.table.len(), |r| r.len())
    }

    fn row_at(&self, i: usize) -> usize {
        self.rows.map_or(i, |r| r[i])
    }
}

/// Evaluate a capture at one table row. Used by filter and mutate.
pub(crate) fn eval_at_row(capture: &Capture, scope: &Scope, row: usize) -> Result<ColumnValue> {
    eval(capture.expr(), scope, Some(row))
}

/// Evaluate a capture once for the whole scope. Used by summarize; yields
/// one scalar per group.
pub(crate) fn eval_grouped(capture: &Capture, scope: &Scope) -> Result<ColumnValue> {
    eval(capture.expr(), scope, None)
}

fn eval(expr: &Expr, scope: &Scope, current: Option<usize>) -> Result<ColumnValue> {
    match expr {
        Expr::Name(name) => {
            // Columns shadow environment bindings of the same name
            if scope.table.schema().get_column_index(name).is_some() {
                match current {
                    Some(row) => scope.table.column_by_name(name)?.get(row),
                    None => Err(FrameError::AggregateRequired(name.clone())),
                }
            } else if let Some(value) = scope.env.get(name) {
                Ok(value.clone())
            } else {
                Err(FrameError::NameNotFound(name.clone()))
            }
        }
        Expr::Literal(lit) => Ok(literal_value(lit)),
        Expr::Unary { op, expr } => {
            let value = eval(expr, scope, current)?;
            eval_unary(*op, value)
        }
        Expr::Binary {
            op: op @ (BinaryOp::And | BinaryOp::Or),
            left,
            right,
        } => eval_logical(*op, left, right, scope, current),
        Expr::Binary { op, left, right } => {
            let lhs = eval(left, scope, current)?;
            let rhs = eval(right, scope, current)?;
            eval_binary(*op, lhs, rhs)
        }
        Expr::Call { func, args } => eval_aggregate(*func, args, scope),
    }
}

fn literal_value(lit: &LiteralValue) -> ColumnValue {
    match lit {
        LiteralValue::Int(n) => ColumnValue::Int64(*n),
        LiteralValue::Float(f) => ColumnValue::Float64(*f),
        LiteralValue::String(s) => ColumnValue::String(s.clone()),
        LiteralValue::Bool(b) => ColumnValue::Bool(*b),
        LiteralValue::Null => ColumnValue::Null,
    }
}

fn type_name(value: &ColumnValue) -> &'static str {
    match value {
        ColumnValue::Int64(_) => "INT64",
        ColumnValue::Float64(_) => "FLOAT64",
        ColumnValue::String(_) => "STRING",
        ColumnValue::Bool(_) => "BOOL",
        ColumnValue::Null => "NULL",
    }
}

fn eval_unary(op: UnaryOp, value: ColumnValue) -> Result<ColumnValue> {
    match (op, value) {
        (_, ColumnValue::Null) => Ok(ColumnValue::Null),
        (UnaryOp::Neg, ColumnValue::Int64(n)) => Ok(ColumnValue::Int64(-n)),
        (UnaryOp::Neg, ColumnValue::Float64(f)) => Ok(ColumnValue::Float64(-f)),
        (UnaryOp::Not, ColumnValue::Bool(b)) => Ok(ColumnValue::Bool(!b)),
        (UnaryOp::Neg, v) => Err(FrameError::TypeMismatch(format!(
            "cannot negate {}",
            type_name(&v)
        ))),
        (UnaryOp::Not, v) => Err(FrameError::TypeMismatch(format!(
            "NOT expects BOOL, got {}",
            type_name(&v)
        ))),
    }
}

/// Three-valued AND/OR with short-circuiting: a false AND (or true OR) on
/// the left decides the result without evaluating the right side.
fn eval_logical(
    op: BinaryOp,
    left: &Expr,
    right: &Expr,
    scope: &Scope,
    current: Option<usize>,
) -> Result<ColumnValue> {
    let lhs = eval(left, scope, current)?;
    let lhs = match lhs {
        ColumnValue::Bool(b) => Some(b),
        ColumnValue::Null => None,
        v => {
            return Err(FrameError::TypeMismatch(format!(
                "logical operator expects BOOL, got {}",
                type_name(&v)
            )))
        }
    };

    match (op, lhs) {
        (BinaryOp::And, Some(false)) => return Ok(ColumnValue::Bool(false)),
        (BinaryOp::Or, Some(true)) => return Ok(ColumnValue::Bool(true)),
        _ => {}
    }

    let rhs = eval(right, scope, current)?;
    let rhs = match rhs {
        ColumnValue::Bool(b) => Some(b),
        ColumnValue::Null => None,
        v => {
            return Err(FrameError::TypeMismatch(format!(
                "logical operator expects BOOL, got {}",
                type_name(&v)
            )))
        }
    };

    let result = match op {
        BinaryOp::And => match (lhs, rhs) {
            (Some(false), _) | (_, Some(false)) => Some(false),
            (Some(true), Some(true)) => Some(true),
            _ => None,
        },
        BinaryOp::Or => match (lhs, rhs) {
            (Some(true), _) | (_, Some(true)) => Some(true),
            (Some(false), Some(false)) => Some(false),
            _ => None,
        },
        _ => unreachable!("eval_logical only handles AND/OR"),
    };

    Ok(result.map_or(ColumnValue::Null, ColumnValue::Bool))
}

fn eval_binary(op: BinaryOp, lhs: ColumnValue, rhs: ColumnValue) -> Result<ColumnValue> {
    // Null propagates through arithmetic and comparison alike
    if lhs.is_null() || rhs.is_null() {
        return Ok(ColumnValue::Null);
    }

    match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul => eval_arith(op, lhs, rhs),
        BinaryOp::Div => match (lhs.as_numeric(), rhs.as_numeric()) {
            // Division always yields a float, even over two integers
            (Some(a), Some(b)) => Ok(ColumnValue::Float64(a / b)),
            _ => Err(FrameError::TypeMismatch(format!(
                "cannot divide {} by {}",
                type_name(&lhs),
                type_name(&rhs)
            ))),
        },
        BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            eval_compare(op, lhs, rhs)
        }
        BinaryOp::And | BinaryOp::Or => unreachable!("handled by eval_logical"),
    }
}

fn eval_arith(op: BinaryOp, lhs: ColumnValue, rhs: ColumnValue) -> Result<ColumnValue> {
    match (&lhs, &rhs) {
        // Integer arithmetic stays integer for + - *
        (ColumnValue::Int64(a), ColumnValue::Int64(b)) => {
            let result = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                _ => unreachable!(),
            };
            Ok(ColumnValue::Int64(result))
        }
        _ => match (lhs.as_numeric(), rhs.as_numeric()) {
            (Some(a), Some(b)) => {
                let result = match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    _ => unreachable!(),
                };
                Ok(ColumnValue::Float64(result))
            }
            _ => Err(FrameError::TypeMismatch(format!(
                "cannot apply arithmetic to {} and {}",
                type_name(&lhs),
                type_name(&rhs)
            ))),
        },
    }
}

fn eval_compare(op: BinaryOp, lhs: ColumnValue, rhs: ColumnValue) -> Result<ColumnValue> {
    let result = match (&lhs, &rhs) {
        // Exact integer comparison, promoted comparison for mixed numerics
        (ColumnValue::Int64(a), ColumnValue::Int64(b)) => compare_ord(a, b, op),
        (ColumnValue::String(a), ColumnValue::String(b)) => compare_ord(a, b, op),
        (ColumnValue::Bool(a), ColumnValue::Bool(b)) => match op {
            BinaryOp::Eq => a == b,
            BinaryOp::Ne => a != b,
            _ => {
                return Err(FrameError::TypeMismatch(
                    "ordering comparison on BOOL".to_string(),
                ))
            }
        },
        _ => match (lhs.as_numeric(), rhs.as_numeric()) {
            (Some(a), Some(b)) => compare_ord(&a, &b, op),
            _ => {
                return Err(FrameError::TypeMismatch(format!(
                    "cannot compare {} with {}",
                    type_name(&lhs),
                    type_name(&rhs)
                )))
            }
        },
    };
    Ok(ColumnValue::Bool(result))
}

fn compare_ord<T: PartialOrd>(a: &T, b: &T, op: BinaryOp) -> bool {
    match op {
        BinaryOp::Eq => a == b,
        BinaryOp::Ne => a != b,
        BinaryOp::Lt => a < b,
        BinaryOp::Le => a <= b,
        BinaryOp::Gt => a > b,
        BinaryOp::Ge => a >= b,
        _ => unreachable!("compare_ord only handles comparison operators"),
    }
}

/// Evaluate an aggregate call over every row in scope. The argument is
/// evaluated per row; nulls are skipped by every reducer except `n()`,
/// which counts rows. An empty or all-null scope yields null (0 for n).
fn eval_aggregate(func: AggFunc, args: &[Expr], scope: &Scope) -> Result<ColumnValue> {
    if func == AggFunc::N {
        return Ok(ColumnValue::Int64(scope.n_rows() as i64));
    }

    let arg = args.first().ok_or_else(|| {
        FrameError::Parse(format!("function '{}' missing its argument", func.name()))
    })?;
    let mut values = Vec::with_capacity(scope.n_rows());
    for i in 0..scope.n_rows() {
        let value = eval(arg, scope, Some(scope.row_at(i)))?;
        if !value.is_null() {
            values.push(value);
        }
    }

    match func {
        AggFunc::N => unreachable!(),
        AggFunc::Sum => reduce_sum(&values),
        AggFunc::Mean => reduce_mean(&values),
        AggFunc::Min => reduce_extreme(&values, true),
        AggFunc::Max => reduce_extreme(&values, false),
    }
}

fn reduce_sum(values: &[ColumnValue]) -> Result<ColumnValue> {
    if values.is_empty() {
        return Ok(ColumnValue::Null);
    }

    let mut int_sum: i64 = 0;
    let mut float_sum: f64 = 0.0;
    let mut saw_float = false;
    for value in values {
        match value {
            ColumnValue::Int64(n) => int_sum += n,
            ColumnValue::Float64(f) => {
                saw_float = true;
                float_sum += f;
            }
            v => {
                return Err(FrameError::TypeMismatch(format!(
                    "sum over {}",
                    type_name(v)
                )))
            }
        }
    }

    if saw_float {
        Ok(ColumnValue::Float64(float_sum + int_sum as f64))
    } else {
        Ok(ColumnValue::Int64(int_sum))
    }
}

fn reduce_mean(values: &[ColumnValue]) -> Result<ColumnValue> {
    if values.is_empty() {
        return Ok(ColumnValue::Null);
    }

    let mut sum = 0.0;
    for value in values {
        match value.as_numeric() {
            Some(f) => sum += f,
            None => {
                return Err(FrameError::TypeMismatch(format!(
                    "mean over {}",
                    type_name(value)
                )))
            }
        }
    }
    Ok(ColumnValue::Float64(sum / values.len() as f64))
}

/// Min/max preserve the value's original type. Numerics compare with
/// promotion; strings compare lexicographically; anything else is a type
/// error.
fn reduce_extreme(values: &[ColumnValue], want_min: bool) -> Result<ColumnValue> {
    let mut best: Option<ColumnValue> = None;
    for value in values {
        let better = match &best {
            None => true,
            Some(current) => {
                let ordering = match (current, value) {
                    (ColumnValue::String(a), ColumnValue::String(b)) => b.partial_cmp(a),
                    _ => match (current.as_numeric(), value.as_numeric()) {
                        (Some(a), Some(b)) => b.partial_cmp(&a),
                        _ => {
                            return Err(FrameError::TypeMismatch(format!(
                                "{} over {}",
                                if want_min { "min" } else { "max" },
                                type_name(value)
                            )))
                        }
                    },
                };
                match ordering {
                    Some(std::cmp::Ordering::Less) => want_min,
                    Some(std::cmp::Ordering::Greater) => !want_min,
                    _ => false,
                }
            }
        };
        if better {
            // Type-check the very first value too
            if !matches!(
                value,
                ColumnValue::Int64(_) | ColumnValue::Float64(_) | ColumnValue::String(_)
            ) {
                return Err(FrameError::TypeMismatch(format!(
                    "{} over {}",
                    if want_min { "min" } else { "max" },
                    type_name(value)
                )));
            }
            best = Some(value.clone());
        }
    }
    Ok(best.unwrap_or(ColumnValue::Null))
}

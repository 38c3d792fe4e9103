//! Pipeline runner: an ordered list of verbs applied left to right, each
//! step consuming the previous step's output table.
//!
//! A pipeline is built once with the fluent methods and can be run against
//! any table. Grouping is part of the threaded state: a `group_by` step
//! turns it on, filter/mutate steps preserve it (regrouping by the same
//! keys), and a `summarize` step consumes it.
//!
//! ```
//! use tidyframe::{Capture, Pipeline, Table};
//!
//! let csv = "species,len\nsetosa,1.4\nvirginica,6.0\nsetosa,1.3";
//! let table = Table::from_csv("iris", csv).unwrap();
//!
//! let summary = Pipeline::new()
//!     .filter(vec![Capture::parse("len > 1.0").unwrap()])
//!     .group_by(&["species"])
//!     .summarize(vec![("count", Capture::parse("n()").unwrap())])
//!     .run(&table)
//!     .unwrap();
//!
//! assert_eq!(summary.len(), 2);
//! ```

use crate::capture::Capture;
use crate::error::Result;
use crate::group::GroupedTable;
use crate::table::Table;
use log::debug;

/// One pipeline operation.
#[derive(Debug)]
pub enum Step {
    /// Keep rows satisfying all predicates (conjunction).
    Filter(Vec<Capture>),
    /// Partition by key columns.
    GroupBy(Vec<String>),
    /// Reduce each group to one row per named aggregate.
    Summarize(Vec<(String, Capture)>),
    /// Add or replace one computed column.
    Mutate { name: String, capture: Capture },
    /// Keep only the named columns, in order.
    Select(Vec<String>),
}

/// An ordered sequence of steps.
#[derive(Debug, Default)]
pub struct Pipeline {
    steps: Vec<Step>,
}

/// Threaded pipeline state: the current table, grouped or not.
enum State {
    Ungrouped(Table),
    Grouped(GroupedTable),
}

impl Pipeline {
    pub fn new() -> Self {
        Pipeline::default()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn filter(mut self, predicates: Vec<Capture>) -> Self {
        self.steps.push(Step::Filter(predicates));
        self
    }

    pub fn group_by(mut self, keys: &[&str]) -> Self {
        self.steps
            .push(Step::GroupBy(keys.iter().map(|k| k.to_string()).collect()));
        self
    }

    pub fn summarize<S: Into<String>>(mut self, aggregates: Vec<(S, Capture)>) -> Self {
        self.steps.push(Step::Summarize(
            aggregates
                .into_iter()
                .map(|(name, capture)| (name.into(), capture))
                .collect(),
        ));
        self
    }

    pub fn mutate(mut self, name: impl Into<String>, capture: Capture) -> Self {
        self.steps.push(Step::Mutate {
            name: name.into(),
            capture,
        });
        self
    }

    pub fn select(mut self, columns: &[&str]) -> Self {
        self.steps
            .push(Step::Select(columns.iter().map(|c| c.to_string()).collect()));
        self
    }

    /// Apply every step in order to a copy of `table`. The input is never
    /// modified. A trailing grouping is dropped from the result.
    pub fn run(&self, table: &Table) -> Result<Table> {
        let mut state = State::Ungrouped(table.clone());

        for (idx, step) in self.steps.iter().enumerate() {
            state = apply_step(step, state)?;
            let rows = match &state {
                State::Ungrouped(t) => t.len(),
                State::Grouped(g) => g.table().len(),
            };
            debug!("pipeline step {}: {} -> {} rows", idx + 1, step_name(step), rows);
        }

        Ok(match state {
            State::Ungrouped(t) => t,
            State::Grouped(g) => g.into_table(),
        })
    }
}

fn step_name(step: &Step) -> &'static str {
    match step {
        Step::Filter(_) => "filter",
        Step::GroupBy(_) => "group_by",
        Step::Summarize(_) => "summarize",
        Step::Mutate { .. } => "mutate",
        Step::Select(_) => "select",
    }
}

fn apply_step(step: &Step, state: State) -> Result<State> {
    Ok(match (step, state) {
        (Step::Filter(predicates), State::Ungrouped(t)) => {
            State::Ungrouped(t.filter(predicates)?)
        }
        (Step::Filter(predicates), State::Grouped(g)) => State::Grouped(g.filter(predicates)?),
        (Step::GroupBy(keys), State::Ungrouped(t)) => {
            let keys: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
            State::Grouped(t.group_by(&keys)?)
        }
        (Step::GroupBy(keys), State::Grouped(g)) => {
            // a second group_by replaces the previous grouping
            let keys: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
            State::Grouped(g.into_table().group_by(&keys)?)
        }
        (Step::Summarize(aggregates), State::Ungrouped(t)) => {
            State::Ungrouped(t.summarize(aggregates)?)
        }
        (Step::Summarize(aggregates), State::Grouped(g)) => {
            State::Ungrouped(g.summarize(aggregates)?)
        }
        (Step::Mutate { name, capture }, State::Ungrouped(t)) => {
            State::Ungrouped(t.mutate(name, capture)?)
        }
        (Step::Mutate { name, capture }, State::Grouped(g)) => {
            State::Grouped(g.mutate(name, capture)?)
        }
        (Step::Select(columns), State::Ungrouped(t)) => {
            let columns: Vec<&str> = columns.iter().map(|c| c.as_str()).collect();
            State::Ungrouped(t.select(&columns)?)
        }
        (Step::Select(columns), State::Grouped(g)) => {
            let keys: Vec<String> = g.keys().to_vec();
            let columns: Vec<&str> = columns.iter().map(|c| c.as_str()).collect();
            let selected = g.into_table().select(&columns)?;
            let keys: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
            State::Grouped(selected.group_by(&keys)?)
        }
    })
}

/// Deferred Capture Example
///
/// This example demonstrates the capability the crate is built around:
/// a function parameter standing for an unevaluated column expression,
/// resolved later inside a nested call.
///
/// - A user-defined function receives an expression as text plus the
///   caller's bindings and captures both without evaluating.
/// - Evaluation happens inside the function body, against whatever table
///   (and grouping) is in effect there.
/// - Table columns shadow same-named outer bindings.
/// - Unknown names fail at evaluation time, not capture time.

use tidyframe::{Capture, ColumnValue, Env, Result, Table};

/// Summarize the minimum of any caller-supplied expression per group.
/// The caller names a column that this function knows nothing about.
fn group_minimum(table: &Table, group_col: &str, expr: &str, env: Env) -> Result<Table> {
    let capture = Capture::with_env(expr, env)?;
    table
        .group_by(&[group_col])?
        .summarize(&[("minimum".to_string(), capture)])
}

fn main() {
    env_logger::init();

    println!("=== TidyFrame Deferred Capture Example ===\n");

    let csv = "\
Species,Sepal.Length
setosa,5.1
setosa,4.9
virginica,6.3
virginica,5.8";
    let iris = Table::from_csv("iris", csv).unwrap();

    // 1. The column name is chosen by the caller, not the function
    println!("1. Passing 'min(Sepal.Length)' into group_minimum...");
    let summary = group_minimum(&iris, "Species", "min(Sepal.Length)", Env::new()).unwrap();
    println!("{}", summary);

    // 2. Captures fall back to the caller's bindings for non-column names
    println!("2. An environment binding fills in a non-column name...");
    let env = Env::new().bind("scale", ColumnValue::Float64(10.0));
    let summary = group_minimum(&iris, "Species", "min(Sepal.Length * scale)", env).unwrap();
    println!("{}", summary);

    // 3. Columns win over same-named bindings
    println!("3. A binding named like a column is shadowed by the column...");
    let env = Env::new().bind("Sepal.Length", ColumnValue::Float64(-1.0));
    let summary = group_minimum(&iris, "Species", "min(Sepal.Length)", env).unwrap();
    println!("{}", summary);

    // 4. Name errors surface only at evaluation
    println!("4. Capturing an unknown name succeeds; evaluating it fails...");
    let capture = Capture::parse("min(Petal.Length)").unwrap();
    println!("   captured: {}", capture.source());
    match iris.summarize(&[("minimum".to_string(), capture)]) {
        Ok(_) => unreachable!(),
        Err(err) => println!("   evaluation error: {}", err),
    }

    println!("\n=== Example Complete ===");
}

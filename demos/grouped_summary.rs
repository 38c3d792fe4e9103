/// Grouped Summary Example
///
/// This example demonstrates:
/// - Grouping a table by a key column
/// - Summarizing each group with aggregate captures
/// - First-seen group ordering in the output

use tidyframe::{Capture, Pipeline, Table};

fn main() {
    env_logger::init();

    println!("=== TidyFrame Grouped Summary Example ===\n");

    let csv = "\
Species,Sepal.Length,Sepal.Width
setosa,5.1,3.5
setosa,4.9,3.0
setosa,4.7,3.2
versicolor,7.0,3.2
versicolor,6.4,3.2
versicolor,6.9,3.1
virginica,6.3,3.3
virginica,5.8,2.7
virginica,7.1,3.0";
    let iris = Table::from_csv("iris", csv).unwrap();

    println!("1. Input table ({} rows):", iris.len());
    println!("{}", iris);

    println!("2. Count, min, and max of Sepal.Length per species...");
    let summary = Pipeline::new()
        .group_by(&["Species"])
        .summarize(vec![
            ("count", Capture::parse("n()").unwrap()),
            ("min_sl", Capture::parse("min(Sepal.Length)").unwrap()),
            ("max_sl", Capture::parse("max(Sepal.Length)").unwrap()),
            ("range", Capture::parse("max(Sepal.Length) - min(Sepal.Length)").unwrap()),
        ])
        .run(&iris)
        .unwrap();
    println!("{}", summary);

    println!("3. An ungrouped summarize reduces the whole table to one row...");
    let overall = iris
        .summarize(&[
            ("n".to_string(), Capture::parse("n()").unwrap()),
            ("mean_sw".to_string(), Capture::parse("mean(Sepal.Width)").unwrap()),
        ])
        .unwrap();
    println!("{}", overall);

    println!("=== Example Complete ===");
}

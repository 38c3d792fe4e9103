/// Basic Pipeline Example
///
/// This example demonstrates:
/// - Building a table from CSV text
/// - Filtering with captured predicates
/// - Adding a computed column with mutate
/// - Running the same steps through a Pipeline

use tidyframe::{Capture, Pipeline, Table};

fn main() {
    env_logger::init();

    println!("=== TidyFrame Basic Pipeline Example ===\n");

    // 1. Build a table from CSV
    println!("1. Loading table from CSV...");
    let csv = "\
name,mass,height
Luke,77.0,1.72
Leia,49.0,1.50
Chewbacca,112.0,2.28
Yoda,17.0,0.66";
    let people = Table::from_csv("people", csv).unwrap();
    println!("{}", people);

    // 2. Filter with a captured predicate
    println!("2. Filtering mass > 40...");
    let heavy = people
        .filter(&[Capture::parse("mass > 40").unwrap()])
        .unwrap();
    println!("{}", heavy);

    // 3. Mutate: add a BMI column
    println!("3. Adding a computed column...");
    let with_bmi = people
        .mutate("bmi", &Capture::parse("mass / (height * height)").unwrap())
        .unwrap();
    println!("{}", with_bmi);

    // 4. The same transform as a pipeline
    println!("4. Running the steps as one pipeline...");
    let result = Pipeline::new()
        .filter(vec![Capture::parse("mass > 40").unwrap()])
        .mutate("bmi", Capture::parse("mass / (height * height)").unwrap())
        .select(&["name", "bmi"])
        .run(&people)
        .unwrap();
    println!("{}", result);

    println!("=== Example Complete ===");
}

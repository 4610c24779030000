use rust_aloha_estimator::{calculate_lambda_relation, estimate_lambda_relation, SweepPoint};

const SUBSCRIBER_COUNT: usize = 5;
const PROB_COUNT: usize = 3;
const RESOLUTION: usize = 10;
const TICK_COUNT: u64 = 1_000_000;
const SEED: u64 = 13;

fn main() {
    println!("... slotted ALOHA estimator is started ...");

    match calculate_lambda_relation(SUBSCRIBER_COUNT, PROB_COUNT, RESOLUTION) {
        Ok(relation) => print_relation("Exact results", &relation),
        Err(err) => println!("ERROR: exact sweep failed: {}", err),
    }

    match estimate_lambda_relation(SUBSCRIBER_COUNT, PROB_COUNT, RESOLUTION, TICK_COUNT, SEED) {
        Ok(relation) => print_relation("Simulation results", &relation),
        Err(err) => println!("ERROR: simulated sweep failed: {}", err),
    }
}

fn print_relation(title: &str, relation: &[SweepPoint]) {
    println!("*******************{}*******************", title);
    println!("lambda: average amount of subscribers, delay");
    for point in relation {
        match &point.estimate {
            Ok(estimate) => println!(
                "{}: {}\t{}",
                point.lambda, estimate.avg_active_count, estimate.avg_delay
            ),
            Err(err) => println!("{}: ERROR: {}", point.lambda, err),
        }
    }
    println!("*******************{}*******************", title);
}

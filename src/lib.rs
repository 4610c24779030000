use thiserror::Error;

pub mod binomial;
pub mod chain;
pub mod relation;
pub mod simulator;
pub mod solver;
pub mod subscriber;

pub use chain::{AlohaMarkovChain, TickOutcome};
pub use relation::{
    calculate_lambda_relation, estimate_lambda_relation, exact_point, PointEstimate, SweepPoint,
};
pub use simulator::AlohaSimulator;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid parameter {name} = {value}")]
    InvalidParameter { name: &'static str, value: f64 },
    #[error("stationary solve failed: pivot vanished at column {column}")]
    SingularSystem { column: usize },
    #[error("stationary vector is not a probability distribution (sum = {sum}, min entry = {min})")]
    DegenerateDistribution { sum: f64, min: f64 },
}

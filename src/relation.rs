use crate::binomial::binomial_experiment_prob;
use crate::chain::{aloha_prob, AlohaMarkovChain};
use crate::simulator::AlohaSimulator;
use crate::solver::stationary_distribution;
use crate::ModelError;

/// The (average backlogged count, average delay) pair both engines produce
/// for one arrival-rate point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointEstimate {
    pub avg_active_count: f64,
    pub avg_delay: f64,
}

/// One sample of an arrival-rate sweep. A failed point carries its own error
/// and leaves the rest of the sweep intact.
pub struct SweepPoint {
    pub lambda: f64,
    pub estimate: Result<PointEstimate, ModelError>,
}

/// Exact engine for a single arrival rate: build the transition matrix, solve
/// for the stationary distribution and reduce it.
pub fn exact_point(chain: &AlohaMarkovChain, lambda: f64) -> Result<PointEstimate, ModelError> {
    let matrix = chain.transition_matrix(lambda)?;
    let distribution = stationary_distribution(&matrix)?;

    Ok(aggregate(chain, &distribution))
}

/// Reduce a stationary distribution to the average backlog and the
/// Little's-law delay estimate with its half-tick correction.
fn aggregate(chain: &AlohaMarkovChain, distribution: &[f64]) -> PointEstimate {
    let mut avg_active_count = 0.0;
    let mut avg_success_rate = 0.0;

    for (state_id, &prob) in distribution.iter().enumerate() {
        let (s_t, n_t) = chain.state_name(state_id);

        avg_active_count += n_t as f64 * prob;
        avg_success_rate += binomial_experiment_prob(n_t as u32, 1, aloha_prob(s_t)) * prob;
    }

    let avg_delay = if avg_success_rate > 0.0 {
        avg_active_count / avg_success_rate + 0.5
    } else {
        f64::INFINITY
    };

    PointEstimate {
        avg_active_count,
        avg_delay,
    }
}

/// Exact sweep over `lambda = i / resolution` for i in [1, resolution].
pub fn calculate_lambda_relation(
    subscriber_count: usize,
    prob_count: usize,
    resolution: usize,
) -> Result<Vec<SweepPoint>, ModelError> {
    if resolution == 0 {
        return Err(ModelError::InvalidParameter {
            name: "resolution",
            value: 0.0,
        });
    }
    let chain = AlohaMarkovChain::new(subscriber_count, prob_count)?;

    Ok((1..=resolution)
        .map(|i| {
            let lambda = i as f64 / resolution as f64;
            SweepPoint {
                lambda,
                estimate: exact_point(&chain, lambda),
            }
        })
        .collect())
}

/// Monte Carlo sweep over the same grid, through one seeded simulator.
pub fn estimate_lambda_relation(
    subscriber_count: usize,
    prob_count: usize,
    resolution: usize,
    tick_count: u64,
    seed: u64,
) -> Result<Vec<SweepPoint>, ModelError> {
    if resolution == 0 {
        return Err(ModelError::InvalidParameter {
            name: "resolution",
            value: 0.0,
        });
    }
    let mut simulator = AlohaSimulator::new(subscriber_count, prob_count, seed)?;

    Ok((1..=resolution)
        .map(|i| {
            let lambda = i as f64 / resolution as f64;
            SweepPoint {
                lambda,
                estimate: simulator.simulate(lambda, tick_count),
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_point_stays_in_bounds() {
        let chain = AlohaMarkovChain::new(5, 3).unwrap();
        let estimate = exact_point(&chain, 0.2).unwrap();

        assert!(
            estimate.avg_active_count >= 0.0 && estimate.avg_active_count <= 5.0,
            "avg active count was {}",
            estimate.avg_active_count
        );
        assert!(estimate.avg_delay.is_finite());
        assert!(estimate.avg_delay >= 0.5);
    }

    #[test]
    fn exact_pipeline_is_idempotent() {
        let chain = AlohaMarkovChain::new(5, 3).unwrap();
        let first = exact_point(&chain, 0.2).unwrap();
        let second = exact_point(&chain, 0.2).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn sweep_covers_the_grid() {
        let relation = calculate_lambda_relation(3, 2, 10).unwrap();

        assert_eq!(relation.len(), 10);
        for (i, point) in relation.iter().enumerate() {
            let expected = (i + 1) as f64 / 10.0;
            assert!((point.lambda - expected).abs() < 1e-12);
            assert!(point.estimate.is_ok(), "point {} failed", i);
        }
    }

    #[test]
    fn sweep_rejects_zero_resolution() {
        assert!(calculate_lambda_relation(3, 2, 0).is_err());
        assert!(estimate_lambda_relation(3, 2, 0, 1000, 13).is_err());
    }

    #[test]
    fn engines_agree_on_a_fixed_scenario() {
        let chain = AlohaMarkovChain::new(5, 3).unwrap();
        let exact = exact_point(&chain, 0.2).unwrap();

        let mut simulator = AlohaSimulator::new(5, 3, 13).unwrap();
        let simulated = simulator.simulate(0.2, 200_000).unwrap();

        // The two arrival discretizations differ, so the tolerance is wider
        // than Monte Carlo noise alone.
        let active_error =
            (simulated.avg_active_count - exact.avg_active_count).abs() / exact.avg_active_count;
        assert!(
            active_error < 0.10,
            "active count diverges: exact {} vs simulated {} ({:.1}%)",
            exact.avg_active_count,
            simulated.avg_active_count,
            active_error * 100.0
        );

        let delay_error = (simulated.avg_delay - exact.avg_delay).abs() / exact.avg_delay;
        assert!(
            delay_error < 0.15,
            "delay diverges: exact {} vs simulated {} ({:.1}%)",
            exact.avg_delay,
            simulated.avg_delay,
            delay_error * 100.0
        );
    }
}

use crate::binomial::binomial_experiment_prob;
use crate::ModelError;

/// Transmission probability of a backlogged subscriber at backoff stage `s_t`.
pub fn aloha_prob(s_t: usize) -> f64 {
    1.0 / (1u64 << s_t) as f64
}

/// Outcome of one tick on the shared medium, by number of simultaneous
/// transmission attempts: none, exactly one, or two and more.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TickOutcome {
    Empty,
    Success,
    Collision,
}

impl TickOutcome {
    /// Probability of each outcome when `backlogged` subscribers each attempt
    /// independently with probability `aloha_prob`. The collision entry is the
    /// residual, so the three probabilities sum to 1 by construction.
    pub fn distribution(backlogged: u32, aloha_prob: f64) -> [(TickOutcome, f64); 3] {
        let empty = binomial_experiment_prob(backlogged, 0, aloha_prob);
        let success = binomial_experiment_prob(backlogged, 1, aloha_prob);
        let collision = 1.0 - empty - success;

        [
            (TickOutcome::Empty, empty),
            (TickOutcome::Success, success),
            (TickOutcome::Collision, collision),
        ]
    }

    /// Classify an observed tick by its total attempt count.
    pub fn from_attempt_count(count: usize) -> TickOutcome {
        match count {
            0 => TickOutcome::Empty,
            1 => TickOutcome::Success,
            _ => TickOutcome::Collision,
        }
    }

    /// Next shared backoff stage, clamped to [0, prob_count].
    pub fn next_stage(self, s_t: usize, prob_count: usize) -> usize {
        match self {
            TickOutcome::Empty => s_t.saturating_sub(1),
            TickOutcome::Success => s_t,
            TickOutcome::Collision => (s_t + 1).min(prob_count),
        }
    }
}

/// Joint (backoff stage, backlogged count) Markov chain of the slotted-ALOHA
/// system with `subscriber_count` stations and maximum backoff stage
/// `prob_count`.
pub struct AlohaMarkovChain {
    subscriber_count: usize,
    prob_count: usize,
}

impl AlohaMarkovChain {
    pub fn new(subscriber_count: usize, prob_count: usize) -> Result<AlohaMarkovChain, ModelError> {
        if subscriber_count == 0 {
            return Err(ModelError::InvalidParameter {
                name: "subscriber_count",
                value: 0.0,
            });
        }
        // The stage probability is computed as a 64-bit shift.
        if prob_count > 63 {
            return Err(ModelError::InvalidParameter {
                name: "prob_count",
                value: prob_count as f64,
            });
        }

        Ok(AlohaMarkovChain {
            subscriber_count,
            prob_count,
        })
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriber_count
    }

    pub fn prob_count(&self) -> usize {
        self.prob_count
    }

    pub fn state_count(&self) -> usize {
        (self.subscriber_count + 1) * (self.prob_count + 1)
    }

    /// Linear id of state (s_t, n_t).
    pub fn state_number(&self, s_t: usize, n_t: usize) -> usize {
        assert!(s_t <= self.prob_count, "stage {} out of range", s_t);
        assert!(n_t <= self.subscriber_count, "backlog {} out of range", n_t);

        s_t * (self.subscriber_count + 1) + n_t
    }

    /// Inverse of `state_number`.
    pub fn state_name(&self, state_id: usize) -> (usize, usize) {
        assert!(state_id < self.state_count(), "state id {} out of range", state_id);

        let l = self.subscriber_count + 1;
        (state_id / l, state_id % l)
    }

    /// Row-stochastic one-tick transition matrix for aggregate arrival rate
    /// `lambda`. One tick is arrivals over the idle stations followed by the
    /// transmission outcome among the previously backlogged ones.
    pub fn transition_matrix(&self, lambda: f64) -> Result<Vec<Vec<f64>>, ModelError> {
        if !lambda.is_finite() || lambda <= 0.0 {
            return Err(ModelError::InvalidParameter {
                name: "lambda",
                value: lambda,
            });
        }

        let state_count = self.state_count();
        let mut matrix = vec![vec![0.0; state_count]; state_count];

        let inactive = (-lambda / self.subscriber_count as f64).exp();

        for s_t in 0..=self.prob_count {
            let aloha_prob = aloha_prob(s_t);

            for n_t in 0..=self.subscriber_count {
                let state_id = self.state_number(s_t, n_t);
                let idle = self.subscriber_count - n_t;

                for v_t in 0..=idle {
                    let activation_prob =
                        binomial_experiment_prob(idle as u32, v_t as u32, 1.0 - inactive);

                    for (outcome, outcome_prob) in TickOutcome::distribution(n_t as u32, aloha_prob)
                    {
                        let next_n = match outcome {
                            TickOutcome::Success => (n_t + v_t).saturating_sub(1),
                            _ => n_t + v_t,
                        };
                        let next_id =
                            self.state_number(outcome.next_stage(s_t, self.prob_count), next_n);

                        matrix[state_id][next_id] += outcome_prob * activation_prob;
                    }
                }
            }
        }

        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aloha_prob_halves_per_stage() {
        assert_eq!(aloha_prob(0), 1.0);
        assert_eq!(aloha_prob(1), 0.5);
        assert_eq!(aloha_prob(3), 0.125);
    }

    #[test]
    fn rejects_degenerate_parameters() {
        assert!(AlohaMarkovChain::new(0, 3).is_err());
        assert!(AlohaMarkovChain::new(5, 64).is_err());

        let chain = AlohaMarkovChain::new(5, 3).unwrap();
        assert!(chain.transition_matrix(0.0).is_err());
        assert!(chain.transition_matrix(-1.0).is_err());
        assert!(chain.transition_matrix(f64::NAN).is_err());
    }

    #[test]
    fn state_numbering_is_a_bijection() {
        let chain = AlohaMarkovChain::new(4, 3).unwrap();
        assert_eq!(chain.state_count(), 20);

        let mut seen = vec![false; chain.state_count()];
        for s_t in 0..=3 {
            for n_t in 0..=4 {
                let state_id = chain.state_number(s_t, n_t);
                assert!(!seen[state_id], "id {} hit twice", state_id);
                seen[state_id] = true;
                assert_eq!(chain.state_name(state_id), (s_t, n_t));
            }
        }
        assert!(seen.iter().all(|&hit| hit));
    }

    #[test]
    fn outcome_distribution_sums_to_one() {
        for backlogged in 0..=8 {
            for s_t in 0..=4 {
                let sum: f64 = TickOutcome::distribution(backlogged, aloha_prob(s_t))
                    .iter()
                    .map(|&(_, prob)| prob)
                    .sum();
                assert!(
                    (sum - 1.0).abs() < 1e-12,
                    "outcome sum for backlogged={} stage={} was {}",
                    backlogged,
                    s_t,
                    sum
                );
            }
        }
    }

    #[test]
    fn attempt_count_classification() {
        assert_eq!(TickOutcome::from_attempt_count(0), TickOutcome::Empty);
        assert_eq!(TickOutcome::from_attempt_count(1), TickOutcome::Success);
        assert_eq!(TickOutcome::from_attempt_count(2), TickOutcome::Collision);
        assert_eq!(TickOutcome::from_attempt_count(7), TickOutcome::Collision);
    }

    #[test]
    fn stage_transitions_clamp_at_both_ends() {
        assert_eq!(TickOutcome::Empty.next_stage(0, 3), 0);
        assert_eq!(TickOutcome::Empty.next_stage(2, 3), 1);
        assert_eq!(TickOutcome::Success.next_stage(2, 3), 2);
        assert_eq!(TickOutcome::Collision.next_stage(3, 3), 3);
        assert_eq!(TickOutcome::Collision.next_stage(1, 3), 2);
    }

    #[test]
    fn transition_rows_are_stochastic() {
        for &(subscriber_count, prob_count, lambda) in
            &[(2, 1, 0.3), (5, 3, 0.2), (5, 3, 1.0), (8, 4, 0.7)]
        {
            let chain = AlohaMarkovChain::new(subscriber_count, prob_count).unwrap();
            let matrix = chain.transition_matrix(lambda).unwrap();

            for (state_id, row) in matrix.iter().enumerate() {
                let sum: f64 = row.iter().sum();
                assert!(
                    (sum - 1.0).abs() < 1e-9,
                    "row {} of ({}, {}, {}) sums to {}",
                    state_id,
                    subscriber_count,
                    prob_count,
                    lambda,
                    sum
                );
            }
        }
    }

    #[test]
    fn empty_backlog_only_decrements_the_stage() {
        let chain = AlohaMarkovChain::new(3, 2).unwrap();
        let matrix = chain.transition_matrix(0.4).unwrap();

        // From (2, 0) no attempt can happen, so all mass lands on stage 1.
        let row = &matrix[chain.state_number(2, 0)];
        for (state_id, &prob) in row.iter().enumerate() {
            let (s_t, _) = chain.state_name(state_id);
            if prob > 0.0 {
                assert_eq!(s_t, 1, "state {} reachable from an idle tick", state_id);
            }
        }
    }

    #[test]
    fn construction_is_deterministic() {
        let chain = AlohaMarkovChain::new(5, 3).unwrap();
        let first = chain.transition_matrix(0.2).unwrap();
        let second = chain.transition_matrix(0.2).unwrap();
        assert_eq!(first, second);
    }
}

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::chain::{aloha_prob, TickOutcome};
use crate::relation::PointEstimate;
use crate::subscriber::Subscriber;
use crate::ModelError;

/// Monte Carlo estimator for the same quantities the Markov chain computes
/// exactly: advances `subscriber_count` stations and the shared backoff stage
/// tick by tick and averages the observed counters.
pub struct AlohaSimulator {
    subscriber_count: usize,
    prob_count: usize,
    rng: StdRng,
}

impl AlohaSimulator {
    pub fn new(
        subscriber_count: usize,
        prob_count: usize,
        seed: u64,
    ) -> Result<AlohaSimulator, ModelError> {
        if subscriber_count == 0 {
            return Err(ModelError::InvalidParameter {
                name: "subscriber_count",
                value: 0.0,
            });
        }
        if prob_count > 63 {
            return Err(ModelError::InvalidParameter {
                name: "prob_count",
                value: prob_count as f64,
            });
        }

        Ok(AlohaSimulator {
            subscriber_count,
            prob_count,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Run one seeded simulation at aggregate arrival rate `lambda` for
    /// `tick_count` ticks.
    pub fn simulate(&mut self, lambda: f64, tick_count: u64) -> Result<PointEstimate, ModelError> {
        if !lambda.is_finite() || lambda <= 0.0 {
            return Err(ModelError::InvalidParameter {
                name: "lambda",
                value: lambda,
            });
        }
        if tick_count == 0 {
            return Err(ModelError::InvalidParameter {
                name: "tick_count",
                value: 0.0,
            });
        }

        let mean = lambda / self.subscriber_count as f64;
        let mut subscribers = (0..self.subscriber_count)
            .map(|_| Subscriber::new(mean))
            .collect::<Result<Vec<_>, _>>()?;

        let mut s_t = 0;
        for tick in 0..tick_count {
            let prob = aloha_prob(s_t);

            let mut transmitted_count = 0;
            for subscriber in subscribers.iter_mut() {
                if subscriber.transmit(prob, &mut self.rng) {
                    transmitted_count += 1;
                }
            }

            for subscriber in subscribers.iter_mut() {
                subscriber.generate_new_request(tick, &mut self.rng);
            }

            for subscriber in subscribers.iter_mut() {
                subscriber.handle_transmission_result(transmitted_count, tick + 1);
            }

            s_t = TickOutcome::from_attempt_count(transmitted_count).next_stage(s_t, self.prob_count);
        }

        Ok(PointEstimate {
            avg_active_count: Self::average_active_count(&subscribers, tick_count),
            avg_delay: Self::average_delay(&subscribers),
        })
    }

    fn average_active_count(subscribers: &[Subscriber], duration: u64) -> f64 {
        let total_active: u64 = subscribers
            .iter()
            .map(|subscriber| subscriber.active_duration())
            .sum();

        total_active as f64 / duration as f64
    }

    fn average_delay(subscribers: &[Subscriber]) -> f64 {
        let transmission_count: u64 = subscribers
            .iter()
            .map(|subscriber| subscriber.transmission_count())
            .sum();
        if transmission_count == 0 {
            return f64::INFINITY;
        }

        let weighted_sum: f64 = subscribers
            .iter()
            .map(|subscriber| subscriber.overall_delay())
            .sum();

        weighted_sum / transmission_count as f64
    }
}

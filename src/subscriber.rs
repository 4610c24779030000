use rand::Rng;
use rand_distr::{Distribution, Poisson};

use crate::ModelError;

/// A pending request, stamped with its creation time. The fractional part of
/// the stamp is a uniform sub-tick offset so delays resolve below tick
/// granularity.
pub struct Request {
    creation_time: f64,
}

impl Request {
    pub fn new(creation_time: f64) -> Request {
        Request { creation_time }
    }

    pub fn time_since_creation(&self, current_time: u64) -> f64 {
        current_time as f64 - self.creation_time
    }
}

/// One station: holds at most one unsent request and accumulates statistics
/// over a simulation run. All randomness comes from the generator handle the
/// simulator passes in, never from generator state of its own.
pub struct Subscriber {
    request: Option<Request>,
    is_transmitting: bool,
    arrivals: Poisson<f64>,
    transmission_count: u64,
    overall_delay: f64,
    active_duration: u64,
}

impl Subscriber {
    /// `mean` is the per-tick arrival rate of this one station.
    pub fn new(mean: f64) -> Result<Subscriber, ModelError> {
        let arrivals = Poisson::new(mean).map_err(|_| ModelError::InvalidParameter {
            name: "arrival mean",
            value: mean,
        })?;

        Ok(Subscriber {
            request: None,
            is_transmitting: false,
            arrivals,
            transmission_count: 0,
            overall_delay: 0.0,
            active_duration: 0,
        })
    }

    /// Tick phase 1: a backlogged station counts the tick as active and
    /// attempts transmission with probability `prob`.
    pub fn transmit<R: Rng>(&mut self, prob: f64, rng: &mut R) -> bool {
        if self.request.is_some() {
            self.active_duration += 1;

            if rng.gen::<f64>() < prob {
                self.is_transmitting = true;
                return true;
            }
        }

        self.is_transmitting = false;
        false
    }

    /// Tick phase 2: an idle station becomes backlogged when its Poisson
    /// arrival draw fires, with a uniform sub-tick creation offset. No draw is
    /// taken while a request is pending.
    pub fn generate_new_request<R: Rng>(&mut self, tick: u64, rng: &mut R) {
        if self.request.is_some() || self.arrivals.sample(rng) < 1.0 {
            return;
        }

        self.request = Some(Request::new(tick as f64 + rng.gen::<f64>()));
    }

    /// Tick phase 3: the unique attempt of a tick succeeds and resolves the
    /// pending request.
    pub fn handle_transmission_result(&mut self, transmitted_count: usize, current_time: u64) {
        if transmitted_count != 1 || !self.is_transmitting {
            return;
        }

        if let Some(request) = self.request.take() {
            self.transmission_count += 1;
            self.overall_delay += request.time_since_creation(current_time);
        }
    }

    pub fn transmission_count(&self) -> u64 {
        self.transmission_count
    }

    pub fn active_duration(&self) -> u64 {
        self.active_duration
    }

    pub fn overall_delay(&self) -> f64 {
        self.overall_delay
    }
}

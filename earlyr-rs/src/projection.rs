//! Forward projection of incidence under a constant reproduction number.

use chrono::{Days, NaiveDate};
use log::{debug, trace};
use rand::{Rng, SeedableRng, distr::Distribution, rngs::StdRng};
use rand_distr::Poisson;
use rayon::prelude::*;

use crate::{
    error::{Error, Result},
    incidence::IncidenceSeries,
    infectivity::convolve,
    serial_interval::SerialIntervalDistribution,
};

/// Simulated daily incidence for the days following an observation window.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    first_date: NaiveDate,
    n_days: usize,
    trajectories: Vec<Vec<u64>>,
}

/// Draws `n_replicates` incidence trajectories for the `n_days` after the end
/// of `incidence`.
///
/// Each simulated day is Poisson with rate `r` times the infectivity of the
/// observed series extended by that replicate's own earlier draws. Results
/// depend only on `seed`, not on how replicates are scheduled.
pub fn simulate_forward(
    incidence: &IncidenceSeries,
    serial_interval: &SerialIntervalDistribution,
    r: f64,
    n_days: usize,
    n_replicates: usize,
    seed: u64,
) -> Result<Projection> {
    if !r.is_finite() || r < 0.0 {
        return Err(Error::invalid("r", format!("must be finite and >= 0, got {r}")));
    }
    let first_date = incidence.last_date().checked_add_days(Days::new(1));
    let last_date = first_date.and_then(|d| d.checked_add_days(Days::new(n_days as u64)));
    let (Some(first_date), Some(_)) = (first_date, last_date) else {
        return Err(Error::invalid(
            "n_days",
            "projection extends past the supported date range",
        ));
    };

    let mut rng = StdRng::seed_from_u64(seed);
    let replicate_seeds: Vec<u64> = (0..n_replicates).map(|_| rng.random()).collect();
    debug!("Projecting {n_days} days for {n_replicates} replicates at R = {r}");

    let trajectories = replicate_seeds
        .par_iter()
        .enumerate()
        .map(|(replicate, &replicate_seed)| -> Result<Vec<u64>> {
            let trajectory = simulate_replicate(
                incidence.counts(),
                serial_interval.pmf(),
                r,
                n_days,
                replicate_seed,
            )?;
            trace!(
                "Replicate {replicate}: {} projected cases",
                trajectory.iter().sum::<u64>()
            );
            Ok(trajectory)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Projection {
        first_date,
        n_days,
        trajectories,
    })
}

fn simulate_replicate(
    observed: &[u64],
    pmf: &[f64],
    r: f64,
    n_days: usize,
    seed: u64,
) -> Result<Vec<u64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut incidence = Vec::with_capacity(observed.len() + n_days);
    incidence.extend_from_slice(observed);
    for step in observed.len()..observed.len() + n_days {
        let rate = r * convolve(&incidence, pmf, step);
        let cases = if rate > 0. {
            // Poisson requires non-zero rate
            Poisson::new(rate)
                .map_err(|e| Error::Sampling(format!("Poisson rate {rate}: {e}")))?
                .sample(&mut rng) as u64
        } else {
            0
        };
        incidence.push(cases);
    }
    Ok(incidence.split_off(observed.len()))
}

impl Projection {
    /// The day after the observation window.
    pub fn first_date(&self) -> NaiveDate {
        self.first_date
    }

    pub fn n_days(&self) -> usize {
        self.n_days
    }

    pub fn n_replicates(&self) -> usize {
        self.trajectories.len()
    }

    /// One row per replicate, one column per projected day.
    pub fn trajectories(&self) -> &[Vec<u64>] {
        &self.trajectories
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.first_date.iter_days().take(self.n_days)
    }

    /// Mean projected incidence per day across replicates.
    pub fn daily_mean(&self) -> Vec<f64> {
        if self.trajectories.is_empty() {
            return vec![0.0; self.n_days];
        }
        let n = self.trajectories.len() as f64;
        (0..self.n_days)
            .map(|day| {
                self.trajectories
                    .iter()
                    .map(|trajectory| trajectory[day] as f64)
                    .sum::<f64>()
                    / n
            })
            .collect()
    }

    /// Empirical `q` quantile per day across replicates (nearest rank).
    pub fn daily_quantile(&self, q: f64) -> Result<Vec<u64>> {
        if !(0.0..=1.0).contains(&q) {
            return Err(Error::invalid("q", format!("must lie between 0 and 1, got {q}")));
        }
        if self.trajectories.is_empty() {
            return Ok(vec![0; self.n_days]);
        }
        let rank = ((q * self.trajectories.len() as f64).ceil() as usize).max(1) - 1;
        Ok((0..self.n_days)
            .map(|day| {
                let mut values: Vec<u64> = self
                    .trajectories
                    .iter()
                    .map(|trajectory| trajectory[day])
                    .collect();
                values.sort_unstable();
                values[rank]
            })
            .collect())
    }
}

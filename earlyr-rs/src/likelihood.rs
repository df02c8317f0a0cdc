//! Poisson likelihood of daily incidence as a function of the reproduction
//! number R, evaluated over a fixed grid of candidates.
//!
//! Incidence on day `t` is modelled as `y_t ~ Poisson(R * s_t)` where `s_t`
//! is the unscaled infectivity from [`crate::infectivity`]. Days with
//! `s_t = 0` carry no information about R and are left out of the sum, as
//! are days before the configured fitting start.

use log::{debug, info};
use rayon::prelude::*;
use serde::Serialize;
use statrs::{
    distribution::{ChiSquared, ContinuousCDF},
    function::gamma::ln_gamma,
};

use crate::{
    error::{Error, Result, ensure_positive},
    incidence::IncidenceSeries,
    infectivity::{Infectivity, unscaled_infectivity},
    serial_interval::SerialIntervalDistribution,
};

/// Fewest informative days needed to build a profile.
pub const MIN_INFORMATIVE_DAYS: usize = 2;

/// Largest number of candidates a grid may hold.
const MAX_GRID_POINTS: usize = 10_000_000;

/// Relative tolerance for grid spacing checks.
const GRID_TOLERANCE: f64 = 1e-9;

/// Equally spaced, strictly increasing candidate values of R.
#[derive(Debug, Clone, PartialEq)]
pub struct RGrid {
    values: Vec<f64>,
}

impl RGrid {
    /// The grid `0, step, 2 * step, ..., r_max`.
    pub fn new(r_max: f64, grid_step: f64) -> Result<Self> {
        ensure_positive("r_max", r_max)?;
        ensure_positive("grid_step", grid_step)?;

        let intervals = r_max / grid_step;
        let rounded = intervals.round();
        if rounded < 1.0 || f64::abs(intervals - rounded) > GRID_TOLERANCE * rounded {
            return Err(Error::invalid(
                "grid_step",
                format!("{grid_step} does not evenly divide r_max = {r_max}"),
            ));
        }
        if rounded >= MAX_GRID_POINTS as f64 {
            return Err(Error::invalid(
                "grid_step",
                format!("grid would hold more than {MAX_GRID_POINTS} points"),
            ));
        }

        let n = rounded as usize;
        let mut values: Vec<f64> = (0..n).map(|i| i as f64 * grid_step).collect();
        values.push(r_max);
        Ok(RGrid { values })
    }

    /// Uses caller-supplied candidates, which must be non-negative, strictly
    /// increasing and equally spaced.
    pub fn from_values(values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::invalid("r_grid", "at least one candidate is required"));
        }
        if let Some(bad) = values.iter().find(|r| !r.is_finite() || **r < 0.0) {
            return Err(Error::invalid(
                "r_grid",
                format!("candidates must be finite and non-negative, got {bad}"),
            ));
        }
        if values.len() > 1 {
            let step = values[1] - values[0];
            for pair in values.windows(2) {
                let gap = pair[1] - pair[0];
                if gap <= 0.0 {
                    return Err(Error::invalid("r_grid", "candidates must be strictly increasing"));
                }
                if f64::abs(gap - step) > GRID_TOLERANCE * step.max(pair[1]) {
                    return Err(Error::invalid("r_grid", "candidates must be equally spaced"));
                }
            }
        }
        Ok(RGrid { values })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Per-day quantities needed to evaluate the log-likelihood.
#[derive(Debug, Clone, Copy)]
struct DayTerm {
    count: f64,
    infectivity: f64,
    ln_count_factorial: f64,
}

impl DayTerm {
    fn log_likelihood(&self, r: f64) -> f64 {
        let lambda = r * self.infectivity;
        if self.count == 0.0 {
            // 0 * ln(0) is taken as 0
            return -lambda;
        }
        self.count * lambda.ln() - lambda - self.ln_count_factorial
    }
}

/// Likelihood of an incidence series for candidate values of R.
///
/// The unscaled infectivity is computed once on construction and reused for
/// every candidate.
#[derive(Debug, Clone)]
pub struct PoissonLikelihoodEstimator<'a> {
    incidence: &'a IncidenceSeries,
    infectivity: Infectivity,
    fit_start: usize,
    terms: Vec<DayTerm>,
}

impl<'a> PoissonLikelihoodEstimator<'a> {
    pub fn new(
        incidence: &'a IncidenceSeries,
        serial_interval: &SerialIntervalDistribution,
    ) -> Self {
        let infectivity = unscaled_infectivity(incidence, serial_interval);
        let terms = day_terms(incidence, &infectivity, 0);
        PoissonLikelihoodEstimator {
            incidence,
            infectivity,
            fit_start: 0,
            terms,
        }
    }

    /// Excludes days with index below `day` from the likelihood.
    pub fn with_fit_start(mut self, day: usize) -> Self {
        self.fit_start = day;
        self.terms = day_terms(self.incidence, &self.infectivity, day);
        self
    }

    pub fn incidence(&self) -> &IncidenceSeries {
        self.incidence
    }

    pub fn infectivity(&self) -> &Infectivity {
        &self.infectivity
    }

    pub fn fit_start(&self) -> usize {
        self.fit_start
    }

    /// Indices of the days that enter the likelihood.
    pub fn informative_days(&self) -> Vec<usize> {
        (self.fit_start..self.infectivity.len())
            .filter(|&t| self.infectivity.is_informative(t))
            .collect()
    }

    /// Log-likelihood at a single value of R, `-inf` when `r = 0` and any
    /// informative day has cases.
    pub fn log_likelihood(&self, r: f64) -> f64 {
        self.terms.iter().map(|term| term.log_likelihood(r)).sum()
    }

    /// Evaluates the log-likelihood over every candidate in `grid`.
    pub fn estimate(&self, grid: &RGrid) -> Result<LikelihoodProfile> {
        let informative_days = self.terms.len();
        if informative_days < MIN_INFORMATIVE_DAYS {
            return Err(Error::EmptyProfile { informative_days });
        }
        debug!(
            "Evaluating {} candidate R values over {informative_days} informative days",
            grid.len()
        );

        let log_likelihoods: Vec<f64> = grid
            .values()
            .par_iter()
            .map(|&r| self.log_likelihood(r))
            .collect();
        let profile = LikelihoodProfile {
            r_values: grid.values().to_vec(),
            log_likelihoods,
            informative_days,
        };
        info!(
            "Maximum likelihood R = {} (log-likelihood {:.4})",
            profile.point_estimate(),
            profile.max_log_likelihood()
        );
        Ok(profile)
    }
}

fn day_terms(
    incidence: &IncidenceSeries,
    infectivity: &Infectivity,
    fit_start: usize,
) -> Vec<DayTerm> {
    incidence
        .counts()
        .iter()
        .zip(infectivity.values())
        .skip(fit_start)
        .filter(|(_, s)| **s > 0.0)
        .map(|(&count, &s)| {
            let count = count as f64;
            DayTerm {
                count,
                infectivity: s,
                ln_count_factorial: ln_gamma(count + 1.0),
            }
        })
        .collect()
}

/// Builds the likelihood profile of `incidence` over `grid`.
pub fn estimate(
    incidence: &IncidenceSeries,
    serial_interval: &SerialIntervalDistribution,
    grid: &RGrid,
) -> Result<LikelihoodProfile> {
    PoissonLikelihoodEstimator::new(incidence, serial_interval).estimate(grid)
}

/// Log-likelihood for each candidate R, in grid order.
#[derive(Debug, Clone, PartialEq)]
pub struct LikelihoodProfile {
    r_values: Vec<f64>,
    log_likelihoods: Vec<f64>,
    informative_days: usize,
}

/// Likelihood-ratio confidence interval for R on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceInterval {
    pub level: f64,
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    pub fn contains(&self, r: f64) -> bool {
        self.lower <= r && r <= self.upper
    }
}

impl LikelihoodProfile {
    pub fn r_values(&self) -> &[f64] {
        &self.r_values
    }

    pub fn log_likelihoods(&self) -> &[f64] {
        &self.log_likelihoods
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.r_values
            .iter()
            .copied()
            .zip(self.log_likelihoods.iter().copied())
    }

    pub fn informative_days(&self) -> usize {
        self.informative_days
    }

    fn argmax(&self) -> usize {
        let mut best = 0;
        for (i, ll) in self.log_likelihoods.iter().enumerate().skip(1) {
            // strict comparison keeps the smallest R on ties
            if *ll > self.log_likelihoods[best] {
                best = i;
            }
        }
        best
    }

    /// Grid value of R with the highest log-likelihood.
    pub fn point_estimate(&self) -> f64 {
        self.r_values[self.argmax()]
    }

    pub fn max_log_likelihood(&self) -> f64 {
        self.log_likelihoods[self.argmax()]
    }

    /// Likelihood relative to its maximum, `exp(ll - max)`, in `[0, 1]`.
    pub fn relative_likelihoods(&self) -> Vec<f64> {
        let max = self.max_log_likelihood();
        self.log_likelihoods
            .iter()
            .map(|ll| (ll - max).exp())
            .collect()
    }

    /// The contiguous run of grid values around the point estimate whose
    /// log-likelihood lies within half the chi-squared(1) `level` quantile of
    /// the maximum.
    pub fn confidence_interval(&self, level: f64) -> Result<ConfidenceInterval> {
        if !(level > 0.0 && level < 1.0) {
            return Err(Error::invalid(
                "level",
                format!("must lie strictly between 0 and 1, got {level}"),
            ));
        }
        if self.informative_days < MIN_INFORMATIVE_DAYS {
            return Err(Error::EmptyProfile {
                informative_days: self.informative_days,
            });
        }

        let chi_squared =
            ChiSquared::new(1.0).map_err(|e| Error::invalid("level", e.to_string()))?;
        let best = self.argmax();
        let threshold = self.log_likelihoods[best] - 0.5 * chi_squared.inverse_cdf(level);

        let mut lower = best;
        while lower > 0 && self.log_likelihoods[lower - 1] >= threshold {
            lower -= 1;
        }
        let mut upper = best;
        let last = self.log_likelihoods.len() - 1;
        while upper < last && self.log_likelihoods[upper + 1] >= threshold {
            upper += 1;
        }
        Ok(ConfidenceInterval {
            level,
            lower: self.r_values[lower],
            upper: self.r_values[upper],
        })
    }
}

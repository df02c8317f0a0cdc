//! Discretized serial interval distributions.
//!
//! A continuous Gamma distribution is fitted to a mean and standard deviation
//! by moment matching and discretized onto whole-day offsets `1..=K`:
//!
//! ```text
//! w(k) = CDF(k + 0.5) - CDF(k - 0.5)
//! ```
//!
//! The retained weights are renormalized proportionally, so the mass below
//! half a day and beyond `K + 0.5` days is spread over every bin according to
//! its weight.

use log::debug;
use statrs::distribution::{ContinuousCDF, Gamma};

use crate::error::{Error, Result, ensure_positive};

/// Continuous tail mass allowed beyond the last retained offset.
pub const TAIL_TOLERANCE: f64 = 1e-4;

/// Upper bound on the support, explicit or searched for.
const MAX_SUPPORT_DAYS: usize = 100_000;

/// Probability mass over day offsets `1..=max_days`, summing to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct SerialIntervalDistribution {
    // index 0 holds the weight of offset 1
    weights: Vec<f64>,
}

impl SerialIntervalDistribution {
    /// Discretizes a Gamma distribution with the given `mean` and
    /// `standard_deviation` (both in days).
    ///
    /// When `max_days` is `None` the support starts at `ceil(mean + 10 * sd)`
    /// and is extended until the tail beyond it carries less than
    /// [`TAIL_TOLERANCE`] of the mass.
    pub fn from_gamma(
        mean: f64,
        standard_deviation: f64,
        max_days: Option<usize>,
    ) -> Result<Self> {
        ensure_positive("mean", mean)?;
        ensure_positive("standard_deviation", standard_deviation)?;
        match max_days {
            Some(0) => return Err(Error::invalid("max_days", "must be at least 1")),
            Some(days) if days > MAX_SUPPORT_DAYS => {
                return Err(Error::invalid(
                    "max_days",
                    format!("must be at most {MAX_SUPPORT_DAYS}, got {days}"),
                ));
            }
            _ => {}
        }

        let variance = standard_deviation * standard_deviation;
        let shape = mean * mean / variance;
        let rate = mean / variance;
        let gamma = Gamma::new(shape, rate).map_err(|e| {
            Error::invalid("standard_deviation", format!("cannot fit a Gamma distribution: {e}"))
        })?;

        let max_days = match max_days {
            Some(days) => days,
            None => default_max_days(&gamma, mean, standard_deviation)?,
        };

        let weights: Vec<f64> = (1..=max_days)
            .map(|k| {
                let k = k as f64;
                (gamma.cdf(k + 0.5) - gamma.cdf(k - 0.5)).max(0.0)
            })
            .collect();
        debug!("Discretized Gamma(shape={shape:.4}, rate={rate:.4}) over {max_days} days");
        Self::normalized(weights, "standard_deviation")
    }

    /// Builds a distribution from weights for offsets `1..=weights.len()`.
    ///
    /// Weights need not sum to 1; they are rescaled proportionally.
    pub fn from_pmf(weights: Vec<f64>) -> Result<Self> {
        if weights.is_empty() {
            return Err(Error::invalid("weights", "at least one weight is required"));
        }
        if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(Error::invalid(
                "weights",
                format!("weights must be finite and non-negative, got {bad}"),
            ));
        }
        Self::normalized(weights, "weights")
    }

    fn normalized(mut weights: Vec<f64>, name: &'static str) -> Result<Self> {
        let total: f64 = weights.iter().sum();
        if !total.is_finite() || total <= 0.0 {
            return Err(Error::invalid(name, "distribution has no mass on offsets 1 or more"));
        }
        for w in weights.iter_mut() {
            *w /= total;
        }
        Ok(SerialIntervalDistribution { weights })
    }

    /// Largest offset `K` with a (possibly zero) weight.
    pub fn max_days(&self) -> usize {
        self.weights.len()
    }

    /// Weights for offsets `1..=K`; element `i` belongs to offset `i + 1`.
    pub fn pmf(&self) -> &[f64] {
        &self.weights
    }

    /// Weight of offset `k` days, 0 outside `1..=K`.
    pub fn weight(&self, k: usize) -> f64 {
        if k == 0 {
            return 0.0;
        }
        self.weights.get(k - 1).copied().unwrap_or(0.0)
    }

    /// Mean of the discretized distribution in days.
    pub fn mean(&self) -> f64 {
        self.weights
            .iter()
            .enumerate()
            .map(|(i, w)| (i + 1) as f64 * w)
            .sum()
    }
}

fn default_max_days(gamma: &Gamma, mean: f64, standard_deviation: f64) -> Result<usize> {
    let initial = (mean + 10.0 * standard_deviation).ceil() as usize;
    let mut days = initial.clamp(1, MAX_SUPPORT_DAYS);
    while days < MAX_SUPPORT_DAYS && gamma.sf(days as f64 + 0.5) >= TAIL_TOLERANCE {
        days += 1;
    }
    let tail = gamma.sf(days as f64 + 0.5);
    if tail.is_nan() || tail >= TAIL_TOLERANCE {
        return Err(Error::invalid(
            "mean",
            format!("{tail:.4} of the mass lies past the {MAX_SUPPORT_DAYS}-day support limit"),
        ));
    }
    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sums_to_one() {
        for (mean, sd) in [(15.3, 9.3), (4.7, 2.9), (1.0, 0.2), (2.0, 6.0), (30.0, 1.0)] {
            let si = SerialIntervalDistribution::from_gamma(mean, sd, None).unwrap();
            let total: f64 = si.pmf().iter().sum();
            assert!(f64::abs(total - 1.0) < 1e-9, "mean={mean} sd={sd} total={total}");
            assert!(si.pmf().iter().all(|w| *w >= 0.0));
        }
    }

    #[test]
    fn test_default_support() {
        let si = SerialIntervalDistribution::from_gamma(15.3, 9.3, None).unwrap();
        // ceil(15.3 + 93.0)
        assert!(si.max_days() >= 109);
        let gamma = Gamma::new(15.3 * 15.3 / (9.3 * 9.3), 15.3 / (9.3 * 9.3)).unwrap();
        assert!(gamma.sf(si.max_days() as f64 + 0.5) < TAIL_TOLERANCE);
    }

    #[test]
    fn test_discrete_mean_close_to_continuous() {
        let si = SerialIntervalDistribution::from_gamma(15.3, 9.3, None).unwrap();
        assert!(f64::abs(si.mean() - 15.3) < 0.5);
    }

    #[test]
    fn test_explicit_max_days_truncates() {
        let si = SerialIntervalDistribution::from_gamma(5.0, 2.0, Some(3)).unwrap();
        assert_eq!(si.max_days(), 3);
        let total: f64 = si.pmf().iter().sum();
        assert!(f64::abs(total - 1.0) < 1e-9);
        assert_eq!(si.weight(0), 0.0);
        assert_eq!(si.weight(4), 0.0);
        // Gamma(6.25, 1.25) is increasing up to its mode at 4.2 days
        assert!(si.weight(1) < si.weight(2) && si.weight(2) < si.weight(3));
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(
            SerialIntervalDistribution::from_gamma(0.0, 1.0, None),
            Err(Error::InvalidParameter { name: "mean", .. })
        ));
        assert!(matches!(
            SerialIntervalDistribution::from_gamma(5.0, -2.0, None),
            Err(Error::InvalidParameter {
                name: "standard_deviation",
                ..
            })
        ));
        assert!(SerialIntervalDistribution::from_gamma(5.0, 2.0, Some(0)).is_err());
    }

    #[test]
    fn test_support_limit() {
        assert!(matches!(
            SerialIntervalDistribution::from_gamma(5.0, 2.0, Some(usize::MAX)),
            Err(Error::InvalidParameter { name: "max_days", .. })
        ));
        assert!(SerialIntervalDistribution::from_gamma(5.0, 2.0, Some(MAX_SUPPORT_DAYS)).is_ok());

        // Either way most of the mass would fall past the longest support
        assert!(matches!(
            SerialIntervalDistribution::from_gamma(99_000.0, 1_000.0, None),
            Err(Error::InvalidParameter { name: "mean", .. })
        ));
        assert!(matches!(
            SerialIntervalDistribution::from_gamma(200_000.0, 10.0, None),
            Err(Error::InvalidParameter { name: "mean", .. })
        ));
    }

    #[test]
    fn test_from_pmf() {
        let si = SerialIntervalDistribution::from_pmf(vec![0.0, 1.0, 2.0, 1.0]).unwrap();
        assert_eq!(si.pmf(), &[0.0, 0.25, 0.5, 0.25]);
        assert!(f64::abs(si.mean() - 3.0) < 1e-12);

        assert!(SerialIntervalDistribution::from_pmf(vec![]).is_err());
        assert!(SerialIntervalDistribution::from_pmf(vec![0.0, 0.0]).is_err());
        assert!(SerialIntervalDistribution::from_pmf(vec![0.5, -0.1]).is_err());
        assert!(SerialIntervalDistribution::from_pmf(vec![0.5, f64::NAN]).is_err());
    }
}

use crate::{incidence::IncidenceSeries, serial_interval::SerialIntervalDistribution};

/// Unscaled infectivity `s_t` for every day of an incidence series.
///
/// The force of infection on day `t` is `R * s_t`, so one `Infectivity` serves
/// every candidate R.
#[derive(Debug, Clone, PartialEq)]
pub struct Infectivity {
    values: Vec<f64>,
}

/// Computes `s_t = sum_{k=1}^{min(t, K)} y_{t-k} * w(k)` for each day `t`.
///
/// Days before the start of the series contribute nothing, so the first day
/// always has `s_0 = 0`.
pub fn unscaled_infectivity(
    incidence: &IncidenceSeries,
    serial_interval: &SerialIntervalDistribution,
) -> Infectivity {
    let counts = incidence.counts();
    let values = (0..counts.len())
        .map(|t| convolve(counts, serial_interval.pmf(), t))
        .collect();
    Infectivity { values }
}

/// Convolution of the counts before day `t` with a pmf over offsets `1..`.
pub(crate) fn convolve(counts: &[u64], pmf: &[f64], t: usize) -> f64 {
    let mut total = 0.0;
    for lag in 0..usize::min(t, pmf.len()) {
        total += counts[t - lag - 1] as f64 * pmf[lag];
    }
    total
}

impl Infectivity {
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether day `t` has any preceding infectious pressure.
    pub fn is_informative(&self, t: usize) -> bool {
        self.values.get(t).is_some_and(|s| *s > 0.0)
    }

    /// Poisson rate for day `t` under reproduction number `r`, `None` past
    /// the end of the series.
    pub fn lambda(&self, t: usize, r: f64) -> Option<f64> {
        self.values.get(t).map(|s| r * s)
    }

    /// The whole force-of-infection curve for reproduction number `r`.
    pub fn scaled(&self, r: f64) -> Vec<f64> {
        self.values.iter().map(|s| r * s).collect()
    }
}

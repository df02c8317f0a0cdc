//! Estimation of the reproduction number R early in an outbreak.
//!
//! Daily incidence is modelled as Poisson with rate `R * s_t`, where `s_t` is
//! past incidence convolved with a discretized serial interval. R is
//! estimated by maximum likelihood over a fixed grid, with a
//! likelihood-ratio confidence interval.
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use earlyr::{IncidenceSeries, RGrid, SerialIntervalDistribution, estimate};
//!
//! # fn main() -> earlyr::Result<()> {
//! let start = NaiveDate::from_ymd_opt(2014, 4, 1).unwrap();
//! let incidence = IncidenceSeries::from_counts(start, vec![1, 0, 1, 2, 1, 3, 2, 4, 3, 5])?;
//! let serial_interval = SerialIntervalDistribution::from_gamma(15.3, 9.3, None)?;
//! let profile = estimate(&incidence, &serial_interval, &RGrid::new(30.0, 0.1)?)?;
//! let interval = profile.confidence_interval(0.95)?;
//! println!("R = {} [{}, {}]", profile.point_estimate(), interval.lower, interval.upper);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod environment;
pub mod error;
pub mod incidence;
pub mod infectivity;
pub mod likelihood;
pub mod projection;
pub mod serial_interval;

pub use config::EstimationConfig;
pub use environment::Environment;
pub use error::{Error, Result};
pub use incidence::IncidenceSeries;
pub use infectivity::{Infectivity, unscaled_infectivity};
pub use likelihood::{
    ConfidenceInterval, LikelihoodProfile, PoissonLikelihoodEstimator, RGrid, estimate,
};
pub use projection::{Projection, simulate_forward};
pub use serial_interval::SerialIntervalDistribution;

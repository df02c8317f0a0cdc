use chrono::NaiveDate;
use earlyr::{
    ConfidenceInterval, IncidenceSeries, Infectivity, LikelihoodProfile, Projection,
};
use serde::Serialize;

#[derive(Debug, Serialize, PartialEq)]
pub struct ProfileRow {
    pub r: f64,
    pub log_likelihood: f64,
    pub relative_likelihood: f64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct InfectivityRow {
    pub date: NaiveDate,
    pub incidence: u64,
    pub unscaled: f64,
    pub scaled: f64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ProjectionRow {
    pub replicate: usize,
    pub date: NaiveDate,
    pub incidence: u64,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub replicate: u64,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub total_cases: u64,
    pub informative_days: usize,
    pub r_estimate: f64,
    pub max_log_likelihood: f64,
    pub interval: ConfidenceInterval,
}

impl Summary {
    pub fn new(
        replicate: u64,
        incidence: &IncidenceSeries,
        profile: &LikelihoodProfile,
        interval: ConfidenceInterval,
    ) -> Summary {
        Summary {
            replicate,
            first_date: incidence.first_date(),
            last_date: incidence.last_date(),
            total_cases: incidence.total(),
            informative_days: profile.informative_days(),
            r_estimate: profile.point_estimate(),
            max_log_likelihood: profile.max_log_likelihood(),
            interval,
        }
    }
}

pub fn profile_rows(profile: &LikelihoodProfile) -> Vec<ProfileRow> {
    profile
        .iter()
        .zip(profile.relative_likelihoods())
        .map(|((r, log_likelihood), relative_likelihood)| ProfileRow {
            r,
            log_likelihood,
            relative_likelihood,
        })
        .collect()
}

pub fn infectivity_rows(
    incidence: &IncidenceSeries,
    infectivity: &Infectivity,
    r: f64,
) -> Vec<InfectivityRow> {
    incidence
        .iter()
        .zip(infectivity.values().iter().zip(infectivity.scaled(r)))
        .map(|((date, incidence), (&unscaled, scaled))| InfectivityRow {
            date,
            incidence,
            unscaled,
            scaled,
        })
        .collect()
}

pub fn projection_rows(projection: &Projection) -> Vec<ProjectionRow> {
    let dates: Vec<NaiveDate> = projection.dates().collect();
    projection
        .trajectories()
        .iter()
        .enumerate()
        .flat_map(|(replicate, trajectory)| {
            dates
                .iter()
                .zip(trajectory)
                .map(move |(&date, &incidence)| ProjectionRow {
                    replicate,
                    date,
                    incidence,
                })
        })
        .collect()
}

#[cfg(test)]
mod test {
    use earlyr::{
        RGrid, SerialIntervalDistribution, estimate, simulate_forward, unscaled_infectivity,
    };

    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2014, 4, d).unwrap()
    }

    #[test]
    fn test_infectivity_rows() {
        let incidence = IncidenceSeries::from_counts(day(1), vec![2, 4]).unwrap();
        let si = SerialIntervalDistribution::from_pmf(vec![1.0]).unwrap();
        let rows = infectivity_rows(&incidence, &unscaled_infectivity(&incidence, &si), 1.5);
        assert_eq!(
            rows,
            vec![
                InfectivityRow {
                    date: day(1),
                    incidence: 2,
                    unscaled: 0.0,
                    scaled: 0.0
                },
                InfectivityRow {
                    date: day(2),
                    incidence: 4,
                    unscaled: 2.0,
                    scaled: 3.0
                },
            ]
        );
    }

    #[test]
    fn test_summary() {
        let incidence = IncidenceSeries::from_counts(day(1), vec![2, 4, 3, 6]).unwrap();
        let si = SerialIntervalDistribution::from_pmf(vec![1.0]).unwrap();
        let profile = estimate(&incidence, &si, &RGrid::new(5.0, 0.1).unwrap()).unwrap();
        let interval = profile.confidence_interval(0.95).unwrap();
        let summary = Summary::new(3, &incidence, &profile, interval);
        assert_eq!(summary.replicate, 3);
        assert_eq!(summary.last_date, day(4));
        assert_eq!(summary.total_cases, 15);
        assert_eq!(summary.informative_days, 3);
        assert_eq!(summary.r_estimate, profile.point_estimate());
        assert!(summary.interval.contains(summary.r_estimate));
    }

    #[test]
    fn test_projection_rows() {
        let incidence = IncidenceSeries::from_counts(day(1), vec![2, 4]).unwrap();
        let si = SerialIntervalDistribution::from_pmf(vec![1.0]).unwrap();
        let projection = simulate_forward(&incidence, &si, 1.0, 3, 2, 11).unwrap();
        let rows = projection_rows(&projection);
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0].date, day(3));
        assert_eq!(rows[2].date, day(5));
        assert_eq!(rows[3].replicate, 1);
        assert_eq!(rows[4].incidence, projection.trajectories()[1][1]);
    }
}

//! Daily incidence counts over a gap-free window of calendar days.

use chrono::{Days, NaiveDate};
use log::debug;

use crate::error::{Error, Result};

/// Case counts for consecutive calendar days, starting at `first_date`.
///
/// Days without observed onsets are stored as explicit zeros, so index `t`
/// always corresponds to `first_date + t` days.
#[derive(Debug, Clone, PartialEq)]
pub struct IncidenceSeries {
    first_date: NaiveDate,
    counts: Vec<u64>,
}

impl IncidenceSeries {
    /// Aggregates raw onset dates into daily counts.
    ///
    /// The series runs from the earliest onset to `last_date` inclusive, so
    /// trailing days without cases are kept as zeros instead of truncating the
    /// window at the last observed case.
    pub fn from_onset_dates(onsets: &[NaiveDate], last_date: NaiveDate) -> Result<Self> {
        let Some(&first_date) = onsets.iter().min() else {
            return Err(Error::invalid("onset_dates", "at least one onset date is required"));
        };
        if let Some(late) = onsets.iter().find(|&&date| date > last_date) {
            return Err(Error::invalid(
                "last_date",
                format!("onset on {late} falls after the last date {last_date}"),
            ));
        }

        let len = (last_date - first_date).num_days() as usize + 1;
        let mut counts = vec![0; len];
        for onset in onsets {
            counts[(*onset - first_date).num_days() as usize] += 1;
        }
        debug!(
            "Built incidence from {} onsets over {} days ({} to {})",
            onsets.len(),
            len,
            first_date,
            last_date
        );
        Ok(IncidenceSeries { first_date, counts })
    }

    /// Wraps counts that are already aggregated by day.
    pub fn from_counts(first_date: NaiveDate, counts: Vec<u64>) -> Result<Self> {
        if counts.is_empty() {
            return Err(Error::invalid("counts", "at least one day is required"));
        }
        if first_date
            .checked_add_days(Days::new(counts.len() as u64 - 1))
            .is_none()
        {
            return Err(Error::invalid("counts", "series extends past the supported date range"));
        }
        Ok(IncidenceSeries { first_date, counts })
    }

    pub fn first_date(&self) -> NaiveDate {
        self.first_date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.date(self.counts.len() - 1)
    }

    /// Calendar date of day index `t`.
    pub fn date(&self, t: usize) -> NaiveDate {
        self.first_date + Days::new(t as u64)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.first_date.iter_days().take(self.counts.len())
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, u64)> + '_ {
        self.dates().zip(self.counts.iter().copied())
    }

    /// Returns a copy with every count multiplied by `factor`.
    pub fn scaled(&self, factor: u64) -> Result<IncidenceSeries> {
        let counts = self
            .counts
            .iter()
            .map(|count| count.checked_mul(factor))
            .collect::<Option<Vec<u64>>>()
            .ok_or_else(|| {
                Error::invalid("factor", format!("scaling counts by {factor} overflows"))
            })?;
        Ok(IncidenceSeries {
            first_date: self.first_date,
            counts,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_from_onset_dates_fills_gaps() {
        let onsets = vec![day(5), day(2), day(2), day(4)];
        let series = IncidenceSeries::from_onset_dates(&onsets, day(8)).unwrap();
        assert_eq!(series.first_date(), day(2));
        assert_eq!(series.last_date(), day(8));
        assert_eq!(series.counts(), &[2, 0, 1, 1, 0, 0, 0]);
        assert_eq!(series.total(), 4);
    }

    #[test]
    fn test_dates_are_consecutive() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 27).unwrap();
        let series = IncidenceSeries::from_counts(start, vec![0; 5]).unwrap();
        let dates: Vec<NaiveDate> = series.dates().collect();
        for pair in dates.windows(2) {
            assert_eq!((pair[1] - pair[0]).num_days(), 1);
        }
        // 2024 is a leap year
        assert_eq!(dates[2], NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(series.last_date(), day(2));
    }

    #[test]
    fn test_single_day_window() {
        let series = IncidenceSeries::from_onset_dates(&[day(3)], day(3)).unwrap();
        assert_eq!(series.counts(), &[1]);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(IncidenceSeries::from_onset_dates(&[], day(3)).is_err());
        assert!(IncidenceSeries::from_onset_dates(&[day(1), day(9)], day(3)).is_err());
        assert!(IncidenceSeries::from_counts(day(1), vec![]).is_err());
    }

    #[test]
    fn test_scaled() {
        let series = IncidenceSeries::from_counts(day(1), vec![1, 0, 3]).unwrap();
        let doubled = series.scaled(2).unwrap();
        assert_eq!(doubled.counts(), &[2, 0, 6]);
        assert_eq!(doubled.first_date(), series.first_date());
        assert!(matches!(
            series.scaled(u64::MAX),
            Err(Error::InvalidParameter { name: "factor", .. })
        ));
    }
}

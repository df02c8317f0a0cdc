use chrono::NaiveDate;
use earlyr::EstimationConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Parameters {
    pub onset_dates: Vec<NaiveDate>,
    pub last_date: NaiveDate,
    pub si_mean: f64,
    pub si_sd: f64,
    #[serde(default)]
    pub si_max_days: Option<usize>,
    #[serde(default)]
    pub estimation: EstimationConfig,
}

#[cfg(test)]
mod test {
    use earlyr::Environment;

    use super::*;

    #[test]
    fn test_sample_input() {
        let ctx = Environment::from_reader(include_str!("../input.json").as_bytes())
            .unwrap()
            .with_input_type::<Parameters>()
            .unwrap();
        let parameters = ctx.input().unwrap();
        assert_eq!(ctx.seed, 8675309);
        assert_eq!(parameters.onset_dates.len(), 22);
        assert_eq!(parameters.last_date, NaiveDate::from_ymd_opt(2014, 4, 12).unwrap());
        assert_eq!(parameters.si_max_days, None);
        assert_eq!(parameters.estimation.r_max, 30.0);
        assert_eq!(parameters.estimation.confidence_level, 0.95);
        assert!(parameters.estimation.validate().is_ok());
    }

    #[test]
    fn test_sample_config_file() {
        let config = EstimationConfig::from_toml_str(include_str!("../estimation.toml")).unwrap();
        assert_eq!(config.fit_start, 1);
        assert_eq!(config.projection_replicates, 500);
    }
}

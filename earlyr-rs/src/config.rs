use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    likelihood::RGrid,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EstimationConfig {
    /// Upper bound of the R grid.
    pub r_max: f64,
    /// Spacing between candidate R values; must evenly divide `r_max`.
    pub grid_step: f64,
    pub confidence_level: f64,
    /// First day index allowed into the likelihood.
    pub fit_start: usize,
    pub projection_days: usize,
    pub projection_replicates: usize,
}

impl Default for EstimationConfig {
    fn default() -> Self {
        EstimationConfig {
            r_max: 10.0,
            grid_step: 0.01,
            confidence_level: 0.95,
            fit_start: 0,
            projection_days: 0,
            projection_replicates: 100,
        }
    }
}

impl EstimationConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: EstimationConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    /// Checks every field without building anything.
    pub fn validate(&self) -> Result<()> {
        self.grid()?;
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(Error::invalid(
                "confidence_level",
                format!("must lie strictly between 0 and 1, got {}", self.confidence_level),
            ));
        }
        Ok(())
    }

    pub fn grid(&self) -> Result<RGrid> {
        RGrid::new(self.r_max, self.grid_step)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = EstimationConfig::from_toml_str("").unwrap();
        assert_eq!(config, EstimationConfig::default());
        assert_eq!(config.grid().unwrap().len(), 1001);
    }

    #[test]
    fn test_partial_toml() {
        let config = EstimationConfig::from_toml_str(
            r#"
            r_max = 5.0
            grid_step = 0.1
            projection_days = 30
            "#,
        )
        .unwrap();
        assert_eq!(config.r_max, 5.0);
        assert_eq!(config.grid().unwrap().len(), 51);
        assert_eq!(config.projection_days, 30);
        assert_eq!(config.confidence_level, 0.95);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(matches!(
            EstimationConfig::from_toml_str("grid_step = 0.3\nr_max = 1.0"),
            Err(Error::InvalidParameter {
                name: "grid_step",
                ..
            })
        ));
        assert!(EstimationConfig::from_toml_str("r_max = -2.0").is_err());
        assert!(EstimationConfig::from_toml_str("confidence_level = 1.5").is_err());
        assert!(matches!(
            EstimationConfig::from_toml_str("rmax = 2.0"),
            Err(Error::Toml(_))
        ));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "r_max = 20.0\ngrid_step = 0.05\nconfidence_level = 0.9").unwrap();
        let config = EstimationConfig::from_path(file.path()).unwrap();
        assert_eq!(config.confidence_level, 0.9);
        assert_eq!(config.grid().unwrap().len(), 401);

        assert!(matches!(
            EstimationConfig::from_path("/nonexistent/earlyr.toml"),
            Err(Error::Io(_))
        ));
    }
}

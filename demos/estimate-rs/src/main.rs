pub mod output;
pub mod parameters;

use earlyr::{
    Environment, EstimationConfig, IncidenceSeries, PoissonLikelihoodEstimator,
    SerialIntervalDistribution, simulate_forward,
};
use log::{error, info};

use output::{Summary, infectivity_rows, profile_rows, projection_rows};
use parameters::Parameters;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(e) = run() {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run() -> earlyr::Result<()> {
    let ctx = Environment::<Parameters>::load()?;
    let parameters = ctx.input()?;

    // A config file replaces the inline estimation settings entirely
    let config = match ctx.file("config_file") {
        Some(path) => {
            info!("Reading estimation settings from {}", path.display());
            EstimationConfig::from_path(path)?
        }
        None => {
            parameters.estimation.validate()?;
            parameters.estimation.clone()
        }
    };
    let grid = config.grid()?;

    let incidence =
        IncidenceSeries::from_onset_dates(&parameters.onset_dates, parameters.last_date)?;
    let serial_interval = SerialIntervalDistribution::from_gamma(
        parameters.si_mean,
        parameters.si_sd,
        parameters.si_max_days,
    )?;

    let estimator = PoissonLikelihoodEstimator::new(&incidence, &serial_interval)
        .with_fit_start(config.fit_start);
    let profile = estimator.estimate(&grid)?;
    let interval = profile.confidence_interval(config.confidence_level)?;
    let r_estimate = profile.point_estimate();
    info!(
        "R = {r_estimate} ({:.0}% CI {} to {}) from {} cases between {} and {}",
        config.confidence_level * 100.0,
        interval.lower,
        interval.upper,
        incidence.total(),
        incidence.first_date(),
        incidence.last_date()
    );

    ctx.write_csv("likelihood_profile.csv", &profile_rows(&profile))?;
    ctx.write_csv(
        "infectivity.csv",
        &infectivity_rows(&incidence, estimator.infectivity(), r_estimate),
    )?;

    if config.projection_days > 0 {
        let projection = simulate_forward(
            &incidence,
            &serial_interval,
            r_estimate,
            config.projection_days,
            config.projection_replicates,
            ctx.seed,
        )?;
        ctx.write_csv("projection.csv", &projection_rows(&projection))?;
    }

    ctx.write_json(
        "summary.json",
        &Summary::new(ctx.replicate, &incidence, &profile, interval),
    )
}

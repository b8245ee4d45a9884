use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "solarsystem")]
#[command(about = "Animated solar system in the terminal: elliptical orbits, Kepler speeds, a moon, rings and a belt", long_about = None)]
pub(crate) struct Cli {
    /// Settings file (JSON). Defaults to settings.json in the user config dir.
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,

    /// Print the effective settings as JSON and exit
    #[arg(long, default_value_t = false)]
    pub(crate) print_config: bool,

    /// Run this many ticks without a terminal and print body positions
    #[arg(long, value_name = "TICKS")]
    pub(crate) headless: Option<u64>,

    /// Multiplier applied to every body's base speed
    #[arg(long)]
    pub(crate) time_scale: Option<f64>,

    /// Milliseconds of real time per simulation tick
    #[arg(long)]
    pub(crate) tick_ms: Option<u64>,

    /// FPS cap (render rate). Ticks run on their own fixed step.
    #[arg(long)]
    pub(crate) fps: Option<u32>,

    /// Ignore eccentricities and put every body on a circle
    #[arg(long, default_value_t = false)]
    pub(crate) circular: bool,

    /// Speed-law exponent k in (a/r)^k; 0 gives uniform angular speed
    #[arg(long, value_name = "K")]
    pub(crate) kepler_exponent: Option<f64>,

    /// Vertical squash for a perspective view, in (0, 1]
    #[arg(long)]
    pub(crate) tilt: Option<f64>,

    /// Seed for start angles, stars and the asteroid belt
    #[arg(long)]
    pub(crate) seed: Option<u64>,

    /// Number of background stars (0 = scale with the terminal)
    #[arg(long)]
    pub(crate) stars: Option<usize>,

    /// Number of asteroids in the belt
    #[arg(long)]
    pub(crate) belt: Option<usize>,

    #[arg(long, default_value_t = false)]
    pub(crate) no_labels: bool,

    #[arg(long, default_value_t = false)]
    pub(crate) no_legend: bool,

    #[arg(long, default_value_t = false)]
    pub(crate) no_orbits: bool,

    /// Write logs here (the terminal itself is busy drawing)
    #[arg(long)]
    pub(crate) log_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flags_means_no_overrides() {
        let cli = Cli::parse_from(["solarsystem"]);
        assert!(cli.config.is_none());
        assert!(cli.headless.is_none());
        assert!(cli.time_scale.is_none());
        assert!(!cli.circular);
        assert!(!cli.print_config);
    }

    #[test]
    fn parses_headless_and_paths() {
        let cli = Cli::parse_from([
            "solarsystem",
            "--headless",
            "500",
            "--config",
            "/tmp/s.json",
            "--log-file",
            "/tmp/s.log",
            "--kepler-exponent",
            "2",
        ]);
        assert_eq!(cli.headless, Some(500));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/s.json")));
        assert_eq!(cli.log_file, Some(PathBuf::from("/tmp/s.log")));
        assert_eq!(cli.kepler_exponent, Some(2.0));
    }

    #[test]
    fn rejects_non_numeric_tick() {
        assert!(Cli::try_parse_from(["solarsystem", "--tick-ms", "fast"]).is_err());
    }

    #[test]
    fn command_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

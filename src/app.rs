use crate::body::{Body, HasPosition};
use crate::cli::Cli;
use crate::config::{self, Settings};
use crate::input::quit_requested;
use crate::orbit;
use crate::render::{self, build_stars, Star, Terminal};
use crate::system::SolarSystem;
use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::time::{Duration, Instant};

/// Ticks allowed per frame before the backlog is dropped.
const MAX_CATCHUP_TICKS: u32 = 8;

pub(crate) struct App {
    settings: Settings,
    system: SolarSystem,
    term: Terminal,
    stars: Vec<Star>,
    started: Instant,
}

impl App {
    fn init(settings: Settings, system: SolarSystem) -> Result<Self> {
        let term = Terminal::begin()?;
        let mut app = Self {
            settings,
            system,
            term,
            stars: Vec::new(),
            started: Instant::now(),
        };
        app.rebuild_stars();
        Ok(app)
    }

    fn rebuild_stars(&mut self) {
        let (w, h) = (self.term.cols, self.term.rows);
        let scene_w = render::scene_width(w, &self.settings);
        let count = render::star_count(scene_w, h, &self.settings);
        let seed = self.settings.seed ^ ((w as u64) << 32) ^ (h as u64);
        self.stars = build_stars(scene_w, h, count, seed);
    }

    fn run(&mut self) -> Result<()> {
        let res = self.run_loop();
        let teardown = self.term.end();
        info!("stopped after {} ticks", self.system.ticks);
        first_error(res, teardown)
    }

    fn run_loop(&mut self) -> Result<()> {
        let frame_dt = Duration::from_secs_f64(1.0 / self.settings.fps_cap as f64);
        let tick_dt = Duration::from_millis(self.settings.tick_ms);

        let mut last_frame = Instant::now();
        let mut accum = Duration::ZERO;

        loop {
            if quit_requested(Duration::ZERO)? {
                return Ok(());
            }

            if self.term.resize_if_needed()? {
                debug!("resized to {}x{}", self.term.cols, self.term.rows);
                self.rebuild_stars();
            }

            // fixed-step ticks
            let now = Instant::now();
            accum = accum.saturating_add(now.saturating_duration_since(last_frame));
            last_frame = now;

            let (n, rest) = due_ticks(accum, tick_dt);
            if n == MAX_CATCHUP_TICKS && rest.is_zero() && accum > tick_dt * n {
                debug!("dropping {:?} of tick backlog", accum - tick_dt * n);
            }
            for _ in 0..n {
                self.system.tick();
            }
            accum = rest;

            render::draw_frame(
                &mut self.term.cur,
                &self.system,
                &self.settings,
                &self.stars,
                self.started.elapsed().as_secs_f32(),
            );
            self.term.present()?;

            // frame cap
            let elapsed = now.elapsed();
            if elapsed < frame_dt {
                std::thread::sleep(frame_dt - elapsed);
            }
        }
    }
}

/// How many ticks of `tick_dt` fit in `accum`, and what is carried into the
/// next frame. A backlog past `MAX_CATCHUP_TICKS` is dropped.
fn due_ticks(accum: Duration, tick_dt: Duration) -> (u32, Duration) {
    if tick_dt.is_zero() {
        return (0, accum);
    }
    let due = accum.as_nanos() / tick_dt.as_nanos();
    if due > MAX_CATCHUP_TICKS as u128 {
        return (MAX_CATCHUP_TICKS, Duration::ZERO);
    }
    let n = due as u32;
    (n, accum - tick_dt * n)
}

/// The loop's own error wins over one from restoring the terminal.
fn first_error(run: Result<()>, teardown: Result<()>) -> Result<()> {
    run.and(teardown)
}

/// One line per body: name, wrapped angle, distance from what it orbits, x, y.
pub(crate) fn report(system: &SolarSystem) -> Vec<String> {
    system
        .bodies
        .iter()
        .map(|body| {
            let pos = body.position();
            let r = match body {
                Body::Planet(_) => pos.len(),
                Body::Satellite(s) => pos.sub(system.bodies[s.parent].position()).len(),
            };
            format!(
                "{:<10} {:>8.2} {:>9.3} {:>9.3} {:>9.3}",
                body.name(),
                orbit::wrap_degrees(body.angle()),
                r,
                pos.x,
                pos.y
            )
        })
        .collect()
}

fn run_headless(system: &mut SolarSystem, ticks: u64, out: &mut impl Write) -> Result<()> {
    for _ in 0..ticks {
        system.tick();
    }
    writeln!(out, "{:<10} {:>8} {:>9} {:>9} {:>9}", "body", "angle", "r", "x", "y")?;
    for line in report(system) {
        writeln!(out, "{}", line)?;
    }
    info!("headless run finished after {} ticks", system.ticks);
    Ok(())
}

fn init_logging(log_file: Option<&Path>, headless: bool) -> Result<()> {
    let env = env_logger::Env::default().default_filter_or("info");
    let mut builder = env_logger::Builder::from_env(env);
    match log_file {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        // stderr would land on top of the animation
        None if !headless => return Ok(()),
        None => {
            builder.target(env_logger::Target::Stderr);
        }
    }
    builder.try_init()?;
    Ok(())
}

pub(crate) fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref(), cli.headless.is_some() || cli.print_config)?;

    let settings = config::resolve(&cli)?;
    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&settings)?);
        return Ok(());
    }

    let mut system = SolarSystem::new(&settings)?;
    info!(
        "{} bodies, {} asteroids, tick {} ms, time scale {}, {:?} orbits, speed {}",
        system.bodies.len(),
        system.belt.len(),
        settings.tick_ms,
        settings.time_scale,
        settings.orbit_model,
        settings.speed_law.describe()
    );
    for body in &system.bodies {
        let o = body.orbit();
        debug!(
            "{}: a {} e {} perihelion {:.1} aphelion {:.1}",
            body.name(),
            o.a,
            o.e,
            orbit::perihelion(o),
            orbit::aphelion(o)
        );
    }

    match cli.headless {
        Some(ticks) => run_headless(&mut system, ticks, &mut io::stdout().lock()),
        None => App::init(settings, system)?.run(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OrbitModel;
    use crate::orbit::SpeedLaw;

    #[test]
    fn due_ticks_counts_whole_ticks() {
        let tick = Duration::from_millis(30);
        assert_eq!(due_ticks(Duration::ZERO, tick), (0, Duration::ZERO));
        assert_eq!(due_ticks(Duration::from_millis(29), tick), (0, Duration::from_millis(29)));
        assert_eq!(due_ticks(Duration::from_millis(90), tick), (3, Duration::ZERO));
        assert_eq!(due_ticks(Duration::from_millis(100), tick), (3, Duration::from_millis(10)));
    }

    #[test]
    fn due_ticks_caps_backlog() {
        let tick = Duration::from_millis(30);
        assert_eq!(due_ticks(tick * 8, tick), (8, Duration::ZERO));
        assert_eq!(due_ticks(tick * 8 + Duration::from_millis(5), tick), (8, Duration::from_millis(5)));
        assert_eq!(due_ticks(tick * 9, tick), (MAX_CATCHUP_TICKS, Duration::ZERO));
        assert_eq!(due_ticks(Duration::from_secs(3600), tick), (MAX_CATCHUP_TICKS, Duration::ZERO));
    }

    #[test]
    fn remainder_carries_into_later_frames() {
        let tick = Duration::from_millis(30);
        let mut accum = Duration::ZERO;
        let mut total = 0;
        for _ in 0..10 {
            accum += Duration::from_millis(20);
            let (n, rest) = due_ticks(accum, tick);
            total += n;
            accum = rest;
        }
        // 200 ms at 30 ms per tick
        assert_eq!(total, 6);
        assert_eq!(accum, Duration::from_millis(20));
    }

    #[test]
    fn loop_error_is_reported_before_teardown_error() {
        let err = first_error(Err(anyhow::anyhow!("loop failed")), Err(anyhow::anyhow!("teardown failed")))
            .expect_err("error");
        assert_eq!(err.to_string(), "loop failed");

        let err = first_error(Ok(()), Err(anyhow::anyhow!("teardown failed"))).expect_err("error");
        assert_eq!(err.to_string(), "teardown failed");
        assert!(first_error(Ok(()), Ok(())).is_ok());
    }

    #[test]
    fn headless_prints_header_and_every_body() {
        let settings = Settings {
            belt_count: 0,
            ..Settings::default()
        };
        let mut system = SolarSystem::new(&settings).expect("build");
        let mut out = Vec::new();
        run_headless(&mut system, 100, &mut out).expect("headless run");

        let text = String::from_utf8(out).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1 + settings.bodies.len());
        assert!(lines[0].starts_with("body"));
        assert!(lines.iter().any(|l| l.starts_with("Saturn")));
        assert!(lines.iter().any(|l| l.starts_with("Moon")));
        assert_eq!(system.ticks, 100);
    }

    #[test]
    fn report_radius_is_distance_from_focus_or_parent() {
        let settings = Settings {
            belt_count: 0,
            orbit_model: OrbitModel::Circular,
            speed_law: SpeedLaw::Uniform,
            ..Settings::default()
        };
        let mut system = SolarSystem::new(&settings).expect("build");
        system.tick();
        let lines = report(&system);

        let radius = |name: &str| -> f64 {
            let line = lines.iter().find(|l| l.starts_with(name)).expect("line");
            line.split_whitespace().nth(2).expect("r column").parse().expect("number")
        };
        assert!((radius("Earth") - 120.0).abs() < 1e-3);
        assert!((radius("Neptune") - 350.0).abs() < 1e-3);
        assert!((radius("Moon") - 14.0).abs() < 1e-3);
    }

    #[test]
    fn report_angles_are_wrapped() {
        let settings = Settings {
            belt_count: 0,
            time_scale: 50.0,
            ..Settings::default()
        };
        let mut system = SolarSystem::new(&settings).expect("build");
        for _ in 0..200 {
            system.tick();
        }
        for line in report(&system) {
            let angle: f64 = line.split_whitespace().nth(1).expect("angle").parse().expect("number");
            assert!((0.0..=360.0).contains(&angle), "{}", line);
        }
    }
}

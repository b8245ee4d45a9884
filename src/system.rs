use crate::body::{Body, HasPosition, Planet, Satellite};
use crate::config::{OrbitModel, Settings};
use crate::orbit::{self, Orbit, SpeedLaw, Vec2};
use anyhow::{bail, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::HashMap;

pub(crate) const BELT_INNER: f64 = 165.0;
pub(crate) const BELT_OUTER: f64 = 185.0;
const BELT_SPEED: f64 = 0.25;

#[derive(Clone, Copy, Debug)]
pub(crate) struct Asteroid {
    pub(crate) radius: f64,
    pub(crate) angle: f64,
    pub(crate) speed: f64,
}

impl Asteroid {
    pub(crate) fn position(&self, tilt: f64) -> Vec2 {
        orbit::position(self.angle, Orbit::circular(self.radius), tilt)
    }
}

fn build_belt(count: usize, rng: &mut StdRng) -> Vec<Asteroid> {
    let mut belt = Vec::with_capacity(count);
    for _ in 0..count {
        belt.push(Asteroid {
            radius: rng.gen_range(BELT_INNER..BELT_OUTER),
            angle: rng.gen_range(0.0..360.0),
            speed: BELT_SPEED * rng.gen_range(0.8..1.2),
        });
    }
    belt
}

/// Everything that moves. Owned by the animation loop and handed to the
/// renderer by reference.
pub(crate) struct SolarSystem {
    pub(crate) time_scale: f64,
    pub(crate) speed_law: SpeedLaw,
    pub(crate) tilt: f64,
    pub(crate) bodies: Vec<Body>,
    pub(crate) belt: Vec<Asteroid>,
    pub(crate) ticks: u64,
}

impl SolarSystem {
    pub(crate) fn new(settings: &Settings) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(settings.seed);
        let tilt = settings.tilt;

        let mut index: HashMap<&str, usize> = HashMap::new();
        for (i, spec) in settings.bodies.iter().enumerate() {
            if index.insert(spec.name.as_str(), i).is_some() {
                bail!("duplicate body name {:?}", spec.name);
            }
        }

        let mut bodies = Vec::with_capacity(settings.bodies.len());
        for spec in &settings.bodies {
            let orbit = match settings.orbit_model {
                OrbitModel::Circular => Orbit::circular(spec.a),
                OrbitModel::Elliptical => spec.orbit(),
            };
            if !orbit.is_valid() {
                bail!("{}: invalid orbit a = {}, e = {}", spec.name, orbit.a, orbit.e);
            }
            let angle = f64::from(rng.gen_range(0..=360u32));

            let body = match &spec.parent {
                None => Body::Planet(Planet::new(spec, orbit, angle, tilt)),
                Some(parent_name) => {
                    let Some(&parent) = index.get(parent_name.as_str()) else {
                        bail!("{}: unknown parent {:?}", spec.name, parent_name);
                    };
                    if settings.bodies[parent].parent.is_some() {
                        bail!("{}: parent {:?} is itself a satellite", spec.name, parent_name);
                    }
                    Body::Satellite(Satellite::new(spec, parent, orbit, angle))
                }
            };
            bodies.push(body);
        }

        let belt = build_belt(settings.belt_count, &mut rng);

        let mut system = Self {
            time_scale: settings.time_scale,
            speed_law: settings.speed_law,
            tilt,
            bodies,
            belt,
            ticks: 0,
        };
        system.place_satellites(false);
        Ok(system)
    }

    /// One animation step: planets first, then satellites around their
    /// parents' new positions, then the belt.
    pub(crate) fn tick(&mut self) {
        let (time_scale, law, tilt) = (self.time_scale, self.speed_law, self.tilt);

        for body in self.bodies.iter_mut() {
            if let Body::Planet(p) = body {
                p.advance(time_scale, law, tilt);
            }
        }
        self.place_satellites(true);

        for a in self.belt.iter_mut() {
            a.angle = orbit::advance(a.angle, a.speed, time_scale, 1.0);
        }
        self.ticks += 1;
    }

    fn place_satellites(&mut self, advance: bool) {
        let (time_scale, law, tilt) = (self.time_scale, self.speed_law, self.tilt);
        let parents: Vec<Vec2> = self.bodies.iter().map(|b| b.position()).collect();

        for body in self.bodies.iter_mut() {
            if let Body::Satellite(s) = body {
                let parent_pos = parents[s.parent];
                if advance {
                    s.advance(parent_pos, time_scale, law, tilt);
                } else {
                    s.place(parent_pos, tilt);
                }
            }
        }
    }

    /// Largest distance from the sun any drawn object can reach.
    pub(crate) fn extent(&self) -> f64 {
        let mut max_r: f64 = if self.belt.is_empty() { 0.0 } else { BELT_OUTER };
        for body in &self.bodies {
            let r = match body {
                Body::Planet(p) => orbit::aphelion(p.orbit),
                Body::Satellite(s) => match &self.bodies[s.parent] {
                    Body::Planet(parent) => orbit::aphelion(parent.orbit) + orbit::aphelion(s.orbit),
                    Body::Satellite(_) => 0.0,
                },
            };
            max_r = max_r.max(r);
        }
        max_r
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{default_table, BodySpec, Rgb};
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn settings() -> Settings {
        Settings {
            belt_count: 20,
            ..Settings::default()
        }
    }

    fn find<'a>(sys: &'a SolarSystem, name: &str) -> &'a Body {
        sys.bodies.iter().find(|b| b.name() == name).expect("body present")
    }

    #[test]
    fn builds_from_default_table() {
        let sys = SolarSystem::new(&settings()).expect("build");
        assert_eq!(sys.bodies.len(), default_table().len());
        assert_eq!(sys.belt.len(), 20);
        assert_eq!(sys.ticks, 0);
        for b in &sys.bodies {
            assert!((0.0..=360.0).contains(&b.angle()));
            assert_eq!(b.angle().fract(), 0.0);
        }
    }

    #[test]
    fn same_seed_same_start() {
        let a = SolarSystem::new(&settings()).expect("build");
        let b = SolarSystem::new(&settings()).expect("build");
        let angles = |s: &SolarSystem| s.bodies.iter().map(|b| b.angle()).collect::<Vec<_>>();
        assert_eq!(angles(&a), angles(&b));
    }

    #[test]
    fn moon_tracks_earth_after_ticks() {
        let mut sys = SolarSystem::new(&settings()).expect("build");
        for _ in 0..250 {
            sys.tick();
            let earth = find(&sys, "Earth").position();
            let Body::Satellite(moon) = find(&sys, "Moon") else {
                panic!("moon should be a satellite");
            };
            let expected = earth.add(moon.offset(sys.tilt));
            assert_abs_diff_eq!(moon.position().x, expected.x, epsilon = 1e-9);
            assert_abs_diff_eq!(moon.position().y, expected.y, epsilon = 1e-9);
            assert_relative_eq!(moon.position().sub(earth).len(), 14.0, max_relative = 1e-9);
        }
        assert_eq!(sys.ticks, 250);
    }

    #[test]
    fn angles_never_decrease() {
        let mut sys = SolarSystem::new(&settings()).expect("build");
        let mut last: Vec<f64> = sys.bodies.iter().map(|b| b.angle()).collect();
        for _ in 0..1000 {
            sys.tick();
            for (b, prev) in sys.bodies.iter().zip(last.iter_mut()) {
                assert!(b.angle() >= *prev, "{} went backwards", b.name());
                *prev = b.angle();
            }
        }
    }

    #[test]
    fn uniform_circular_tick_moves_by_speed_times_scale() {
        let s = Settings {
            orbit_model: OrbitModel::Circular,
            speed_law: SpeedLaw::Uniform,
            ..settings()
        };
        let mut sys = SolarSystem::new(&s).expect("build");
        let before: Vec<f64> = sys.bodies.iter().map(|b| b.angle()).collect();
        sys.tick();
        for ((b, spec), prev) in sys.bodies.iter().zip(&s.bodies).zip(before) {
            assert_relative_eq!(b.angle() - prev, spec.speed * 0.3, max_relative = 1e-9);
        }
    }

    #[test]
    fn circular_model_puts_planets_on_circles() {
        let s = Settings {
            orbit_model: OrbitModel::Circular,
            ..settings()
        };
        let mut sys = SolarSystem::new(&s).expect("build");
        for _ in 0..50 {
            sys.tick();
        }
        for b in &sys.bodies {
            if let Body::Planet(p) = b {
                assert_eq!(p.orbit.e, 0.0);
                assert_relative_eq!(p.position().len(), p.orbit.a, max_relative = 1e-9);
            }
        }
    }

    #[test]
    fn kepler_law_is_faster_at_perihelion() {
        let spec = BodySpec {
            name: "Comet".to_string(),
            color: Rgb::new(255, 255, 255),
            size: 2.0,
            a: 100.0,
            e: 0.5,
            speed: 1.0,
            parent: None,
            rings: false,
        };
        let s = Settings {
            bodies: vec![spec],
            belt_count: 0,
            speed_law: SpeedLaw::Kepler { exponent: 2.0 },
            time_scale: 1.0,
            ..Settings::default()
        };
        let mut sys = SolarSystem::new(&s).expect("build");
        let Body::Planet(p) = &mut sys.bodies[0] else {
            panic!("planet expected");
        };
        p.angle = 0.0;
        p.advance(1.0, SpeedLaw::Kepler { exponent: 2.0 }, 1.0);
        let near = p.angle;
        p.angle = 180.0;
        p.advance(1.0, SpeedLaw::Kepler { exponent: 2.0 }, 1.0);
        let far = p.angle - 180.0;
        assert_relative_eq!(near, 4.0, max_relative = 1e-9);
        assert_relative_eq!(far, 4.0 / 9.0, max_relative = 1e-9);
    }

    #[test]
    fn belt_stays_inside_its_band() {
        let mut sys = SolarSystem::new(&settings()).expect("build");
        for _ in 0..100 {
            sys.tick();
        }
        for a in &sys.belt {
            let r = a.position(1.0).len();
            assert!(r >= BELT_INNER - 1e-9 && r <= BELT_OUTER + 1e-9);
        }
    }

    #[test]
    fn rejects_unknown_or_nested_parents() {
        let mut s = settings();
        s.bodies[8].parent = Some("Pluto".to_string());
        let err = SolarSystem::new(&s).err().expect("unknown parent");
        assert!(err.to_string().contains("unknown parent"));

        let mut s = settings();
        let mut sub = s.bodies[8].clone();
        sub.name = "Submoon".to_string();
        sub.parent = Some("Moon".to_string());
        s.bodies.push(sub);
        let err = SolarSystem::new(&s).err().expect("nested satellite");
        assert!(err.to_string().contains("itself a satellite"));
    }

    #[test]
    fn extent_covers_outermost_aphelion() {
        let sys = SolarSystem::new(&settings()).expect("build");
        assert_relative_eq!(sys.extent(), 350.0 * 1.010, max_relative = 1e-12);

        let none = SolarSystem::new(&Settings {
            bodies: vec![default_table()[0].clone()],
            ..settings()
        })
        .expect("build");
        assert_relative_eq!(none.extent(), BELT_OUTER);
    }
}

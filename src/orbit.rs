use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Vec2 {
    pub(crate) x: f64,
    pub(crate) y: f64,
}

impl Vec2 {
    pub(crate) fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
    pub(crate) fn add(self, o: Vec2) -> Vec2 {
        Vec2 { x: self.x + o.x, y: self.y + o.y }
    }
    pub(crate) fn sub(self, o: Vec2) -> Vec2 {
        Vec2 { x: self.x - o.x, y: self.y - o.y }
    }
    pub(crate) fn len(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

/// Semi-major axis and eccentricity of an orbit around the focus at the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Orbit {
    pub(crate) a: f64,
    pub(crate) e: f64,
}

impl Orbit {
    pub(crate) fn new(a: f64, e: f64) -> Self {
        Self { a, e }
    }
    pub(crate) fn circular(a: f64) -> Self {
        Self { a, e: 0.0 }
    }
    pub(crate) fn is_valid(&self) -> bool {
        self.a.is_finite() && self.a > 0.0 && self.e.is_finite() && (0.0..1.0).contains(&self.e)
    }
}

/// How angular speed varies around an orbit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "law", rename_all = "snake_case")]
pub(crate) enum SpeedLaw {
    Uniform,
    /// Multiplier `(a / r)^exponent`: faster near perihelion.
    Kepler { exponent: f64 },
}

impl SpeedLaw {
    pub(crate) fn multiplier(self, orbit: Orbit, r: f64) -> f64 {
        match self {
            SpeedLaw::Uniform => 1.0,
            SpeedLaw::Kepler { exponent } => (orbit.a / r).powf(exponent),
        }
    }

    pub(crate) fn describe(self) -> String {
        match self {
            SpeedLaw::Uniform => "uniform".to_string(),
            SpeedLaw::Kepler { exponent } => format!("kepler^{:.1}", exponent),
        }
    }
}

/// Radius at `theta_deg` from the polar ellipse equation r = a(1-e²)/(1+e·cosθ).
pub(crate) fn polar_radius(orbit: Orbit, theta_deg: f64) -> f64 {
    let theta = theta_deg.to_radians();
    orbit.a * (1.0 - orbit.e * orbit.e) / (1.0 + orbit.e * theta.cos())
}

pub(crate) fn perihelion(orbit: Orbit) -> f64 {
    orbit.a * (1.0 - orbit.e)
}

pub(crate) fn aphelion(orbit: Orbit) -> f64 {
    orbit.a * (1.0 + orbit.e)
}

/// Cartesian position relative to the focus. `tilt` squashes y for a
/// perspective look; 1.0 is straight down onto the orbital plane.
pub(crate) fn position(angle_deg: f64, orbit: Orbit, tilt: f64) -> Vec2 {
    let r = polar_radius(orbit, angle_deg);
    let (s, c) = angle_deg.to_radians().sin_cos();
    Vec2 { x: r * c, y: r * s * tilt }
}

pub(crate) fn advance(angle_deg: f64, base_speed: f64, time_scale: f64, multiplier: f64) -> f64 {
    angle_deg + base_speed * time_scale * multiplier
}

/// One tick of angular motion under `law`, using the radius at the current angle.
pub(crate) fn step(angle_deg: f64, orbit: Orbit, base_speed: f64, time_scale: f64, law: SpeedLaw) -> f64 {
    let r = polar_radius(orbit, angle_deg);
    advance(angle_deg, base_speed, time_scale, law.multiplier(orbit, r))
}

pub(crate) fn wrap_degrees(angle_deg: f64) -> f64 {
    angle_deg.rem_euclid(360.0)
}

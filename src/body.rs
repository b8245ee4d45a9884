use crate::orbit::{self, Orbit, SpeedLaw, Vec2};
use crossterm::style::Color;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Rgb {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
}

impl Rgb {
    pub(crate) const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
    pub(crate) fn to_color(self) -> Color {
        Color::Rgb { r: self.r, g: self.g, b: self.b }
    }
    pub(crate) fn scale(self, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        Rgb {
            r: (self.r as f32 * t).round() as u8,
            g: (self.g as f32 * t).round() as u8,
            b: (self.b as f32 * t).round() as u8,
        }
    }
}

/// One row of the static body table, as it appears in the settings file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct BodySpec {
    pub(crate) name: String,
    pub(crate) color: Rgb,
    pub(crate) size: f64,
    /// Semi-major axis; for satellites, distance from the parent.
    pub(crate) a: f64,
    #[serde(default)]
    pub(crate) e: f64,
    /// Degrees per tick before time scale and speed law.
    pub(crate) speed: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) parent: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) rings: bool,
}

impl BodySpec {
    fn planet(name: &str, color: Rgb, size: f64, a: f64, e: f64, speed: f64) -> Self {
        Self {
            name: name.to_string(),
            color,
            size,
            a,
            e,
            speed,
            parent: None,
            rings: false,
        }
    }
    fn with_rings(mut self) -> Self {
        self.rings = true;
        self
    }
    fn satellite(name: &str, parent: &str, color: Rgb, size: f64, a: f64, speed: f64) -> Self {
        Self {
            name: name.to_string(),
            color,
            size,
            a,
            e: 0.0,
            speed,
            parent: Some(parent.to_string()),
            rings: false,
        }
    }
    pub(crate) fn orbit(&self) -> Orbit {
        Orbit::new(self.a, self.e)
    }
}

pub(crate) fn default_table() -> Vec<BodySpec> {
    vec![
        BodySpec::planet("Mercury", Rgb::new(170, 170, 170), 5.0, 60.0, 0.206, 0.8),
        BodySpec::planet("Venus", Rgb::new(255, 165, 0), 8.0, 90.0, 0.007, 0.6),
        BodySpec::planet("Earth", Rgb::new(70, 120, 255), 9.0, 120.0, 0.017, 0.4),
        BodySpec::planet("Mars", Rgb::new(230, 70, 50), 7.0, 150.0, 0.093, 0.3),
        BodySpec::planet("Jupiter", Rgb::new(180, 120, 70), 15.0, 200.0, 0.049, 0.2),
        BodySpec::planet("Saturn", Rgb::new(255, 215, 0), 13.0, 250.0, 0.057, 0.15).with_rings(),
        BodySpec::planet("Uranus", Rgb::new(173, 216, 230), 11.0, 300.0, 0.046, 0.1),
        BodySpec::planet("Neptune", Rgb::new(60, 90, 230), 11.0, 350.0, 0.010, 0.08),
        BodySpec::satellite("Moon", "Earth", Rgb::new(220, 220, 220), 3.0, 14.0, 2.5),
    ]
}

/// Anything that can report where it currently is in world space.
pub(crate) trait HasPosition {
    fn position(&self) -> Vec2;
}

#[derive(Clone, Debug)]
pub(crate) struct Planet {
    pub(crate) name: String,
    pub(crate) color: Rgb,
    pub(crate) size: f64,
    pub(crate) orbit: Orbit,
    pub(crate) speed: f64,
    pub(crate) angle: f64,
    pub(crate) rings: bool,
    pos: Vec2,
}

impl Planet {
    pub(crate) fn new(spec: &BodySpec, orbit: Orbit, angle: f64, tilt: f64) -> Self {
        Self {
            name: spec.name.clone(),
            color: spec.color,
            size: spec.size,
            orbit,
            speed: spec.speed,
            angle,
            rings: spec.rings,
            pos: orbit::position(angle, orbit, tilt),
        }
    }

    pub(crate) fn advance(&mut self, time_scale: f64, law: SpeedLaw, tilt: f64) {
        self.angle = orbit::step(self.angle, self.orbit, self.speed, time_scale, law);
        self.pos = orbit::position(self.angle, self.orbit, tilt);
    }
}

impl HasPosition for Planet {
    fn position(&self) -> Vec2 {
        self.pos
    }
}

/// Orbits a parent planet; its orbit is measured from the parent's position.
#[derive(Clone, Debug)]
pub(crate) struct Satellite {
    pub(crate) name: String,
    pub(crate) color: Rgb,
    pub(crate) size: f64,
    pub(crate) parent: usize,
    pub(crate) orbit: Orbit,
    pub(crate) speed: f64,
    pub(crate) angle: f64,
    pos: Vec2,
}

impl Satellite {
    pub(crate) fn new(spec: &BodySpec, parent: usize, orbit: Orbit, angle: f64) -> Self {
        Self {
            name: spec.name.clone(),
            color: spec.color,
            size: spec.size,
            parent,
            orbit,
            speed: spec.speed,
            angle,
            pos: Vec2::default(),
        }
    }

    pub(crate) fn offset(&self, tilt: f64) -> Vec2 {
        orbit::position(self.angle, self.orbit, tilt)
    }

    pub(crate) fn place(&mut self, parent_pos: Vec2, tilt: f64) {
        self.pos = parent_pos.add(self.offset(tilt));
    }

    pub(crate) fn advance(&mut self, parent_pos: Vec2, time_scale: f64, law: SpeedLaw, tilt: f64) {
        self.angle = orbit::step(self.angle, self.orbit, self.speed, time_scale, law);
        self.place(parent_pos, tilt);
    }
}

impl HasPosition for Satellite {
    fn position(&self) -> Vec2 {
        self.pos
    }
}

#[derive(Clone, Debug)]
pub(crate) enum Body {
    Planet(Planet),
    Satellite(Satellite),
}

impl Body {
    pub(crate) fn name(&self) -> &str {
        match self {
            Body::Planet(p) => &p.name,
            Body::Satellite(s) => &s.name,
        }
    }
    pub(crate) fn color(&self) -> Rgb {
        match self {
            Body::Planet(p) => p.color,
            Body::Satellite(s) => s.color,
        }
    }
    pub(crate) fn size(&self) -> f64 {
        match self {
            Body::Planet(p) => p.size,
            Body::Satellite(s) => s.size,
        }
    }
    pub(crate) fn angle(&self) -> f64 {
        match self {
            Body::Planet(p) => p.angle,
            Body::Satellite(s) => s.angle,
        }
    }
    pub(crate) fn orbit(&self) -> Orbit {
        match self {
            Body::Planet(p) => p.orbit,
            Body::Satellite(s) => s.orbit,
        }
    }
    pub(crate) fn is_satellite(&self) -> bool {
        matches!(self, Body::Satellite(_))
    }
}

impl HasPosition for Body {
    fn position(&self) -> Vec2 {
        match self {
            Body::Planet(p) => p.position(),
            Body::Satellite(s) => s.position(),
        }
    }
}

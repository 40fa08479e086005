use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };
    pub const REFERENCE_AXIS: Vec2 = Vec2 { x: 1.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn from_heading(degrees: f64) -> Self {
        let rad = degrees.to_radians();
        Vec2::new(rad.cos(), -rad.sin())
    }

    pub fn length_sq(self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(self) -> f64 {
        self.length_sq().sqrt()
    }

    pub fn normalize(self) -> Vec2 {
        let len = self.length();
        if len > 0.0 {
            Vec2::new(self.x / len, self.y / len)
        } else {
            Vec2::ZERO
        }
    }

    pub fn direction_or_reference(self) -> Vec2 {
        if self.length_sq() > 0.0 {
            self.normalize()
        } else {
            Vec2::REFERENCE_AXIS
        }
    }

    pub fn dot(self, other: Vec2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn scale_to_length(self, length: f64) -> Vec2 {
        self.normalize() * length
    }

    pub fn rotate_degrees(self, degrees: f64) -> Vec2 {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Vec2::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Vec2) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Neg for Vec2 {
    type Output = Vec2;

    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Mul<Vec2> for f64 {
    type Output = Vec2;

    fn mul(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self * rhs.x, self * rhs.y)
    }
}

impl Div<f64> for Vec2 {
    type Output = Vec2;

    fn div(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x / rhs, self.y / rhs)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BodyKind {
    Ship { heading: f64 },
    Debris,
    Projectile,
    DiskParticle,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    pub kind: BodyKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f64,
    pub captured: bool,
}

impl Body {
    pub fn new(kind: BodyKind, pos: Vec2, vel: Vec2, radius: f64) -> Self {
        Self {
            kind,
            pos,
            vel,
            radius,
            captured: false,
        }
    }

    pub fn heading(&self) -> Option<f64> {
        match self.kind {
            BodyKind::Ship { heading } => Some(heading),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewerState {
    pub pos: Vec2,
    pub vel: Vec2,
}

impl From<&Body> for ViewerState {
    fn from(body: &Body) -> Self {
        Self {
            pos: body.pos,
            vel: body.vel,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Intents {
    pub turn_left: bool,
    pub turn_right: bool,
    pub thrust: bool,
    pub fire: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorId {
    White,
    Shade(u8),
    Yellow,
    InfluenceRing,
    CaptureRing,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct WorldStats {
    pub debris_count: usize,
    pub projectile_count: usize,
    pub disk_count: usize,
    pub sector_count: usize,
    pub captured_total: usize,
    pub ship_beta: f64,
    pub ship_gamma: f64,
    pub ship_time_factor: f64,
}

use std::{fs, path::Path};

use serde::Deserialize;
use thiserror::Error;

pub const SIM_HZ: f32 = 60.0;
pub const RENDER_HZ: f32 = 30.0;
pub const DT: f32 = 1.0 / SIM_HZ;

pub const SCREEN_WIDTH: f64 = 1920.0;
pub const SCREEN_HEIGHT: f64 = 1080.0;

pub const SPEED_OF_LIGHT: f64 = 800.0;
pub const BETA_CLAMP: f64 = 0.999;

pub const SECTOR_SIZE: f64 = 800.0;
pub const LOAD_RADIUS: i32 = 2;

pub const BLACK_HOLE_X: f64 = 1600.0;
pub const BLACK_HOLE_Y: f64 = 0.0;
pub const BLACK_HOLE_RADIUS: f64 = 200.0;
pub const BLACK_HOLE_GM: f64 = 5.0e4;
pub const KILL_FACTOR: f64 = 0.3;

pub const DISK_PARTICLES: usize = 2000;
pub const DISK_MIN_FACTOR: f64 = 1.1;
pub const DISK_MAX_FACTOR: f64 = 3.0;
pub const DISK_ORBIT_JITTER_MIN: f64 = 0.8;
pub const DISK_ORBIT_JITTER_MAX: f64 = 1.2;

pub const SHIP_THRUST: f64 = 0.2;
pub const SHIP_TURN_DEGREES: f64 = 5.0;
pub const SHIP_SIZE: f64 = 20.0;

pub const MUZZLE_SPEED: f64 = 6.0;
pub const PROJECTILE_RADIUS: f64 = 3.0;

pub const DEBRIS_PER_SECTOR_MIN: u32 = 5;
pub const DEBRIS_PER_SECTOR_MAX: u32 = 12;
pub const DEBRIS_SPEED_MIN: f64 = 1.0;
pub const DEBRIS_SPEED_MAX: f64 = 3.0;
pub const DEBRIS_RADIUS_MIN: u32 = 15;
pub const DEBRIS_RADIUS_MAX: u32 = 40;
pub const DEBRIS_BASE_SHADE: u8 = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct PhysicsConfig {
    pub speed_of_light: f64,
    pub beta_clamp: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            speed_of_light: SPEED_OF_LIGHT,
            beta_clamp: BETA_CLAMP,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct AttractorConfig {
    pub pos: [f64; 2],
    pub radius: f64,
    pub gm: f64,
    pub kill_factor: f64,
}

impl Default for AttractorConfig {
    fn default() -> Self {
        Self {
            pos: [BLACK_HOLE_X, BLACK_HOLE_Y],
            radius: BLACK_HOLE_RADIUS,
            gm: BLACK_HOLE_GM,
            kill_factor: KILL_FACTOR,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct DiskConfig {
    pub count: usize,
    pub min_factor: f64,
    pub max_factor: f64,
    pub jitter_min: f64,
    pub jitter_max: f64,
}

impl Default for DiskConfig {
    fn default() -> Self {
        Self {
            count: DISK_PARTICLES,
            min_factor: DISK_MIN_FACTOR,
            max_factor: DISK_MAX_FACTOR,
            jitter_min: DISK_ORBIT_JITTER_MIN,
            jitter_max: DISK_ORBIT_JITTER_MAX,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SectorConfig {
    pub size: f64,
    pub load_radius: i32,
    pub debris_min: u32,
    pub debris_max: u32,
    pub speed_min: f64,
    pub speed_max: f64,
    pub radius_min: u32,
    pub radius_max: u32,
}

impl Default for SectorConfig {
    fn default() -> Self {
        Self {
            size: SECTOR_SIZE,
            load_radius: LOAD_RADIUS,
            debris_min: DEBRIS_PER_SECTOR_MIN,
            debris_max: DEBRIS_PER_SECTOR_MAX,
            speed_min: DEBRIS_SPEED_MIN,
            speed_max: DEBRIS_SPEED_MAX,
            radius_min: DEBRIS_RADIUS_MIN,
            radius_max: DEBRIS_RADIUS_MAX,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShipConfig {
    pub thrust: f64,
    pub turn_degrees: f64,
    pub size: f64,
    pub muzzle_speed: f64,
    pub projectile_radius: f64,
}

impl Default for ShipConfig {
    fn default() -> Self {
        Self {
            thrust: SHIP_THRUST,
            turn_degrees: SHIP_TURN_DEGREES,
            size: SHIP_SIZE,
            muzzle_speed: MUZZLE_SPEED,
            projectile_radius: PROJECTILE_RADIUS,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScreenConfig {
    pub width: f64,
    pub height: f64,
    pub debris_shade: u8,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: SCREEN_WIDTH,
            height: SCREEN_HEIGHT,
            debris_shade: DEBRIS_BASE_SHADE,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    pub physics: PhysicsConfig,
    pub attractors: Vec<AttractorConfig>,
    pub disk: DiskConfig,
    pub sectors: SectorConfig,
    pub ship: ShipConfig,
    pub screen: ScreenConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            physics: PhysicsConfig::default(),
            attractors: vec![AttractorConfig::default()],
            disk: DiskConfig::default(),
            sectors: SectorConfig::default(),
            ship: ShipConfig::default(),
            screen: ScreenConfig::default(),
        }
    }
}

impl SimConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = self.physics.speed_of_light;
        if !(c.is_finite() && c > 0.0) {
            return Err(invalid(format!("speed_of_light must be positive, got {c}")));
        }
        let beta = self.physics.beta_clamp;
        if !(beta > 0.0 && beta < 1.0) {
            return Err(invalid(format!("beta_clamp must lie in (0, 1), got {beta}")));
        }
        for (idx, bh) in self.attractors.iter().enumerate() {
            if !(bh.radius.is_finite() && bh.radius > 0.0) {
                return Err(invalid(format!("attractor {idx}: radius must be positive")));
            }
            if !(bh.kill_factor > 0.0 && bh.kill_factor < 1.0) {
                return Err(invalid(format!(
                    "attractor {idx}: kill_factor must lie in (0, 1), got {}",
                    bh.kill_factor
                )));
            }
            if !(bh.gm.is_finite() && bh.gm >= 0.0) {
                return Err(invalid(format!("attractor {idx}: gm must be non-negative")));
            }
        }
        let disk = &self.disk;
        if !(disk.min_factor > 0.0 && disk.min_factor < disk.max_factor) {
            return Err(invalid("disk factors must satisfy 0 < min < max".to_string()));
        }
        if !(disk.jitter_min > 0.0 && disk.jitter_min < disk.jitter_max) {
            return Err(invalid("disk jitter must satisfy 0 < min < max".to_string()));
        }
        let sectors = &self.sectors;
        if !(sectors.size.is_finite() && sectors.size > 0.0) {
            return Err(invalid("sector size must be positive and finite".to_string()));
        }
        if sectors.load_radius < 0 {
            return Err(invalid("sector load_radius must be non-negative".to_string()));
        }
        if sectors.debris_min > sectors.debris_max
            || sectors.radius_min > sectors.radius_max
            || !(sectors.speed_min <= sectors.speed_max)
        {
            return Err(invalid("sector ranges must be ordered min <= max".to_string()));
        }
        if !(self.screen.width > 0.0 && self.screen.height > 0.0) {
            return Err(invalid("screen dimensions must be positive".to_string()));
        }
        Ok(())
    }
}

fn invalid(msg: String) -> ConfigError {
    ConfigError::Invalid(msg)
}

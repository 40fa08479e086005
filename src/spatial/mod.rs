use std::collections::HashMap;

use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{
    config::SectorConfig,
    integrator::partition_captured,
    types::{Body, BodyKind, Vec2},
};

pub type SectorKey = (i32, i32);

#[derive(Clone, Debug, PartialEq)]
pub struct Sector {
    pub bodies: Vec<Body>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SectorChange {
    pub loaded: Vec<SectorKey>,
    pub unloaded: Vec<SectorKey>,
}

#[derive(Debug)]
pub struct SectorStreamer {
    config: SectorConfig,
    sectors: HashMap<SectorKey, Sector>,
}

impl SectorStreamer {
    pub fn new(config: SectorConfig) -> Self {
        assert!(
            config.size.is_finite() && config.size > 0.0,
            "cell_size must be positive and finite"
        );
        Self {
            config,
            sectors: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    pub fn is_loaded(&self, key: SectorKey) -> bool {
        self.sectors.contains_key(&key)
    }

    pub fn sector_key(&self, pos: Vec2) -> SectorKey {
        let cx = (pos.x / self.config.size).floor() as i32;
        let cy = (pos.y / self.config.size).floor() as i32;
        (cx, cy)
    }

    pub fn ensure_loaded(&mut self, viewer_pos: Vec2) -> SectorChange {
        let (cx, cy) = self.sector_key(viewer_pos);
        let range = self.config.load_radius.max(0);
        let mut change = SectorChange::default();

        for dy in -range..=range {
            for dx in -range..=range {
                let key = (cx + dx, cy + dy);
                if !self.is_loaded(key) {
                    let sector = generate(&self.config, key);
                    self.sectors.insert(key, sector);
                    change.loaded.push(key);
                }
            }
        }

        self.sectors.retain(|&(sx, sy), _| {
            let keep = (sx - cx).abs() <= range && (sy - cy).abs() <= range;
            if !keep {
                change.unloaded.push((sx, sy));
            }
            keep
        });

        if !change.loaded.is_empty() || !change.unloaded.is_empty() {
            debug!(
                "sectors around ({cx}, {cy}): +{} -{} ({} live)",
                change.loaded.len(),
                change.unloaded.len(),
                self.sectors.len()
            );
        }
        change
    }

    pub fn bodies(&self) -> impl Iterator<Item = &Body> {
        self.sectors.values().flat_map(|s| s.bodies.iter())
    }

    pub fn bodies_mut(&mut self) -> impl Iterator<Item = &mut Body> {
        self.sectors.values_mut().flat_map(|s| s.bodies.iter_mut())
    }

    pub fn body_count(&self) -> usize {
        self.sectors.values().map(|s| s.bodies.len()).sum()
    }

    pub fn sweep_captured(&mut self) -> Vec<Body> {
        let mut removed = Vec::new();
        for sector in self.sectors.values_mut() {
            let bodies = std::mem::take(&mut sector.bodies);
            let (kept, gone) = partition_captured(bodies);
            sector.bodies = kept;
            removed.extend(gone);
        }
        removed
    }
}

pub fn sector_seed(key: SectorKey) -> u64 {
    let (sx, sy) = key;
    let hx = (sx as i64).wrapping_mul(73_856_093);
    let hy = (sy as i64).wrapping_mul(19_349_663);
    (hx ^ hy) as u64
}

/// Pure function of the key: the same key yields the same debris every time.
pub fn generate(config: &SectorConfig, key: SectorKey) -> Sector {
    let mut rng = ChaCha8Rng::seed_from_u64(sector_seed(key));
    let origin = Vec2::new(key.0 as f64 * config.size, key.1 as f64 * config.size);
    let count = rng.gen_range(config.debris_min..=config.debris_max);
    let mut bodies = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let pos = origin
            + Vec2::new(
                rng.gen_range(0.0..config.size),
                rng.gen_range(0.0..config.size),
            );
        let angle = rng.gen_range(0.0..360.0_f64).to_radians();
        let speed = rng.gen_range(config.speed_min..=config.speed_max);
        let vel = Vec2::new(angle.cos(), angle.sin()) * speed;
        let radius = rng.gen_range(config.radius_min..=config.radius_max) as f64;
        bodies.push(Body::new(BodyKind::Debris, pos, vel, radius));
    }
    Sector { bodies }
}

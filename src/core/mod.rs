use log::{debug, info, trace, warn};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    config::SimConfig,
    gravity::{Attractor, GravityField},
    integrator::{partition_captured, steer, Integrator},
    relativity::{gamma, VelocityComposer},
    render::{DrawDirective, ViewProjector},
    spatial::SectorStreamer,
    types::{Body, BodyKind, Intents, Vec2, ViewerState, WorldStats},
};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameResult {
    pub live: Vec<Body>,
    pub removed: Vec<Body>,
    pub session_over: bool,
}

pub struct World {
    config: SimConfig,
    field: GravityField,
    integrator: Integrator,
    composer: VelocityComposer,
    projector: ViewProjector,
    sectors: SectorStreamer,
    ship: Body,
    projectiles: Vec<Body>,
    disk: Vec<Body>,
    captured_total: usize,
    session_over: bool,
}

impl World {
    pub fn new(config: SimConfig, seed: Option<u64>) -> Self {
        let c = config.physics.speed_of_light;
        let field = GravityField::new(config.attractors.iter().map(Attractor::from_config).collect());
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let disk = seed_accretion_disks(&field, &config, &mut rng);

        let mut world = Self {
            integrator: Integrator::new(c),
            composer: VelocityComposer::new(c),
            projector: ViewProjector::new(c, config.physics.beta_clamp, &config.screen, &config.ship),
            sectors: SectorStreamer::new(config.sectors.clone()),
            ship: Body::new(
                BodyKind::Ship { heading: 0.0 },
                Vec2::ZERO,
                Vec2::ZERO,
                config.ship.size,
            ),
            projectiles: Vec::new(),
            disk,
            captured_total: 0,
            session_over: false,
            field,
            config,
        };
        let debris = world.ensure_sectors_loaded(Vec2::ZERO).count();
        if world.field.captures(world.ship.pos) {
            warn!("ship starts inside a capture zone; the session will end on the first frame");
        }
        info!(
            "world ready: {} attractor(s), {} disk particles, {} debris in {} sectors",
            world.field.attractors().len(),
            world.disk.len(),
            debris,
            world.sectors.len()
        );
        world
    }

    pub fn ship(&self) -> &Body {
        &self.ship
    }

    pub fn viewer(&self) -> ViewerState {
        ViewerState::from(&self.ship)
    }

    pub fn projector(&self) -> &ViewProjector {
        &self.projector
    }

    pub fn advance_frame(&mut self, intents: Intents) -> FrameResult {
        if self.session_over {
            return self.frame_result(Vec::new());
        }

        if intents.fire {
            let muzzle = self.config.ship.muzzle_speed;
            let heading = self.ship.heading().unwrap_or(0.0);
            let projectile = self.spawn_projectile(self.viewer(), muzzle, heading);
            self.projectiles.push(projectile);
        }

        steer(&mut self.ship, intents, &self.config.ship);
        if self.integrator.step(&self.field, &mut self.ship) {
            info!(
                "ship captured at ({:.1}, {:.1}); ending session",
                self.ship.pos.x, self.ship.pos.y
            );
            self.session_over = true;
            return self.frame_result(Vec::new());
        }

        let debris = self.ensure_sectors_loaded(self.ship.pos).count();
        trace!("{debris} debris live around the ship");

        for body in self.sectors.bodies_mut() {
            self.integrator.step(&self.field, body);
        }
        self.integrator.step_all(&self.field, &mut self.projectiles);
        self.integrator.step_all(&self.field, &mut self.disk);

        let mut removed = self.sectors.sweep_captured();
        let (kept, gone) = partition_captured(std::mem::take(&mut self.projectiles));
        self.projectiles = kept;
        removed.extend(gone);
        let (kept, gone) = partition_captured(std::mem::take(&mut self.disk));
        self.disk = kept;
        removed.extend(gone);

        if !removed.is_empty() {
            debug!("swept {} captured bodies", removed.len());
        }
        self.captured_total += removed.len();
        self.frame_result(removed)
    }

    fn frame_result(&self, removed: Vec<Body>) -> FrameResult {
        let mut live = Vec::new();
        self.snapshot(&mut live);
        FrameResult {
            live,
            removed,
            session_over: self.session_over,
        }
    }

    pub fn spawn_projectile(&self, viewer: ViewerState, muzzle_speed: f64, heading: f64) -> Body {
        let local = Vec2::from_heading(heading) * muzzle_speed;
        let vel = self.composer.compose(viewer.vel, local);
        trace!(
            "projectile spawned at ({:.1}, {:.1}) with speed {:.3}",
            viewer.pos.x,
            viewer.pos.y,
            vel.length()
        );
        Body::new(
            BodyKind::Projectile,
            viewer.pos,
            vel,
            self.config.ship.projectile_radius,
        )
    }

    pub fn ensure_sectors_loaded(&mut self, viewer_pos: Vec2) -> impl Iterator<Item = &Body> {
        self.sectors.ensure_loaded(viewer_pos);
        self.sectors.bodies()
    }

    pub fn project(&self, viewer: &ViewerState, body: &Body) -> Option<DrawDirective> {
        self.projector.project(viewer, body)
    }

    pub fn snapshot(&self, out: &mut Vec<Body>) {
        out.clear();
        out.extend(self.disk.iter().copied());
        out.push(self.ship);
        out.extend(self.sectors.bodies().copied());
        out.extend(self.projectiles.iter().copied());
    }

    pub fn draw_list(&self, out: &mut Vec<DrawDirective>) {
        out.clear();
        let viewer = self.viewer();
        let boost = self.projector.boost(viewer.vel);
        for attractor in self.field.attractors() {
            out.extend(self.projector.project_attractor(&viewer, attractor));
        }
        let bodies = self
            .disk
            .iter()
            .chain(std::iter::once(&self.ship))
            .chain(self.sectors.bodies())
            .chain(self.projectiles.iter());
        for body in bodies {
            if let Some(directive) = self.projector.project_with(&boost, &viewer, body) {
                out.push(directive);
            }
        }
    }

    pub fn stats(&self) -> WorldStats {
        let c = self.config.physics.speed_of_light;
        let beta = self.ship.vel.length() / c;
        WorldStats {
            debris_count: self.sectors.body_count(),
            projectile_count: self.projectiles.len(),
            disk_count: self.disk.len(),
            sector_count: self.sectors.len(),
            captured_total: self.captured_total,
            ship_beta: beta,
            ship_gamma: gamma(beta),
            ship_time_factor: self.field.time_dilation(self.ship.pos),
        }
    }
}

fn seed_accretion_disks(field: &GravityField, config: &SimConfig, rng: &mut StdRng) -> Vec<Body> {
    let disk = &config.disk;
    let mut out = Vec::with_capacity(disk.count * field.attractors().len());
    for attractor in field.attractors() {
        let min_r = attractor.radius * disk.min_factor;
        let max_r = attractor.radius * disk.max_factor;
        for _ in 0..disk.count {
            let theta = rng.gen_range(0.0..std::f64::consts::TAU);
            let r = rng.gen_range(min_r..max_r);
            let (sin, cos) = theta.sin_cos();
            let pos = attractor.pos + Vec2::new(cos, sin) * r;
            let v_mag = (attractor.gm / r).sqrt();
            let tangent = Vec2::new(-sin, cos);
            let vel = tangent * (v_mag * rng.gen_range(disk.jitter_min..disk.jitter_max));
            out.push(Body::new(BodyKind::DiskParticle, pos, vel, 1.0));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AttractorConfig, DiskConfig};

    fn quiet_config() -> SimConfig {
        SimConfig {
            disk: DiskConfig {
                count: 50,
                ..DiskConfig::default()
            },
            ..SimConfig::default()
        }
    }

    fn world() -> World {
        World::new(quiet_config(), Some(7))
    }

    mod new {
        use super::*;

        #[test]
        fn seeds_disk_and_sectors() {
            let w = world();
            let stats = w.stats();
            assert_eq!(stats.disk_count, 50);
            assert_eq!(stats.sector_count, 25);
            assert!(stats.debris_count >= 25 * 5);
            assert_eq!(w.ship().pos, Vec2::ZERO);
        }

        #[test]
        fn disk_particles_start_on_annulus_with_tangential_velocity() {
            let w = world();
            let bh = w.field.attractors()[0];
            for p in &w.disk {
                let rel = p.pos - bh.pos;
                let r = rel.length();
                assert!(r >= 220.0 - 1e-9 && r <= 600.0 + 1e-9);
                assert!(rel.dot(p.vel).abs() < 1e-6 * r * p.vel.length().max(1.0));
                let circular = (bh.gm / r).sqrt();
                let ratio = p.vel.length() / circular;
                assert!((0.8 - 1e-9..=1.2 + 1e-9).contains(&ratio));
            }
        }

        #[test]
        fn same_seed_same_disk() {
            let a = World::new(quiet_config(), Some(42));
            let b = World::new(quiet_config(), Some(42));
            assert_eq!(a.disk, b.disk);
        }
    }

    mod advance_frame {
        use super::*;

        #[test]
        fn idle_ship_far_from_attractor_drifts_toward_it() {
            let mut w = world();
            let result = w.advance_frame(Intents::default());
            assert!(!result.session_over);
            assert!(w.ship().vel.x > 0.0);
        }

        #[test]
        fn fire_spawns_projectile_from_pre_update_state() {
            let mut w = world();
            let intents = Intents {
                fire: true,
                ..Intents::default()
            };
            w.advance_frame(intents);
            let stats = w.stats();
            assert_eq!(stats.projectile_count, 1);
            assert!(w.projectiles[0].vel.x > 5.0);
        }

        #[test]
        fn ship_inside_capture_zone_ends_session() {
            let mut w = world();
            w.ship.pos = Vec2::new(1600.0, 10.0);
            let result = w.advance_frame(Intents::default());
            assert!(result.session_over);
            assert!(result.removed.is_empty());
            assert!(w.session_over);
        }

        #[test]
        fn ended_session_stops_updating() {
            let mut w = world();
            w.ship.pos = Vec2::new(1600.0, 10.0);
            w.advance_frame(Intents::default());
            let disk_before = w.disk.clone();
            let result = w.advance_frame(Intents {
                thrust: true,
                fire: true,
                ..Intents::default()
            });
            assert!(result.session_over);
            assert_eq!(w.disk, disk_before);
            assert!(w.projectiles.is_empty());
        }

        #[test]
        fn captured_projectiles_are_removed_and_reported() {
            let mut w = world();
            let doomed = Body::new(BodyKind::Projectile, Vec2::new(1600.0, 5.0), Vec2::ZERO, 3.0);
            w.projectiles.push(doomed);
            let result = w.advance_frame(Intents::default());
            assert!(w.projectiles.is_empty());
            assert!(result
                .removed
                .iter()
                .any(|b| b.kind == BodyKind::Projectile && b.captured));
            assert!(w.stats().captured_total >= 1);
        }

        #[test]
        fn every_live_body_respects_speed_limit() {
            let mut w = world();
            w.ship.vel = Vec2::new(5000.0, 0.0);
            w.advance_frame(Intents::default());
            let mut bodies = Vec::new();
            w.snapshot(&mut bodies);
            assert!(bodies.iter().all(|b| b.vel.length() <= 800.0));
        }

        #[test]
        fn streams_sectors_with_the_ship() {
            let mut w = world();
            w.ship.pos = Vec2::new(-4000.0, -4000.0);
            w.advance_frame(Intents::default());
            let key = w.sectors.sector_key(w.ship().pos);
            assert!(w.sectors.is_loaded(key));
            assert!(!w.sectors.is_loaded((0, 0)));
            assert_eq!(w.stats().sector_count, 25);
        }

        #[test]
        fn reports_every_live_body() {
            let mut w = world();
            let result = w.advance_frame(Intents {
                fire: true,
                ..Intents::default()
            });
            let stats = w.stats();
            assert_eq!(
                result.live.len(),
                stats.disk_count + stats.debris_count + stats.projectile_count + 1
            );
            assert!(result.live.contains(w.ship()));
            assert!(result.live.iter().all(|b| !b.captured));
            let projectiles = result
                .live
                .iter()
                .filter(|b| b.kind == BodyKind::Projectile)
                .count();
            assert_eq!(projectiles, stats.projectile_count);
        }

        #[test]
        fn captured_ship_is_reported_in_live_state() {
            let mut w = world();
            w.ship.pos = Vec2::new(1600.0, 10.0);
            let result = w.advance_frame(Intents::default());
            assert!(result.session_over);
            assert!(result.live.iter().any(|b| b.heading().is_some() && b.captured));
        }

        #[test]
        fn no_attractors_means_free_flight() {
            let config = SimConfig {
                attractors: Vec::new(),
                ..quiet_config()
            };
            let mut w = World::new(config, Some(1));
            w.ship.vel = Vec2::new(3.0, 4.0);
            w.advance_frame(Intents::default());
            assert_eq!(w.ship().pos, Vec2::new(3.0, 4.0));
            assert_eq!(w.stats().disk_count, 0);
        }
    }

    mod ensure_sectors_loaded {
        use super::*;

        #[test]
        fn returns_debris_around_the_viewer() {
            let mut w = world();
            let far = Vec2::new(10_000.0, -6_000.0);
            let debris: Vec<Body> = w.ensure_sectors_loaded(far).copied().collect();
            assert_eq!(debris.len(), w.stats().debris_count);
            assert!(debris.iter().all(|b| b.kind == BodyKind::Debris));
            // Load radius 2 around cell (12, -8) spans x in [8000, 12000).
            assert!(debris.iter().all(|b| (8000.0..=12000.0).contains(&b.pos.x)));
            assert!(debris.iter().all(|b| (-8000.0..=-4000.0).contains(&b.pos.y)));
        }
    }

    mod spawn_projectile {
        use super::*;

        #[test]
        fn composes_with_viewer_velocity() {
            let w = world();
            let viewer = ViewerState {
                pos: Vec2::new(10.0, 20.0),
                vel: Vec2::new(780.0, 0.0),
            };
            let p = w.spawn_projectile(viewer, 6.0, 0.0);
            assert_eq!(p.kind, BodyKind::Projectile);
            assert_eq!(p.pos, viewer.pos);
            assert_eq!(p.radius, 3.0);
            let speed = p.vel.length();
            assert!(speed > 780.0 && speed < 800.0);
        }

        #[test]
        fn stationary_viewer_fires_at_muzzle_speed() {
            let w = world();
            let p = w.spawn_projectile(ViewerState::default(), 6.0, 90.0);
            assert!((p.vel.length() - 6.0).abs() < 1e-9);
            assert!(p.vel.y < 0.0);
        }
    }

    mod draw_list {
        use super::*;

        #[test]
        fn includes_attractor_rings_and_ship() {
            let config = SimConfig {
                attractors: vec![AttractorConfig {
                    pos: [300.0, 0.0],
                    ..AttractorConfig::default()
                }],
                ..quiet_config()
            };
            let w = World::new(config, Some(3));
            let mut out = Vec::new();
            w.draw_list(&mut out);
            assert!(out.len() >= 3);
            assert!(out
                .iter()
                .any(|d| matches!(d.shape, crate::render::Shape::Triangle { .. })));
        }
    }

    mod snapshot {
        use super::*;

        #[test]
        fn lists_every_population() {
            let w = world();
            let mut out = Vec::new();
            w.snapshot(&mut out);
            let stats = w.stats();
            assert_eq!(
                out.len(),
                stats.disk_count + stats.debris_count + stats.projectile_count + 1
            );
        }
    }
}

use crate::{
    config::ShipConfig,
    gravity::GravityField,
    relativity::clamp_speed,
    types::{Body, BodyKind, Intents, Vec2},
};

#[derive(Clone, Copy, Debug)]
pub struct Integrator {
    c: f64,
}

impl Integrator {
    pub fn new(c: f64) -> Self {
        assert!(c.is_finite() && c > 0.0, "speed of light must be positive and finite");
        Self { c }
    }

    pub fn step(&self, field: &GravityField, body: &mut Body) -> bool {
        if body.captured {
            return true;
        }
        field.attract(body);
        if body.captured {
            return true;
        }
        body.vel = clamp_speed(body.vel, self.c);
        // Factor is sampled before the position moves.
        let factor = field.time_dilation(body.pos);
        body.pos += body.vel * factor;
        false
    }

    pub fn step_all(&self, field: &GravityField, bodies: &mut [Body]) -> usize {
        let mut captured = 0;
        for body in bodies.iter_mut() {
            if self.step(field, body) {
                captured += 1;
            }
        }
        captured
    }
}

pub fn steer(body: &mut Body, intents: Intents, ship: &ShipConfig) {
    let BodyKind::Ship { heading } = &mut body.kind else {
        return;
    };
    if intents.turn_left {
        *heading += ship.turn_degrees;
    }
    if intents.turn_right {
        *heading -= ship.turn_degrees;
    }
    *heading = heading.rem_euclid(360.0);
    if intents.thrust {
        let impulse: Vec2 = Vec2::from_heading(*heading) * ship.thrust;
        body.vel += impulse;
    }
}

pub fn partition_captured(bodies: Vec<Body>) -> (Vec<Body>, Vec<Body>) {
    bodies.into_iter().partition(|b| !b.captured)
}

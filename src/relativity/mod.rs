use log::warn;

use crate::types::Vec2;

const SUBLUMINAL_CEILING: f64 = 1.0 - 1e-12;

pub fn gamma(beta: f64) -> f64 {
    let beta_sq = beta * beta;
    if beta_sq < 1.0 {
        1.0 / (1.0 - beta_sq).sqrt()
    } else {
        f64::INFINITY
    }
}

/// Rescale `vel` to length `c` if it exceeds it; direction is preserved.
/// The measured length of the result never exceeds `c`, rounding included.
pub fn clamp_speed(vel: Vec2, c: f64) -> Vec2 {
    let len = vel.length();
    if len <= c {
        return vel;
    }
    let clamped = vel * (c / len);
    if clamped.length() > c {
        clamped * (1.0 - 4.0 * f64::EPSILON)
    } else {
        clamped
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VelocityComposer {
    c: f64,
}

impl VelocityComposer {
    pub fn new(c: f64) -> Self {
        assert!(c.is_finite() && c > 0.0, "speed of light must be positive and finite");
        Self { c }
    }

    /// A platform at or above `c` is degenerate; the result saturates at `c`
    /// along the platform's direction.
    pub fn compose(&self, platform: Vec2, local: Vec2) -> Vec2 {
        let c_sq = self.c * self.c;
        let beta_sq = platform.length_sq() / c_sq;
        if beta_sq >= 1.0 {
            warn!(
                "platform speed {:.3} at or above the causal limit {}; saturating",
                platform.length(),
                self.c
            );
            return platform.direction_or_reference() * self.c;
        }
        let gamma = 1.0 / (1.0 - beta_sq).sqrt();

        let v_hat = platform.direction_or_reference();
        let u_par = v_hat * local.dot(v_hat);
        let u_perp = local - u_par;

        let denom = 1.0 + platform.dot(local) / c_sq;
        if denom <= 0.0 {
            // Only reachable with |local| >= c opposing the platform.
            return self.saturate(local);
        }
        let w_par = (u_par + platform) / denom;
        let w_perp = u_perp / (gamma * denom);
        self.keep_subluminal(w_par + w_perp)
    }

    fn saturate(&self, vel: Vec2) -> Vec2 {
        vel.direction_or_reference() * (self.c * SUBLUMINAL_CEILING)
    }

    fn keep_subluminal(&self, vel: Vec2) -> Vec2 {
        let ceiling = self.c * SUBLUMINAL_CEILING;
        if vel.length() >= ceiling {
            vel.scale_to_length(ceiling)
        } else {
            vel
        }
    }
}

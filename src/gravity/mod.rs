use crate::{
    config::AttractorConfig,
    types::{Body, Vec2},
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Attractor {
    pub pos: Vec2,
    pub radius: f64,
    pub kill_radius: f64,
    pub gm: f64,
}

impl Attractor {
    pub fn new(pos: Vec2, radius: f64, gm: f64, kill_factor: f64) -> Self {
        assert!(
            radius.is_finite() && radius > 0.0,
            "radius must be positive and finite"
        );
        assert!(
            kill_factor > 0.0 && kill_factor < 1.0,
            "kill_factor must lie in (0, 1)"
        );
        Self {
            pos,
            radius,
            kill_radius: radius * kill_factor,
            gm,
        }
    }

    pub fn from_config(config: &AttractorConfig) -> Self {
        Self::new(
            Vec2::new(config.pos[0], config.pos[1]),
            config.radius,
            config.gm,
            config.kill_factor,
        )
    }

    pub fn captures(&self, pos: Vec2) -> bool {
        (self.pos - pos).length() <= self.kill_radius
    }

    pub fn acceleration(&self, pos: Vec2) -> Vec2 {
        let r_vec = self.pos - pos;
        let r = r_vec.length();
        let a = self.gm / (r * r);
        r_vec * (a / r)
    }

    /// Stylised: inside the influence zone `R_inf / r >= 1`, so the root
    /// argument clamps to zero and the zone freezes motion entirely.
    pub fn time_dilation(&self, pos: Vec2) -> f64 {
        let r = (pos - self.pos).length();
        if r <= self.kill_radius {
            return 0.0;
        }
        if r <= self.radius {
            return (1.0 - self.radius / r).max(0.0).sqrt();
        }
        1.0
    }
}

#[derive(Clone, Debug, Default)]
pub struct GravityField {
    attractors: Vec<Attractor>,
}

impl GravityField {
    pub fn new(attractors: Vec<Attractor>) -> Self {
        Self { attractors }
    }

    pub fn attractors(&self) -> &[Attractor] {
        &self.attractors
    }

    pub fn attract(&self, body: &mut Body) {
        if body.captured {
            return;
        }
        for attractor in &self.attractors {
            if attractor.captures(body.pos) {
                body.captured = true;
                return;
            }
            body.vel += attractor.acceleration(body.pos);
        }
    }

    pub fn time_dilation(&self, pos: Vec2) -> f64 {
        self.attractors
            .iter()
            .map(|a| a.time_dilation(pos))
            .fold(1.0, f64::min)
    }

    pub fn captures(&self, pos: Vec2) -> bool {
        self.attractors.iter().any(|a| a.captures(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BodyKind;

    fn black_hole() -> Attractor {
        Attractor::new(Vec2::ZERO, 200.0, 5.0e4, 0.3)
    }

    fn debris_at(x: f64, y: f64) -> Body {
        Body::new(BodyKind::Debris, Vec2::new(x, y), Vec2::ZERO, 20.0)
    }

    mod attractor_new {
        use super::*;

        #[test]
        fn derives_kill_radius() {
            let bh = black_hole();
            assert!((bh.kill_radius - 60.0).abs() < 1e-9);
            assert!(bh.kill_radius < bh.radius);
        }

        #[test]
        #[should_panic(expected = "kill_factor must lie in (0, 1)")]
        fn panics_when_capture_zone_swallows_influence_zone() {
            Attractor::new(Vec2::ZERO, 200.0, 1.0, 1.0);
        }

        #[test]
        #[should_panic(expected = "radius must be positive and finite")]
        fn panics_with_zero_radius() {
            Attractor::new(Vec2::ZERO, 0.0, 1.0, 0.3);
        }
    }

    mod attract {
        use super::*;

        #[test]
        fn far_body_is_pulled_toward_attractor() {
            let field = GravityField::new(vec![black_hole()]);
            let mut body = debris_at(400.0, 0.0);
            field.attract(&mut body);
            assert!(!body.captured);
            assert!((body.vel.x + 0.3125).abs() < 1e-12);
            assert!(body.vel.y.abs() < 1e-12);
        }

        #[test]
        fn body_inside_capture_radius_is_captured_without_pull() {
            let field = GravityField::new(vec![black_hole()]);
            let mut body = debris_at(50.0, 0.0);
            body.vel = Vec2::new(1.0, 2.0);
            field.attract(&mut body);
            assert!(body.captured);
            assert_eq!(body.vel, Vec2::new(1.0, 2.0));
        }

        #[test]
        fn body_exactly_on_capture_radius_is_captured() {
            let field = GravityField::new(vec![Attractor::new(Vec2::ZERO, 100.0, 1.0, 0.5)]);
            let mut body = debris_at(50.0, 0.0);
            field.attract(&mut body);
            assert!(body.captured);
        }

        #[test]
        fn captured_body_is_not_touched_again() {
            let field = GravityField::new(vec![black_hole()]);
            let mut body = debris_at(400.0, 0.0);
            body.captured = true;
            let before = body;
            field.attract(&mut body);
            assert_eq!(body, before);
        }

        #[test]
        fn contributions_from_several_attractors_add_up() {
            let left = Attractor::new(Vec2::new(-400.0, 0.0), 200.0, 5.0e4, 0.3);
            let right = Attractor::new(Vec2::new(400.0, 0.0), 200.0, 5.0e4, 0.3);
            let field = GravityField::new(vec![left, right]);
            let mut body = debris_at(0.0, 0.0);
            field.attract(&mut body);
            assert!(body.vel.length() < 1e-12);
        }

        #[test]
        fn capture_short_circuits_remaining_attractors() {
            let far = Attractor::new(Vec2::new(1000.0, 0.0), 200.0, 5.0e4, 0.3);
            let near = black_hole();
            let field = GravityField::new(vec![far, near]);
            let mut body = debris_at(10.0, 0.0);
            field.attract(&mut body);
            assert!(body.captured);
            // The far attractor ran first and its pull stays applied.
            assert!(body.vel.x > 0.0);
        }

        #[test]
        fn empty_field_leaves_body_alone() {
            let field = GravityField::default();
            let mut body = debris_at(1.0, 1.0);
            field.attract(&mut body);
            assert_eq!(body.vel, Vec2::ZERO);
            assert!(!body.captured);
        }
    }

    mod time_dilation {
        use super::*;

        #[test]
        fn outside_influence_is_unaffected() {
            let bh = black_hole();
            assert_eq!(bh.time_dilation(Vec2::new(400.0, 0.0)), 1.0);
        }

        #[test]
        fn inside_capture_radius_is_frozen() {
            let bh = black_hole();
            assert_eq!(bh.time_dilation(Vec2::new(50.0, 0.0)), 0.0);
            assert_eq!(bh.time_dilation(Vec2::new(60.0, 0.0)), 0.0);
        }

        #[test]
        fn inside_influence_zone_never_goes_negative() {
            let bh = black_hole();
            for r in [61.0, 100.0, 150.0, 199.9, 200.0] {
                let f = bh.time_dilation(Vec2::new(r, 0.0));
                assert!((0.0..=1.0).contains(&f), "factor {f} at r={r}");
            }
        }

        #[test]
        fn field_takes_minimum_across_attractors() {
            let near = black_hole();
            let far = Attractor::new(Vec2::new(5000.0, 0.0), 200.0, 5.0e4, 0.3);
            let field = GravityField::new(vec![far, near]);
            assert_eq!(field.time_dilation(Vec2::new(100.0, 0.0)), 0.0);
            assert_eq!(field.time_dilation(Vec2::new(1000.0, 0.0)), 1.0);
        }

        #[test]
        fn empty_field_runs_at_full_rate() {
            assert_eq!(GravityField::default().time_dilation(Vec2::ZERO), 1.0);
        }
    }

    mod captures {
        use super::*;

        #[test]
        fn reports_event_horizon_membership() {
            let field = GravityField::new(vec![black_hole()]);
            assert!(field.captures(Vec2::new(0.0, 59.0)));
            assert!(!field.captures(Vec2::new(0.0, 61.0)));
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn dilation_is_non_increasing_toward_capture(
                r_outer in 60.0f64..400.0,
                step in 0.0f64..100.0,
            ) {
                let bh = black_hole();
                let r_inner = (r_outer - step).max(0.0);
                let outer = bh.time_dilation(Vec2::new(r_outer, 0.0));
                let inner = bh.time_dilation(Vec2::new(r_inner, 0.0));
                prop_assert!(inner <= outer);
                prop_assert!((0.0..=1.0).contains(&inner));
            }
        }
    }
}

use crate::{
    config::{ScreenConfig, ShipConfig},
    gravity::Attractor,
    relativity::gamma,
    types::{Body, BodyKind, ColorId, Vec2, ViewerState},
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn contains(&self, pos: Vec2, pad: f64) -> bool {
        -pad <= pos.x && pos.x <= self.width + pad && -pad <= pos.y && pos.y <= self.height + pad
    }

    pub fn contains_half_open(&self, pos: Vec2) -> bool {
        0.0 <= pos.x && pos.x < self.width && 0.0 <= pos.y && pos.y < self.height
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    Ellipse { width: f64, height: f64, axis: Vec2 },
    Disc { radius: f64 },
    Pixel,
    Ring { radius: f64 },
    Triangle { heading: f64, size: f64 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawDirective {
    pub center: Vec2,
    pub shape: Shape,
    pub color: ColorId,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Boost {
    pub beta: f64,
    pub gamma: f64,
    pub dir: Vec2,
}

#[derive(Clone, Debug)]
pub struct ViewProjector {
    c: f64,
    beta_clamp: f64,
    viewport: Viewport,
    debris_shade: u8,
    ship_size: f64,
}

impl ViewProjector {
    pub fn new(c: f64, beta_clamp: f64, screen: &ScreenConfig, ship: &ShipConfig) -> Self {
        Self {
            c,
            beta_clamp,
            viewport: Viewport {
                width: screen.width,
                height: screen.height,
            },
            debris_shade: screen.debris_shade,
            ship_size: ship.size,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn boost(&self, viewer_vel: Vec2) -> Boost {
        let speed = viewer_vel.length();
        let beta = (speed / self.c).min(self.beta_clamp);
        Boost {
            beta,
            gamma: gamma(beta),
            dir: viewer_vel.direction_or_reference(),
        }
    }

    pub fn contract(&self, boost: &Boost, viewer_pos: Vec2, world_pos: Vec2) -> Vec2 {
        let rel = world_pos - viewer_pos;
        let x_par = rel.dot(boost.dir);
        let x_perp = rel - boost.dir * x_par;
        boost.dir * (x_par / boost.gamma) + x_perp
    }

    pub fn doppler(&self, viewer_vel: Vec2, offset: Vec2) -> f64 {
        if offset.length_sq() == 0.0 {
            return 1.0;
        }
        let los = offset.normalize();
        let v_rad = -viewer_vel.dot(los);
        let beta_rad = (v_rad / self.c).clamp(-self.beta_clamp, self.beta_clamp);
        ((1.0 + beta_rad) / (1.0 - beta_rad)).sqrt()
    }

    pub fn project(&self, viewer: &ViewerState, body: &Body) -> Option<DrawDirective> {
        let boost = self.boost(viewer.vel);
        self.project_with(&boost, viewer, body)
    }

    pub fn project_with(
        &self,
        boost: &Boost,
        viewer: &ViewerState,
        body: &Body,
    ) -> Option<DrawDirective> {
        let origin = self.viewport.center();
        let (offset, visible) = match body.kind {
            // Disk particles share the uncontracted frame of the rings they orbit.
            BodyKind::DiskParticle => {
                let offset = body.pos - viewer.pos;
                (offset, self.viewport.contains_half_open(origin + offset))
            }
            BodyKind::Ship { .. } => {
                let offset = self.contract(boost, viewer.pos, body.pos);
                (offset, self.viewport.contains(origin + offset, self.ship_size))
            }
            BodyKind::Debris | BodyKind::Projectile => {
                let offset = self.contract(boost, viewer.pos, body.pos);
                (offset, self.viewport.contains(origin + offset, body.radius))
            }
        };
        if !visible {
            return None;
        }
        let center = origin + offset;

        let directive = match body.kind {
            BodyKind::Ship { heading } => DrawDirective {
                center,
                shape: Shape::Triangle {
                    heading,
                    size: self.ship_size,
                },
                color: ColorId::White,
            },
            BodyKind::Debris => {
                let doppler = self.doppler(viewer.vel, offset);
                let shade = (self.debris_shade as f64 * doppler) as i64;
                let diameter = body.radius * 2.0;
                DrawDirective {
                    center,
                    shape: Shape::Ellipse {
                        width: ((diameter / boost.gamma) as i64).max(1) as f64,
                        height: diameter,
                        axis: boost.dir,
                    },
                    color: ColorId::Shade(shade.clamp(0, 255) as u8),
                }
            }
            BodyKind::Projectile => DrawDirective {
                center,
                shape: Shape::Disc {
                    radius: body.radius,
                },
                color: ColorId::Yellow,
            },
            BodyKind::DiskParticle => DrawDirective {
                center,
                shape: Shape::Pixel,
                color: ColorId::Shade(self.debris_shade),
            },
        };
        Some(directive)
    }

    pub fn project_attractor(&self, viewer: &ViewerState, attractor: &Attractor) -> [DrawDirective; 2] {
        let center = attractor.pos - viewer.pos + self.viewport.center();
        [
            DrawDirective {
                center,
                shape: Shape::Ring {
                    radius: attractor.radius,
                },
                color: ColorId::InfluenceRing,
            },
            DrawDirective {
                center,
                shape: Shape::Ring {
                    radius: attractor.kill_radius,
                },
                color: ColorId::CaptureRing,
            },
        ]
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderCell {
    pub ch: char,
    pub layer: u8,
    pub color: ColorId,
}

const EMPTY_CELL: RenderCell = RenderCell {
    ch: ' ',
    layer: 0,
    color: ColorId::White,
};

#[derive(Debug)]
pub struct FrameBuffer {
    width: u16,
    height: u16,
    cells: Vec<RenderCell>,
}

impl FrameBuffer {
    pub fn new(width: u16, height: u16) -> Self {
        let mut buffer = Self {
            width,
            height,
            cells: Vec::new(),
        };
        buffer.resize(width, height);
        buffer
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        let len = (width as usize).saturating_mul(height as usize);
        if self.cells.len() != len {
            self.cells.resize(len, EMPTY_CELL);
        }
        self.clear();
    }

    pub fn clear(&mut self) {
        self.cells.fill(EMPTY_CELL);
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn get(&self, x: u16, y: u16) -> RenderCell {
        debug_assert!(x < self.width && y < self.height, "get() out of bounds");
        let idx = (y as usize) * (self.width as usize) + (x as usize);
        self.cells[idx]
    }

    fn set(&mut self, x: i32, y: i32, ch: char, layer: u8, color: ColorId) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let idx = (y as usize) * (self.width as usize) + (x as usize);
        let cell = &mut self.cells[idx];
        if layer >= cell.layer {
            *cell = RenderCell { ch, layer, color };
        }
    }
}

pub fn draw(directives: &[DrawDirective], viewport: Viewport, frame: &mut FrameBuffer) {
    frame.clear();
    if frame.width() == 0 || frame.height() == 0 {
        return;
    }
    let scale = Vec2::new(
        frame.width() as f64 / viewport.width,
        frame.height() as f64 / viewport.height,
    );
    for directive in directives {
        let layer = layer_for(&directive.shape);
        let color = directive.color;
        match directive.shape {
            Shape::Pixel => plot(frame, directive.center, scale, '.', layer, color),
            Shape::Disc { .. } => plot(frame, directive.center, scale, 'o', layer, color),
            Shape::Ring { radius } => {
                let ch = if directive.color == ColorId::CaptureRing { '#' } else { ':' };
                outline(frame, directive.center, radius, radius, Vec2::REFERENCE_AXIS, scale, ch, layer, color);
            }
            Shape::Ellipse { width, height, axis } => {
                outline(frame, directive.center, width / 2.0, height / 2.0, axis, scale, '*', layer, color);
                plot(frame, directive.center, scale, '*', layer, color);
            }
            Shape::Triangle { heading, size } => {
                let nose = Vec2::from_heading(heading);
                let points = [
                    directive.center + nose * size,
                    directive.center + nose.rotate_degrees(140.0) * size,
                    directive.center + nose.rotate_degrees(-140.0) * size,
                ];
                for i in 0..3 {
                    segment(frame, points[i], points[(i + 1) % 3], scale, '+', layer, color);
                }
                plot(frame, points[0], scale, '^', layer, color);
            }
        }
    }
}

fn layer_for(shape: &Shape) -> u8 {
    match shape {
        Shape::Ring { .. } => 1,
        Shape::Pixel => 2,
        Shape::Ellipse { .. } => 3,
        Shape::Triangle { .. } => 4,
        Shape::Disc { .. } => 5,
    }
}

fn to_cell(pos: Vec2, scale: Vec2) -> (i32, i32) {
    (
        (pos.x * scale.x).floor() as i32,
        (pos.y * scale.y).floor() as i32,
    )
}

fn plot(frame: &mut FrameBuffer, pos: Vec2, scale: Vec2, ch: char, layer: u8, color: ColorId) {
    let (x, y) = to_cell(pos, scale);
    frame.set(x, y, ch, layer, color);
}

#[allow(clippy::too_many_arguments)]
fn outline(
    frame: &mut FrameBuffer,
    center: Vec2,
    semi_along: f64,
    semi_across: f64,
    axis: Vec2,
    scale: Vec2,
    ch: char,
    layer: u8,
    color: ColorId,
) {
    let across = Vec2::new(-axis.y, axis.x);
    let cells = (semi_along.max(semi_across) * scale.x.max(scale.y)).ceil();
    let steps = ((cells * 8.0) as usize).clamp(8, 2048);
    for i in 0..steps {
        let t = i as f64 / steps as f64 * std::f64::consts::TAU;
        let p = center + axis * (semi_along * t.cos()) + across * (semi_across * t.sin());
        plot(frame, p, scale, ch, layer, color);
    }
}

fn segment(frame: &mut FrameBuffer, a: Vec2, b: Vec2, scale: Vec2, ch: char, layer: u8, color: ColorId) {
    let span = b - a;
    let cells = (span.x * scale.x).abs().max((span.y * scale.y).abs()).ceil();
    let steps = (cells as usize * 2).max(1);
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        plot(frame, a + span * t, scale, ch, layer, color);
    }
}

use std::{
    error::Error,
    io,
    time::{Duration, Instant},
};

use crossterm::{
    event::{self, Event as CrosstermEvent, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Terminal,
};

use crate::{
    config,
    core::World,
    render::{self, DrawDirective},
    types::{ColorId, Intents},
};

// Terminals report key presses and auto-repeats but no releases, so a key
// counts as held for this long after its last event.
const HOLD_WINDOW: Duration = Duration::from_millis(120);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    Quit,
    Captured,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionSummary {
    pub end: SessionEnd,
    pub frames: u64,
}

pub fn run(mut world: World) -> Result<SessionSummary, Box<dyn Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut world);
    shutdown_terminal(&mut terminal)?;
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    world: &mut World,
) -> Result<SessionSummary, Box<dyn Error>> {
    let mut ui_state = UiState::new();
    let mut directives: Vec<DrawDirective> = Vec::new();

    let mut accumulator = 0.0_f32;
    let mut last_tick = Instant::now();
    let mut last_render = Instant::now();
    let render_interval = Duration::from_secs_f32(1.0 / config::RENDER_HZ);
    let mut frames = 0_u64;

    loop {
        while event::poll(Duration::from_millis(0))? {
            if let CrosstermEvent::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Release {
                    continue;
                }
                let now = Instant::now();
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => {
                        return Ok(SessionSummary {
                            end: SessionEnd::Quit,
                            frames,
                        });
                    }
                    KeyCode::Left => ui_state.keys.left = Some(now),
                    KeyCode::Right => ui_state.keys.right = Some(now),
                    KeyCode::Up => ui_state.keys.up = Some(now),
                    KeyCode::Char(' ') => ui_state.pending_fire += 1,
                    _ => {}
                }
            }
        }

        let now = Instant::now();
        let dt = (now - last_tick).as_secs_f32();
        last_tick = now;
        accumulator += dt;

        while accumulator >= config::DT {
            let intents = ui_state.take_intents(now);
            let result = world.advance_frame(intents);
            accumulator -= config::DT;
            frames += 1;
            if result.session_over {
                return Ok(SessionSummary {
                    end: SessionEnd::Captured,
                    frames,
                });
            }
        }

        if last_render.elapsed() >= render_interval {
            world.draw_list(&mut directives);
            let stats = world.stats();
            let viewport = world.projector().viewport();
            terminal.draw(|frame| {
                let size = frame.size();
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(3),
                        Constraint::Min(3),
                        Constraint::Length(3),
                    ])
                    .split(size);

                let header = Paragraph::new(format!(
                    "β: {:.3} | γ: {:.3} | local time: {:.2} | debris: {} | shots: {} | disk: {} | sectors: {} | swallowed: {}",
                    stats.ship_beta,
                    stats.ship_gamma,
                    stats.ship_time_factor,
                    stats.debris_count,
                    stats.projectile_count,
                    stats.disk_count,
                    stats.sector_count,
                    stats.captured_total,
                ))
                .block(Block::default().borders(Borders::ALL).title("relativoids"));
                frame.render_widget(header, chunks[0]);

                let inner_w = chunks[1].width.saturating_sub(2);
                let inner_h = chunks[1].height.saturating_sub(2);
                ui_state.ensure_viewport(inner_w, inner_h);
                render::draw(&directives, viewport, &mut ui_state.framebuf);

                let framebuf = &ui_state.framebuf;
                let lines: Vec<Line> = (0..framebuf.height())
                    .map(|y| {
                        let spans: Vec<Span> = (0..framebuf.width())
                            .map(|x| {
                                let cell = framebuf.get(x, y);
                                Span::styled(cell.ch.to_string(), Style::default().fg(color_for(cell.color)))
                            })
                            .collect();
                        Line::from(spans)
                    })
                    .collect();

                let view = Paragraph::new(lines)
                    .block(Block::default().borders(Borders::ALL).title("Viewport"));
                frame.render_widget(view, chunks[1]);

                let footer = Paragraph::new("←/→: turn | ↑: thrust | space: fire | q: quit")
                    .block(Block::default().borders(Borders::ALL).title("Controls"));
                frame.render_widget(footer, chunks[2]);
            })?;

            last_render = Instant::now();
        }

        std::thread::sleep(Duration::from_millis(1));
    }
}

fn shutdown_terminal(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> Result<(), Box<dyn Error>> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

#[derive(Clone, Copy, Debug, Default)]
struct HeldKeys {
    left: Option<Instant>,
    right: Option<Instant>,
    up: Option<Instant>,
}

impl HeldKeys {
    fn held(stamp: Option<Instant>, now: Instant) -> bool {
        stamp.is_some_and(|t| now.saturating_duration_since(t) <= HOLD_WINDOW)
    }
}

struct UiState {
    framebuf: render::FrameBuffer,
    keys: HeldKeys,
    pending_fire: u32,
}

impl UiState {
    fn new() -> Self {
        Self {
            framebuf: render::FrameBuffer::new(0, 0),
            keys: HeldKeys::default(),
            pending_fire: 0,
        }
    }

    fn ensure_viewport(&mut self, width: u16, height: u16) {
        if self.framebuf.width() != width || self.framebuf.height() != height {
            self.framebuf.resize(width, height);
        }
    }

    fn take_intents(&mut self, now: Instant) -> Intents {
        let fire = self.pending_fire > 0;
        if fire {
            self.pending_fire -= 1;
        }
        Intents {
            turn_left: HeldKeys::held(self.keys.left, now),
            turn_right: HeldKeys::held(self.keys.right, now),
            thrust: HeldKeys::held(self.keys.up, now),
            fire,
        }
    }
}

fn color_for(color: ColorId) -> Color {
    match color {
        ColorId::White => Color::White,
        ColorId::Shade(level) => Color::Rgb(level, level, level),
        ColorId::Yellow => Color::Yellow,
        ColorId::InfluenceRing => Color::Rgb(50, 50, 50),
        ColorId::CaptureRing => Color::Red,
    }
}

//! Software-rendered visualizer using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌───────────────────────────────┬──────────────────┐
//! │  FRONT (switch plane)         │  SIDE (press     │
//! │                               │  axis → right)   │
//! │        .-----.                │    |  ##  |      │
//! │       /   |   \   ● tip       │    |  ##  |  ●   │
//! │       \   |   /               │    |  ##  |      │
//! │        '-----'                │                  │
//! ├───────────────────────────────┴──────────────────┤
//! │  status bar / last events                        │
//! │  key legend                                      │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! The front view spans ±2 radii; the side view spans ±3 slab
//! half-thicknesses horizontally and ±2 radii vertically, so the switch is
//! always visible whatever its real size.

use std::sync::mpsc::Sender;

use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};
use touch_switch::Hand;

use crate::source::{SimHand, SimInput};

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:       usize = 720;
pub const WIN_H:       usize = 520;
const FRONT_X:         usize = 20;
const FRONT_Y:         usize = 30;
const FRONT_SIZE:      usize = 400;
const SIDE_X:          usize = 450;
const SIDE_Y:          usize = FRONT_Y;
const SIDE_W:          usize = 250;
const SIDE_H:          usize = FRONT_SIZE;
const STATUS_Y:        usize = WIN_H - 70;
const BG_COLOR:        u32   = 0xFF1A1A2E;
const PANEL_BG:        u32   = 0xFF16213E;
const TEXT_BG:         u32   = 0xFF0F3460;
const RING_COLOR:      u32   = 0xFF5DADE2;
const SLAB_COLOR:      u32   = 0xFF224466;
const AXIS_COLOR:      u32   = 0xFF333355;
const TIP_IDLE:        u32   = 0xFFAAAAAA;
const TIP_TOUCH:       u32   = 0xFFFFD700;  // gold
const ROLL_COLOR:      u32   = 0xFFFF8866;
const FLASH_COLOR:     u32   = 0xFFFFFFFF;
const DISABLED_COLOR:  u32   = 0xFF884444;

/// Everything the renderer needs for one frame.
pub struct RenderState<'a> {
    pub hand:       &'a SimHand,
    pub touching:   bool,
    pub enabled:    bool,
    pub mode_label: &'a str,
    pub status:     &'a str,
    pub recent:     &'a [String],
    /// Haptic flash amplitude and hand, if one is showing.
    pub flash:      Option<(f32, Hand)>,
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window:   Window,
    buf:      Vec<u32>,
    sim_tx:   Sender<SimInput>,
}

impl Visualizer {
    pub fn new(sim_tx: Sender<SimInput>) -> Result<Self, String> {
        let mut window = Window::new(
            "Touch Switch simulator",
            WIN_W, WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| e.to_string())?;

        window.limit_update_rate(Some(std::time::Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            buf: vec![BG_COLOR; WIN_W * WIN_H],
            sim_tx,
        })
    }

    /// Returns false when the window should close.
    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Poll keyboard and mouse and translate to `SimInput` events.
    pub fn poll_input(&mut self) -> bool {
        if !self.window.is_open() { return false; }

        let shift = self.window.is_key_down(Key::LeftShift)
                 || self.window.is_key_down(Key::RightShift);
        let scale = if shift { 0.25 } else { 1.0 };

        // Keys that trigger on first press only
        let one_shot = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);
        // Keys that repeat while held
        let held     = |k: Key| self.window.is_key_down(k);

        let mut inputs = Vec::new();

        if one_shot(Key::Escape) {
            let _ = self.sim_tx.send(SimInput::Quit);
            return false;
        }
        if one_shot(Key::Space)  { inputs.push(SimInput::TogglePress); }
        if one_shot(Key::Tab)    { inputs.push(SimInput::SwapHand); }
        if one_shot(Key::G)      { inputs.push(SimInput::ToggleGrip); }
        if one_shot(Key::V)      { inputs.push(SimInput::ToggleViewer); }
        if one_shot(Key::Enter)  { inputs.push(SimInput::Interact); }
        if one_shot(Key::K)      { inputs.push(SimInput::DesktopKey); }

        if held(Key::Left)  { inputs.push(SimInput::Nudge { dx: -scale, dy: 0.0 }); }
        if held(Key::Right) { inputs.push(SimInput::Nudge { dx:  scale, dy: 0.0 }); }
        if held(Key::Up)    { inputs.push(SimInput::Nudge { dx: 0.0, dy:  scale }); }
        if held(Key::Down)  { inputs.push(SimInput::Nudge { dx: 0.0, dy: -scale }); }
        if held(Key::W)     { inputs.push(SimInput::Push { dz: -scale }); }
        if held(Key::S)     { inputs.push(SimInput::Push { dz:  scale }); }
        if held(Key::Q)     { inputs.push(SimInput::Roll { degrees:  2.0 * scale }); }
        if held(Key::E)     { inputs.push(SimInput::Roll { degrees: -2.0 * scale }); }

        // Dragging in the front view places the fingertip directly.
        if self.window.get_mouse_down(MouseButton::Left) {
            if let Some((mx, my)) = self.window.get_mouse_pos(MouseMode::Discard) {
                let (x, y) = front_to_plane(mx, my);
                if x.abs() <= 2.0 && y.abs() <= 2.0 {
                    inputs.push(SimInput::DragTo { x, y });
                }
            }
        }

        for input in inputs {
            let _ = self.sim_tx.send(input);
        }
        true
    }

    /// Render one frame.
    pub fn render(&mut self, state: &RenderState) {
        // Clear
        self.buf.fill(BG_COLOR);

        let tip_color = if !state.enabled {
            DISABLED_COLOR
        } else if state.touching {
            TIP_TOUCH
        } else {
            TIP_IDLE
        };

        // ── Front view ────────────────────────────────────────────────────
        self.fill_rect(FRONT_X, FRONT_Y, FRONT_SIZE, FRONT_SIZE, PANEL_BG);
        let (cx, cy) = (FRONT_X + FRONT_SIZE / 2, FRONT_Y + FRONT_SIZE / 2);
        let unit = FRONT_SIZE as f32 / 4.0; // px per radius
        self.hline(FRONT_X, FRONT_X + FRONT_SIZE, cy, AXIS_COLOR);
        self.vline(cx, FRONT_Y, FRONT_Y + FRONT_SIZE, AXIS_COLOR);
        self.draw_circle(cx, cy, unit, RING_COLOR);
        self.draw_label("FRONT", FRONT_X, FRONT_Y - 12, 0xFFAADDFF);

        let [px, py] = state.hand.plane;
        let tx = cx as f32 + px * unit;
        let ty = cy as f32 - py * unit;
        self.fill_disc(tx, ty, 5.0, tip_color);

        // Roll indicator: the hand's "up" as a needle from the fingertip.
        let roll = state.hand.roll_deg.to_radians();
        self.draw_line(tx, ty, tx - roll.sin() * 24.0, ty - roll.cos() * 24.0, ROLL_COLOR);

        // ── Side view ─────────────────────────────────────────────────────
        self.fill_rect(SIDE_X, SIDE_Y, SIDE_W, SIDE_H, PANEL_BG);
        let scx = SIDE_X + SIDE_W / 2;
        let scy = SIDE_Y + SIDE_H / 2;
        let zunit = SIDE_W as f32 / 6.0; // px per half-thickness
        let slab_w = (2.0 * zunit) as usize;
        let slab_h = (2.0 * unit) as usize;
        self.fill_rect(scx - slab_w / 2, scy - slab_h / 2, slab_w, slab_h, SLAB_COLOR);
        self.hline(SIDE_X, SIDE_X + SIDE_W, scy, AXIS_COLOR);
        self.draw_label("SIDE  forward ->", SIDE_X, SIDE_Y - 12, 0xFFAADDFF);

        let sx = scx as f32 + state.hand.depth * zunit;
        let sy = scy as f32 - py * unit;
        self.fill_disc(sx, sy, 5.0, tip_color);

        // ── Haptic flash ──────────────────────────────────────────────────
        if let Some((amp, hand)) = state.flash {
            let color = blend(BG_COLOR, FLASH_COLOR, amp.clamp(0.0, 1.0));
            let x = if hand == Hand::Left { 0 } else { WIN_W - 6 };
            self.fill_rect(x, 0, 6, STATUS_Y, color);
        }

        // ── Status bar ────────────────────────────────────────────────────
        self.fill_rect(0, STATUS_Y, WIN_W, WIN_H - STATUS_Y, TEXT_BG);
        let header = format!(
            "mode: {}  hand: {}  grip: {}  viewer: {}  detector: {}",
            state.mode_label,
            state.hand.driven.as_str(),
            if state.hand.grip { "on" } else { "off" },
            if state.hand.far { "far" } else { "near" },
            if state.enabled { "on" } else { "off" },
        );
        self.draw_label(&header, 10, STATUS_Y + 6, 0xFFEEEEEE);
        self.draw_label(state.status, 10, STATUS_Y + 18, 0xFFFFD700);
        let recent = state.recent.join("  ");
        self.draw_label(&recent, 10, STATUS_Y + 30, 0xFFCCCCCC);

        // ── Key legend ────────────────────────────────────────────────────
        self.draw_label(
            "arrows/drag=move  W/S=push/pull  space=press  Q/E=roll  tab=hand  G=grip  V=viewer  enter=click  K=key  esc=quit",
            10, WIN_H - 14, 0xFF888888,
        );

        self.window.update_with_buffer(&self.buf, WIN_W, WIN_H).ok();
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y+h).min(WIN_H) {
            for col in x..(x+w).min(WIN_W) {
                self.buf[row * WIN_W + col] = color;
            }
        }
    }

    fn hline(&mut self, x0: usize, x1: usize, y: usize, color: u32) {
        for x in x0..x1 { self.set_pixel(x, y, color); }
    }

    fn vline(&mut self, x: usize, y0: usize, y1: usize, color: u32) {
        for y in y0..y1 { self.set_pixel(x, y, color); }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < WIN_W && y < WIN_H {
            self.buf[y * WIN_W + x] = color;
        }
    }

    fn set_pixel_f(&mut self, x: f32, y: f32, color: u32) {
        if x >= 0.0 && y >= 0.0 {
            self.set_pixel(x as usize, y as usize, color);
        }
    }

    fn draw_circle(&mut self, cx: usize, cy: usize, r: f32, color: u32) {
        let steps = (r * 8.0) as usize;
        for i in 0..steps {
            let a = i as f32 / steps as f32 * std::f32::consts::TAU;
            self.set_pixel_f(cx as f32 + a.cos() * r, cy as f32 + a.sin() * r, color);
        }
    }

    fn fill_disc(&mut self, cx: f32, cy: f32, r: f32, color: u32) {
        let ri = r.ceil() as isize;
        for dy in -ri..=ri {
            for dx in -ri..=ri {
                if (dx * dx + dy * dy) as f32 <= r * r {
                    self.set_pixel_f(cx + dx as f32, cy + dy as f32, color);
                }
            }
        }
    }

    fn draw_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: u32) {
        let n = (x1 - x0).abs().max((y1 - y0).abs()).ceil().max(1.0) as usize;
        for i in 0..=n {
            let t = i as f32 / n as f32;
            self.set_pixel_f(x0 + (x1 - x0) * t, y0 + (y1 - y0) * t, color);
        }
    }

    /// Minimal bitmap font, 3×5 characters.
    /// Each character is encoded as 5 rows × 3 bits.
    fn draw_label(&mut self, text: &str, x: usize, y: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.set_pixel(cx + col, y + row, color);
                    }
                }
            }
            cx += 4; // 3 wide + 1 gap
            if cx + 4 > WIN_W { break; }
        }
    }
}

/// Window pixel → front-view plane coordinates in radii (+y up).
pub fn front_to_plane(mx: f32, my: f32) -> (f32, f32) {
    let unit = FRONT_SIZE as f32 / 4.0;
    let cx = (FRONT_X + FRONT_SIZE / 2) as f32;
    let cy = (FRONT_Y + FRONT_SIZE / 2) as f32;
    ((mx - cx) / unit, (cy - my) / unit)
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '>' => [0b100, 0b010, 0b001, 0b010, 0b100],
        '<' => [0b001, 0b010, 0b100, 0b010, 0b001],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

/// Alpha-blend two ARGB colors. `t` = 0.0 → all `a`, `t` = 1.0 → all `b`.
fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |ca: u32, cb: u32| (ca as f32 * (1.0-t) + cb as f32 * t) as u32;
    let ar = (a >> 16) & 0xFF; let br = (b >> 16) & 0xFF;
    let ag = (a >>  8) & 0xFF; let bg = (b >>  8) & 0xFF;
    let ab =  a        & 0xFF; let bb =  b        & 0xFF;
    0xFF000000 | (lerp(ar,br) << 16) | (lerp(ag,bg) << 8) | lerp(ab,bb)
}

use crate::body::{Body, HasPosition, Rgb};
use crate::config::Settings;
use crate::orbit::{self, Vec2};
use crate::system::SolarSystem;
use crossterm::{
    cursor, execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::f32::consts::PI;
use std::io::{self, Write};

/// Terminal cells are roughly twice as tall as they are wide.
pub(crate) const CELL_ASPECT: f64 = 0.5;
const LEGEND_W: u16 = 24;
const SUN_RADIUS: f64 = 12.0;
const BODY_RADIUS: f64 = 0.6;
const RING_SQUASH: f64 = 0.35;

const BG: Color = Color::Black;
const TEXT: Rgb = Rgb::new(220, 220, 220);
const DIM: Rgb = Rgb::new(120, 120, 120);
const EDGE: Rgb = Rgb::new(80, 95, 120);
const SUN: Rgb = Rgb::new(255, 220, 90);
const BELT: Rgb = Rgb::new(140, 120, 100);
const RING: Rgb = Rgb::new(210, 190, 140);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self { ch: ' ', fg: Color::White, bg: BG }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
    pub(crate) fn clear(&mut self) {
        self.cells.fill(Cell::default());
    }
    fn put(&mut self, x: u16, y: u16, ch: char, fg: Rgb) {
        self.set(x, y, Cell { ch, fg: fg.to_color(), bg: BG });
    }
    /// Writes `s` from column `x`, stopping at `limit`.
    fn write_str(&mut self, x: u16, y: u16, limit: u16, s: &str, fg: Rgb) {
        let mut xi = x;
        for ch in s.chars() {
            if xi >= limit.min(self.w) {
                break;
            }
            self.put(xi, y, ch, fg);
            xi += 1;
        }
    }
    fn write_centered(&mut self, cx: u16, y: u16, limit: u16, s: &str, fg: Rgb) {
        let half = (s.chars().count() / 2) as u16;
        self.write_str(cx.saturating_sub(half), y, limit, s, fg);
    }
    fn box_draw(&mut self, x0: u16, y0: u16, bw: u16, bh: u16, fg: Rgb) {
        if bw < 2 || bh < 2 {
            return;
        }
        let x1 = x0.saturating_add(bw - 1);
        let y1 = y0.saturating_add(bh - 1);
        for x in x0 + 1..x1 {
            self.put(x, y0, '─', fg);
            self.put(x, y1, '─', fg);
        }
        for y in y0 + 1..y1 {
            self.put(x0, y, '│', fg);
            self.put(x1, y, '│', fg);
        }
        self.put(x0, y0, '┌', fg);
        self.put(x1, y0, '┐', fg);
        self.put(x0, y1, '└', fg);
        self.put(x1, y1, '┘', fg);
    }
}

pub(crate) struct Terminal {
    out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    prev: CellBuffer,
    pub(crate) cur: CellBuffer,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;

        let setup = terminal::size().and_then(|size| terminal::enable_raw_mode().map(|_| size));
        let (cols, rows) = match setup {
            Ok(size) => size,
            Err(e) => {
                let _ = execute!(out, cursor::Show, EnableLineWrap, LeaveAlternateScreen);
                return Err(e.into());
            }
        };
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
        })
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        queue!(
            self.out,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        execute!(self.out, terminal::Clear(ClearType::All))?;
        Ok(true)
    }

    /// Sends only the cells that changed since the last call.
    pub(crate) fn present(&mut self) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;
        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if c == self.prev.cells[i] {
                    continue;
                }
                queue!(self.out, cursor::MoveTo(x, y))?;
                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }
                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Star {
    pub(crate) x: u16,
    pub(crate) y: u16,
    phase: f32,
    depth: f32,
}

pub(crate) fn build_stars(w: u16, h: u16, count: usize, seed: u64) -> Vec<Star> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut stars = Vec::with_capacity(count);
    if w == 0 || h == 0 {
        return stars;
    }
    for _ in 0..count {
        stars.push(Star {
            x: rng.gen_range(0..w),
            y: rng.gen_range(0..h),
            phase: rng.gen_range(0.0..(PI * 2.0)),
            depth: rng.gen_range(0.35..1.0),
        });
    }
    stars
}

/// Columns left for the scene once the legend panel is carved off.
pub(crate) fn scene_width(w: u16, settings: &Settings) -> u16 {
    if settings.show_legend && w > LEGEND_W * 2 {
        w - LEGEND_W
    } else {
        w
    }
}

pub(crate) fn star_count(scene_w: u16, h: u16, settings: &Settings) -> usize {
    if settings.star_count > 0 {
        return settings.star_count;
    }
    ((scene_w as usize) * (h as usize) / 40).clamp(40, 400)
}

/// Maps world coordinates (sun at the origin, y up) onto terminal cells.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Projection {
    cx: f64,
    cy: f64,
    scale: f64,
    w: u16,
    h: u16,
}

impl Projection {
    /// Fits a disc of radius `extent` into a `w` x `h` cell area.
    pub(crate) fn fit(w: u16, h: u16, extent: f64) -> Self {
        let half_w = (w as f64 / 2.0 - 1.0).max(1.0);
        let half_h = (h as f64 / 2.0 - 1.0).max(1.0);
        let extent = extent.max(1.0);
        let scale = (half_w / extent).min(half_h / (extent * CELL_ASPECT));
        Self {
            cx: (w as f64 - 1.0) / 2.0,
            cy: (h as f64 - 1.0) / 2.0,
            scale,
            w,
            h,
        }
    }

    /// Columns per world unit.
    pub(crate) fn scale(&self) -> f64 {
        self.scale
    }

    /// Unrounded cell coordinates of `p`; may lie off screen.
    fn cell_coords(&self, p: Vec2) -> (f64, f64) {
        (self.cx + p.x * self.scale, self.cy - p.y * self.scale * CELL_ASPECT)
    }

    pub(crate) fn to_cell(&self, p: Vec2) -> Option<(u16, u16)> {
        self.offset_cell(p, 0.0, 0.0)
    }

    /// Like `to_cell` but shifted by a number of columns and rows.
    fn offset_cell(&self, p: Vec2, dx: f64, dy: f64) -> Option<(u16, u16)> {
        let (px, py) = self.cell_coords(p);
        let x = (px + dx).round();
        let y = (py + dy).round();
        if x < 0.0 || y < 0.0 || x >= self.w as f64 || y >= self.h as f64 {
            return None;
        }
        Some((x as u16, y as u16))
    }
}

fn draw_disc(buf: &mut CellBuffer, proj: &Projection, center: Vec2, radius: f64, fg: Rgb, small: char) {
    let rx = radius * proj.scale();
    let ry = rx * CELL_ASPECT;
    if rx < 1.0 || ry < 0.5 {
        if let Some((x, y)) = proj.to_cell(center) {
            buf.put(x, y, small, fg);
        }
        return;
    }
    // only the part of the bounding box that can land on screen
    let (px, py) = proj.cell_coords(center);
    let (ix, iy) = (rx.ceil() as i32, ry.ceil() as i32);
    let x_lo = (-ix).max(((-px).floor() as i32).saturating_sub(1));
    let x_hi = ix.min(((proj.w as f64 - px).ceil() as i32).saturating_add(1));
    let y_lo = (-iy).max(((-py).floor() as i32).saturating_sub(1));
    let y_hi = iy.min(((proj.h as f64 - py).ceil() as i32).saturating_add(1));
    for dy in y_lo..=y_hi {
        for dx in x_lo..=x_hi {
            let (fx, fy) = (dx as f64 / rx, dy as f64 / ry);
            if fx * fx + fy * fy > 1.0 {
                continue;
            }
            if let Some((x, y)) = proj.offset_cell(center, dx as f64, dy as f64) {
                buf.put(x, y, '●', fg);
            }
        }
    }
}

fn draw_ellipse_path(buf: &mut CellBuffer, proj: &Projection, points: impl Iterator<Item = Vec2>, ch: char, fg: Rgb) {
    for p in points {
        if let Some((x, y)) = proj.to_cell(p) {
            buf.put(x, y, ch, fg);
        }
    }
}

const MAX_PATH_STEPS: f64 = 2048.0;

fn path_steps(radius: f64, proj: &Projection) -> usize {
    ((2.0 * std::f64::consts::PI * radius * proj.scale()) * 1.5).clamp(24.0, MAX_PATH_STEPS) as usize
}

fn draw_stars(buf: &mut CellBuffer, scene_w: u16, stars: &[Star], t_real: f32) {
    for s in stars {
        if s.x >= scene_w {
            continue;
        }
        let tw = (t_real * 0.65 + s.phase).sin() * 0.5 + 0.5;
        let b = 0.2 + 0.8 * tw * s.depth;
        let c = (40.0 + b * 180.0).clamp(0.0, 255.0) as u8;
        let ch = if b > 0.82 { '✦' } else if b > 0.62 { '•' } else { '·' };
        buf.put(s.x, s.y, ch, Rgb::new(c, c, c.saturating_add(25)));
    }
}

fn draw_orbits(buf: &mut CellBuffer, proj: &Projection, sys: &SolarSystem) {
    for body in &sys.bodies {
        if body.is_satellite() {
            continue;
        }
        let o = body.orbit();
        let steps = path_steps(orbit::aphelion(o), proj);
        let points = (0..steps).map(|s| orbit::position(360.0 * s as f64 / steps as f64, o, sys.tilt));
        draw_ellipse_path(buf, proj, points, '·', EDGE);
    }
}

fn draw_belt(buf: &mut CellBuffer, proj: &Projection, sys: &SolarSystem) {
    for a in &sys.belt {
        if let Some((x, y)) = proj.to_cell(a.position(sys.tilt)) {
            buf.put(x, y, '.', BELT);
        }
    }
}

fn draw_rings(buf: &mut CellBuffer, proj: &Projection, center: Vec2, size: f64) {
    let unit = proj.scale().max(1e-6);
    for (i, k) in [1.5, 2.1].iter().enumerate() {
        // at least a couple of cells out so the rings clear the planet glyph
        let r = (size * BODY_RADIUS * k).max((2 + i) as f64 / unit);
        let steps = path_steps(r, proj);
        let points = (0..steps).map(|s| {
            let (sn, cs) = (360.0 * s as f64 / steps as f64).to_radians().sin_cos();
            Vec2::new(center.x + r * cs, center.y + r * sn * RING_SQUASH)
        });
        draw_ellipse_path(buf, proj, points, '·', RING.scale(1.0 - 0.2 * i as f32));
    }
}

fn draw_body(buf: &mut CellBuffer, proj: &Projection, body: &Body, settings: &Settings) {
    let pos = body.position();
    if let Body::Planet(p) = body {
        if p.rings && settings.show_rings {
            draw_rings(buf, proj, pos, p.size);
        }
    }
    let small = if body.size() >= 10.0 { '●' } else { '•' };
    draw_disc(buf, proj, pos, body.size() * BODY_RADIUS, body.color(), small);
}

/// Planet names go above the sprite, satellite names below so they do not
/// collide with the parent's label.
fn draw_label(buf: &mut CellBuffer, proj: &Projection, body: &Body, limit: u16) {
    let pos = body.position();
    let rows = (body.size() * BODY_RADIUS * proj.scale() * CELL_ASPECT).ceil().max(1.0);
    let dy = if body.is_satellite() { rows } else { -rows };
    if let Some((x, y)) = proj.offset_cell(pos, 0.0, dy) {
        buf.write_centered(x, y, limit, body.name(), TEXT);
    }
}

fn draw_legend(buf: &mut CellBuffer, x0: u16, sys: &SolarSystem) {
    let h = buf.h;
    let bw = buf.w.saturating_sub(x0);
    buf.box_draw(x0, 0, bw, h, EDGE);

    let x = x0 + 2;
    let limit = x0 + bw.saturating_sub(1);
    let last_row = h.saturating_sub(2);
    let mut y = 1u16;

    buf.write_str(x, y, limit, "Solar System", TEXT);
    y += 2;
    for body in &sys.bodies {
        if y > last_row {
            return;
        }
        let (indent, bullet) = if body.is_satellite() { (2, '◦') } else { (0, '•') };
        buf.put(x + indent, y, bullet, body.color());
        buf.write_str(x + indent + 2, y, limit, body.name(), DIM);
        y += 1;
    }

    for line in [
        String::new(),
        format!("tick  {}", sys.ticks),
        format!("scale {:.2}", sys.time_scale),
        format!("speed {}", sys.speed_law.describe()),
        String::new(),
        "q quit".to_string(),
    ] {
        if y > last_row {
            return;
        }
        buf.write_str(x, y, limit, &line, DIM);
        y += 1;
    }
}

/// Paints one full frame of `sys` into `buf`.
pub(crate) fn draw_frame(buf: &mut CellBuffer, sys: &SolarSystem, settings: &Settings, stars: &[Star], t_real: f32) {
    buf.clear();
    let scene_w = scene_width(buf.w, settings);
    let proj = Projection::fit(scene_w, buf.h, sys.extent() * 1.04);

    if settings.show_stars {
        draw_stars(buf, scene_w, stars, t_real);
    }
    if settings.show_orbits {
        draw_orbits(buf, &proj, sys);
    }
    if settings.show_belt {
        draw_belt(buf, &proj, sys);
    }

    let origin = Vec2::default();
    draw_disc(buf, &proj, origin, SUN_RADIUS, SUN, '☼');
    if settings.show_labels {
        let rows_down = (SUN_RADIUS * proj.scale() * CELL_ASPECT).ceil().max(1.0);
        if let Some((x, y)) = proj.offset_cell(origin, 0.0, rows_down + 1.0) {
            buf.write_centered(x, y, scene_w, "Sun", TEXT);
        }
    }

    // planets before satellites so a moon is never hidden behind its parent
    for body in sys.bodies.iter().filter(|b| !b.is_satellite()) {
        draw_body(buf, &proj, body, settings);
    }
    for body in sys.bodies.iter().filter(|b| b.is_satellite()) {
        draw_body(buf, &proj, body, settings);
    }
    if settings.show_labels {
        for body in sys.bodies.iter().filter(|b| !b.is_satellite()) {
            draw_label(buf, &proj, body, scene_w);
        }
        for body in sys.bodies.iter().filter(|b| b.is_satellite()) {
            draw_label(buf, &proj, body, scene_w);
        }
    }

    if scene_w < buf.w {
        draw_legend(buf, scene_w, sys);
    }
}

/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. `begin_frame` sizes the buffers and maps the arena onto the cells
///      between the HUD row and the hint row
///   2. Screens paint through the `Surface` trait into the `front` buffer
///   3. `end_frame` compares each cell with `back` (previous frame) and only
///      emits terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once, then the
///      buffers swap
///
/// This eliminates flicker caused by full-screen redraws.

use std::io::{self, BufWriter, Write};
use std::ops::Range;

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use glam::Vec2;

use crate::domain::entity::{ItemKind, ItemRole};
use crate::domain::physics::{Arena, Rect};
use crate::sim::level::Rgb;
use super::surface::{Paint, Surface, TextSlot};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells.
    ///
    /// On VTE-based terminals the inter-row gap pixels use the background of
    /// the last Clear. Using the SAME explicit RGB for `Clear(ClearType::All)`
    /// and every cell background keeps those gaps invisible.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel used to invalidate the back buffer: differs from any real
    /// cell, so every position is diff'd.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    /// Outside the fog radius.
    const FOGGED: Cell = Cell { ch: ' ', fg: Color::White, bg: Color::Rgb { r: 8, g: 8, b: 14 } };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg: Self::norm_bg(bg) }
    }

    /// Normalize bg: Color::Reset → BASE_BG so every cell gets an explicit
    /// background color (never terminal-default).
    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y). Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    /// Write a string horizontally centered on row y.
    fn put_centered(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        let len = s.chars().count();
        let x = self.width.saturating_sub(len) / 2;
        self.put_str(x, y, s, fg, bg);
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }
}

// ── Viewport: arena units → terminal cells ──

/// Rows above the arena (HUD).
const MAP_ROW: usize = 1;
/// Rows below the arena (hint bar).
const FOOTER_ROWS: usize = 1;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Viewport {
    arena: Arena,
    cols: usize,
    rows: usize,
}

impl Viewport {
    fn new(arena: Arena, term_w: usize, term_h: usize) -> Self {
        Viewport {
            arena,
            cols: term_w.max(1),
            rows: term_h.saturating_sub(MAP_ROW + FOOTER_ROWS).max(1),
        }
    }

    /// Arena units covered by one cell.
    fn cell_size(&self) -> Vec2 {
        Vec2::new(self.arena.width / self.cols as f32, self.arena.height / self.rows as f32)
    }

    /// Screen cell holding an arena point.
    fn cell_of(&self, p: Vec2) -> Option<(usize, usize)> {
        if p.x < 0.0 || p.y < 0.0 { return None; }
        let s = self.cell_size();
        let (col, row) = ((p.x / s.x) as usize, (p.y / s.y) as usize);
        (col < self.cols && row < self.rows).then_some((col, MAP_ROW + row))
    }

    /// Arena point at the middle of a screen cell.
    fn cell_center(&self, col: usize, screen_row: usize) -> Vec2 {
        let s = self.cell_size();
        Vec2::new(
            (col as f32 + 0.5) * s.x,
            (screen_row.saturating_sub(MAP_ROW) as f32 + 0.5) * s.y,
        )
    }

    /// Columns and screen rows touched by a rect.
    fn span(&self, rect: Rect) -> (Range<usize>, Range<usize>) {
        let s = self.cell_size();
        let cols = (rect.x / s.x).floor().max(0.0) as usize
            ..((rect.right() / s.x).ceil().max(0.0) as usize).min(self.cols);
        let rows = (rect.y / s.y).floor().max(0.0) as usize
            ..((rect.bottom() / s.y).ceil().max(0.0) as usize).min(self.rows);
        (cols, rows.start + MAP_ROW..rows.end + MAP_ROW)
    }
}

// ── Palette ──

fn rgb(c: Rgb) -> Color {
    Color::Rgb { r: c.r, g: c.g, b: c.b }
}

fn item_glyph(kind: ItemKind) -> char {
    match kind {
        ItemKind::Orb => '●',
        ItemKind::Heart => '♥',
        ItemKind::Lantern => '¤',
        ItemKind::Note => '♪',
        ItemKind::Star => '✦',
    }
}

/// Glyph, foreground and background for a paint.
fn style(paint: Paint) -> (char, Color, Color) {
    match paint {
        Paint::Obstacle => ('▓', Color::Rgb { r: 110, g: 84, b: 60 }, Color::Rgb { r: 52, g: 40, b: 30 }),
        Paint::Gate => ('#', Color::Rgb { r: 230, g: 190, b: 90 }, Color::Rgb { r: 70, g: 50, b: 20 }),
        Paint::Platform => ('═', Color::Rgb { r: 150, g: 210, b: 230 }, Color::Rgb { r: 30, g: 60, b: 72 }),
        Paint::Key => ('k', Color::Rgb { r: 255, g: 215, b: 80 }, Color::Reset),
        Paint::Item { kind, role, dissolving } => {
            let fg = if dissolving {
                Color::DarkGrey
            } else {
                match role {
                    ItemRole::Required => Color::Rgb { r: 255, g: 230, b: 150 },
                    ItemRole::Bonus => Color::Rgb { r: 180, g: 220, b: 255 },
                    ItemRole::Timed => Color::Rgb { r: 255, g: 170, b: 120 },
                }
            };
            (item_glyph(kind), fg, Color::Reset)
        }
        Paint::Light { color, glow } => ('█', rgb(color), rgb(glow)),
        Paint::Trail(glow) => ('·', rgb(glow), Color::Reset),
        Paint::Chaser => ('▒', Color::Rgb { r: 150, g: 80, b: 190 }, Color::Rgb { r: 40, g: 20, b: 55 }),
        Paint::Guide => ('♣', Color::Rgb { r: 130, g: 210, b: 130 }, Color::Reset),
        Paint::Heart => ('♥', Color::Rgb { r: 255, g: 110, b: 150 }, Color::Reset),
        Paint::Cursor => ('▔', Color::White, Color::Reset),
    }
}

/// Dialogue text color at a given opacity, blended onto the base background.
fn faded(opacity: f32) -> Color {
    let t = opacity.clamp(0.0, 1.0);
    let mix = |from: u8, to: u8| (from as f32 + (to as f32 - from as f32) * t).round() as u8;
    Color::Rgb { r: mix(22, 245), g: mix(22, 238), b: mix(35, 220) }
}

/// Greedy word wrap. Words longer than `width` are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            lines.push(word.drain(..width).collect());
        }
        let word: String = word.into_iter().collect();
        let needed = line.chars().count() + usize::from(!line.is_empty()) + word.chars().count();
        if needed > width && !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() { line.push(' '); }
        line.push_str(&word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

// ── Renderer ──

const HUD_BG: Color = Color::Rgb { r: 24, g: 44, b: 34 };
const HEADING_FG: Color = Color::Rgb { r: 255, g: 220, b: 150 };
const DIALOGUE_ROWS: usize = 3;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    view: Viewport,
    /// Terminal reports key Release events.
    enhanced: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            view: Viewport::new(Arena::new(800.0, 600.0), 80, 24),
            enhanced: false,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        self.enhanced = matches!(terminal::supports_keyboard_enhancement(), Ok(true));
        if self.enhanced {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }
        log::debug!("keyboard release events: {}", self.enhanced);

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
        Ok(())
    }

    /// Whether held keys can be tracked by Release events.
    pub fn reports_release(&self) -> bool {
        self.enhanced
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Start a frame for a screen laid out on `arena`.
    pub fn begin_frame(&mut self, arena: Arena) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }
        self.view = Viewport::new(arena, self.term_w, self.term_h);
        self.front.clear();
        Ok(())
    }

    /// Diff against the previous frame, emit, swap.
    pub fn end_frame(&mut self) -> io::Result<()> {
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        // Force full repaint: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);
    }

    fn heading_row(&self) -> usize {
        MAP_ROW + self.view.rows / 3
    }

    fn hint_row(&self) -> usize {
        self.term_h.saturating_sub(1)
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors at start of frame. ResetColor would fall back
        // to the terminal default and show line artifacts.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }
}

impl Surface for Renderer {
    fn clear(&mut self) {
        self.front.clear();
    }

    fn fill_rect(&mut self, rect: Rect, paint: Paint) {
        let (ch, fg, bg) = style(paint);
        let (cols, rows) = self.view.span(rect);
        for row in rows {
            for col in cols.clone() {
                self.front.set(col, row, Cell::new(ch, fg, bg));
            }
        }
    }

    fn fill_disc(&mut self, center: Vec2, radius: f32, paint: Paint) {
        let (ch, fg, bg) = style(paint);
        let (cols, rows) = self.view.span(Rect::around(center, radius));
        let mut painted = false;
        for row in rows {
            for col in cols.clone() {
                if self.view.cell_center(col, row).distance(center) <= radius {
                    self.front.set(col, row, Cell::new(ch, fg, bg));
                    painted = true;
                }
            }
        }
        // Smaller than a cell: still show it.
        if !painted {
            if let Some((col, row)) = self.view.cell_of(center) {
                self.front.set(col, row, Cell::new(ch, fg, bg));
            }
        }
    }

    fn text(&mut self, slot: TextSlot, text: &str) {
        match slot {
            TextSlot::Hud => {
                self.front.fill_row(0, HUD_BG);
                self.front.put_str(1, 0, text, Color::White, HUD_BG);
            }
            TextSlot::Heading => {
                let row = self.heading_row();
                self.front.put_centered(row, text, HEADING_FG, Color::Reset);
            }
            TextSlot::Line(n) => {
                let row = self.heading_row() + 2 + n as usize;
                self.front.put_centered(row, text, Color::White, Color::Reset);
            }
            TextSlot::Hint => {
                let row = self.hint_row();
                self.front.put_str(1, row, text, Color::DarkGrey, Color::Reset);
            }
        }
    }

    fn dialogue(&mut self, text: &str, opacity: f32) {
        if opacity <= 0.0 { return; }
        let width = self.term_w.saturating_sub(8).max(10);
        let lines = wrap(text, width);
        let top = self.hint_row().saturating_sub(DIALOGUE_ROWS + 1);
        let fg = faded(opacity);
        for (i, line) in lines.iter().take(DIALOGUE_ROWS).enumerate() {
            self.front.put_centered(top + i, line, fg, Color::Reset);
        }
    }

    fn fog(&mut self, center: Vec2, radius: f32) {
        for row in MAP_ROW..MAP_ROW + self.view.rows {
            for col in 0..self.view.cols {
                if self.view.cell_center(col, row).distance(center) > radius {
                    self.front.set(col, row, Cell::FOGGED);
                }
            }
        }
    }
}

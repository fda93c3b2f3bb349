/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// World units map to terminal cells at `UNIT_X` × `UNIT_Y` per cell, so
/// a 16×16 tile is two columns by one row. The viewport is clipped to
/// whatever the terminal can show.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::Lifecycle;
use crate::domain::geom::Rect;
use crate::domain::tile::SolidKind;
use crate::sim::session::{Phase, Session};
use crate::sim::world::Camera;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit background for every "empty" terminal cell, so the gap
    /// between rows matches the cells on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    /// Normalize bg: Color::Reset → BASE_BG so that every cell gets an
    /// explicit background color (never terminal-default).
    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg: Self::norm_bg(bg) }
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
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
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

    /// Write a string at (x, y) with given colors. Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    /// Horizontally centered string.
    fn put_centered(&mut self, y: usize, s: &str, fg: Color) {
        let x = self.width.saturating_sub(s.chars().count()) / 2;
        self.put_str(x, y, s, fg, Color::Reset);
    }
}

// ── Renderer ──

/// World units per terminal column / row.
const UNIT_X: f32 = 8.0;
const UNIT_Y: f32 = 16.0;

/// Vertical offsets
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 1;

const SKY: Color = Color::Rgb { r: 92, g: 148, b: 252 };
const EARTH: Color = Color::Rgb { r: 222, g: 160, b: 92 };
const BRICK: Color = Color::Rgb { r: 180, g: 80, b: 40 };
const PIPE: Color = Color::Rgb { r: 40, g: 180, b: 60 };
const GOLD: Color = Color::Rgb { r: 255, g: 200, b: 50 };
const USED: Color = Color::Rgb { r: 150, g: 150, b: 150 };
const GOOMBA: Color = Color::Rgb { r: 140, g: 80, b: 30 };
const HERO: Color = Color::Rgb { r: 220, g: 30, b: 30 };

/// Cell span `[col0, col1) × [row0, row1)` covered by a world rect, with
/// the map origin at (0, 0). Edges round to the nearest cell boundary and
/// every rect covers at least one cell. May be negative or off screen.
fn cell_span(r: &Rect, cam: &Camera) -> (i32, i32, i32, i32) {
    let col0 = (cam.to_view(r.left()) / UNIT_X).round() as i32;
    let col1 = (cam.to_view(r.right()) / UNIT_X).round() as i32;
    let row0 = (r.top() / UNIT_Y).round() as i32;
    let row1 = (r.bottom() / UNIT_Y).round() as i32;
    (col0, col1.max(col0 + 1), row0, row1.max(row0 + 1))
}

/// Visible map area in cells. `row_off` is the first world row shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct MapView {
    cols: usize,
    rows: usize,
    row_off: i32,
}

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    /// Terminal reports key release events.
    enhanced_keys: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            enhanced_keys: false,
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

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.enhanced_keys = true;
        }
        log::info!("terminal ready, key release events: {}", self.enhanced_keys);

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    /// Whether held keys can be tracked by release events instead of timeout.
    pub fn reports_key_release(&self) -> bool {
        self.enhanced_keys
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced_keys {
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

    pub fn render(&mut self, session: &Session) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            // Force full repaint after resize.
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Detect phase change → clear for clean transition
        if self.last_phase != Some(session.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(session.phase);
        }

        // Build front buffer
        self.front.clear();

        match session.phase {
            Phase::Menu => self.compose_menu(),
            Phase::Howto => self.compose_howto(),
            Phase::Playing => self.compose_game(session),
            Phase::Dead => {
                self.compose_game(session);
                self.compose_banner("YOU DIED  -  Press ENTER", HERO);
            }
            Phase::LevelComplete => {
                self.compose_game(session);
                self.compose_banner("COURSE CLEAR!  -  Press ENTER", GOLD);
            }
        }

        // Diff and emit
        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Set explicit base colors at start of frame.
        // Do NOT use ResetColor here: it resets to the terminal's native
        // default, which may differ from BASE_BG and leave line artifacts.
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

                // Position cursor if needed
                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                // Set colors only if changed
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

    // ── Compose: build front buffer content ──

    /// Which part of the world the map area shows. The bottom of the
    /// world stays on the bottom terminal row; a short terminal loses
    /// rows off the top.
    fn map_view(&self, s: &Session) -> MapView {
        let needed = (s.camera.view_h / UNIT_Y).ceil() as usize;
        let available = self.front.height.saturating_sub(MAP_ROW);
        MapView {
            cols: ((s.camera.view_w / UNIT_X) as usize).min(self.front.width),
            rows: needed.min(available),
            row_off: needed.saturating_sub(available) as i32,
        }
    }

    fn compose_game(&mut self, s: &Session) {
        let view = self.map_view(s);
        let cam = &s.camera;

        // ── HUD row ──
        let hearts: String = "♥".repeat(s.player.health as usize);
        let hud = format!(
            " ULTRA BROS   WORLD {}   SCORE {:06}   TIME {:03}   {}",
            s.level.name, s.score, s.countdown.remaining(), hearts,
        );
        for x in 0..self.front.width {
            self.front.set(x, HUD_ROW, Cell::new(' ', Color::White, Color::Black));
        }
        self.front.put_str(0, HUD_ROW, &hud, Color::White, Color::Black);

        // ── Sky ──
        for row in 0..view.rows {
            for col in 0..view.cols {
                self.front.set(col, MAP_ROW + row, Cell::new(' ', Color::White, SKY));
            }
        }

        // ── Solids ──
        for solid in s.level.solids.iter().filter(|sd| s.camera.sees(&sd.rect)) {
            let (ch, fg, bg) = match solid.kind {
                SolidKind::Ground => ('▓', BRICK, EARTH),
                SolidKind::Stair => ('▒', BRICK, EARTH),
                SolidKind::Pipe => ('│', Color::Black, PIPE),
                SolidKind::Block(b) => match b.used() {
                    None => ('#', Color::Black, BRICK),
                    Some(false) => ('?', Color::Black, GOLD),
                    Some(true) => ('■', Color::DarkGrey, USED),
                },
            };
            let mut r = solid.rect;
            // A bump is smaller than a cell: show it as a whole row.
            if solid.block().is_some_and(|b| b.bump_offset() < 0.0) {
                r.y -= UNIT_Y;
            }
            self.fill(&r, cam, &view, Cell::new(ch, fg, bg));
        }

        // ── Coins ──
        for coin in s.level.coins.iter().filter(|c| s.camera.sees(c)) {
            self.fill(coin, cam, &view, Cell::new('o', GOLD, SKY));
        }

        // ── Goal ──
        if let Some(goal) = s.level.goal.filter(|g| s.camera.sees(g)) {
            self.fill(&goal, cam, &view, Cell::new('│', Color::White, SKY));
            let (col, _, row, _) = cell_span(&goal, cam);
            self.plot(col, row, &view, Cell::new('▶', PIPE, SKY));
        }

        // ── Enemies ──
        for e in s.level.enemies.iter().filter(|e| s.camera.sees(&e.rect)) {
            let (col, _, row, _) = cell_span(&e.rect, cam);
            let glyphs = match e.lifecycle {
                Lifecycle::Alive => ['◖', '◗'],
                Lifecycle::Squashed { .. } => ['▁', '▁'],
                Lifecycle::Removed => continue,
            };
            for (i, ch) in glyphs.into_iter().enumerate() {
                self.plot(col + i as i32, row, &view, Cell::new(ch, GOOMBA, SKY));
            }
        }

        // ── Player ──
        if !s.player.flicker() {
            let (col, _, row, _) = cell_span(&s.player.rect, cam);
            self.plot(col, row, &view, Cell::new('◢', HERO, SKY));
            self.plot(col + 1, row, &view, Cell::new('◣', HERO, SKY));
        }
    }

    /// Set one map cell given its world-aligned row, clipped to the map area.
    fn plot(&mut self, col: i32, row: i32, view: &MapView, cell: Cell) {
        let row = row - view.row_off;
        if col < 0 || row < 0 { return; }
        let (c, r) = (col as usize, row as usize);
        if c < view.cols && r < view.rows {
            self.front.set(c, MAP_ROW + r, cell);
        }
    }

    fn fill(&mut self, rect: &Rect, cam: &Camera, view: &MapView, cell: Cell) {
        let (c0, c1, r0, r1) = cell_span(rect, cam);
        for row in r0.max(view.row_off)..r1.min(view.row_off + view.rows as i32) {
            for col in c0.max(0)..c1.min(view.cols as i32) {
                self.plot(col, row, view, cell);
            }
        }
    }

    fn compose_banner(&mut self, text: &str, fg: Color) {
        let y = MAP_ROW + self.front.height.saturating_sub(MAP_ROW) / 3;
        let pad = format!("  {text}  ");
        self.front.put_centered(y, &pad, fg);
    }

    fn compose_menu(&mut self) {
        let title = [
            r" _   _ _ _               ___              ",
            r"| | | | | |_ _ _ __ _   | _ )_ _ ___ ___  ",
            r"| |_| | |  _| '_/ _` |  | _ \ '_/ _ (_-<  ",
            r" \___/|_|\__|_| \__,_|  |___/_| \___/__/  ",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_centered(2 + i, line, GOLD);
        }
        self.front.put_centered(8, "━━━ Terminal Edition ━━━", BRICK);
        self.front.put_centered(12, "Press ENTER to Start", Color::White);
        self.front.put_centered(14, "Press H for How To Play", Color::White);
        self.front.put_centered(16, "ESC / Q  Quit", Color::DarkGrey);
    }

    fn compose_howto(&mut self) {
        let lines = [
            ("HOW TO PLAY", GOLD),
            ("---------------------------", Color::DarkGrey),
            ("←→ / A D     Move left/right", Color::White),
            ("SPACE / ↑ / Z  Jump", Color::White),
            ("Land on enemies to stomp them", Color::White),
            ("Bump blocks from below", Color::White),
            ("Reach the flag before time runs out", Color::White),
            ("", Color::White),
            ("R        Reset level", Color::White),
            ("ESC      Back to Menu", Color::White),
            ("Q        Quit", Color::White),
            ("ENTER    Back to Menu", PIPE),
        ];
        for (i, (text, fg)) in lines.iter().enumerate() {
            self.front.put_centered(3 + i * 2, text, *fg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Tuning;
    use crate::domain::entity::Command;
    use crate::sim::level::world_1_1;

    fn cam(x: f32) -> Camera {
        Camera { x, ..Camera::new(800.0, 600.0) }
    }

    #[test]
    fn tile_spans_two_columns_one_row() {
        let r = Rect::new(32.0, 552.0, 16.0, 16.0);
        assert_eq!(cell_span(&r, &cam(0.0)), (4, 6, 35, 36));
    }

    #[test]
    fn span_follows_camera() {
        let r = Rect::new(832.0, 0.0, 16.0, 16.0);
        assert_eq!(cell_span(&r, &cam(800.0)), (4, 6, 0, 1));
    }

    #[test]
    fn thin_rect_still_covers_a_cell() {
        let goal = Rect::new(3744.0, 408.0, 3.0, 160.0);
        let (c0, c1, r0, r1) = cell_span(&goal, &cam(3040.0));
        assert_eq!((c0, c1), (88, 89));
        assert_eq!((r0, r1), (26, 36));
    }

    #[test]
    fn ground_run_sits_under_standing_actor() {
        let ground = Rect::new(0.0, 568.0, 640.0, 32.0);
        assert_eq!(cell_span(&ground, &cam(0.0)), (0, 80, 36, 38));
    }

    #[test]
    fn put_str_clips_at_edge() {
        let mut fb = FrameBuffer::new(4, 1);
        fb.put_str(2, 0, "abcd", Color::White, Color::Reset);
        assert_eq!(fb.get(3, 0).ch, 'b');
        assert_eq!(fb.get(1, 0), Cell::BLANK);
    }

    fn playing_on(w: usize, h: usize) -> (Renderer, Session) {
        let mut r = Renderer::new();
        r.front.resize(w, h);
        let mut s = Session::new(world_1_1(), Tuning::default());
        s.apply(Command::Confirm);
        (r, s)
    }

    fn row_text(fb: &FrameBuffer, y: usize) -> String {
        (0..fb.width).map(|x| fb.get(x, y).ch).collect()
    }

    #[test]
    fn short_terminal_keeps_floor_on_bottom_row() {
        let (mut r, s) = playing_on(80, 24);
        assert_eq!(r.map_view(&s), MapView { cols: 80, rows: 23, row_off: 15 });
        r.compose_game(&s);
        assert!(row_text(&r.front, 23).contains('▓'));
        // Player stands on the floor: world row 35, screen row 35 - 15 + 1.
        assert_eq!(r.front.get(4, 21).ch, '◢');
        assert_eq!(r.front.get(5, 21).ch, '◣');
    }

    #[test]
    fn tall_terminal_shows_whole_world_from_the_top() {
        let (mut r, s) = playing_on(120, 50);
        assert_eq!(r.map_view(&s), MapView { cols: 100, rows: 38, row_off: 0 });
        r.compose_game(&s);
        assert_eq!(r.front.get(4, 36).ch, '◢');
        assert!(row_text(&r.front, 38).contains('▓'));
    }

    #[test]
    fn hud_shows_score() {
        let (mut r, mut s) = playing_on(80, 24);
        s.score = 1200;
        r.compose_game(&s);
        assert!(row_text(&r.front, HUD_ROW).contains("SCORE 001200"));
    }
}

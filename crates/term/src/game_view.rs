//! GameView: maps a [`GameSnapshot`] into a terminal framebuffer.
//!
//! This module is pure (no I/O). It can be unit-tested.

use crate::core::shape::get_shape;
use crate::core::GameSnapshot;
use crate::fb::{CellStyle, FrameBuffer, Rgb};
use crate::types::{PieceKind, Pos, Rotation, BOARD_HEIGHT, BOARD_WIDTH};

const PLAY_BG: Rgb = Rgb::new(30, 30, 40);
const BLOCK: char = '█';

/// Terminal viewport dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorY {
    Center,
    Top,
}

/// Colour of a piece kind.
pub fn piece_color(kind: PieceKind) -> Rgb {
    match kind {
        PieceKind::Square => Rgb::new(240, 220, 80),
        PieceKind::Line => Rgb::new(80, 220, 220),
        PieceKind::J => Rgb::new(80, 120, 220),
        PieceKind::L => Rgb::new(255, 165, 0),
        PieceKind::S => Rgb::new(100, 220, 120),
        PieceKind::Z => Rgb::new(220, 80, 80),
        PieceKind::T => Rgb::new(200, 120, 220),
    }
}

/// Board, side panel and overlays for one snapshot.
#[derive(Debug, Clone)]
pub struct GameView {
    /// Board cell width in terminal columns.
    cell_w: u16,
    /// Board cell height in terminal rows.
    cell_h: u16,
    anchor_y: AnchorY,
}

impl Default for GameView {
    fn default() -> Self {
        // 2x1 compensates for the usual terminal glyph aspect ratio.
        Self::new(2, 1)
    }
}

/// Top-left corner of the board frame.
#[derive(Debug, Clone, Copy)]
struct Origin {
    x: u16,
    y: u16,
}

impl GameView {
    pub fn new(cell_w: u16, cell_h: u16) -> Self {
        Self {
            cell_w,
            cell_h,
            anchor_y: AnchorY::Center,
        }
    }

    pub fn with_anchor_y(mut self, anchor_y: AnchorY) -> Self {
        self.anchor_y = anchor_y;
        self
    }

    /// Framebuffer columns and rows the board frame occupies.
    pub fn frame_size(&self) -> (u16, u16) {
        (
            BOARD_WIDTH as u16 * self.cell_w + 2,
            BOARD_HEIGHT as u16 * self.cell_h + 2,
        )
    }

    /// Render into an existing framebuffer, resizing it to the viewport.
    pub fn render_into(&self, snap: &GameSnapshot, viewport: Viewport, fb: &mut FrameBuffer) {
        fb.resize(viewport.width, viewport.height);
        fb.clear(CellStyle::default().cell(' '));

        let (frame_w, frame_h) = self.frame_size();
        let origin = Origin {
            x: viewport.width.saturating_sub(frame_w) / 2,
            y: match self.anchor_y {
                AnchorY::Center => viewport.height.saturating_sub(frame_h) / 2,
                AnchorY::Top => 0,
            },
        };

        let border = CellStyle::new(Rgb::new(200, 200, 200), Rgb::new(0, 0, 0));
        draw_border(fb, origin.x, origin.y, frame_w, frame_h, border);

        let empty = CellStyle::new(Rgb::new(90, 90, 100), PLAY_BG).dim();
        for (y, row) in snap.board.iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                let pos = Pos::new(x as i8, y as i8);
                match cell {
                    Some(kind) => self.draw_block(fb, origin, pos, *kind),
                    None => self.fill_board_cell(fb, origin, pos, '·', empty),
                }
            }
        }

        if let Some(ghost) = snap.ghost {
            let style = CellStyle::new(Rgb::new(140, 140, 140), PLAY_BG).dim();
            for pos in ghost {
                self.fill_board_cell(fb, origin, pos, '░', style);
            }
        }

        if let Some(active) = snap.active {
            for pos in active.cells {
                self.draw_block(fb, origin, pos, active.kind);
            }
        }

        self.draw_side_panel(fb, snap, viewport, origin, frame_w);

        if snap.paused() {
            draw_overlay(fb, origin, frame_w, frame_h, "PAUSED", Some("P to resume"));
        } else if snap.game_over() {
            draw_overlay(fb, origin, frame_w, frame_h, "GAME OVER", Some("Enter: new game"));
        }
    }

    /// Convenience helper that allocates a new framebuffer.
    pub fn render(&self, snap: &GameSnapshot, viewport: Viewport) -> FrameBuffer {
        let mut fb = FrameBuffer::new(viewport.width, viewport.height);
        self.render_into(snap, viewport, &mut fb);
        fb
    }

    fn draw_block(&self, fb: &mut FrameBuffer, origin: Origin, pos: Pos, kind: PieceKind) {
        let style = CellStyle::new(piece_color(kind), PLAY_BG).bold();
        self.fill_board_cell(fb, origin, pos, BLOCK, style);
    }

    fn fill_board_cell(
        &self,
        fb: &mut FrameBuffer,
        origin: Origin,
        pos: Pos,
        ch: char,
        style: CellStyle,
    ) {
        if pos.x < 0 || pos.y < 0 || pos.x >= BOARD_WIDTH as i8 || pos.y >= BOARD_HEIGHT as i8 {
            return;
        }
        let px = origin.x + 1 + pos.x as u16 * self.cell_w;
        let py = origin.y + 1 + pos.y as u16 * self.cell_h;
        fb.fill_rect(px, py, self.cell_w, self.cell_h, ch, style);
    }

    fn draw_side_panel(
        &self,
        fb: &mut FrameBuffer,
        snap: &GameSnapshot,
        viewport: Viewport,
        origin: Origin,
        frame_w: u16,
    ) {
        let panel_x = origin.x.saturating_add(frame_w).saturating_add(2);
        if panel_x >= viewport.width || viewport.width - panel_x < 10 {
            return;
        }

        let label = CellStyle::default().bold();
        let value = CellStyle::new(Rgb::new(200, 200, 200), Rgb::new(0, 0, 0));

        let mut y = origin.y;
        for (name, number) in [
            ("SCORE", snap.score),
            ("LEVEL", snap.level as u32),
            ("LINES", snap.lines_cleared as u32),
        ] {
            fb.put_str(panel_x, y, name, label);
            fb.put_u32(panel_x, y.saturating_add(1), number, value);
            y = y.saturating_add(3);
        }

        fb.put_str(panel_x, y, "NEXT", label);
        self.draw_preview(fb, panel_x, y.saturating_add(2), snap.next_kind);
    }

    /// The next piece in spawn orientation, in a 4x2 cell box.
    fn draw_preview(&self, fb: &mut FrameBuffer, x: u16, y: u16, kind: PieceKind) {
        let style = CellStyle::new(piece_color(kind), Rgb::new(0, 0, 0)).bold();
        let shape = get_shape(kind, Rotation::North);
        let min_x = shape.iter().map(|&(dx, _)| dx).min().unwrap_or(0);
        let min_y = shape.iter().map(|&(_, dy)| dy).min().unwrap_or(0);
        for (dx, dy) in shape {
            let px = x + (dx - min_x) as u16 * self.cell_w;
            let py = y + (dy - min_y) as u16 * self.cell_h;
            fb.fill_rect(px, py, self.cell_w, self.cell_h, BLOCK, style);
        }
    }
}

fn draw_border(fb: &mut FrameBuffer, x: u16, y: u16, w: u16, h: u16, style: CellStyle) {
    if w < 2 || h < 2 {
        return;
    }

    fb.put_char(x, y, '┌', style);
    fb.put_char(x + w - 1, y, '┐', style);
    fb.put_char(x, y + h - 1, '└', style);
    fb.put_char(x + w - 1, y + h - 1, '┘', style);

    for dx in 1..w - 1 {
        fb.put_char(x + dx, y, '─', style);
        fb.put_char(x + dx, y + h - 1, '─', style);
    }
    for dy in 1..h - 1 {
        fb.put_char(x, y + dy, '│', style);
        fb.put_char(x + w - 1, y + dy, '│', style);
    }
}

fn draw_overlay(
    fb: &mut FrameBuffer,
    origin: Origin,
    frame_w: u16,
    frame_h: u16,
    title: &str,
    hint: Option<&str>,
) {
    let style = CellStyle::new(Rgb::new(255, 255, 255), Rgb::new(0, 0, 0)).bold();
    let mid_y = origin.y.saturating_add(frame_h / 2);
    let centered = |text: &str| {
        let text_w = text.chars().count() as u16;
        origin.x.saturating_add(frame_w.saturating_sub(text_w) / 2)
    };
    fb.put_str(centered(title), mid_y, title, style);
    if let Some(hint) = hint {
        fb.put_str(centered(hint), mid_y.saturating_add(1), hint, style.dim());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ActiveSnapshot;
    use crate::types::GameStatus;

    fn count_char(fb: &FrameBuffer, ch: char) -> usize {
        fb.cells().iter().filter(|c| c.ch == ch).count()
    }

    #[test]
    fn empty_board_has_only_grid_dots() {
        let view = GameView::default().with_anchor_y(AnchorY::Top);
        let fb = view.render(&GameSnapshot::default(), Viewport::new(22, 22));
        assert_eq!(count_char(&fb, '·'), 200 * 2);
        assert_eq!(fb.get(0, 0).map(|c| c.ch), Some('┌'));
        assert_eq!(fb.get(21, 21).map(|c| c.ch), Some('┘'));
    }

    #[test]
    fn active_piece_and_ghost_are_drawn() {
        let mut snap = GameSnapshot::default();
        let cells = [Pos::new(4, 0), Pos::new(2, 0), Pos::new(3, 0), Pos::new(5, 0)];
        snap.active = Some(ActiveSnapshot {
            kind: PieceKind::Line,
            rotation: Rotation::North,
            cells,
        });
        snap.ghost = Some(cells.map(|p| p.offset(0, 19)));

        let view = GameView::default().with_anchor_y(AnchorY::Top);
        let fb = view.render(&snap, Viewport::new(22, 22));
        assert_eq!(count_char(&fb, BLOCK), 8);
        assert_eq!(count_char(&fb, '░'), 8);
        // Column 2 of row 0 starts at x = 1 + 2 * 2.
        assert_eq!(fb.get(5, 1).map(|c| c.ch), Some(BLOCK));
        assert_eq!(fb.get(5, 20).map(|c| c.ch), Some('░'));
    }

    #[test]
    fn overlays_follow_status() {
        let view = GameView::default();
        let mut snap = GameSnapshot {
            status: GameStatus::Paused,
            ..GameSnapshot::default()
        };
        let fb = view.render(&snap, Viewport::new(60, 24));
        assert!((0..fb.height()).any(|y| fb.row_string(y).contains("PAUSED")));

        snap.status = GameStatus::Lost;
        let fb = view.render(&snap, Viewport::new(60, 24));
        assert!((0..fb.height()).any(|y| fb.row_string(y).contains("GAME OVER")));
    }

    #[test]
    fn side_panel_shows_counters() {
        let snap = GameSnapshot {
            score: 4321,
            level: 3,
            lines_cleared: 27,
            ..GameSnapshot::default()
        };
        let fb = GameView::default().render(&snap, Viewport::new(60, 24));
        let text: String = (0..fb.height()).map(|y| fb.row_string(y) + "\n").collect();
        assert!(text.contains("SCORE"));
        assert!(text.contains("4321"));
        assert!(text.contains("27"));
        assert!(text.contains("NEXT"));
    }

    #[test]
    fn tiny_viewport_does_not_panic() {
        let fb = GameView::default().render(&GameSnapshot::default(), Viewport::new(3, 2));
        assert_eq!(fb.cells().len(), 6);
    }
}

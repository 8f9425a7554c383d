//! Game session - the gravity and lock state machine
//!
//! A [`GameSession`] owns the board, the active piece and every counter. It
//! never sleeps or reads a clock. Each call runs to completion and returns an
//! [`Outcome`] that says what changed and which timers the caller must arm or
//! cancel. When a requested timer fires, the caller hands it back through
//! [`GameSession::fire`]; timers whose token is no longer current are ignored.
//!
//! # Lock delay
//!
//! When gravity finds the piece resting on something, a 500ms lock delay is
//! armed. Every accepted move or rotation while it is pending re-arms it,
//! at most 15 times per resting period. On expiry the piece locks unless it
//! can fall again, in which case falling simply resumes.

use arrayvec::ArrayVec;
use tracing::{debug, info, trace};

use crate::board::Board;
use crate::config::EngineConfig;
use crate::piece::{max_drop, ActivePiece};
use crate::rng::SimpleRng;
use crate::rotation::{try_rotate, RotationResult};
use crate::scoring::{apply_clear, gravity_interval_ms};
use crate::snapshot::{ActiveSnapshot, GameSnapshot};
use crate::types::{
    Command, Direction, GameStatus, PieceKind, Pos, Shift, Spin, AUTO_REPEAT_MS, LOCK_DELAY_MS,
    LOCK_RESET_LIMIT, MIN_LEVEL,
};

/// The three wakeups a session can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    Gravity,
    LockDelay,
    AutoRepeat,
}

impl TimerKind {
    pub const ALL: [TimerKind; 3] = [TimerKind::Gravity, TimerKind::LockDelay, TimerKind::AutoRepeat];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Opaque handle identifying one arming of a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(pub u32);

/// A timer delivered back to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timer {
    pub kind: TimerKind,
    pub token: TimerToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerRequest {
    /// Fire `Timer { kind, token }` after `after_ms`, replacing any pending timer of that kind.
    Arm {
        kind: TimerKind,
        token: TimerToken,
        after_ms: u32,
    },
    Cancel(TimerKind),
}

impl TimerRequest {
    pub fn kind(&self) -> TimerKind {
        match *self {
            TimerRequest::Arm { kind, .. } => kind,
            TimerRequest::Cancel(kind) => kind,
        }
    }
}

/// Which parts of the session a call touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Changed {
    pub board: bool,
    pub piece: bool,
    pub stats: bool,
    pub status: bool,
}

impl Changed {
    pub fn any(&self) -> bool {
        self.board || self.piece || self.stats || self.status
    }

    pub fn merge(&mut self, other: Changed) {
        self.board |= other.board;
        self.piece |= other.piece;
        self.stats |= other.stats;
        self.status |= other.status;
    }
}

/// Reported once per lock, and once when a new piece cannot spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LockEvent {
    pub lines_cleared: u8,
    pub score_delta: u32,
    pub leveled_up: bool,
    /// The game is lost.
    pub topped_out: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Outcome {
    pub changed: Changed,
    /// At most one request per [`TimerKind`]; a later request for a kind replaces an earlier one.
    pub timers: ArrayVec<TimerRequest, 3>,
    pub event: Option<LockEvent>,
}

impl Outcome {
    fn push_timer(&mut self, request: TimerRequest) {
        let kind = request.kind();
        self.timers.retain(|r| r.kind() != kind);
        self.timers.push(request);
    }

    fn arm(&mut self, kind: TimerKind, token: TimerToken, after_ms: u32) {
        self.push_timer(TimerRequest::Arm {
            kind,
            token,
            after_ms,
        });
    }

    fn cancel(&mut self, kind: TimerKind) {
        self.push_timer(TimerRequest::Cancel(kind));
    }

    /// The request for `kind`, if any.
    pub fn timer(&self, kind: TimerKind) -> Option<TimerRequest> {
        self.timers.iter().copied().find(|r| r.kind() == kind)
    }

    /// Fold a later outcome into this one.
    pub fn merge(&mut self, other: Outcome) {
        self.changed.merge(other.changed);
        for request in other.timers {
            self.push_timer(request);
        }
        if other.event.is_some() {
            self.event = other.event;
        }
    }
}

/// Bookkeeping while the active piece rests on an obstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockDelayState {
    pub remaining_resets: u8,
    pub token: TimerToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AutoRepeat {
    direction: Direction,
    token: TimerToken,
}

/// One game, from first spawn to loss
#[derive(Debug, Clone)]
pub struct GameSession {
    pub(crate) board: Board,
    pub(crate) active: Option<ActivePiece>,
    pub(crate) next_kind: PieceKind,
    pub(crate) score: u32,
    pub(crate) lines_cleared: u16,
    pub(crate) level: u8,
    pub(crate) status: GameStatus,
    pub(crate) lock_delay: Option<LockDelayState>,
    gravity_interval_ms: u32,
    gravity_token: Option<TimerToken>,
    repeat: Option<AutoRepeat>,
    next_token: u32,
    paused_by_focus: bool,
    rng: SimpleRng,
    config: EngineConfig,
}

impl GameSession {
    /// Fresh game with the first piece already spawned
    ///
    /// No timer is armed; use [`GameSession::start`] to get the initial
    /// gravity request as well.
    pub fn new(seed: u32, config: EngineConfig) -> Self {
        let mut rng = SimpleRng::new(seed);
        let next_kind = rng.next_kind();
        let mut session = Self {
            board: Board::new(),
            active: None,
            next_kind,
            score: 0,
            lines_cleared: 0,
            level: MIN_LEVEL,
            status: GameStatus::Playing,
            lock_delay: None,
            gravity_interval_ms: gravity_interval_ms(MIN_LEVEL),
            gravity_token: None,
            repeat: None,
            next_token: 0,
            paused_by_focus: false,
            rng,
            config,
        };
        let mut ignored = Outcome::default();
        session.spawn_next(&mut ignored);
        session
    }

    /// Fresh game plus the timer requests that set it running.
    pub fn start(seed: u32, config: EngineConfig) -> (Self, Outcome) {
        let mut session = Self::new(seed, config);
        info!(seed, "new game");
        let mut out = Outcome::default();
        out.changed = Changed {
            board: true,
            piece: true,
            stats: true,
            status: true,
        };
        session.arm_gravity(&mut out);
        (session, out)
    }

    /// Session assembled from restored parts, not yet running.
    pub(crate) fn restored(
        board: Board,
        active: Option<ActivePiece>,
        next_kind: PieceKind,
        counters: (u32, u16, u8),
        seed: u32,
        config: EngineConfig,
    ) -> Self {
        let (score, lines_cleared, level) = counters;
        Self {
            board,
            active,
            next_kind,
            score,
            lines_cleared,
            level,
            status: GameStatus::Playing,
            lock_delay: None,
            gravity_interval_ms: gravity_interval_ms(level),
            gravity_token: None,
            repeat: None,
            next_token: 0,
            paused_by_focus: false,
            rng: SimpleRng::new(seed),
            config,
        }
    }

    // ---- accessors ----

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn active(&self) -> Option<ActivePiece> {
        self.active
    }

    pub fn next_kind(&self) -> PieceKind {
        self.next_kind
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lines_cleared(&self) -> u16 {
        self.lines_cleared
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn lock_delay(&self) -> Option<LockDelayState> {
        self.lock_delay
    }

    pub fn gravity_interval_ms(&self) -> u32 {
        self.gravity_interval_ms
    }

    pub fn held_direction(&self) -> Option<Direction> {
        self.repeat.map(|r| r.direction)
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    pub fn set_config(&mut self, config: EngineConfig) {
        self.config = config;
    }

    /// Token the session currently expects for `kind`, if that timer is armed.
    pub fn current_token(&self, kind: TimerKind) -> Option<TimerToken> {
        if self.status != GameStatus::Playing {
            return None;
        }
        match kind {
            TimerKind::Gravity => self.gravity_token,
            TimerKind::LockDelay => self.lock_delay.map(|l| l.token),
            TimerKind::AutoRepeat => self.repeat.map(|r| r.token),
        }
    }

    /// Landing cells of the active piece, when the drop shadow is enabled.
    pub fn ghost_cells(&self) -> Option<[Pos; 4]> {
        if !self.config.drop_shadow {
            return None;
        }
        let piece = self.active?;
        let drop = max_drop(&piece, &self.board);
        Some(piece.translated(0, drop as i8))
    }

    pub fn snapshot_into(&self, out: &mut GameSnapshot) {
        for (dst, src) in out.board.iter_mut().zip(self.board.rows()) {
            dst.copy_from_slice(src);
        }
        out.active = self.active.map(ActiveSnapshot::from);
        out.ghost = self.ghost_cells();
        out.next_kind = self.next_kind;
        out.score = self.score;
        out.level = self.level;
        out.lines_cleared = self.lines_cleared;
        out.status = self.status;
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let mut s = GameSnapshot::default();
        self.snapshot_into(&mut s);
        s
    }

    // ---- timers ----

    /// Deliver a fired timer. Stale tokens are ignored.
    pub fn fire(&mut self, timer: Timer) -> Outcome {
        if self.current_token(timer.kind) != Some(timer.token) {
            trace!(?timer, "ignoring stale timer");
            return Outcome::default();
        }
        match timer.kind {
            TimerKind::Gravity => {
                self.gravity_token = None;
                self.gravity_tick()
            }
            TimerKind::LockDelay => self.lock_delay_expired(),
            TimerKind::AutoRepeat => self.auto_repeat_tick(),
        }
    }

    /// One gravity step, then gravity is re-armed at the current interval.
    pub fn gravity_tick(&mut self) -> Outcome {
        let mut out = Outcome::default();
        if self.status != GameStatus::Playing {
            return out;
        }

        match self.active {
            None => self.spawn_next(&mut out),
            Some(piece) if piece.can_drop(&self.board) => {
                self.drop_one(&mut out);
            }
            Some(_) => {
                if self.lock_delay.is_none() {
                    let token = self.issue_token();
                    self.lock_delay = Some(LockDelayState {
                        remaining_resets: LOCK_RESET_LIMIT,
                        token,
                    });
                    out.arm(TimerKind::LockDelay, token, LOCK_DELAY_MS);
                    trace!("piece resting, lock delay armed");
                }
            }
        }

        if self.status == GameStatus::Playing {
            self.arm_gravity(&mut out);
        }
        out
    }

    /// The lock delay ran out.
    pub fn lock_delay_expired(&mut self) -> Outcome {
        let mut out = Outcome::default();
        if self.status != GameStatus::Playing || self.lock_delay.take().is_none() {
            return out;
        }
        self.lock(&mut out);
        out
    }

    /// Repeat the held move and re-arm.
    pub fn auto_repeat_tick(&mut self) -> Outcome {
        let mut out = Outcome::default();
        if self.status != GameStatus::Playing {
            return out;
        }
        let Some(repeat) = self.repeat else {
            return out;
        };
        self.step(repeat.direction, &mut out);
        self.arm_repeat(repeat.direction, &mut out);
        out
    }

    // ---- commands ----

    pub fn move_piece(&mut self, shift: Shift) -> Outcome {
        let mut out = Outcome::default();
        if self.status == GameStatus::Playing {
            self.shift(shift.dx(), &mut out);
        }
        out
    }

    pub fn rotate(&mut self, spin: Spin) -> Outcome {
        let mut out = Outcome::default();
        if self.status != GameStatus::Playing {
            return out;
        }
        let Some(piece) = self.active else {
            return out;
        };
        match try_rotate(&piece, spin, &self.board) {
            RotationResult::Rotated { piece, kick_index } => {
                trace!(?spin, kick_index, "rotated");
                self.active = Some(piece);
                out.changed.piece = true;
                self.reset_lock_delay(&mut out);
            }
            RotationResult::Unchanged => {}
            RotationResult::Rejected => trace!(?spin, "rotation rejected"),
        }
        out
    }

    /// Rotate in the configured direction.
    pub fn rotate_pressed(&mut self) -> Outcome {
        let spin = if self.config.rotate_counterclockwise {
            Spin::Ccw
        } else {
            Spin::Cw
        };
        self.rotate(spin)
    }

    /// Move once now, then keep repeating every 200ms until stopped.
    pub fn soft_drop_start(&mut self, direction: Direction) -> Outcome {
        let mut out = Outcome::default();
        if self.status != GameStatus::Playing {
            return out;
        }
        self.step(direction, &mut out);
        self.arm_repeat(direction, &mut out);
        out
    }

    /// Stop repeating `direction`. Releasing a direction that is not held does nothing.
    pub fn soft_drop_stop(&mut self, direction: Direction) -> Outcome {
        let mut out = Outcome::default();
        if self.held_direction() == Some(direction) {
            self.repeat = None;
            out.cancel(TimerKind::AutoRepeat);
        }
        out
    }

    /// Drop to the landing position and lock at once.
    pub fn hard_drop(&mut self) -> Outcome {
        let mut out = Outcome::default();
        if self.status != GameStatus::Playing {
            return out;
        }
        let Some(mut piece) = self.active else {
            return out;
        };
        let distance = max_drop(&piece, &self.board);
        if distance > 0 {
            piece.shift_by(0, distance as i8);
            self.active = Some(piece);
            out.changed.piece = true;
        }
        self.lock(&mut out);
        out
    }

    pub fn pause(&mut self) -> Outcome {
        let mut out = Outcome::default();
        if self.status != GameStatus::Playing {
            return out;
        }
        self.status = GameStatus::Paused;
        self.paused_by_focus = false;
        self.gravity_token = None;
        self.repeat = None;
        for kind in TimerKind::ALL {
            out.cancel(kind);
        }
        out.changed.status = true;
        debug!("paused");
        out
    }

    /// Leave a pause. Gravity restarts at the full interval, as does a pending lock delay.
    pub fn resume(&mut self) -> Outcome {
        let mut out = Outcome::default();
        if self.status != GameStatus::Paused {
            return out;
        }
        self.status = GameStatus::Playing;
        self.paused_by_focus = false;
        self.arm_gravity(&mut out);
        if let Some(mut state) = self.lock_delay {
            state.token = self.issue_token();
            self.lock_delay = Some(state);
            out.arm(TimerKind::LockDelay, state.token, LOCK_DELAY_MS);
        }
        out.changed.status = true;
        debug!("resumed");
        out
    }

    pub fn toggle_pause(&mut self) -> Outcome {
        match self.status {
            GameStatus::Playing => self.pause(),
            GameStatus::Paused => self.resume(),
            GameStatus::Lost => Outcome::default(),
        }
    }

    /// The host lost focus: pause, remembering why.
    pub fn focus_lost(&mut self) -> Outcome {
        let out = self.pause();
        if self.status == GameStatus::Paused && out.changed.status {
            self.paused_by_focus = true;
        }
        out
    }

    /// The host regained focus: resume only a pause caused by losing it.
    pub fn focus_gained(&mut self) -> Outcome {
        if !self.paused_by_focus {
            return Outcome::default();
        }
        self.resume()
    }

    /// Leave the lost state with a new game.
    pub fn acknowledge_loss(&mut self) -> Outcome {
        if self.status != GameStatus::Lost {
            return Outcome::default();
        }
        self.new_game()
    }

    /// Discard the current game and start over with the same RNG stream and config.
    pub fn new_game(&mut self) -> Outcome {
        let mut out = Outcome::default();
        for kind in TimerKind::ALL {
            out.cancel(kind);
        }
        self.board.clear();
        self.active = None;
        self.next_kind = self.rng.next_kind();
        self.score = 0;
        self.lines_cleared = 0;
        self.level = MIN_LEVEL;
        self.status = GameStatus::Playing;
        self.lock_delay = None;
        self.gravity_interval_ms = gravity_interval_ms(MIN_LEVEL);
        self.gravity_token = None;
        self.repeat = None;
        self.paused_by_focus = false;
        self.spawn_next(&mut out);
        self.arm_gravity(&mut out);
        out.changed = Changed {
            board: true,
            piece: true,
            stats: true,
            status: true,
        };
        info!("new game");
        out
    }

    /// Dispatch an input command.
    pub fn apply(&mut self, command: Command) -> Outcome {
        match command {
            Command::MoveLeft => self.move_piece(Shift::Left),
            Command::MoveRight => self.move_piece(Shift::Right),
            Command::RotateCw => self.rotate(Spin::Cw),
            Command::RotateCcw => self.rotate(Spin::Ccw),
            Command::Rotate => self.rotate_pressed(),
            Command::HoldStart(direction) => self.soft_drop_start(direction),
            Command::HoldStop(direction) => self.soft_drop_stop(direction),
            Command::HardDrop => self.hard_drop(),
            Command::Pause => self.pause(),
            Command::Resume => self.resume(),
            Command::TogglePause => self.toggle_pause(),
            Command::FocusLost => self.focus_lost(),
            Command::FocusGained => self.focus_gained(),
            Command::AcknowledgeLoss => self.acknowledge_loss(),
            Command::NewGame => self.new_game(),
        }
    }

    // ---- internals ----

    fn issue_token(&mut self) -> TimerToken {
        self.next_token = self.next_token.wrapping_add(1);
        TimerToken(self.next_token)
    }

    pub(crate) fn arm_gravity(&mut self, out: &mut Outcome) {
        let token = self.issue_token();
        self.gravity_token = Some(token);
        out.arm(TimerKind::Gravity, token, self.gravity_interval_ms);
    }

    fn arm_repeat(&mut self, direction: Direction, out: &mut Outcome) {
        let token = self.issue_token();
        self.repeat = Some(AutoRepeat { direction, token });
        out.arm(TimerKind::AutoRepeat, token, AUTO_REPEAT_MS);
    }

    pub(crate) fn spawn_next(&mut self, out: &mut Outcome) {
        let kind = self.next_kind;
        self.next_kind = self.rng.next_kind();
        let piece = ActivePiece::spawn(kind);
        out.changed.piece = true;
        if !piece.fits(&self.board) {
            info!(?kind, "spawn blocked");
            out.event = Some(LockEvent {
                topped_out: true,
                ..LockEvent::default()
            });
            self.enter_lost(out);
            return;
        }
        trace!(kind = kind.letter(), next = self.next_kind.letter(), "spawned");
        self.active = Some(piece);
    }

    fn step(&mut self, direction: Direction, out: &mut Outcome) {
        match direction {
            Direction::Left => self.shift(-1, out),
            Direction::Right => self.shift(1, out),
            Direction::Down => {
                if self.active.is_some_and(|p| p.can_drop(&self.board)) {
                    self.drop_one(out);
                }
            }
        }
    }

    fn shift(&mut self, dx: i8, out: &mut Outcome) {
        let Some(piece) = self.active.as_mut() else {
            return;
        };
        let candidate = piece.translated(dx, 0);
        if !self.board.fits(&candidate) {
            return;
        }
        piece.cells = candidate;
        out.changed.piece = true;
        self.reset_lock_delay(out);
    }

    /// Move the piece down one row; the caller checked that it can drop.
    fn drop_one(&mut self, out: &mut Outcome) {
        if let Some(piece) = self.active.as_mut() {
            piece.shift_by(0, 1);
            out.changed.piece = true;
        }
        if self.lock_delay.take().is_some() {
            out.cancel(TimerKind::LockDelay);
        }
    }

    fn reset_lock_delay(&mut self, out: &mut Outcome) {
        let Some(mut state) = self.lock_delay else {
            return;
        };
        if state.remaining_resets == 0 {
            return;
        }
        state.remaining_resets -= 1;
        state.token = self.issue_token();
        self.lock_delay = Some(state);
        out.arm(TimerKind::LockDelay, state.token, LOCK_DELAY_MS);
    }

    /// Commit the active piece unless it can still fall.
    fn lock(&mut self, out: &mut Outcome) {
        let Some(piece) = self.active else {
            return;
        };
        if self.lock_delay.take().is_some() {
            out.cancel(TimerKind::LockDelay);
        }
        if piece.can_drop(&self.board) {
            debug!("lock aborted, piece can still fall");
            return;
        }

        self.board.lock(&piece.cells, piece.kind);
        self.active = None;
        let rows = self.board.clear_full_rows();
        let result = apply_clear(rows, self.lines_cleared, self.level, self.score);
        self.lines_cleared = result.lines_cleared;
        self.score = result.score;
        if result.leveled_up {
            self.level = result.level;
            self.gravity_interval_ms = gravity_interval_ms(self.level);
            info!(level = self.level, interval_ms = self.gravity_interval_ms, "level up");
        }

        let topped_out = piece.touches_top();
        debug!(kind = ?piece.kind, rows, score = self.score, "locked");

        out.changed.board = true;
        out.changed.piece = true;
        out.changed.stats |= rows > 0;
        out.event = Some(LockEvent {
            lines_cleared: rows as u8,
            score_delta: result.delta,
            leveled_up: result.leveled_up,
            topped_out,
        });

        if topped_out {
            self.enter_lost(out);
        }
    }

    fn enter_lost(&mut self, out: &mut Outcome) {
        self.status = GameStatus::Lost;
        self.gravity_token = None;
        self.lock_delay = None;
        self.repeat = None;
        self.paused_by_focus = false;
        for kind in TimerKind::ALL {
            out.cancel(kind);
        }
        out.changed.status = true;
        info!(score = self.score, level = self.level, lines = self.lines_cleared, "game lost");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Rotation, BOARD_WIDTH, LINE_SCORES};

    fn session() -> GameSession {
        GameSession::new(12345, EngineConfig::default())
    }

    fn place(session: &mut GameSession, kind: PieceKind, rotation: Rotation, pivot: Pos) {
        session.active = Some(ActivePiece::at(kind, rotation, pivot));
    }

    fn fill_row_except(board: &mut Board, y: i8, holes: &[i8]) {
        for x in 0..BOARD_WIDTH as i8 {
            if !holes.contains(&x) {
                board.set(Pos::new(x, y), Some(PieceKind::Z));
            }
        }
    }

    fn armed_token(out: &Outcome, kind: TimerKind) -> TimerToken {
        match out.timer(kind) {
            Some(TimerRequest::Arm { token, .. }) => token,
            other => panic!("expected {kind:?} to be armed, got {other:?}"),
        }
    }

    /// Rest a square on the floor with a pending lock delay.
    fn resting_square(session: &mut GameSession) -> TimerToken {
        place(session, PieceKind::Square, Rotation::North, Pos::new(5, 19));
        let out = session.gravity_tick();
        armed_token(&out, TimerKind::LockDelay)
    }

    #[test]
    fn test_new_session() {
        let s = session();
        assert_eq!(s.status(), GameStatus::Playing);
        assert_eq!(s.score(), 0);
        assert_eq!(s.level(), 1);
        assert_eq!(s.lines_cleared(), 0);
        assert_eq!(s.gravity_interval_ms(), 600);
        assert!(s.active().is_some());
        assert!(s.lock_delay().is_none());
    }

    #[test]
    fn test_start_arms_gravity() {
        let (_, out) = GameSession::start(1, EngineConfig::default());
        assert!(matches!(
            out.timer(TimerKind::Gravity),
            Some(TimerRequest::Arm { after_ms: 600, .. })
        ));
    }

    #[test]
    fn test_gravity_moves_piece_down() {
        let mut s = session();
        let before = s.active().map(|p| p.pivot());
        let out = s.gravity_tick();
        assert!(out.changed.piece);
        assert_eq!(s.active().map(|p| p.pivot()), before.map(|p| p.offset(0, 1)));
        assert!(out.timer(TimerKind::Gravity).is_some());
    }

    #[test]
    fn test_gravity_spawns_when_no_piece() {
        let mut s = session();
        s.active = None;
        let expected = s.next_kind();
        s.gravity_tick();
        let piece = s.active().expect("spawned");
        assert_eq!(piece.kind, expected);
        assert_eq!(piece, ActivePiece::spawn(expected));
    }

    #[test]
    fn test_move_rejected_at_wall_is_silent() {
        let mut s = session();
        place(&mut s, PieceKind::Line, Rotation::North, Pos::new(2, 5));
        let before = s.active();
        let out = s.move_piece(Shift::Left);
        assert!(!out.changed.any());
        assert!(out.timers.is_empty());
        assert_eq!(s.active(), before);
    }

    #[test]
    fn test_resting_piece_arms_lock_delay_once() {
        let mut s = session();
        resting_square(&mut s);
        let state = s.lock_delay().expect("lock delay pending");
        assert_eq!(state.remaining_resets, LOCK_RESET_LIMIT);

        let out = s.gravity_tick();
        assert!(out.timer(TimerKind::LockDelay).is_none());
        assert_eq!(s.lock_delay(), Some(state));
    }

    #[test]
    fn test_lock_reset_limit() {
        let mut s = session();
        resting_square(&mut s);

        for i in 0..LOCK_RESET_LIMIT {
            let shift = if i % 2 == 0 { Shift::Left } else { Shift::Right };
            let out = s.move_piece(shift);
            assert!(out.changed.piece);
            assert!(out.timer(TimerKind::LockDelay).is_some(), "reset {i} not re-armed");
        }
        assert_eq!(s.lock_delay().map(|l| l.remaining_resets), Some(0));

        let out = s.move_piece(Shift::Left);
        assert!(out.changed.piece);
        assert!(out.timer(TimerKind::LockDelay).is_none());

        let token = s.lock_delay().map(|l| l.token).expect("pending");
        let out = s.fire(Timer {
            kind: TimerKind::LockDelay,
            token,
        });
        assert!(out.event.is_some());
        assert!(s.active().is_none());
    }

    #[test]
    fn test_rotation_spends_lock_reset() {
        let mut s = session();
        resting_square(&mut s);
        let out = s.rotate(Spin::Cw);
        assert_eq!(out, Outcome::default());
        assert_eq!(
            s.lock_delay().map(|l| l.remaining_resets),
            Some(LOCK_RESET_LIMIT)
        );

        let mut s = session();
        place(&mut s, PieceKind::T, Rotation::North, Pos::new(4, 19));
        armed_token(&s.gravity_tick(), TimerKind::LockDelay);
        let out = s.rotate(Spin::Cw);
        assert!(out.changed.piece);
        assert!(out.timer(TimerKind::LockDelay).is_some());
        assert_eq!(
            s.lock_delay().map(|l| l.remaining_resets),
            Some(LOCK_RESET_LIMIT - 1)
        );
    }

    #[test]
    fn test_stale_lock_token_is_ignored() {
        let mut s = session();
        let first = resting_square(&mut s);
        s.move_piece(Shift::Left);

        let out = s.fire(Timer {
            kind: TimerKind::LockDelay,
            token: first,
        });
        assert_eq!(out, Outcome::default());
        assert!(s.active().is_some());
    }

    #[test]
    fn test_lock_aborts_when_piece_can_fall() {
        let mut s = session();
        // A ledge under the left half only.
        s.board.set(Pos::new(4, 11), Some(PieceKind::T));
        place(&mut s, PieceKind::Square, Rotation::North, Pos::new(5, 10));
        s.gravity_tick();
        assert!(s.lock_delay().is_some());

        s.move_piece(Shift::Right);
        let out = s.lock_delay_expired();
        assert!(out.event.is_none());
        assert!(s.lock_delay().is_none());
        assert!(s.active().is_some());
    }

    #[test]
    fn test_dropping_further_cancels_lock_delay() {
        let mut s = session();
        s.board.set(Pos::new(4, 11), Some(PieceKind::T));
        place(&mut s, PieceKind::Square, Rotation::North, Pos::new(5, 10));
        s.gravity_tick();
        s.move_piece(Shift::Right);

        let out = s.gravity_tick();
        assert_eq!(out.timer(TimerKind::LockDelay), Some(TimerRequest::Cancel(TimerKind::LockDelay)));
        assert!(s.lock_delay().is_none());
    }

    #[test]
    fn test_hard_drop_locks_and_scores_clear() {
        let mut s = session();
        fill_row_except(&mut s.board, 19, &[3, 4, 5, 6]);
        place(&mut s, PieceKind::Line, Rotation::North, Pos::new(5, 3));
        let out = s.hard_drop();

        let event = out.event.expect("locked");
        assert_eq!(event.lines_cleared, 1);
        assert_eq!(event.score_delta, LINE_SCORES[1]);
        assert!(!event.topped_out);
        assert_eq!(s.score(), 40);
        assert_eq!(s.lines_cleared(), 1);
        assert_eq!(s.board().filled_count(), 0);
        assert!(s.active().is_none());
    }

    #[test]
    fn test_level_up_shortens_interval() {
        let mut s = session();
        s.lines_cleared = 9;
        fill_row_except(&mut s.board, 19, &[3, 4, 5, 6]);
        place(&mut s, PieceKind::Line, Rotation::North, Pos::new(5, 3));
        let out = s.hard_drop();

        assert!(out.event.is_some_and(|e| e.leveled_up));
        assert_eq!(s.level(), 2);
        assert_eq!(s.gravity_interval_ms(), 560);
        assert_eq!(s.score(), 80);
    }

    #[test]
    fn test_lock_in_top_row_loses_and_freezes() {
        let mut s = session();
        for y in 2..20 {
            fill_row_except(&mut s.board, y, &[0]);
        }
        place(&mut s, PieceKind::T, Rotation::North, Pos::new(5, 1));
        let out = s.hard_drop();

        assert!(out.event.is_some_and(|e| e.topped_out));
        assert_eq!(s.status(), GameStatus::Lost);
        for kind in TimerKind::ALL {
            assert_eq!(out.timer(kind), Some(TimerRequest::Cancel(kind)));
        }

        let score = s.score();
        assert_eq!(s.gravity_tick(), Outcome::default());
        assert_eq!(s.move_piece(Shift::Left), Outcome::default());
        assert_eq!(s.hard_drop(), Outcome::default());
        assert_eq!(s.score(), score);
    }

    #[test]
    fn test_blocked_spawn_loses() {
        let mut s = session();
        s.active = None;
        for x in 0..BOARD_WIDTH as i8 {
            s.board.set(Pos::new(x, 0), Some(PieceKind::J));
            s.board.set(Pos::new(x, 1), Some(PieceKind::J));
        }
        let out = s.gravity_tick();
        assert!(out.event.is_some_and(|e| e.topped_out));
        assert_eq!(s.status(), GameStatus::Lost);
        assert_eq!(out.timer(TimerKind::Gravity), Some(TimerRequest::Cancel(TimerKind::Gravity)));
    }

    #[test]
    fn test_pause_and_resume() {
        let mut s = session();
        resting_square(&mut s);
        let resets = s.lock_delay().map(|l| l.remaining_resets);

        let out = s.pause();
        assert_eq!(s.status(), GameStatus::Paused);
        assert_eq!(out.timers.len(), 3);
        assert_eq!(s.move_piece(Shift::Left), Outcome::default());

        let out = s.resume();
        assert_eq!(s.status(), GameStatus::Playing);
        assert!(matches!(
            out.timer(TimerKind::Gravity),
            Some(TimerRequest::Arm { after_ms: 600, .. })
        ));
        assert!(matches!(
            out.timer(TimerKind::LockDelay),
            Some(TimerRequest::Arm { after_ms: 500, .. })
        ));
        assert_eq!(s.lock_delay().map(|l| l.remaining_resets), resets);
    }

    #[test]
    fn test_focus_only_resumes_its_own_pause() {
        let mut s = session();
        s.focus_lost();
        assert_eq!(s.status(), GameStatus::Paused);
        s.focus_gained();
        assert_eq!(s.status(), GameStatus::Playing);

        s.pause();
        s.focus_lost();
        s.focus_gained();
        assert_eq!(s.status(), GameStatus::Paused);
    }

    #[test]
    fn test_auto_repeat_moves_until_released() {
        let mut s = session();
        place(&mut s, PieceKind::T, Rotation::North, Pos::new(5, 10));
        let out = s.soft_drop_start(Direction::Left);
        assert_eq!(s.active().map(|p| p.pivot()), Some(Pos::new(4, 10)));
        let token = armed_token(&out, TimerKind::AutoRepeat);

        let out = s.fire(Timer {
            kind: TimerKind::AutoRepeat,
            token,
        });
        assert_eq!(s.active().map(|p| p.pivot()), Some(Pos::new(3, 10)));
        let token = armed_token(&out, TimerKind::AutoRepeat);

        s.soft_drop_stop(Direction::Right);
        assert_eq!(s.held_direction(), Some(Direction::Left));
        let out = s.soft_drop_stop(Direction::Left);
        assert_eq!(out.timer(TimerKind::AutoRepeat), Some(TimerRequest::Cancel(TimerKind::AutoRepeat)));

        let out = s.fire(Timer {
            kind: TimerKind::AutoRepeat,
            token,
        });
        assert!(!out.changed.any());
    }

    #[test]
    fn test_soft_drop_down() {
        let mut s = session();
        place(&mut s, PieceKind::T, Rotation::North, Pos::new(5, 10));
        s.soft_drop_start(Direction::Down);
        assert_eq!(s.active().map(|p| p.pivot()), Some(Pos::new(5, 11)));
    }

    #[test]
    fn test_rotate_pressed_follows_config() {
        let mut s = session();
        place(&mut s, PieceKind::T, Rotation::North, Pos::new(5, 10));
        s.rotate_pressed();
        assert_eq!(s.active().map(|p| p.rotation), Some(Rotation::East));

        s.set_config(EngineConfig {
            rotate_counterclockwise: true,
            ..EngineConfig::default()
        });
        place(&mut s, PieceKind::T, Rotation::North, Pos::new(5, 10));
        s.rotate_pressed();
        assert_eq!(s.active().map(|p| p.rotation), Some(Rotation::West));
    }

    #[test]
    fn test_ghost_gated_by_config() {
        let mut s = session();
        place(&mut s, PieceKind::Line, Rotation::North, Pos::new(5, 3));
        let ghost = s.ghost_cells().expect("ghost");
        assert!(ghost.iter().all(|c| c.y == 19));

        s.set_config(EngineConfig {
            drop_shadow: false,
            ..EngineConfig::default()
        });
        assert!(s.ghost_cells().is_none());
        assert!(s.snapshot().ghost.is_none());
    }

    #[test]
    fn test_acknowledge_loss_starts_over() {
        let mut s = session();
        assert_eq!(s.acknowledge_loss(), Outcome::default());

        s.status = GameStatus::Lost;
        s.score = 500;
        let out = s.acknowledge_loss();
        assert_eq!(s.status(), GameStatus::Playing);
        assert_eq!(s.score(), 0);
        assert!(s.active().is_some());
        assert!(out.timer(TimerKind::Gravity).is_some());
    }

    #[test]
    fn test_outcome_keeps_last_request_per_kind() {
        let mut out = Outcome::default();
        out.cancel(TimerKind::Gravity);
        out.arm(TimerKind::Gravity, TimerToken(7), 600);
        out.cancel(TimerKind::LockDelay);
        assert_eq!(out.timers.len(), 2);
        assert_eq!(
            out.timer(TimerKind::Gravity),
            Some(TimerRequest::Arm {
                kind: TimerKind::Gravity,
                token: TimerToken(7),
                after_ms: 600
            })
        );
    }
}

//! Runtime - a session driven by a scheduler
//!
//! Glues [`GameSession`] to [`Scheduler`]: every outcome's timer requests are
//! fed back into the scheduler, and [`Runtime::advance`] walks the clock from
//! one deadline to the next so re-armed timers are measured from the moment
//! they fired, not from the end of a long frame.

use blockfall_core::types::Command;
use blockfall_core::{
    Changed, EngineConfig, GameSession, GameSnapshot, LockEvent, Outcome, PersistError, SavedGame,
};
use tracing::{debug, trace};

use crate::scheduler::Scheduler;

#[derive(Debug, Clone)]
pub struct Runtime {
    session: GameSession,
    scheduler: Scheduler,
    last_event: Option<LockEvent>,
}

impl Runtime {
    /// Wrap a session together with the outcome that started it.
    pub fn new(session: GameSession, initial: Outcome) -> Self {
        let mut runtime = Self {
            session,
            scheduler: Scheduler::new(),
            last_event: None,
        };
        runtime.absorb(initial);
        runtime
    }

    /// New game.
    pub fn start(seed: u32, config: EngineConfig) -> Self {
        let (session, out) = GameSession::start(seed, config);
        Self::new(session, out)
    }

    /// Continue a saved game.
    pub fn resume_saved(
        saved: &SavedGame,
        seed: u32,
        config: EngineConfig,
    ) -> Result<Self, PersistError> {
        let (session, out) = GameSession::continue_game(saved, seed, config)?;
        Ok(Self::new(session, out))
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn snapshot_into(&self, out: &mut GameSnapshot) {
        self.session.snapshot_into(out);
    }

    /// Most recent lock event since the last call.
    pub fn take_last_event(&mut self) -> Option<LockEvent> {
        self.last_event.take()
    }

    /// Route one input command.
    pub fn command(&mut self, command: Command) -> Changed {
        trace!(command = command.as_str());
        let out = self.session.apply(command);
        if out.changed.status {
            debug!(status = self.session.status().as_str(), "status changed");
        }
        self.absorb(out)
    }

    /// Let `elapsed_ms` pass, firing every timer that comes due on the way.
    pub fn advance(&mut self, elapsed_ms: u64) -> Changed {
        let target = self.scheduler.now_ms().saturating_add(elapsed_ms);
        let mut changed = Changed::default();

        while let Some(due) = self.scheduler.next_due_at().filter(|&due| due <= target) {
            let step = due.saturating_sub(self.scheduler.now_ms());
            self.scheduler.advance(step);
            while let Some(timer) = self.scheduler.pop_due() {
                let out = self.session.fire(timer);
                changed.merge(self.absorb(out));
            }
        }

        let rest = target.saturating_sub(self.scheduler.now_ms());
        self.scheduler.advance(rest);
        changed
    }

    /// Milliseconds until something can happen without input.
    pub fn next_wakeup_in(&self) -> Option<u64> {
        self.scheduler.next_due_in()
    }

    fn absorb(&mut self, out: Outcome) -> Changed {
        self.scheduler.apply(&out.timers);
        if let Some(event) = out.event {
            debug!(?event, "lock event");
            self.last_event = Some(event);
        }
        out.changed
    }
}

//! The save game on disk: one JSON document in the platform data directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::{GameSession, LockEvent, SavedGame};
use crate::settings::project_dirs;

pub fn default_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().join("savegame.json"))
}

/// `Ok(None)` when there is no save.
pub fn load(path: &Path) -> Result<Option<SavedGame>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err).with_context(|| format!("read {}", path.display())),
    };
    let saved = SavedGame::from_json(&text).with_context(|| format!("decode {}", path.display()))?;
    Ok(Some(saved))
}

pub fn store(path: &Path, saved: &SavedGame) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    fs::write(path, saved.to_json()?).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Bring the save in line with the session: store a game in progress, drop
/// the save of a lost one.
pub fn sync(path: &Path, session: &GameSession) -> Result<()> {
    match session.saved_state() {
        Some(saved) => store(path, &saved),
        None => remove(path),
    }
}

/// Store the session after a lock that raised the level; `Ok(false)` for any
/// other lock.
pub fn checkpoint(path: &Path, event: &LockEvent, session: &GameSession) -> Result<bool> {
    if !event.leveled_up {
        return Ok(false);
    }
    sync(path, session)?;
    tracing::debug!(level = session.level(), "checkpointed save");
    Ok(true)
}

/// Removing a save that does not exist is not an error.
pub fn remove(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("remove {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EngineConfig;
    use crate::types::{Command, GameStatus};

    fn temp_save(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("blockfall-save-{}-{}", name, std::process::id()))
            .join("savegame.json")
    }

    #[test]
    fn sync_stores_game_in_progress() {
        let path = temp_save("progress");
        let mut session = GameSession::new(9, EngineConfig::default());
        session.apply(Command::HardDrop);

        sync(&path, &session).unwrap();
        let loaded = load(&path).unwrap().expect("save written");
        assert_eq!(Some(loaded), session.saved_state());

        if let Some(dir) = path.parent() {
            let _ = fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn checkpoint_only_on_level_up() {
        let path = temp_save("checkpoint");
        let session = GameSession::new(3, EngineConfig::default());
        let mut event = LockEvent {
            lines_cleared: 1,
            score_delta: 40,
            ..LockEvent::default()
        };

        assert!(!checkpoint(&path, &event, &session).unwrap());
        assert!(!path.exists());

        event.leveled_up = true;
        assert!(checkpoint(&path, &event, &session).unwrap());
        assert_eq!(load(&path).unwrap(), session.saved_state());

        if let Some(dir) = path.parent() {
            let _ = fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn sync_drops_save_of_lost_game() {
        let path = temp_save("lost");
        let mut session = GameSession::new(9, EngineConfig::default());
        sync(&path, &session).unwrap();
        assert!(path.exists());

        for _ in 0..100 {
            if session.status() == GameStatus::Lost {
                break;
            }
            session.hard_drop();
            session.gravity_tick();
        }
        assert_eq!(session.status(), GameStatus::Lost);
        sync(&path, &session).unwrap();
        assert!(!path.exists());
        assert!(load(&path).unwrap().is_none());

        if let Some(dir) = path.parent() {
            let _ = fs::remove_dir_all(dir);
        }
    }
}

//! Async Operations
//!
//! Background save threads. The simulation thread hands the serialized
//! snapshot over by value and polls a one-shot channel each frame; the
//! channel is the only thing the two threads share.

use super::save_file::{write_save, SaveError};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};

/// A save running on its own thread
pub struct PendingSave {
    name: String,
    receiver: Receiver<Result<(), SaveError>>,
    handle: Option<JoinHandle<()>>,
}

impl PendingSave {
    /// Display name of the save (file name without extension)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check for completion without blocking.
    ///
    /// Returns `None` while the thread is still writing.
    pub fn poll(&mut self) -> Option<Result<(), SaveError>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            // Thread panicked or dropped sender
            Err(TryRecvError::Disconnected) => Some(Err(SaveError::Interrupted)),
        }
    }

    /// Block until the thread has finished.
    pub fn wait(mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!(save = %self.name, "save thread panicked");
            }
        }
    }
}

/// Start writing `json` to `path` on a background thread
pub fn save_async(path: PathBuf, name: String, json: String) -> PendingSave {
    let (sender, receiver) = channel();

    let handle = thread::spawn(move || {
        let result = write_save(&path, json.as_bytes());
        let _ = sender.send(result);
    });

    PendingSave {
        name,
        receiver,
        handle: Some(handle),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::save_file::read_save;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    fn wait_for(save: &mut PendingSave) -> Result<(), SaveError> {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            if let Some(result) = save.poll() {
                return result;
            }
            assert!(Instant::now() < deadline, "save never completed");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_save_async_writes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("slot.sav");

        let mut save = save_async(path.clone(), "slot".into(), "{}".into());
        assert_eq!(save.name(), "slot");
        assert!(wait_for(&mut save).is_ok());
        save.wait();

        assert_eq!(read_save(&path).unwrap(), "{}");
    }

    #[test]
    fn test_concurrent_saves_to_one_path_both_succeed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("slot.sav");

        for round in 0..20 {
            let first = format!("{{\"round\": {}, \"writer\": 1}}", round);
            let second = format!("{{\"round\": {}, \"writer\": 2}}", round);
            let mut a = save_async(path.clone(), "slot".into(), first.clone());
            let mut b = save_async(path.clone(), "slot".into(), second.clone());

            assert!(wait_for(&mut a).is_ok(), "round {}", round);
            assert!(wait_for(&mut b).is_ok(), "round {}", round);
            a.wait();
            b.wait();

            let text = read_save(&path).unwrap();
            assert!(text == first || text == second, "round {}: {}", round, text);
        }

        // No staging files left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_save_async_reports_failure() {
        let dir = TempDir::new().unwrap();
        // A regular file where the parent directory should be
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();

        let mut save = save_async(blocker.join("slot.sav"), "slot".into(), "{}".into());
        assert!(matches!(wait_for(&mut save), Err(SaveError::Io(_))));
        save.wait();
    }
}

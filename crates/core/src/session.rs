//! Tracks logical sessions by player name independent of connection;
//! supports reconnect handoff.
//!
//! Grounded in the teacher's `ConnectionManager` (`crates/game/src/net/connection.rs`):
//! a name-keyed table behind one internal lock, with a `cleanup_timed_out`-shaped
//! sweep, here evicting by disconnect age instead of last-receive age.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::linereader::LineReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    Normal,
    Dialogue,
    Instance,
}

/// A persistent-identity session, surviving brief disconnects.
pub struct Session {
    pub player_name: String,
    pub room_id: String,
    pub hp: i32,
    pub mp: i32,
    pub mode: DispatchMode,
    pub connected: bool,
    pub last_seen: Instant,
    pub disconnected_at: Option<Instant>,
}

impl Session {
    fn new(player_name: String, room_id: String, hp: i32, mp: i32) -> Self {
        Self {
            player_name,
            room_id,
            hp,
            mp,
            mode: DispatchMode::Normal,
            connected: true,
            last_seen: Instant::now(),
            disconnected_at: None,
        }
    }
}

pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Session>>,
    reconnect_window: Duration,
}

impl SessionRegistry {
    pub fn new(reconnect_window: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            reconnect_window,
        }
    }

    fn key(name: &str) -> String {
        name.to_ascii_lowercase()
    }

    pub fn create_session(&self, name: &str, room_id: &str, hp: i32, mp: i32) {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.insert(
            Self::key(name),
            Session::new(name.to_string(), room_id.to_string(), hp, mp),
        );
    }

    pub fn disconnect(&self, name: &str) {
        let mut sessions = self.sessions.lock().unwrap();
        if let Some(s) = sessions.get_mut(&Self::key(name)) {
            s.connected = false;
            s.disconnected_at = Some(Instant::now());
        }
    }

    /// Returns `true` and clears the disconnected marker if a live prior
    /// session exists within the reconnect window.
    pub fn reconnect(&self, name: &str) -> Option<(String, i32, i32)> {
        let mut sessions = self.sessions.lock().unwrap();
        let key = Self::key(name);
        let session = sessions.get_mut(&key)?;

        let within_window = match session.disconnected_at {
            Some(at) => at.elapsed() < self.reconnect_window,
            None => true,
        };

        if !within_window {
            return None;
        }

        session.connected = true;
        session.disconnected_at = None;
        session.last_seen = Instant::now();
        Some((session.room_id.clone(), session.hp, session.mp))
    }

    pub fn touch(&self, name: &str) {
        let mut sessions = self.sessions.lock().unwrap();
        if let Some(s) = sessions.get_mut(&Self::key(name)) {
            s.last_seen = Instant::now();
        }
    }

    pub fn set_mode(&self, name: &str, mode: DispatchMode) {
        let mut sessions = self.sessions.lock().unwrap();
        if let Some(s) = sessions.get_mut(&Self::key(name)) {
            s.mode = mode;
        }
    }

    pub fn mode(&self, name: &str) -> Option<DispatchMode> {
        self.sessions.lock().unwrap().get(&Self::key(name)).map(|s| s.mode)
    }

    /// Evicts sessions disconnected longer than the reconnect window.
    /// Intended to be driven by a periodic sweeper task.
    pub fn sweep_expired(&self) -> Vec<String> {
        let mut sessions = self.sessions.lock().unwrap();
        let window = self.reconnect_window;
        let expired: Vec<String> = sessions
            .iter()
            .filter(|(_, s)| {
                !s.connected
                    && s.disconnected_at
                        .map(|at| at.elapsed() >= window)
                        .unwrap_or(false)
            })
            .map(|(k, _)| k.clone())
            .collect();

        for k in &expired {
            sessions.remove(k);
        }
        expired
    }

    pub fn is_online(&self, name: &str) -> bool {
        self.sessions
            .lock()
            .unwrap()
            .get(&Self::key(name))
            .map(|s| s.connected)
            .unwrap_or(false)
    }

    pub fn online_names(&self) -> Vec<String> {
        self.sessions
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.connected)
            .map(|s| s.player_name.clone())
            .collect()
    }
}

/// Process-wide map of player name -> per-connection line reader state, held
/// separately from [`SessionRegistry`] since the reader is transport state,
/// not persistent identity.
#[derive(Default)]
pub struct LineReaderTable {
    readers: Mutex<HashMap<String, LineReader>>,
}

impl LineReaderTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_player<R>(&self, name: &str, f: impl FnOnce(&mut LineReader) -> R) -> R {
        let mut readers = self.readers.lock().unwrap();
        let reader = readers.entry(name.to_string()).or_default();
        f(reader)
    }

    pub fn remove(&self, name: &str) {
        self.readers.lock().unwrap().remove(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconnect_within_window_returns_state() {
        let reg = SessionRegistry::new(Duration::from_secs(60));
        reg.create_session("neo", "dojo", 30, 10);
        reg.disconnect("neo");
        let r = reg.reconnect("neo");
        assert_eq!(r, Some(("dojo".to_string(), 30, 10)));
    }

    #[test]
    fn reconnect_after_window_returns_none() {
        let reg = SessionRegistry::new(Duration::from_millis(10));
        reg.create_session("neo", "dojo", 30, 10);
        reg.disconnect("neo");
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(reg.reconnect("neo"), None);
    }

    #[test]
    fn sweep_evicts_only_expired() {
        let reg = SessionRegistry::new(Duration::from_millis(10));
        reg.create_session("neo", "dojo", 30, 10);
        reg.disconnect("neo");
        std::thread::sleep(Duration::from_millis(30));
        let expired = reg.sweep_expired();
        assert_eq!(expired, vec!["neo".to_string()]);
        assert!(!reg.is_online("neo"));
    }

    #[test]
    fn case_insensitive_lookup() {
        let reg = SessionRegistry::new(Duration::from_secs(60));
        reg.create_session("Neo", "dojo", 30, 10);
        assert!(reg.is_online("NEO"));
    }
}

//! Shared process state handed to every connection task and background loop.
//!
//! Grounded in the teacher's `ConnectionManager` (name/addr-keyed table
//! behind one lock) generalized to a player-name-keyed outbound registry,
//! since delivery here is addressed by logical identity, not socket address.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, RwLock, Semaphore};

use mud_core::world::Delivery;
use mud_core::{AuthStore, Config, RateLimiter, SessionRegistry, World};
use mud_core::adapters::Adapters;
use mud_core::linereader::HistoryStore;
use mud_core::world::Storage;
use mud_core::LineReaderTable;

/// One outbound byte sink per connected player, drained by that connection's
/// writer task. Registered on successful identification, removed on
/// disconnect; looked up by the tick loop and by other players' `tell`/`say`
/// deliveries to reach a socket from any task.
#[derive(Default)]
pub struct ConnectionRegistry {
    senders: Mutex<HashMap<String, mpsc::UnboundedSender<Vec<u8>>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(name: &str) -> String {
        name.to_ascii_lowercase()
    }

    pub fn register(&self, name: &str, sender: mpsc::UnboundedSender<Vec<u8>>) {
        self.senders.lock().unwrap().insert(Self::key(name), sender);
    }

    pub fn unregister(&self, name: &str) {
        self.senders.lock().unwrap().remove(&Self::key(name));
    }

    /// Best-effort send; `false` means the player has no live connection (or
    /// its writer has already hung up).
    pub fn send(&self, name: &str, bytes: Vec<u8>) -> bool {
        let senders = self.senders.lock().unwrap();
        match senders.get(&Self::key(name)) {
            Some(tx) => tx.send(bytes).is_ok(),
            None => false,
        }
    }

    pub fn send_deliveries(&self, deliveries: Vec<Delivery>) {
        for d in deliveries {
            self.send(&d.to, d.text.into_bytes());
        }
    }

    /// Closes a connection's writer channel, causing its connection task to
    /// observe a closed socket and tear down. Used by the admin kick endpoint
    /// and by shutdown.
    pub fn kick(&self, name: &str) -> bool {
        self.senders.lock().unwrap().remove(&Self::key(name)).is_some()
    }

    pub fn is_connected(&self, name: &str) -> bool {
        self.senders.lock().unwrap().contains_key(&Self::key(name))
    }

    pub fn connected_names(&self) -> Vec<String> {
        self.senders.lock().unwrap().keys().cloned().collect()
    }
}

/// All process-wide services, constructed once in `main` and shared by
/// `Arc` with every connection task and background loop.
pub struct AppState {
    pub config: Config,
    pub world: Arc<RwLock<World>>,
    pub storage: Storage,
    pub auth: AuthStore,
    pub sessions: SessionRegistry,
    pub auth_limiter: RateLimiter,
    pub cmd_limiter: RateLimiter,
    pub history: HistoryStore,
    pub line_readers: LineReaderTable,
    pub adapters: Adapters,
    pub connections: ConnectionRegistry,
    pub admission: Arc<Semaphore>,
    pub started_at: Instant,
    pub tick_count: AtomicU64,
}

impl AppState {
    pub fn record_tick(&self) {
        self.tick_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn new(config: Config) -> Self {
        let storage = Storage::new("data");
        let world = World::load(&storage);
        let sessions = SessionRegistry::new(config.reconnect_window);
        let auth = AuthStore::new("data/users.json");
        let auth_limiter = RateLimiter::new(config.auth_rate_limit, config.auth_rate_window);
        let cmd_limiter = RateLimiter::new(config.cmd_rate_limit, config.cmd_rate_window);
        let admission = Arc::new(Semaphore::new(config.max_connections));

        Self {
            world: Arc::new(RwLock::new(world)),
            storage,
            auth,
            sessions,
            auth_limiter,
            cmd_limiter,
            history: HistoryStore::new(),
            line_readers: LineReaderTable::new(),
            adapters: Adapters::default(),
            connections: ConnectionRegistry::new(),
            admission,
            started_at: Instant::now(),
            tick_count: AtomicU64::new(0),
            config,
        }
    }

    pub fn identify_deadline(&self) -> Duration {
        self.config.connection_timeout + Duration::from_secs(30)
    }
}

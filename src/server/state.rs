//! Shared server state: recent-message history and the session registry.

use std::collections::{HashMap, VecDeque};

use tokio::sync::{Mutex, mpsc};

use crate::protocol::ChatMessage;

/// Maximum number of messages replayed to a newly joined client.
pub const HISTORY_CAPACITY: usize = 10;

/// Handle for pushing broadcast messages to one session's send task.
pub type Outbound = mpsc::UnboundedSender<ChatMessage>;

/// Bounded FIFO buffer of the most recent chat messages, oldest first.
#[derive(Debug, Default)]
pub struct MessageHistory {
    entries: VecDeque<ChatMessage>,
}

impl MessageHistory {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    /// Append a message, evicting the single oldest entry at capacity.
    pub fn append(&mut self, message: ChatMessage) {
        if self.entries.len() == HISTORY_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(message);
    }

    /// Owned copy of the current entries, oldest to newest.
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Map of registered usernames to their sessions' outbound channels.
///
/// Every key belongs to a currently registered session; an entry is removed
/// exactly when its owning session closes.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<String, Outbound>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    /// Atomic check-and-insert: succeeds iff `username` is not registered.
    /// On failure nothing is mutated.
    pub fn register(&mut self, username: &str, sender: Outbound) -> bool {
        if self.sessions.contains_key(username) {
            return false;
        }
        self.sessions.insert(username.to_string(), sender);
        true
    }

    /// Remove the entry if present. Safe to call on an absent key.
    pub fn unregister(&mut self, username: &str) {
        self.sessions.remove(username);
    }

    /// Deliver `message` to every registered session.
    ///
    /// A session whose channel is gone (already tearing down) is skipped;
    /// its own loop is responsible for unregistering it. Pushing onto the
    /// unbounded channels never blocks, so no socket I/O happens here.
    pub fn broadcast(&self, message: &ChatMessage) {
        for (username, sender) in &self.sessions {
            if sender.send(message.clone()).is_err() {
                tracing::warn!("Failed to queue broadcast for client '{}'", username);
            }
        }
    }

    pub fn contains(&self, username: &str) -> bool {
        self.sessions.contains_key(username)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

struct RoomState {
    registry: SessionRegistry,
    history: MessageHistory,
}

/// Shared application state.
///
/// Registry and history sit behind one lock because their mutations are
/// paired: a session completing registration must either see a concurrent
/// message in its handed-back snapshot or receive it as a live broadcast,
/// never both and never neither.
pub struct AppState {
    room: Mutex<RoomState>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            room: Mutex::new(RoomState {
                registry: SessionRegistry::new(),
                history: MessageHistory::new(),
            }),
        }
    }

    /// Register `username` and hand back the history snapshot it must be
    /// initialized with, or `None` if the name is already taken.
    pub async fn register(&self, username: &str, sender: Outbound) -> Option<Vec<ChatMessage>> {
        let mut room = self.room.lock().await;
        if !room.registry.register(username, sender) {
            return None;
        }
        Some(room.history.snapshot())
    }

    /// Drop `username` from the registry. Idempotent.
    pub async fn unregister(&self, username: &str) {
        self.room.lock().await.registry.unregister(username);
    }

    /// Record `message` in the history and fan it out to every registered
    /// session, the sender included.
    pub async fn publish(&self, message: ChatMessage) {
        let mut room = self.room.lock().await;
        room.history.append(message.clone());
        room.registry.broadcast(&message);
    }

    pub async fn participant_count(&self) -> usize {
        self.room.lock().await.registry.len()
    }

    /// Current history contents, oldest to newest.
    pub async fn history(&self) -> Vec<ChatMessage> {
        self.room.lock().await.history.snapshot()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

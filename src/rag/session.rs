//! Per-session conversation history

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use dashmap::DashMap;
use serde::Deserialize;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::sync::OwnedMutexGuard;

use crate::llm::ChatMessage;
use crate::llm::Role;

/// One side of an exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

/// Bounded FIFO of turns. Never holds more than `max_turns` entries.
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    turns: VecDeque<ConversationTurn>,
    max_turns: usize,
}

impl ConversationHistory {
    #[must_use]
    pub fn new(max_turns: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(max_turns),
            max_turns,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    #[must_use]
    pub const fn max_turns(&self) -> usize {
        self.max_turns
    }

    pub fn turns(&self) -> impl Iterator<Item = &ConversationTurn> {
        self.turns.iter()
    }

    /// Drop the oldest turns until at most `max_turns` remain
    pub fn trim(&mut self) {
        while self.turns.len() > self.max_turns {
            self.turns.pop_front();
        }
    }

    /// Record a completed exchange, then trim
    pub fn record_exchange(&mut self, question: &str, answer: &str) {
        self.turns.push_back(ConversationTurn {
            role: Role::User,
            content: question.to_string(),
        });
        self.turns.push_back(ConversationTurn {
            role: Role::Assistant,
            content: answer.to_string(),
        });
        self.trim();
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Project the last `max_turns` turns into chat messages, oldest first
    #[must_use]
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        let skip = self.turns.len().saturating_sub(self.max_turns);
        self.turns
            .iter()
            .skip(skip)
            .map(|turn| ChatMessage::new(turn.role, turn.content.clone()))
            .collect()
    }
}

/// History plus bookkeeping for expiry
#[derive(Debug)]
pub struct SessionEntry {
    pub history: ConversationHistory,
    last_activity: Instant,
}

impl SessionEntry {
    fn new(max_turns: usize) -> Self {
        Self {
            history: ConversationHistory::new(max_turns),
            last_activity: Instant::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    #[must_use]
    pub fn is_expired(&self, timeout: Duration) -> bool {
        self.last_activity.elapsed() > timeout
    }
}

/// Guard over one session's entry. Held for the whole request, so requests on
/// the same session id run one after another.
pub type SessionGuard = OwnedMutexGuard<SessionEntry>;

/// Process-lifetime map of session id → history
pub struct SessionStore {
    sessions: DashMap<String, Arc<Mutex<SessionEntry>>>,
    max_turns: usize,
    session_timeout: Duration,
}

impl SessionStore {
    #[must_use]
    pub fn new(max_turns: usize, session_timeout: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            max_turns,
            session_timeout,
        }
    }

    /// Lock a session, creating it on first use
    pub async fn acquire(&self, session_id: &str) -> SessionGuard {
        let slot = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(SessionEntry::new(self.max_turns))))
            .clone();
        let mut guard = slot.lock_owned().await;
        guard.touch();
        guard
    }

    /// Snapshot of a session's turns, if the session exists
    pub async fn history(&self, session_id: &str) -> Option<Vec<ConversationTurn>> {
        let slot = self.sessions.get(session_id).map(|s| s.clone())?;
        let entry = slot.lock().await;
        Some(entry.history.turns().cloned().collect())
    }

    /// Forget a session. Returns whether it existed.
    pub fn clear(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Remove sessions idle for longer than the timeout. Sessions with a request
    /// in flight are locked and therefore skipped.
    pub fn cleanup_expired(&self) -> usize {
        let expired: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| {
                entry
                    .value()
                    .try_lock()
                    .is_ok_and(|e| e.is_expired(self.session_timeout))
            })
            .map(|entry| entry.key().clone())
            .collect();

        for session_id in &expired {
            self.sessions.remove(session_id);
            tracing::info!("Cleaned up expired session: {}", session_id);
        }
        expired.len()
    }

    /// Start the periodic expiry sweep on the current runtime
    pub fn spawn_cleanup(self: &Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                store.cleanup_expired();
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_exchange() {
        let mut history = ConversationHistory::new(8);
        history.record_exchange("Wat is het windbeleid?", "Het windbeleid ...");

        assert_eq!(history.len(), 2);
        let turns: Vec<_> = history.turns().collect();
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[1].role, Role::Assistant);
    }

    #[test]
    fn test_fifth_exchange_evicts_oldest_pair() {
        let mut history = ConversationHistory::new(8);
        for i in 1..=5 {
            history.record_exchange(&format!("vraag {i}"), &format!("antwoord {i}"));
        }

        assert_eq!(history.len(), 8);
        let first: Vec<_> = history.turns().take(2).map(|t| t.content.as_str()).collect();
        assert_eq!(first, vec!["vraag 2", "antwoord 2"]);
        let last = history.turns().last().unwrap();
        assert_eq!(last.content, "antwoord 5");
    }

    #[test]
    fn test_length_bound_holds_for_all_capacities() {
        for max_turns in (2..=20).step_by(2) {
            let mut history = ConversationHistory::new(max_turns);
            for i in 0..30 {
                history.record_exchange(&format!("q{i}"), &format!("a{i}"));
                assert!(history.len() <= max_turns);
            }
            // Order preserved: alternating roles ending with the newest answer
            let turns: Vec<_> = history.turns().collect();
            assert_eq!(turns.first().unwrap().role, Role::User);
            assert_eq!(turns.last().unwrap().content, "a29");
        }
    }

    #[test]
    fn test_to_messages_alternates_roles() {
        let mut history = ConversationHistory::new(4);
        history.record_exchange("q1", "a1");
        history.record_exchange("q2", "a2");

        let messages = history.to_messages();
        let roles: Vec<_> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
        );
        assert_eq!(messages[0].content, "q1");
    }

    #[tokio::test]
    async fn test_store_isolates_sessions() {
        let store = SessionStore::new(8, Duration::from_secs(60));
        {
            let mut a = store.acquire("a").await;
            a.history.record_exchange("q", "antwoord");
        }
        let _ = store.acquire("b").await;

        assert_eq!(store.session_count(), 2);
        assert_eq!(store.history("a").await.unwrap().len(), 2);
        assert!(store.history("b").await.unwrap().is_empty());
        assert!(store.history("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_same_session_is_serialized() {
        let store = SessionStore::new(8, Duration::from_secs(60));
        let guard = store.acquire("s").await;

        let pending = tokio::time::timeout(Duration::from_millis(50), store.acquire("s")).await;
        assert!(pending.is_err(), "second acquire must wait for the first guard");

        drop(guard);
        let second = tokio::time::timeout(Duration::from_millis(50), store.acquire("s")).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_clear_and_expiry() {
        let store = SessionStore::new(8, Duration::ZERO);
        let _ = store.acquire("old").await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(store.cleanup_expired(), 1);
        assert_eq!(store.session_count(), 0);

        let _ = store.acquire("x").await;
        assert!(store.clear("x"));
        assert!(!store.clear("x"));
    }
}

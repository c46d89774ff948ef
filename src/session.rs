//! In-memory conversation transcripts.
//!
//! Each authorized client owns one linear transcript for the lifetime of the
//! process. Nothing is persisted; restarting the gateway forgets everything.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

/// Linear conversation history, seeded with the brand greeting.
#[derive(Debug, Clone)]
pub struct Transcript {
    turns: Vec<Turn>,
    max_turns: usize,
}

impl Transcript {
    pub fn new(greeting: &str, max_turns: usize) -> Self {
        Self {
            turns: vec![Turn {
                role: Role::Model,
                text: greeting.to_string(),
            }],
            max_turns,
        }
    }

    pub fn push_user(&mut self, text: &str) {
        self.push(Role::User, text);
    }

    pub fn push_model(&mut self, text: &str) {
        self.push(Role::Model, text);
    }

    fn push(&mut self, role: Role, text: &str) {
        self.turns.push(Turn {
            role,
            text: text.to_string(),
        });
        // Cap excludes the greeting at index 0.
        while self.turns.len() > self.max_turns.saturating_add(1) {
            self.turns.remove(1);
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// Per-token transcripts with a bounded session count.
pub struct SessionManager {
    sessions: Mutex<HashMap<String, (Transcript, Instant)>>,
    greeting: String,
    max_turns: usize,
    max_sessions: usize,
}

impl SessionManager {
    pub fn new(greeting: &str, max_turns: usize, max_sessions: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            greeting: greeting.to_string(),
            max_turns,
            max_sessions: max_sessions.max(1),
        }
    }

    /// Run `f` against the caller's transcript, creating it on first use.
    pub fn with_transcript<T>(&self, token: &str, f: impl FnOnce(&mut Transcript) -> T) -> T {
        let mut sessions = self
            .sessions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if !sessions.contains_key(token) {
            if sessions.len() >= self.max_sessions {
                Self::evict_oldest(&mut sessions);
            }
            sessions.insert(
                token.to_string(),
                (
                    Transcript::new(&self.greeting, self.max_turns),
                    Instant::now(),
                ),
            );
        }

        let entry = sessions
            .get_mut(token)
            .unwrap_or_else(|| unreachable!("session inserted above"));
        entry.1 = Instant::now();
        f(&mut entry.0)
    }

    /// Snapshot of the caller's turns for rendering.
    pub fn history(&self, token: &str) -> Vec<Turn> {
        self.with_transcript(token, |t| t.turns().to_vec())
    }

    /// Replace the caller's transcript with a fresh greeted one.
    pub fn reset(&self, token: &str) {
        let mut sessions = self
            .sessions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        sessions.insert(
            token.to_string(),
            (
                Transcript::new(&self.greeting, self.max_turns),
                Instant::now(),
            ),
        );
    }

    pub fn session_count(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    fn evict_oldest(sessions: &mut HashMap<String, (Transcript, Instant)>) {
        if let Some(oldest) = sessions
            .iter()
            .min_by_key(|(_, (_, touched))| *touched)
            .map(|(token, _)| token.clone())
        {
            tracing::debug!("evicting least recently used session");
            sessions.remove(&oldest);
        }
    }
}

//! Participants, the active turn and per-name turn counters.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Handle shared between the session and the script namespace.
pub type SharedRegistry = Rc<RefCell<ParticipantRegistry>>;

/// Snapshot of one joined participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub name: String,
    pub turns: usize,
}

/// Ordered membership plus the active participant.
///
/// Invariants:
/// - every member has exactly one entry in `turns`;
/// - `active`, when set, names a current member.
///
/// Non-members (such as the anonymous placeholder) may also have a counter so
/// that submissions made before anyone joins are still counted.
#[derive(Debug, Default)]
pub struct ParticipantRegistry {
    members: Vec<String>,
    active: Option<String>,
    turns: HashMap<String, usize>,
}

impl ParticipantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry behind a shared handle.
    pub fn shared() -> SharedRegistry {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Add `name` unless it is blank or already joined. The first member to join
    /// while nobody is active becomes active.
    pub fn join(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() || self.is_member(name) {
            return;
        }
        self.members.push(name.to_string());
        self.turns.entry(name.to_string()).or_insert(0);
        if self.active.is_none() {
            self.active = Some(name.to_string());
        }
        tracing::debug!(participant = name, "joined");
    }

    /// Remove `name` and its counter. If it was active, the turn passes to the
    /// earliest remaining member.
    pub fn leave(&mut self, name: &str) {
        let Some(position) = self.members.iter().position(|m| m == name) else {
            return;
        };
        self.members.remove(position);
        self.turns.remove(name);
        if self.active.as_deref() == Some(name) {
            self.active = self.members.first().cloned();
        }
        tracing::debug!(participant = name, active = ?self.active, "left");
    }

    /// Make `name` active. Ignored unless `name` is a member.
    pub fn set_active(&mut self, name: &str) {
        if self.is_member(name) {
            self.active = Some(name.to_string());
        }
    }

    /// Hand the turn to the earliest joined member, or to nobody when empty.
    pub fn activate_first(&mut self) {
        self.active = self.members.first().cloned();
    }

    /// Count one turn for `name`, member or not.
    pub fn record_turn(&mut self, name: &str) {
        *self.turns.entry(name.to_string()).or_insert(0) += 1;
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn is_member(&self, name: &str) -> bool {
        self.members.iter().any(|m| m == name)
    }

    /// Joined names in join order.
    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn turn_count(&self, name: &str) -> usize {
        self.turns.get(name).copied().unwrap_or(0)
    }

    /// Members with their turn counts, in join order.
    pub fn participants(&self) -> impl Iterator<Item = Participant> + '_ {
        self.members.iter().map(|name| Participant {
            name: name.clone(),
            turns: self.turn_count(name),
        })
    }

    /// One report line per member, e.g. `* Ada (3 turns) <- active`.
    ///
    /// The iterator is lazy; call again to start over.
    pub fn describe(&self) -> impl Iterator<Item = String> + '_ {
        self.participants().map(|p| {
            let marker = if self.active.as_deref() == Some(p.name.as_str()) {
                " <- active"
            } else {
                ""
            };
            format!("* {} ({} turns){}", p.name, p.turns, marker)
        })
    }
}

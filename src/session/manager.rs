//! The session document and round lifecycle.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::round::Round;
use super::{MAX_PLAYERS, MIN_PLAYERS};
use crate::engine::Participant;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: Uuid,
    pub group_name: String,
    pub created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

/// The last calculator state the user entered, autosaved so a restart
/// picks up where the party left off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatorInputs {
    pub total_major: f64,
    pub deduction_major: f64,
    pub deduction_reimbursed: bool,
    pub participants: Vec<Participant>,
}

impl Default for CalculatorInputs {
    fn default() -> Self {
        Self {
            total_major: 0.0,
            deduction_major: 0.0,
            deduction_reimbursed: false,
            participants: vec![
                Participant::new("Player 1", 0.0),
                Participant::new("Player 2", 0.0),
            ],
        }
    }
}

/// The whole persisted session: identity, rounds, and autosaved inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub info: SessionInfo,
    pub rounds: Vec<Round>,
    pub current_round_id: u32,
    pub inputs: CalculatorInputs,
}

impl SessionData {
    /// A fresh session with one active round of two placeholder members.
    pub fn new(group_name: impl Into<String>) -> Self {
        let now = Utc::now();
        let round = Round::new(
            1,
            "Round 1",
            vec!["Player 1".to_string(), "Player 2".to_string()],
        );

        Self {
            info: SessionInfo {
                session_id: Uuid::new_v4(),
                group_name: group_name.into(),
                created: now,
                last_updated: now,
            },
            rounds: vec![round],
            current_round_id: 1,
            inputs: CalculatorInputs::default(),
        }
    }

    pub fn current_round(&self) -> Option<&Round> {
        self.rounds
            .iter()
            .find(|r| r.round_id == self.current_round_id)
            .or_else(|| self.rounds.first())
    }

    pub fn current_round_mut(&mut self) -> Option<&mut Round> {
        let current_id = self.current_round_id;
        if self.rounds.iter().any(|r| r.round_id == current_id) {
            self.rounds.iter_mut().find(|r| r.round_id == current_id)
        } else {
            self.rounds.first_mut()
        }
    }

    pub fn round_mut(&mut self, round_id: u32) -> Result<&mut Round> {
        self.rounds
            .iter_mut()
            .find(|r| r.round_id == round_id)
            .ok_or_else(|| anyhow::anyhow!("No round with id {}", round_id))
    }

    /// Create a new round, make it current, and deactivate the rest.
    pub fn create_round(&mut self, name: Option<String>, members: Vec<String>) -> Result<u32> {
        if members.is_empty() {
            return Err(anyhow::anyhow!("A round needs at least one member"));
        }

        let next_id = self.rounds.iter().map(|r| r.round_id).max().unwrap_or(0) + 1;
        let name = name.unwrap_or_else(|| format!("Round {}", next_id));

        for round in &mut self.rounds {
            round.is_active = false;
        }

        info!(round_id = next_id, round_name = %name, "Created new round");
        self.rounds.push(Round::new(next_id, name, members));
        self.current_round_id = next_id;
        self.touch();
        Ok(next_id)
    }

    /// Make an existing round current.
    pub fn switch_round(&mut self, round_id: u32) -> Result<()> {
        if !self.rounds.iter().any(|r| r.round_id == round_id) {
            return Err(anyhow::anyhow!("No round with id {}", round_id));
        }

        for round in &mut self.rounds {
            round.is_active = round.round_id == round_id;
        }
        self.current_round_id = round_id;
        self.touch();
        Ok(())
    }

    /// Rename a round and/or replace its member list. Confirmation
    /// states of surviving members are preserved.
    pub fn edit_round(
        &mut self,
        round_id: u32,
        name: Option<String>,
        members: Option<Vec<String>>,
    ) -> Result<()> {
        let round = self.round_mut(round_id)?;

        if let Some(name) = name {
            if name.trim().is_empty() {
                return Err(anyhow::anyhow!("Round name cannot be blank"));
            }
            round.round_name = name;
        }
        if let Some(members) = members {
            if members.is_empty() {
                return Err(anyhow::anyhow!("A round needs at least one member"));
            }
            round.set_members(members);
        }
        self.touch();
        Ok(())
    }

    /// Replace the autosaved calculator inputs, enforcing party size.
    pub fn save_inputs(&mut self, inputs: CalculatorInputs) -> Result<()> {
        let count = inputs.participants.len();
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&count) {
            return Err(anyhow::anyhow!(
                "Party size must be between {} and {}, got {}",
                MIN_PLAYERS,
                MAX_PLAYERS,
                count
            ));
        }
        self.inputs = inputs;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.info.last_updated = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_fresh_session_has_one_active_round() {
        let session = SessionData::new("Test Group");

        assert_eq!(session.rounds.len(), 1);
        let round = session.current_round().unwrap();
        assert_eq!(round.round_id, 1);
        assert!(round.is_active);
        assert_eq!(round.members.len(), 2);
    }

    #[test]
    fn test_create_round_deactivates_previous() {
        let mut session = SessionData::new("Test Group");
        let id = session
            .create_round(Some("Abyssal farm".to_string()), names(&["A", "B", "C"]))
            .unwrap();

        assert_eq!(id, 2);
        assert_eq!(session.current_round_id, 2);
        assert!(!session.rounds[0].is_active);
        assert!(session.rounds[1].is_active);
        assert_eq!(session.current_round().unwrap().members.len(), 3);
    }

    #[test]
    fn test_create_round_requires_members() {
        let mut session = SessionData::new("Test Group");
        assert!(session.create_round(None, Vec::new()).is_err());
    }

    #[test]
    fn test_round_ids_keep_growing_after_switch() {
        let mut session = SessionData::new("Test Group");
        session.create_round(None, names(&["A", "B"])).unwrap();
        session.switch_round(1).unwrap();
        let id = session.create_round(None, names(&["A", "B"])).unwrap();

        assert_eq!(id, 3);
    }

    #[test]
    fn test_switch_round_flips_active_flags() {
        let mut session = SessionData::new("Test Group");
        session.create_round(None, names(&["A", "B"])).unwrap();

        session.switch_round(1).unwrap();
        assert_eq!(session.current_round_id, 1);
        assert!(session.rounds[0].is_active);
        assert!(!session.rounds[1].is_active);

        assert!(session.switch_round(99).is_err());
    }

    #[test]
    fn test_edit_round_preserves_confirmations() {
        let mut session = SessionData::new("Test Group");
        session
            .current_round_mut()
            .unwrap()
            .toggle_confirmation("Player 1")
            .unwrap();

        session
            .edit_round(1, Some("Renamed".to_string()), Some(names(&["Player 1", "X"])))
            .unwrap();

        let round = session.current_round().unwrap();
        assert_eq!(round.round_name, "Renamed");
        assert_eq!(round.confirmed_count(), 1);
    }

    #[test]
    fn test_save_inputs_enforces_party_size() {
        let mut session = SessionData::new("Test Group");

        let mut inputs = CalculatorInputs::default();
        inputs.participants = vec![Participant::new("Solo", 100.0)];
        assert!(session.save_inputs(inputs.clone()).is_err());

        inputs.participants = (0..7)
            .map(|i| Participant::new(format!("P{i}"), 0.0))
            .collect();
        assert!(session.save_inputs(inputs.clone()).is_err());

        inputs.participants = (0..4)
            .map(|i| Participant::new(format!("P{i}"), 25.0))
            .collect();
        assert!(session.save_inputs(inputs).is_ok());
    }
}

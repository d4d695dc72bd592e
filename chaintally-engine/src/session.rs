//! High-level session wrapper binding a loaded save to analysis settings.
//!
//! The engine's passes are free functions; `ChainSession` is the owning
//! context a frontend keeps per loaded save. It caches the classifier's
//! per-jump tallies for the selected character and drops that cache when
//! the character or the save changes, so reports are always recomputed
//! from current inputs rather than patched.

use std::collections::BTreeMap;

use crate::age::{AgeMode, AgeTrajectory, age_trajectory};
use crate::classify::{EpisodeTallies, classify_purchases};
use crate::milestones::{MilestoneReport, RewardConfig, RewardConfigError, tally_milestones};
use crate::save::{ChainSave, MAIN_CHARACTER_ID};

#[derive(Debug, Clone)]
pub struct ChainSession {
    save: ChainSave,
    character_id: String,
    config: RewardConfig,
    overrides: BTreeMap<String, u64>,
    include_supplements: bool,
    tallies: Option<EpisodeTallies>,
}

impl ChainSession {
    /// Open a session on a parsed save with the main character selected and
    /// default payout rules.
    #[must_use]
    pub fn new(save: ChainSave) -> Self {
        Self {
            save,
            character_id: MAIN_CHARACTER_ID.to_string(),
            config: RewardConfig::default(),
            overrides: BTreeMap::new(),
            include_supplements: false,
            tallies: None,
        }
    }

    /// Parse a save document and open a session on it.
    ///
    /// # Errors
    ///
    /// Returns the parse error when the document is not a save of the
    /// expected shape.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        ChainSave::from_json(json).map(Self::new)
    }

    /// Borrow the underlying save.
    #[must_use]
    pub const fn save(&self) -> &ChainSave {
        &self.save
    }

    /// Currently selected character id.
    #[must_use]
    pub fn character_id(&self) -> &str {
        &self.character_id
    }

    /// Active payout rules.
    #[must_use]
    pub const fn reward_config(&self) -> &RewardConfig {
        &self.config
    }

    /// Manual extermination counts keyed by jump id.
    #[must_use]
    pub const fn overrides(&self) -> &BTreeMap<String, u64> {
        &self.overrides
    }

    /// Whether supplement jumps count toward age accumulation.
    #[must_use]
    pub const fn include_supplements(&self) -> bool {
        self.include_supplements
    }

    /// Switch the selected character, invalidating cached tallies.
    pub fn select_character(&mut self, character_id: &str) {
        if self.character_id != character_id {
            self.character_id = character_id.to_string();
            self.tallies = None;
        }
    }

    /// Swap in a different save document, invalidating cached tallies.
    pub fn replace_save(&mut self, save: ChainSave) {
        self.save = save;
        self.tallies = None;
    }

    /// Install new payout rules.
    ///
    /// # Errors
    ///
    /// Rejects rules that fail [`RewardConfig::validate`]; the previous
    /// rules stay active in that case.
    pub fn set_reward_config(&mut self, config: RewardConfig) -> Result<(), RewardConfigError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Record a manual extermination count for one jump.
    pub fn set_override(&mut self, jump_id: &str, count: u64) {
        self.overrides.insert(jump_id.to_string(), count);
    }

    /// Remove a manual extermination count, restoring the stored value.
    pub fn clear_override(&mut self, jump_id: &str) {
        self.overrides.remove(jump_id);
    }

    /// Opt supplement jumps in or out of age accumulation.
    pub fn set_include_supplements(&mut self, include: bool) {
        self.include_supplements = include;
    }

    /// Per-jump tallies for the selected character, classified on first
    /// use and cached until the character or save changes.
    pub fn tallies(&mut self) -> &EpisodeTallies {
        let Self {
            save,
            character_id,
            tallies,
            ..
        } = self;
        tallies.get_or_insert_with(|| classify_purchases(save, character_id))
    }

    /// Milestone accumulation for the selected character.
    ///
    /// # Errors
    ///
    /// Propagates payout-rule validation failures.
    pub fn milestone_report(&mut self) -> Result<MilestoneReport, RewardConfigError> {
        let Self {
            save,
            character_id,
            config,
            overrides,
            tallies,
            ..
        } = self;
        let tallies = tallies.get_or_insert_with(|| classify_purchases(save, character_id));
        tally_milestones(save, tallies, config, overrides)
    }

    /// Age trajectory for the selected character under one mode.
    #[must_use]
    pub fn age_report(&self, mode: AgeMode) -> AgeTrajectory {
        let order = self.save.jump_order();
        age_trajectory(
            &self.save,
            &self.character_id,
            &order.ids,
            mode,
            self.include_supplements,
        )
    }

    /// Consume the session, returning the underlying save.
    #[must_use]
    pub fn into_save(self) -> ChainSave {
        self.save
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::milestones::MilestoneRule;

    const SAVE: &str = r#"{
        "jumps": {
            "1": {"name": "First", "duration": {"years": 1}},
            "2": {"name": "Second", "duration": {"months": 6}, "characters": ["1"]}
        },
        "characters": {
            "0": {"name": "Jumper", "originalAge": 23},
            "1": {"name": "Alya", "originalAge": 19}
        },
        "purchases": {
            "a": {"_characterId": "0", "_jumpId": "1", "_type": 1},
            "b": {"_characterId": "0", "_jumpId": "1", "_type": 1},
            "c": {"_characterId": "1", "_jumpId": "2", "_type": 1}
        },
        "jumpList": ["1", "2"]
    }"#;

    #[test]
    fn session_defaults_to_the_main_character() {
        let mut session = ChainSession::from_json(SAVE).unwrap();
        assert_eq!(session.character_id(), MAIN_CHARACTER_ID);
        assert_eq!(session.tallies().get("1").items, 2);
        assert_eq!(session.tallies().get("2").items, 0);
    }

    #[test]
    fn switching_characters_invalidates_tallies() {
        let mut session = ChainSession::from_json(SAVE).unwrap();
        assert_eq!(session.tallies().get("1").items, 2);

        session.select_character("1");
        assert_eq!(session.character_id(), "1");
        assert_eq!(session.tallies().get("1").items, 0);
        assert_eq!(session.tallies().get("2").items, 1);
    }

    #[test]
    fn reselecting_the_same_character_keeps_the_cache() {
        let mut session = ChainSession::from_json(SAVE).unwrap();
        let before = session.tallies().clone();
        session.select_character(MAIN_CHARACTER_ID);
        assert_eq!(session.tallies(), &before);
    }

    #[test]
    fn replacing_the_save_recomputes_reports() {
        let mut session = ChainSession::from_json(SAVE).unwrap();
        assert_eq!(session.milestone_report().unwrap().rows.len(), 2);

        session.replace_save(ChainSave::from_json(r#"{"jumpList": ["9"]}"#).unwrap());
        let report = session.milestone_report().unwrap();
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].items.count, 0);
    }

    #[test]
    fn into_save_returns_the_loaded_document() {
        let mut session = ChainSession::from_json(SAVE).unwrap();
        let replacement = ChainSave::from_json(r#"{"jumpList": ["9"]}"#).unwrap();
        session.replace_save(replacement.clone());
        assert_eq!(session.into_save(), replacement);
    }

    #[test]
    fn invalid_rules_are_rejected_and_previous_ones_kept() {
        let mut session = ChainSession::from_json(SAVE).unwrap();
        let bad = RewardConfig {
            items: MilestoneRule::new(2, 0),
            ..RewardConfig::default()
        };
        assert!(session.set_reward_config(bad).is_err());
        assert_eq!(session.reward_config(), &RewardConfig::default());
        assert!(session.milestone_report().is_ok());
    }

    #[test]
    fn overrides_flow_into_milestone_rows() {
        let mut session = ChainSession::from_json(SAVE).unwrap();
        session.set_override("2", 8);
        let report = session.milestone_report().unwrap();
        assert_eq!(report.rows[1].exterminations.count, 8);
        assert_eq!(report.rows[1].exterminations.pt, 4);

        session.clear_override("2");
        let report = session.milestone_report().unwrap();
        assert_eq!(report.rows[1].exterminations.count, 0);
    }

    #[test]
    fn age_reports_honor_the_supplement_toggle() {
        let mut session = ChainSession::from_json(
            r#"{
                "jumps": {
                    "1": {"duration": {"years": 1}},
                    "2": {"parentJump": "1", "duration": {"years": 2}}
                },
                "characters": {"0": {"originalAge": 20}},
                "jumpList": ["1", "2"]
            }"#,
        )
        .unwrap();

        let excluded = session.age_report(AgeMode::Participation);
        assert_eq!(excluded.summary.age.years, 21);

        session.set_include_supplements(true);
        let included = session.age_report(AgeMode::Participation);
        assert_eq!(included.summary.age.years, 23);
    }
}

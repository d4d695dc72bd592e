//! Age accumulation across the chain.
//!
//! Two inclusion models exist because chains disagree on what happens to a
//! companion who sits a jump out: participation mode only ages a character
//! through jumps they are present in, while continuous mode ages them
//! through every jump from their first appearance onward.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::duration::{ChainDuration, DurationText};
use crate::save::{ChainSave, Jump};

/// Which inclusion model drives a trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeMode {
    /// Count only jumps the character is present in.
    Participation,
    /// Count every jump from the character's first appearance onward,
    /// whether or not they are present in the later ones.
    Continuous,
}

impl AgeMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Participation => "participation",
            Self::Continuous => "continuous",
        }
    }
}

impl fmt::Display for AgeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cumulative age state at one jump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeRow {
    /// Whether this jump's duration counted toward the character.
    pub included: bool,
    /// Chain time accumulated through this jump.
    pub duration: ChainDuration,
    /// Starting age plus accumulated chain time, normalized.
    pub age: ChainDuration,
    pub duration_text: DurationText,
    pub age_text: DurationText,
}

/// Headline numbers for a trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeSummary {
    pub age: ChainDuration,
    pub duration: ChainDuration,
    pub age_text: DurationText,
    pub duration_text: DurationText,
    /// Jump the summary was read from. `None` means no jump was included
    /// and the summary fell back to the starting age.
    pub source_jump: Option<String>,
}

/// A character's full age breakdown under one mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeTrajectory {
    pub character_id: String,
    pub mode: AgeMode,
    /// Per-jump state keyed by jump id; render in traversal order.
    pub rows: HashMap<String, AgeRow>,
    pub summary: AgeSummary,
}

/// Compute a character's age trajectory over `order`.
///
/// Supplement jumps share their parent jump's timeline, so their durations
/// only count when `include_supplements` is set. Jumps referenced by the
/// order but missing from the save contribute no duration but still get a
/// row, keeping trajectories aligned with milestone rows.
#[must_use]
pub fn age_trajectory(
    save: &ChainSave,
    character_id: &str,
    order: &[String],
    mode: AgeMode,
    include_supplements: bool,
) -> AgeTrajectory {
    let starting_age = save.starting_age_of(character_id);
    let start_index = match mode {
        AgeMode::Participation => None,
        AgeMode::Continuous => continuous_start(save, character_id, order),
    };

    let mut cumulative = ChainDuration::ZERO;
    let mut rows = HashMap::with_capacity(order.len());
    for (index, jump_id) in order.iter().enumerate() {
        let jump = save.jumps.get(jump_id.as_str());
        let mut included = match mode {
            AgeMode::Participation => save.is_participant(character_id, jump_id),
            AgeMode::Continuous => start_index.is_some_and(|start| index >= start),
        };
        if !include_supplements && jump.is_some_and(Jump::is_supplement) {
            included = false;
        }
        if included {
            if let Some(jump) = jump {
                cumulative = cumulative.plus(jump.duration);
            }
        }
        let age = age_at(starting_age, cumulative);
        rows.insert(
            jump_id.clone(),
            AgeRow {
                included,
                duration: cumulative,
                age,
                duration_text: cumulative.text_set(),
                age_text: age.text_set(),
            },
        );
    }

    let summary = summarize(&rows, order, starting_age);
    AgeTrajectory {
        character_id: character_id.to_string(),
        mode,
        rows,
        summary,
    }
}

/// Starting age plus accumulated chain time. Months and days spill over
/// through normalization, so six accumulated months of jumps genuinely
/// read as half a year older.
fn age_at(starting_age: i64, cumulative: ChainDuration) -> ChainDuration {
    ChainDuration::new(
        starting_age.saturating_add(cumulative.years),
        cumulative.months,
        cumulative.days,
    )
    .normalized()
}

/// First order index that counts for continuous aging.
///
/// When the character's first appearance is a supplement, the start point
/// is its parent jump's position in the order, even when the parent sits
/// earlier in the list. A parent missing from the order falls back to the
/// supplement's own position.
fn continuous_start(save: &ChainSave, character_id: &str, order: &[String]) -> Option<usize> {
    let first = order
        .iter()
        .position(|jump_id| save.is_participant(character_id, jump_id))?;
    if let Some(parent) = save.parent_of(&order[first]) {
        if let Some(parent_index) = order.iter().position(|jump_id| jump_id == parent) {
            return Some(parent_index);
        }
    }
    Some(first)
}

/// Walk the order backwards to the most recent included row. A character
/// that never appears summarizes as their starting age with no time served.
fn summarize(rows: &HashMap<String, AgeRow>, order: &[String], starting_age: i64) -> AgeSummary {
    for jump_id in order.iter().rev() {
        if let Some(row) = rows.get(jump_id) {
            if row.included {
                return AgeSummary {
                    age: row.age,
                    duration: row.duration,
                    age_text: row.age_text.clone(),
                    duration_text: row.duration_text.clone(),
                    source_jump: Some(jump_id.clone()),
                };
            }
        }
    }
    let age = ChainDuration::new(starting_age, 0, 0.0);
    AgeSummary {
        age,
        duration: ChainDuration::ZERO,
        age_text: age.text_set(),
        duration_text: ChainDuration::ZERO.text_set(),
        source_jump: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::save::ChainSave;

    fn roster_save() -> ChainSave {
        ChainSave::from_json(
            r#"{
                "jumps": {
                    "1": {"name": "Gauntlet", "duration": {"years": 1}},
                    "2": {"name": "Academy", "duration": {"months": 6}, "characters": ["1"]},
                    "3": {"name": "Academy Housing", "parentJump": "2", "duration": {"years": 2}, "characters": ["1", "2"]},
                    "4": {"name": "Frontier", "duration": {"years": 2, "months": 7, "days": 45}, "characters": ["1"]}
                },
                "characters": {
                    "0": {"name": "Jumper", "originalAge": 23},
                    "1": {"name": "Alya", "originalAge": "19"},
                    "2": {"name": "Mirri"}
                },
                "jumpList": ["1", "2", "3", "4"]
            }"#,
        )
        .unwrap()
    }

    fn order(save: &ChainSave) -> Vec<String> {
        save.jump_order().ids
    }

    #[test]
    fn participation_counts_only_rostered_jumps() {
        let save = roster_save();
        let trajectory = age_trajectory(&save, "1", &order(&save), AgeMode::Participation, false);

        let academy = &trajectory.rows["2"];
        assert!(academy.included);
        assert_eq!(academy.age, ChainDuration::new(19, 6, 0.0));

        let housing = &trajectory.rows["3"];
        assert!(!housing.included, "supplements are excluded by default");

        let frontier = &trajectory.rows["4"];
        assert!(frontier.included);
        assert_eq!(frontier.age, ChainDuration::new(22, 2, 15.0));
        assert_eq!(trajectory.summary.age, ChainDuration::new(22, 2, 15.0));
        assert_eq!(trajectory.summary.source_jump.as_deref(), Some("4"));
    }

    #[test]
    fn supplements_opt_in_to_aging() {
        let save = roster_save();
        let trajectory = age_trajectory(&save, "1", &order(&save), AgeMode::Participation, true);
        let housing = &trajectory.rows["3"];
        assert!(housing.included);
        assert_eq!(housing.age, ChainDuration::new(21, 6, 0.0));
        assert_eq!(trajectory.summary.age, ChainDuration::new(24, 2, 15.0));
    }

    #[test]
    fn months_accumulate_into_years() {
        let save = ChainSave::from_json(
            r#"{
                "jumps": {
                    "1": {"duration": {"years": 1}},
                    "2": {"duration": {"months": 6}}
                },
                "characters": {"0": {"originalAge": 30}},
                "jumpList": ["1", "2"]
            }"#,
        )
        .unwrap();
        let trajectory = age_trajectory(&save, "0", &order(&save), AgeMode::Participation, false);
        assert_eq!(trajectory.summary.age, ChainDuration::new(31, 6, 0.0));
        assert_eq!(trajectory.summary.duration, ChainDuration::new(1, 6, 0.0));
        assert_eq!(trajectory.summary.age_text.verbose_clean, "31 years, 6 months");
    }

    #[test]
    fn continuous_counts_from_first_appearance() {
        let save = roster_save();
        let trajectory = age_trajectory(&save, "1", &order(&save), AgeMode::Continuous, false);

        assert!(!trajectory.rows["1"].included, "before first appearance");
        assert!(trajectory.rows["2"].included);
        assert!(trajectory.rows["4"].included);
        assert_eq!(trajectory.summary.age, ChainDuration::new(22, 2, 15.0));
    }

    #[test]
    fn continuous_start_resolves_supplements_to_their_parent() {
        let save = roster_save();
        let trajectory = age_trajectory(&save, "2", &order(&save), AgeMode::Continuous, false);

        assert!(
            trajectory.rows["2"].included,
            "start resolves to the supplement's parent"
        );
        assert!(!trajectory.rows["1"].included);
        assert!(trajectory.rows["4"].included);
        assert_eq!(trajectory.summary.age, ChainDuration::new(3, 2, 15.0));
    }

    #[test]
    fn absent_characters_summarize_at_their_starting_age() {
        let save = roster_save();
        let trajectory = age_trajectory(&save, "9", &order(&save), AgeMode::Participation, false);
        assert!(trajectory.rows.values().all(|row| !row.included));
        assert_eq!(trajectory.summary.age, ChainDuration::ZERO);
        assert_eq!(trajectory.summary.source_jump, None);
        assert_eq!(trajectory.summary.age_text.verbose, "0 days");
    }

    #[test]
    fn main_character_ages_through_everything() {
        let save = roster_save();
        let trajectory = age_trajectory(&save, "0", &order(&save), AgeMode::Participation, false);
        assert_eq!(trajectory.summary.age, ChainDuration::new(27, 2, 15.0));
        assert_eq!(trajectory.summary.duration, ChainDuration::new(4, 2, 15.0));
    }

    #[test]
    fn jumps_missing_from_the_save_still_get_rows() {
        let save = ChainSave::from_json(
            r#"{"jumps": {"1": {"duration": {"years": 1}}}, "jumpList": ["1", "404"]}"#,
        )
        .unwrap();
        let trajectory = age_trajectory(&save, "0", &order(&save), AgeMode::Participation, false);
        let ghost = &trajectory.rows["404"];
        assert!(ghost.included, "the main character is in every jump");
        assert_eq!(ghost.duration, ChainDuration::new(1, 0, 0.0));
    }
}

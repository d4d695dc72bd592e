//! Purpose-token milestone accounting.
//!
//! Each reward category pays `reward` PT for every `per` accumulated units.
//! Payouts are computed by floor division over running totals, so the PT a
//! jump earns is the telescoped difference against everything already
//! attributed. Units therefore carry across jumps until a threshold is
//! crossed and no partial milestone is ever paid twice.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classify::{CategoryTallies, EpisodeTallies};
use crate::save::ChainSave;

/// The four reward categories tracked across a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardCategory {
    Items,
    AltForms,
    Drawbacks,
    Exterminations,
}

impl RewardCategory {
    pub const ALL: [Self; 4] = [
        Self::Items,
        Self::AltForms,
        Self::Drawbacks,
        Self::Exterminations,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Items => "Items",
            Self::AltForms => "Alt-Forms",
            Self::Drawbacks => "Drawbacks",
            Self::Exterminations => "Exterminations",
        }
    }
}

impl fmt::Display for RewardCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One category's payout rule: `reward` PT for every `per` units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneRule {
    pub reward: u32,
    pub per: u32,
}

impl MilestoneRule {
    #[must_use]
    pub const fn new(reward: u32, per: u32) -> Self {
        Self { reward, per }
    }
}

/// Payout rules for all four categories.
///
/// Defaults mirror the classic community thresholds: 2 PT per 5 items,
/// 1 PT per 2 alternate forms, 1 PT per 10 drawbacks, and 2 PT per 4
/// exterminations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardConfig {
    pub items: MilestoneRule,
    pub alt_forms: MilestoneRule,
    pub drawbacks: MilestoneRule,
    pub exterminations: MilestoneRule,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            items: MilestoneRule::new(2, 5),
            alt_forms: MilestoneRule::new(1, 2),
            drawbacks: MilestoneRule::new(1, 10),
            exterminations: MilestoneRule::new(2, 4),
        }
    }
}

impl RewardConfig {
    #[must_use]
    pub const fn rule(&self, category: RewardCategory) -> MilestoneRule {
        match category {
            RewardCategory::Items => self.items,
            RewardCategory::AltForms => self.alt_forms,
            RewardCategory::Drawbacks => self.drawbacks,
            RewardCategory::Exterminations => self.exterminations,
        }
    }

    /// Check payout rules before an accumulation pass runs.
    ///
    /// # Errors
    ///
    /// Returns [`RewardConfigError`] when any rule has a zero threshold,
    /// which would divide by zero, or pays zero PT.
    pub fn validate(&self) -> Result<(), RewardConfigError> {
        for category in RewardCategory::ALL {
            let rule = self.rule(category);
            if rule.per == 0 {
                return Err(RewardConfigError::ZeroThreshold { category });
            }
            if rule.reward == 0 {
                return Err(RewardConfigError::ZeroReward { category });
            }
        }
        Ok(())
    }
}

/// Errors raised when payout rules violate their invariants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RewardConfigError {
    #[error("{category} rule requires at least 1 unit per milestone (got 0)")]
    ZeroThreshold { category: RewardCategory },
    #[error("{category} rule pays 0 PT per milestone")]
    ZeroReward { category: RewardCategory },
}

/// One category's numbers within a milestone row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryCell {
    /// Units recorded for this jump alone.
    pub count: u64,
    /// Units accumulated through this jump.
    pub cumulative: u64,
    /// PT attributed at this jump.
    pub pt: u64,
    /// PT attributed through this jump.
    pub pt_to_date: u64,
}

/// One jump's milestone accounting, emitted in traversal order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneRow {
    pub jump_id: String,
    pub name: String,
    pub supplement: bool,
    /// Display sequence number. Supplements are unnumbered so the primary
    /// jump numbering stays contiguous.
    pub sequence: Option<u32>,
    pub items: CategoryCell,
    pub alt_forms: CategoryCell,
    pub drawbacks: CategoryCell,
    pub exterminations: CategoryCell,
    /// PT earned at this jump across all categories.
    pub pt: u64,
    /// PT earned through this jump across all categories.
    pub pt_to_date: u64,
}

impl MilestoneRow {
    #[must_use]
    pub const fn cell(&self, category: RewardCategory) -> CategoryCell {
        match category {
            RewardCategory::Items => self.items,
            RewardCategory::AltForms => self.alt_forms,
            RewardCategory::Drawbacks => self.drawbacks,
            RewardCategory::Exterminations => self.exterminations,
        }
    }
}

/// Final count and payout for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub count: u64,
    pub pt: u64,
}

/// Chain-wide totals for the summary line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GrandTotals {
    pub items: CategoryTotal,
    pub alt_forms: CategoryTotal,
    pub drawbacks: CategoryTotal,
    pub exterminations: CategoryTotal,
    /// Total PT across every category and jump.
    pub pt: u64,
}

impl GrandTotals {
    #[must_use]
    pub const fn total(&self, category: RewardCategory) -> CategoryTotal {
        match category {
            RewardCategory::Items => self.items,
            RewardCategory::AltForms => self.alt_forms,
            RewardCategory::Drawbacks => self.drawbacks,
            RewardCategory::Exterminations => self.exterminations,
        }
    }
}

/// A full accumulation pass over the chain for one character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneReport {
    pub character_id: String,
    pub rows: Vec<MilestoneRow>,
    pub totals: GrandTotals,
    /// False when the save lacked `jumpList` and row order is the sorted
    /// fallback.
    pub declared_order: bool,
}

/// Run the milestone accumulation pass.
///
/// Jumps are visited in the save's traversal order. All counters are local
/// to the call, so recomputing with the same inputs reproduces identical
/// rows; nothing is patched incrementally. Extermination counts come from
/// `overrides` where present, otherwise from the classified tallies.
/// Counter and payout arithmetic saturates at `u64::MAX` rather than
/// wrapping.
///
/// # Errors
///
/// Returns [`RewardConfigError`] when `config` fails validation. The pass
/// never starts in that case.
pub fn tally_milestones(
    save: &ChainSave,
    tallies: &EpisodeTallies,
    config: &RewardConfig,
    overrides: &BTreeMap<String, u64>,
) -> Result<MilestoneReport, RewardConfigError> {
    config.validate()?;

    let order = save.jump_order();
    let mut cumulative = [0_u64; 4];
    let mut attributed = [0_u64; 4];
    let mut chain_pt = 0_u64;
    let mut sequence = 0_u32;
    let mut rows = Vec::with_capacity(order.ids.len());

    for jump_id in &order.ids {
        let counts = tallies.get(jump_id);
        let supplement = save.is_supplement(jump_id);
        let seq = if supplement {
            None
        } else {
            sequence += 1;
            Some(sequence)
        };

        let mut cells = [CategoryCell::default(); 4];
        let mut row_pt = 0_u64;
        for (slot, category) in RewardCategory::ALL.into_iter().enumerate() {
            let count = category_count(&counts, category, overrides.get(jump_id));
            cumulative[slot] = cumulative[slot].saturating_add(count);
            let rule = config.rule(category);
            // Entitlement is monotone in the cumulative count, so the
            // telescoped difference below never underflows.
            let entitled =
                (cumulative[slot] / u64::from(rule.per)).saturating_mul(u64::from(rule.reward));
            let pt = entitled - attributed[slot];
            attributed[slot] = entitled;
            row_pt = row_pt.saturating_add(pt);
            cells[slot] = CategoryCell {
                count,
                cumulative: cumulative[slot],
                pt,
                pt_to_date: entitled,
            };
        }
        chain_pt = chain_pt.saturating_add(row_pt);

        rows.push(MilestoneRow {
            jump_id: jump_id.clone(),
            name: save.jump_name(jump_id),
            supplement,
            sequence: seq,
            items: cells[0],
            alt_forms: cells[1],
            drawbacks: cells[2],
            exterminations: cells[3],
            pt: row_pt,
            pt_to_date: chain_pt,
        });
    }

    let totals = GrandTotals {
        items: CategoryTotal {
            count: cumulative[0],
            pt: attributed[0],
        },
        alt_forms: CategoryTotal {
            count: cumulative[1],
            pt: attributed[1],
        },
        drawbacks: CategoryTotal {
            count: cumulative[2],
            pt: attributed[2],
        },
        exterminations: CategoryTotal {
            count: cumulative[3],
            pt: attributed[3],
        },
        pt: chain_pt,
    };

    Ok(MilestoneReport {
        character_id: tallies.character_id.clone(),
        rows,
        totals,
        declared_order: order.declared,
    })
}

fn category_count(
    counts: &CategoryTallies,
    category: RewardCategory,
    override_count: Option<&u64>,
) -> u64 {
    match category {
        RewardCategory::Items => counts.items,
        RewardCategory::AltForms => counts.alt_forms,
        RewardCategory::Drawbacks => counts.drawbacks,
        RewardCategory::Exterminations => {
            override_count.copied().unwrap_or(counts.exterminations)
        }
    }
}

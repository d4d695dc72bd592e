//! Purchase classification: raw purchase and alternate-form records become
//! per-jump category tallies for one character.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::save::{ChainSave, PurchaseKind};

/// Where alternate-form counts come from.
///
/// Newer saves record alt-forms as dedicated records; older ones only as
/// category-2 purchases. When dedicated records exist they win, and the
/// purchase spellings are ignored rather than double-counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AltFormSource {
    Records,
    Purchases,
}

impl AltFormSource {
    /// Pick the alternate-form source for a save.
    #[must_use]
    pub fn for_save(save: &ChainSave) -> Self {
        if save.altforms.is_empty() {
            Self::Purchases
        } else {
            Self::Records
        }
    }
}

/// Category counts for one character within one jump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryTallies {
    pub items: u64,
    pub alt_forms: u64,
    pub drawbacks: u64,
    /// Never derived from purchase records; populated through manual
    /// overrides at accumulation time.
    pub exterminations: u64,
}

/// Classification result for one character, keyed by jump id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeTallies {
    pub character_id: String,
    pub by_jump: BTreeMap<String, CategoryTallies>,
    pub alt_form_source: AltFormSource,
}

impl EpisodeTallies {
    /// Tallies for one jump. Jumps with no recorded purchases read as
    /// all-zero.
    #[must_use]
    pub fn get(&self, jump_id: &str) -> CategoryTallies {
        self.by_jump.get(jump_id).copied().unwrap_or_default()
    }
}

/// Partition a save's purchase and alternate-form records into per-jump
/// tallies for one character.
///
/// Records referencing jumps or characters that are not defined in the save
/// still count (display names are synthesized later). Records with unknown
/// category codes or no jump attribution are skipped. Temporary items never
/// count toward the item tally, while drawbacks count whether temporary or
/// not.
#[must_use]
pub fn classify_purchases(save: &ChainSave, character_id: &str) -> EpisodeTallies {
    let source = AltFormSource::for_save(save);
    let mut by_jump: BTreeMap<String, CategoryTallies> = BTreeMap::new();

    for purchase in save.purchases.values() {
        if purchase.character_id.as_deref() != Some(character_id) {
            continue;
        }
        let Some(jump_id) = purchase.jump_id.as_deref() else {
            continue;
        };
        let Some(kind) = purchase.kind() else {
            continue;
        };
        let tallies = by_jump.entry(jump_id.to_string()).or_default();
        match kind {
            PurchaseKind::Item => {
                if !purchase.temporary {
                    tallies.items += 1;
                }
            }
            PurchaseKind::AltForm => {
                if source == AltFormSource::Purchases {
                    tallies.alt_forms += 1;
                }
            }
            PurchaseKind::Drawback => tallies.drawbacks += 1,
        }
    }

    if source == AltFormSource::Records {
        for form in save.altforms.values() {
            if form.character_id.as_deref() != Some(character_id) {
                continue;
            }
            let Some(jump_id) = form.jump_id.as_deref() else {
                continue;
            };
            by_jump.entry(jump_id.to_string()).or_default().alt_forms += 1;
        }
    }

    EpisodeTallies {
        character_id: character_id.to_string(),
        by_jump,
        alt_form_source: source,
    }
}

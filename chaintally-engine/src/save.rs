//! ChainMaker save-file model.
//!
//! Everything in an exported save is optional. Hand-edited files drop keys,
//! and the format grew several revisions' worth of spellings (numeric ids
//! next to string ids, `originalAge` next to `age`). Decoding is therefore
//! tolerant at the field level, while a document that does not parse at all
//! is rejected outright.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::duration::ChainDuration;

/// Character id reserved for the chain's primary player. The main character
/// is treated as present in every jump whether or not rosters list them.
pub const MAIN_CHARACTER_ID: &str = "0";

/// Character ids recorded on a jump roster, inline up to four entries.
pub type ParticipantSet = SmallVec<[String; 4]>;

/// Tolerant decoders for fields the save format writes in more than one
/// shape: ids as strings or numbers, ages as numbers or digit strings,
/// flags as anything truthy.
pub(crate) mod flex {
    use serde::{Deserialize, Deserializer};

    use super::ParticipantSet;
    use crate::numbers::{parse_int_prefix, trunc_f64_to_i64};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdInput {
        Text(String),
        Int(i64),
        Float(f64),
    }

    impl IdInput {
        fn normalize(self) -> String {
            match self {
                Self::Text(text) => text,
                Self::Int(id) => id.to_string(),
                Self::Float(id) if id.is_finite() && id.fract() == 0.0 => {
                    trunc_f64_to_i64(id).to_string()
                }
                Self::Float(id) => id.to_string(),
            }
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IntInput {
        Int(i64),
        Float(f64),
        Text(String),
        Bool(bool),
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TruthyInput {
        Bool(bool),
        Int(i64),
        Float(f64),
        Text(String),
    }

    pub fn opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<IdInput>::deserialize(deserializer)?;
        Ok(value.map(IdInput::normalize))
    }

    pub fn id_list<'de, D>(deserializer: D) -> Result<ParticipantSet, D::Error>
    where
        D: Deserializer<'de>,
    {
        let values = Option::<Vec<IdInput>>::deserialize(deserializer)?;
        Ok(values
            .unwrap_or_default()
            .into_iter()
            .map(IdInput::normalize)
            .collect())
    }

    pub fn opt_id_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let values = Option::<Vec<IdInput>>::deserialize(deserializer)?;
        Ok(values.map(|ids| ids.into_iter().map(IdInput::normalize).collect()))
    }

    pub fn opt_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<IntInput>::deserialize(deserializer)?;
        Ok(value.and_then(|input| match input {
            IntInput::Int(n) => Some(n),
            IntInput::Float(n) if n.is_finite() => Some(trunc_f64_to_i64(n)),
            IntInput::Float(_) | IntInput::Bool(_) => None,
            IntInput::Text(text) => parse_int_prefix(&text),
        }))
    }

    pub fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<TruthyInput>::deserialize(deserializer)?;
        Ok(match value {
            None => false,
            Some(TruthyInput::Bool(flag)) => flag,
            Some(TruthyInput::Int(n)) => n != 0,
            Some(TruthyInput::Float(n)) => n != 0.0 && !n.is_nan(),
            Some(TruthyInput::Text(text)) => !text.is_empty(),
        })
    }
}

/// One episode of the chain.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Jump {
    #[serde(default)]
    pub name: Option<String>,
    /// Present and non-null when this jump is a supplement attached to a
    /// primary jump.
    #[serde(rename = "parentJump", default, deserialize_with = "flex::opt_id")]
    pub parent_jump: Option<String>,
    /// Authored length of the jump, not necessarily normalized.
    #[serde(default)]
    pub duration: ChainDuration,
    /// Companions present in this jump. An absent roster means no
    /// companions participate; the main character participates regardless.
    #[serde(default, deserialize_with = "flex::id_list")]
    pub characters: ParticipantSet,
}

impl Jump {
    #[must_use]
    pub fn is_supplement(&self) -> bool {
        self.parent_jump.is_some()
    }
}

/// A character defined in the save. The map key is the id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Character {
    #[serde(default)]
    pub name: Option<String>,
    /// Age before the chain began. Newer exports write `originalAge`,
    /// older ones wrote `age`, and either may be a number or a string.
    #[serde(rename = "originalAge", default, deserialize_with = "flex::opt_int")]
    pub original_age: Option<i64>,
    #[serde(default, deserialize_with = "flex::opt_int")]
    pub age: Option<i64>,
}

impl Character {
    /// Pre-chain age, defaulting to 0 when neither spelling parses.
    #[must_use]
    pub fn starting_age(&self) -> i64 {
        self.original_age.or(self.age).unwrap_or(0)
    }
}

/// Purchase category as written on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseKind {
    Item,
    AltForm,
    Drawback,
}

impl PurchaseKind {
    /// Map a wire `_type` code. Unknown codes return `None` and the record
    /// is skipped by the classifier.
    #[must_use]
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Item),
            2 => Some(Self::AltForm),
            3 => Some(Self::Drawback),
            _ => None,
        }
    }
}

/// A purchase record. The map key is the purchase id, which the tally
/// passes never use.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Purchase {
    #[serde(rename = "_characterId", default, deserialize_with = "flex::opt_id")]
    pub character_id: Option<String>,
    #[serde(rename = "_jumpId", default, deserialize_with = "flex::opt_id")]
    pub jump_id: Option<String>,
    #[serde(rename = "_type", default, deserialize_with = "flex::opt_int")]
    pub type_code: Option<i64>,
    /// Truthy when the purchase lasts only for its jump. Temporary items
    /// never count toward item tallies.
    #[serde(rename = "duration", default, deserialize_with = "flex::truthy")]
    pub temporary: bool,
}

impl Purchase {
    #[must_use]
    pub fn kind(&self) -> Option<PurchaseKind> {
        self.type_code.and_then(PurchaseKind::from_code)
    }
}

/// A dedicated alternate-form record from the richer save variant.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AltForm {
    #[serde(rename = "characterId", default, deserialize_with = "flex::opt_id")]
    pub character_id: Option<String>,
    #[serde(rename = "jumpId", default, deserialize_with = "flex::opt_id")]
    pub jump_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Traversal order for accumulation passes, plus where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JumpOrder {
    pub ids: Vec<String>,
    /// False when the save lacked `jumpList` and sorted jump keys were used
    /// instead. Order-sensitive results are best-effort in that case.
    pub declared: bool,
}

/// A parsed save document.
///
/// Sections are keyed by id. `BTreeMap` keeps iteration deterministic so a
/// save without a declared `jumpList` still tallies reproducibly.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChainSave {
    #[serde(default)]
    pub jumps: BTreeMap<String, Jump>,
    #[serde(default)]
    pub characters: BTreeMap<String, Character>,
    #[serde(default)]
    pub purchases: BTreeMap<String, Purchase>,
    #[serde(default)]
    pub altforms: BTreeMap<String, AltForm>,
    /// Authored traversal order. Entries may reference jumps that are
    /// missing from `jumps`; those still produce rows with zero counts.
    #[serde(rename = "jumpList", default, deserialize_with = "flex::opt_id_list")]
    pub jump_list: Option<Vec<String>>,
}

impl ChainSave {
    /// Parse an exported save document. Missing sections default to empty;
    /// a document that is not JSON of the expected shape is rejected whole.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error when parsing fails.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Display name for a jump, synthesized when the jump is unknown or
    /// unnamed.
    #[must_use]
    pub fn jump_name(&self, id: &str) -> String {
        self.jumps
            .get(id)
            .and_then(|jump| jump.name.clone())
            .unwrap_or_else(|| format!("Jump {id}"))
    }

    /// Display name for a character, synthesized when unknown or unnamed.
    #[must_use]
    pub fn character_name(&self, id: &str) -> String {
        self.characters
            .get(id)
            .and_then(|character| character.name.clone())
            .unwrap_or_else(|| format!("Character {id}"))
    }

    /// Whether the jump exists and is a supplement.
    #[must_use]
    pub fn is_supplement(&self, id: &str) -> bool {
        self.jumps.get(id).is_some_and(Jump::is_supplement)
    }

    /// Parent jump id when the jump is a supplement.
    #[must_use]
    pub fn parent_of(&self, id: &str) -> Option<&str> {
        self.jumps.get(id).and_then(|jump| jump.parent_jump.as_deref())
    }

    /// Pre-chain age for a character, 0 when the character is unknown.
    #[must_use]
    pub fn starting_age_of(&self, id: &str) -> i64 {
        self.characters.get(id).map_or(0, Character::starting_age)
    }

    /// Whether a character participates in a jump. The main character is
    /// part of every jump; companions only where the roster lists them.
    #[must_use]
    pub fn is_participant(&self, character_id: &str, jump_id: &str) -> bool {
        if character_id == MAIN_CHARACTER_ID {
            return true;
        }
        self.jumps
            .get(jump_id)
            .is_some_and(|jump| jump.characters.iter().any(|id| id == character_id))
    }

    /// Traversal order for accumulation passes: the declared `jumpList`
    /// when present, otherwise sorted jump keys flagged as a fallback.
    #[must_use]
    pub fn jump_order(&self) -> JumpOrder {
        match &self.jump_list {
            Some(ids) => JumpOrder {
                ids: ids.clone(),
                declared: true,
            },
            None => JumpOrder {
                ids: self.jumps.keys().cloned().collect(),
                declared: false,
            },
        }
    }
}

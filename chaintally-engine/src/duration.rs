//! Chain-time arithmetic: year/month/day triples on a flat calendar.
//!
//! Chain time deliberately ignores real calendars. A month is always 30
//! days and a year is always 12 months, so durations authored on different
//! jumps can be summed component-wise and re-normalized without drift.

use serde::{Deserialize, Serialize};

use crate::numbers::{clean_float_noise, floor_f64_to_i64, i64_to_f64};

/// A duration or age expressed in chain time.
///
/// Days may be fractional; years and months are whole. Values returned by
/// [`ChainDuration::normalized`] satisfy `0 <= months < 12` and
/// `0 <= days < 30` whenever the total is non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChainDuration {
    #[serde(default)]
    pub years: i64,
    #[serde(default)]
    pub months: i64,
    #[serde(default)]
    pub days: f64,
}

/// The renderings a duration is displayed with, bundled for row emission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationText {
    /// Abbreviated form, `"2y 3m 15d"`; empty when the duration is zero.
    pub compact: String,
    /// Spelled-out form with the day value exactly as stored.
    pub verbose: String,
    /// Spelled-out form with float noise snapped away from the day value.
    pub verbose_clean: String,
}

impl ChainDuration {
    pub const ZERO: Self = Self {
        years: 0,
        months: 0,
        days: 0.0,
    };

    #[must_use]
    pub const fn new(years: i64, months: i64, days: f64) -> Self {
        Self {
            years,
            months,
            days,
        }
    }

    /// True when every component is zero, treating day float noise as zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.years == 0 && self.months == 0 && clean_float_noise(self.days) == 0.0
    }

    /// Carry day overflow into months and month overflow into years.
    ///
    /// Floor semantics throughout, so a net-negative duration normalizes to
    /// negative years with in-range month and day components instead of
    /// being clamped. Carry arithmetic saturates at the i64 extremes.
    /// Authored jump durations are expected to be non-negative; negative
    /// inputs only arise from hand-edited saves.
    #[must_use]
    pub fn normalized(self) -> Self {
        let day_carry = floor_f64_to_i64(self.days / 30.0);
        let days = self.days - i64_to_f64(day_carry) * 30.0;
        let months = self.months.saturating_add(day_carry);
        let year_carry = months.div_euclid(12);
        Self {
            years: self.years.saturating_add(year_carry),
            months: months.rem_euclid(12),
            days,
        }
    }

    /// Component-wise saturating sum, normalized.
    #[must_use]
    pub fn plus(self, other: Self) -> Self {
        Self {
            years: self.years.saturating_add(other.years),
            months: self.months.saturating_add(other.months),
            days: self.days + other.days,
        }
        .normalized()
    }

    /// Abbreviated rendering, `"2y 3m 15d"`. Zero components are omitted
    /// and an all-zero duration renders as the empty string. The day value
    /// is noise-cleaned before display.
    #[must_use]
    pub fn compact(&self) -> String {
        let mut parts = Vec::with_capacity(3);
        if self.years != 0 {
            parts.push(format!("{}y", self.years));
        }
        if self.months != 0 {
            parts.push(format!("{}m", self.months));
        }
        let days = clean_float_noise(self.days);
        if days != 0.0 {
            parts.push(format!("{}d", format_days(days)));
        }
        parts.join(" ")
    }

    /// Spelled-out rendering, `"2 years, 3 months, 15 days"`, with singular
    /// unit names for unit components and `"0 days"` when everything is
    /// zero. The day value is shown exactly as stored, which keeps
    /// accumulated float noise visible for diagnostics.
    #[must_use]
    pub fn verbose(&self) -> String {
        self.render_verbose(self.days)
    }

    /// Spelled-out rendering with the day value noise-cleaned first.
    #[must_use]
    pub fn verbose_clean(&self) -> String {
        self.render_verbose(clean_float_noise(self.days))
    }

    /// All display renderings of this duration.
    #[must_use]
    pub fn text_set(&self) -> DurationText {
        DurationText {
            compact: self.compact(),
            verbose: self.verbose(),
            verbose_clean: self.verbose_clean(),
        }
    }

    fn render_verbose(&self, days: f64) -> String {
        let mut parts = Vec::with_capacity(3);
        if self.years != 0 {
            parts.push(format!("{} {}", self.years, plural("year", self.years == 1)));
        }
        if self.months != 0 {
            parts.push(format!("{} {}", self.months, plural("month", self.months == 1)));
        }
        if days != 0.0 {
            parts.push(format!("{} {}", format_days(days), plural("day", days == 1.0)));
        }
        if parts.is_empty() {
            return "0 days".to_string();
        }
        parts.join(", ")
    }
}

fn plural(unit: &str, singular: bool) -> String {
    if singular {
        unit.to_string()
    } else {
        format!("{unit}s")
    }
}

/// Render a day count without a trailing `.0` when it is whole.
fn format_days(days: f64) -> String {
    if days.fract() == 0.0 {
        floor_f64_to_i64(days).to_string()
    } else {
        days.to_string()
    }
}

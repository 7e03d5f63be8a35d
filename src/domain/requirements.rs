//! User requirement records gathered during the scoping conversation

use serde::{Deserialize, Serialize};

/// Structured search requirements accumulated across scoping turns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Requirements {
    /// Minimum budget in whole dollars
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_min: Option<u64>,
    /// Maximum budget in whole dollars
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_max: Option<u64>,
    /// Desired bedroom count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u32>,
    /// Desired bathroom count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<u32>,
    /// Target city or area, free text
    #[serde(default)]
    pub location: String,
    /// Free-text preferences that don't fit the structured fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
}

/// Partial requirements extracted from a single turn.
///
/// Every field is optional: an absent field means the turn said nothing
/// about it, and merging must leave the existing value alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequirementsPatch {
    pub budget_min: Option<u64>,
    pub budget_max: Option<u64>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub location: Option<String>,
    pub additional_info: Option<String>,
}

impl Requirements {
    /// Deterministic completion predicate: at least one budget bound, a
    /// bedroom count, and a location. Bathrooms are nice-to-have and do not
    /// gate research.
    pub fn is_complete(&self) -> bool {
        (self.budget_min.is_some() || self.budget_max.is_some())
            && self.bedrooms.is_some()
            && !self.location.trim().is_empty()
    }

    /// Merge a per-turn extraction into the accumulated record.
    ///
    /// Only fields the patch actually carries are written; a turn that did
    /// not mention a field never clears it.
    pub fn merge(&mut self, patch: RequirementsPatch) {
        if patch.budget_min.is_some() {
            self.budget_min = patch.budget_min;
        }
        if patch.budget_max.is_some() {
            self.budget_max = patch.budget_max;
        }
        if patch.bedrooms.is_some() {
            self.bedrooms = patch.bedrooms;
        }
        if patch.bathrooms.is_some() {
            self.bathrooms = patch.bathrooms;
        }
        if let Some(location) = patch.location {
            if !location.trim().is_empty() {
                self.location = location;
            }
        }
        if let Some(info) = patch.additional_info {
            if !info.trim().is_empty() {
                self.additional_info = Some(info);
            }
        }
    }

    /// Human-readable one-liner used in prompts and summaries,
    /// e.g. "Oakland, 3 bedrooms, 2 bathrooms, budget under $800k".
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if !self.location.is_empty() {
            parts.push(self.location.clone());
        }
        if let Some(beds) = self.bedrooms {
            parts.push(format!("{} bedrooms", beds));
        }
        if let Some(baths) = self.bathrooms {
            parts.push(format!("{} bathrooms", baths));
        }
        if let Some(max) = self.budget_max {
            parts.push(format!("budget under {}", format_price(max)));
        } else if let Some(min) = self.budget_min {
            parts.push(format!("budget above {}", format_price(min)));
        }
        parts.join(", ")
    }
}

/// Format a dollar amount the way listing sites abbreviate them
/// ("$800k", "$1.5M").
pub fn format_price(amount: u64) -> String {
    if amount >= 1_000_000 {
        let millions = amount as f64 / 1_000_000.0;
        format!("${:.1}M", millions)
    } else if amount >= 1_000 {
        format!("${}k", amount / 1_000)
    } else {
        format!("${}", amount)
    }
}

//! Plate schema classification and canonical formatting.

use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 3 letters followed by 4 digits, optional separator: ABC-1234
const L3N4_PATTERN: &str = r"^([A-Z]{3})[- ]?(\d{4})$";

/// 4 digits followed by 3 letters, optional separator: 1234 ABC
const N4L3_PATTERN: &str = r"^(\d{4})[- ]?([A-Z]{3})$";

/// Significant characters in every recognized plate.
pub const PLATE_LEN: usize = 7;

/// Minimum letters and digits a MIXED plate must contain.
const MIXED_MIN_LETTERS: usize = 3;
const MIXED_MIN_DIGITS: usize = 3;

/// Recognized character layouts, tested in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlateSchema {
    #[serde(rename = "L3N4")]
    L3N4,
    #[serde(rename = "N4L3")]
    N4L3,
    #[serde(rename = "MIXED")]
    Mixed,
}

impl fmt::Display for PlateSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlateSchema::L3N4 => write!(f, "L3N4"),
            PlateSchema::N4L3 => write!(f, "N4L3"),
            PlateSchema::Mixed => write!(f, "MIXED"),
        }
    }
}

/// Which schemas the normalizer accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatPolicy {
    /// Only the canonical 4 digits + 3 letters layout.
    Strict,
    /// L3N4, N4L3 and MIXED.
    #[default]
    Permissive,
}

/// Canonical plate text plus the schema it matched.
///
/// `"NNNN LLL"` for L3N4/N4L3, the raw 7-character string for MIXED.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedPlate {
    text: String,
    schema: PlateSchema,
}

impl NormalizedPlate {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn schema(&self) -> PlateSchema {
        self.schema
    }

    /// The 4-digit block for L3N4/N4L3 plates.
    pub fn digit_group(&self) -> Option<&str> {
        match self.schema {
            PlateSchema::L3N4 | PlateSchema::N4L3 => self.text.get(..4),
            PlateSchema::Mixed => None,
        }
    }

    /// Letters and digits only, separators dropped.
    pub fn significant_chars(&self) -> String {
        self.text.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
    }
}

impl fmt::Display for NormalizedPlate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Classifies text against the plate schemas and rewrites it canonically.
#[derive(Debug, Clone)]
pub struct PlateFormatNormalizer {
    policy: FormatPolicy,
    l3n4: Regex,
    n4l3: Regex,
}

impl PlateFormatNormalizer {
    pub fn new(policy: FormatPolicy) -> Result<Self> {
        Ok(Self {
            policy,
            l3n4: Regex::new(L3N4_PATTERN)?,
            n4l3: Regex::new(N4L3_PATTERN)?,
        })
    }

    /// Returns the canonical plate, or `None` if no accepted schema matches.
    ///
    /// Input is upper-cased and stripped of everything except letters,
    /// digits, `-` and spaces. L3N4 and N4L3 are tried on that text and
    /// then on the text with all separators removed, so a stray separator
    /// never demotes a plate to MIXED.
    pub fn normalize(&self, text: &str) -> Option<NormalizedPlate> {
        let clean: String = text
            .to_uppercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == ' ')
            .collect();
        let clean = clean.trim();
        let compact: String = clean.chars().filter(|c| *c != '-' && *c != ' ').collect();

        if let Some(plate) = self.match_layout(clean).or_else(|| self.match_layout(&compact)) {
            if self.policy == FormatPolicy::Strict && plate.schema != PlateSchema::N4L3 {
                return None;
            }
            return Some(plate);
        }

        if self.policy == FormatPolicy::Strict || compact.len() != PLATE_LEN {
            return None;
        }
        let letters = compact.chars().filter(|c| c.is_ascii_uppercase()).count();
        let digits = compact.chars().filter(|c| c.is_ascii_digit()).count();
        if letters >= MIXED_MIN_LETTERS && digits >= MIXED_MIN_DIGITS {
            return Some(NormalizedPlate {
                text: compact,
                schema: PlateSchema::Mixed,
            });
        }

        None
    }

    /// L3N4 first, then N4L3; both rewritten as "NNNN LLL".
    fn match_layout(&self, text: &str) -> Option<NormalizedPlate> {
        if let Some(caps) = self.l3n4.captures(text) {
            return Some(NormalizedPlate {
                text: format!("{} {}", &caps[2], &caps[1]),
                schema: PlateSchema::L3N4,
            });
        }

        self.n4l3.captures(text).map(|caps| NormalizedPlate {
            text: format!("{} {}", &caps[1], &caps[2]),
            schema: PlateSchema::N4L3,
        })
    }
}

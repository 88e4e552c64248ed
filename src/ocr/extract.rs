use anyhow::Result;
use regex::{Regex, RegexBuilder};

use super::engine::RawLine;
use super::preprocess::StrategyKind;

/// Words printed on Bolivian plates that are never part of the registration.
pub const BOILERPLATE_TOKENS: [&str; 4] = ["BOLIVIA", "ESTADO", "PLURINACIONAL", "DEPARTAMENTO"];

/// Lines shorter than this (after trimming) are OCR noise.
const MIN_RAW_LEN: usize = 3;

/// A cleaned OCR line, tagged with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedText {
    /// Line as the OCR engine emitted it
    pub raw: String,
    /// Upper-cased ASCII letters and digits only
    pub cleaned: String,
    pub strategy: StrategyKind,
    pub config_id: String,
    /// Mean word confidence reported for the line (0-100)
    pub confidence: f32,
}

/// Turns raw OCR lines into cleaned alphanumeric strings.
#[derive(Debug, Clone)]
pub struct CandidateExtractor {
    denylist: Option<Regex>,
}

impl CandidateExtractor {
    /// Builds an extractor rejecting lines that contain any of `tokens`
    /// (case-insensitive substring match).
    pub fn new<S: AsRef<str>>(tokens: &[S]) -> Result<Self> {
        let alternatives: Vec<String> = tokens
            .iter()
            .map(|t| t.as_ref().trim())
            .filter(|t| !t.is_empty())
            .map(regex::escape)
            .collect();

        let denylist = if alternatives.is_empty() {
            None
        } else {
            Some(
                RegexBuilder::new(&alternatives.join("|"))
                    .case_insensitive(true)
                    .build()?,
            )
        };

        Ok(Self { denylist })
    }

    pub fn is_boilerplate(&self, line: &str) -> bool {
        self.denylist.as_ref().is_some_and(|re| re.is_match(line))
    }

    /// Cleans every usable line from one (strategy, config) OCR call.
    pub fn extract(
        &self,
        lines: &[RawLine],
        strategy: StrategyKind,
        config_id: &str,
    ) -> Vec<ExtractedText> {
        let mut extracted = Vec::new();

        for line in lines {
            let trimmed = line.text.trim();
            if trimmed.chars().count() < MIN_RAW_LEN {
                continue;
            }
            if self.is_boilerplate(trimmed) {
                continue;
            }

            let cleaned = clean_text(trimmed);
            if cleaned.is_empty() {
                continue;
            }

            extracted.push(ExtractedText {
                raw: line.text.clone(),
                cleaned,
                strategy,
                config_id: config_id.to_string(),
                confidence: line.confidence,
            });
        }

        extracted
    }
}

impl Default for CandidateExtractor {
    fn default() -> Self {
        // Escaped literal tokens always compile
        Self::new(&BOILERPLATE_TOKENS).unwrap_or(Self { denylist: None })
    }
}

/// Keeps ASCII letters and digits, upper-cased.
pub fn clean_text(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(texts: &[&str]) -> Vec<RawLine> {
        texts.iter().map(|t| RawLine::new(*t)).collect()
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("12S4 4BC"), "12S44BC");
        assert_eq!(clean_text(" 1234-abc\n"), "1234ABC");
        assert_eq!(clean_text("|@#"), "");
        assert_eq!(clean_text("ÑANDÚ 12"), "AND12");
    }

    #[test]
    fn test_extract_tags_origin() {
        let extractor = CandidateExtractor::default();
        let result = extractor.extract(&lines(&["12S4 4BC"]), StrategyKind::Region, "psm7-whitelist");

        assert_eq!(
            result,
            vec![ExtractedText {
                raw: "12S4 4BC".to_string(),
                cleaned: "12S44BC".to_string(),
                strategy: StrategyKind::Region,
                config_id: "psm7-whitelist".to_string(),
                confidence: 0.0,
            }]
        );
    }

    #[test]
    fn test_extract_keeps_line_confidence() {
        let extractor = CandidateExtractor::default();
        let line = RawLine {
            text: "4143 FZP".to_string(),
            confidence: 91.5,
        };
        let result = extractor.extract(&[line], StrategyKind::Enhanced, "psm8-whitelist");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].confidence, 91.5);
    }

    #[test]
    fn test_boilerplate_is_rejected_case_insensitively() {
        let extractor = CandidateExtractor::default();
        let result = extractor.extract(
            &lines(&["BOLIVIA", "Estado Plurinacional", "departamento LP", "1234 ABC"]),
            StrategyKind::Original,
            "psm6-whitelist",
        );
        let cleaned: Vec<&str> = result.iter().map(|e| e.cleaned.as_str()).collect();
        assert_eq!(cleaned, vec!["1234ABC"]);
    }

    #[test]
    fn test_short_and_empty_lines_are_skipped() {
        let extractor = CandidateExtractor::default();
        let result = extractor.extract(
            &lines(&["", "   ", "AB", " 1 ", "+-=*", "ABC"]),
            StrategyKind::Original,
            "psm8-whitelist",
        );
        let cleaned: Vec<&str> = result.iter().map(|e| e.cleaned.as_str()).collect();
        assert_eq!(cleaned, vec!["ABC"]);
    }

    #[test]
    fn test_each_line_is_a_separate_candidate() {
        let extractor = CandidateExtractor::default();
        let result = extractor.extract(&lines(&["1234 ABC", "5678 XYZ"]), StrategyKind::Enhanced, "psm6-whitelist");
        assert_eq!(result.len(), 2);
        assert_eq!(result[1].cleaned, "5678XYZ");
    }

    #[test]
    fn test_custom_denylist() {
        let extractor = CandidateExtractor::new(&["a.b".to_string()]).unwrap();
        assert!(extractor.is_boilerplate("xxA.Byy"));
        // Tokens are literal, not patterns
        assert!(!extractor.is_boilerplate("AXB"));

        let open = CandidateExtractor::new::<&str>(&[]).unwrap();
        assert!(!open.is_boilerplate("BOLIVIA"));
    }
}

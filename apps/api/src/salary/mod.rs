//! Salary normalization: turns free-text salary fields into one annual integer.
//!
//! Parsing is an ordered list of rules (see `rules.rs`); the first rule that
//! produces a value wins. Unparseable input maps to 0, which always means
//! "unknown" in the posting model, never a genuinely advertised zero.

pub mod handlers;
pub mod rules;

use serde::Serialize;

pub use rules::SalaryRuleKind;

/// 40 hours/week × 52 weeks/year.
pub const HOURS_PER_YEAR: f64 = 2080.0;

/// Result of normalizing one salary string, with the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SalaryParse {
    pub annual: u64,
    /// `None` when no rule matched (annual is then 0).
    pub rule: Option<SalaryRuleKind>,
}

impl SalaryParse {
    const UNKNOWN: SalaryParse = SalaryParse {
        annual: 0,
        rule: None,
    };
}

/// Normalizes a raw salary field to a canonical annual amount. Never fails.
pub fn normalize(raw: Option<&str>) -> u64 {
    parse(raw).annual
}

/// Like [`normalize`], but also reports which precedence rule fired.
pub fn parse(raw: Option<&str>) -> SalaryParse {
    let Some(raw) = raw else {
        return SalaryParse::UNKNOWN;
    };

    let text = SalaryText::new(raw);
    for rule in rules::RULES.iter() {
        if let Some(annual) = rule.apply(&text) {
            return SalaryParse {
                annual,
                rule: Some(rule.kind),
            };
        }
    }

    SalaryParse::UNKNOWN
}

/// Preprocessed salary text shared by every rule.
#[derive(Debug)]
pub(crate) struct SalaryText {
    /// Lower-cased, commas stripped, dashes normalized and collapsed.
    pub cleaned: String,
    /// Whether a literal `k` appears anywhere in the lower-cased input.
    pub has_k_marker: bool,
}

impl SalaryText {
    fn new(raw: &str) -> Self {
        let lowered = raw.to_lowercase().replace(',', "");
        let has_k_marker = lowered.contains('k');

        let mut cleaned = String::with_capacity(lowered.len());
        for ch in lowered.chars() {
            let ch = if is_dash(ch) { '-' } else { ch };
            if ch == '-' && cleaned.ends_with('-') {
                continue;
            }
            cleaned.push(ch);
        }

        SalaryText {
            cleaned,
            has_k_marker,
        }
    }
}

fn is_dash(ch: char) -> bool {
    matches!(ch, '\u{2010}'..='\u{2015}' | '\u{2212}' | '\u{FE58}' | '\u{FE63}' | '\u{FF0D}')
}

/// Float → non-negative integer. `as` saturates, so huge values clamp to `u64::MAX`.
pub(crate) fn to_annual(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value as u64
    } else {
        0
    }
}

//! Ordered salary rules. Precedence is the order of [`RULES`].

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::{to_annual, SalaryText, HOURS_PER_YEAR};

const NUMBER: &str = r"(\d+\.?\d*)";
const HOURLY_UNIT: &str = r"\s*\$?(?:an hour|per hour|/hour|/hr|/h|ph|hr)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SalaryRuleKind {
    HourlyRange,
    HourlySingle,
    AnnualRange,
    ThousandsSingle,
    BareNumbers,
}

type Extractor = fn(&Regex, &SalaryText) -> Option<u64>;

/// One `(pattern, extractor)` step of the cascade.
pub struct SalaryRule {
    pub kind: SalaryRuleKind,
    pattern: Regex,
    extract: Extractor,
}

impl SalaryRule {
    fn new(kind: SalaryRuleKind, pattern: &str, extract: Extractor) -> Self {
        SalaryRule {
            kind,
            // Patterns are compile-time constants; a bad one is a programming error.
            pattern: Regex::new(pattern).expect("salary rule pattern must compile"),
            extract,
        }
    }

    pub(crate) fn apply(&self, text: &SalaryText) -> Option<u64> {
        (self.extract)(&self.pattern, text)
    }
}

pub static RULES: LazyLock<Vec<SalaryRule>> = LazyLock::new(|| {
    vec![
        SalaryRule::new(
            SalaryRuleKind::HourlyRange,
            &format!(r"{NUMBER}\s*(?:-|to)\s*\$?{NUMBER}{HOURLY_UNIT}"),
            hourly_range,
        ),
        SalaryRule::new(
            SalaryRuleKind::HourlySingle,
            &format!("{NUMBER}{HOURLY_UNIT}"),
            hourly_single,
        ),
        SalaryRule::new(
            SalaryRuleKind::AnnualRange,
            &format!(r"{NUMBER}\s*k?\s*-\s*\$?{NUMBER}\s*k?"),
            annual_range,
        ),
        SalaryRule::new(
            SalaryRuleKind::ThousandsSingle,
            &format!(r"{NUMBER}\s*k"),
            thousands_single,
        ),
        SalaryRule::new(SalaryRuleKind::BareNumbers, NUMBER, bare_numbers),
    ]
});

fn captured_pair(pattern: &Regex, text: &SalaryText) -> Option<(f64, f64)> {
    let caps = pattern.captures(&text.cleaned)?;
    let first = caps.get(1)?.as_str().parse::<f64>().ok()?;
    let second = caps.get(2)?.as_str().parse::<f64>().ok()?;
    Some((first, second))
}

fn captured_single(pattern: &Regex, text: &SalaryText) -> Option<f64> {
    let caps = pattern.captures(&text.cleaned)?;
    caps.get(1)?.as_str().parse::<f64>().ok()
}

fn hourly_range(pattern: &Regex, text: &SalaryText) -> Option<u64> {
    let (low, high) = captured_pair(pattern, text)?;
    Some(to_annual(((low + high) / 2.0 * HOURS_PER_YEAR).round()))
}

fn hourly_single(pattern: &Regex, text: &SalaryText) -> Option<u64> {
    let rate = captured_single(pattern, text)?;
    Some(to_annual((rate * HOURS_PER_YEAR).round()))
}

fn annual_range(pattern: &Regex, text: &SalaryText) -> Option<u64> {
    let (mut a, mut b) = captured_pair(pattern, text)?;
    if text.has_k_marker {
        a *= 1000.0;
        b *= 1000.0;
    }
    Some(floor_midpoint(a.min(b), a.max(b)))
}

fn thousands_single(pattern: &Regex, text: &SalaryText) -> Option<u64> {
    let value = captured_single(pattern, text)?;
    Some(to_annual((value * 1000.0).round()))
}

fn bare_numbers(pattern: &Regex, text: &SalaryText) -> Option<u64> {
    let nums: Vec<f64> = pattern
        .find_iter(&text.cleaned)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .collect();

    match nums.as_slice() {
        [] => None,
        [single] => {
            let salary = if *single < 1000.0 {
                single * 1000.0
            } else {
                *single
            };
            Some(to_annual(salary.floor()))
        }
        _ => {
            let mut low = nums.iter().copied().fold(f64::INFINITY, f64::min);
            let mut high = nums.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            // Small numbers are assumed to be quoted in thousands.
            if high < 1000.0 {
                low *= 1000.0;
                high *= 1000.0;
            }
            Some(floor_midpoint(low, high))
        }
    }
}

fn floor_midpoint(low: f64, high: f64) -> u64 {
    to_annual(((low + high) / 2.0).floor())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(kind: SalaryRuleKind, raw: &str) -> Option<u64> {
        let rule = RULES.iter().find(|r| r.kind == kind).unwrap();
        rule.apply(&SalaryText::new(raw))
    }

    #[test]
    fn test_rules_are_in_precedence_order() {
        let kinds: Vec<SalaryRuleKind> = RULES.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SalaryRuleKind::HourlyRange,
                SalaryRuleKind::HourlySingle,
                SalaryRuleKind::AnnualRange,
                SalaryRuleKind::ThousandsSingle,
                SalaryRuleKind::BareNumbers,
            ]
        );
    }

    #[test]
    fn test_hourly_units_recognized() {
        for raw in ["30 an hour", "30 per hour", "30/hour", "30/hr", "30/h", "30ph", "30 hr"] {
            assert_eq!(apply(SalaryRuleKind::HourlySingle, raw), Some(62_400), "{raw}");
        }
    }

    #[test]
    fn test_hourly_range_accepts_to_marker() {
        assert_eq!(apply(SalaryRuleKind::HourlyRange, "25 to 35 /hr"), Some(62_400));
    }

    #[test]
    fn test_annual_range_rule_in_isolation() {
        assert_eq!(apply(SalaryRuleKind::AnnualRange, "90-110"), Some(100));
        assert_eq!(apply(SalaryRuleKind::AnnualRange, "90k-110k"), Some(100_000));
        assert_eq!(apply(SalaryRuleKind::AnnualRange, "no range here"), None);
    }

    #[test]
    fn test_bare_numbers_scales_small_ranges() {
        assert_eq!(apply(SalaryRuleKind::BareNumbers, "80 or 120"), Some(100_000));
        assert_eq!(apply(SalaryRuleKind::BareNumbers, "999 or 1500"), Some(1_249));
        assert_eq!(apply(SalaryRuleKind::BareNumbers, "none"), None);
    }
}

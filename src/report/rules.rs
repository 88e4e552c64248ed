//! Human-readable description of the active restriction rules.

use std::fmt::Write;

use crate::restriction::{TimePolicy, RESTRICTED_DIGITS, WEEKDAY_NAMES};

pub fn describe_rules(policy: TimePolicy) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Restricted plate endings by weekday:");
    for (day, pair) in RESTRICTED_DIGITS.iter().enumerate() {
        let _ = writeln!(out, "  {:<10} {} and {}", WEEKDAY_NAMES[day], pair[0], pair[1]);
    }
    let _ = writeln!(out, "  {:<10} no restriction", "Weekends");
    let _ = writeln!(out);
    let _ = writeln!(out, "Restricted hours ({} policy, inclusive):", policy);
    for window in policy.windows() {
        let _ = writeln!(out, "  {:<26} {}", window.label, window.span());
    }
    out
}

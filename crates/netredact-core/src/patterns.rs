//! Compiled identifier patterns.
//!
//! All patterns run on the linear-time `regex` engine, so no input can
//! trigger catastrophic backtracking. IPv6 must be scanned before IPv4:
//! the IPv4-mapped form `::ffff:a.b.c.d` embeds a dotted quad that the
//! IPv4 pattern would otherwise consume on its own.

use once_cell::sync::Lazy;
use regex::Regex;

/// A single bounded IPv4 octet, 0-255.
const OCTET: &str = r"(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)";

/// IPv4: four bounded octets with word boundaries.
pub static IPV4_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\b(?:{OCTET}\.){{3}}{OCTET}\b")).expect("valid IPv4 pattern")
});

/// MAC: six hex pairs separated by `:` or `-`.
pub static MAC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:[0-9a-fA-F]{2}[:\-]){5}[0-9a-fA-F]{2}\b").expect("valid MAC pattern")
});

/// IPv6: full form, every `::` compression position, bare `::`, and the
/// IPv4-mapped `::ffff:a.b.c.d` form.
///
/// The `regex` crate has no look-around, so the boundary rule (a match
/// may not be preceded or followed by `:` or a word character) is
/// enforced separately by the engine's scanner rather than in-pattern.
pub static IPV6_RE: Lazy<Regex> = Lazy::new(|| {
    let group = r"[0-9a-fA-F]{1,4}";
    let pattern = format!(
        "(?:\
::ffff:(?:{OCTET}\\.){{3}}{OCTET}\
|(?:{group}:){{7}}{group}\
|(?:{group}:){{1,6}}:{group}\
|(?:{group}:){{1,5}}(?::{group}){{1,2}}\
|(?:{group}:){{1,4}}(?::{group}){{1,3}}\
|(?:{group}:){{1,3}}(?::{group}){{1,4}}\
|(?:{group}:){{1,2}}(?::{group}){{1,5}}\
|{group}:(?::{group}){{1,6}}\
|:(?::{group}){{1,7}}\
|(?:{group}:){{1,7}}:\
|::\
)"
    );
    Regex::new(&pattern).expect("valid IPv6 pattern")
});

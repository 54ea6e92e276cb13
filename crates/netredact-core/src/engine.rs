//! Per-request redaction engine.

use crate::error::RedactError;
use crate::patterns::{IPV4_RE, IPV6_RE, MAC_RE};
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Context label mixed into the derived key by default. Changing the
/// label (or the secret) invalidates all prior replacement mappings.
pub const DEFAULT_CONTEXT: &str = "default";

/// Replacement mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedactMode {
    /// Each new value is drawn from a cryptographically secure source.
    #[default]
    Random,
    /// Replacements are a keyed function of the original value and a
    /// server secret, stable across requests and restarts.
    Deterministic,
}

impl RedactMode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Deterministic => "deterministic",
        }
    }
}

/// Identifier family of a recognized substring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierFamily {
    Ipv6,
    Ipv4,
    Mac,
}

impl IdentifierFamily {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ipv6 => "ipv6",
            Self::Ipv4 => "ipv4",
            Self::Mac => "mac",
        }
    }
}

/// Per-request redaction engine.
///
/// Each instance owns a fresh mapping id and a private memo; nothing is
/// shared between instances, so concurrent requests cannot observe each
/// other's originals or replacements.
pub struct RedactorEngine {
    mapping_id: Uuid,
    mode: RedactMode,
    mapping: HashMap<String, String>,
    keyed_mac: Option<HmacSha256>,
}

impl RedactorEngine {
    /// Creates an engine for the given mode. Deterministic mode derives
    /// a per-instance key as `SHA256(secret || context)` and fails
    /// without a secret.
    pub fn new(
        mode: RedactMode,
        secret: Option<&[u8]>,
        context: &str,
    ) -> Result<Self, RedactError> {
        let keyed_mac = match mode {
            RedactMode::Deterministic => {
                let secret = secret.ok_or(RedactError::MissingSecret)?;
                let mut hasher = Sha256::new();
                hasher.update(secret);
                hasher.update(context.as_bytes());
                let derived = hasher.finalize();
                let mac = HmacSha256::new_from_slice(&derived)
                    .map_err(|_| RedactError::KeyDerivation)?;
                Some(mac)
            }
            RedactMode::Random => None,
        };

        Ok(Self {
            mapping_id: Uuid::new_v4(),
            mode,
            mapping: HashMap::new(),
            keyed_mac,
        })
    }

    /// Creates a random-mode engine. Needs no secret.
    #[must_use]
    pub fn random() -> Self {
        Self {
            mapping_id: Uuid::new_v4(),
            mode: RedactMode::Random,
            mapping: HashMap::new(),
            keyed_mac: None,
        }
    }

    /// The id under which this engine's mapping is stored.
    #[must_use]
    pub fn mapping_id(&self) -> Uuid {
        self.mapping_id
    }

    #[must_use]
    pub fn mode(&self) -> RedactMode {
        self.mode
    }

    /// Redacts all recognized identifiers in `text`.
    ///
    /// Returns the substituted text and a copy of the memo mapping each
    /// original to its replacement. A literal value occurring more than
    /// once receives the same replacement every time within this call.
    pub fn redact(&mut self, text: &str) -> (String, HashMap<String, String>) {
        let result = self.substitute(text, &IPV6_RE, IdentifierFamily::Ipv6);
        let result = self.substitute(&result, &IPV4_RE, IdentifierFamily::Ipv4);
        let result = self.substitute(&result, &MAC_RE, IdentifierFamily::Mac);
        (result, self.mapping.clone())
    }

    /// One substitution pass for a single family. IPv6 candidates get an
    /// extra boundary check since the pattern itself cannot express it.
    fn substitute(&mut self, text: &str, re: &Regex, family: IdentifierFamily) -> String {
        let check_boundaries = family == IdentifierFamily::Ipv6;
        let mut out = String::with_capacity(text.len());
        let mut copied = 0;
        let mut pos = 0;

        while pos <= text.len() {
            let Some(m) = re.find_at(text, pos) else { break };
            if check_boundaries && !ipv6_boundary_ok(text, m.start(), m.end()) {
                // Let shorter or later candidates at the next position
                // compete; the rejected span is still plain text.
                pos = m.start() + 1;
                continue;
            }
            out.push_str(&text[copied..m.start()]);
            let replacement = self.replacement_for(m.as_str(), family);
            out.push_str(&replacement);
            copied = m.end();
            pos = m.end().max(m.start() + 1);
        }

        out.push_str(&text[copied..]);
        out
    }

    /// Returns the memoized replacement for `original`, generating and
    /// recording a fresh one on first sight.
    fn replacement_for(&mut self, original: &str, family: IdentifierFamily) -> String {
        if let Some(existing) = self.mapping.get(original) {
            return existing.clone();
        }
        let replacement = match &self.keyed_mac {
            Some(mac) => deterministic_replacement(mac, original, family),
            None => random_replacement(family),
        };
        self.mapping.insert(original.to_string(), replacement.clone());
        replacement
    }
}

/// The IPv6 pattern must not border `:` or a word character, otherwise
/// fragments of longer tokens (or of other addresses) would match.
fn ipv6_boundary_ok(text: &str, start: usize, end: usize) -> bool {
    let blocked = |c: char| c == ':' || c == '_' || c.is_alphanumeric();
    let before_ok = !text[..start].chars().next_back().is_some_and(blocked);
    let after_ok = !text[end..].chars().next().is_some_and(blocked);
    before_ok && after_ok
}

/// HMAC-SHA256 of the original under the derived key, formatted into the
/// same address shape as the original family.
fn deterministic_replacement(
    proto: &HmacSha256,
    original: &str,
    family: IdentifierFamily,
) -> String {
    let mut mac = proto.clone();
    mac.update(original.as_bytes());
    let digest = mac.finalize().into_bytes();

    match family {
        IdentifierFamily::Ipv4 => {
            format!("{}.{}.{}.{}", digest[0], digest[1], digest[2], digest[3])
        }
        IdentifierFamily::Ipv6 => (0..8)
            .map(|i| {
                let group = (u16::from(digest[2 * i]) << 8) | u16::from(digest[2 * i + 1]);
                format!("{group:04x}")
            })
            .collect::<Vec<_>>()
            .join(":"),
        IdentifierFamily::Mac => digest[..6]
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect::<Vec<_>>()
            .join(":"),
    }
}

/// Uniform draw from the OS random source, one octet/group at a time.
fn random_replacement(family: IdentifierFamily) -> String {
    let mut rng = OsRng;
    match family {
        IdentifierFamily::Ipv4 => format!(
            "{}.{}.{}.{}",
            rng.gen::<u8>(),
            rng.gen::<u8>(),
            rng.gen::<u8>(),
            rng.gen::<u8>()
        ),
        IdentifierFamily::Ipv6 => (0..8)
            .map(|_| format!("{:04x}", rng.gen::<u16>()))
            .collect::<Vec<_>>()
            .join(":"),
        IdentifierFamily::Mac => (0..6)
            .map(|_| format!("{:02x}", rng.gen::<u8>()))
            .collect::<Vec<_>>()
            .join(":"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::{IPV4_RE, IPV6_RE, MAC_RE};

    const SECRET: &[u8] = b"unit-test-deterministic-secret-000000";

    fn deterministic() -> RedactorEngine {
        RedactorEngine::new(RedactMode::Deterministic, Some(SECRET), DEFAULT_CONTEXT)
            .expect("secret provided")
    }

    #[test]
    fn single_ipv4_is_replaced() {
        let mut engine = RedactorEngine::random();
        let (result, mapping) = engine.redact("Host 192.168.1.10 is up");
        assert!(!result.contains("192.168.1.10"));
        assert_eq!(mapping.len(), 1);
        assert!(mapping.contains_key("192.168.1.10"));
    }

    #[test]
    fn distinct_ipv4_get_distinct_entries() {
        let mut engine = RedactorEngine::random();
        let (result, mapping) = engine.redact("10.0.0.1 and 10.0.0.2");
        assert!(!result.contains("10.0.0.1"));
        assert!(!result.contains("10.0.0.2"));
        assert_eq!(mapping.len(), 2);
    }

    #[test]
    fn duplicate_ipv4_shares_one_replacement() {
        let mut engine = RedactorEngine::random();
        let (result, mapping) = engine.redact("10.0.0.1 then 10.0.0.1 again");
        assert_eq!(mapping.len(), 1);
        let found: Vec<&str> = IPV4_RE.find_iter(&result).map(|m| m.as_str()).collect();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0], found[1]);
    }

    #[test]
    fn boundary_ipv4_values_are_recognized() {
        let mut engine = RedactorEngine::random();
        let (result, mapping) = engine.redact("from 0.0.0.0 to 255.255.255.255");
        assert!(!result.contains("0.0.0.0"));
        assert!(!result.contains("255.255.255.255"));
        assert_eq!(mapping.len(), 2);
    }

    #[test]
    fn colon_and_hyphen_macs_are_replaced() {
        let mut engine = RedactorEngine::random();
        let (result, mapping) = engine.redact("MAC 00:11:22:33:44:55 or AA-BB-CC-DD-EE-FF");
        assert!(!result.contains("00:11:22:33:44:55"));
        assert!(!result.contains("AA-BB-CC-DD-EE-FF"));
        assert_eq!(mapping.len(), 2);
    }

    #[test]
    fn full_ipv6_is_replaced() {
        let addr = "2001:0db8:85a3:0000:0000:8a2e:0370:7334";
        let mut engine = RedactorEngine::random();
        let (result, mapping) = engine.redact(&format!("Host {addr} is up"));
        assert!(!result.contains(addr));
        assert_eq!(mapping.len(), 1);
    }

    #[test]
    fn compressed_and_loopback_ipv6_are_replaced() {
        let mut engine = RedactorEngine::random();
        let (result, mapping) = engine.redact("Link-local fe80::1 detected");
        assert!(!result.contains("fe80::1"));
        assert_eq!(mapping.len(), 1);

        let mut engine = RedactorEngine::random();
        let (result, mapping) = engine.redact("Loopback ::1 active");
        assert!(!result.contains("::1"));
        assert_eq!(mapping.len(), 1);
    }

    #[test]
    fn mapped_ipv6_is_one_match_not_an_ipv4_leftover() {
        let mut engine = RedactorEngine::random();
        let (_, mapping) = engine.redact("peer ::ffff:192.168.1.1 connected");
        assert_eq!(mapping.len(), 1);
        assert!(mapping.contains_key("::ffff:192.168.1.1"));
    }

    #[test]
    fn ipv4_and_mac_in_same_text() {
        let mut engine = RedactorEngine::random();
        let (result, mapping) = engine.redact("Server 192.168.1.10 has MAC 00:11:22:33:44:55");
        assert!(!result.contains("192.168.1.10"));
        assert!(!result.contains("00:11:22:33:44:55"));
        assert_eq!(mapping.len(), 2);
    }

    #[test]
    fn text_without_identifiers_is_unchanged() {
        let mut engine = RedactorEngine::random();
        let text = "Hello, this is plain text with no addresses.";
        let (result, mapping) = engine.redact(text);
        assert_eq!(result, text);
        assert!(mapping.is_empty());
    }

    #[test]
    fn empty_input_is_fine() {
        let mut engine = RedactorEngine::random();
        let (result, mapping) = engine.redact("");
        assert_eq!(result, "");
        assert!(mapping.is_empty());
    }

    #[test]
    fn replacements_look_like_their_family() {
        let mut engine = RedactorEngine::random();
        let (_, mapping) = engine.redact("1.2.3.4 fe80::1 00:11:22:33:44:55");
        for (original, replacement) in &mapping {
            if IPV4_RE.is_match(original) && !original.contains(':') {
                assert!(IPV4_RE.is_match(replacement), "{replacement} is not IPv4-shaped");
            } else if MAC_RE.is_match(original) {
                assert!(MAC_RE.is_match(replacement), "{replacement} is not MAC-shaped");
            } else {
                assert!(IPV6_RE.is_match(replacement), "{replacement} is not IPv6-shaped");
            }
        }
    }

    #[test]
    fn no_original_survives_in_output() {
        let text = "10.0.0.1 fe80::1 00:11:22:33:44:55 ::ffff:10.1.1.1 10.0.0.1";
        let mut engine = RedactorEngine::random();
        let (result, mapping) = engine.redact(text);
        assert_eq!(mapping.len(), 4);
        for original in mapping.keys() {
            assert!(!result.contains(original), "{original} leaked into output");
        }
    }

    #[test]
    fn random_mode_differs_across_calls() {
        let mut first = RedactorEngine::random();
        let mut second = RedactorEngine::random();
        let (a, _) = first.redact("192.168.1.1");
        let (b, _) = second.redact("192.168.1.1");
        // 1 in 2^32 false-failure odds; acceptable for a regression test.
        assert_ne!(a, b);
        assert_ne!(first.mapping_id(), second.mapping_id());
    }

    #[test]
    fn deterministic_mode_is_stable_across_instances() {
        let (a, _) = deterministic().redact("192.168.1.1");
        let (b, _) = deterministic().redact("192.168.1.1");
        assert_eq!(a, b);
        assert!(IPV4_RE.is_match(&a));
        assert!(!a.contains("192.168.1.1"));
    }

    #[test]
    fn deterministic_mode_is_stable_within_one_engine() {
        let mut engine = deterministic();
        let (a, _) = engine.redact("192.168.1.1");
        let (b, _) = engine.redact("192.168.1.1");
        assert_eq!(a, b);
    }

    #[test]
    fn different_secrets_give_different_replacements() {
        let mut one = RedactorEngine::new(
            RedactMode::Deterministic,
            Some(b"first-secret-key-0123456789abcdef"),
            DEFAULT_CONTEXT,
        )
        .expect("secret provided");
        let mut two = RedactorEngine::new(
            RedactMode::Deterministic,
            Some(b"other-secret-key-0123456789abcdef"),
            DEFAULT_CONTEXT,
        )
        .expect("secret provided");
        let (a, _) = one.redact("192.168.1.1");
        let (b, _) = two.redact("192.168.1.1");
        assert_ne!(a, b);
    }

    #[test]
    fn different_context_labels_give_different_replacements() {
        let mut one =
            RedactorEngine::new(RedactMode::Deterministic, Some(SECRET), "alpha").expect("secret");
        let mut two =
            RedactorEngine::new(RedactMode::Deterministic, Some(SECRET), "beta").expect("secret");
        let (a, _) = one.redact("192.168.1.1");
        let (b, _) = two.redact("192.168.1.1");
        assert_ne!(a, b);
    }

    #[test]
    fn deterministic_mode_requires_secret() {
        let result = RedactorEngine::new(RedactMode::Deterministic, None, DEFAULT_CONTEXT);
        assert!(matches!(result, Err(RedactError::MissingSecret)));
    }

    #[test]
    fn engines_share_no_state() {
        let mut first = RedactorEngine::random();
        first.redact("192.168.1.1");
        let mut second = RedactorEngine::random();
        let (_, mapping) = second.redact("10.0.0.1");
        assert!(!mapping.contains_key("192.168.1.1"));
    }

    #[test]
    fn embedded_numeric_tokens_are_not_ipv4() {
        let mut engine = RedactorEngine::random();
        let text = "build id 1234.5678.9.1011 stays";
        let (result, mapping) = engine.redact(text);
        assert_eq!(result, text);
        assert!(mapping.is_empty());
    }

    #[test]
    fn pathological_repetition_completes() {
        let mut engine = RedactorEngine::random();
        let colons = ":".repeat(10_000);
        let (result, _) = engine.redact(&colons);
        assert!(!result.is_empty());

        let mut engine = RedactorEngine::random();
        let almost = "1.2.3.".repeat(5_000);
        let (_, mapping) = engine.redact(&almost);
        // "1.2.3.1" parses as a full address at each seam; the point is
        // completion, not match count.
        for original in mapping.keys() {
            assert!(IPV4_RE.is_match(original));
        }
    }

    #[test]
    fn arbitrary_unicode_never_echoes_mapped_originals() {
        let mut engine = RedactorEngine::random();
        let text = "héllo 10.0.0.1 wörld \u{1F600} fe80::1 end";
        let (result, mapping) = engine.redact(text);
        for (original, replacement) in &mapping {
            assert_ne!(original, replacement);
            assert!(!result.contains(original));
        }
    }

    mod properties {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #[test]
            fn redact_completes_and_never_echoes_originals(text in ".{0,256}") {
                let mut engine = RedactorEngine::random();
                let (result, mapping) = engine.redact(&text);
                for (original, replacement) in &mapping {
                    prop_assert_ne!(original, replacement);
                    prop_assert!(!result.contains(original.as_str()));
                }
            }

            #[test]
            fn embedded_address_is_always_captured(
                prefix in "[a-zA-Z ]{0,24}",
                suffix in "[a-zA-Z ]{0,24}",
            ) {
                let text = format!("{prefix} 10.77.3.9 {suffix}");
                let mut engine = RedactorEngine::random();
                let (result, mapping) = engine.redact(&text);
                prop_assert!(mapping.contains_key("10.77.3.9"));
                prop_assert!(!result.contains("10.77.3.9"));
            }

            #[test]
            fn deterministic_replacements_agree_across_instances(text in ".{0,256}") {
                let (a, _) = deterministic().redact(&text);
                let (b, _) = deterministic().redact(&text);
                prop_assert_eq!(a, b);
            }
        }
    }
}

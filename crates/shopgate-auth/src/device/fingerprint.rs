//! Fingerprint derivation from request signals.

use sha2::{Digest, Sha256};

/// Client-observable signals a fingerprint is derived from.
///
/// All of these arrive as request headers; absent ones are empty
/// strings, so a client sending no signals still gets a stable (if
/// weak) fingerprint.
#[derive(Debug, Clone, Default)]
pub struct DeviceSignals<'a> {
    pub user_agent: &'a str,
    /// Declared screen geometry, e.g. `1920x1080`.
    pub screen: &'a str,
    /// Client hints (platform, mobile-ness) as sent.
    pub client_hints: &'a str,
}

/// Derive the hex-encoded SHA-256 fingerprint of a set of signals.
///
/// Signals are normalized (trimmed, lowercased) before hashing so
/// that header-casing quirks between proxies do not split one device
/// into many.
pub fn derive_fingerprint(signals: &DeviceSignals<'_>) -> String {
    let mut hasher = Sha256::new();
    for part in [signals.user_agent, signals.screen, signals.client_hints] {
        hasher.update(part.trim().to_lowercase().as_bytes());
        hasher.update([0u8]);
    }
    hex_encode(&hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(ua: &'static str) -> DeviceSignals<'static> {
        DeviceSignals {
            user_agent: ua,
            screen: "1920x1080",
            client_hints: "\"macOS\"",
        }
    }

    #[test]
    fn stable_for_identical_signals() {
        assert_eq!(
            derive_fingerprint(&signals("Mozilla/5.0")),
            derive_fingerprint(&signals("Mozilla/5.0"))
        );
    }

    #[test]
    fn differs_across_user_agents() {
        assert_ne!(
            derive_fingerprint(&signals("Mozilla/5.0")),
            derive_fingerprint(&signals("curl/8.0"))
        );
    }

    #[test]
    fn normalization_ignores_case_and_whitespace() {
        let a = DeviceSignals {
            user_agent: "  Mozilla/5.0 ",
            screen: "1920X1080",
            client_hints: "",
        };
        let b = DeviceSignals {
            user_agent: "mozilla/5.0",
            screen: "1920x1080",
            client_hints: "",
        };
        assert_eq!(derive_fingerprint(&a), derive_fingerprint(&b));
    }

    #[test]
    fn field_boundaries_are_preserved() {
        let a = DeviceSignals {
            user_agent: "ab",
            screen: "c",
            client_hints: "",
        };
        let b = DeviceSignals {
            user_agent: "a",
            screen: "bc",
            client_hints: "",
        };
        assert_ne!(derive_fingerprint(&a), derive_fingerprint(&b));
    }
}

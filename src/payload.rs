//! Report payload encoding
//!
//! Every field crosses the wire base32-encoded (RFC 4648, unpadded) so that
//! raw hostnames, usernames, or timestamps can never contain the `&`, `=`,
//! whitespace, or newline characters that delimit the request body. Unpadded,
//! because padded base32 ends in `=`.
//!
//! The body is `connected=..&mac=..&name=..&date=..` with exactly those keys
//! in exactly that order; the collector depends on both, so neither may
//! change independently of it.

use crate::identity::HostIdentity;
use crate::sample::PresenceSample;
use anyhow::{Context, Result};
use data_encoding::BASE32_NOPAD;

/// Text-safe transform applied to every payload field.
pub fn encode_field(raw: impl AsRef<[u8]>) -> String {
    BASE32_NOPAD.encode(raw.as_ref())
}

/// Inverse of [`encode_field`]; recovers the original bytes exactly.
pub fn decode_field(encoded: &str) -> Result<Vec<u8>> {
    BASE32_NOPAD
        .decode(encoded.as_bytes())
        .context("invalid base32 field")
}

/// One cycle's encoded report, ready to be rendered into a request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPayload {
    connected: String,
    mac: String,
    name: String,
    date: String,
}

impl ReportPayload {
    /// Pure and deterministic: same identity and sample, same payload.
    pub fn encode(identity: &HostIdentity, sample: &PresenceSample) -> Self {
        Self {
            connected: encode_field(&sample.session_owners),
            mac: encode_field(&identity.hardware_id),
            name: encode_field(&identity.hostname),
            date: encode_field(&sample.sampled_at),
        }
    }

    /// Render the form-urlencoded request body. Key order is the wire
    /// contract.
    pub fn body(&self) -> String {
        format!(
            "connected={}&mac={}&name={}&date={}",
            self.connected, self.mac, self.name, self.date
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> HostIdentity {
        HostIdentity {
            hardware_id: "AA:BB:CC:DD:EE:FF".to_string(),
            hostname: "host1".to_string(),
        }
    }

    fn sample() -> PresenceSample {
        PresenceSample {
            session_owners: "alice\nbob".to_string(),
            sampled_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_encode_is_deterministic() {
        let a = ReportPayload::encode(&identity(), &sample());
        let b = ReportPayload::encode(&identity(), &sample());
        assert_eq!(a, b);
        assert_eq!(a.body(), b.body());
    }

    #[test]
    fn test_round_trip() {
        for raw in ["", "alice", "a b\tc", "AA:BB:CC:DD:EE:FF", "héte\u{7}"] {
            let decoded = decode_field(&encode_field(raw)).unwrap();
            assert_eq!(decoded, raw.as_bytes());
        }
        // Arbitrary bytes, not just UTF-8
        let bytes: Vec<u8> = (0u8..=255).collect();
        assert_eq!(decode_field(&encode_field(&bytes)).unwrap(), bytes);
    }

    #[test]
    fn test_fields_never_contain_delimiters() {
        let nasty = PresenceSample {
            session_owners: "a&b=c\nd e".to_string(),
            sampled_at: "now = then & later\n".to_string(),
        };
        let hostile_identity = HostIdentity {
            hardware_id: "mac=&\n".to_string(),
            hostname: "name with spaces\n".to_string(),
        };
        let body = ReportPayload::encode(&hostile_identity, &nasty).body();
        for value in body.split('&').map(|kv| kv.split_once('=').unwrap().1) {
            assert!(!value.contains('&'));
            assert!(!value.contains('='));
            assert!(!value.contains('\n'));
            assert!(!value.contains(' '));
        }
    }

    #[test]
    fn test_body_key_order_is_fixed() {
        let body = ReportPayload::encode(&identity(), &sample()).body();
        let keys: Vec<&str> = body
            .split('&')
            .map(|kv| kv.split_once('=').unwrap().0)
            .collect();
        assert_eq!(keys, ["connected", "mac", "name", "date"]);
    }

    #[test]
    fn test_empty_session_list_still_yields_connected_field() {
        let empty = PresenceSample {
            session_owners: String::new(),
            sampled_at: "2024-01-01T00:00:00Z".to_string(),
        };
        let body = ReportPayload::encode(&identity(), &empty).body();
        assert!(body.starts_with("connected=&mac="));
    }

    #[test]
    fn test_body_decodes_back_to_source_values() {
        let body = ReportPayload::encode(&identity(), &sample()).body();
        let mut fields = body.split('&').map(|kv| kv.split_once('=').unwrap());
        let decode = |enc: &str| String::from_utf8(decode_field(enc).unwrap()).unwrap();

        let (key, value) = fields.next().unwrap();
        assert_eq!((key, decode(value).as_str()), ("connected", "alice\nbob"));
        let (key, value) = fields.next().unwrap();
        assert_eq!((key, decode(value).as_str()), ("mac", "AA:BB:CC:DD:EE:FF"));
        let (key, value) = fields.next().unwrap();
        assert_eq!((key, decode(value).as_str()), ("name", "host1"));
        let (key, value) = fields.next().unwrap();
        assert_eq!((key, decode(value).as_str()), ("date", "2024-01-01T00:00:00Z"));
        assert!(fields.next().is_none());
    }
}

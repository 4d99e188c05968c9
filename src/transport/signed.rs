//! Signed JSON update protocol.
//!
//! The node POSTs each frame as a JSON body with two headers: the
//! shared-secret token, and a signature computed over the exact body
//! text concatenated with the same secret. The signature is a simple
//! additive shift-hash rendered as lowercase hex; a weak integrity
//! check, NOT a cryptographic MAC. It is kept bit-for-bit for wire
//! compatibility with deployed nodes; do not swap in a real MAC here
//! without versioning the protocol.

use serde::{Deserialize, Serialize};

use crate::config::FIRMWARE_VERSION;
use crate::frame::SensorFrame;
use crate::ticks::Ticks;

/// The JSON update body. Field order here IS the wire order; serde
/// serializes declaration order and peers hash the exact byte sequence.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateBody {
    pub temperature: f32,
    pub humidity: f32,
    pub motion: bool,
    pub gas: bool,
    pub sound: bool,
    pub ir_object: bool,
    pub distance: u32,
    pub timestamp: Ticks,
    pub is_valid: bool,
    pub sound_level: u16,
    pub gas_level: u16,
    pub dht_error: bool,
    pub ultrasonic_error: bool,
    pub firmware_version: String,
}

impl UpdateBody {
    pub fn from_frame(frame: &SensorFrame) -> Self {
        Self {
            temperature: frame.temperature_c,
            humidity: frame.humidity_pct,
            motion: frame.motion,
            gas: frame.gas,
            sound: frame.sound,
            ir_object: frame.ir_object,
            distance: frame.distance_cm,
            timestamp: frame.timestamp,
            is_valid: frame.is_valid,
            sound_level: frame.sound_level,
            gas_level: frame.gas_level,
            dht_error: frame.dht_error,
            ultrasonic_error: frame.ultrasonic_error,
            firmware_version: FIRMWARE_VERSION.to_string(),
        }
    }

    pub fn into_frame(self) -> SensorFrame {
        SensorFrame {
            temperature_c: self.temperature,
            humidity_pct: self.humidity,
            motion: self.motion,
            gas: self.gas,
            sound: self.sound,
            ir_object: self.ir_object,
            distance_cm: self.distance,
            timestamp: self.timestamp,
            is_valid: self.is_valid,
            sound_level: self.sound_level,
            gas_level: self.gas_level,
            dht_error: self.dht_error,
            ultrasonic_error: self.ultrasonic_error,
        }
    }
}

/// Lenient receive-side shape: every field optional, unknown fields
/// ignored. Older node firmware omits the level and error fields.
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePatch {
    pub temperature: Option<f32>,
    pub humidity: Option<f32>,
    pub motion: Option<bool>,
    pub gas: Option<bool>,
    pub sound: Option<bool>,
    pub ir_object: Option<bool>,
    pub distance: Option<u32>,
    pub timestamp: Option<Ticks>,
    pub is_valid: Option<bool>,
    pub sound_level: Option<u16>,
    pub gas_level: Option<u16>,
    pub dht_error: Option<bool>,
    pub ultrasonic_error: Option<bool>,
    pub firmware_version: Option<String>,
}

impl UpdatePatch {
    /// Merge the carried fields over an existing frame.
    pub fn apply(&self, frame: &mut SensorFrame) {
        if let Some(v) = self.temperature {
            frame.temperature_c = v;
        }
        if let Some(v) = self.humidity {
            frame.humidity_pct = v;
        }
        if let Some(v) = self.motion {
            frame.motion = v;
        }
        if let Some(v) = self.gas {
            frame.gas = v;
        }
        if let Some(v) = self.sound {
            frame.sound = v;
        }
        if let Some(v) = self.ir_object {
            frame.ir_object = v;
        }
        if let Some(v) = self.distance {
            frame.distance_cm = v;
        }
        if let Some(v) = self.timestamp {
            frame.timestamp = v;
        }
        if let Some(v) = self.is_valid {
            frame.is_valid = v;
        }
        if let Some(v) = self.sound_level {
            frame.sound_level = v;
        }
        if let Some(v) = self.gas_level {
            frame.gas_level = v;
        }
        if let Some(v) = self.dht_error {
            frame.dht_error = v;
        }
        if let Some(v) = self.ultrasonic_error {
            frame.ultrasonic_error = v;
        }
    }
}

/// The additive shift-hash over `data` followed by `secret`.
/// Equivalent to `h = h * 33 + byte` with wrapping arithmetic, seeded 0.
pub fn rolling_hash(data: &str, secret: &str) -> u32 {
    let mut hash: u32 = 0;
    for b in data.bytes().chain(secret.bytes()) {
        hash = (hash << 5).wrapping_add(hash).wrapping_add(u32::from(b));
    }
    hash
}

/// Signature header value: the hash as lowercase hex, no padding.
pub fn signature_hex(data: &str, secret: &str) -> String {
    format!("{:x}", rolling_hash(data, secret))
}

/// Assemble the full signed POST request for one body.
pub fn build_update_request(host: &str, token: &str, body: &str) -> String {
    let signature = signature_hex(body, token);
    format!(
        "POST /update HTTP/1.1\r\n\
         Host: {host}\r\n\
         Authorization: {token}\r\n\
         X-Signature: {signature}\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {len}\r\n\
         Connection: close\r\n\
         \r\n\
         {body}",
        len = body.len(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_matches_known_vectors() {
        // h("a") with empty secret: 0*33 + 97.
        assert_eq!(rolling_hash("a", ""), 97);
        // h("ab"): 97*33 + 98.
        assert_eq!(rolling_hash("ab", ""), 97 * 33 + 98);
        // Secret is appended, so splitting the input differently
        // produces the same hash.
        assert_eq!(rolling_hash("ab", "cd"), rolling_hash("abcd", ""));
    }

    #[test]
    fn hash_wraps_instead_of_overflowing() {
        let long: String = core::iter::repeat('z').take(10_000).collect();
        // Must not panic in debug builds.
        let _ = rolling_hash(&long, "secret");
    }

    #[test]
    fn signature_is_lowercase_hex() {
        let sig = signature_hex("payload", "secret");
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(!sig.chars().any(|c| c.is_ascii_uppercase()));
    }

    #[test]
    fn body_serializes_in_wire_order() {
        let frame = SensorFrame::quiet(7);
        let json = serde_json::to_string(&UpdateBody::from_frame(&frame)).unwrap();
        let keys: Vec<usize> = [
            "\"temperature\"",
            "\"humidity\"",
            "\"motion\"",
            "\"gas\"",
            "\"sound\"",
            "\"ir_object\"",
            "\"distance\"",
            "\"timestamp\"",
            "\"is_valid\"",
            "\"sound_level\"",
            "\"gas_level\"",
            "\"dht_error\"",
            "\"ultrasonic_error\"",
            "\"firmware_version\"",
        ]
        .iter()
        .map(|k| json.find(k).expect("key present"))
        .collect();
        assert!(keys.windows(2).all(|w| w[0] < w[1]), "keys in order: {json}");
    }

    #[test]
    fn patch_merges_only_carried_fields() {
        let mut frame = SensorFrame::quiet(0);
        frame.temperature_c = 20.0;
        let patch: UpdatePatch =
            serde_json::from_str(r#"{"motion":true,"distance":42}"#).unwrap();
        patch.apply(&mut frame);
        assert!(frame.motion);
        assert_eq!(frame.distance_cm, 42);
        assert_eq!(frame.temperature_c, 20.0, "absent field untouched");
    }

    #[test]
    fn patch_ignores_unknown_fields() {
        let patch: Result<UpdatePatch, _> =
            serde_json::from_str(r#"{"motion":true,"someday":"maybe"}"#);
        assert!(patch.is_ok());
    }

    #[test]
    fn request_carries_both_auth_headers_and_exact_length() {
        let body = r#"{"motion":true}"#;
        let req = build_update_request("hub.local", "tok123", body);
        assert!(req.starts_with("POST /update HTTP/1.1\r\n"));
        assert!(req.contains("Authorization: tok123\r\n"));
        let sig = signature_hex(body, "tok123");
        assert!(req.contains(&format!("X-Signature: {sig}\r\n")));
        assert!(req.contains(&format!("Content-Length: {}\r\n", body.len())));
        assert!(req.ends_with(body));
    }

    #[test]
    fn body_round_trips_through_frame() {
        let mut frame = SensorFrame::quiet(88);
        frame.gas = true;
        frame.sound_level = 321;
        frame.dht_error = true;
        frame.is_valid = false;
        let body = UpdateBody::from_frame(&frame);
        let json = serde_json::to_string(&body).unwrap();
        let back: UpdateBody = serde_json::from_str(&json).unwrap();
        assert_eq!(back.into_frame(), frame);
    }
}

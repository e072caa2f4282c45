//! Record fingerprints
//!
//! A fingerprint is the CRC-32 (IEEE) of `"name:type:ttl:rdata"` rendered
//! in lowercase base 36. It is an integrity marker, not a security digest.

use crate::record::Record;

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Compute the fingerprint of a record's identity fields
pub fn generate(record: &Record) -> String {
    let identity = format!(
        "{}:{}:{}:{}",
        record.name, record.record_type, record.ttl, record.rdata
    );
    to_base36(crc32fast::hash(identity.as_bytes()))
}

fn to_base36(mut value: u32) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::with_capacity(7);
    while value > 0 {
        digits.push(ALPHABET[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_fingerprints() {
        let a1 = Record::new("example.com.", "A", 3600, "192.0.2.1");
        let a2 = Record::new("example.com.", "A", 3600, "192.0.2.2");
        let cname = Record::new("www.example.com.", "CNAME", 3600, "example.com.");
        let mx = Record::new("example.com.", "MX", 3600, "10 mail.example.com.");
        assert_eq!(generate(&a1), "1r81el0");
        assert_eq!(generate(&a2), "y2xy9a");
        assert_eq!(generate(&cname), "ky0g92");
        assert_eq!(generate(&mx), "9pp0kg");
    }

    #[test]
    fn comment_does_not_affect_fingerprint() {
        let plain = Record::new("example.com.", "A", 3600, "192.0.2.1");
        let commented = plain.clone().with_comment("note");
        assert_eq!(generate(&plain), generate(&commented));
    }

    #[test]
    fn every_identity_field_matters() {
        let base = Record::new("example.com.", "A", 3600, "192.0.2.1");
        let variants = [
            Record::new("www.example.com.", "A", 3600, "192.0.2.1"),
            Record::new("example.com.", "AAAA", 3600, "192.0.2.1"),
            Record::new("example.com.", "A", 60, "192.0.2.1"),
            Record::new("example.com.", "A", 3600, "192.0.2.9"),
        ];
        for variant in &variants {
            assert_ne!(generate(&base), generate(variant), "{} should differ", variant);
        }
    }

    #[test]
    fn base36_edges() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(u32::MAX), "1z141z3");
    }
}

//! # emx-qrpayload
//!
//! Classification of decoded QR code payloads.
//!
//! A QR reader hands back plain text. This crate recognises the common
//! structured formats carried in that text and extracts human-readable
//! fields from them, so a front end can show "Network Name (SSID): MyNet"
//! instead of `WIFI:S:MyNet;T:WPA;P:secret;;`.
//!
//! ## Recognised Formats
//!
//! Rules are applied in this order, first match wins:
//!
//! | Prefix / shape | `Type` |
//! |---|---|
//! | `BEGIN:VCARD` | `vCard/Contact` |
//! | `WIFI:` | `WiFi Network` |
//! | absolute `http(s)://` URL | `URL` |
//! | `tel:` | `Phone Number` |
//! | `sms:` / `smsto:` | `SMS` |
//! | `mailto:` | `Email` |
//! | `geo:` | `Location` |
//! | JSON object or array | `JSON` |
//!
//! Prefixes match in lower case or upper case only (`tel:` and `TEL:`, not
//! `Tel:`). Anything else is unstructured and [`classify`] returns `None`.
//!
//! ## Example
//!
//! ```
//! use emx_qrpayload::classify;
//!
//! let result = classify("WIFI:S:MyNet;T:WPA;P:secret;H:true;").unwrap();
//! assert_eq!(result.get("Type"), Some("WiFi Network"));
//! assert_eq!(result.get("Hidden Network"), Some("Yes"));
//!
//! assert!(classify("just plain text").is_none());
//! ```
//!
//! ## Generator Round Trip
//!
//! [`generator_link`] builds the link that re-opens the generator page
//! pre-filled with the raw decoded text, and [`GeneratorRequest`] parses the
//! generator's `text` / `size` / `ec` query parameters on the other side.

pub mod classifier;
pub mod error;
pub mod generator;
pub mod json;
pub mod payload;

pub use classifier::{classify, classify_bytes, kind_code, parse, Classifier};
pub use error::{GeneratorError, GeneratorResult};
pub use generator::{
    generator_link, ErrorCorrection, GeneratorConfig, GeneratorRequest, TotpRequest,
};
pub use payload::{Contact, ParsedResult, Payload, PayloadKind};

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn proptest_classify_is_idempotent(raw in any::<String>()) {
            prop_assert_eq!(classify(&raw), classify(&raw));
        }

        #[test]
        fn proptest_prefixed_payloads_keep_their_kind(
            rest in "[ -~]{0,40}",
            prefix in prop::sample::select(vec!["BEGIN:VCARD", "WIFI:", "tel:", "SMS:", "smsto:", "MAILTO:"]),
        ) {
            let raw = format!("{}{}", prefix, rest);
            let expected = match prefix {
                "BEGIN:VCARD" => PayloadKind::VCard,
                "WIFI:" => PayloadKind::Wifi,
                "tel:" => PayloadKind::Phone,
                "SMS:" | "smsto:" => PayloadKind::Sms,
                _ => PayloadKind::Email,
            };
            prop_assert_eq!(classify(&raw).map(|r| r.kind()), Some(expected));
        }

        #[test]
        fn proptest_type_is_first_field(raw in "(https?://[a-z]{1,8}\\.com/[a-z]{0,5}|geo:[0-9]{1,3},[0-9]{1,3}|\\{\"[a-z]{1,4}\":[0-9]{1,4}\\})") {
            let result = classify(&raw).unwrap();
            prop_assert_eq!(result.fields()[0].0.as_str(), "Type");
            prop_assert_eq!(PayloadKind::from_label(&result.fields()[0].1), Some(result.kind()));
        }
    }
}

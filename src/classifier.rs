//! Decoded QR payload classification
//!
//! Rules are tried in a fixed order and the first one that accepts the text
//! wins. Prefix rules are case-sensitive: only the listed spellings match.
//!
//! 1. `BEGIN:VCARD` → vCard
//! 2. `WIFI:` → WiFi network
//! 3. absolute `http`/`https` URL → URL
//! 4. `tel:` / `TEL:` → phone number
//! 5. `sms:` / `SMS:` / `smsto:` / `SMSTO:` → SMS
//! 6. `mailto:` / `MAILTO:` → email
//! 7. `geo:` / `GEO:` → location
//! 8. JSON object or array → JSON
//!
//! Anything else is unstructured and yields `None`.

use crate::json;
use crate::payload::{Contact, ParsedResult, Payload, PayloadKind};
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, trace};
use url::Url;

const VCARD_PREFIX: &str = "BEGIN:VCARD";
const WIFI_PREFIX: &str = "WIFI:";
const TEL_PREFIXES: [&str; 2] = ["tel:", "TEL:"];
const SMS_PREFIXES: [&str; 4] = ["sms:", "SMS:", "smsto:", "SMSTO:"];
const MAILTO_PREFIXES: [&str; 2] = ["mailto:", "MAILTO:"];
const GEO_PREFIXES: [&str; 2] = ["geo:", "GEO:"];

static WIFI_SSID: OnceLock<Regex> = OnceLock::new();
static WIFI_TYPE: OnceLock<Regex> = OnceLock::new();
static WIFI_PASSWORD: OnceLock<Regex> = OnceLock::new();
static WIFI_HIDDEN: OnceLock<Regex> = OnceLock::new();
static SMS_BODY: OnceLock<Regex> = OnceLock::new();
static EMPTY_ADDRESS_PART: OnceLock<Regex> = OnceLock::new();

/// Classify decoded text into display fields.
///
/// Returns `None` when the text matches no known structured format; the
/// caller still shows the raw text in that case.
pub fn classify(raw: &str) -> Option<ParsedResult> {
    parse(raw).map(|payload| payload.to_result())
}

/// Classify raw bytes, replacing invalid UTF-8 sequences first
pub fn classify_bytes(raw: &[u8]) -> Option<ParsedResult> {
    classify(&String::from_utf8_lossy(raw))
}

/// Classify decoded text into a typed payload
pub fn parse(raw: &str) -> Option<Payload> {
    let payload = if raw.starts_with(VCARD_PREFIX) {
        Some(parse_vcard(raw))
    } else if let Some(rest) = raw.strip_prefix(WIFI_PREFIX) {
        Some(parse_wifi(rest))
    } else if let Some(url) = parse_web_url(raw) {
        Some(url)
    } else if let Some(rest) = strip_any(raw, &TEL_PREFIXES) {
        Some(Payload::Phone { number: rest.to_string() })
    } else if let Some(rest) = strip_any(raw, &SMS_PREFIXES) {
        Some(parse_sms(rest))
    } else if let Some(rest) = strip_any(raw, &MAILTO_PREFIXES) {
        Some(parse_mailto(rest))
    } else if let Some(rest) = strip_any(raw, &GEO_PREFIXES) {
        // Text starting with `geo:` can never be JSON, so a malformed
        // location ends the cascade here.
        parse_geo(rest)
    } else {
        json::parse_structured(raw).map(Payload::Json)
    };

    match &payload {
        Some(p) => debug!(kind = p.kind().code(), "classified payload"),
        None => trace!(len = raw.len(), "unstructured payload"),
    }

    payload
}

/// Short type code for `raw`, `text` when unstructured
pub fn kind_code(raw: &str) -> &'static str {
    parse(raw)
        .map(|payload| payload.kind().code())
        .unwrap_or(crate::payload::UNSTRUCTURED_CODE)
}

/// Object-style front end over the free functions
#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier {}

impl Classifier {
    pub fn new() -> Self {
        Self {}
    }

    pub fn classify(&self, raw: &str) -> Option<ParsedResult> {
        classify(raw)
    }

    pub fn parse(&self, raw: &str) -> Option<Payload> {
        parse(raw)
    }

    /// Which kind the text would be classified as, if any
    pub fn detect(&self, raw: &str) -> Option<PayloadKind> {
        parse(raw).map(|payload| payload.kind())
    }
}

fn strip_any<'a>(raw: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    prefixes.iter().find_map(|prefix| raw.strip_prefix(prefix))
}

/// Mirrors `String.prototype.split(sep)[index]`
fn segment(text: &str, sep: char, index: usize) -> Option<&str> {
    text.split(sep).nth(index)
}

fn cached_regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("valid payload regex"))
}

fn parse_web_url(raw: &str) -> Option<Payload> {
    let url = Url::parse(raw).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        trace!(scheme = url.scheme(), "not a web url");
        return None;
    }

    let host = match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    };
    let path = Some(url.path()).filter(|p| !p.is_empty() && *p != "/");
    let query = url.query().filter(|q| !q.is_empty());
    let hash = url.fragment().filter(|h| !h.is_empty());

    Some(Payload::Url {
        protocol: url.scheme().to_string(),
        host,
        path: path.map(str::to_string),
        query: query.map(|q| format!("?{}", q)),
        hash: hash.map(|h| format!("#{}", h)),
    })
}

fn parse_vcard(raw: &str) -> Payload {
    let mut contact = Contact::default();

    for line in raw.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if let Some(name) = line.strip_prefix("FN:") {
            contact.set("Full Name", name);
        } else if let Some(name) = line.strip_prefix("N:") {
            let mut parts = name.split(';');
            if let Some(last) = parts.next().filter(|s| !s.is_empty()) {
                contact.set("Last Name", last);
            }
            if let Some(first) = parts.next().filter(|s| !s.is_empty()) {
                contact.set("First Name", first);
            }
        } else if line.starts_with("TEL") && line.contains(':') {
            contact.set("Phone", segment(line, ':', 1).unwrap_or_default());
        } else if line.starts_with("EMAIL") && line.contains(':') {
            contact.set("Email", segment(line, ':', 1).unwrap_or_default());
        } else if let Some(org) = line.strip_prefix("ORG:") {
            contact.set("Organization", org);
        } else if let Some(title) = line.strip_prefix("TITLE:") {
            contact.set("Title", title);
        } else if line.starts_with("URL") && line.contains(':') {
            let website = line.split_once(':').map(|(_, rest)| rest).unwrap_or_default();
            contact.set("Website", website);
        } else if line.starts_with("ADR") && line.contains(':') {
            let address = clean_address(segment(line, ':', 1).unwrap_or_default());
            if !address.is_empty() {
                contact.set("Address", address);
            }
        }
    }

    Payload::VCard(contact)
}

/// Turn `;;123 Main St;Springfield;;` into `, 123 Main St, Springfield,`
fn clean_address(raw: &str) -> String {
    let joined = raw.replace(';', ", ");
    cached_regex(&EMPTY_ADDRESS_PART, r",\s*,")
        .replace_all(&joined, ",")
        .trim()
        .to_string()
}

fn parse_wifi(rest: &str) -> Payload {
    let capture = |cell: &'static OnceLock<Regex>, pattern: &str| {
        cached_regex(cell, pattern)
            .captures(rest)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    };

    let ssid = capture(&WIFI_SSID, r"S:([^;]*)");
    let security = capture(&WIFI_TYPE, r"T:([^;]*)");
    let password = capture(&WIFI_PASSWORD, r"P:([^;]*)");
    let hidden = capture(&WIFI_HIDDEN, r"H:([^;]*)")
        .map(|h| h.to_lowercase() == "true")
        .unwrap_or(false);

    Payload::Wifi { ssid, security, password, hidden }
}

fn parse_sms(rest: &str) -> Payload {
    let number = segment(rest, '?', 0).unwrap_or_default().to_string();
    let message = segment(rest, '?', 1)
        .filter(|params| !params.is_empty())
        .and_then(|params| cached_regex(&SMS_BODY, r"(?i)body=([^&]*)").captures(params))
        .and_then(|caps| caps.get(1))
        .map(|m| decode_component(m.as_str()));

    Payload::Sms { number, message }
}

fn decode_component(encoded: &str) -> String {
    match urlencoding::decode(encoded) {
        Ok(decoded) => decoded.into_owned(),
        Err(err) => {
            debug!(error = %err, "keeping undecodable sms body as-is");
            encoded.to_string()
        }
    }
}

fn parse_mailto(rest: &str) -> Payload {
    let address = segment(rest, '?', 0).unwrap_or_default().to_string();
    let mut subject = None;
    let mut body = None;

    if let Some(params) = segment(rest, '?', 1).filter(|p| !p.is_empty()) {
        for (key, value) in url::form_urlencoded::parse(params.as_bytes()) {
            match key.as_ref() {
                "subject" => subject = Some(value.into_owned()),
                "body" => body = Some(value.into_owned()),
                _ => {}
            }
        }
    }

    Payload::Email {
        address,
        subject: subject.filter(|s| !s.is_empty()),
        body: body.filter(|b| !b.is_empty()),
    }
}

fn parse_geo(rest: &str) -> Option<Payload> {
    let mut coords = rest.split(',');
    let (Some(latitude), Some(longitude)) = (coords.next(), coords.next()) else {
        debug!("geo payload without longitude");
        return None;
    };

    Some(Payload::Location {
        latitude: latitude.to_string(),
        longitude: segment(longitude, '?', 0).unwrap_or_default().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(raw: &str) -> Vec<(String, String)> {
        classify(raw).expect("structured payload").fields().to_vec()
    }

    fn pairs(expected: &[(&str, &str)]) -> Vec<(String, String)> {
        expected
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_url_all_parts() {
        assert_eq!(
            fields("https://example.com/path?x=1#y"),
            pairs(&[
                ("Type", "URL"),
                ("Protocol", "https"),
                ("Host", "example.com"),
                ("Path", "/path"),
                ("Query", "?x=1"),
                ("Hash", "#y"),
            ])
        );
    }

    #[test]
    fn test_url_root_path_and_port() {
        assert_eq!(
            fields("http://example.com:8080/"),
            pairs(&[("Type", "URL"), ("Protocol", "http"), ("Host", "example.com:8080")])
        );
        assert_eq!(
            fields("https://example.com:443?"),
            pairs(&[("Type", "URL"), ("Protocol", "https"), ("Host", "example.com")])
        );
    }

    #[test]
    fn test_non_web_schemes_fall_through() {
        assert!(classify("ftp://example.com/file").is_none());
        assert!(classify("otpauth://totp/A:b?secret=X").is_none());
        assert!(classify("http//missing-colon").is_none());
    }

    #[test]
    fn test_vcard_fields() {
        let card = "BEGIN:VCARD\r\nVERSION:3.0\r\nN:Doe;Jane;;;\r\nFN:Jane Doe\r\n\
                    ORG:Acme\r\nTITLE:Engineer\r\nTEL;TYPE=CELL:+1555\r\n\
                    EMAIL;TYPE=INTERNET:jane@example.com\r\nURL:https://jane.example.com\r\n\
                    ADR;TYPE=HOME:;;1 Main St;Springfield;;12345;USA\r\nEND:VCARD";
        assert_eq!(
            fields(card),
            pairs(&[
                ("Type", "vCard/Contact"),
                ("Last Name", "Doe"),
                ("First Name", "Jane"),
                ("Full Name", "Jane Doe"),
                ("Organization", "Acme"),
                ("Title", "Engineer"),
                ("Phone", "+1555"),
                ("Email", "jane@example.com"),
                ("Website", "https://jane.example.com"),
                ("Address", ", 1 Main St, Springfield, 12345, USA"),
            ])
        );
    }

    #[test]
    fn test_vcard_always_typed_contact() {
        assert_eq!(fields("BEGIN:VCARD"), pairs(&[("Type", "vCard/Contact")]));
        assert_eq!(fields("BEGIN:VCARDgarbage\nFN"), pairs(&[("Type", "vCard/Contact")]));
        assert_eq!(
            classify("BEGIN:VCARD\nhttps://example.com").map(|r| r.kind()),
            Some(PayloadKind::VCard)
        );
    }

    #[test]
    fn test_vcard_last_occurrence_wins() {
        let result = classify("BEGIN:VCARD\nTEL:111\nFN:A\nTEL:222\nEND:VCARD").unwrap();
        assert_eq!(result.get("Phone"), Some("222"));
        let keys: Vec<&str> = result.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Type", "Phone", "Full Name"]);
    }

    #[test]
    fn test_vcard_tel_value_stops_at_next_colon() {
        let result = classify("BEGIN:VCARD\nTEL:tel:+1555\nEND:VCARD").unwrap();
        assert_eq!(result.get("Phone"), Some("tel"));
    }

    #[test]
    fn test_vcard_empty_address_omitted() {
        let result = classify("BEGIN:VCARD\nADR: \nN:;Jane\nEND:VCARD").unwrap();
        assert!(!result.contains_key("Address"));
        assert!(!result.contains_key("Last Name"));
        assert_eq!(result.get("First Name"), Some("Jane"));
    }

    #[test]
    fn test_wifi_fields() {
        assert_eq!(
            fields("WIFI:S:MyNet;T:WPA;P:secret;H:true;"),
            pairs(&[
                ("Type", "WiFi Network"),
                ("Network Name (SSID)", "MyNet"),
                ("Security Type", "WPA"),
                ("Password", "secret"),
                ("Hidden Network", "Yes"),
            ])
        );
    }

    #[test]
    fn test_wifi_hidden_only_when_true() {
        let result = classify("WIFI:T:nopass;S:Cafe;H:false;;").unwrap();
        assert!(!result.contains_key("Hidden Network"));
        assert!(!result.contains_key("Password"));

        let result = classify("WIFI:S:Cafe;H:TRUE;").unwrap();
        assert_eq!(result.get("Hidden Network"), Some("Yes"));

        assert_eq!(fields("WIFI:"), pairs(&[("Type", "WiFi Network")]));
    }

    #[test]
    fn test_phone() {
        assert_eq!(
            fields("tel:+15551234567"),
            pairs(&[("Type", "Phone Number"), ("Number", "+15551234567")])
        );
        assert_eq!(classify("TEL:911").unwrap().get("Number"), Some("911"));
        assert!(classify("Tel:911").is_none());
    }

    #[test]
    fn test_sms_with_body() {
        assert_eq!(
            fields("SMSTO:+1555?body=Hello%20there&x=1"),
            pairs(&[("Type", "SMS"), ("Number", "+1555"), ("Message", "Hello there")])
        );
        assert_eq!(classify("sms:123?BODY=Hi").unwrap().get("Message"), Some("Hi"));
    }

    #[test]
    fn test_sms_without_body() {
        assert_eq!(fields("sms:123"), pairs(&[("Type", "SMS"), ("Number", "123")]));
        assert_eq!(fields("smsto:123?"), pairs(&[("Type", "SMS"), ("Number", "123")]));
        assert!(!classify("sms:123?text=hi").unwrap().contains_key("Message"));
    }

    #[test]
    fn test_sms_plus_is_not_space() {
        assert_eq!(classify("sms:1?body=a+b").unwrap().get("Message"), Some("a+b"));
    }

    #[test]
    fn test_sms_undecodable_body_kept_raw() {
        let result = classify("sms:1?body=%FF%zz").unwrap();
        assert_eq!(result.get("Message"), Some("%FF%zz"));
    }

    #[test]
    fn test_json_type_key_is_renamed() {
        let result = classify(r#"{"Type":"evil","a":1}"#).unwrap();
        assert_eq!(result.kind(), PayloadKind::Json);
        assert_eq!(result.get("Type"), Some("JSON"));
        assert_eq!(result.get("Type (JSON)"), Some("evil"));
        assert_eq!(result.get("a"), Some("1"));
    }

    #[test]
    fn test_email() {
        assert_eq!(
            fields("mailto:me@example.com?subject=Hi%20there&body=See+you"),
            pairs(&[
                ("Type", "Email"),
                ("Address", "me@example.com"),
                ("Subject", "Hi there"),
                ("Body", "See you"),
            ])
        );
    }

    #[test]
    fn test_email_repeated_and_empty_params() {
        let result = classify("MAILTO:a@b.c?subject=one&subject=two&body=").unwrap();
        assert_eq!(result.get("Subject"), Some("two"));
        assert!(!result.contains_key("Body"));
    }

    #[test]
    fn test_mailto_is_never_a_url() {
        let result = classify("mailto:http://example.com/").unwrap();
        assert_eq!(result.kind(), PayloadKind::Email);
        assert_eq!(result.get("Address"), Some("http://example.com/"));
    }

    #[test]
    fn test_geo() {
        assert_eq!(
            fields("geo:37.786971,-122.399677?q=Office"),
            pairs(&[("Type", "Location"), ("Latitude", "37.786971"), ("Longitude", "-122.399677")])
        );
        assert_eq!(classify("GEO:1,2,3").unwrap().get("Longitude"), Some("2"));
    }

    #[test]
    fn test_malformed_geo_is_unstructured() {
        assert!(classify("geo:37.786971").is_none());
        assert!(classify("geo:").is_none());
    }

    #[test]
    fn test_json() {
        let result = classify(r#"{"a":{"b":1},"c":[1,2]}"#).unwrap();
        assert_eq!(result.get("Type"), Some("JSON"));
        assert_eq!(result.get("a.b"), Some("1"));
        assert_eq!(result.get("c"), Some("1,2"));
        assert!(!result.contains_key("c.0"));
        assert!(!result.contains_key("c.1"));
    }

    #[test]
    fn test_plain_text_is_unstructured() {
        assert!(classify("just plain text").is_none());
        assert!(classify("").is_none());
        assert!(classify("\"quoted\"").is_none());
        assert!(classify("12345").is_none());
    }

    #[test]
    fn test_prefixes_are_case_sensitive() {
        assert!(classify("begin:vcard\nFN:x").is_none());
        assert!(classify("wifi:S:x;").is_none());
        assert!(classify("Mailto:a@b.c").is_none());
    }

    #[test]
    fn test_kind_codes() {
        assert_eq!(kind_code("WIFI:S:x;"), "wifi");
        assert_eq!(kind_code("geo:1,2"), "geo");
        assert_eq!(kind_code("hello"), "text");
        assert_eq!(Classifier::new().detect("[1]"), Some(PayloadKind::Json));
    }

    #[test]
    fn test_classify_bytes_lossy() {
        let result = classify_bytes(b"tel:+1\xFF").unwrap();
        assert_eq!(result.get("Number"), Some("+1\u{FFFD}"));
    }
}

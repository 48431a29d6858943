//! Generator-side helpers
//!
//! The reader hands decoded text back to the generator page through a link
//! carrying the raw text as a query parameter. This module builds that link,
//! parses the generator's query parameters and builds `otpauth://totp/` URIs
//! for the TOTP form.

use crate::error::{GeneratorError, GeneratorResult};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

pub const DEFAULT_BASE_PATH: &str = "/";
pub const DEFAULT_SIZE: u32 = 256;
pub const DEFAULT_TOTP_PERIOD: u32 = 30;

// Generator query parameter names
pub const TEXT_PARAM: &str = "text";
pub const SIZE_PARAM: &str = "size";
pub const EC_PARAM: &str = "ec";

/// QR error correction level requested from the generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorCorrection {
    L,
    #[default]
    M,
    Q,
    H,
}

impl ErrorCorrection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::L => "L",
            Self::M => "M",
            Self::Q => "Q",
            Self::H => "H",
        }
    }
}

impl FromStr for ErrorCorrection {
    type Err = GeneratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L" => Ok(Self::L),
            "M" => Ok(Self::M),
            "Q" => Ok(Self::Q),
            "H" => Ok(Self::H),
            _ => Err(GeneratorError::InvalidErrorCorrection(s.to_string())),
        }
    }
}

impl fmt::Display for ErrorCorrection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings shared by link building and request parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Path of the generator page, e.g. `/` or `/generate`
    pub base_path: String,
    /// Image size used when the query carries none (or an unusable one)
    pub default_size: u32,
    /// Level used when the query carries none (or an unknown one)
    pub default_ec_level: ErrorCorrection,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_path: DEFAULT_BASE_PATH.to_string(),
            default_size: DEFAULT_SIZE,
            default_ec_level: ErrorCorrection::default(),
        }
    }
}

impl GeneratorConfig {
    /// Create a config pointing at a different generator page
    pub fn with_base_path(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            ..Self::default()
        }
    }

    /// Link that re-opens the generator pre-filled with `raw`
    pub fn generator_link(&self, raw: &str) -> String {
        format!("{}?{}={}", self.base_path, TEXT_PARAM, urlencoding::encode(raw))
    }

    /// Link carrying every parameter of `request`
    pub fn request_link(&self, request: &GeneratorRequest) -> String {
        format!("{}?{}", self.base_path, request.to_query())
    }

    /// Parse the generator page's query string (leading `?` optional).
    ///
    /// `text` is required. A missing or unusable `size` or `ec` falls back
    /// to the configured default.
    pub fn parse_request(&self, query: &str) -> GeneratorResult<GeneratorRequest> {
        let query = query.strip_prefix('?').unwrap_or(query);

        let mut text = None;
        let mut size = None;
        let mut ec = None;
        // First occurrence of each parameter wins
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                TEXT_PARAM if text.is_none() => text = Some(value.into_owned()),
                SIZE_PARAM if size.is_none() => size = Some(value.into_owned()),
                EC_PARAM if ec.is_none() => ec = Some(value.into_owned()),
                _ => {}
            }
        }

        let size = size
            .as_deref()
            .and_then(parse_leading_int)
            .filter(|&s| s > 0)
            .unwrap_or(self.default_size);
        let ec_level = match ec.as_deref().map(str::parse::<ErrorCorrection>) {
            Some(Ok(level)) => level,
            Some(Err(err)) => {
                debug!(error = %err, "ignoring ec parameter");
                self.default_ec_level
            }
            None => self.default_ec_level,
        };

        Ok(GeneratorRequest::new(text.unwrap_or_default())?
            .with_size(size)
            .with_ec_level(ec_level))
    }
}

/// Link that re-opens the default generator page pre-filled with `raw`
pub fn generator_link(raw: &str) -> String {
    GeneratorConfig::default().generator_link(raw)
}

/// Digits at the start of `s`, ignoring leading whitespace and one `+`
/// (`"300px"` and `"+300"` are 300)
fn parse_leading_int(s: &str) -> Option<u32> {
    let s = s.trim_start();
    let s = s.strip_prefix('+').unwrap_or(s);
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s[..end].parse().ok()
}

/// Parameters of a generator run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorRequest {
    pub text: String,
    pub size: u32,
    pub ec_level: ErrorCorrection,
}

impl GeneratorRequest {
    /// Create a request with default size and level; `text` is trimmed
    pub fn new(text: impl AsRef<str>) -> GeneratorResult<Self> {
        let text = text.as_ref().trim();
        if text.is_empty() {
            return Err(GeneratorError::EmptyText);
        }
        Ok(Self {
            text: text.to_string(),
            size: DEFAULT_SIZE,
            ec_level: ErrorCorrection::default(),
        })
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    pub fn with_ec_level(mut self, ec_level: ErrorCorrection) -> Self {
        self.ec_level = ec_level;
        self
    }

    /// Parse a query string using the default config
    pub fn from_query(query: &str) -> GeneratorResult<Self> {
        GeneratorConfig::default().parse_request(query)
    }

    pub fn to_query(&self) -> String {
        format!(
            "{}={}&{}={}&{}={}",
            TEXT_PARAM,
            urlencoding::encode(&self.text),
            SIZE_PARAM,
            self.size,
            EC_PARAM,
            self.ec_level
        )
    }
}

/// Input of the TOTP generator form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TotpRequest {
    /// Issuer name, shown by authenticator apps
    pub name: String,
    /// Account name
    pub user: String,
    pub secret: String,
    /// Step in seconds; `None` or 0 means 30
    pub period: Option<u32>,
}

impl TotpRequest {
    pub fn new(name: impl Into<String>, user: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            user: user.into(),
            secret: secret.into(),
            period: None,
        }
    }

    pub fn with_period(mut self, period: u32) -> Self {
        self.period = Some(period);
        self
    }

    /// Read the form fields from an urlencoded body.
    ///
    /// An unparsable `period` is treated as absent.
    pub fn from_form(body: &str) -> Self {
        let mut request = Self::default();
        for (key, value) in url::form_urlencoded::parse(body.as_bytes()) {
            match key.as_ref() {
                "name" => request.name = value.into_owned(),
                "user" => request.user = value.into_owned(),
                "secret" => request.secret = value.into_owned(),
                "period" => request.period = value.trim().parse().ok(),
                _ => {}
            }
        }
        request
    }

    pub fn effective_period(&self) -> u32 {
        self.period.filter(|&p| p > 0).unwrap_or(DEFAULT_TOTP_PERIOD)
    }

    /// Build `otpauth://totp/NAME:USER?secret=..&issuer=NAME&period=..`
    pub fn to_uri(&self) -> GeneratorResult<String> {
        for (field, value) in [("name", &self.name), ("user", &self.user), ("secret", &self.secret)] {
            if value.is_empty() {
                return Err(GeneratorError::MissingField(field));
            }
        }

        Ok(format!(
            "otpauth://totp/{}:{}?secret={}&issuer={}&period={}",
            urlencoding::encode(&self.name),
            urlencoding::encode(&self.user),
            query_escape(&self.secret),
            query_escape(&self.name),
            self.effective_period()
        ))
    }
}

/// Percent-encode for query values, spaces as `+`
fn query_escape(value: &str) -> String {
    urlencoding::encode(value).replace("%20", "+")
}

//! Destination protocol classification.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// Schemes accepted by the HTTP grammar.
const HTTP_SCHEMES: &[&str] = &["http", "https"];

/// Schemes accepted by the FTP grammar.
const FTP_SCHEMES: &[&str] = &["ftp", "ftps", "sftp"];

/// Transport used to deliver a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    /// Local filesystem copy.
    File,

    /// HTTP multipart upload.
    Http,

    /// FTP upload.
    Ftp,
}

impl Protocol {
    /// Tag used in audit payloads and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Http => "http",
            Self::Ftp => "ftp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rewrite a `localhost` host to `127.0.0.1`.
///
/// Anything that does not parse as a URL with a `localhost` host is
/// returned unchanged.
pub fn normalize_destination(destination: &str) -> String {
    let trimmed = destination.trim();

    let Ok(mut url) = Url::parse(trimmed) else {
        return destination.to_string();
    };

    let is_localhost = url
        .host_str()
        .is_some_and(|host| host.eq_ignore_ascii_case("localhost"));

    if is_localhost && url.set_host(Some("127.0.0.1")).is_ok() {
        return url.to_string();
    }

    destination.to_string()
}

/// Classify a destination string.
///
/// The HTTP grammar is tried first, then the FTP grammar. Anything else,
/// including a bare filesystem path, is a `file` destination.
pub fn classify(destination: &str) -> Protocol {
    let normalized = normalize_destination(destination);

    if parse_strict(&normalized, HTTP_SCHEMES).is_some() {
        Protocol::Http
    } else if parse_strict(&normalized, FTP_SCHEMES).is_some() {
        Protocol::Ftp
    } else {
        Protocol::File
    }
}

/// Parse `value` as an absolute URL with one of `schemes` and a host.
fn parse_strict(value: &str, schemes: &[&str]) -> Option<Url> {
    let url = Url::parse(value.trim()).ok()?;

    if !schemes.contains(&url.scheme()) || url.cannot_be_a_base() {
        return None;
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Some(url),
        _ => None,
    }
}

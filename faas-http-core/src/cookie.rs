//! Cookie parsing (request side) and `Set-Cookie` rendering (response side).
//!
//! The request-side grammar is deliberately simple: every `name=value`
//! segment of every `Cookie` line becomes a pair, whatever its name.
//! Values are not validated against the cookie-octet grammar.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, TimeZone, Utc};

/// Timestamp layout used for `expires`, e.g. `Tue, 02 Jan 2024 03:04:05 UTC`.
const EXPIRES_FORMAT: &str = "%a, %d %b %Y %H:%M:%S UTC";

/// The `SameSite` attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SameSite {
    /// Bare `SameSite` with no value.
    Default,
    Lax,
    Strict,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Default => "SameSite",
            SameSite::Lax => "Lax",
            SameSite::Strict => "Strict",
            SameSite::None => "None",
        }
    }
}

/// A cookie to send back to the caller.
///
/// Rendered with [`Display`](fmt::Display) into a `Set-Cookie` value:
///
/// ```
/// use faas_http_core::{Cookie, SameSite};
///
/// let cookie = Cookie::new("id", "7").with_max_age(120);
/// assert_eq!(cookie.to_string(), "id=7; max-age=120");
///
/// let cookie = Cookie::new("sid", "abc")
///     .with_path("/")
///     .http_only(true)
///     .with_same_site(SameSite::Lax);
/// assert_eq!(cookie.to_string(), "sid=abc; path=/; HttpOnly; SameSite=Lax");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub path: Option<String>,
    pub domain: Option<String>,
    /// Lifetime in seconds. Only emitted when greater than zero.
    pub max_age: Option<i64>,
    /// Absolute expiry. Ignored on the wire when `max_age` is emitted.
    pub expires: Option<DateTime<Utc>>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    /// A valueless cookie that instructs the caller to drop `name`.
    ///
    /// Expiry is pinned to 2010-01-01T00:00:00Z.
    pub fn expired(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expires: Some(unset_cookie_date()),
            ..Default::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn with_expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }
}

/// Attribute order is a wire contract: max-age|expires, domain, path,
/// HttpOnly, secure, SameSite.
impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)?;

        match (self.max_age, self.expires) {
            (Some(max_age), _) if max_age > 0 => write!(f, "; max-age={max_age}")?,
            (_, Some(expires)) => write!(f, "; expires={}", expires.format(EXPIRES_FORMAT))?,
            _ => {}
        }
        if let Some(domain) = self.domain.as_deref().filter(|d| !d.is_empty()) {
            write!(f, "; domain={domain}")?;
        }
        if let Some(path) = self.path.as_deref().filter(|p| !p.is_empty()) {
            write!(f, "; path={path}")?;
        }
        if self.http_only {
            f.write_str("; HttpOnly")?;
        }
        if self.secure {
            f.write_str("; secure")?;
        }
        match self.same_site {
            Some(SameSite::Default) => f.write_str("; SameSite")?,
            Some(mode) => write!(f, "; SameSite={}", mode.as_str())?,
            None => {}
        }
        Ok(())
    }
}

/// The fixed past instant used to expire cookies.
pub fn unset_cookie_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Parse raw `Cookie` header lines into a flat map.
///
/// Each line is cut on `;`, each segment on its first `=`. Keys lose their
/// leading spaces, segments without `=` are skipped, and a value wrapped in
/// double quotes loses the quotes. Later pairs overwrite earlier ones, across
/// lines, in encounter order.
pub fn parse_cookies<I, S>(lines: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut cookies = HashMap::new();
    for line in lines {
        for segment in line.as_ref().split(';') {
            let Some((key, value)) = segment.split_once('=') else {
                continue;
            };
            cookies.insert(
                key.trim_start_matches(' ').to_string(),
                unquote(value).to_string(),
            );
        }
    }
    cookies
}

// TODO: validate cookie-octet characters once callers can opt in to strict parsing.
fn unquote(value: &str) -> &str {
    if value.len() > 1 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

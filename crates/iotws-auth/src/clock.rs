//! Time sources for signing.
//!
//! Every signature is bound to the UTC time it was produced at, so the signer
//! samples a [`DateTimeProvider`] on each call. Providers report time as a
//! 14-character `yyyyMMddHHmmss` stamp; [`SigningTime`] validates that stamp
//! and splits it into the 8-digit date and 6-digit time the signer needs.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{debug, warn};

use crate::error::SignError;

/// `strftime` format of a provider reading.
const STAMP_FORMAT: &str = "%Y%m%d%H%M%S";
/// Length of a provider reading.
const STAMP_LEN: usize = 14;
/// Length of the date part of a reading.
pub const DATE_LEN: usize = 8;
/// Length of the time part of a reading.
pub const TIME_LEN: usize = 6;

/// A source of the current UTC date and time.
pub trait DateTimeProvider {
    /// The current UTC time as `yyyyMMddHHmmss`, or `None` if no reading is available.
    fn date_time(&mut self) -> Option<String>;

    /// Refresh the provider from an external clock.
    ///
    /// When [`sync_takes_arg`](Self::sync_takes_arg) is `true`, `hint` carries
    /// the current time as `yyyyMMddHHmmss`; otherwise it is ignored and may be `None`.
    fn sync(&mut self, hint: Option<&str>);

    /// Whether [`sync`](Self::sync) needs the current time passed in.
    fn sync_takes_arg(&self) -> bool;
}

/// A validated signing instant, split into its date and time parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningTime {
    date: String,
    time: String,
}

impl SigningTime {
    /// Parse a `yyyyMMddHHmmss` reading.
    ///
    /// # Errors
    /// Returns [`SignError::InvalidTimestamp`] unless the reading is exactly 14
    /// ASCII digits forming a real calendar date and time.
    ///
    /// # Examples
    ///
    /// ```
    /// use iotws_auth::SigningTime;
    ///
    /// let t = SigningTime::parse("20170508123058").unwrap();
    /// assert_eq!(t.date(), "20170508");
    /// assert_eq!(t.time(), "123058");
    /// assert_eq!(t.amz_date(), "20170508T123058Z");
    /// ```
    pub fn parse(stamp: &str) -> Result<Self, SignError> {
        if stamp.len() != STAMP_LEN || !stamp.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SignError::InvalidTimestamp(stamp.to_owned()));
        }
        NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT)
            .map_err(|_| SignError::InvalidTimestamp(stamp.to_owned()))?;

        let (date, time) = stamp.split_at(DATE_LEN);
        Ok(Self {
            date: date.to_owned(),
            time: time.to_owned(),
        })
    }

    /// Build a signing time from a UTC instant.
    #[must_use]
    pub fn from_datetime(instant: DateTime<Utc>) -> Self {
        Self {
            date: instant.format("%Y%m%d").to_string(),
            time: instant.format("%H%M%S").to_string(),
        }
    }

    /// Sample a provider and validate its reading.
    ///
    /// # Errors
    /// Returns [`SignError::TimeUnavailable`] when the provider has no reading,
    /// or [`SignError::InvalidTimestamp`] when the reading is malformed.
    pub fn sample(provider: &mut dyn DateTimeProvider) -> Result<Self, SignError> {
        let stamp = provider.date_time().ok_or(SignError::TimeUnavailable)?;
        Self::parse(&stamp)
    }

    /// The date part, `yyyyMMdd`.
    #[must_use]
    pub fn date(&self) -> &str {
        &self.date
    }

    /// The time part, `HHmmss`.
    #[must_use]
    pub fn time(&self) -> &str {
        &self.time
    }

    /// The ISO 8601 basic stamp used by SigV4, `yyyyMMddTHHmmssZ`.
    #[must_use]
    pub fn amz_date(&self) -> String {
        format!("{}T{}Z", self.date, self.time)
    }
}

/// Reads the host's UTC wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl DateTimeProvider for SystemClock {
    fn date_time(&mut self) -> Option<String> {
        Some(Utc::now().format(STAMP_FORMAT).to_string())
    }

    fn sync(&mut self, _hint: Option<&str>) {}

    fn sync_takes_arg(&self) -> bool {
        false
    }
}

/// A clock set from outside, e.g. from an RTC or a time pushed by a gateway.
///
/// Has no reading until the first successful [`sync`](DateTimeProvider::sync).
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    stamp: Option<String>,
}

impl ManualClock {
    /// A clock with no reading yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A clock already set to `stamp` (`yyyyMMddHHmmss`).
    ///
    /// # Errors
    /// Returns [`SignError::InvalidTimestamp`] for a malformed stamp.
    pub fn at(stamp: &str) -> Result<Self, SignError> {
        SigningTime::parse(stamp)?;
        Ok(Self {
            stamp: Some(stamp.to_owned()),
        })
    }
}

impl DateTimeProvider for ManualClock {
    fn date_time(&mut self) -> Option<String> {
        self.stamp.clone()
    }

    fn sync(&mut self, hint: Option<&str>) {
        let Some(hint) = hint else {
            return;
        };
        match SigningTime::parse(hint) {
            Ok(_) => self.stamp = Some(hint.to_owned()),
            Err(e) => warn!(error = %e, "ignoring clock sync hint"),
        }
    }

    fn sync_takes_arg(&self) -> bool {
        true
    }
}

/// A clock that learns the time from the `Date` header of an HTTP response.
///
/// Devices without an RTC or NTP can send any request to a well-known server
/// and read back the `Date` header. The fetch itself is supplied by the caller
/// as a closure returning the raw response head (or `None` when the server was
/// unreachable). When a refresh fails the last good reading is kept, starting
/// from `20120101000000`.
pub struct HttpDateClock<F> {
    fetch: F,
    stamp: String,
}

impl<F> HttpDateClock<F>
where
    F: FnMut() -> Option<String>,
{
    /// Reading used until the first successful refresh.
    pub const INITIAL_STAMP: &str = "20120101000000";

    /// Create a clock over the given response fetcher.
    pub fn new(fetch: F) -> Self {
        Self {
            fetch,
            stamp: Self::INITIAL_STAMP.to_owned(),
        }
    }
}

impl<F> std::fmt::Debug for HttpDateClock<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDateClock")
            .field("stamp", &self.stamp)
            .finish_non_exhaustive()
    }
}

impl<F> DateTimeProvider for HttpDateClock<F>
where
    F: FnMut() -> Option<String>,
{
    fn date_time(&mut self) -> Option<String> {
        self.sync(None);
        Some(self.stamp.clone())
    }

    fn sync(&mut self, _hint: Option<&str>) {
        let Some(response) = (self.fetch)() else {
            warn!(stamp = %self.stamp, "could not reach time server, using old timestamp");
            return;
        };
        match parse_http_date(&response) {
            Some(stamp) => {
                debug!(%stamp, "synced clock from HTTP Date header");
                self.stamp = stamp;
            }
            None => warn!(stamp = %self.stamp, "no usable Date header, using old timestamp"),
        }
    }

    fn sync_takes_arg(&self) -> bool {
        false
    }
}

/// Extract the `Date` header from a raw HTTP response head as `yyyyMMddHHmmss`.
///
/// # Examples
///
/// ```
/// use iotws_auth::clock::parse_http_date;
///
/// let response = "HTTP/1.1 400 Bad Request\r\nDate: Mon, 08 May 2017 12:30:58 GMT\r\n\r\n";
/// assert_eq!(parse_http_date(response).as_deref(), Some("20170508123058"));
/// ```
#[must_use]
pub fn parse_http_date(response: &str) -> Option<String> {
    let value = response.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.trim().eq_ignore_ascii_case("date").then(|| value.trim())
    })?;

    let parsed = DateTime::parse_from_rfc2822(value).ok()?;
    Some(parsed.with_timezone(&Utc).format(STAMP_FORMAT).to_string())
}

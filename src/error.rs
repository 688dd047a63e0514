// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `august_homekit` library.
//!
//! This module provides the error hierarchy used across the library: value
//! validation, vendor API communication, payload parsing, and configuration.
//! Every error can be classified with [`Error::status_class`], which drives
//! how a failure is logged at its call site.

use std::fmt;

use thiserror::Error;

/// Guidance logged alongside rate-limited vendor responses.
pub const RATE_LIMIT_GUIDANCE: &str = "the vendor API is rate limiting requests; \
     consider raising refreshRate or pushRate for this lock";

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error occurred while talking to the vendor API.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Error occurred while parsing a vendor payload.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Error occurred while loading or validating configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The lock is not managed by the platform.
    #[error("lock not found: {0}")]
    LockNotFound(String),
}

impl Error {
    /// Classifies this error by vendor response status.
    ///
    /// Only HTTP status failures carry a real classification; transport,
    /// parse and configuration errors are [`StatusClass::Unclassified`].
    #[must_use]
    pub fn status_class(&self) -> StatusClass {
        match self {
            Self::Api(ApiError::Status { status, .. }) => StatusClass::from_status(*status),
            _ => StatusClass::Unclassified,
        }
    }

    /// Returns `true` if the vendor asked us to slow down.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        self.status_class() == StatusClass::RateLimited
    }
}

/// Classification of a vendor response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusClass {
    /// The request was accepted (2xx).
    Accepted,
    /// The request was malformed or refused (4xx other than 429).
    ClientError,
    /// Too many requests (429).
    RateLimited,
    /// Anything else, including transport failures.
    Unclassified,
}

impl StatusClass {
    /// Classifies an HTTP status code.
    ///
    /// # Examples
    ///
    /// ```
    /// use august_homekit::error::StatusClass;
    ///
    /// assert_eq!(StatusClass::from_status(200), StatusClass::Accepted);
    /// assert_eq!(StatusClass::from_status(429), StatusClass::RateLimited);
    /// assert_eq!(StatusClass::from_status(400), StatusClass::ClientError);
    /// assert_eq!(StatusClass::from_status(503), StatusClass::Unclassified);
    /// ```
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            200..=299 => Self::Accepted,
            429 => Self::RateLimited,
            400..=499 => Self::ClientError,
            _ => Self::Unclassified,
        }
    }

    /// Returns a short name for logging.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::ClientError => "client error",
            Self::RateLimited => "rate limited",
            Self::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for StatusClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: i64,
        /// Maximum allowed value.
        max: i64,
        /// The actual value that was provided.
        actual: i64,
    },

    /// An unrecognized target state string was provided.
    #[error("invalid target state: {0}")]
    InvalidTargetState(String),

    /// The host tried to write a characteristic that is read-only.
    #[error("characteristic {0} is read-only")]
    ReadOnlyCharacteristic(&'static str),

    /// A characteristic received a value it cannot represent.
    #[error("invalid value {value} for characteristic {characteristic}")]
    InvalidCharacteristicValue {
        /// The characteristic name.
        characteristic: &'static str,
        /// The rejected value.
        value: u8,
    },
}

/// Errors related to vendor API communication.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response arrived.
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The vendor answered with a non-success status.
    #[error("vendor API returned HTTP {status}: {body}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The raw response body.
        body: String,
    },

    /// Connection to the vendor API failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// A credential cannot be sent as an HTTP header value.
    #[error("invalid value for header {0}")]
    InvalidHeader(&'static str),

    /// The push subscription could not be established.
    #[error("subscription failed: {0}")]
    SubscriptionFailed(String),
}

/// Errors related to parsing vendor payloads.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the payload.
    #[error("missing field in payload: {0}")]
    MissingField(String),

    /// Failed to parse a specific value.
    #[error("failed to parse {field}: {message}")]
    InvalidValue {
        /// The field that failed to parse.
        field: String,
        /// Description of the parsing failure.
        message: String,
    },
}

/// Errors related to platform configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration document is not valid JSON for this schema.
    #[error("invalid configuration document: {0}")]
    Json(#[from] serde_json::Error),

    /// Credentials required to reach the vendor API are missing.
    #[error("missing credential: {0}")]
    MissingCredential(&'static str),

    /// A setting has an unusable value.
    #[error("invalid setting {name}: {message}")]
    InvalidSetting {
        /// The setting name.
        name: &'static str,
        /// Why the value was rejected.
        message: String,
    },
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_error_display() {
        let err = ValueError::OutOfRange {
            min: 0,
            max: 100,
            actual: 150,
        };
        assert_eq!(err.to_string(), "value 150 is out of range [0, 100]");
    }

    #[test]
    fn status_errors_are_classified() {
        let limited: Error = ApiError::Status {
            status: 429,
            body: "slow down".to_string(),
        }
        .into();
        assert_eq!(limited.status_class(), StatusClass::RateLimited);
        assert!(limited.is_rate_limited());

        let bad: Error = ApiError::Status {
            status: 400,
            body: String::new(),
        }
        .into();
        assert_eq!(bad.status_class(), StatusClass::ClientError);
    }

    #[test]
    fn non_status_errors_are_unclassified() {
        let err: Error = ApiError::ConnectionFailed("reset".to_string()).into();
        assert_eq!(err.status_class(), StatusClass::Unclassified);

        let err: Error = ParseError::MissingField("LockStatus".to_string()).into();
        assert_eq!(err.status_class(), StatusClass::Unclassified);
    }

    #[test]
    fn parse_error_display() {
        let err = ParseError::MissingField("state".to_string());
        assert_eq!(err.to_string(), "missing field in payload: state");
    }

    #[test]
    fn status_class_boundaries() {
        assert_eq!(StatusClass::from_status(202), StatusClass::Accepted);
        assert_eq!(StatusClass::from_status(404), StatusClass::ClientError);
        assert_eq!(StatusClass::from_status(500), StatusClass::Unclassified);
        assert_eq!(StatusClass::RateLimited.to_string(), "rate limited");
    }
}

//! pinmanlib keeps a ledger of stored-value PIN codes and their remaining balances and provides the
//! pieces used to spend them: selection of a covering set of PINs, consumption with a recoverable
//! usage log, rotating backups, INI settings, update checks and console script automation.

pub mod automation;
pub mod backup;
pub mod config;
pub mod data;
pub mod pin;
pub mod select;
pub mod store;
pub mod update;
pub mod utils;

mod misc;

use std::fmt;

use lazy_static::lazy_static;

/// Result type for pinmanlib
pub type Result<T> = core::result::Result<T, Error>;

/// Error values for pinmanlib
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Input failed validation, i.e., malformed PIN or zero balance
    BadInput,
    /// The PIN, backup or log file does not exist
    NotFound,
    /// The PIN is already present in the store
    Duplicate,
    /// No combination of at most five unlocked PINs covers the requested amount
    InsufficientBalance,
    /// Requested amount exceeds the per-payment limit
    LimitExceeded,
    Io,
    SerdeJson,
    /// Settings file could not be read or a setting value was rejected
    Config,
    Network,
    ParseError,
    /// A step of the payment page workflow did not yield the expected value
    Automation,
    Unrecognized,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Error::BadInput => "invalid input; PINs take the form 12345-67890-12345-67890",
            Error::NotFound => "not found",
            Error::Duplicate => "PIN is already present",
            Error::InsufficientBalance => "insufficient balance",
            Error::LimitExceeded => "amount exceeds the per-payment limit",
            Error::Io => "file access failed",
            Error::SerdeJson => "failed to process JSON",
            Error::Config => "invalid settings",
            Error::Network => "network request failed",
            Error::ParseError => "failed to parse value",
            Error::Automation => "payment page automation failed",
            Error::Unrecognized => "unrecognized error",
        };
        write!(f, "{msg}")
    }
}

impl std::error::Error for Error {}

use std::io;
impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        if err.kind() == io::ErrorKind::NotFound {
            Error::NotFound
        } else {
            Error::Io
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        use log::error;
        error!("serde_json::Error: {err}");
        Error::SerdeJson
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Error {
        use log::error;
        error!("reqwest::Error: {err}");
        Error::Network
    }
}

impl From<ini::Error> for Error {
    fn from(err: ini::Error) -> Error {
        use log::error;
        error!("ini::Error: {err}");
        match err {
            ini::Error::Io(e) => e.into(),
            ini::Error::Parse(_) => Error::Config,
        }
    }
}

/// Largest amount that may be paid in a single payment
pub const MAX_PAYMENT_AMOUNT: u64 = 250_000;

/// Largest number of PINs a payment form accepts
pub const MAX_PINS_PER_PAYMENT: usize = 5;

lazy_static! {
    /// Endpoint that describes the most recent published release
    pub static ref RELEASES_URL: String =
        "https://api.github.com/repos/TUVup/EggPinManager/releases/latest".to_string();
}

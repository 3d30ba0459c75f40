//! Provides data structures used to persist PINs and describe their consumption

use std::fmt;

use serde::{Deserialize, Serialize};

/// In-memory state of a single PIN
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub struct PinEntry {
    /// Remaining balance
    pub balance: u64,
    /// Locked PINs are never chosen when selecting PINs for a payment
    pub locked: bool,
}

impl PinEntry {
    /// Creates an unlocked entry with the given balance
    pub fn new(balance: u64) -> Self {
        PinEntry {
            balance,
            locked: false,
        }
    }
}

/// On-disk form of a PIN entry. Unlocked PINs are written as a bare balance so files remain
/// readable by tools that expect a plain `{pin: balance}` object.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum StoredEntry {
    Balance(u64),
    Detailed {
        balance: u64,
        #[serde(default)]
        locked: bool,
    },
}

impl From<StoredEntry> for PinEntry {
    fn from(stored: StoredEntry) -> Self {
        match stored {
            StoredEntry::Balance(balance) => PinEntry::new(balance),
            StoredEntry::Detailed { balance, locked } => PinEntry { balance, locked },
        }
    }
}

impl From<&PinEntry> for StoredEntry {
    fn from(entry: &PinEntry) -> Self {
        if entry.locked {
            StoredEntry::Detailed {
                balance: entry.balance,
                locked: true,
            }
        } else {
            StoredEntry::Balance(entry.balance)
        }
    }
}

/// Describes how much of a PIN was spent by a payment
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UsageRecord {
    pub pin: String,
    /// Balance before the payment
    pub original: u64,
    pub used: u64,
    /// Balance after the payment. A PIN with nothing remaining is removed from the store.
    pub remaining: u64,
}

impl fmt::Display for UsageRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [original: {}] [used: {}] [remaining: {}]",
            self.pin, self.original, self.used, self.remaining
        )
    }
}

#[test]
fn stored_entry_forms() {
    let plain: StoredEntry = serde_json::from_str("5000").unwrap();
    assert_eq!(PinEntry::from(plain), PinEntry::new(5000));

    let locked: StoredEntry = serde_json::from_str(r#"{"balance": 300, "locked": true}"#).unwrap();
    assert_eq!(
        PinEntry::from(locked),
        PinEntry {
            balance: 300,
            locked: true
        }
    );

    let no_flag: StoredEntry = serde_json::from_str(r#"{"balance": 7}"#).unwrap();
    assert_eq!(PinEntry::from(no_flag), PinEntry::new(7));

    assert_eq!(
        serde_json::to_string(&StoredEntry::from(&PinEntry::new(10))).unwrap(),
        "10"
    );
}

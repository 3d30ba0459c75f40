//! PIN store backed by a JSON file, a human-readable listing and an append-only usage log

use std::{
    collections::BTreeMap,
    fs::{self, File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use chrono::Local;
use lazy_static::lazy_static;
use log::{debug, error, info, warn};
use regex::Regex;

use crate::{
    data::{PinEntry, StoredEntry, UsageRecord},
    pin::{format_pin, mask_pin, normalize_pin},
    select::find_pins_for_amount,
    Error, Result,
};

lazy_static! {
    /// Matches the per-PIN lines of the usage log. The `원금` label is written by older releases.
    static ref USAGE_LINE_REGEX: Regex = Regex::new(
        r"([0-9]{5}-[0-9]{5}-[0-9]{5}-[0-9]{5}) \[(?:original|원금): ([0-9]+)\]"
    )
    .unwrap();
}

/// Timestamp format used in the usage log
const LOG_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Locations of the files maintained by a [PinStore]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StorePaths {
    /// JSON object mapping each PIN to its entry
    pub pin_file: PathBuf,
    /// Numbered, human-readable listing rewritten on every change
    pub txt_file: PathBuf,
    /// Append-only log of PIN usage
    pub log_file: PathBuf,
}

/// Ledger of PINs and balances. Every mutating operation writes the JSON file and the text listing.
#[derive(Debug)]
pub struct PinStore {
    paths: StorePaths,
    pins: BTreeMap<String, PinEntry>,
}

impl PinStore {
    /// Opens the store described by `paths`. A missing or malformed PIN file yields an empty store.
    pub fn open(paths: StorePaths) -> Self {
        let pins = load_pins(&paths.pin_file);
        debug!(
            "Loaded {} PINs from {}",
            pins.len(),
            paths.pin_file.display()
        );
        PinStore { paths, pins }
    }

    /// Re-reads the PIN file, i.e., after a backup has been restored over it
    pub fn reload(&mut self) {
        self.pins = load_pins(&self.paths.pin_file);
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// Writes the PINs to the JSON file
    pub fn save_pins(&self) -> Result<()> {
        let stored: BTreeMap<&String, StoredEntry> =
            self.pins.iter().map(|(k, v)| (k, v.into())).collect();
        let json = serde_json::to_string_pretty(&stored)?;
        write_creating_parent(&self.paths.pin_file, json.as_bytes())
    }

    /// Writes the numbered text listing
    pub fn save_pins_to_txt(&self) -> Result<()> {
        let mut listing = String::new();
        for (idx, (pin, entry)) in self.pins.iter().enumerate() {
            listing.push_str(&format!("{}. {}: {}\n", idx + 1, pin, entry.balance));
        }
        write_creating_parent(&self.paths.txt_file, listing.as_bytes())
    }

    fn persist(&self) -> Result<()> {
        self.save_pins()?;
        self.save_pins_to_txt()
    }

    /// Adds a PIN given in either grouped or bare form. Returns the canonical form of the PIN.
    pub fn add_pin(&mut self, pin: &str, balance: u64) -> Result<String> {
        let pin = normalize_pin(pin)?;
        if balance == 0 {
            error!("Refusing to add {} with a zero balance", mask_pin(&pin));
            return Err(Error::BadInput);
        }
        if self.pins.contains_key(&pin) {
            return Err(Error::Duplicate);
        }
        self.pins.insert(pin.clone(), PinEntry::new(balance));
        self.persist()?;
        info!("Added PIN {} with balance {balance}", mask_pin(&pin));
        Ok(pin)
    }

    /// Removes a PIN given in either grouped or bare form. Returns the removed entry.
    pub fn delete_pin(&mut self, pin: &str) -> Result<PinEntry> {
        let pin = format_pin(pin.trim());
        match self.pins.remove(&pin) {
            Some(entry) => {
                self.persist()?;
                info!("Deleted PIN {}", mask_pin(&pin));
                Ok(entry)
            }
            None => Err(Error::NotFound),
        }
    }

    /// Sets the balance of an existing PIN. A balance of zero removes the PIN.
    pub fn update_pin_balance(&mut self, pin: &str, new_balance: u64) -> Result<()> {
        let pin = format_pin(pin.trim());
        if new_balance == 0 {
            return self.delete_pin(&pin).map(|_| ());
        }
        match self.pins.get_mut(&pin) {
            Some(entry) => {
                entry.balance = new_balance;
                self.persist()?;
                info!("Updated balance of {} to {new_balance}", mask_pin(&pin));
                Ok(())
            }
            None => Err(Error::NotFound),
        }
    }

    /// Sets or clears the lock flag of an existing PIN
    pub fn set_locked(&mut self, pin: &str, locked: bool) -> Result<()> {
        let pin = format_pin(pin.trim());
        match self.pins.get_mut(&pin) {
            Some(entry) => {
                entry.locked = locked;
                self.persist()?;
                info!(
                    "{} PIN {}",
                    if locked { "Locked" } else { "Unlocked" },
                    mask_pin(&pin)
                );
                Ok(())
            }
            None => Err(Error::NotFound),
        }
    }

    /// Returns true if the PIN, given in either grouped or bare form, is present
    pub fn pin_check(&self, pin: &str) -> bool {
        self.pins.contains_key(&format_pin(pin.trim()))
    }

    pub fn get(&self, pin: &str) -> Option<&PinEntry> {
        self.pins.get(&format_pin(pin.trim()))
    }

    /// Iterates over PINs in ascending PIN order
    pub fn list_pins(&self) -> impl Iterator<Item = (&String, &PinEntry)> {
        self.pins.iter()
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    /// Sum of all balances, locked or not
    pub fn total_balance(&self) -> u64 {
        self.pins.values().map(|e| e.balance).sum()
    }

    /// Sum of the balances of unlocked PINs
    pub fn available_balance(&self) -> u64 {
        self.pins
            .values()
            .filter(|e| !e.locked)
            .map(|e| e.balance)
            .sum()
    }

    /// Selects unlocked PINs with a balance covering `amount`. See [find_pins_for_amount].
    pub fn find_pins_for_amount(&self, amount: u64) -> Vec<(String, u64)> {
        let candidates: Vec<(String, u64)> = self
            .pins
            .iter()
            .filter(|(_, e)| !e.locked && e.balance > 0)
            .map(|(k, e)| (k.clone(), e.balance))
            .collect();
        find_pins_for_amount(amount, &candidates)
    }

    /// Spends `amount` from the selected PINs in order. Each PIN contributes as much as is still
    /// owed; a PIN left with a remainder keeps it and a fully spent PIN is removed. Nothing changes
    /// if the PIN file cannot be written.
    pub fn consume(&mut self, selection: &[(String, u64)], amount: u64) -> Result<Vec<UsageRecord>> {
        let (staged, records) = self.stage_consumption(selection, amount)?;
        self.commit(staged)?;
        Ok(records)
    }

    /// As [PinStore::consume], but the payment is appended to the usage log before the balances
    /// are written. A payment that cannot be logged is not spent.
    pub fn consume_and_log(
        &mut self,
        selection: &[(String, u64)],
        product: &str,
        amount: u64,
    ) -> Result<Vec<UsageRecord>> {
        let (staged, records) = self.stage_consumption(selection, amount)?;
        self.log_pin_usage(product, amount, &records)?;
        self.commit(staged)?;
        Ok(records)
    }

    fn stage_consumption(
        &self,
        selection: &[(String, u64)],
        amount: u64,
    ) -> Result<(BTreeMap<String, PinEntry>, Vec<UsageRecord>)> {
        if selection.iter().any(|(pin, _)| !self.pins.contains_key(pin)) {
            error!("Selection refers to a PIN that is no longer present");
            return Err(Error::NotFound);
        }

        let mut staged = self.pins.clone();
        let mut records = vec![];
        let mut total_used: u64 = 0;
        for (pin, _) in selection {
            if total_used >= amount {
                break;
            }
            let original = match staged.get(pin) {
                Some(entry) => entry.balance,
                None => return Err(Error::NotFound),
            };
            let used = original.min(amount - total_used);
            let remaining = original - used;
            if remaining > 0 {
                if let Some(entry) = staged.get_mut(pin) {
                    entry.balance = remaining;
                }
            } else {
                staged.remove(pin);
            }
            total_used += used;
            records.push(UsageRecord {
                pin: pin.clone(),
                original,
                used,
                remaining,
            });
        }
        Ok((staged, records))
    }

    /// Replaces the PINs with `staged` and writes them out. On failure the previous PINs are put
    /// back in memory and, as far as possible, on disk.
    fn commit(&mut self, staged: BTreeMap<String, PinEntry>) -> Result<()> {
        let previous = std::mem::replace(&mut self.pins, staged);
        if let Err(e) = self.persist() {
            self.pins = previous;
            if let Err(e) = self.save_pins() {
                error!("Failed to put back previous PIN file: {e}");
            }
            return Err(e);
        }
        Ok(())
    }

    /// Appends a payment to the usage log: a header naming the product and amount followed by one
    /// line per PIN.
    pub fn log_pin_usage(&self, product: &str, amount: u64, records: &[UsageRecord]) -> Result<()> {
        let now = Local::now().format(LOG_TIME_FORMAT).to_string();
        let mut entry = format!("{now} - {product} - {amount}\n");
        for record in records {
            entry.push_str(&format!("{now} : {record}\n"));
        }

        if let Some(parent) = self.paths.log_file.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.paths.log_file)?;
        file.write_all(entry.as_bytes())?;
        info!("{product} - {amount} paid with {} PINs", records.len());
        Ok(())
    }

    /// Returns the full text of the usage log
    pub fn show_log(&self) -> Result<String> {
        Ok(fs::read_to_string(&self.paths.log_file)?)
    }

    /// Restores every PIN named in the usage log to the balance it had before the logged use. Later
    /// lines win over earlier ones. Returns the number of log lines applied.
    pub fn load_pins_from_log(&mut self) -> Result<usize> {
        let log = fs::read_to_string(&self.paths.log_file)?;
        let mut staged = self.pins.clone();
        let mut restored = 0;
        for line in log.lines() {
            if let Some(caps) = USAGE_LINE_REGEX.captures(line) {
                let balance = match caps[2].parse::<u64>() {
                    Ok(b) => b,
                    Err(e) => {
                        warn!("Skipping log line with unreadable balance: {e}");
                        continue;
                    }
                };
                staged
                    .entry(caps[1].to_string())
                    .and_modify(|e| e.balance = balance)
                    .or_insert_with(|| PinEntry::new(balance));
                restored += 1;
            }
        }
        self.commit(staged)?;
        info!("Recovered {restored} PIN balances from the usage log");
        Ok(restored)
    }
}

/// Reads the PIN file. Absent or unparseable files produce an empty map.
fn load_pins(path: &Path) -> BTreeMap<String, PinEntry> {
    let f = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            debug!("No PINs read from {}: {e}", path.display());
            return BTreeMap::new();
        }
    };
    match serde_json::from_reader::<_, BTreeMap<String, StoredEntry>>(f) {
        Ok(stored) => stored.into_iter().map(|(k, v)| (k, v.into())).collect(),
        Err(e) => {
            warn!(
                "Failed to parse {}: {e}. Continuing with no PINs.",
                path.display()
            );
            BTreeMap::new()
        }
    }
}

fn write_creating_parent(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    if let Err(e) = fs::write(path, contents) {
        error!("Unable to write {}: {e}", path.display());
        return Err(Error::Io);
    }
    Ok(())
}

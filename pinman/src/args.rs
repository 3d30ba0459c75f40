//! Command line arguments accepted by the pinman utility

use std::path::PathBuf;

use clap::Parser;

/// Value given to --add-pin when the flag is used without a PIN
pub const PROMPT_FOR_PIN: &str = "-";

/// Arguments are grouped into Actions (which change the PIN store), Diagnostics (which only read
/// it), Utilities (backups, recovery and settings) and Logging. At least one Action, Diagnostic or
/// Utility argument must be provided.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Keeps track of stored-value PIN codes and spends them on payment pages", long_about = None)]
pub struct PinManArgs {
    /// Adds a PIN, given as 20 digits with or without hyphens. Omit the value (or pass -) to be
    /// prompted for the PIN without echo. Requires --balance.
    #[arg(
        long,
        short = 'a',
        value_name = "PIN",
        num_args = 0..=1,
        default_missing_value = PROMPT_FOR_PIN,
        requires = "balance",
        help_heading = "Actions"
    )]
    pub add_pin: Option<String>,

    /// Balance used with --add-pin or --update-pin
    #[arg(long, short = 'b', value_name = "AMOUNT", help_heading = "Actions")]
    pub balance: Option<u64>,

    /// Sets the balance of an existing PIN to the --balance value. A balance of 0 deletes the PIN.
    #[arg(long, value_name = "PIN", requires = "balance", help_heading = "Actions")]
    pub update_pin: Option<String>,

    /// Deletes a PIN
    #[arg(long, short = 'd', value_name = "PIN", help_heading = "Actions")]
    pub delete_pin: Option<String>,

    /// Excludes a PIN from selection
    #[arg(long, value_name = "PIN", help_heading = "Actions")]
    pub lock_pin: Option<String>,

    /// Makes a locked PIN available for selection again
    #[arg(long, value_name = "PIN", help_heading = "Actions")]
    pub unlock_pin: Option<String>,

    /// Spends the given amount by typing the selected PINs, one at a time, into a browser form
    #[arg(long, short = 'u', value_name = "AMOUNT", help_heading = "Actions")]
    pub use_amount: Option<u64>,

    /// Spends PINs on a payment page by way of scripts pasted into its developer console. The form
    /// is only submitted when the `payments` setting is True.
    #[arg(long, help_heading = "Actions")]
    pub auto_use: bool,

    /// Lists PINs with their balances
    #[arg(long, short = 'l', help_heading = "Diagnostics")]
    pub list_pins: bool,

    /// Shows the total and available (unlocked) balance
    #[arg(long, short = 't', help_heading = "Diagnostics")]
    pub total: bool,

    /// Shows which PINs would be used to pay the given amount without spending them
    #[arg(long, short = 's', value_name = "AMOUNT", help_heading = "Diagnostics")]
    pub select: Option<u64>,

    /// Prints the PIN usage log
    #[arg(long, help_heading = "Diagnostics")]
    pub show_log: bool,

    /// Checks for a newer release
    #[arg(long, help_heading = "Diagnostics")]
    pub check_updates: bool,

    /// Copies the PIN file to the backups folder
    #[arg(long, help_heading = "Utilities")]
    pub create_backup: bool,

    /// Lists available backups, newest first
    #[arg(long, help_heading = "Utilities")]
    pub list_backups: bool,

    /// Replaces the PIN file with the named backup
    #[arg(long, value_name = "BACKUP", help_heading = "Utilities")]
    pub restore_backup: Option<String>,

    /// Restores the balance of every PIN named in the usage log to its value before the logged use
    #[arg(long, help_heading = "Utilities")]
    pub recover_from_log: bool,

    /// Prints all settings
    #[arg(long, help_heading = "Utilities")]
    pub show_settings: bool,

    /// Changes a setting, i.e., --set payments=True. May be repeated.
    #[arg(long, value_name = "KEY=VALUE", help_heading = "Utilities")]
    pub set: Vec<String>,

    /// Restores default settings
    #[arg(long, help_heading = "Utilities")]
    pub reset_settings: bool,

    /// Folder holding settings, data and backups (defaults to .pinman in the home directory)
    #[arg(long, value_name = "DIR", help_heading = "Utilities")]
    pub home: Option<PathBuf>,

    /// Full path and filename of YAML-formatted configuration file for log4rs logging mechanism.
    /// See https://docs.rs/log4rs/latest/log4rs/ for details.
    #[arg(short = 'c', long, help_heading = "Logging")]
    pub logging_config: Option<String>,

    /// Log output to the console
    #[arg(short = 'o', long, conflicts_with = "logging_config", help_heading = "Logging")]
    pub log_to_console: bool,
}

impl PinManArgs {
    /// Returns true if any argument that changes the PIN file was provided
    pub fn has_action(&self) -> bool {
        self.add_pin.is_some()
            || self.update_pin.is_some()
            || self.delete_pin.is_some()
            || self.lock_pin.is_some()
            || self.unlock_pin.is_some()
            || self.use_amount.is_some()
            || self.auto_use
            || self.restore_backup.is_some()
            || self.recover_from_log
    }

    /// Returns true if any Action, Diagnostic or Utility argument was provided
    pub fn has_work(&self) -> bool {
        self.has_action()
            || self.list_pins
            || self.total
            || self.select.is_some()
            || self.show_log
            || self.check_updates
            || self.create_backup
            || self.list_backups
            || self.show_settings
            || !self.set.is_empty()
            || self.reset_settings
    }
}

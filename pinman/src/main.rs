//! `pinman` keeps track of stored-value PIN codes and their balances, chooses which PINs to spend
//! for a payment and records what was spent.
//!
//! See [PinManArgs] for usage details.

#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

#[macro_use]
extern crate cfg_if;

use std::path::PathBuf;

use chrono::Local;
use clap::{CommandFactory, Parser};
use log::{debug, error, info};
use zeroize::Zeroizing;

use pinmanlib::{
    automation::{auto_use_console, auto_use_keyboard, Payment},
    backup::BackupManager,
    config::Settings,
    store::PinStore,
    update::{check_for_updates, check_for_updates_auto, UpdateStatus, CURRENT_VERSION},
    utils::state::{create_app_home, AppLayout},
    Error, RELEASES_URL,
};

mod args;
mod console;
mod utils;

use args::{PinManArgs, PROMPT_FOR_PIN};
use console::{PrintKeyboard, PromptConsole};
use utils::configure_logging;

cfg_if! {
    if #[cfg(target_os = "windows")] {
        mod no_bold;
        use crate::no_bold::NoBold;
    } else {
        use colored::Colorize;
    }
}

/// Confirms provided arguments include at least one Action, Diagnostic or Utility argument
fn sanity_check(args: &PinManArgs) -> bool {
    if !args.has_work() {
        println!(
            "{}: at least one Action, Diagnostic or Utility argument must be provided\n",
            "ERROR".bold()
        );
        let _ = PinManArgs::command().print_help();
        false
    } else {
        true
    }
}

/// Reports a failed operation on the console and in the log
fn report_error(what: &str, e: Error) {
    error!("Failed to {what}: {e}");
    println!("{}: failed to {what}: {e}", "ERROR".bold());
}

fn print_payment(payment: &Payment) {
    println!(
        "{}: {} - {}",
        "Paid".bold(),
        payment.product,
        payment.amount
    );
    for record in &payment.records {
        println!("\t{record}");
    }
}

/// Copies the PIN file to the backups folder when automatic backups are enabled and the newest
/// backup is older than the configured interval. Failures are logged and otherwise ignored.
fn auto_backup(settings: &Settings, store: &PinStore, backups: &BackupManager) {
    if !settings.auto_backup() || !store.paths().pin_file.exists() {
        return;
    }
    if !backups.backup_due(settings.backup_interval(), Local::now().naive_local()) {
        debug!("Automatic backup is not yet due");
        return;
    }
    match backups.create_backup() {
        Ok(name) => info!("Created automatic backup {name}"),
        Err(e) => error!("Automatic backup failed: {e}"),
    }
}

/// Point of entry for `pinman` application.
///
/// See [PinManArgs] for usage details.
#[tokio::main]
async fn main() {
    interactive_main().await;
}

/// `interactive_main` provides the command line interface for the application.
///
/// Settings are applied first, since they determine where the PIN store lives. Actions that change
/// the PIN store run next, followed by diagnostics.
async fn interactive_main() {
    let args = PinManArgs::parse();
    if !sanity_check(&args) {
        return;
    }

    let home: PathBuf = match &args.home {
        Some(home) => home.clone(),
        None => match create_app_home() {
            Ok(home) => home,
            Err(e) => {
                println!(
                    "{}: failed to create application folder: {e}",
                    "ERROR".bold()
                );
                return;
            }
        },
    };
    let layout = match AppLayout::create(&home) {
        Ok(layout) => layout,
        Err(e) => {
            println!(
                "{}: failed to prepare {}: {e}",
                "ERROR".bold(),
                home.display()
            );
            return;
        }
    };
    configure_logging(&args, &layout);

    let app = format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    info!("Starting {app} using {}", layout.home.display());

    let mut settings = match Settings::load(&layout.config_file, &layout.data_dir) {
        Ok(settings) => settings,
        Err(e) => {
            report_error("load settings", e);
            return;
        }
    };

    // ----------------------------------------------------------------------------------
    // settings
    //  - reset_settings
    //  - set
    //  - show_settings
    // ----------------------------------------------------------------------------------
    if args.reset_settings {
        match settings.reset_to_default() {
            Ok(()) => println!("Settings restored to defaults"),
            Err(e) => {
                report_error("reset settings", e);
                return;
            }
        }
    }

    for assignment in &args.set {
        let Some((key, value)) = assignment.split_once('=') else {
            report_error(&format!("parse {assignment:?} as KEY=VALUE"), Error::BadInput);
            return;
        };
        if let Err(e) = settings.set_value(key.trim(), value) {
            report_error(&format!("set {}", key.trim()), e);
            return;
        }
        println!("{} = {}", key.trim(), settings.get_value(key.trim()).unwrap_or_default());
    }

    if args.show_settings {
        for (key, value) in settings.all_settings() {
            println!("{}: {value}", key.as_str().bold());
        }
    }

    if !args.check_updates {
        match check_for_updates_auto(&mut settings, &RELEASES_URL).await {
            Ok(UpdateStatus::Available(release)) => {
                println!(
                    "{} is available (running {CURRENT_VERSION}): {}",
                    release.tag_name.as_str().bold(),
                    release.html_url
                );
            }
            Ok(_) => {}
            Err(e) => debug!("Automatic update check failed: {e}"),
        }
    }

    let mut store = PinStore::open(settings.store_paths());
    let backups = match BackupManager::new(&store.paths().pin_file, &layout.backup_dir) {
        Ok(backups) => backups,
        Err(e) => {
            report_error("prepare backups folder", e);
            return;
        }
    };

    // ----------------------------------------------------------------------------------
    // actions
    // ----------------------------------------------------------------------------------
    if args.has_action() {
        auto_backup(&settings, &store, &backups);
    }

    if let Some(backup_name) = &args.restore_backup {
        match backups.restore_backup(backup_name) {
            Ok(()) => {
                store.reload();
                println!("Restored {backup_name} ({} PINs)", store.len());
            }
            Err(e) => {
                report_error(&format!("restore {backup_name}"), e);
                return;
            }
        }
    }

    if args.recover_from_log {
        match store.load_pins_from_log() {
            Ok(count) => println!("Restored {count} PINs from the usage log"),
            Err(e) => {
                report_error("recover PINs from the usage log", e);
                return;
            }
        }
    }

    if let Some(pin) = &args.add_pin {
        let pin = if pin == PROMPT_FOR_PIN {
            match rpassword::prompt_password("Enter PIN: ") {
                Ok(pin) => Zeroizing::new(pin),
                Err(e) => {
                    println!("{}: failed to read PIN: {e}", "ERROR".bold());
                    return;
                }
            }
        } else {
            Zeroizing::new(pin.clone())
        };
        let balance = args.balance.unwrap_or_default();
        match store.add_pin(&pin, balance) {
            Ok(pin) => println!("Added {pin} with a balance of {balance}"),
            Err(e) => {
                report_error("add PIN", e);
                return;
            }
        }
    }

    if let Some(pin) = &args.update_pin {
        let balance = args.balance.unwrap_or_default();
        match store.update_pin_balance(pin, balance) {
            Ok(()) if balance == 0 => println!("Deleted {pin}"),
            Ok(()) => println!("Set balance of {pin} to {balance}"),
            Err(e) => {
                report_error("update PIN", e);
                return;
            }
        }
    }

    if let Some(pin) = &args.delete_pin {
        match store.delete_pin(pin) {
            Ok(entry) => println!("Deleted {pin} (balance: {})", entry.balance),
            Err(e) => {
                report_error("delete PIN", e);
                return;
            }
        }
    }

    for (pin, locked) in [(&args.lock_pin, true), (&args.unlock_pin, false)] {
        if let Some(pin) = pin {
            let verb = if locked { "lock" } else { "unlock" };
            match store.set_locked(pin, locked) {
                Ok(()) => println!("{verb}ed {pin}"),
                Err(e) => {
                    report_error(&format!("{verb} PIN"), e);
                    return;
                }
            }
        }
    }

    if let Some(amount) = args.use_amount {
        match auto_use_keyboard(&mut store, &mut PrintKeyboard::default(), amount) {
            Ok(payment) => print_payment(&payment),
            Err(e) => {
                report_error(&format!("pay {amount}"), e);
                return;
            }
        }
    }

    if args.auto_use {
        let submit = settings.payments();
        if !submit {
            println!("The form will be filled but not submitted. Use --set payments=True to submit automatically.");
        }
        match auto_use_console(&mut store, &mut PromptConsole::default(), submit) {
            Ok(payment) => print_payment(&payment),
            Err(e) => {
                report_error("complete the payment page", e);
                return;
            }
        }
    }

    // ----------------------------------------------------------------------------------
    // utilities
    // ----------------------------------------------------------------------------------
    if args.create_backup {
        match backups.create_backup() {
            Ok(name) => println!("Created backup {name}"),
            Err(e) => {
                report_error("create backup", e);
                return;
            }
        }
    }

    if args.list_backups {
        let names = backups.list_backups();
        if names.is_empty() {
            println!("No backups in {}", backups.backup_dir().display());
        }
        for name in names {
            println!("{name}");
        }
    }

    // ----------------------------------------------------------------------------------
    // diagnostics
    // ----------------------------------------------------------------------------------
    if args.list_pins {
        for (idx, (pin, entry)) in store.list_pins().enumerate() {
            let lock = if entry.locked { " (locked)" } else { "" };
            println!("{}. {pin}: {}{lock}", idx + 1, entry.balance);
        }
    }

    if args.total {
        println!("{}: {}", "Total balance".bold(), store.total_balance());
        println!("{}: {}", "Available balance".bold(), store.available_balance());
    }

    if let Some(amount) = args.select {
        let selected = store.find_pins_for_amount(amount);
        if selected.is_empty() {
            println!(
                "No combination of PINs covers {amount} (available balance: {})",
                store.available_balance()
            );
        } else {
            let covered: u64 = selected.iter().map(|(_, balance)| balance).sum();
            for (pin, balance) in &selected {
                println!("{pin}: {balance}");
            }
            println!("{}: {covered}", "Total".bold());
        }
    }

    if args.show_log {
        match store.show_log() {
            Ok(log) => print!("{log}"),
            Err(Error::NotFound) => println!("The usage log is empty"),
            Err(e) => report_error("read the usage log", e),
        }
    }

    if args.check_updates {
        match check_for_updates(&mut settings, &RELEASES_URL).await {
            Ok(UpdateStatus::Available(release)) => println!(
                "{} is available (running {CURRENT_VERSION}): {}",
                release.tag_name.as_str().bold(),
                release.html_url
            ),
            Ok(_) => println!("{app} is {}", "up to date".green()),
            Err(e) => report_error("check for updates", e),
        }
    }
}

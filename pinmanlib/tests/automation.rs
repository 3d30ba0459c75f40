use std::collections::VecDeque;

use pinmanlib::{
    automation::{auto_use_console, auto_use_keyboard, Console, Keyboard, KEYBOARD_PRODUCT},
    store::{PinStore, StorePaths},
    Error, Result,
};
use tempfile::TempDir;

/// Console double that answers `copy(...)` scripts from a queue and records every script run
struct ScriptedConsole {
    copied: VecDeque<String>,
    scripts: Vec<String>,
}

impl ScriptedConsole {
    fn new(amount: &str, product: &str) -> Self {
        ScriptedConsole {
            copied: VecDeque::from(vec![amount.to_string(), product.to_string()]),
            scripts: vec![],
        }
    }
}

impl Console for ScriptedConsole {
    fn run_script(&mut self, script: &str) -> Result<()> {
        self.scripts.push(script.to_string());
        Ok(())
    }

    fn read_copied(&mut self) -> Result<String> {
        self.copied.pop_front().ok_or(Error::Automation)
    }
}

#[derive(Default)]
struct RecordingKeyboard {
    typed: Vec<String>,
}

impl Keyboard for RecordingKeyboard {
    fn type_text(&mut self, text: &str) -> Result<()> {
        self.typed.push(text.to_string());
        Ok(())
    }
}

fn store(dir: &TempDir) -> PinStore {
    let mut store = PinStore::open(StorePaths {
        pin_file: dir.path().join("pins.json"),
        txt_file: dir.path().join("pins.txt"),
        log_file: dir.path().join("pin_log.txt"),
    });
    store.add_pin("11111-11111-11111-11111", 1000).unwrap();
    store.add_pin("22222-22222-22222-22222", 5000).unwrap();
    store.add_pin("33333-33333-33333-33333", 50000).unwrap();
    store
}

#[test]
fn console_fills_form_and_spends() {
    let dir = TempDir::new().unwrap();
    let mut store = store(&dir);
    let mut console = ScriptedConsole::new("5,500", "Gem pack");

    let payment = auto_use_console(&mut store, &mut console, false).unwrap();
    assert_eq!(payment.amount, 5500);
    assert_eq!(payment.product, "Gem pack");
    assert_eq!(payment.records.len(), 2);

    // two reads, add boxes, inject, agree; no submit
    assert_eq!(console.scripts.len(), 5);
    assert!(console.scripts[2].contains("< 2)"));
    assert!(console.scripts[3].contains("'11111', '11111', '11111', '11111', '22222'"));
    assert!(console.scripts[4].contains("#all-agree"));
    assert!(!console.scripts.iter().any(|s| s.contains("goSubmit")));

    assert!(!store.pin_check("11111-11111-11111-11111"));
    assert_eq!(store.get("22222-22222-22222-22222").unwrap().balance, 500);
    assert!(store.show_log().unwrap().contains("Gem pack - 5500"));
}

#[test]
fn console_submits_when_payments_enabled() {
    let dir = TempDir::new().unwrap();
    let mut store = store(&dir);
    let mut console = ScriptedConsole::new("1000", "Coins");
    auto_use_console(&mut store, &mut console, true).unwrap();
    assert_eq!(console.scripts.last().unwrap(), "goSubmit(document.form)");
}

#[test]
fn console_errors_leave_store_untouched() {
    let dir = TempDir::new().unwrap();
    let mut store = store(&dir);

    let mut console = ScriptedConsole::new("", "Coins");
    assert_eq!(
        auto_use_console(&mut store, &mut console, true),
        Err(Error::Automation)
    );

    let mut console = ScriptedConsole::new("300,000", "Coins");
    assert_eq!(
        auto_use_console(&mut store, &mut console, true),
        Err(Error::LimitExceeded)
    );

    store.set_locked("33333-33333-33333-33333", true).unwrap();
    let mut console = ScriptedConsole::new("10,000", "Coins");
    assert_eq!(
        auto_use_console(&mut store, &mut console, true),
        Err(Error::InsufficientBalance)
    );
    assert_eq!(console.scripts.len(), 2);
    assert_eq!(store.total_balance(), 56000);
}

#[test]
fn keyboard_types_unformatted_pins() {
    let dir = TempDir::new().unwrap();
    let mut store = store(&dir);
    let mut keyboard = RecordingKeyboard::default();

    let payment = auto_use_keyboard(&mut store, &mut keyboard, 3000).unwrap();
    assert_eq!(payment.product, KEYBOARD_PRODUCT);
    assert_eq!(
        keyboard.typed,
        vec!["11111111111111111111", "22222222222222222222"]
    );
    assert_eq!(store.total_balance(), 53000);

    assert_eq!(
        auto_use_keyboard(&mut store, &mut keyboard, 0),
        Err(Error::BadInput)
    );
    assert_eq!(
        auto_use_keyboard(&mut store, &mut keyboard, 250_001),
        Err(Error::LimitExceeded)
    );
}

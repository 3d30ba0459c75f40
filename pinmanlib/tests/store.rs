use std::fs;

use pinmanlib::{
    store::{PinStore, StorePaths},
    Error,
};
use tempfile::TempDir;

const PIN_A: &str = "11111-11111-11111-11111";
const PIN_B: &str = "22222-22222-22222-22222";
const PIN_C: &str = "33333-33333-33333-33333";

fn paths(dir: &TempDir) -> StorePaths {
    StorePaths {
        pin_file: dir.path().join("data").join("pins.json"),
        txt_file: dir.path().join("data").join("pins.txt"),
        log_file: dir.path().join("data").join("pin_log.txt"),
    }
}

fn store_with(dir: &TempDir, pins: &[(&str, u64)]) -> PinStore {
    let mut store = PinStore::open(paths(dir));
    for (pin, balance) in pins {
        store.add_pin(pin, *balance).unwrap();
    }
    store
}

#[test]
fn missing_or_malformed_file_is_empty() {
    let dir = TempDir::new().unwrap();
    assert!(PinStore::open(paths(&dir)).is_empty());

    let p = paths(&dir);
    fs::create_dir_all(p.pin_file.parent().unwrap()).unwrap();
    fs::write(&p.pin_file, "{ not json").unwrap();
    assert!(PinStore::open(p).is_empty());
}

#[test]
fn add_normalizes_and_persists() {
    let dir = TempDir::new().unwrap();
    let mut store = PinStore::open(paths(&dir));
    let pin = store.add_pin("11111111111111111111", 5000).unwrap();
    assert_eq!(pin, PIN_A);
    assert!(store.pin_check("11111111111111111111"));

    let reopened = PinStore::open(paths(&dir));
    assert_eq!(reopened.get(PIN_A).unwrap().balance, 5000);

    let listing = fs::read_to_string(paths(&dir).txt_file).unwrap();
    assert_eq!(listing, format!("1. {PIN_A}: 5000\n"));
}

#[test]
fn add_rejects_duplicates_bad_format_and_zero() {
    let dir = TempDir::new().unwrap();
    let mut store = store_with(&dir, &[(PIN_A, 1000)]);
    assert_eq!(store.add_pin(PIN_A, 2000), Err(Error::Duplicate));
    assert_eq!(store.add_pin("1234", 2000), Err(Error::BadInput));
    assert_eq!(store.add_pin(PIN_B, 0), Err(Error::BadInput));
    assert_eq!(store.len(), 1);
    assert_eq!(store.get(PIN_A).unwrap().balance, 1000);
}

#[test]
fn reads_plain_balance_files() {
    let dir = TempDir::new().unwrap();
    let p = paths(&dir);
    fs::create_dir_all(p.pin_file.parent().unwrap()).unwrap();
    fs::write(
        &p.pin_file,
        format!(r#"{{"{PIN_A}": 3000, "{PIN_B}": {{"balance": 700, "locked": true}}}}"#),
    )
    .unwrap();
    let store = PinStore::open(p);
    assert_eq!(store.total_balance(), 3700);
    assert_eq!(store.available_balance(), 3000);
    assert!(store.get(PIN_B).unwrap().locked);
}

#[test]
fn delete_removes_from_totals_and_file() {
    let dir = TempDir::new().unwrap();
    let mut store = store_with(&dir, &[(PIN_A, 1000), (PIN_B, 2000)]);
    assert_eq!(store.total_balance(), 3000);

    let removed = store.delete_pin("22222222222222222222").unwrap();
    assert_eq!(removed.balance, 2000);
    assert_eq!(store.total_balance(), 1000);
    assert_eq!(store.available_balance(), 1000);
    assert_eq!(store.delete_pin(PIN_B), Err(Error::NotFound));

    let reopened = PinStore::open(paths(&dir));
    assert!(!reopened.pin_check(PIN_B));
    assert_eq!(reopened.total_balance(), 1000);
    let json = fs::read_to_string(paths(&dir).pin_file).unwrap();
    assert!(!json.contains(PIN_B));
}

#[test]
fn update_balance_and_zero_deletes() {
    let dir = TempDir::new().unwrap();
    let mut store = store_with(&dir, &[(PIN_A, 1000)]);
    store.update_pin_balance(PIN_A, 4500).unwrap();
    assert_eq!(store.get(PIN_A).unwrap().balance, 4500);
    assert_eq!(store.update_pin_balance(PIN_B, 10), Err(Error::NotFound));
    store.update_pin_balance(PIN_A, 0).unwrap();
    assert!(store.is_empty());
}

#[test]
fn locked_pins_are_not_selected() {
    let dir = TempDir::new().unwrap();
    let mut store = store_with(&dir, &[(PIN_A, 1000), (PIN_B, 5000), (PIN_C, 2000)]);
    store.set_locked(PIN_B, true).unwrap();

    assert_eq!(store.available_balance(), 3000);
    assert!(store.find_pins_for_amount(4000).is_empty());
    let selected = store.find_pins_for_amount(2500);
    assert!(selected.iter().all(|(pin, _)| pin != PIN_B));

    // the lock flag survives a reload
    let mut reopened = PinStore::open(paths(&dir));
    assert!(reopened.get(PIN_B).unwrap().locked);
    reopened.set_locked(PIN_B, false).unwrap();
    let selected = reopened.find_pins_for_amount(6000);
    assert!(selected.iter().any(|(pin, _)| pin == PIN_B));
    assert_eq!(store.set_locked("99999-99999-99999-99999", true), Err(Error::NotFound));
}

#[test]
fn consume_spends_in_order() {
    let dir = TempDir::new().unwrap();
    let mut store = store_with(&dir, &[(PIN_A, 1000), (PIN_B, 3000), (PIN_C, 10000)]);
    let selected = store.find_pins_for_amount(2500);
    assert_eq!(selected.len(), 2);

    let records = store.consume(&selected, 2500).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].pin, PIN_A);
    assert_eq!((records[0].used, records[0].remaining), (1000, 0));
    assert_eq!(records[1].pin, PIN_B);
    assert_eq!((records[1].used, records[1].remaining), (1500, 1500));

    assert!(!store.pin_check(PIN_A));
    assert_eq!(store.get(PIN_B).unwrap().balance, 1500);
    assert_eq!(store.total_balance(), 11500);

    let reopened = PinStore::open(paths(&dir));
    assert_eq!(reopened.total_balance(), 11500);
}

#[test]
fn consume_rejects_unknown_pins() {
    let dir = TempDir::new().unwrap();
    let mut store = store_with(&dir, &[(PIN_A, 1000)]);
    let selection = vec![(PIN_B.to_string(), 500)];
    assert_eq!(store.consume(&selection, 500), Err(Error::NotFound));
    assert_eq!(store.total_balance(), 1000);
}

#[test]
fn usage_log_recovers_balances() {
    let dir = TempDir::new().unwrap();
    let mut store = store_with(&dir, &[(PIN_A, 1000), (PIN_B, 3000)]);
    assert_eq!(store.show_log(), Err(Error::NotFound));
    assert_eq!(store.load_pins_from_log(), Err(Error::NotFound));

    let selected = store.find_pins_for_amount(4000);
    let records = store.consume(&selected, 4000).unwrap();
    store.log_pin_usage("Gift", 4000, &records).unwrap();
    assert!(store.is_empty());

    let log = store.show_log().unwrap();
    assert!(log.contains(" - Gift - 4000"));
    assert!(log.contains(&format!("{PIN_A} [original: 1000] [used: 1000] [remaining: 0]")));

    assert_eq!(store.load_pins_from_log().unwrap(), 2);
    assert_eq!(store.get(PIN_A).unwrap().balance, 1000);
    assert_eq!(store.get(PIN_B).unwrap().balance, 3000);
}

#[test]
fn recovery_reads_legacy_labels() {
    let dir = TempDir::new().unwrap();
    let p = paths(&dir);
    fs::create_dir_all(p.log_file.parent().unwrap()).unwrap();
    fs::write(
        &p.log_file,
        format!(
            "Gift - 5000\n2024-01-01 10:00:00 : {PIN_C} [원금: 5000] [사용된 금액: 5000] [남은 잔액: 0]\nnoise line\n"
        ),
    )
    .unwrap();
    let mut store = PinStore::open(p);
    assert_eq!(store.load_pins_from_log().unwrap(), 1);
    assert_eq!(store.get(PIN_C).unwrap().balance, 5000);
}

#[test]
fn empty_pins_are_never_selected() {
    let dir = TempDir::new().unwrap();
    let p = paths(&dir);
    fs::create_dir_all(p.pin_file.parent().unwrap()).unwrap();
    fs::write(&p.pin_file, format!(r#"{{"{PIN_A}": 0, "{PIN_B}": 5000}}"#)).unwrap();
    let mut store = PinStore::open(p);

    let selected = store.find_pins_for_amount(1000);
    assert_eq!(selected, vec![(PIN_B.to_string(), 5000)]);

    let records = store.consume(&selected, 1000).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].pin, PIN_B);
    assert_eq!(store.get(PIN_B).unwrap().balance, 4000);
}

#[test]
fn failed_save_leaves_balances_alone() {
    let dir = TempDir::new().unwrap();
    let mut store = store_with(&dir, &[(PIN_A, 1000), (PIN_B, 3000)]);
    let p = paths(&dir);
    fs::remove_file(&p.txt_file).unwrap();
    fs::create_dir(&p.txt_file).unwrap();

    let selected = store.find_pins_for_amount(2500);
    assert_eq!(store.consume(&selected, 2500), Err(Error::Io));
    assert_eq!(store.get(PIN_A).unwrap().balance, 1000);
    assert_eq!(store.total_balance(), 4000);
    assert_eq!(PinStore::open(p).total_balance(), 4000);
}

#[test]
fn unlogged_payment_is_not_spent() {
    let dir = TempDir::new().unwrap();
    let mut store = store_with(&dir, &[(PIN_A, 1000), (PIN_B, 3000)]);
    fs::create_dir(&paths(&dir).log_file).unwrap();

    let selected = store.find_pins_for_amount(2500);
    assert!(store.consume_and_log(&selected, "Gift", 2500).is_err());
    assert_eq!(store.total_balance(), 4000);
    assert_eq!(PinStore::open(paths(&dir)).total_balance(), 4000);
}

#[test]
fn recovery_applies_latest_logged_balance() {
    let dir = TempDir::new().unwrap();
    let mut store = store_with(&dir, &[(PIN_B, 3000)]);

    let selected = store.find_pins_for_amount(1000);
    store.consume_and_log(&selected, "First", 1000).unwrap();
    let selected = store.find_pins_for_amount(500);
    store.consume_and_log(&selected, "Second", 500).unwrap();
    assert_eq!(store.get(PIN_B).unwrap().balance, 1500);

    // the second payment logged an original of 2000, which overrides the first one's 3000
    assert_eq!(store.load_pins_from_log().unwrap(), 2);
    assert_eq!(store.get(PIN_B).unwrap().balance, 2000);
}

// Call from a test while chasing a failure to see the store's debug output
#[allow(dead_code)]
fn init_console_logging() {
    use log::LevelFilter;
    use log4rs::{
        append::console::ConsoleAppender,
        config::{Appender, Config, Root},
        encode::pattern::PatternEncoder,
    };
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{l} {M}: {m}{n}")))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Debug));
    match config {
        Ok(config) => {
            if let Err(e) = log4rs::init_config(config) {
                println!("ERROR: failed to configure test logging: {e:?}");
            }
        }
        Err(e) => println!("ERROR: failed to prepare test logging: {e:?}"),
    }
}

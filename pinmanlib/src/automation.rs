//! Spending PINs on third-party payment pages
//!
//! Two workflows are supported. The console workflow reads the amount and product from a payment
//! page, fills in the PIN form and optionally submits it, all by way of scripts executed in the
//! page's developer console. The keyboard workflow types PINs into a form for an amount given by
//! the user. How scripts are executed and how keystrokes are delivered is left to implementations
//! of [Console] and [Keyboard].

pub mod scripts;

use log::error;

use crate::{
    data::UsageRecord, pin::unformat_pin, store::PinStore, Error, Result, MAX_PAYMENT_AMOUNT,
};

use scripts::*;

/// Developer console of a payment page
pub trait Console {
    /// Executes `script` in the console
    fn run_script(&mut self, script: &str) -> Result<()>;

    /// Returns the value most recently placed on the clipboard by a `copy(...)` script
    fn read_copied(&mut self) -> Result<String>;
}

/// Destination for simulated typing
pub trait Keyboard {
    /// Types `text` into the focused input
    fn type_text(&mut self, text: &str) -> Result<()>;
}

/// Product label recorded in the usage log for keyboard payments
pub const KEYBOARD_PRODUCT: &str = "browser";

/// Describes a completed payment
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Payment {
    pub product: String,
    pub amount: u64,
    pub records: Vec<UsageRecord>,
}

fn check_amount(amount: u64) -> Result<()> {
    if amount == 0 {
        error!("Payment amount must be greater than zero");
        return Err(Error::BadInput);
    }
    if amount > MAX_PAYMENT_AMOUNT {
        error!("Payment amount {amount} exceeds the limit of {MAX_PAYMENT_AMOUNT}");
        return Err(Error::LimitExceeded);
    }
    Ok(())
}

fn select(store: &PinStore, amount: u64) -> Result<Vec<(String, u64)>> {
    let selected = store.find_pins_for_amount(amount);
    if selected.is_empty() {
        error!(
            "No combination of PINs covers {amount} (available balance: {})",
            store.available_balance()
        );
        return Err(Error::InsufficientBalance);
    }
    Ok(selected)
}

/// Logs the payment and spends the selected PINs
fn settle(
    store: &mut PinStore,
    selected: &[(String, u64)],
    product: &str,
    amount: u64,
) -> Result<Payment> {
    let records = store.consume_and_log(selected, product, amount)?;
    Ok(Payment {
        product: product.to_string(),
        amount,
        records,
    })
}

/// Reads the amount due and product name from the payment page, fills the PIN form with PINs
/// selected from `store` and ticks the agreement checkbox. The form is submitted only when `submit`
/// is true. The PINs are spent and logged once the form has been filled.
pub fn auto_use_console<C: Console>(
    store: &mut PinStore,
    console: &mut C,
    submit: bool,
) -> Result<Payment> {
    console.run_script(&find_amount_script())?;
    let amount_text = console.read_copied()?;
    console.run_script(&find_product_script())?;
    let product = console.read_copied()?.trim().to_string();

    if amount_text.trim().is_empty() || product.is_empty() {
        error!("Failed to read the amount or product name from the payment page");
        return Err(Error::Automation);
    }
    let amount = parse_amount(&amount_text)?;
    check_amount(amount)?;

    let selected = select(store, amount)?;
    let pins: Vec<String> = selected.iter().map(|(pin, _)| pin.clone()).collect();

    if let Some(script) = add_pin_boxes_script(pins.len()) {
        console.run_script(&script)?;
    }
    if let Some(script) = inject_pins_script(&pins) {
        console.run_script(&script)?;
    }
    console.run_script(&click_all_agree_script())?;
    if submit {
        console.run_script(&submit_script())?;
    }

    settle(store, &selected, &product, amount)
}

/// Types the PINs selected to cover `amount`, without hyphens, one after another, then spends and
/// logs them.
pub fn auto_use_keyboard<K: Keyboard>(
    store: &mut PinStore,
    keyboard: &mut K,
    amount: u64,
) -> Result<Payment> {
    check_amount(amount)?;
    let selected = select(store, amount)?;
    for (pin, _) in &selected {
        keyboard.type_text(&unformat_pin(pin))?;
    }
    settle(store, &selected, KEYBOARD_PRODUCT, amount)
}

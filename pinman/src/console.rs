//! Terminal-backed implementations of the automation traits
//!
//! pinman does not drive a browser itself. Scripts are printed for the user to paste into the
//! developer console of the payment page, and values copied by those scripts are pasted back at a
//! prompt. PINs for the keyboard workflow are shown one at a time for the user to type.

use std::io::{self, BufRead, Write};

use log::debug;

#[cfg(target_os = "windows")]
use crate::no_bold::NoBold;
#[cfg(not(target_os = "windows"))]
use colored::Colorize;

use pinmanlib::{
    automation::{Console, Keyboard},
    Result,
};

fn read_line() -> Result<String> {
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn prompt(message: &str) -> Result<String> {
    print!("{message}");
    io::stdout().flush()?;
    read_line()
}

/// Relays scripts to a developer console by way of the terminal
#[derive(Default)]
pub(crate) struct PromptConsole {
    step: usize,
}

impl Console for PromptConsole {
    fn run_script(&mut self, script: &str) -> Result<()> {
        self.step += 1;
        debug!("Console step {}: {script}", self.step);
        println!(
            "{} {}: paste the following into the developer console of the payment page",
            "Step".bold(),
            self.step
        );
        println!("{script}");
        prompt("Press Enter when done...")?;
        Ok(())
    }

    fn read_copied(&mut self) -> Result<String> {
        prompt("Paste the copied value and press Enter: ")
    }
}

/// Shows each PIN for the user to type into the focused form field
#[derive(Default)]
pub(crate) struct PrintKeyboard {
    typed: usize,
}

impl Keyboard for PrintKeyboard {
    fn type_text(&mut self, text: &str) -> Result<()> {
        self.typed += 1;
        println!("{} {}: {}", "PIN".bold(), self.typed, text.green());
        prompt("Press Enter once it has been entered...")?;
        Ok(())
    }
}

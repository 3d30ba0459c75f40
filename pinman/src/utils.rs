//! Utility functions used by the pinman utility

use std::fs;

use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
};

use pinmanlib::utils::state::AppLayout;

use crate::args::PinManArgs;
#[cfg(target_os = "windows")]
use crate::no_bold::NoBold;
#[cfg(not(target_os = "windows"))]
use colored::Colorize;

/// Placeholder in the embedded logging template replaced with the log file location
const LOG_PATH_PLACEHOLDER: &str = "<HOME DIR PINMAN>";

/// Configures logging per logging-related elements of the provided [PinManArgs] instance.
///
/// There are two logging-related options: [logging_config](PinManArgs::logging_config) and
/// [log_to_console](PinManArgs::log_to_console). The `log_to_console` option only emits logs from
/// the Info level. When neither option is given, the log.yaml file in the application home is
/// used, after being created from a template that logs to pinman.log if it does not yet exist.
pub(crate) fn configure_logging(args: &PinManArgs, layout: &AppLayout) {
    if let Some(logging_config) = &args.logging_config {
        if let Err(e) = log4rs::init_file(logging_config, Default::default()) {
            println!(
                "{}: failed to configure logging using {} with {:?}. Continuing without logging.",
                "ERROR".bold(),
                logging_config,
                e
            );
        }
        return;
    }

    if args.log_to_console {
        // if there's no config, prepare one using stdout
        let stdout = ConsoleAppender::builder()
            .encoder(Box::new(PatternEncoder::new("{m}{n}")))
            .build();
        match Config::builder()
            .appender(Appender::builder().build("stdout", Box::new(stdout)))
            .build(Root::builder().appender("stdout").build(LevelFilter::Info))
        {
            Ok(config) => {
                let handle = log4rs::init_config(config);
                if let Err(e) = handle {
                    println!(
                        "{}: failed to configure logging for stdout with {:?}. Continuing without logging.",
                        "ERROR".bold(), e
                    );
                }
            }
            Err(e) => {
                println!("{}: failed to prepare default logging configuration with {:?}. Continuing without logging", "ERROR".bold(), e);
            }
        }
        return;
    }

    let logging_config = &layout.logging_config;
    if !logging_config.exists() {
        let log_file = layout.home.join("pinman.log");
        let template = include_str!("../assets/log.yaml")
            .replace(LOG_PATH_PLACEHOLDER, &log_file.to_string_lossy().replace('\\', "/"));
        if let Err(e) = fs::write(logging_config, template) {
            println!(
                "{}: failed to write {logging_config:?} with {e:?}. Continuing without logging.",
                "ERROR".bold()
            );
            return;
        }
    }
    if let Err(e) = log4rs::init_file(logging_config, Default::default()) {
        println!(
            "{}: failed to configure logging using {logging_config:?} with {e:?}. Continuing without logging.",
            "ERROR".bold()
        );
    }
}

//! Compares the running version against the most recent published release

use chrono::{DateTime, Duration, Local};
use log::{debug, info, warn};
use serde::Deserialize;

use crate::{
    config::Settings,
    misc::network::{get_json, TIMEOUT},
    Error, Result,
};

/// Version of this library, which is released in lockstep with the utility
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fields of interest from the release description
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
pub struct Release {
    pub tag_name: String,
    /// Page from which the release can be downloaded
    pub html_url: String,
}

/// Outcome of an update check
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum UpdateStatus {
    UpToDate,
    Available(Release),
    /// Automatic checks are disabled or the last check was less than a day ago
    Skipped,
}

/// Parses `v1.2.3` or `1.2.3` into its numeric components
pub fn parse_version(version: &str) -> Result<Vec<u32>> {
    version
        .trim()
        .trim_start_matches(['v', 'V'])
        .split('.')
        .map(|part| part.parse::<u32>().map_err(|_| Error::ParseError))
        .collect()
}

/// Returns true if `latest` is a higher version than `current`
pub fn is_newer(latest: &str, current: &str) -> Result<bool> {
    Ok(parse_version(latest)? > parse_version(current)?)
}

/// Automatic checks run at most once a day
pub fn update_check_due(last_check: Option<DateTime<Local>>, now: DateTime<Local>) -> bool {
    match last_check {
        Some(last) => now - last >= Duration::days(1),
        None => true,
    }
}

/// Retrieves the description of the most recent release from `url`
pub async fn fetch_latest_release(url: &str) -> Result<Release> {
    get_json::<Release>(url, TIMEOUT).await
}

/// Checks `url` for a release newer than [CURRENT_VERSION]. The time of the attempt is recorded
/// in the settings whether or not the check succeeds.
pub async fn check_for_updates(settings: &mut Settings, url: &str) -> Result<UpdateStatus> {
    let result = fetch_latest_release(url).await;
    if let Err(e) = settings.set_last_update_check(Local::now()) {
        warn!("Failed to record time of update check: {e}");
    }

    let release = result?;
    if is_newer(&release.tag_name, CURRENT_VERSION)? {
        info!("New version available: {}", release.tag_name);
        Ok(UpdateStatus::Available(release))
    } else {
        debug!("{} is not newer than {CURRENT_VERSION}", release.tag_name);
        Ok(UpdateStatus::UpToDate)
    }
}

/// As [check_for_updates] but only when automatic checks are enabled and due
pub async fn check_for_updates_auto(settings: &mut Settings, url: &str) -> Result<UpdateStatus> {
    if !settings.auto_update_check()
        || !update_check_due(settings.last_update_check(), Local::now())
    {
        return Ok(UpdateStatus::Skipped);
    }
    check_for_updates(settings, url).await
}

#[test]
fn version_ordering() {
    assert_eq!(parse_version("v1.2.10").unwrap(), vec![1, 2, 10]);
    assert!(is_newer("v1.2.10", "1.2.9").unwrap());
    assert!(is_newer("2.0", "1.9.9").unwrap());
    assert!(!is_newer("v1.2.3", "1.2.3").unwrap());
    assert!(is_newer("1.2.3.1", "1.2.3").unwrap());
    assert_eq!(parse_version("1.0.0-beta"), Err(Error::ParseError));
}

#[test]
fn checks_at_most_daily() {
    let now = Local::now();
    assert!(update_check_due(None, now));
    assert!(!update_check_due(Some(now - Duration::hours(23)), now));
    assert!(update_check_due(Some(now - Duration::hours(25)), now));
}

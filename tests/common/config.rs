//! Test configuration helpers

use cp_stats::Config;
use std::path::Path;
use std::time::Duration;

/// Configuration pointed at a mock API, with all files inside `dir`
///
/// Backoff is shortened and the throttle disabled so runs finish quickly in real time.
pub fn test_config(base_url: &str, dir: &Path) -> Config {
    let mut config = Config::default();
    config.api.base_url = base_url.to_string();
    config.api.request_timeout = Duration::from_secs(5);
    config.retry.initial_backoff = Duration::from_millis(1);
    config.batch.throttle = Duration::ZERO;
    config.paths.input = dir.join("users.csv");
    config.paths.language_stats = dir.join("language_stats.csv");
    config.paths.solved_stats = dir.join("solved_stats.csv");
    config.database.path = dir.join("cp-stats.db");
    config
}

/// Write a username list with a `country` column next to `username`
pub fn write_users(path: &Path, users: &[(&str, &str)]) {
    let mut contents = String::from("username,country\n");
    for (name, country) in users {
        contents.push_str(&format!("{name},{country}\n"));
    }
    std::fs::write(path, contents).unwrap();
}

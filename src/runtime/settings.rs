use tracing::warn;

use crate::config;

/// Accept loaded settings only if they are readable and in range.
fn checked(
    loaded: Result<config::Settings, ::config::ConfigError>,
) -> Result<config::Settings, String> {
    let settings = loaded.map_err(|e| format!("failed to load config, using defaults: {e}"))?;
    settings
        .validate()
        .map_err(|msg| format!("invalid config, using defaults: {msg}"))?;
    Ok(settings)
}

pub fn load_settings() -> config::Settings {
    match checked(config::Settings::load()) {
        Ok(s) => s,
        Err(reason) => {
            // Config is optional; failures should not prevent the app from starting.
            // The log file may not exist yet, so say it on stderr as well.
            warn!("{reason}");
            eprintln!("encore: {reason}");
            config::Settings::default()
        }
    }
}

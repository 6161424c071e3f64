//! Cross-platform locations for apiusage data

use std::path::PathBuf;

const APP_DIR: &str = "apiusage";

/// Get application data directory
pub fn app_data_dir() -> Option<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        dirs::data_local_dir().map(|d| d.join(APP_DIR)) // ~/.local/share/apiusage
    }
    #[cfg(not(target_os = "linux"))]
    {
        dirs::data_dir().map(|d| d.join(APP_DIR))
    }
}

/// Export read when neither `--input` nor an endpoint is configured
pub fn default_metrics_file() -> Option<PathBuf> {
    app_data_dir().map(|d| d.join("metrics.json"))
}

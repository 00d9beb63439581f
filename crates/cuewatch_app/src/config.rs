use std::fs;
use std::path::Path;
use std::time::Duration;

use cuewatch_core::PollSchedule;
use cuewatch_engine::ApiSettings;
use cuewatch_logging::{cw_debug, cw_info, cw_warn};
use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_CONFIG_FILE: &str = "cuewatch.ron";

/// Shortest poll interval accepted from the file.
const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// On-disk settings. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub api: ApiConfig,
    pub poll: PollConfig,
    pub voice_over: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            poll: PollConfig::default(),
            voice_over: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct ApiConfig {
    pub base_url: String,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub status_path: String,
    pub detail_path: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let settings = ApiSettings::default();
        Self {
            base_url: settings.base_url,
            connect_timeout_ms: millis(settings.connect_timeout),
            request_timeout_ms: millis(settings.request_timeout),
            status_path: settings.status_path,
            detail_path: settings.detail_path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct PollConfig {
    pub slow_phase_end_ms: u64,
    pub medium_phase_end_ms: u64,
    pub slow_interval_ms: u64,
    pub medium_interval_ms: u64,
    pub fast_interval_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        let schedule = PollSchedule::default();
        Self {
            slow_phase_end_ms: millis(schedule.slow_phase_end),
            medium_phase_end_ms: millis(schedule.medium_phase_end),
            slow_interval_ms: millis(schedule.slow_interval),
            medium_interval_ms: millis(schedule.medium_interval),
            fast_interval_ms: millis(schedule.fast_interval),
        }
    }
}

impl AppConfig {
    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            base_url: self.api.base_url.clone(),
            connect_timeout: Duration::from_millis(self.api.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.api.request_timeout_ms),
            status_path: self.api.status_path.clone(),
            detail_path: self.api.detail_path.clone(),
        }
    }

    /// Intervals are clamped to [`MIN_POLL_INTERVAL`]; out-of-order breakpoints
    /// fall back to the default schedule.
    pub fn poll_schedule(&self) -> PollSchedule {
        let poll = &self.poll;
        if poll.medium_phase_end_ms < poll.slow_phase_end_ms {
            cw_warn!(
                "Poll breakpoints out of order (slow_phase_end_ms={} medium_phase_end_ms={}); using defaults",
                poll.slow_phase_end_ms,
                poll.medium_phase_end_ms
            );
            return PollSchedule::default();
        }
        PollSchedule {
            slow_phase_end: Duration::from_millis(poll.slow_phase_end_ms),
            medium_phase_end: Duration::from_millis(poll.medium_phase_end_ms),
            slow_interval: interval("slow_interval_ms", poll.slow_interval_ms),
            medium_interval: interval("medium_interval_ms", poll.medium_interval_ms),
            fast_interval: interval("fast_interval_ms", poll.fast_interval_ms),
        }
    }

    /// Command-line flags win over the file.
    pub fn with_overrides(mut self, base_url: Option<String>, voice_off: bool) -> Self {
        if let Some(base_url) = base_url {
            self.api.base_url = base_url;
        }
        if voice_off {
            self.voice_over = false;
        }
        self
    }
}

/// Reads the config file, falling back to defaults when it is missing or broken.
pub(crate) fn load(path: &Path) -> AppConfig {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            cw_debug!("No config at {:?}; using defaults", path);
            return AppConfig::default();
        }
        Err(err) => {
            cw_warn!("Failed to read config from {:?}: {}", path, err);
            return AppConfig::default();
        }
    };

    match ron::from_str(&content) {
        Ok(config) => {
            cw_info!("Loaded config from {:?}", path);
            config
        }
        Err(err) => {
            cw_warn!("Failed to parse config from {:?}: {}", path, err);
            AppConfig::default()
        }
    }
}

fn interval(name: &str, ms: u64) -> Duration {
    let requested = Duration::from_millis(ms);
    if requested < MIN_POLL_INTERVAL {
        cw_warn!(
            "{}={} is below the minimum; using {}ms",
            name,
            ms,
            MIN_POLL_INTERVAL.as_millis()
        );
        return MIN_POLL_INTERVAL;
    }
    requested
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write_config(text: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, text).unwrap();
        (dir, path)
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load(&dir.path().join("absent.ron"));

        assert_eq!(config, AppConfig::default());
        assert!(config.voice_over);
        assert_eq!(config.poll_schedule(), PollSchedule::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let (_dir, path) = write_config(
            r#"(
                api: (base_url: "https://coach.example.com"),
                poll: (fast_interval_ms: 2000),
            )"#,
        );

        let config = load(&path);

        assert_eq!(config.api.base_url, "https://coach.example.com");
        assert_eq!(config.api.status_path, "/api/analysis/{id}/status");
        assert_eq!(config.poll.fast_interval_ms, 2000);
        assert_eq!(config.poll.slow_interval_ms, 15_000);
        assert!(config.voice_over);
    }

    #[test]
    fn unparsable_file_falls_back_to_defaults() {
        let (_dir, path) = write_config("api: [this is not ron");

        assert_eq!(load(&path), AppConfig::default());
    }

    #[test]
    fn settings_convert_to_engine_types() {
        let (_dir, path) = write_config(
            r#"(
                api: (request_timeout_ms: 1500),
                poll: (slow_phase_end_ms: 60000, medium_interval_ms: 5000),
                voice_over: false,
            )"#,
        );

        let config = load(&path);
        let api = config.api_settings();
        let schedule = config.poll_schedule();

        assert_eq!(api.request_timeout, Duration::from_millis(1500));
        assert_eq!(api.connect_timeout, Duration::from_secs(10));
        assert_eq!(schedule.slow_phase_end, Duration::from_secs(60));
        assert_eq!(schedule.medium_interval, Duration::from_secs(5));
        assert_eq!(schedule.fast_interval, Duration::from_secs(3));
        assert!(!config.voice_over);
    }

    #[test]
    fn tiny_intervals_are_clamped() {
        let (_dir, path) = write_config("(poll: (fast_interval_ms: 0, medium_interval_ms: 250))");

        let schedule = load(&path).poll_schedule();

        assert_eq!(schedule.fast_interval, Duration::from_secs(1));
        assert_eq!(schedule.medium_interval, Duration::from_secs(1));
        assert_eq!(schedule.slow_interval, Duration::from_secs(15));
    }

    #[test]
    fn out_of_order_breakpoints_use_default_schedule() {
        let (_dir, path) = write_config(
            "(poll: (slow_phase_end_ms: 120000, medium_phase_end_ms: 60000, fast_interval_ms: 2000))",
        );

        assert_eq!(load(&path).poll_schedule(), PollSchedule::default());
    }

    #[test]
    fn flags_override_file_values() {
        let config = AppConfig::default()
            .with_overrides(Some("http://127.0.0.1:9000".to_string()), true);

        assert_eq!(config.api.base_url, "http://127.0.0.1:9000");
        assert!(!config.voice_over);

        let untouched = AppConfig::default().with_overrides(None, false);
        assert_eq!(untouched, AppConfig::default());
    }

    #[test]
    fn defaults_round_trip_through_ron() {
        let text = ron::ser::to_string_pretty(&AppConfig::default(), ron::ser::PrettyConfig::new())
            .unwrap();
        let (_dir, path) = write_config(&text);

        assert_eq!(load(&path), AppConfig::default());
    }
}

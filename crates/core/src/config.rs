use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
    sync::atomic::AtomicBool,
};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

use crate::analyzer::AnalyzerConfig;
use crate::chart::ChartConfig;
use crate::errors::ConfigError;

const QUALIFIER: &str = "";
const ORGANIZATION: &str = "netpulse";
const APPLICATION: &str = "netpulse";

/// Command line and environment overrides.
///
/// Anything left unset falls back to the configuration file, then to the
/// built-in defaults.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Directory holding `config.toml` (or `config.json`).
    #[arg(long, env = "NETPULSE_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    #[arg(long, env = "NETPULSE_LOG_LEVEL")]
    pub log_level: Option<LevelFilter>,

    /// Number of samples shown on the chart.
    #[arg(long)]
    pub history_capacity: Option<usize>,

    /// Number of ticks used for jitter.
    #[arg(long)]
    pub window_size: Option<usize>,

    /// Minimum milliseconds between two rate computations.
    #[arg(long)]
    pub debounce_ms: Option<u64>,
}

impl ConfigArgs {
    /// Platform configuration directory, if one can be determined.
    pub fn default_config_dir() -> Option<PathBuf> {
        ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Resolves the final configuration: file, then overrides, then validation.
    ///
    /// An explicitly given directory must exist; the platform default may be
    /// missing, in which case the defaults apply.
    pub fn build(self) -> Result<Config, ConfigError> {
        let file_config = match &self.config_dir {
            Some(dir) if !dir.exists() => {
                return Err(ConfigError::Io {
                    path: dir.clone(),
                    source: std::io::ErrorKind::NotFound.into(),
                })
            }
            Some(dir) => Config::read_dir(dir)?,
            None => match Self::default_config_dir() {
                Some(dir) => Config::read_dir(&dir)?,
                None => None,
            },
        };

        let mut config = file_config.unwrap_or_default();
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        if let Some(capacity) = self.history_capacity {
            config.chart.history_capacity = capacity;
        }
        if let Some(window_size) = self.window_size {
            config.analyzer.window_size = window_size;
        }
        if let Some(debounce_ms) = self.debounce_ms {
            config.analyzer.debounce_ms = debounce_ms;
        }
        config.validate()?;
        Ok(config)
    }
}

mod serde_log_level_filter {
    use serde::{Deserialize, Deserializer, Serializer};
    use tracing::level_filters::LevelFilter;

    pub fn serialize<S>(level: &LevelFilter, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level = match *level {
            LevelFilter::OFF => "off",
            LevelFilter::ERROR => "error",
            LevelFilter::WARN => "warn",
            LevelFilter::INFO => "info",
            LevelFilter::DEBUG => "debug",
            _ => "trace",
        };
        serializer.serialize_str(level)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<LevelFilter, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level = String::deserialize(deserializer)?;
        level
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("unknown log level: {level}")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub analyzer: AnalyzerConfig,
    pub chart: ChartConfig,
    #[serde(with = "serde_log_level_filter")]
    pub log_level: LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            analyzer: AnalyzerConfig::default(),
            chart: ChartConfig::default(),
            log_level: LevelFilter::INFO,
        }
    }
}

impl Config {
    /// Reads `config.toml` or `config.json` from `dir`. `Ok(None)` when
    /// neither exists.
    pub fn read_dir(dir: &Path) -> Result<Option<Self>, ConfigError> {
        let toml_path = dir.join("config.toml");
        if toml_path.is_file() {
            tracing::debug!(path = ?toml_path, "Reading configuration file");
            let content = read_to_string(&toml_path)?;
            return toml::from_str(&content)
                .map(Some)
                .map_err(|source| ConfigError::Parse {
                    path: toml_path,
                    source,
                });
        }

        let json_path = dir.join("config.json");
        if json_path.is_file() {
            tracing::debug!(path = ?json_path, "Reading configuration file");
            let content = read_to_string(&json_path)?;
            return serde_json::from_str(&content)
                .map(Some)
                .map_err(|source| ConfigError::Json {
                    path: json_path,
                    source,
                });
        }

        Ok(None)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chart.history_capacity < 2 {
            return Err(ConfigError::Invalid(format!(
                "history_capacity must be at least 2, got {}",
                self.chart.history_capacity
            )));
        }
        if self.analyzer.window_size == 0 {
            return Err(ConfigError::Invalid(
                "window_size must be greater than 0".into(),
            ));
        }
        if !(self.chart.headroom > 0.0 && self.chart.headroom.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "headroom must be a positive number, got {}",
                self.chart.headroom
            )));
        }
        if !(self.chart.min_scale > 0.0 && self.chart.min_scale.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "min_scale must be a positive number, got {}",
                self.chart.min_scale
            )));
        }
        if !(self.chart.stroke_width > 0.0 && self.chart.stroke_width.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "stroke_width must be a positive number, got {}",
                self.chart.stroke_width
            )));
        }
        Ok(())
    }
}

fn read_to_string(path: &Path) -> Result<String, ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut content = String::new();
    File::open(path)
        .and_then(|mut file| file.read_to_string(&mut content))
        .map_err(io_err)?;
    Ok(content)
}

/// Installs the global `tracing` subscriber once per process. Later calls
/// are ignored.
pub fn set_logger(level: Option<LevelFilter>) {
    #[cfg(feature = "trace")]
    {
        static LOGGER_SET: AtomicBool = AtomicBool::new(false);
        if LOGGER_SET
            .compare_exchange(
                false,
                true,
                std::sync::atomic::Ordering::Release,
                std::sync::atomic::Ordering::SeqCst,
            )
            .is_err()
        {
            return;
        }

        if let Err(err) = crate::tracing::tracer::init_tracer(level) {
            eprintln!("failed tracing initialization: {err}");
        }
    }
    #[cfg(not(feature = "trace"))]
    {
        let _ = level;
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use testresult::TestResult;

    use super::*;

    fn args_for(dir: &Path) -> ConfigArgs {
        ConfigArgs {
            config_dir: Some(dir.to_path_buf()),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_dir_yields_defaults() -> TestResult {
        let dir = tempfile::tempdir()?;
        let config = args_for(dir.path()).build()?;
        assert_eq!(config, Config::default());
        Ok(())
    }

    #[test]
    fn test_toml_file_is_read() -> TestResult {
        let dir = tempfile::tempdir()?;
        fs::write(
            dir.path().join("config.toml"),
            r#"
log_level = "debug"

[analyzer]
debounce_ms = 250

[chart]
history_capacity = 30
stroke_color = 0xFF112233
"#,
        )?;
        let config = args_for(dir.path()).build()?;
        assert_eq!(config.log_level, LevelFilter::DEBUG);
        assert_eq!(config.analyzer.debounce_ms, 250);
        assert_eq!(config.analyzer.window_size, 100);
        assert_eq!(config.chart.history_capacity, 30);
        assert_eq!(config.chart.stroke_color, 0xFF11_2233);
        assert_eq!(config.chart.headroom, 1.2);
        Ok(())
    }

    #[test]
    fn test_json_file_is_read() -> TestResult {
        let dir = tempfile::tempdir()?;
        fs::write(
            dir.path().join("config.json"),
            r#"{ "analyzer": { "warmup_ticks": 2 }, "log_level": "warn" }"#,
        )?;
        let config = args_for(dir.path()).build()?;
        assert_eq!(config.analyzer.warmup_ticks, 2);
        assert_eq!(config.log_level, LevelFilter::WARN);
        Ok(())
    }

    #[test]
    fn test_cli_overrides_file() -> TestResult {
        let dir = tempfile::tempdir()?;
        fs::write(
            dir.path().join("config.toml"),
            "[chart]\nhistory_capacity = 30\n",
        )?;
        let config = ConfigArgs {
            history_capacity: Some(20),
            window_size: Some(10),
            debounce_ms: Some(50),
            log_level: Some(LevelFilter::TRACE),
            ..args_for(dir.path())
        }
        .build()?;
        assert_eq!(config.chart.history_capacity, 20);
        assert_eq!(config.analyzer.window_size, 10);
        assert_eq!(config.analyzer.debounce_ms, 50);
        assert_eq!(config.log_level, LevelFilter::TRACE);
        Ok(())
    }

    #[test]
    fn test_missing_explicit_dir_is_an_error() -> TestResult {
        let dir = tempfile::tempdir()?;
        let missing = dir.path().join("nope");
        let err = args_for(&missing).build().unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        Ok(())
    }

    #[test]
    fn test_malformed_toml_reports_path() -> TestResult {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("config.toml"), "[chart\nhistory_capacity = ")?;
        let err = args_for(dir.path()).build().unwrap_err();
        match err {
            ConfigError::Parse { path, .. } => assert!(path.ends_with("config.toml")),
            other => panic!("unexpected error: {other}"),
        }
        Ok(())
    }

    #[test]
    fn test_unknown_log_level_is_rejected() {
        let result = toml::from_str::<Config>(r#"log_level = "loud""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_rejects_degenerate_values() {
        let mut config = Config::default();
        config.chart.history_capacity = 1;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.analyzer.window_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.chart.headroom = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.chart.stroke_width = f32::NAN;
        assert!(config.validate().is_err());

        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_serializes_back() -> TestResult {
        let config = Config::default();
        let serialized = toml::to_string(&config)?;
        let parsed: Config = toml::from_str(&serialized)?;
        assert_eq!(parsed, config);
        Ok(())
    }
}

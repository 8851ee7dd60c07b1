use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use strum_macros::{AsRefStr, Display, EnumString};
use typed_builder::TypedBuilder;

const DEFAULT_SERVICE_NAME: &str = "fhe-kernel-bench";
const DEFAULT_LOG_FILE_NAME: &str = "bench.log";

lazy_static::lazy_static! {
    pub static ref ENVIRONMENT: ExecutionEnvironment = mode();
}

#[derive(
    Default, Display, Deserialize, Serialize, Clone, EnumString, AsRefStr, Eq, PartialEq, Debug,
)]
#[strum(serialize_all = "snake_case")]
pub enum ExecutionEnvironment {
    #[default]
    Local,
    #[strum(serialize = "ci")]
    Integration,
    /// Dedicated benchmark host, where console output is kept terse.
    Bench,
}

fn mode() -> ExecutionEnvironment {
    env::var("RUN_MODE")
        .map(|enum_str| ExecutionEnvironment::from_str(enum_str.as_str()).unwrap_or_default())
        .unwrap_or_else(|_| ExecutionEnvironment::Local)
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, TypedBuilder, Default)]
pub struct TelemetryConfig {
    /// Name attached to every log line. Defaults to `fhe-kernel-bench`.
    #[builder(default, setter(strip_option, into))]
    #[serde(default)]
    service_name: Option<String>,

    /// If this is set, console logs are emitted as json.
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    json_logs: Option<bool>,

    /// Directory for a json log file next to the console output. No file is written when unset.
    #[builder(default, setter(strip_option, into))]
    #[serde(default)]
    log_dir: Option<PathBuf>,

    /// File name used inside `log_dir`.
    #[builder(default, setter(strip_option, into))]
    #[serde(default)]
    log_file_name: Option<String>,
}

impl TelemetryConfig {
    pub fn service_name(&self) -> &str {
        self.service_name.as_deref().unwrap_or(DEFAULT_SERVICE_NAME)
    }

    pub fn json_logs(&self) -> bool {
        self.json_logs.unwrap_or(false)
    }

    pub fn log_dir(&self) -> Option<&PathBuf> {
        self.log_dir.as_ref()
    }

    pub fn log_file_name(&self) -> &str {
        self.log_file_name.as_deref().unwrap_or(DEFAULT_LOG_FILE_NAME)
    }
}

#[derive(TypedBuilder, Debug)]
pub struct Settings<'a> {
    #[builder(setter(strip_option), default = None)]
    path: Option<&'a str>,
    env_prefix: &'a str,
    #[builder(default)]
    parse_keys: Vec<&'a str>,
}

impl Settings<'_> {
    /// Creates a new instance of `Settings`.
    ///
    /// Sources are layered, later ones overriding earlier ones: `config/default`,
    /// `config/<prefix>`, `config/<prefix>-<RUN_MODE>`, the explicit `path` (required when
    /// given) and finally `<PREFIX>__<KEY>` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be created or deserialized.
    pub fn init_conf<'de, T: Deserialize<'de> + std::fmt::Debug>(&self) -> Result<T, ConfigError> {
        let mut env_conf = config::Environment::with_prefix(self.env_prefix)
            .separator("__")
            .list_separator(",")
            .try_parsing(true);
        for key in &self.parse_keys {
            env_conf = env_conf.with_list_parse_key(key);
        }
        let mut config_builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(
                File::with_name(&format!("config/{}", self.env_prefix.to_lowercase()))
                    .required(false),
            )
            .add_source(
                File::with_name(&format!(
                    "config/{}-{}",
                    self.env_prefix.to_lowercase(),
                    *ENVIRONMENT
                ))
                .required(false),
            );

        if let Some(path) = self.path {
            config_builder = config_builder.add_source(File::with_name(path).required(true))
        };

        let config = config_builder.add_source(env_conf).build()?;

        let settings: T = config.try_deserialize()?;

        tracing::debug!("settings loaded: {:?}", settings);

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        #[serde(default)]
        count: u32,
        #[serde(default)]
        values: Vec<u64>,
    }

    fn write_conf(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    #[serial]
    fn file_source_is_deserialized() {
        let file = write_conf("name = \"strict\"\ncount = 3\n");
        let conf: Sample = Settings::builder()
            .path(file.path().to_str().unwrap())
            .env_prefix("OBS_CONF_TEST_A")
            .build()
            .init_conf()
            .unwrap();
        assert_eq!(
            conf,
            Sample {
                name: "strict".to_string(),
                count: 3,
                values: vec![],
            }
        );
    }

    #[test]
    #[serial]
    fn env_overrides_file() {
        let file = write_conf("name = \"quick\"\ncount = 1\n");
        env::set_var("OBS_CONF_TEST_B__COUNT", "7");
        env::set_var("OBS_CONF_TEST_B__VALUES", "1,2,3");
        let conf: Result<Sample, _> = Settings::builder()
            .path(file.path().to_str().unwrap())
            .env_prefix("OBS_CONF_TEST_B")
            .parse_keys(vec!["values"])
            .build()
            .init_conf();
        env::remove_var("OBS_CONF_TEST_B__COUNT");
        env::remove_var("OBS_CONF_TEST_B__VALUES");
        let conf = conf.unwrap();
        assert_eq!(conf.name, "quick");
        assert_eq!(conf.count, 7);
        assert_eq!(conf.values, vec![1, 2, 3]);
    }

    #[test]
    #[serial]
    fn missing_explicit_file_is_an_error() {
        let res: Result<Sample, _> = Settings::builder()
            .path("this/file/does/not/exist.toml")
            .env_prefix("OBS_CONF_TEST_C")
            .build()
            .init_conf();
        assert!(res.is_err());
    }

    #[test]
    fn telemetry_defaults() {
        let conf = TelemetryConfig::default();
        assert_eq!(conf.service_name(), DEFAULT_SERVICE_NAME);
        assert!(!conf.json_logs());
        assert!(conf.log_dir().is_none());

        let conf = TelemetryConfig::builder()
            .service_name("sort5")
            .json_logs(true)
            .log_dir("logs")
            .build();
        assert_eq!(conf.service_name(), "sort5");
        assert!(conf.json_logs());
        assert_eq!(conf.log_dir(), Some(&PathBuf::from("logs")));
        assert_eq!(conf.log_file_name(), DEFAULT_LOG_FILE_NAME);
    }

    #[test]
    fn environment_names_round_trip() {
        assert_eq!(
            ExecutionEnvironment::from_str("ci").unwrap(),
            ExecutionEnvironment::Integration
        );
        assert_eq!(ExecutionEnvironment::Bench.to_string(), "bench");
        assert_eq!(ExecutionEnvironment::Local.as_ref(), "local");
    }
}

use crate::utils::error::{BoardError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub serial: SerialConfig,
    pub modem: ModemConfig,
    pub backend: BackendConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub port: String,
    pub baud_rate: u32,
    pub poll_interval_ms: u64,
    pub max_chunk_len: usize, // 超過此長度仍未結束的資料視為雜訊
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModemConfig {
    pub enabled: bool,
    pub rf_config: String, // freq,sf,bw,cr,prlen,pwr
    pub mode_settle_ms: u64,
    pub command_settle_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub platform: u32,
    pub competition: u32,
    pub request_timeout_seconds: u64,
    pub roster_load_delay_ms: u64, // 等待顯示介面啟動
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 115_200,
            poll_interval_ms: 1_000,
            max_chunk_len: 512,
        }
    }
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rf_config: "867700000,10,0,1,8,14".to_string(),
            mode_settle_ms: 1_000,
            command_settle_ms: 500,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://giridb.herokuapp.com/".to_string(),
            platform: 1,
            competition: 1,
            request_timeout_seconds: 10,
            roster_load_delay_ms: 1_000,
        }
    }
}

impl SerialConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl ModemConfig {
    pub fn mode_settle(&self) -> Duration {
        Duration::from_millis(self.mode_settle_ms)
    }

    pub fn command_settle(&self) -> Duration {
        Duration::from_millis(self.command_settle_ms)
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn roster_load_delay(&self) -> Duration {
        Duration::from_millis(self.roster_load_delay_ms)
    }
}

impl BoardConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(&path).map_err(|e| BoardError::ConfigError {
                message: format!("cannot read {}: {}", path.as_ref().display(), e),
            })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| BoardError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GIRI_BACKEND_URL})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| BoardError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("serial.port", &self.serial.port)?;
        validation::validate_positive_number("serial.baud_rate", self.serial.baud_rate.into(), 1)?;
        validation::validate_range(
            "serial.poll_interval_ms",
            self.serial.poll_interval_ms,
            1,
            10_000,
        )?;
        validation::validate_range("serial.max_chunk_len", self.serial.max_chunk_len, 16, 4_096)?;

        if self.modem.enabled {
            validation::validate_non_empty_string("modem.rf_config", &self.modem.rf_config)?;
        }

        validation::validate_url("backend.base_url", &self.backend.base_url)?;
        validation::validate_positive_number("backend.platform", self.backend.platform.into(), 1)?;
        validation::validate_positive_number(
            "backend.competition",
            self.backend.competition.into(),
            1,
        )?;
        validation::validate_range(
            "backend.request_timeout_seconds",
            self.backend.request_timeout_seconds,
            1,
            120,
        )?;

        Ok(())
    }
}

impl Validate for BoardConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

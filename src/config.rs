//! 配置系统
//! 默认值 → 可选配置文件 → 环境变量，使用 Secret 包装敏感信息

use crate::auth::jwt::ACCESS_TOKEN_TTL_SECS;
use config::{Config, ConfigError, Environment, File};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

/// 默认配置文件名（不存在时忽略）
pub const DEFAULT_CONFIG_FILE: &str = "card-auth";

/// 指定配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "CARD_AUTH_CONFIG";

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址，例如 "0.0.0.0:3000"
    pub addr: String,
    /// 优雅关闭超时时间（秒）
    pub graceful_shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别: trace, debug, info, warn, error
    pub level: String,
    /// 日志格式: json, pretty, compact
    pub format: LogFormat,
}

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// 生产环境
    Json,
    /// 开发环境
    Pretty,
    Compact,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// JWT 签名密钥（使用 Secret 包装，防止日志泄露）
    pub jwt_secret: Secret<String>,
    /// 访问令牌有效期（秒）
    pub access_token_exp_secs: u64,
    /// Argon2 内存开销（KiB）
    pub hash_memory_kib: u32,
    /// Argon2 迭代次数
    pub hash_iterations: u32,
    /// Argon2 并行度
    pub hash_parallelism: u32,
}

/// 预置用户（密码为 PHC 格式哈希，可用 `card-auth --hash-password` 生成）
#[derive(Debug, Clone, Deserialize)]
pub struct SeedUser {
    pub username: String,
    /// 稳定的主体标识，缺省时使用用户名
    #[serde(default)]
    pub subject: Option<String>,
    pub password_hash: Secret<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    #[serde(default)]
    pub users: Vec<SeedUser>,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Config::builder();

        // 添加默认配置
        settings = settings
            .set_default("server.addr", "0.0.0.0:3000")?
            .set_default("server.graceful_shutdown_timeout_secs", 30)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("security.jwt_secret", "change-this-secret-in-production-min-32-chars!")?
            .set_default("security.access_token_exp_secs", 86400)?
            .set_default("security.hash_memory_kib", 65536)?
            .set_default("security.hash_iterations", 3)?
            .set_default("security.hash_parallelism", 4)?;

        // 配置文件（可选）
        settings = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => settings.add_source(File::with_name(&path).required(true)),
            Err(_) => settings.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        // 从环境变量加载配置（前缀为 CARD_AUTH_）
        settings = settings.add_source(
            Environment::with_prefix("CARD_AUTH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = settings.build()?.try_deserialize()?;

        // 验证配置
        config.validate()?;

        Ok(config)
    }

    /// 验证配置合法性
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 验证端口范围
        if let Some(port_str) = self.server.addr.split(':').next_back() {
            if let Ok(port) = port_str.parse::<u16>() {
                if port != 0 && port < 1024 {
                    return Err(ConfigError::Message("Server port should be >= 1024".to_string()));
                }
            }
        }

        // 验证日志级别
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                )))
            }
        }

        // 验证 JWT 密钥长度（至少 32 字符）
        if self.security.jwt_secret.expose_secret().len() < 32 {
            return Err(ConfigError::Message(
                "JWT secret must be at least 32 characters long".to_string(),
            ));
        }

        // 验证令牌过期时间
        if !ACCESS_TOKEN_TTL_SECS.contains(&self.security.access_token_exp_secs) {
            return Err(ConfigError::Message(
                "access_token_exp_secs must be between 60 and 86400 (1 minute to 24 hours)"
                    .to_string(),
            ));
        }

        // 验证 Argon2 参数
        if self.security.hash_memory_kib < 8 * self.security.hash_parallelism {
            return Err(ConfigError::Message(
                "hash_memory_kib must be at least 8 * hash_parallelism".to_string(),
            ));
        }

        if self.security.hash_iterations < 1 || self.security.hash_iterations > 16 {
            return Err(ConfigError::Message(
                "hash_iterations must be between 1 and 16".to_string(),
            ));
        }

        if self.security.hash_parallelism < 1 || self.security.hash_parallelism > 16 {
            return Err(ConfigError::Message(
                "hash_parallelism must be between 1 and 16".to_string(),
            ));
        }

        // 验证预置用户
        let mut seen = std::collections::HashSet::new();
        for user in &self.users {
            if user.username.trim().is_empty() {
                return Err(ConfigError::Message("Seed user with empty username".to_string()));
            }
            if !seen.insert(user.username.as_str()) {
                return Err(ConfigError::Message(format!(
                    "Duplicate seed user: {}",
                    user.username
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            CONFIG_PATH_ENV,
            "CARD_AUTH_SERVER__ADDR",
            "CARD_AUTH_LOGGING__LEVEL",
            "CARD_AUTH_LOGGING__FORMAT",
            "CARD_AUTH_SECURITY__JWT_SECRET",
            "CARD_AUTH_SECURITY__ACCESS_TOKEN_EXP_SECS",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_config_defaults() {
        clear_env();

        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.server.addr, "0.0.0.0:3000");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.security.access_token_exp_secs, 86400);
        assert_eq!(config.security.hash_memory_kib, 65536);
    }

    #[test]
    #[serial]
    fn test_config_env_override() {
        clear_env();
        std::env::set_var("CARD_AUTH_SECURITY__ACCESS_TOKEN_EXP_SECS", "900");

        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.security.access_token_exp_secs, 900);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_config_validation_invalid_port() {
        clear_env();
        std::env::set_var("CARD_AUTH_SERVER__ADDR", "0.0.0.0:80");

        assert!(AppConfig::from_env().is_err());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_config_validation_short_secret() {
        clear_env();
        std::env::set_var("CARD_AUTH_SECURITY__JWT_SECRET", "short");

        assert!(AppConfig::from_env().is_err());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_config_validation_invalid_log_level() {
        clear_env();
        std::env::set_var("CARD_AUTH_LOGGING__LEVEL", "invalid");

        assert!(AppConfig::from_env().is_err());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_config_log_format() {
        clear_env();
        std::env::set_var("CARD_AUTH_LOGGING__FORMAT", "compact");
        assert_eq!(AppConfig::from_env().unwrap().logging.format, LogFormat::Compact);

        std::env::set_var("CARD_AUTH_LOGGING__FORMAT", "xml");
        assert!(AppConfig::from_env().is_err());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_config_validation_ttl_out_of_range() {
        clear_env();
        std::env::set_var("CARD_AUTH_SECURITY__ACCESS_TOKEN_EXP_SECS", "30");

        assert!(AppConfig::from_env().is_err());

        clear_env();
    }
}

//! 配置系统
//! 从环境变量加载所有配置，使用 Secret 包装敏感信息

use config::{Config, ConfigError, Environment};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址，例如 "0.0.0.0:3000"
    pub addr: String,
    /// 优雅关闭超时时间（秒）
    pub graceful_shutdown_timeout_secs: u64,
    /// 请求体大小上限（字节）
    pub body_limit_bytes: usize,
    /// 允许的跨域来源，逗号分隔；未设置时允许任意来源（开发模式）
    pub cors_origins: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库连接 URL；未设置时使用内存存储（仅限开发与测试）
    pub url: Option<Secret<String>>,
    /// 最大连接数
    pub max_connections: u32,
    /// 最小连接数
    pub min_connections: u32,
    /// 获取连接超时时间（秒）
    pub acquire_timeout_secs: u64,
    /// 空闲连接超时时间（秒）
    pub idle_timeout_secs: u64,
    /// 连接最大生命周期（秒）
    pub max_lifetime_secs: u64,
    /// 单次仓储调用的截止时间（秒），超时视为存储不可用
    pub query_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别: trace, debug, info, warn, error
    pub level: String,
    /// 日志格式: json, pretty
    pub format: String,
}

/// Principal 角色的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleSource {
    /// 使用令牌中携带的角色（角色变更在令牌过期后生效）
    Token,
    /// 每次请求都使用存储中的当前角色
    Repository,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// JWT 密钥（使用 Secret 包装，防止日志泄露）
    pub jwt_secret: Secret<String>,
    /// 访问令牌过期时间（秒）
    pub access_token_exp_secs: u64,
    /// Argon2 内存开销（KiB）
    pub password_memory_kib: u32,
    /// Argon2 迭代次数
    pub password_iterations: u32,
    /// Argon2 并行度
    pub password_parallelism: u32,
    /// Principal 角色来源
    pub role_source: RoleSource,
    /// 启动时确保存在的管理员账户（可选）
    pub bootstrap_admin_username: Option<String>,
    pub bootstrap_admin_password: Option<Secret<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
}

impl AppConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Config::builder();

        // 添加默认配置（JWT 密钥没有默认值，必须显式提供）
        settings = settings
            .set_default("server.addr", "0.0.0.0:3000")?
            .set_default("server.graceful_shutdown_timeout_secs", 30)?
            .set_default("server.body_limit_bytes", 64 * 1024)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("database.idle_timeout_secs", 600)?
            .set_default("database.max_lifetime_secs", 1800)?
            .set_default("database.query_timeout_secs", 5)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("security.access_token_exp_secs", 3600)?
            .set_default("security.password_memory_kib", 65536)?
            .set_default("security.password_iterations", 3)?
            .set_default("security.password_parallelism", 4)?
            .set_default("security.role_source", "token")?;

        // 从环境变量加载配置（前缀为 MOVIES_）
        settings = settings.add_source(
            Environment::with_prefix("MOVIES")
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
        // 验证端口范围（0 表示随机端口）
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

        // 验证日志格式
        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log format: {}. Must be one of: json, pretty",
                    self.logging.format
                )))
            }
        }

        // 验证数据库连接池配置
        if self.database.max_connections < self.database.min_connections {
            return Err(ConfigError::Message(
                "max_connections must be >= min_connections".to_string(),
            ));
        }

        if self.database.query_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "query_timeout_secs must be greater than 0".to_string(),
            ));
        }

        // 验证 JWT 密钥长度（至少 32 字符）
        if self.security.jwt_secret.expose_secret().len() < 32 {
            return Err(ConfigError::Message(
                "JWT secret must be at least 32 characters long".to_string(),
            ));
        }

        // 验证令牌过期时间
        if self.security.access_token_exp_secs < 60 || self.security.access_token_exp_secs > 86400 {
            return Err(ConfigError::Message(
                "access_token_exp_secs must be between 60 and 86400 (1 minute to 24 hours)"
                    .to_string(),
            ));
        }

        // 验证 Argon2 参数
        if self.security.password_iterations < 1 {
            return Err(ConfigError::Message(
                "password_iterations must be at least 1".to_string(),
            ));
        }

        if self.security.password_parallelism < 1 || self.security.password_parallelism > 16 {
            return Err(ConfigError::Message(
                "password_parallelism must be between 1 and 16".to_string(),
            ));
        }

        if self.security.password_memory_kib < 8 * self.security.password_parallelism {
            return Err(ConfigError::Message(
                "password_memory_kib must be at least 8 * password_parallelism".to_string(),
            ));
        }

        // 管理员引导账户必须成对出现
        if self.security.bootstrap_admin_username.is_some()
            != self.security.bootstrap_admin_password.is_some()
        {
            return Err(ConfigError::Message(
                "bootstrap_admin_username and bootstrap_admin_password must be set together"
                    .to_string(),
            ));
        }

        Ok(())
    }
}

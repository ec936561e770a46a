use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64, // seconds
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NotifierConfig {
    // 为空则关闭通知
    #[serde(default)]
    pub webhook_url: String,
    #[serde(default = "default_notifier_timeout")]
    pub timeout_secs: u64,
}

fn default_notifier_timeout() -> u64 {
    5
}

impl Config {
    pub fn from_toml() -> anyhow::Result<Self> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 优先读配置文件，没有文件时完全依赖环境变量
        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => toml::from_str(&config_str)
                .map_err(|e| anyhow::anyhow!("解析配置文件失败: {e}"))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                // 无配置文件时数据库 URL 必须提供
                let database_url = get_env("DATABASE_URL").ok_or_else(|| {
                    anyhow::anyhow!("缺少 DATABASE_URL 环境变量，且未找到配置文件 config.toml")
                })?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    jwt: JwtConfig {
                        secret: get_env("JWT_SECRET")
                            .unwrap_or_else(|| "change-me-in-production".to_string()),
                        access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 28800i64),
                    },
                    notifier: NotifierConfig {
                        webhook_url: get_env("NOTIFIER_WEBHOOK_URL").unwrap_or_default(),
                        timeout_secs: get_env_parse("NOTIFIER_TIMEOUT_SECS", 5u64),
                    },
                }
            }
            Err(e) => {
                return Err(anyhow::anyhow!("无法读取配置文件 {config_path}: {e}"));
            }
        };

        // 环境变量覆盖（文件存在时也覆盖）
        if let Ok(v) = env::var("SERVER_HOST") {
            config.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            config.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            config.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            config.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            config.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            config.jwt.access_token_expires_in = n;
        }
        if let Ok(v) = env::var("NOTIFIER_WEBHOOK_URL") {
            config.notifier.webhook_url = v;
        }
        if let Ok(v) = env::var("NOTIFIER_TIMEOUT_SECS")
            && let Ok(n) = v.parse()
        {
            config.notifier.timeout_secs = n;
        }

        Ok(config)
    }
}

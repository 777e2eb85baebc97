use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub sms: SmsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
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
    pub expires_in: i64, // seconds
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SmsConfig {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub sign_name: String,
    pub template_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
    pub use_ssl: bool,
}

impl Config {
    /// 先读 TOML 配置文件，不存在则完全依赖环境变量；环境变量始终优先
    pub fn from_toml() -> anyhow::Result<Self> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());

        let mut config: Config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => toml::from_str(&config_str)
                .with_context(|| format!("解析配置文件失败: {config_path}"))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Config {
                server: ServerConfig {
                    host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                    port: get_env_parse("SERVER_PORT", 8080u16),
                },
                database: DatabaseConfig {
                    url: get_env("DATABASE_URL")
                        .unwrap_or_else(|| "sqlite://data/hpa.db?mode=rwc".to_string()),
                    max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                },
                jwt: JwtConfig {
                    secret: get_env("JWT_SECRET")
                        .unwrap_or_else(|| "change-me-in-production".to_string()),
                    // 默认 7 天
                    expires_in: get_env_parse("JWT_EXPIRES_IN", 604_800i64),
                },
                sms: SmsConfig {
                    endpoint: get_env("SMS_ENDPOINT").unwrap_or_default(),
                    access_key: get_env("SMS_ACCESS_KEY").unwrap_or_default(),
                    secret_key: get_env("SMS_SECRET_KEY").unwrap_or_default(),
                    sign_name: get_env("SMS_SIGN_NAME").unwrap_or_default(),
                    template_id: get_env("SMS_TEMPLATE_ID").unwrap_or_default(),
                },
                storage: StorageConfig {
                    endpoint: get_env("STORAGE_ENDPOINT")
                        .unwrap_or_else(|| "localhost:9000".to_string()),
                    access_key: get_env("STORAGE_ACCESS_KEY").unwrap_or_default(),
                    secret_key: get_env("STORAGE_SECRET_KEY").unwrap_or_default(),
                    bucket: get_env("STORAGE_BUCKET").unwrap_or_else(|| "hpa".to_string()),
                    region: get_env("STORAGE_REGION").unwrap_or_else(|| "us-east-1".to_string()),
                    use_ssl: get_env_parse("STORAGE_USE_SSL", false),
                },
            },
            Err(e) => {
                return Err(anyhow::anyhow!("无法读取配置文件 {config_path}: {e}"));
            }
        };

        // 环境变量覆盖（文件存在时也覆盖）
        if let Some(v) = get_env("SERVER_HOST") {
            config.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            config.server.port = p;
        }
        if let Some(v) = get_env("DATABASE_URL") {
            config.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            config.database.max_connections = mc;
        }
        if let Some(v) = get_env("JWT_SECRET") {
            config.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            config.jwt.expires_in = n;
        }
        if let Some(v) = get_env("SMS_ENDPOINT") {
            config.sms.endpoint = v;
        }
        if let Some(v) = get_env("SMS_ACCESS_KEY") {
            config.sms.access_key = v;
        }
        if let Some(v) = get_env("SMS_SECRET_KEY") {
            config.sms.secret_key = v;
        }
        if let Some(v) = get_env("SMS_SIGN_NAME") {
            config.sms.sign_name = v;
        }
        if let Some(v) = get_env("SMS_TEMPLATE_ID") {
            config.sms.template_id = v;
        }
        if let Some(v) = get_env("STORAGE_ENDPOINT") {
            config.storage.endpoint = v;
        }
        if let Some(v) = get_env("STORAGE_ACCESS_KEY") {
            config.storage.access_key = v;
        }
        if let Some(v) = get_env("STORAGE_SECRET_KEY") {
            config.storage.secret_key = v;
        }
        if let Some(v) = get_env("STORAGE_BUCKET") {
            config.storage.bucket = v;
        }
        if let Some(v) = get_env("STORAGE_REGION") {
            config.storage.region = v;
        }
        if let Ok(v) = env::var("STORAGE_USE_SSL")
            && let Ok(b) = v.parse()
        {
            config.storage.use_ssl = b;
        }

        Ok(config)
    }
}

fn get_env(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

use super::error::{EngineError, EngineResult};
use chrono_tz::Tz;
use shared::models::Tier;
use shared::util::HOUR_MILLIS;

/// 引擎配置 - 佣金引擎的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | DATABASE_PATH | commission.db | SQLite 数据库文件 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_JSON | false | JSON 格式日志 |
/// | LOG_DIR | (unset) | 日志目录 (按天滚动) |
/// | BUSINESS_TIMEZONE | UTC | 周期窗口使用的业务时区 |
/// | SILVER_PLUS_THRESHOLD | SILVER | Silver+ 统计的门槛等级 |
/// | COMPOSITION_TTL_HOURS | 24 | 团队构成缓存有效期 |
/// | SEED_DEFAULT_CONFIG | true | 启动时写入默认费率 |
/// | ENVIRONMENT | development | 运行环境 |
///
/// # 示例
///
/// ```ignore
/// DATABASE_PATH=/data/commission.db BUSINESS_TIMEZONE=Asia/Manila cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite 数据库文件路径
    pub database_path: String,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 是否在缺少有效版本时写入默认配置
    pub seed_default_config: bool,
    pub engine: EngineSettings,
}

/// The subset of configuration the calculators consult
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    /// Timezone that cycle windows and month counting are evaluated in
    pub timezone: Tz,
    /// Lowest tier counted as "Silver-equivalent" in team composition
    pub silver_plus_threshold: Tier,
    /// Age after which a cached team composition is recomputed
    pub composition_ttl_millis: i64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            silver_plus_threshold: Tier::Silver,
            composition_ttl_millis: 24 * HOUR_MILLIS,
        }
    }
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 未设置的变量使用默认值；设置了但无法解析的值视为配置错误
    pub fn from_env() -> EngineResult<Self> {
        let defaults = EngineSettings::default();
        let ttl_hours: i64 = parse_var("COMPOSITION_TTL_HOURS", 24)?;
        if ttl_hours <= 0 {
            return Err(EngineError::Config(format!(
                "COMPOSITION_TTL_HOURS must be positive, got {ttl_hours}"
            )));
        }

        let silver_plus_threshold: Tier =
            parse_var("SILVER_PLUS_THRESHOLD", defaults.silver_plus_threshold)?;
        if silver_plus_threshold.is_white_label() {
            return Err(EngineError::Config(
                "SILVER_PLUS_THRESHOLD cannot be the white-label tier".into(),
            ));
        }

        Ok(Self {
            database_path: std::env::var("DATABASE_PATH").unwrap_or_else(|_| "commission.db".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: parse_var("LOG_JSON", false)?,
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            seed_default_config: parse_var("SEED_DEFAULT_CONFIG", true)?,
            engine: EngineSettings {
                timezone: parse_var("BUSINESS_TIMEZONE", defaults.timezone)?,
                silver_plus_threshold,
                composition_ttl_millis: ttl_hours * HOUR_MILLIS,
            },
        })
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_var<T>(name: &str, default: T) -> EngineResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| EngineError::Config(format!("{name}={raw:?}: {e}"))),
        _ => Ok(default),
    }
}

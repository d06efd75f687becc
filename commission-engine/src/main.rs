use commission_engine::rates::defaults::{seed_defaults, verify_active};
use commission_engine::{Config, DbService, SqliteStore, init_logger_with_file};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 加载 .env 与配置
    let _ = dotenvy::dotenv();
    let config = Config::from_env()?;

    // 2. 初始化日志
    init_logger_with_file(
        Some(&config.log_level),
        Some(config.log_json),
        config.log_dir.as_deref(),
    );
    tracing::info!(
        environment = %config.environment,
        database = %config.database_path,
        timezone = %config.engine.timezone,
        "Commission engine starting"
    );

    // 3. 打开数据库 (WAL + migrations)
    let db = DbService::new(&config.database_path).await?;
    let store = SqliteStore::new(&db);

    // 4. 缺失配置时写入默认版本
    if config.seed_default_config {
        let report = seed_defaults(&store).await?;
        if !report.is_empty() {
            tracing::info!(
                families = report.rate_families.len(),
                levels = report.levels.len(),
                "Default configuration seeded"
            );
        }
    }

    // 5. 启动不变量: 每个费率族与全部 11 级必须有生效版本
    let active = match verify_active(&store).await {
        Ok(active) => active,
        Err(e) => {
            tracing::error!(error = %e, "Configuration incomplete");
            std::process::exit(1);
        }
    };

    for version in &active.rate_versions {
        tracing::info!(
            config_type = %version.config_type,
            version = version.version,
            modified_by = %version.modified_by,
            "Active rate version"
        );
    }
    tracing::info!(levels = active.ladder.levels().len(), "Leadership ladder active");

    db.pool.close().await;
    Ok(())
}

//! Commission Engine - 推荐网络佣金计算引擎
//!
//! # 架构概述
//!
//! Computes what members of a multi-level referral network earn from sales
//! in their network, and decides which leadership level they qualify for:
//!
//! - **ISP** (`commission::isp`): commission on a member's own direct sales
//! - **QPB** (`commission::qpb`): cycle bonus on direct sales grouped into sets
//! - **TSC** (`commission::tsc`): generational commission, generations 2..=10
//! - **TLI** (`leadership`): the 11-level qualification ladder
//!
//! Rate tables are immutable, versioned records (`rates`, `store`); the
//! sponsor graph is walked breadth-first over an arena index (`downline`).
//!
//! # 模块结构
//!
//! ```text
//! commission-engine/src/
//! ├── core/          # 配置、错误
//! ├── commission/    # ISP / QPB / TSC calculators, cycle windows
//! ├── db/            # SQLite (sqlx) repositories
//! ├── downline/      # Downline index and trees
//! ├── leadership/    # Qualification ladder
//! ├── rates/         # Typed rate views and defaults
//! ├── store/         # Directory / rate store traits and implementations
//! ├── utils/         # 日志、时间、金额
//! ├── eligibility.rs # White-label gate
//! └── engine.rs      # Facade
//! ```

pub mod commission;
pub mod core;
pub mod db;
pub mod downline;
pub mod eligibility;
pub mod engine;
pub mod leadership;
pub mod rates;
pub mod store;
pub mod utils;

// Re-export 公共类型
pub use core::{Config, EngineError, EngineResult, EngineSettings};
pub use db::DbService;
pub use downline::{DownlineIndex, DownlineTree, NetworkNode};
pub use eligibility::{EarningScheme, Eligibility, EligibilityGate, WhiteLabelGate};
pub use engine::{CommissionEngine, CommissionStatement, QualificationRecord, TeamOverview};
pub use store::{InMemoryStore, MemberDirectory, RateConfigStore, SqliteStore};

// Re-export unified error types from shared
pub use utils::{AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

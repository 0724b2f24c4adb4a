//! # SOLON Lookup
//!
//! 自动查询希腊法院 SOLON 公开案件门户：按法院和 Γ.Α.Κ. 编号/年份查找判决
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `JsExecutor` - 唯一的 page owner，提供 eval() 能力
//! - `BrowserPage` / `SessionFactory` - 业务层看到的页面抽象
//! - `browser/` - 基于 chromiumoxide 的实现（每个 worker 一个浏览器）
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单条请求
//! - `SessionDriver` - 导航、填写、选择、提交、读取表格
//! - `CourtDirectory` - 法院名称 → 选项值
//! - `readiness` / `row_matcher` - 表格是否就绪、哪一行是目标
//! - `Notifier` / `DiagnosticsSink` - 通知和诊断文件
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一条请求"的完整处理流程
//! - `SearchCtx` - 上下文封装（index + worker）
//! - `ResultPoller` - 等待结果的状态机
//! - `SearchFlow` - 流程编排（选择 → 填写 → 提交 → 轮询 → 通知）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量调度器，管理 worker 和会话
//! - `orchestrator/single_search` - 单次查询
//!
//! ## 模块结构

pub mod app;
pub mod browser;
pub mod cli;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{BrowserPage, JsExecutor, SessionFactory};
pub use models::{SearchOutcome, SearchRequest};
pub use orchestrator::{search_once, BatchScheduler};
pub use workflow::{SearchCtx, SearchFlow};

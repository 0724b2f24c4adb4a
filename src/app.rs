//! 应用入口 - 编排层之上
//!
//! 创建会话工厂、通知渠道和诊断输出，选择单次或批量模式，并负责展示结果。

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::browser::ChromeSessionFactory;
use crate::config::Config;
use crate::error::{AppResult, FileError};
use crate::models::{load_requests, SearchOutcome, SearchRequest};
use crate::orchestrator::{search_once, BatchScheduler};
use crate::services::{ArtifactWriter, DiagnosticsSink, Notifier, WebhookNotifier};
use crate::utils::logging;
use crate::workflow::SearchFlow;

/// 运行统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub success: usize,
    pub empty: usize,
    pub failed: usize,
}

impl RunStats {
    pub fn record(&mut self, outcome: &SearchOutcome) {
        if !outcome.ok {
            self.failed += 1;
            return;
        }
        self.success += 1;
        if outcome.result.as_deref().map_or(true, |r| r.trim().is_empty()) {
            self.empty += 1;
        }
    }
}

/// 应用主结构
pub struct App {
    config: Arc<Config>,
    factory: Arc<ChromeSessionFactory>,
    notifier: Option<Arc<dyn Notifier>>,
    diagnostics: Option<Arc<dyn DiagnosticsSink>>,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> AppResult<Self> {
        // 初始化日志文件
        logging::init_log_file(&config.output_log_file)?;

        let notifier: Option<Arc<dyn Notifier>> = match &config.notify_webhook_url {
            Some(url) => Some(Arc::new(WebhookNotifier::new(
                url.as_str(),
                config.notify_timeout(),
            )?) as Arc<dyn Notifier>),
            None => None,
        };
        if notifier.is_none() {
            info!("未设置 NOTIFY_WEBHOOK_URL，批量模式不发送通知");
        }

        let diagnostics: Option<Arc<dyn DiagnosticsSink>> = config
            .debug_artifacts
            .then(|| Arc::new(ArtifactWriter::new(&config.artifacts_dir)) as Arc<dyn DiagnosticsSink>);

        let config = Arc::new(config);
        Ok(Self {
            factory: Arc::new(ChromeSessionFactory::new(config.clone())),
            config,
            notifier,
            diagnostics,
        })
    }

    /// 单次查询（不发送通知）
    pub async fn search(&self, request: SearchRequest) -> AppResult<SearchOutcome> {
        logging::log_startup("单次查询", 1);

        let flow = SearchFlow::new(&self.config).with_diagnostics(self.diagnostics.clone());
        let outcome = search_once(self.factory.as_ref(), self.config.clone(), &flow, &request).await;

        println!("{}", format_outcome(1, &request, &outcome));
        append_outcome(&self.config.output_log_file, &request, &outcome)?;

        let mut stats = RunStats::default();
        stats.record(&outcome);
        logging::print_final_stats(stats.success, stats.empty, stats.failed, &self.config.output_log_file);
        Ok(outcome)
    }

    /// 批量查询
    ///
    /// 结果按完成顺序逐条打印并追加到结果日志。
    pub async fn run_batch(&self, path: &Path) -> AppResult<RunStats> {
        let workers = self.config.batch_workers;
        logging::log_startup("批量查询", workers);

        let requests = load_requests(path).await?;
        if requests.is_empty() {
            warn!("⚠️ 文件中没有请求，程序结束");
            return Ok(RunStats::default());
        }
        logging::log_requests_loaded(requests.len(), workers);

        let flow = SearchFlow::new(&self.config)
            .with_notifier(self.notifier.clone())
            .with_diagnostics(self.diagnostics.clone());
        let scheduler = BatchScheduler::new(self.factory.clone(), self.config.clone(), flow);

        let mut run = scheduler.start(requests.clone());
        let mut stats = RunStats::default();
        let mut printed = 0usize;

        while let Some(outcome) = run.next().await {
            printed += 1;
            stats.record(&outcome);

            let fallback = SearchRequest::default();
            let request = outcome
                .index
                .and_then(|i| requests.get(i))
                .unwrap_or(&fallback);

            println!("{}", format_outcome(printed, request, &outcome));
            if let Err(e) = append_outcome(&self.config.output_log_file, request, &outcome) {
                warn!("⚠️ 写入结果日志失败: {}", e);
            }
        }

        logging::print_final_stats(stats.success, stats.empty, stats.failed, &self.config.output_log_file);
        Ok(stats)
    }
}

fn or_dash(text: &str) -> &str {
    if text.trim().is_empty() {
        "—"
    } else {
        text
    }
}

/// 控制台上的一条结果
///
/// # 参数
/// - `position`: 输出序号（从 1 开始，按完成顺序）
/// - `request`: 对应的请求
/// - `outcome`: 查询结果
pub fn format_outcome(position: usize, request: &SearchRequest, outcome: &SearchOutcome) -> String {
    let heading = format!(
        "{}. {} — {} — ΓΑΚ {}/{}",
        position,
        or_dash(&request.client),
        or_dash(&request.court),
        or_dash(&request.case_number),
        or_dash(&request.case_year)
    );

    let detail = if outcome.ok {
        let result = outcome
            .result
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or("— κενό —");
        let notification = outcome
            .notification_status
            .as_deref()
            .map(|s| format!(" ({})", s))
            .unwrap_or_default();
        format!("{}{}", result, notification)
    } else {
        format!(
            "Σφάλμα: {}",
            outcome.error.as_deref().unwrap_or("Άγνωστο σφάλμα")
        )
    };

    format!(
        "{}\n   Αριθμός Aπόφασης/'Ετος - Είδος Διατακτικού: {}\n",
        heading, detail
    )
}

#[derive(Serialize)]
struct OutcomeRecord<'a> {
    request: &'a SearchRequest,
    #[serde(flatten)]
    outcome: &'a SearchOutcome,
}

/// 把结果作为一行 JSON 追加到结果日志
pub fn append_outcome(path: &str, request: &SearchRequest, outcome: &SearchOutcome) -> AppResult<()> {
    let write_failed = |source| FileError::WriteFailed {
        path: path.to_string(),
        source,
    };

    let line = serde_json::to_string(&OutcomeRecord { request, outcome })
        .unwrap_or_else(|_| "{}".to_string());

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(write_failed)?;
    writeln!(file, "{}", line).map_err(write_failed)?;
    Ok(())
}

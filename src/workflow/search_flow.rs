//! 查询流程 - 流程层
//!
//! 核心职责：定义"一条请求"的完整处理流程
//!
//! 流程顺序：
//! 1. 检查请求 → 解析并选择法院
//! 2. 填写 Γ.Α.Κ. 编号和年份
//! 3. 记录表格快照 → 提交 → 关闭消息框
//! 4. 轮询结果
//! 5. 诊断文件（可选）→ 通知（仅有意义的结果）

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::BrowserPage;
use crate::models::{SearchOutcome, SearchRequest};
use crate::services::{build_notification, CaseKeys, DiagnosticsSink, Notifier, NotifyStatus};
use crate::utils::truncate_text;
use crate::workflow::poller::{await_result, PollPolicy};
use crate::workflow::portal_session::PortalSession;
use crate::workflow::search_ctx::SearchCtx;

/// 查询流程
///
/// - 编排一条请求的完整处理流程
/// - 不持有任何资源（page 属于 PortalSession）
/// - 只依赖业务能力（services）
#[derive(Clone)]
pub struct SearchFlow {
    policy: PollPolicy,
    notify_timeout: Duration,
    notifier: Option<Arc<dyn Notifier>>,
    diagnostics: Option<Arc<dyn DiagnosticsSink>>,
}

impl SearchFlow {
    /// 创建新的查询流程（不通知、不写诊断文件）
    pub fn new(config: &Config) -> Self {
        Self {
            policy: PollPolicy::from_config(config),
            notify_timeout: config.notify_timeout(),
            notifier: None,
            diagnostics: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Option<Arc<dyn Notifier>>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Option<Arc<dyn DiagnosticsSink>>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// 在已准备好的会话上执行一次查询
    ///
    /// # 返回
    /// 目标列文本；门户确认没有数据时为空字符串
    pub async fn run<P: BrowserPage>(
        &self,
        session: &PortalSession<P>,
        request: &SearchRequest,
        ctx: &SearchCtx,
    ) -> AppResult<String> {
        // 不碰页面之前先检查必填字段
        request.validate()?;
        let keys = CaseKeys::from_request(request)?;

        let driver = session.driver();
        let selectors = &driver.config().selectors;

        info!("{} 🔍 查询 {}", ctx, request.court);
        let court = driver
            .resolve_and_select(session.directory(), &request.court)
            .await?;
        debug!("{} 法院: {} → {}", ctx, court.label.trim(), court.value);

        driver
            .set_field(&selectors.case_number, request.case_number.trim())
            .await?;
        driver
            .set_field(&selectors.case_year, request.case_year.trim())
            .await?;

        let snapshot = driver.snapshot_grid().await;
        let method = driver.submit().await?;
        debug!("{} 已提交 ({:?})", ctx, method);
        driver.dismiss_message_box().await;

        await_result(driver, keys, snapshot, self.policy.clone()).await
    }

    /// 处理一条请求，总是得到一个 SearchOutcome
    pub async fn process<P: BrowserPage>(
        &self,
        session: &PortalSession<P>,
        request: &SearchRequest,
        ctx: &SearchCtx,
    ) -> SearchOutcome {
        let result = self.run(session, request, ctx).await;

        let mut outcome = match result {
            Ok(value) => {
                info!(
                    "{} ✓ 完成: {}",
                    ctx,
                    if value.is_empty() {
                        "(没有数据)".to_string()
                    } else {
                        truncate_text(&value, 60)
                    }
                );
                SearchOutcome::success(value)
            }
            Err(e) => {
                error!("{} ❌ 查询失败: {}", ctx, e);
                SearchOutcome::failure(&e)
            }
        };
        if ctx.batch {
            outcome = outcome.with_index(ctx.index);
        }

        if let Some(diagnostics) = &self.diagnostics {
            let markup = session.driver().grid_markup().await;
            diagnostics
                .record(&ctx.artifact_label(request), &markup, &outcome)
                .await;
        }

        if let Some(notifier) = &self.notifier {
            if outcome.is_meaningful() {
                let value = outcome.result.as_deref().unwrap_or_default();
                let notification = build_notification(request, value);
                let status = match timeout(
                    self.notify_timeout,
                    notifier.notify(&notification.subject, &notification.body),
                )
                .await
                {
                    Ok(status) => status,
                    Err(_) => {
                        warn!("{} ⚠️ 通知超时", ctx);
                        NotifyStatus::failed(format!(
                            "notification failed: timed out after {}ms",
                            self.notify_timeout.as_millis()
                        ))
                    }
                };
                outcome.notification_status = Some(status.message);
            }
        }

        outcome
    }
}

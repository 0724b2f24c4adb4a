//! 单次查询 - 编排层
//!
//! 打开一个会话、执行一次查询、关闭会话。无论哪一步失败，会话都会被关闭。

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Config;
use crate::infrastructure::SessionFactory;
use crate::models::{SearchOutcome, SearchRequest};
use crate::workflow::{PortalSession, SearchCtx, SearchFlow};

/// 执行一次查询
///
/// # 参数
/// - `factory`: 会话工厂
/// - `config`: 配置
/// - `flow`: 查询流程（单次模式不带通知）
/// - `request`: 查询请求
///
/// # 返回
/// 总是返回一个 SearchOutcome；会话打不开也作为失败结果返回
pub async fn search_once<F: SessionFactory>(
    factory: &F,
    config: Arc<Config>,
    flow: &SearchFlow,
    request: &SearchRequest,
) -> SearchOutcome {
    let ctx = SearchCtx::single(request);
    info!("{} 📄 开始单次查询: {}", ctx, request.court);

    // 先检查字段，免得为一条无效请求启动浏览器
    if let Err(e) = request.validate() {
        return SearchOutcome::failure(&e);
    }

    let page = match factory.open(0).await {
        Ok(page) => page,
        Err(e) => return SearchOutcome::failure(&e),
    };

    // prepare 失败时自己会关闭页面
    let session = match PortalSession::prepare(page, config, 0).await {
        Ok(session) => session,
        Err(e) => return SearchOutcome::failure(&e),
    };

    let outcome = flow.process(&session, request, &ctx).await;

    if let Err(e) = session.close().await {
        warn!("{} 关闭会话失败: {}", ctx, e);
    }
    outcome
}

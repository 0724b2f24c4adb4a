use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::{AppResult, BrowserError};

/// 每个 worker 独立的用户数据目录
pub fn worker_profile_dir(worker_id: usize) -> PathBuf {
    std::env::temp_dir().join(format!(
        "solon-lookup-{}-{}",
        std::process::id(),
        worker_id
    ))
}

/// 根据配置构造浏览器启动参数
pub fn browser_config(config: &Config, worker_id: usize) -> AppResult<BrowserConfig> {
    let mut builder = BrowserConfig::builder();
    builder = if config.headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };

    builder = builder
        .window_size(1500, 950)
        .user_data_dir(worker_profile_dir(worker_id))
        .request_timeout(config.navigation_timeout() + Duration::from_secs(5))
        .args(vec![
            "--lang=el-GR",
            "--disable-gpu",
            "--no-sandbox",
            "--disable-dev-shm-usage",
        ]);

    if let Some(path) = &config.chrome_executable {
        builder = builder.chrome_executable(path);
    }

    builder.build().map_err(|message| {
        error!("配置浏览器失败: {}", message);
        BrowserError::LaunchFailed { worker_id, message }.into()
    })
}

/// 启动浏览器，并在后台处理浏览器事件
///
/// # 参数
/// - `config`: 程序配置（无头模式、可执行文件、超时）
/// - `worker_id`: worker 编号，决定用户数据目录
///
/// # 返回
/// 浏览器句柄和事件循环任务
pub async fn launch_browser(
    config: &Config,
    worker_id: usize,
) -> AppResult<(Browser, JoinHandle<()>)> {
    info!(
        "🚀 [worker {}] 启动浏览器 ({})...",
        worker_id,
        if config.headless { "无头" } else { "有界面" }
    );

    let browser_config = browser_config(config, worker_id)?;
    let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
        error!("[worker {}] 启动浏览器失败: {}", worker_id, e);
        BrowserError::LaunchFailed {
            worker_id,
            message: e.to_string(),
        }
    })?;
    debug!("[worker {}] 浏览器启动成功", worker_id);

    // 在后台处理浏览器事件
    let handle = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    Ok((browser, handle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_dirs_are_distinct_per_worker() {
        assert_ne!(worker_profile_dir(0), worker_profile_dir(1));
        assert!(worker_profile_dir(3)
            .to_string_lossy()
            .ends_with(&format!("-{}", 3)));
    }
}

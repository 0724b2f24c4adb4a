//! 已准备好的门户会话
//!
//! 打开门户并加载法院目录；之后同一会话上的查询严格串行。

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::BrowserPage;
use crate::services::{CourtDirectory, SessionDriver};

/// 一个会话和它的法院目录
pub struct PortalSession<P: BrowserPage> {
    driver: SessionDriver<P>,
    directory: CourtDirectory,
}

impl<P: BrowserPage> PortalSession<P> {
    /// 导航到门户并构建法院目录
    ///
    /// 失败时页面会被关闭。
    pub async fn prepare(page: P, config: Arc<Config>, worker_id: usize) -> AppResult<Self> {
        let portal_url = config.portal_url.clone();
        let driver = SessionDriver::new(page, config, worker_id);

        let prepared = async {
            driver.navigate(&portal_url).await?;
            CourtDirectory::load(&driver).await
        }
        .await;

        match prepared {
            Ok(directory) => {
                info!("✅ [worker {}] 会话已就绪", worker_id);
                Ok(Self { driver, directory })
            }
            Err(e) => {
                warn!("⚠️ [worker {}] 准备会话失败: {}", worker_id, e);
                if let Err(close_err) = driver.close().await {
                    warn!("[worker {}] 关闭页面失败: {}", worker_id, close_err);
                }
                Err(e)
            }
        }
    }

    pub fn driver(&self) -> &SessionDriver<P> {
        &self.driver
    }

    pub fn directory(&self) -> &CourtDirectory {
        &self.directory
    }

    /// 关闭会话
    pub async fn close(self) -> AppResult<()> {
        self.driver.close().await
    }
}

//! 诊断文件写入 - 业务能力层
//!
//! 只负责"把一次查询的表格 HTML 和结果写到磁盘"，不关心流程。
//! 写入失败只记日志，从不影响查询结果。

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{AppResult, FileError};
use crate::models::{GridMarkup, SearchOutcome};

/// 诊断输出
#[async_trait]
pub trait DiagnosticsSink: Send + Sync {
    async fn record(&self, label: &str, markup: &GridMarkup, outcome: &SearchOutcome);
}

/// 写到目录里的诊断文件
///
/// 每次查询生成 `<label>_hdr.html`、`<label>_db.html`、`<label>_table.html`、`<label>.json`。
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn write_file(&self, name: &str, content: &[u8]) -> AppResult<()> {
        let path = self.dir.join(name);
        fs::write(&path, content)
            .await
            .map_err(|source| FileError::WriteFailed {
                path: path.display().to_string(),
                source,
            })?;
        Ok(())
    }

    /// 写入全部文件
    ///
    /// # 参数
    /// - `label`: 文件名前缀
    /// - `markup`: 表格原始 HTML
    /// - `outcome`: 查询结果
    pub async fn write_all(
        &self,
        label: &str,
        markup: &GridMarkup,
        outcome: &SearchOutcome,
    ) -> AppResult<()> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| FileError::WriteFailed {
                path: self.dir.display().to_string(),
                source,
            })?;

        self.write_file(&format!("{}_hdr.html", label), markup.header.as_bytes())
            .await?;
        self.write_file(&format!("{}_db.html", label), markup.body.as_bytes())
            .await?;
        self.write_file(&format!("{}_table.html", label), markup.table.as_bytes())
            .await?;

        let json = serde_json::to_string_pretty(outcome).unwrap_or_else(|_| "{}".to_string());
        self.write_file(&format!("{}.json", label), json.as_bytes())
            .await?;

        debug!("诊断文件已写入: {}/{}*", self.dir.display(), label);
        Ok(())
    }
}

#[async_trait]
impl DiagnosticsSink for ArtifactWriter {
    async fn record(&self, label: &str, markup: &GridMarkup, outcome: &SearchOutcome) {
        if let Err(e) = self.write_all(label, markup, outcome).await {
            warn!("⚠️ 写入诊断文件失败 ({}): {}", label, e);
        }
    }
}

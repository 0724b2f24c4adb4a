//! 批量请求的加载器
//!
//! 按扩展名选择：`.xlsx` / `.xlsm` / `.xls` / `.ods` 读工作簿，其它按 TOML 读。

pub mod toml_loader;
pub mod xlsx_loader;

use std::path::Path;

use crate::error::{AppResult, FileError};
use crate::models::request::SearchRequest;

pub use toml_loader::{load_toml_requests, parse_requests};
pub use xlsx_loader::{load_workbook_requests, requests_from_rows, REQUIRED_COLUMNS};

/// 输入文件的格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Workbook,
    Toml,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "xlsx" | "xlsm" | "xls" | "ods" => InputFormat::Workbook,
            _ => InputFormat::Toml,
        }
    }
}

/// 加载请求列表（保持文件中的顺序）
pub async fn load_requests(path: &Path) -> AppResult<Vec<SearchRequest>> {
    if !path.exists() {
        return Err(FileError::NotFound {
            path: path.display().to_string(),
        }
        .into());
    }

    match InputFormat::from_path(path) {
        InputFormat::Workbook => load_workbook_requests(path).await,
        InputFormat::Toml => load_toml_requests(path).await,
    }
}

//! 查询上下文
//!
//! 封装"我是哪个 worker、正在处理输入中的第几条"这一信息

use std::fmt::Display;

use crate::models::SearchRequest;

/// 查询上下文
#[derive(Debug, Clone)]
pub struct SearchCtx {
    /// 请求在输入中的位置（从 0 开始），单次查询时为 0
    pub index: usize,

    /// 处理该请求的 worker
    pub worker_id: usize,

    /// 是否为批量模式（决定诊断文件的命名）
    pub batch: bool,

    /// 案号（仅用于日志显示）
    pub case_label: String,
}

impl SearchCtx {
    /// 单次查询的上下文
    pub fn single(request: &SearchRequest) -> Self {
        Self {
            index: 0,
            worker_id: 0,
            batch: false,
            case_label: request.case_label(),
        }
    }

    /// 批量查询的上下文
    pub fn batch(index: usize, worker_id: usize, request: &SearchRequest) -> Self {
        Self {
            index,
            worker_id,
            batch: true,
            case_label: request.case_label(),
        }
    }

    /// 诊断文件名前缀
    pub fn artifact_label(&self, request: &SearchRequest) -> String {
        let number = file_safe(&request.case_number);
        let year = file_safe(&request.case_year);
        if self.batch {
            format!(
                "cli_row_{}_{}_{}_w{}",
                self.index + 1,
                number,
                year,
                self.worker_id
            )
        } else {
            format!("after_{}_{}", number, year)
        }
    }
}

fn file_safe(text: &str) -> String {
    text.trim()
        .chars()
        .map(|ch| if ch.is_alphanumeric() { ch } else { '_' })
        .collect()
}

impl Display for SearchCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.batch {
            write!(
                f,
                "[#{} worker {} ΓΑΚ {}]",
                self.index + 1,
                self.worker_id,
                self.case_label
            )
        } else {
            write!(f, "[ΓΑΚ {}]", self.case_label)
        }
    }
}

//! 行匹配 - 业务能力层
//!
//! 在表格数据行中找到 Γ.Α.Κ. 编号和年份对应的行，取出目标列。

use regex::Regex;

use crate::error::{AppError, AppResult};
use crate::models::{GridRow, GridState, MatchResult, SearchRequest};
use crate::utils::{collapse_whitespace, is_meaningful_result};

/// 匹配用的案号
#[derive(Debug, Clone)]
pub struct CaseKeys {
    number: String,
    year: String,
    combined: Regex,
}

impl CaseKeys {
    pub fn new(number: &str, year: &str) -> AppResult<Self> {
        let number = collapse_whitespace(number);
        let year = collapse_whitespace(year);
        if number.is_empty() {
            return Err(AppError::MissingField {
                field: "case_number",
            });
        }
        if year.is_empty() {
            return Err(AppError::MissingField { field: "case_year" });
        }

        // 形如 "70927/2025"、"70927 / 2025" 的单元格
        let combined = Regex::new(&format!(
            r"^\s*{}\s*/\s*{}\s*$",
            regex::escape(&number),
            regex::escape(&year)
        ))?;

        Ok(Self {
            number,
            year,
            combined,
        })
    }

    pub fn from_request(request: &SearchRequest) -> AppResult<Self> {
        Self::new(&request.case_number, &request.case_year)
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn year(&self) -> &str {
        &self.year
    }

    /// 该行的非目标列是否对应这个案号
    pub fn matches_row(&self, row: &GridRow) -> bool {
        let texts: Vec<String> = row.cells.iter().map(|c| collapse_whitespace(c)).collect();

        let has_number = texts.iter().any(|t| *t == self.number);
        let has_year = texts.iter().any(|t| *t == self.year);
        let has_combined = texts.iter().any(|t| self.combined.is_match(t));

        (has_number && has_year) || has_combined
    }
}

/// 第一条匹配行的目标列文本（已规范化；没有目标列时为空字符串）
pub fn find_target(rows: &[GridRow], keys: &CaseKeys) -> Option<String> {
    rows.iter()
        .find(|row| keys.matches_row(row))
        .map(|row| {
            row.target
                .as_deref()
                .map(collapse_whitespace)
                .unwrap_or_default()
        })
}

/// 对一次表格读取做匹配
///
/// 匹配到的目标没有意义（空或表头文本）时不下结论，继续轮询。
pub fn match_grid(grid: &GridState, keys: &CaseKeys, sentinel: &str) -> MatchResult {
    if !grid.present {
        return MatchResult::inconclusive();
    }

    if let Some(value) = find_target(&grid.rows, keys) {
        if is_meaningful_result(&value) {
            return MatchResult::found(value);
        }
    }

    if grid.shows_sentinel(sentinel) {
        MatchResult::no_data()
    } else {
        MatchResult::inconclusive()
    }
}

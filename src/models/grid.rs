//! 结果表格的页面状态模型
//!
//! 这些类型由页面脚本的 JSON 结果反序列化而来，之后的判断都是纯函数。

use serde::{Deserialize, Serialize};

/// 表格数据区里的一行
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridRow {
    /// 除目标列以外的单元格文本（原样，未规范化）
    pub cells: Vec<String>,
    /// 目标列文本；该行没有目标列时为 None
    pub target: Option<String>,
}

impl GridRow {
    pub fn new<I, S>(cells: I, target: Option<&str>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cells: cells.into_iter().map(Into::into).collect(),
            target: target.map(str::to_string),
        }
    }
}

/// 一次读取到的表格状态
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridState {
    /// 数据区是否存在
    pub present: bool,
    /// 数据区的完整文本（已 trim）
    pub text: String,
    /// 含有 td 的行
    pub rows: Vec<GridRow>,
    /// 加载提示是否可见
    #[serde(rename = "busy")]
    pub busy_visible: bool,
}

impl GridState {
    /// 数据区是否显示"没有数据"
    pub fn shows_sentinel(&self, sentinel: &str) -> bool {
        self.present && self.text.contains(sentinel)
    }

    pub fn has_rows(&self) -> bool {
        self.present && !self.rows.is_empty()
    }

    /// 当前文本作为快照
    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot(self.text.trim().to_string())
    }
}

/// 提交前数据区文本的快照，只用于判断内容是否变化
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridSnapshot(pub String);

impl GridSnapshot {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 行匹配结果
///
/// `found` 与 `no_data` 互斥；两者都为 false 表示还不能下结论。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    pub found: bool,
    pub value: Option<String>,
    pub no_data: bool,
}

impl MatchResult {
    pub fn found(value: impl Into<String>) -> Self {
        Self {
            found: true,
            value: Some(value.into()),
            no_data: false,
        }
    }

    pub fn no_data() -> Self {
        Self {
            found: false,
            value: None,
            no_data: true,
        }
    }

    pub fn inconclusive() -> Self {
        Self::default()
    }
}

/// 下拉框中的一个选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourtOption {
    pub label: String,
    pub value: String,
}

impl CourtOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// 诊断用的表格原始 HTML
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridMarkup {
    pub header: String,
    pub body: String,
    pub table: String,
}

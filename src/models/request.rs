use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AppError, AppResult};
use crate::utils::is_meaningful_result;

/// 一条查询请求
///
/// 所有字段都是文本；编号和年份在解析法院之前必须非空。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchRequest {
    /// 客户名称（仅用于展示和通知）
    #[serde(deserialize_with = "text_or_number")]
    pub client: String,
    /// 法院名称（自由文本）
    #[serde(deserialize_with = "text_or_number")]
    pub court: String,
    /// Γ.Α.Κ. 编号
    #[serde(deserialize_with = "text_or_number")]
    pub case_number: String,
    /// Γ.Α.Κ. 年份
    #[serde(deserialize_with = "text_or_number")]
    pub case_year: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Int(i64),
    Float(f64),
}

/// 数字形式的编号 / 年份（如 `case_number = 70927`）按文本读入
fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match TextOrNumber::deserialize(deserializer)? {
        TextOrNumber::Text(text) => text,
        TextOrNumber::Int(n) => n.to_string(),
        TextOrNumber::Float(f) => number_text(f),
    })
}

/// 整数值的浮点数不带小数部分（表格里的 70927.0 → "70927"）
pub(crate) fn number_text(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

impl SearchRequest {
    pub fn new(
        court: impl Into<String>,
        case_number: impl Into<String>,
        case_year: impl Into<String>,
    ) -> Self {
        Self {
            client: String::new(),
            court: court.into(),
            case_number: case_number.into(),
            case_year: case_year.into(),
        }
    }

    pub fn with_client(mut self, client: impl Into<String>) -> Self {
        self.client = client.into();
        self
    }

    /// 检查必填字段
    pub fn validate(&self) -> AppResult<()> {
        if self.case_number.trim().is_empty() {
            return Err(AppError::MissingField {
                field: "case_number",
            });
        }
        if self.case_year.trim().is_empty() {
            return Err(AppError::MissingField { field: "case_year" });
        }
        Ok(())
    }

    /// 形如 `70927/2025` 的案号
    pub fn case_label(&self) -> String {
        format!("{}/{}", self.case_number.trim(), self.case_year.trim())
    }
}

/// 一次查询的结果，交给展示层
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_status: Option<String>,
    /// 请求在输入中的位置（从 0 开始）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl SearchOutcome {
    /// 成功（结果可以为空字符串，表示门户确认没有数据）
    pub fn success(result: impl Into<String>) -> Self {
        Self {
            ok: true,
            result: Some(result.into()),
            ..Default::default()
        }
    }

    /// 失败
    pub fn failure(error: &AppError) -> Self {
        Self {
            ok: false,
            error: Some(error.to_string()),
            ..Default::default()
        }
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// 成功且结果有意义（会触发通知）
    pub fn is_meaningful(&self) -> bool {
        self.ok
            && self
                .result
                .as_deref()
                .map(is_meaningful_result)
                .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_validate_requires_number_and_year() {
        let ok = SearchRequest::new("ΠΡΩΤΟΔΙΚΕΙΟ ΑΘΗΝΩΝ", "70927", "2025");
        assert!(ok.validate().is_ok());

        let missing_year = SearchRequest::new("ΠΡΩΤΟΔΙΚΕΙΟ ΑΘΗΝΩΝ", "70927", " ");
        assert!(matches!(
            missing_year.validate(),
            Err(AppError::MissingField { field: "case_year" })
        ));
    }

    #[test]
    fn test_numeric_fields_are_read_as_text() {
        let request: SearchRequest = serde_json::from_value(serde_json::json!({
            "court": "ΠΡΩΤΟΔΙΚΕΙΟ ΑΘΗΝΩΝ",
            "case_number": 70927,
            "case_year": 2025.0
        }))
        .unwrap();
        assert_eq!(request.case_label(), "70927/2025");
        assert_eq!(request.client, "");
        assert_eq!(number_text(12.5), "12.5");
    }

    #[test]
    fn test_outcome_serializes_with_camel_case_keys() {
        let mut outcome = SearchOutcome::success("ΑΠΟΡΡΙΠΤΙΚΗ 123/2025").with_index(3);
        outcome.notification_status = Some("notification ok".to_string());

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["ok"], true);
        assert_eq!(json["index"], 3);
        assert_eq!(json["notificationStatus"], "notification ok");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_failure_and_meaningfulness() {
        let failed = SearchOutcome::failure(&AppError::timeout("等待结果", Duration::from_secs(1)));
        assert!(!failed.ok);
        assert!(failed.error.as_deref().unwrap().starts_with("Timeout"));
        assert!(!failed.is_meaningful());

        assert!(!SearchOutcome::success("").is_meaningful());
        assert!(SearchOutcome::success("ΔΕΚΤΗ").is_meaningful());
    }
}

use std::path::Path;

use serde::Deserialize;
use tokio::fs;

use crate::error::{AppResult, FileError};
use crate::models::request::SearchRequest;

/// TOML 请求文件的结构
///
/// ```toml
/// [[requests]]
/// client = "Παπαδόπουλος"
/// court = "ΠΡΩΤΟΔΙΚΕΙΟ ΑΘΗΝΩΝ"
/// case_number = "70927"
/// case_year = "2025"
/// ```
#[derive(Debug, Default, Deserialize)]
struct RequestFile {
    #[serde(default)]
    requests: Vec<SearchRequest>,
}

/// 从 TOML 文本解析请求列表（保持文件中的顺序）
pub fn parse_requests(content: &str, origin: &str) -> AppResult<Vec<SearchRequest>> {
    let file: RequestFile = toml::from_str(content).map_err(|source| FileError::TomlParseFailed {
        path: origin.to_string(),
        source,
    })?;
    Ok(file.requests)
}

/// 从 TOML 文件加载请求列表
pub async fn load_toml_requests(path: &Path) -> AppResult<Vec<SearchRequest>> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|source| FileError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;

    let requests = parse_requests(&content, &path.display().to_string())?;
    tracing::info!(
        "正在加载: {} ({} 条记录)",
        path.file_name().unwrap_or_default().to_string_lossy(),
        requests.len()
    );

    Ok(requests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn test_parse_requests_keeps_order_and_defaults() {
        let content = r#"
            [[requests]]
            client = "Α"
            court = "ΠΡΩΤΟΔΙΚΕΙΟ ΑΘΗΝΩΝ"
            case_number = "70927"
            case_year = "2025"

            [[requests]]
            court = "ΕΙΡΗΝΟΔΙΚΕΙΟ ΠΕΙΡΑΙΑ"
            case_number = "12"
        "#;

        let requests = parse_requests(content, "inline").unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].client, "Α");
        assert_eq!(requests[0].case_label(), "70927/2025");
        assert_eq!(requests[1].client, "");
        assert_eq!(requests[1].case_year, "");
    }

    #[test]
    fn test_numeric_case_fields_are_accepted() {
        let content = r#"
            [[requests]]
            court = "ΠΡΩΤΟΔΙΚΕΙΟ ΑΘΗΝΩΝ"
            case_number = 70927
            case_year = 2025
        "#;
        let requests = parse_requests(content, "inline").unwrap();
        assert_eq!(requests[0].case_label(), "70927/2025");
    }

    #[test]
    fn test_parse_requests_reports_bad_toml() {
        let err = parse_requests("[[requests]\ncourt = 1", "bad.toml").unwrap_err();
        assert!(matches!(
            err,
            AppError::File(FileError::TomlParseFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_load_requests_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.toml");
        std::fs::write(
            &path,
            "[[requests]]\ncourt = \"ΠΡΩΤΟΔΙΚΕΙΟ ΑΘΗΝΩΝ\"\ncase_number = \"1\"\ncase_year = \"2024\"\n",
        )
        .unwrap();

        let requests = load_toml_requests(&path).await.unwrap();
        assert_eq!(requests.len(), 1);

        let missing = load_toml_requests(&dir.path().join("nope.toml")).await;
        assert!(matches!(
            missing,
            Err(AppError::File(FileError::ReadFailed { .. }))
        ));
    }
}

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use crate::error::{AppError, AppResult, FileError};
use crate::models::request::{number_text, SearchRequest};

/// 工作簿第一行必须包含的表头（完全一致，去掉首尾空白后比较）
pub const REQUIRED_COLUMNS: [&str; 4] = ["Πελάτης", "Δικαστήριο", "Γ.Α.Κ. Αριθμός", "Γ.Α.Κ. Έτος"];

/// 把单元格转成文本，整数值的浮点数不带小数
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => number_text(*f),
        other => other.to_string().trim().to_string(),
    }
}

/// 从表格行构建请求列表
///
/// 第一行是表头；全空的行跳过。缺列时返回缺少的表头名。
pub fn requests_from_rows(rows: &[Vec<String>]) -> Result<Vec<SearchRequest>, Vec<&'static str>> {
    let Some((header, body)) = rows.split_first() else {
        return Err(REQUIRED_COLUMNS.to_vec());
    };

    let position = |name: &str| header.iter().position(|h| h.trim() == name);
    let mut indices = [0usize; 4];
    let mut missing = Vec::new();
    for (slot, name) in REQUIRED_COLUMNS.iter().enumerate() {
        match position(name) {
            Some(i) => indices[slot] = i,
            None => missing.push(*name),
        }
    }
    if !missing.is_empty() {
        return Err(missing);
    }

    let cell = |row: &Vec<String>, i: usize| row.get(i).map(|s| s.trim().to_string()).unwrap_or_default();
    let requests = body
        .iter()
        .filter(|row| row.iter().any(|c| !c.trim().is_empty()))
        .map(|row| {
            SearchRequest::new(cell(row, indices[1]), cell(row, indices[2]), cell(row, indices[3]))
                .with_client(cell(row, indices[0]))
        })
        .collect();

    Ok(requests)
}

/// 读取工作簿：依次尝试每个工作表，取第一个带齐表头的
fn read_workbook(path: &Path) -> AppResult<Vec<SearchRequest>> {
    let origin = path.display().to_string();
    let workbook_error = |message: String| -> AppError {
        FileError::WorkbookFailed {
            path: origin.clone(),
            message,
        }
        .into()
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| workbook_error(e.to_string()))?;

    let mut problems = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| workbook_error(format!("{}: {}", name, e)))?;
        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();

        match requests_from_rows(&rows) {
            Ok(requests) => {
                tracing::debug!("使用工作表 «{}»", name);
                return Ok(requests);
            }
            Err(missing) => problems.push(format!("{}: {}", name, missing.join(", "))),
        }
    }

    Err(FileError::MissingColumns {
        path: origin.clone(),
        missing: if problems.is_empty() {
            REQUIRED_COLUMNS.join(", ")
        } else {
            problems.join("; ")
        },
    }
    .into())
}

/// 从 Excel / ODS 工作簿加载请求列表
pub async fn load_workbook_requests(path: &Path) -> AppResult<Vec<SearchRequest>> {
    let owned = path.to_path_buf();
    let requests = tokio::task::spawn_blocking(move || read_workbook(&owned))
        .await
        .map_err(|e| FileError::WorkbookFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })??;

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

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_rows_map_by_header_name() {
        let table = rows(&[
            &["Γ.Α.Κ. Έτος", " Πελάτης ", "Σημειώσεις", "Δικαστήριο", "Γ.Α.Κ. Αριθμός"],
            &["2025", "Παπαδόπουλος", "x", "ΠΡΩΤΟΔΙΚΕΙΟ ΑΘΗΝΩΝ", "70927"],
            &["", "", "", "", ""],
            &["2024", "", "", "ΕΙΡΗΝΟΔΙΚΕΙΟ ΠΕΙΡΑΙΑ", "12"],
        ]);

        let requests = requests_from_rows(&table).unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].client, "Παπαδόπουλος");
        assert_eq!(requests[0].court, "ΠΡΩΤΟΔΙΚΕΙΟ ΑΘΗΝΩΝ");
        assert_eq!(requests[0].case_label(), "70927/2025");
        assert_eq!(requests[1].case_label(), "12/2024");
    }

    #[test]
    fn test_headers_must_match_exactly() {
        let table = rows(&[
            &["Πελάτης", "Δικαστηριο", "ΓΑΚ", "Γ.Α.Κ. Έτος"],
            &["a", "b", "1", "2025"],
        ]);
        let missing = requests_from_rows(&table).unwrap_err();
        assert_eq!(missing, vec!["Δικαστήριο", "Γ.Α.Κ. Αριθμός"]);

        assert_eq!(requests_from_rows(&[]).unwrap_err().len(), 4);
    }

    #[test]
    fn test_short_rows_leave_fields_empty() {
        let table = rows(&[
            &["Πελάτης", "Δικαστήριο", "Γ.Α.Κ. Αριθμός", "Γ.Α.Κ. Έτος"],
            &["", "ΠΡΩΤΟΔΙΚΕΙΟ ΑΘΗΝΩΝ"],
        ]);
        let requests = requests_from_rows(&table).unwrap();
        assert_eq!(requests[0].case_number, "");
        assert!(requests[0].validate().is_err());
    }

    #[test]
    fn test_numeric_cells_become_plain_text() {
        assert_eq!(cell_text(&Data::Float(70927.0)), "70927");
        assert_eq!(cell_text(&Data::Int(2025)), "2025");
        assert_eq!(cell_text(&Data::String(" ΑΘΗΝΩΝ ".into())), "ΑΘΗΝΩΝ");
        assert_eq!(cell_text(&Data::Empty), "");
    }
}

//! 法院目录 - 业务能力层
//!
//! 每个会话构建一次：把下拉框选项的显示文本规范化后映射到选项值。

use std::collections::HashMap;

use tokio::time::sleep;
use tracing::{debug, info};

use crate::error::{AppError, AppResult, BrowserError};
use crate::infrastructure::BrowserPage;
use crate::models::CourtOption;
use crate::services::session_driver::SessionDriver;
use crate::utils::normalize_label;

/// 下拉框仍为空时的最多读取次数
const LOAD_ATTEMPTS: usize = 10;

/// 构建后不可变的法院目录
#[derive(Debug, Clone, Default)]
pub struct CourtDirectory {
    /// 按选项顺序保存（规范化标签, 选项）
    entries: Vec<(String, CourtOption)>,
    index: HashMap<String, usize>,
}

impl CourtDirectory {
    /// 从选项列表构建；规范化后为空的选项被忽略
    ///
    /// 重复的标签取最后一个选项的值，但保持第一次出现的位置。
    pub fn build<I>(options: I) -> Self
    where
        I: IntoIterator<Item = CourtOption>,
    {
        let mut directory = Self::default();
        for option in options {
            let key = normalize_label(&option.label);
            if key.is_empty() {
                continue;
            }
            match directory.index.get(&key) {
                Some(&pos) => directory.entries[pos].1 = option,
                None => {
                    directory.index.insert(key.clone(), directory.entries.len());
                    directory.entries.push((key, option));
                }
            }
        }
        directory
    }

    /// 解析法院名称
    ///
    /// 先找完全相同的规范化标签，再按选项顺序找包含查询文本的标签。
    pub fn resolve(&self, label: &str) -> AppResult<&CourtOption> {
        let query = normalize_label(label);
        let not_found = || AppError::CourtNotFound {
            label: label.to_string(),
        };

        if query.is_empty() {
            return Err(not_found());
        }

        if let Some(&pos) = self.index.get(&query) {
            return Ok(&self.entries[pos].1);
        }

        self.entries
            .iter()
            .find(|(key, _)| key.contains(&query))
            .map(|(_, option)| option)
            .ok_or_else(not_found)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 读取页面上的法院下拉框并构建目录
    ///
    /// 页面还在渲染时选项可能为空，短暂重试。
    pub async fn load<P: BrowserPage>(driver: &SessionDriver<P>) -> AppResult<Self> {
        let selector = driver.config().selectors.court_select.clone();

        for attempt in 1..=LOAD_ATTEMPTS {
            match driver.list_options(&selector).await {
                Ok(options) => {
                    let directory = Self::build(options);
                    if !directory.is_empty() {
                        info!("📚 法院目录已加载: {} 个法院", directory.len());
                        return Ok(directory);
                    }
                    debug!("法院下拉框为空 (第 {} 次)", attempt);
                }
                Err(e) if e.is_transient() => {
                    debug!("读取法院下拉框失败 (第 {} 次): {}", attempt, e);
                }
                Err(e) => return Err(e.into()),
            }
            sleep(driver.config().poll_interval()).await;
        }

        Err(BrowserError::ElementMissing { selector }.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> CourtDirectory {
        CourtDirectory::build(vec![
            CourtOption::new("", ""),
            CourtOption::new("ΠΡΩΤΟΔΙΚΕΙΟ ΑΘΗΝΩΝ - ΤΜΗΜΑ", "10"),
            CourtOption::new("Πρωτοδικείο Αθηνών", "11"),
            CourtOption::new("ΕΙΡΗΝΟΔΙΚΕΙΟ ΠΕΙΡΑΙΑ", "20"),
            CourtOption::new("Ειρηνοδικείο Πειραιά", "21"),
        ])
    }

    #[test]
    fn test_exact_match_beats_earlier_substring() {
        let dir = directory();
        assert_eq!(dir.resolve("ΠΡΩΤΟΔΙΚΕΙΟ ΑΘΗΝΩΝ").unwrap().value, "11");
    }

    #[test]
    fn test_substring_match_takes_first_in_option_order() {
        let dir = directory();
        assert_eq!(dir.resolve("αθηνων").unwrap().value, "10");
    }

    #[test]
    fn test_duplicate_labels_take_last_option() {
        let dir = directory();
        assert_eq!(dir.len(), 3);
        assert_eq!(dir.resolve("ΕΙΡΗΝΟΔΙΚΕΙΟ ΠΕΙΡΑΙΑ").unwrap().value, "21");
        assert_eq!(dir.resolve("Ειρηνοδικείο Πειραιά").unwrap().value, "21");
    }

    #[test]
    fn test_duplicate_keeps_first_position_for_substring_search() {
        let dir = CourtDirectory::build(vec![
            CourtOption::new("ΕΙΡΗΝΟΔΙΚΕΙΟ ΠΕΙΡΑΙΑ", "20"),
            CourtOption::new("ΠΡΩΤΟΔΙΚΕΙΟ ΠΕΙΡΑΙΑ", "30"),
            CourtOption::new("Ειρηνοδικείο Πειραιά", "21"),
        ]);
        // 第一个包含"πειραια"的仍是重复标签原来的位置
        assert_eq!(dir.resolve("πειραια").unwrap().value, "21");
    }

    #[test]
    fn test_unknown_or_empty_label_is_not_found() {
        let dir = directory();
        assert!(matches!(
            dir.resolve("ΕΦΕΤΕΙΟ ΘΕΣΣΑΛΟΝΙΚΗΣ"),
            Err(AppError::CourtNotFound { .. })
        ));
        assert!(matches!(
            dir.resolve(" - "),
            Err(AppError::CourtNotFound { .. })
        ));
    }
}

//! 测试用的假门户
//!
//! 模拟 SOLON 页面：法院下拉框、两个输入框、搜索按钮和结果表格。
//! 提交后经过 `refresh_delay` 表格才换成新结果。

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};

use solon_lookup::config::Config;
use solon_lookup::error::{AppError, AppResult, BrowserError, ReadError};
use solon_lookup::infrastructure::{BrowserPage, PageScript, SessionFactory};
use solon_lookup::models::{CourtOption, GridRow, GridState};
use solon_lookup::services::{Notifier, NotifyStatus};

pub const SENTINEL: &str = "Δεν υπάρχουν δεδομένα";

/// 门户上的数据：法院列表 + 每个案号的结果
#[derive(Clone, Default)]
pub struct PortalData {
    pub courts: Vec<CourtOption>,
    /// (法院值, 编号, 年份) → 目标列
    pub decisions: HashMap<(String, String, String), String>,
}

impl PortalData {
    pub fn sample() -> Self {
        let mut data = Self {
            courts: vec![
                CourtOption::new("", ""),
                CourtOption::new("ΠΡΩΤΟΔΙΚΕΙΟ ΑΘΗΝΩΝ", "101"),
                CourtOption::new("ΕΙΡΗΝΟΔΙΚΕΙΟ ΠΕΙΡΑΙΑ", "202"),
            ],
            decisions: HashMap::new(),
        };
        data.decide("101", "70927", "2025", "ΑΠΟΡΡΙΠΤΙΚΗ 123/2025");
        data
    }

    pub fn decide(&mut self, court: &str, number: &str, year: &str, target: &str) {
        self.decisions.insert(
            (court.to_string(), number.to_string(), year.to_string()),
            target.to_string(),
        );
    }
}

struct PortalState {
    fields: HashMap<String, String>,
    grid: GridState,
    pending: Option<(Instant, GridState)>,
    submissions: usize,
}

/// 假门户页面
pub struct FakePortalPage {
    data: PortalData,
    config: Arc<Config>,
    refresh_delay: Duration,
    state: Mutex<PortalState>,
    closes: Arc<AtomicUsize>,
    fail_navigation: bool,
}

impl FakePortalPage {
    pub fn new(data: PortalData, config: Arc<Config>) -> Self {
        Self {
            data,
            config,
            refresh_delay: Duration::from_millis(20),
            state: Mutex::new(PortalState {
                fields: HashMap::new(),
                grid: GridState {
                    present: true,
                    ..Default::default()
                },
                pending: None,
                submissions: 0,
            }),
            closes: Arc::new(AtomicUsize::new(0)),
            fail_navigation: false,
        }
    }

    fn field(&self, selector: &str) -> String {
        self.state
            .lock()
            .unwrap()
            .fields
            .get(selector)
            .cloned()
            .unwrap_or_default()
    }

    fn result_grid(&self) -> GridState {
        let selectors = &self.config.selectors;
        let court = self.field(&selectors.court_select);
        let number = self.field(&selectors.case_number);
        let year = self.field(&selectors.case_year);

        match self.data.decisions.get(&(court, number.clone(), year.clone())) {
            Some(target) => GridState {
                present: true,
                text: format!("{} {} {}", number, year, target),
                rows: vec![GridRow::new([number.as_str(), year.as_str()], Some(target))],
                busy_visible: false,
            },
            None => GridState {
                present: true,
                text: SENTINEL.to_string(),
                rows: vec![GridRow::new([SENTINEL], None)],
                busy_visible: false,
            },
        }
    }

    fn submit(&self) {
        let grid = self.result_grid();
        let mut state = self.state.lock().unwrap();
        state.submissions += 1;
        state.pending = Some((Instant::now() + self.refresh_delay, grid));
    }

    fn current_grid(&self) -> GridState {
        let mut state = self.state.lock().unwrap();
        let due = matches!(&state.pending, Some((at, _)) if Instant::now() >= *at);
        if due {
            if let Some((_, grid)) = state.pending.take() {
                state.grid = grid;
            }
        }
        state.grid.clone()
    }
}

#[async_trait]
impl BrowserPage for FakePortalPage {
    async fn goto(&self, url: &str) -> AppResult<()> {
        if self.fail_navigation {
            return Err(AppError::navigation_failed(
                url,
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
            ));
        }
        Ok(())
    }

    async fn eval(&self, script: &PageScript) -> Result<JsonValue, ReadError> {
        let value = match script {
            PageScript::GridState(_) => serde_json::to_value(self.current_grid())
                .map_err(|e| ReadError::Transient(e.to_string()))?,
            PageScript::FieldValue { selector } => json!(self.field(selector)),
            PageScript::AssignField { selector, value }
            | PageScript::SelectValue { selector, value } => {
                self.state
                    .lock()
                    .unwrap()
                    .fields
                    .insert(selector.clone(), value.clone());
                json!(true)
            }
            PageScript::ListOptions { .. } => json!(self.data.courts),
            PageScript::ScriptedClick { .. } => {
                self.submit();
                json!(true)
            }
            PageScript::IsClickable { .. } => json!(true),
            PageScript::GridMarkup { .. } => json!({ "header": "", "body": "", "table": "" }),
            PageScript::DismissOverlay { .. } => json!(false),
        };
        Ok(value)
    }

    async fn fill(&self, selector: &str, value: &str) -> AppResult<()> {
        self.state
            .lock()
            .unwrap()
            .fields
            .insert(selector.to_string(), value.to_string());
        Ok(())
    }

    async fn clear_and_type(&self, selector: &str, value: &str, _: Duration) -> AppResult<()> {
        self.fill(selector, value).await
    }

    async fn click(&self, selector: &str, _force: bool) -> AppResult<()> {
        if selector == self.config.selectors.search_button {
            self.submit();
        }
        Ok(())
    }

    async fn type_text(&self, selector: &str, value: &str, _: Duration) -> AppResult<()> {
        self.fill(selector, value).await
    }

    async fn press_key(&self, _selector: &str, _key: &str) -> AppResult<()> {
        Ok(())
    }

    async fn press_focused_key(&self, _key: &str) -> AppResult<()> {
        Ok(())
    }

    async fn close(&self) -> AppResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// 统计打开 / 关闭次数的工厂
pub struct FakeFactory {
    pub data: PortalData,
    pub config: Arc<Config>,
    pub opens: AtomicUsize,
    pub closes: Arc<AtomicUsize>,
    /// 这些 worker 打不开浏览器
    pub failing_workers: Vec<usize>,
    /// 导航失败（准备会话失败）
    pub fail_navigation: bool,
}

impl FakeFactory {
    pub fn new(data: PortalData, config: Arc<Config>) -> Self {
        Self {
            data,
            config,
            opens: AtomicUsize::new(0),
            closes: Arc::new(AtomicUsize::new(0)),
            failing_workers: Vec::new(),
            fail_navigation: false,
        }
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionFactory for FakeFactory {
    type Page = FakePortalPage;

    async fn open(&self, worker_id: usize) -> AppResult<FakePortalPage> {
        if self.failing_workers.contains(&worker_id) {
            return Err(BrowserError::LaunchFailed {
                worker_id,
                message: "no browser".to_string(),
            }
            .into());
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        let mut page = FakePortalPage::new(self.data.clone(), self.config.clone());
        page.closes = self.closes.clone();
        page.fail_navigation = self.fail_navigation;
        Ok(page)
    }
}

/// 记录每次通知的主题和正文
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String)>>,
    /// 为 true 时永远不返回
    pub stall: bool,
}

impl RecordingNotifier {
    pub fn stalled() -> Self {
        Self {
            stall: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, subject: &str, body: &str) -> NotifyStatus {
        self.sent
            .lock()
            .unwrap()
            .push((subject.to_string(), body.to_string()));
        if self.stall {
            std::future::pending::<()>().await;
        }
        NotifyStatus::ok("notification ok")
    }
}

/// 测试用的快速配置
pub fn test_config(workers: usize) -> Arc<Config> {
    Arc::new(Config {
        fast_mode: true,
        batch_workers: workers,
        navigation_timeout_ms: 1_000,
        result_timeout_ms: 2_000,
        no_data_window_ms: 50,
        change_grace_ms: 100,
        busy_appear_ms: 0,
        poll_interval_ms: Some(10),
        ..Config::default()
    })
}

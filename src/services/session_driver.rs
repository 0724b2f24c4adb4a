//! 会话驱动 - 业务能力层
//!
//! 独占一个浏览器页面，提供导航、填写字段、选择法院、提交、读取表格等能力。
//! 不关心一次查询的整体流程（那是 workflow 层的事）。

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, ReadError};
use crate::infrastructure::{eval_as, BrowserPage, GridQuery, PageScript};
use crate::models::{CourtOption, GridMarkup, GridSnapshot, GridState};
use crate::services::court_directory::CourtDirectory;
use crate::services::readiness::BusyCycle;

/// Cookie 同意按钮上的文字
pub const COOKIE_LABELS: [&str; 5] = ["Αποδοχή", "Αποδέχομαι", "Συμφωνώ", "Accept", "Accept all"];

/// 门户消息框的确认按钮（拉丁 OK 与希腊 ΟΚ）
pub const MESSAGE_BOX_LABELS: [&str; 4] = ["OK", "ΟΚ", "Ok", "ok"];

/// 提交失败后两次点击之间的停顿
const CLICK_RETRY_PAUSE: Duration = Duration::from_millis(120);

/// 读取提交前快照的次数
const SNAPSHOT_ATTEMPTS: usize = 3;

/// 填写字段的手段，按顺序尝试
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillTechnique {
    /// 脚本赋值并派发 input / change 事件
    Scripted,
    /// 原生填充
    Fill,
    /// 全选删除后逐字输入
    ClearAndType,
    /// 强制点击，脚本清空后逐字输入（不依赖 Ctrl+A）
    ForcedClickType,
}

impl FillTechnique {
    pub const CHAIN: [FillTechnique; 4] = [
        FillTechnique::Scripted,
        FillTechnique::Fill,
        FillTechnique::ClearAndType,
        FillTechnique::ForcedClickType,
    ];
}

/// 提交搜索时实际生效的手段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMethod {
    Click { attempt: usize },
    ScriptedClick,
    EnterKey,
}

/// 会话驱动
pub struct SessionDriver<P: BrowserPage> {
    page: P,
    config: Arc<Config>,
    worker_id: usize,
}

impl<P: BrowserPage> SessionDriver<P> {
    pub fn new(page: P, config: Arc<Config>, worker_id: usize) -> Self {
        Self {
            page,
            config,
            worker_id,
        }
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 导航到门户，并尝试关闭 cookie 提示
    pub async fn navigate(&self, url: &str) -> AppResult<()> {
        let limit = self.config.navigation_timeout();
        info!("🌐 [worker {}] 打开门户: {}", self.worker_id, url);

        match timeout(limit, self.page.goto(url)).await {
            Ok(result) => result?,
            Err(_) => return Err(AppError::timeout("页面导航", limit)),
        }

        if self.dismiss_overlay(&COOKIE_LABELS).await {
            debug!("[worker {}] 已接受 cookie 提示", self.worker_id);
        }
        Ok(())
    }

    /// 执行页面脚本并反序列化结果
    pub async fn evaluate<T: DeserializeOwned>(&self, script: &PageScript) -> Result<T, ReadError> {
        eval_as(&self.page, script).await
    }

    /// 读取输入框当前值
    pub async fn field_value(&self, selector: &str) -> Result<Option<String>, ReadError> {
        self.evaluate(&PageScript::FieldValue {
            selector: selector.to_string(),
        })
        .await
    }

    async fn value_is(&self, selector: &str, expected: &str) -> bool {
        match self.field_value(selector).await {
            Ok(Some(current)) => current.trim() == expected.trim(),
            _ => false,
        }
    }

    async fn apply(&self, technique: FillTechnique, selector: &str, value: &str) -> AppResult<()> {
        let key_delay = self.config.key_delay();
        match technique {
            FillTechnique::Scripted => {
                let assigned: bool = self
                    .evaluate(&PageScript::AssignField {
                        selector: selector.to_string(),
                        value: value.to_string(),
                    })
                    .await?;
                if !assigned {
                    return Err(AppError::not_interactable(selector));
                }
                Ok(())
            }
            FillTechnique::Fill => self.page.fill(selector, value).await,
            FillTechnique::ClearAndType => {
                self.page.clear_and_type(selector, value, key_delay).await
            }
            FillTechnique::ForcedClickType => {
                self.page.click(selector, true).await?;
                let _: Result<bool, ReadError> = self
                    .evaluate(&PageScript::AssignField {
                        selector: selector.to_string(),
                        value: String::new(),
                    })
                    .await;
                self.page.type_text(selector, value, key_delay).await
            }
        }
    }

    /// 等待元素可点击（没有被遮挡）
    ///
    /// 超时不算错误，之后的操作自己会失败或回退。
    pub async fn wait_clickable(&self, selector: &str) -> bool {
        let deadline = Instant::now() + self.config.clickable_wait();
        loop {
            let clickable: Result<bool, ReadError> = self
                .evaluate(&PageScript::IsClickable {
                    selector: selector.to_string(),
                })
                .await;
            if matches!(clickable, Ok(true)) {
                return true;
            }
            if Instant::now() >= deadline {
                debug!("{} 在等待时间内不可点击", selector);
                return false;
            }
            sleep(self.config.poll_interval()).await;
        }
    }

    /// 填写输入框
    ///
    /// 先等待字段可点击，再按 `FillTechnique::CHAIN` 依次尝试，每次都读回字段值确认；
    /// 成功后按一次 Tab 让门户的服务端监听触发。
    pub async fn set_field(&self, selector: &str, value: &str) -> AppResult<FillTechnique> {
        self.wait_clickable(selector).await;
        for technique in FillTechnique::CHAIN {
            if let Err(e) = self.apply(technique, selector, value).await {
                debug!("{:?} 填写 {} 失败: {}", technique, selector, e);
                continue;
            }
            if !self.value_is(selector, value).await {
                debug!("{:?} 填写 {} 后读回的值不一致", technique, selector);
                continue;
            }
            if let Err(e) = self.page.press_key(selector, "Tab").await {
                debug!("Tab 失败（忽略）: {}", e);
            }
            debug!("✓ {} = {} ({:?})", selector, value, technique);
            return Ok(technique);
        }

        warn!("⚠️ [worker {}] 无法填写字段 {}", self.worker_id, selector);
        Err(AppError::not_interactable(selector))
    }

    /// 读取下拉框的全部选项
    pub async fn list_options(&self, selector: &str) -> Result<Vec<CourtOption>, ReadError> {
        self.evaluate(&PageScript::ListOptions {
            selector: selector.to_string(),
        })
        .await
    }

    /// 选择下拉框的值；已经是该值时什么也不做
    ///
    /// # 返回
    /// 实际发生了切换时返回 true
    pub async fn select_option(&self, selector: &str, value: &str) -> AppResult<bool> {
        if self.value_is(selector, value).await {
            debug!("下拉框 {} 已是 {}，跳过", selector, value);
            return Ok(false);
        }

        let selected: bool = self
            .evaluate(&PageScript::SelectValue {
                selector: selector.to_string(),
                value: value.to_string(),
            })
            .await?;
        if !selected {
            return Err(AppError::not_interactable(selector));
        }
        Ok(true)
    }

    /// 在目录中解析法院并选中
    pub async fn resolve_and_select(
        &self,
        directory: &CourtDirectory,
        label: &str,
    ) -> AppResult<CourtOption> {
        let option = directory.resolve(label)?.clone();
        let selector = &self.config.selectors.court_select;
        if self.select_option(selector, &option.value).await? {
            debug!("已选择法院: {} ({})", option.label.trim(), option.value);
        }
        Ok(option)
    }

    /// 提交搜索
    ///
    /// 真实点击最多 `submit_click_attempts` 次，然后脚本点击，最后在年份框按回车。
    pub async fn submit(&self) -> AppResult<SubmitMethod> {
        let selectors = &self.config.selectors;
        self.wait_clickable(&selectors.search_button).await;

        for attempt in 1..=self.config.submit_click_attempts {
            match self.page.click(&selectors.search_button, false).await {
                Ok(()) => return Ok(SubmitMethod::Click { attempt }),
                Err(e) => {
                    debug!("点击搜索按钮失败 (第 {} 次): {}", attempt, e);
                    self.wait_busy_cycle().await;
                    sleep(CLICK_RETRY_PAUSE).await;
                }
            }
        }

        let scripted: Result<bool, ReadError> = self
            .evaluate(&PageScript::ScriptedClick {
                selector: selectors.search_button.clone(),
            })
            .await;
        if matches!(scripted, Ok(true)) {
            return Ok(SubmitMethod::ScriptedClick);
        }

        match self.page.press_key(&selectors.case_year, "Enter").await {
            Ok(()) => Ok(SubmitMethod::EnterKey),
            Err(e) => {
                warn!("⚠️ [worker {}] 无法提交搜索: {}", self.worker_id, e);
                Err(AppError::not_interactable(&selectors.search_button))
            }
        }
    }

    /// 读取一次表格状态
    pub async fn read_grid(&self) -> Result<GridState, ReadError> {
        let selectors = &self.config.selectors;
        self.evaluate(&PageScript::GridState(GridQuery {
            body: selectors.grid_body.clone(),
            busy: selectors.grid_busy.clone(),
            target_suffix: selectors.target_cell_suffix.clone(),
        }))
        .await
    }

    /// 提交前的表格快照
    ///
    /// 暂时性失败会重试几次；仍然读不到时返回 `None`（快照未知）。
    pub async fn snapshot_grid(&self) -> Option<GridSnapshot> {
        for attempt in 1..=SNAPSHOT_ATTEMPTS {
            match self.read_grid().await {
                Ok(grid) => return Some(grid.snapshot()),
                Err(e) if e.is_transient() && attempt < SNAPSHOT_ATTEMPTS => {
                    debug!("读取快照失败 (第 {} 次): {}", attempt, e);
                    sleep(self.config.poll_interval()).await;
                }
                Err(e) => {
                    warn!("⚠️ [worker {}] 无法读取表格快照: {}", self.worker_id, e);
                    return None;
                }
            }
        }
        None
    }

    /// 等待一次加载提示的"出现 → 消失"
    ///
    /// 在 `busy_appear_ms` 内没有出现就直接返回。
    pub async fn wait_busy_cycle(&self) -> BusyCycle {
        let mut cycle = BusyCycle::new();
        let interval = self.config.poll_interval();
        let appear_deadline = Instant::now() + Duration::from_millis(self.config.busy_appear_ms);
        let hide_deadline = Instant::now() + self.config.result_timeout();

        loop {
            let visible = match self.read_grid().await {
                Ok(grid) => grid.busy_visible,
                Err(e) if e.is_transient() => false,
                Err(_) => return cycle,
            };
            cycle.observe(visible);

            if cycle.completed() {
                return cycle;
            }
            let now = Instant::now();
            let deadline = if visible { hide_deadline } else { appear_deadline };
            if now >= deadline {
                return cycle;
            }
            sleep(interval).await;
        }
    }

    /// 点击第一个文字匹配的可见按钮
    pub async fn dismiss_overlay(&self, labels: &[&str]) -> bool {
        self.evaluate(&PageScript::DismissOverlay {
            labels: labels.iter().map(|s| s.to_string()).collect(),
        })
        .await
        .unwrap_or(false)
    }

    /// 关闭门户的消息框（如果有）
    ///
    /// 找不到确认按钮时对当前焦点按 Enter，失败再按 Escape。
    pub async fn dismiss_message_box(&self) -> bool {
        if self.dismiss_overlay(&MESSAGE_BOX_LABELS).await {
            debug!("[worker {}] 已关闭消息框", self.worker_id);
            return true;
        }
        for key in ["Enter", "Escape"] {
            match self.page.press_focused_key(key).await {
                Ok(()) => return true,
                Err(e) => debug!("[worker {}] 按 {} 失败: {}", self.worker_id, key, e),
            }
        }
        false
    }

    /// 表格原始 HTML；读取失败时为空
    pub async fn grid_markup(&self) -> GridMarkup {
        let selectors = &self.config.selectors;
        self.evaluate(&PageScript::GridMarkup {
            header: selectors.grid_header.clone(),
            body: selectors.grid_body.clone(),
            table: selectors.grid.clone(),
        })
        .await
        .unwrap_or_default()
    }

    /// 关闭页面
    pub async fn close(&self) -> AppResult<()> {
        self.page.close().await
    }
}

//! 基于 chromiumoxide 的页面实现

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams, EventRequestPaused, FailRequestParams, RequestPattern,
    RequestStage,
};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, InsertTextParams,
};
use chromiumoxide::cdp::browser_protocol::network::{ErrorReason, ResourceType};
use chromiumoxide::cdp::browser_protocol::page::{
    EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
};
use chromiumoxide::element::Element;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use serde_json::Value as JsonValue;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::browser::launcher::{launch_browser, worker_profile_dir};
use crate::config::Config;
use crate::error::{AppError, AppResult, BrowserError, ReadError};
use crate::infrastructure::{eval_as, BrowserPage, JsExecutor, PageScript, SessionFactory};

/// CDP 修饰键位：Ctrl
const MODIFIER_CTRL: i64 = 2;

/// 开启 BLOCK_MEDIA 时拦截的资源类型
const BLOCKED_RESOURCES: [ResourceType; 3] =
    [ResourceType::Image, ResourceType::Media, ResourceType::Font];

/// 一个 worker 独占的浏览器页面
pub struct ChromePage {
    worker_id: usize,
    executor: JsExecutor,
    browser: Mutex<Option<Browser>>,
    tasks: Vec<JoinHandle<()>>,
    profile_dir: PathBuf,
}

impl ChromePage {
    /// 启动浏览器并打开空白页
    pub async fn open(config: &Config, worker_id: usize) -> AppResult<Self> {
        let (browser, handler_task) = launch_browser(config, worker_id).await?;

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler_task.abort();
                return Err(BrowserError::LaunchFailed {
                    worker_id,
                    message: format!("创建页面失败: {}", e),
                }
                .into());
            }
        };

        let dialog_task = spawn_dialog_acceptor(page.clone(), worker_id).await;

        let mut tasks = vec![handler_task];
        tasks.extend(dialog_task);
        if config.block_media {
            tasks.extend(spawn_media_blocker(page.clone(), worker_id).await);
        }

        Ok(Self {
            worker_id,
            executor: JsExecutor::new(page),
            browser: Mutex::new(Some(browser)),
            tasks,
            profile_dir: worker_profile_dir(worker_id),
        })
    }

    fn page(&self) -> &Page {
        self.executor.page()
    }

    async fn element(&self, selector: &str) -> AppResult<Element> {
        self.page().find_element(selector).await.map_err(|e| {
            debug!("找不到元素 {}: {}", selector, e);
            BrowserError::ElementMissing {
                selector: selector.to_string(),
            }
            .into()
        })
    }

    /// 发送一次按下 + 抬起；`text` 不为空时按下事件会产生字符输入（Enter 需要 "\r"）
    async fn dispatch_key(
        &self,
        key: &str,
        code: &str,
        vk: i64,
        modifiers: i64,
        text: Option<&str>,
    ) -> AppResult<()> {
        for kind in [DispatchKeyEventType::KeyDown, DispatchKeyEventType::KeyUp] {
            let mut builder = DispatchKeyEventParams::builder()
                .key(key)
                .code(code)
                .windows_virtual_key_code(vk)
                .modifiers(modifiers);
            if let (DispatchKeyEventType::KeyDown, Some(text)) = (&kind, text) {
                builder = builder.text(text);
            }
            let params = builder
                .r#type(kind)
                .build()
                .map_err(|e| AppError::TransientRead(format!("按键参数无效: {}", e)))?;
            self.page().execute(params).await?;
        }
        Ok(())
    }

    async fn type_chars(&self, element: &Element, value: &str, key_delay: Duration) -> AppResult<()> {
        if key_delay.is_zero() {
            element.type_str(value).await?;
            return Ok(());
        }
        for ch in value.chars() {
            element.type_str(ch.to_string()).await?;
            sleep(key_delay).await;
        }
        Ok(())
    }
}

/// 自动接受页面弹出的 alert / confirm
async fn spawn_dialog_acceptor(page: Page, worker_id: usize) -> Option<JoinHandle<()>> {
    let mut events = match page.event_listener::<EventJavascriptDialogOpening>().await {
        Ok(events) => events,
        Err(e) => {
            warn!("[worker {}] 无法监听对话框事件: {}", worker_id, e);
            return None;
        }
    };

    Some(tokio::spawn(async move {
        while let Some(event) = events.next().await {
            debug!("[worker {}] 自动接受对话框: {}", worker_id, event.message);
            if let Err(e) = page.execute(HandleJavaScriptDialogParams::new(true)).await {
                debug!("[worker {}] 接受对话框失败: {}", worker_id, e);
            }
        }
    }))
}

/// 请求拦截的匹配规则：每种被拦截的资源一条
fn media_block_patterns() -> Vec<RequestPattern> {
    BLOCKED_RESOURCES
        .iter()
        .map(|kind| {
            RequestPattern::builder()
                .resource_type(kind.clone())
                .request_stage(RequestStage::Request)
                .build()
        })
        .collect()
}

fn is_blocked_resource(kind: &ResourceType) -> bool {
    BLOCKED_RESOURCES.contains(kind)
}

/// 拦截图片、媒体和字体请求
///
/// 只有匹配规则里的请求会暂停；其它类型万一暂停了也直接放行。
async fn spawn_media_blocker(page: Page, worker_id: usize) -> Option<JoinHandle<()>> {
    let mut events = match page.event_listener::<EventRequestPaused>().await {
        Ok(events) => events,
        Err(e) => {
            warn!("[worker {}] 无法监听请求事件: {}", worker_id, e);
            return None;
        }
    };

    let enable = EnableParams::builder()
        .patterns(media_block_patterns())
        .build();
    if let Err(e) = page.execute(enable).await {
        warn!("[worker {}] 无法开启请求拦截: {}", worker_id, e);
        return None;
    }
    debug!("[worker {}] 已开启媒体拦截", worker_id);

    Some(tokio::spawn(async move {
        while let Some(event) = events.next().await {
            let request_id = event.request_id.clone();
            let result = if is_blocked_resource(&event.resource_type) {
                page.execute(FailRequestParams::new(request_id, ErrorReason::BlockedByClient))
                    .await
                    .map(|_| ())
            } else {
                page.execute(ContinueRequestParams::new(request_id))
                    .await
                    .map(|_| ())
            };
            if let Err(e) = result {
                debug!("[worker {}] 处理被拦截的请求失败: {}", worker_id, e);
            }
        }
    }))
}

#[async_trait]
impl BrowserPage for ChromePage {
    async fn goto(&self, url: &str) -> AppResult<()> {
        self.page()
            .goto(url)
            .await
            .map_err(|e| AppError::navigation_failed(url, e))?;
        Ok(())
    }

    async fn eval(&self, script: &PageScript) -> Result<JsonValue, ReadError> {
        self.executor.eval(script).await
    }

    async fn fill(&self, selector: &str, value: &str) -> AppResult<()> {
        let element = self.element(selector).await?;
        element.focus().await?;
        self.dispatch_key("a", "KeyA", 65, MODIFIER_CTRL, None).await?;
        self.page().execute(InsertTextParams::new(value)).await?;
        Ok(())
    }

    async fn clear_and_type(
        &self,
        selector: &str,
        value: &str,
        key_delay: Duration,
    ) -> AppResult<()> {
        let element = self.element(selector).await?;
        element.click().await?;
        self.dispatch_key("a", "KeyA", 65, MODIFIER_CTRL, None).await?;
        element.press_key("Delete").await?;
        self.type_chars(&element, value, key_delay).await
    }

    async fn click(&self, selector: &str, force: bool) -> AppResult<()> {
        let element = self.element(selector).await?;
        if !force {
            let clickable: bool = eval_as(
                self,
                &PageScript::IsClickable {
                    selector: selector.to_string(),
                },
            )
            .await
            .unwrap_or(false);
            if !clickable {
                return Err(AppError::not_interactable(selector));
            }
        }
        element.scroll_into_view().await?;
        element.click().await?;
        Ok(())
    }

    async fn type_text(&self, selector: &str, value: &str, key_delay: Duration) -> AppResult<()> {
        let element = self.element(selector).await?;
        element.focus().await?;
        self.type_chars(&element, value, key_delay).await
    }

    async fn press_key(&self, selector: &str, key: &str) -> AppResult<()> {
        let element = self.element(selector).await?;
        element.focus().await?;
        element.press_key(key).await?;
        Ok(())
    }

    async fn press_focused_key(&self, key: &str) -> AppResult<()> {
        let (vk, text) = match key {
            "Enter" => (13, Some("\r")),
            "Escape" => (27, None),
            "Tab" => (9, None),
            _ => (0, None),
        };
        self.dispatch_key(key, key, vk, 0, text).await
    }

    async fn close(&self) -> AppResult<()> {
        let browser = self.browser.lock().await.take();
        if let Some(mut browser) = browser {
            if let Err(e) = browser.close().await {
                debug!("[worker {}] 关闭浏览器失败: {}", self.worker_id, e);
            }
            let _ = browser.wait().await;
            for task in &self.tasks {
                task.abort();
            }
            if let Err(e) = tokio::fs::remove_dir_all(&self.profile_dir).await {
                debug!("[worker {}] 清理用户数据目录失败: {}", self.worker_id, e);
            }
            info!("🔒 [worker {}] 浏览器已关闭", self.worker_id);
        }
        Ok(())
    }
}

/// 为每个 worker 启动独立浏览器
pub struct ChromeSessionFactory {
    config: Arc<Config>,
}

impl ChromeSessionFactory {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionFactory for ChromeSessionFactory {
    type Page = ChromePage;

    async fn open(&self, worker_id: usize) -> AppResult<ChromePage> {
        ChromePage::open(&self.config, worker_id).await
    }
}

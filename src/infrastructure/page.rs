//! 页面能力抽象
//!
//! 业务层只通过 `BrowserPage` 接触浏览器，方便用假页面做测试。

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::{AppResult, ReadError};
use crate::infrastructure::scripts::PageScript;

/// 一个已打开的门户页面
#[async_trait]
pub trait BrowserPage: Send + Sync {
    /// 导航到指定地址并等待加载完成
    async fn goto(&self, url: &str) -> AppResult<()>;

    /// 执行页面脚本
    async fn eval(&self, script: &PageScript) -> Result<JsonValue, ReadError>;

    /// 原生填充：聚焦后插入整段文本
    async fn fill(&self, selector: &str, value: &str) -> AppResult<()>;

    /// 全选删除后逐字输入
    async fn clear_and_type(&self, selector: &str, value: &str, key_delay: Duration)
        -> AppResult<()>;

    /// 点击元素；`force` 为 false 时被遮挡的元素视为不可点击
    async fn click(&self, selector: &str, force: bool) -> AppResult<()>;

    /// 在元素上逐字输入（不清空）
    async fn type_text(&self, selector: &str, value: &str, key_delay: Duration) -> AppResult<()>;

    /// 在元素上按下一个键（如 "Enter"、"Tab"）
    async fn press_key(&self, selector: &str, key: &str) -> AppResult<()>;

    /// 对当前焦点元素按下一个键（不切换焦点）
    async fn press_focused_key(&self, key: &str) -> AppResult<()>;

    /// 关闭页面及其浏览器
    async fn close(&self) -> AppResult<()>;
}

/// 为每个 worker 打开独立的页面
#[async_trait]
pub trait SessionFactory: Send + Sync + 'static {
    type Page: BrowserPage + 'static;

    async fn open(&self, worker_id: usize) -> AppResult<Self::Page>;
}

/// 执行脚本并反序列化
pub async fn eval_as<P, T>(page: &P, script: &PageScript) -> Result<T, ReadError>
where
    P: BrowserPage + ?Sized,
    T: DeserializeOwned,
{
    let value = page.eval(script).await?;
    Ok(serde_json::from_value(value)?)
}

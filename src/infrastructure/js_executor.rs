//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"执行页面脚本"的能力

use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::trace;

use crate::error::ReadError;
use crate::infrastructure::scripts::PageScript;

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() 能力
/// - 不认识 SearchRequest / 法院目录
/// - 不处理业务流程
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（用于点击、输入等元素操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行页面脚本并返回 JSON 结果
    ///
    /// # 参数
    /// - `script`: 要执行的页面脚本
    ///
    /// # 返回
    /// 返回 JSON 值；脚本没有返回值时为 `Null`
    pub async fn eval(&self, script: &PageScript) -> Result<JsonValue, ReadError> {
        trace!("执行脚本: {}", script.name());
        let result = self.page.evaluate(script.source()).await?;
        Ok(result.value().cloned().unwrap_or(JsonValue::Null))
    }

    /// 执行页面脚本并反序列化为指定类型
    ///
    /// # 参数
    /// - `script`: 要执行的页面脚本
    ///
    /// # 返回
    /// 返回反序列化后的类型；格式不符按暂时性错误处理
    pub async fn eval_as<T: DeserializeOwned>(&self, script: &PageScript) -> Result<T, ReadError> {
        let json_value = self.eval(script).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }
}

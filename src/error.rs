use std::time::Duration;

use thiserror::Error;

/// 应用程序错误类型
///
/// 只有 `NotInteractable` / `Timeout` / `CourtNotFound` 以及致命的浏览器错误
/// 会传给调用方；`TransientRead` 只在轮询内部使用。
#[derive(Debug, Error)]
pub enum AppError {
    /// 字段或按钮在所有回退手段之后仍不可用
    #[error("元素不可交互: {selector}")]
    NotInteractable { selector: String },

    /// 在预算时间内没有就绪 / 没有有效结果
    #[error("Timeout: {stage} 超过 {}ms", .waited.as_millis())]
    Timeout { stage: &'static str, waited: Duration },

    /// 法院名称无法在目录中解析
    #[error("在 SOLON 列表中找不到法院: {label}")]
    CourtNotFound { label: String },

    /// 页面读取暂时失败（页面正在变化）
    #[error("页面读取暂时失败: {0}")]
    TransientRead(String),

    /// 请求缺少必填字段
    #[error("请求字段为空: {field}")]
    MissingField { field: &'static str },

    /// 案号无法构造成匹配模式
    #[error("案号匹配模式无效: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),

    /// HTTP 客户端错误
    #[error("HTTP 客户端错误: {0}")]
    Http(#[from] reqwest::Error),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 启动浏览器失败
    #[error("启动浏览器失败 (worker {worker_id}): {message}")]
    LaunchFailed { worker_id: usize, message: String },

    /// 导航失败
    #[error("导航到 {url} 失败: {source}")]
    NavigationFailed {
        url: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// 页面上找不到必需的元素
    #[error("页面上找不到元素: {selector}")]
    ElementMissing { selector: String },

    /// 会话已断开，无法继续读取页面
    #[error("浏览器会话已断开: {0}")]
    SessionLost(String),

    /// CDP 调用失败
    #[error("CDP 调用失败: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },

    /// 数值超出允许范围
    #[error("环境变量 {var_name} 的值 {value} 无效: {reason}")]
    InvalidValue {
        var_name: String,
        value: String,
        reason: String,
    },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },

    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        source: std::io::Error,
    },

    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        source: std::io::Error,
    },

    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        source: toml::de::Error,
    },

    /// 工作簿无法打开或读取
    #[error("读取工作簿失败 ({path}): {message}")]
    WorkbookFailed { path: String, message: String },

    /// 没有任何工作表带有全部必需的列
    #[error("工作簿缺少必需的列 ({path}): {missing}")]
    MissingColumns { path: String, missing: String },
}

/// 页面状态读取错误
///
/// 轮询时区分"页面正在变化，稍后再读"和"会话已经不可用"。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    #[error("暂时无法读取: {0}")]
    Transient(String),
    #[error("无法读取: {0}")]
    Fatal(String),
}

impl ReadError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ReadError::Transient(_))
    }
}

impl From<chromiumoxide::error::CdpError> for ReadError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        use chromiumoxide::error::CdpError;
        match err {
            CdpError::Ws(_) | CdpError::ChannelSendError(_) | CdpError::NoResponse => {
                ReadError::Fatal(err.to_string())
            }
            other => ReadError::Transient(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ReadError {
    fn from(err: serde_json::Error) -> Self {
        ReadError::Transient(format!("结果格式不符: {}", err))
    }
}

impl From<ReadError> for AppError {
    fn from(err: ReadError) -> Self {
        match err {
            ReadError::Transient(msg) => AppError::TransientRead(msg),
            ReadError::Fatal(msg) => AppError::Browser(BrowserError::SessionLost(msg)),
        }
    }
}

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(BrowserError::Cdp(err))
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建元素不可交互错误
    pub fn not_interactable(selector: impl Into<String>) -> Self {
        AppError::NotInteractable {
            selector: selector.into(),
        }
    }

    /// 创建超时错误
    pub fn timeout(stage: &'static str, waited: Duration) -> Self {
        AppError::Timeout { stage, waited }
    }

    /// 创建导航失败错误
    pub fn navigation_failed(
        url: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Browser(BrowserError::NavigationFailed {
            url: url.into(),
            source: Box::new(source),
        })
    }

    /// 是否为超时
    pub fn is_timeout(&self) -> bool {
        matches!(self, AppError::Timeout { .. })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// SOLON 公开案件查询页面地址
pub const PORTAL_URL: &str = "https://extapps.solon.gov.gr/mojwp/faces/TrackLdoPublic";

/// 门户页面选择器（ADF 的 id 中含有 ':'，需要 CSS 转义）
#[derive(Clone, Debug)]
pub struct PortalSelectors {
    /// 法院（καταστήματα）下拉框
    pub court_select: String,
    /// Γ.Α.Κ. 编号输入框
    pub case_number: String,
    /// Γ.Α.Κ. 年份输入框
    pub case_year: String,
    /// 搜索按钮
    pub search_button: String,
    /// 结果表格
    pub grid: String,
    /// 表格数据区（::db）
    pub grid_body: String,
    /// 表头（::hdr）
    pub grid_header: String,
    /// 加载提示（::sm）
    pub grid_busy: String,
    /// 目标列 td 的 id 后缀
    pub target_cell_suffix: String,
}

impl Default for PortalSelectors {
    fn default() -> Self {
        Self {
            court_select: r"#courtOfficeOC\:\:content".to_string(),
            case_number: r"#it1\:\:content".to_string(),
            case_year: r"#it2\:\:content".to_string(),
            search_button: "#ldoSearch a".to_string(),
            grid: r"#pc1\:ldoTable".to_string(),
            grid_body: r"#pc1\:ldoTable\:\:db".to_string(),
            grid_header: r"#pc1\:ldoTable\:\:hdr".to_string(),
            grid_busy: r"#pc1\:ldoTable\:\:sm".to_string(),
            target_cell_suffix: ":c10".to_string(),
        }
    }
}

/// 程序配置
///
/// 启动时构造一次，之后以引用或 `Arc` 传给每个组件。
#[derive(Clone, Debug)]
pub struct Config {
    /// 门户地址
    pub portal_url: String,
    /// 是否无头运行浏览器
    pub headless: bool,
    /// 快速模式：轮询更密、输入不加按键延迟
    pub fast_mode: bool,
    /// 是否保存诊断文件（表格 HTML + 结果 JSON）
    pub debug_artifacts: bool,
    /// 诊断文件目录
    pub artifacts_dir: PathBuf,
    /// 导航超时（毫秒）
    pub navigation_timeout_ms: u64,
    /// 等待结果的总超时（毫秒）
    pub result_timeout_ms: u64,
    /// "没有数据"需要持续的时间才算最终结果（毫秒）
    pub no_data_window_ms: u64,
    /// 表格就绪后等待内容变化的最长时间（毫秒）
    pub change_grace_ms: u64,
    /// 加载提示出现的等待时间（毫秒）
    pub busy_appear_ms: u64,
    /// 轮询间隔（毫秒）；未设置时由 `fast_mode` 决定
    pub poll_interval_ms: Option<u64>,
    /// 填写 / 点击前等待元素可点击的最长时间（毫秒）
    pub clickable_wait_ms: u64,
    /// 搜索按钮真实点击的最多次数
    pub submit_click_attempts: usize,
    /// 批量模式的并发浏览器数量
    pub batch_workers: usize,
    /// 浏览器可执行文件（为空时自动查找）
    pub chrome_executable: Option<PathBuf>,
    /// 是否拦截图片、媒体和字体请求
    pub block_media: bool,
    /// 通知 webhook 地址（为空时不发送通知）
    pub notify_webhook_url: Option<String>,
    /// 单次通知的超时（毫秒）
    pub notify_timeout_ms: u64,
    /// 结果日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 门户选择器
    pub selectors: PortalSelectors,
    /// 门户返回"没有数据"时的固定文本
    pub no_data_sentinel: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            portal_url: PORTAL_URL.to_string(),
            headless: true,
            fast_mode: false,
            debug_artifacts: false,
            artifacts_dir: PathBuf::from("artifacts"),
            navigation_timeout_ms: 30_000,
            result_timeout_ms: 60_000,
            no_data_window_ms: 4_000,
            change_grace_ms: 30_000,
            busy_appear_ms: 2_000,
            poll_interval_ms: None,
            clickable_wait_ms: 5_000,
            submit_click_attempts: 3,
            batch_workers: 4,
            chrome_executable: None,
            block_media: false,
            notify_webhook_url: None,
            notify_timeout_ms: 15_000,
            output_log_file: "output.txt".to_string(),
            verbose_logging: false,
            selectors: PortalSelectors::default(),
            no_data_sentinel: "Δεν υπάρχουν δεδομένα".to_string(),
        }
    }
}

impl Config {
    /// 从环境变量读取配置，未设置的项使用默认值
    ///
    /// 设置了但无法解析的值会报错，而不是静默回退。
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 从任意键值来源读取配置（便于测试）
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();
        let result_timeout_ms = parse_var(&lookup, "RESULT_TIMEOUT_MS", default.result_timeout_ms)?;

        let config = Self {
            portal_url: lookup("PORTAL_URL").unwrap_or(default.portal_url),
            headless: parse_flag(&lookup, "HEADLESS", default.headless)?,
            fast_mode: parse_flag(&lookup, "FAST_MODE", default.fast_mode)?,
            debug_artifacts: parse_flag(&lookup, "DEBUG_ARTIFACTS", default.debug_artifacts)?,
            artifacts_dir: lookup("ARTIFACTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.artifacts_dir),
            navigation_timeout_ms: parse_var(
                &lookup,
                "NAVIGATION_TIMEOUT_MS",
                default.navigation_timeout_ms,
            )?,
            result_timeout_ms,
            no_data_window_ms: parse_var(&lookup, "EARLY_NO_DATA_MS", default.no_data_window_ms)?,
            // 未设置时跟随结果超时的一半
            change_grace_ms: parse_var(&lookup, "CHANGE_GRACE_MS", result_timeout_ms / 2)?,
            busy_appear_ms: parse_var(&lookup, "BUSY_APPEAR_MS", default.busy_appear_ms)?,
            poll_interval_ms: match lookup("POLL_INTERVAL_MS") {
                Some(_) => Some(parse_var(&lookup, "POLL_INTERVAL_MS", 0u64)?),
                None => None,
            },
            clickable_wait_ms: parse_var(&lookup, "CLICKABLE_WAIT_MS", default.clickable_wait_ms)?,
            submit_click_attempts: parse_var(
                &lookup,
                "SUBMIT_CLICK_ATTEMPTS",
                default.submit_click_attempts,
            )?,
            batch_workers: parse_var(&lookup, "BATCH_WORKERS", default.batch_workers)?,
            chrome_executable: lookup("CHROME_EXECUTABLE").map(PathBuf::from),
            block_media: parse_flag(&lookup, "BLOCK_MEDIA", default.block_media)?,
            notify_webhook_url: lookup("NOTIFY_WEBHOOK_URL").filter(|v| !v.trim().is_empty()),
            notify_timeout_ms: parse_var(&lookup, "NOTIFY_TIMEOUT_MS", default.notify_timeout_ms)?,
            output_log_file: lookup("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            verbose_logging: parse_flag(&lookup, "VERBOSE_LOGGING", default.verbose_logging)?,
            selectors: default.selectors,
            no_data_sentinel: default.no_data_sentinel,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_workers == 0 {
            return Err(ConfigError::InvalidValue {
                var_name: "BATCH_WORKERS".to_string(),
                value: "0".to_string(),
                reason: "至少需要 1 个 worker".to_string(),
            });
        }
        if self.result_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                var_name: "RESULT_TIMEOUT_MS".to_string(),
                value: "0".to_string(),
                reason: "超时必须大于 0".to_string(),
            });
        }
        Ok(())
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn result_timeout(&self) -> Duration {
        Duration::from_millis(self.result_timeout_ms)
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_millis(self.notify_timeout_ms)
    }

    pub fn clickable_wait(&self) -> Duration {
        Duration::from_millis(self.clickable_wait_ms)
    }

    /// 轮询间隔
    pub fn poll_interval(&self) -> Duration {
        if let Some(ms) = self.poll_interval_ms {
            Duration::from_millis(ms)
        } else if self.fast_mode {
            Duration::from_millis(200)
        } else {
            Duration::from_millis(300)
        }
    }

    /// 逐字输入时的按键间隔
    pub fn key_delay(&self) -> Duration {
        if self.fast_mode {
            Duration::ZERO
        } else {
            Duration::from_millis(10)
        }
    }
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: name.to_string(),
                value: raw.clone(),
                expected_type: std::any::type_name::<T>().to_string(),
            }),
    }
}

fn parse_flag<F>(lookup: &F, name: &str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name) else {
        return Ok(default);
    };
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::EnvVarParseFailed {
            var_name: name.to_string(),
            value: raw,
            expected_type: "bool".to_string(),
        }),
    }
}

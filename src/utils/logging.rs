use std::fs;

/// 日志工具模块
///
/// 提供日志初始化以及批量运行时的格式化输出
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::{AppResult, FileError};

/// 初始化 tracing 日志
///
/// `RUST_LOG` 优先；未设置时按 `verbose` 选择 debug / info。
/// 重复调用是安全的（测试里会多次调用）。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("solon_lookup={},warn", default_level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化结果日志文件（写入表头）
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> AppResult<()> {
    let log_header = format!(
        "{}\nSOLON 查询结果 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header).map_err(|source| FileError::WriteFailed {
        path: log_file_path.to_string(),
        source,
    })?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(mode: &str, workers: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - {}", mode);
    info!("📊 浏览器会话数: {}", workers);
    info!("{}", "=".repeat(60));
}

/// 记录请求加载信息
///
/// # 参数
/// - `total`: 请求总数
/// - `workers`: worker 数量
pub fn log_requests_loaded(total: usize, workers: usize) {
    info!("✓ 找到 {} 条待查询记录", total);
    info!("📋 将由 {} 个浏览器会话并行处理", workers);
}

/// 打印最终统计信息
///
/// # 参数
/// - `success`: 成功数量
/// - `empty`: 成功但结果为空的数量
/// - `failed`: 失败数量
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(success: usize, empty: usize, failed: usize, log_file_path: &str) {
    let total = success + failed;
    info!("\n{}", "=".repeat(60));
    info!("📊 全部查询完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{} (其中空结果 {})", success, total, empty);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
    info!("\n结果已保存至: {}", log_file_path);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_log_file_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.txt");
        let path_str = path.to_string_lossy().to_string();

        init_log_file(&path_str).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(&"=".repeat(60)));
        assert!(content.contains("SOLON"));
    }

    #[test]
    fn test_init_is_idempotent() {
        init(false);
        init(true);
    }
}

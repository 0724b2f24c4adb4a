//! 结果轮询 - 流程层
//!
//! 提交之后等待表格刷新并找到目标行。状态转换是纯函数（时间由调用方传入），
//! `await_result` 只负责读取、推进、休眠。
//!
//! ```text
//! AwaitingReady ──就绪──▶ AwaitingChange ──变化/加载周期完成/宽限期到──▶ Matching
//!       ▲                      │                                         │   ▲
//!       └──────不再就绪─────────┘                          没有数据      ▼   │ 提示消失
//!                                                               Stabilizing ─┘
//! Matching/Stabilizing ──有意义的匹配──▶ Matched(value)
//! Stabilizing ──持续 ≥ 窗口──▶ Matched("")
//! 任意状态 ──超过总预算──▶ TimedOut
//! ```

use std::time::{Duration, Instant};

use tokio::time::{sleep, timeout};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{AppError, AppResult, BrowserError, ReadError};
use crate::infrastructure::BrowserPage;
use crate::models::{GridSnapshot, GridState};
use crate::services::readiness::{self, BusyCycle};
use crate::services::row_matcher::{match_grid, CaseKeys};
use crate::services::SessionDriver;

/// 一次推进中最多连续转换的次数
const MAX_STEPS_PER_TICK: usize = 4;

/// 轮询状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    AwaitingReady,
    AwaitingChange { ready_at: Instant },
    Matching,
    Stabilizing { since: Instant },
    Matched(String),
    TimedOut,
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PollState::Matched(_) | PollState::TimedOut)
    }
}

/// 轮询参数
#[derive(Debug, Clone)]
pub struct PollPolicy {
    /// 总预算
    pub timeout: Duration,
    /// 就绪后等待内容变化的最长时间
    pub change_grace: Duration,
    /// "没有数据"需要持续的时间
    pub no_data_window: Duration,
    /// 两次读取之间的间隔
    pub interval: Duration,
    /// "没有数据"的固定文本
    pub sentinel: String,
}

impl PollPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout: config.result_timeout(),
            change_grace: Duration::from_millis(config.change_grace_ms),
            no_data_window: Duration::from_millis(config.no_data_window_ms),
            interval: config.poll_interval(),
            sentinel: config.no_data_sentinel.clone(),
        }
    }
}

/// 结果轮询状态机
#[derive(Debug)]
pub struct ResultPoller {
    keys: CaseKeys,
    /// `None` 表示提交前的内容未知，此时不用"内容变化"判断刷新
    snapshot: Option<GridSnapshot>,
    policy: PollPolicy,
    started: Instant,
    busy: BusyCycle,
    state: PollState,
}

impl ResultPoller {
    pub fn new(
        keys: CaseKeys,
        snapshot: Option<GridSnapshot>,
        policy: PollPolicy,
        started: Instant,
    ) -> Self {
        Self {
            keys,
            snapshot,
            policy,
            started,
            busy: BusyCycle::new(),
            state: PollState::AwaitingReady,
        }
    }

    /// 用一次观察推进状态
    ///
    /// 暂时性读取失败不改变状态；终止状态不再改变。
    pub fn advance(&mut self, observation: Result<&GridState, &ReadError>, now: Instant) -> &PollState {
        if self.state.is_terminal() {
            return &self.state;
        }
        if now.saturating_duration_since(self.started) >= self.policy.timeout {
            self.state = PollState::TimedOut;
            return &self.state;
        }

        let grid = match observation {
            Ok(grid) => grid,
            Err(e) => {
                debug!("读取表格失败，保持 {:?}: {}", self.state, e);
                return &self.state;
            }
        };
        self.busy.observe(grid.busy_visible);

        for _ in 0..MAX_STEPS_PER_TICK {
            let next = self.step(grid, now);
            if next == self.state {
                break;
            }
            debug!("轮询状态: {:?} → {:?}", self.state, next);
            self.state = next;
            if self.state.is_terminal() {
                break;
            }
        }
        &self.state
    }

    fn step(&self, grid: &GridState, now: Instant) -> PollState {
        let sentinel = self.policy.sentinel.as_str();

        match &self.state {
            PollState::AwaitingReady => {
                if readiness::is_ready(grid, sentinel) {
                    PollState::AwaitingChange { ready_at: now }
                } else {
                    PollState::AwaitingReady
                }
            }
            PollState::AwaitingChange { ready_at } => {
                if !readiness::is_ready(grid, sentinel) {
                    PollState::AwaitingReady
                } else if self
                    .snapshot
                    .as_ref()
                    .is_some_and(|snapshot| readiness::has_changed(grid, snapshot))
                    || self.busy.completed()
                    || now.saturating_duration_since(*ready_at) >= self.policy.change_grace
                {
                    PollState::Matching
                } else {
                    self.state.clone()
                }
            }
            PollState::Matching => {
                if grid.busy_visible {
                    return self.state.clone();
                }
                let result = match_grid(grid, &self.keys, sentinel);
                if let Some(value) = result.value.filter(|_| result.found) {
                    PollState::Matched(value)
                } else if result.no_data {
                    PollState::Stabilizing { since: now }
                } else {
                    PollState::Matching
                }
            }
            PollState::Stabilizing { since } => {
                if grid.busy_visible {
                    return self.state.clone();
                }
                let result = match_grid(grid, &self.keys, sentinel);
                if let Some(value) = result.value.filter(|_| result.found) {
                    PollState::Matched(value)
                } else if result.no_data {
                    if now.saturating_duration_since(*since) >= self.policy.no_data_window {
                        PollState::Matched(String::new())
                    } else {
                        self.state.clone()
                    }
                } else {
                    PollState::Matching
                }
            }
            PollState::Matched(_) | PollState::TimedOut => self.state.clone(),
        }
    }
}

/// 轮询直到得到结果
///
/// # 参数
/// - `driver`: 会话驱动（只用来读取表格）
/// - `keys`: 案号
/// - `snapshot`: 提交前的表格快照（未知时为 `None`）
/// - `policy`: 轮询参数
///
/// # 返回
/// 目标列文本；门户确认没有数据时为空字符串
pub async fn await_result<P: BrowserPage>(
    driver: &SessionDriver<P>,
    keys: CaseKeys,
    snapshot: Option<GridSnapshot>,
    policy: PollPolicy,
) -> AppResult<String> {
    let budget = policy.timeout;
    let interval = policy.interval;
    let mut poller = ResultPoller::new(keys, snapshot, policy, Instant::now());

    let run = async {
        loop {
            let read = driver.read_grid().await;
            if let Err(ReadError::Fatal(msg)) = &read {
                return Err(AppError::from(BrowserError::SessionLost(msg.clone())));
            }

            match poller.advance(read.as_ref(), Instant::now()) {
                PollState::Matched(value) => {
                    info!("✓ 得到结果: {}", if value.is_empty() { "(没有数据)" } else { value.as_str() });
                    return Ok(value.clone());
                }
                PollState::TimedOut => return Err(AppError::timeout("等待结果", budget)),
                _ => {}
            }
            sleep(interval).await;
        }
    };

    match timeout(budget + interval * 2, run).await {
        Ok(result) => result,
        Err(_) => Err(AppError::timeout("等待结果", budget)),
    }
}

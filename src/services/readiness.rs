//! 表格就绪判断 - 业务能力层
//!
//! 只根据一次读取到的 `GridState` 做判断，不等待、不访问页面。

use crate::models::{GridSnapshot, GridState};

/// 至少有一行数据，或者显示"没有数据"
pub fn is_ready(grid: &GridState, sentinel: &str) -> bool {
    grid.has_rows() || grid.shows_sentinel(sentinel)
}

/// 数据区文本非空且与快照不同
pub fn has_changed(grid: &GridState, snapshot: &GridSnapshot) -> bool {
    let now = grid.text.trim();
    grid.present && !now.is_empty() && now != snapshot.as_str()
}

/// 加载提示的一个周期所处的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusyPhase {
    NotSeen,
    Visible,
    Completed,
}

/// 跟踪加载提示"出现 → 消失"的周期
///
/// 一直没看到加载提示不算错误，只是周期不会完成。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusyCycle {
    phase: BusyPhase,
}

impl Default for BusyCycle {
    fn default() -> Self {
        Self {
            phase: BusyPhase::NotSeen,
        }
    }
}

impl BusyCycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次观察到的可见状态
    pub fn observe(&mut self, visible: bool) -> BusyPhase {
        self.phase = match (self.phase, visible) {
            (BusyPhase::NotSeen, true) => BusyPhase::Visible,
            (BusyPhase::Visible, false) => BusyPhase::Completed,
            (phase, _) => phase,
        };
        self.phase
    }

    pub fn completed(&self) -> bool {
        self.phase == BusyPhase::Completed
    }
}

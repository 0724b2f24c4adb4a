//! 批量查询调度器 - 编排层
//!
//! ## 职责
//!
//! 固定数量的 worker，每个 worker 独占一个浏览器会话：
//!
//! 1. **打开会话**：启动浏览器、导航、构建法院目录（每个 worker 只做一次）
//! 2. **消费队列**：从共享队列取 `(index, SearchRequest)`，遇到结束标记退出
//! 3. **输出结果**：每条请求产生一个带 index 的 SearchOutcome，按完成顺序输出
//! 4. **资源管理**：无论成功失败，worker 退出前关闭自己的会话
//!
//! ## 设计特点
//!
//! - 共享的只有任务队列和结果通道
//! - worker 打不开会话时直接报告完成；剩下的任务由调度器补成失败结果，
//!   保证每条请求恰好一个结果

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{AppError, BrowserError};
use crate::infrastructure::SessionFactory;
use crate::models::{SearchOutcome, SearchRequest};
use crate::workflow::{PortalSession, SearchCtx, SearchFlow};

/// 队列中的任务
#[derive(Debug)]
enum Job {
    Search(usize, SearchRequest),
    Shutdown,
}

/// worker 发往调度器的事件
#[derive(Debug)]
enum WorkerEvent {
    Outcome(SearchOutcome),
    Done(usize),
}

type JobQueue = Arc<Mutex<mpsc::UnboundedReceiver<Job>>>;

/// 批量调度器
pub struct BatchScheduler<F: SessionFactory> {
    factory: Arc<F>,
    config: Arc<Config>,
    flow: SearchFlow,
    workers: usize,
}

impl<F: SessionFactory> BatchScheduler<F> {
    pub fn new(factory: Arc<F>, config: Arc<Config>, flow: SearchFlow) -> Self {
        let workers = config.batch_workers.max(1);
        Self {
            factory,
            config,
            flow,
            workers,
        }
    }

    /// 启动全部 worker
    ///
    /// 任务按输入顺序入队，每个 worker 一个结束标记排在最后。
    pub fn start(&self, requests: Vec<SearchRequest>) -> BatchRun {
        let total = requests.len();
        let (job_tx, job_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        for (index, request) in requests.into_iter().enumerate() {
            let _ = job_tx.send(Job::Search(index, request));
        }
        for _ in 0..self.workers {
            let _ = job_tx.send(Job::Shutdown);
        }
        drop(job_tx);

        let queue: JobQueue = Arc::new(Mutex::new(job_rx));
        let handles = (1..=self.workers)
            .map(|worker_id| {
                tokio::spawn(run_worker(
                    worker_id,
                    self.factory.clone(),
                    self.config.clone(),
                    self.flow.clone(),
                    queue.clone(),
                    event_tx.clone(),
                ))
            })
            .collect();
        drop(event_tx);

        info!("🚀 已启动 {} 个 worker，共 {} 条请求", self.workers, total);

        BatchRun {
            events: event_rx,
            queue,
            handles,
            workers: self.workers,
            done: HashSet::new(),
            leftovers: None,
        }
    }

    /// 运行全部请求并按完成顺序收集结果
    pub async fn run_all(&self, requests: Vec<SearchRequest>) -> Vec<SearchOutcome> {
        let mut run = self.start(requests);
        let mut outcomes = Vec::new();
        while let Some(outcome) = run.next().await {
            outcomes.push(outcome);
        }
        outcomes
    }
}

/// 一次批量运行的结果流
pub struct BatchRun {
    events: mpsc::UnboundedReceiver<WorkerEvent>,
    queue: JobQueue,
    handles: Vec<JoinHandle<()>>,
    workers: usize,
    done: HashSet<usize>,
    leftovers: Option<std::vec::IntoIter<SearchOutcome>>,
}

impl BatchRun {
    /// 下一个结果；全部输出后返回 None
    pub async fn next(&mut self) -> Option<SearchOutcome> {
        while self.done.len() < self.workers && self.leftovers.is_none() {
            match self.events.recv().await {
                Some(WorkerEvent::Outcome(outcome)) => return Some(outcome),
                Some(WorkerEvent::Done(worker_id)) => {
                    self.done.insert(worker_id);
                }
                // 所有发送端都已释放（worker 异常退出）
                None => break,
            }
        }

        if self.leftovers.is_none() {
            self.leftovers = Some(self.drain_leftovers().await.into_iter());
            for handle in self.handles.drain(..) {
                if let Err(e) = handle.await {
                    error!("worker 任务异常结束: {}", e);
                }
            }
        }

        self.leftovers.as_mut().and_then(Iterator::next)
    }

    /// 没有被任何 worker 处理的任务补成失败结果
    async fn drain_leftovers(&mut self) -> Vec<SearchOutcome> {
        let mut queue = self.queue.lock().await;
        let mut leftovers = Vec::new();
        while let Ok(job) = queue.try_recv() {
            if let Job::Search(index, request) = job {
                warn!("⚠️ 请求 #{} ({}) 没有可用的 worker", index + 1, request.case_label());
                let err = AppError::Browser(BrowserError::SessionLost(
                    "没有可用的浏览器会话".to_string(),
                ));
                leftovers.push(SearchOutcome::failure(&err).with_index(index));
            }
        }
        leftovers
    }
}

/// 单个 worker：打开会话，消费队列直到结束标记，最后关闭会话
async fn run_worker<F: SessionFactory>(
    worker_id: usize,
    factory: Arc<F>,
    config: Arc<Config>,
    flow: SearchFlow,
    queue: JobQueue,
    events: mpsc::UnboundedSender<WorkerEvent>,
) {
    let session = match factory.open(worker_id).await {
        Ok(page) => PortalSession::prepare(page, config, worker_id).await,
        Err(e) => Err(e),
    };

    let session = match session {
        Ok(session) => session,
        Err(e) => {
            error!("❌ [worker {}] 无法打开会话: {}", worker_id, e);
            let _ = events.send(WorkerEvent::Done(worker_id));
            return;
        }
    };

    let mut handled = 0usize;
    loop {
        // 只在取任务时持有锁
        let job = queue.lock().await.recv().await;
        let (index, request) = match job {
            Some(Job::Search(index, request)) => (index, request),
            Some(Job::Shutdown) | None => break,
        };

        let ctx = SearchCtx::batch(index, worker_id, &request);
        let outcome = flow.process(&session, &request, &ctx).await;
        handled += 1;
        if events.send(WorkerEvent::Outcome(outcome)).is_err() {
            warn!("[worker {}] 结果通道已关闭", worker_id);
            break;
        }
    }

    if let Err(e) = session.close().await {
        warn!("[worker {}] 关闭会话失败: {}", worker_id, e);
    }
    info!("🏁 [worker {}] 完成 {} 条请求", worker_id, handled);
    let _ = events.send(WorkerEvent::Done(worker_id));
}

/// 派发线程: 汇总事件 → 报表端
///
/// 帧循环只做 try_send, 报表端的网络延迟和失败都留在派发线程里.
use super::{apply_event, ReportSink};
use crate::schedule::AggregationEvent;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{error, info, warn};

/// 派发线程统计
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// 成功落地的事件数
    pub applied: u64,
    /// 报表端报错后丢弃的事件数
    pub failed: u64,
}

/// 关停结果
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShutdownReport {
    /// 派发线程按时退出时的统计, 超时为 None
    pub stats: Option<DispatchStats>,
    /// 队列满时被丢弃的事件数
    pub dropped: u64,
    pub timed_out: bool,
}

pub struct DispatchWorker {
    tx: Option<Sender<AggregationEvent>>,
    done_rx: Receiver<DispatchStats>,
    handle: Option<JoinHandle<()>>,
    dropped: u64,
}

impl DispatchWorker {
    /// 启动派发线程, `capacity` 为队列容量
    pub fn spawn<S: ReportSink + 'static>(mut sink: S, capacity: usize) -> std::io::Result<Self> {
        let (tx, rx): (Sender<AggregationEvent>, Receiver<AggregationEvent>) =
            crossbeam_channel::bounded(capacity.max(1));
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);

        let handle = thread::Builder::new()
            .name("report-dispatch".into())
            .spawn(move || {
                info!("✅ 派发线程已启动");
                let mut stats = DispatchStats::default();
                // 发送端全部关闭后 recv 返回 Err, 队列中剩余事件已处理完
                while let Ok(event) = rx.recv() {
                    match apply_event(&mut sink, &event) {
                        Ok(()) => stats.applied += 1,
                        Err(e) => {
                            stats.failed += 1;
                            error!("❌ {} 事件 ({:?}) 落地失败: {}", event.slot_label, event.kind, e);
                        }
                    }
                }
                let _ = done_tx.send(stats);
                info!("🛑 派发线程退出");
            })?;

        Ok(Self {
            tx: Some(tx),
            done_rx,
            handle: Some(handle),
            dropped: 0,
        })
    }

    /// 非阻塞投递, 队列已满或线程已退出时丢弃并返回 false
    pub fn dispatch(&mut self, event: AggregationEvent) -> bool {
        let Some(tx) = &self.tx else {
            self.dropped += 1;
            return false;
        };
        match tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                self.dropped += 1;
                warn!("⚠️ 派发队列已满, 丢弃 {} 事件", event.slot_label);
                false
            }
            Err(TrySendError::Disconnected(event)) => {
                self.dropped += 1;
                error!("❌ 派发线程已退出, 丢弃 {} 事件", event.slot_label);
                false
            }
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// 关闭队列并等待派发线程处理完剩余事件
    ///
    /// 超过 `timeout` 仍未退出则放弃等待, 线程被分离.
    pub fn shutdown(mut self, timeout: Duration) -> ShutdownReport {
        drop(self.tx.take());

        match self.done_rx.recv_timeout(timeout) {
            Ok(stats) => {
                if let Some(handle) = self.handle.take() {
                    if handle.join().is_err() {
                        error!("❌ 派发线程异常退出");
                    }
                }
                ShutdownReport {
                    stats: Some(stats),
                    dropped: self.dropped,
                    timed_out: false,
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!("⚠️ 派发线程 {:?} 内未退出, 放弃等待", timeout);
                self.handle.take();
                ShutdownReport {
                    stats: None,
                    dropped: self.dropped,
                    timed_out: true,
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                // 线程 panic, 统计随之丢失
                if let Some(handle) = self.handle.take() {
                    let _ = handle.join();
                }
                error!("❌ 派发线程异常退出");
                ShutdownReport {
                    stats: None,
                    dropped: self.dropped,
                    timed_out: false,
                }
            }
        }
    }
}

//! EWMA 统计节点
//!
//! 在静态权重之上叠加运行时反馈：指数加权移动平均的调用延迟、
//! 成功率，以及当前在途请求数。有效成本越低权重越高，
//! p2c 算法依赖这些统计做两两比较。
//!
//! 所有计数器都用原子操作维护：pick 在调用方任务里执行，
//! 完成回调可能在另一个任务里执行。

use crate::resolver::Address;
use crate::selector::node::{BaseNode, WeightedNode, WeightedNodeBuilder};
use crate::selector::{DoneFunc, DoneInfo};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// 延迟/成功率的默认衰减时间常数
const DEFAULT_TAU: Duration = Duration::from_millis(600);

/// 尚无观测数据时代入的延迟值
const DEFAULT_LAG: Duration = Duration::from_millis(10);

/// 成功率满值（千分比）
const SUCCESS_SCALE: u64 = 1000;

/// EWMA 统计状态
///
/// 与节点分离放进 Arc，完成回调持有它在任意任务上回写
struct EwmaStats {
    /// 平均延迟，纳秒，0 表示还没有观测
    lag: AtomicU64,
    /// 成功率，千分比
    success: AtomicU64,
    /// 在途请求数
    inflight: AtomicI64,
    /// 上次完成回调的时刻，相对 created 的纳秒偏移
    stamp: AtomicU64,
    /// 上次被选中的时刻，相对 created 的纳秒偏移
    last_pick: AtomicU64,
    created: Instant,
    tau: Duration,
}

impl EwmaStats {
    fn new(tau: Duration) -> Self {
        Self {
            lag: AtomicU64::new(0),
            success: AtomicU64::new(SUCCESS_SCALE),
            inflight: AtomicI64::new(0),
            stamp: AtomicU64::new(0),
            last_pick: AtomicU64::new(0),
            created: Instant::now(),
            tau,
        }
    }

    fn now_offset(&self) -> u64 {
        self.created.elapsed().as_nanos() as u64
    }

    /// 用一次观测更新延迟与成功率
    ///
    /// 衰减系数 w = exp(-Δt/τ)，Δt 是距上次观测的间隔：
    /// 观测越密集，单次观测的影响越小
    fn observe(&self, latency: Duration, success: bool) {
        let now = self.now_offset();
        let prev = self.stamp.swap(now, Ordering::AcqRel);
        let td = now.saturating_sub(prev);
        let w = (-(td as f64) / (self.tau.as_nanos() as f64)).exp();

        let latency_ns = latency.as_nanos() as u64;
        let old_lag = self.lag.load(Ordering::Acquire);
        let new_lag = if old_lag == 0 {
            latency_ns
        } else {
            (old_lag as f64 * w + latency_ns as f64 * (1.0 - w)) as u64
        };
        self.lag.store(new_lag, Ordering::Release);

        let target = if success { SUCCESS_SCALE } else { 0 };
        let old_success = self.success.load(Ordering::Acquire);
        let new_success = (old_success as f64 * w + target as f64 * (1.0 - w)) as u64;
        self.success.store(new_success, Ordering::Release);
    }
}

/// EWMA 统计节点
pub struct EwmaNode {
    base: BaseNode,
    stats: Arc<EwmaStats>,
}

impl EwmaNode {
    fn new(base: BaseNode, tau: Duration) -> Self {
        Self {
            base,
            stats: Arc::new(EwmaStats::new(tau)),
        }
    }
}

impl WeightedNode for EwmaNode {
    fn id(&self) -> &str {
        &self.base.id
    }

    fn address(&self) -> &str {
        &self.base.addr
    }

    fn service_name(&self) -> &str {
        &self.base.name
    }

    fn metadata(&self) -> &HashMap<String, String> {
        &self.base.metadata
    }

    /// 有效成本越低权重越高：
    /// weight = 成功率 × 声明权重 / (平均延迟 ms × (在途数 + 1))
    fn weight(&self) -> f64 {
        let success = self.stats.success.load(Ordering::Acquire) as f64 / SUCCESS_SCALE as f64;
        let lag_ns = self.stats.lag.load(Ordering::Acquire);
        let lag_ms = if lag_ns == 0 {
            DEFAULT_LAG.as_secs_f64() * 1e3
        } else {
            lag_ns as f64 / 1e6
        };
        let inflight = self.stats.inflight.load(Ordering::Acquire).max(0) as f64;
        success * self.base.base_weight / (lag_ms * (inflight + 1.0))
    }

    fn pick(&self) -> DoneFunc {
        self.stats.inflight.fetch_add(1, Ordering::AcqRel);
        self.stats
            .last_pick
            .store(self.stats.now_offset(), Ordering::Release);

        let stats = self.stats.clone();
        let start = Instant::now();
        Box::new(move |info: DoneInfo| {
            stats.inflight.fetch_sub(1, Ordering::AcqRel);
            // 调用方没有计时就用 pick 到 done 的实际间隔
            let latency = if info.latency.is_zero() {
                start.elapsed()
            } else {
                info.latency
            };
            stats.observe(latency, info.err.is_none());
        })
    }

    fn pick_elapsed(&self) -> Duration {
        let now = self.stats.now_offset();
        Duration::from_nanos(now.saturating_sub(self.stats.last_pick.load(Ordering::Acquire)))
    }
}

/// EWMA 节点构建器
#[derive(Debug, Clone)]
pub struct EwmaNodeBuilder {
    tau: Duration,
}

impl EwmaNodeBuilder {
    pub fn new() -> Self {
        Self { tau: DEFAULT_TAU }
    }

    /// 调整衰减时间常数
    pub fn with_tau(mut self, tau: Duration) -> Self {
        self.tau = tau;
        self
    }
}

impl Default for EwmaNodeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WeightedNodeBuilder for EwmaNodeBuilder {
    fn build(&self, address: &Address) -> Arc<dyn WeightedNode> {
        Arc::new(EwmaNode::new(BaseNode::from_address(address), self.tau))
    }
}

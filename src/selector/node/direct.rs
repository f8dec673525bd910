//! 静态权重节点
//!
//! 权重直接取自实例元数据，完成回调不做任何统计，
//! 用于 random、rr、wrandom、hash、chash 这类无反馈算法。

use crate::resolver::Address;
use crate::selector::DoneFunc;
use crate::selector::node::{BaseNode, WeightedNode, WeightedNodeBuilder};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// 静态权重节点
pub struct DirectNode {
    base: BaseNode,
    /// 节点创建时刻，作为时间戳原点
    created: Instant,
    /// 上次被选中的时刻，相对 created 的纳秒偏移
    last_pick: AtomicU64,
}

impl DirectNode {
    fn new(base: BaseNode) -> Self {
        Self {
            base,
            created: Instant::now(),
            last_pick: AtomicU64::new(0),
        }
    }
}

impl WeightedNode for DirectNode {
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

    fn weight(&self) -> f64 {
        self.base.base_weight
    }

    fn pick(&self) -> DoneFunc {
        let now = self.created.elapsed().as_nanos() as u64;
        self.last_pick.store(now, Ordering::Relaxed);
        Box::new(|_| {})
    }

    fn pick_elapsed(&self) -> Duration {
        let now = self.created.elapsed().as_nanos() as u64;
        Duration::from_nanos(now.saturating_sub(self.last_pick.load(Ordering::Relaxed)))
    }
}

/// 静态权重节点构建器
#[derive(Debug, Default)]
pub struct DirectNodeBuilder;

impl WeightedNodeBuilder for DirectNodeBuilder {
    fn build(&self, address: &Address) -> Arc<dyn WeightedNode> {
        Arc::new(DirectNode::new(BaseNode::from_address(address)))
    }
}

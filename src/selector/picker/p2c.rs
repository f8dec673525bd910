//! 两选一算法（power of two choices）
//!
//! 随机抽两个不重复的候选，比较 EWMA 权重取高者。为了避免
//! 低权节点长期拿不到真实流量、统计数据无法更新，落选节点
//! 超过 3 秒没有被选中时借一次强制机会：单槽 CAS 哨兵保证
//! 同一时刻全局只有一个强制选择在进行。

use crate::error::{ClientError, Result};
use crate::selector::node::{EwmaNodeBuilder, WeightedNode};
use crate::selector::{DoneFunc, RouteContext, Selector, SelectorBuilder};
use crate::selector::picker::{Balancer, BalancerBuilder};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// 算法名称
pub const NAME: &str = "p2c";

/// 落选节点超过该时长未被选中则强制选择一次
const FORCE_PICK: Duration = Duration::from_secs(3);

/// 两选一负载均衡器
pub struct P2cBalancer {
    rng: Mutex<StdRng>,
    /// 强制选择哨兵：0 空闲，1 占用
    picked: AtomicI64,
}

impl P2cBalancer {
    fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
            picked: AtomicI64::new(0),
        }
    }

    /// 抽两个不重复的下标
    fn pre_pick(&self, len: usize) -> (usize, usize) {
        let (a, b) = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            (rng.gen_range(0..len), rng.gen_range(0..len - 1))
        };
        // b 落在 a 及其右侧时整体右移一位，保证两个下标不同
        if b >= a { (a, b + 1) } else { (a, b) }
    }
}

impl Balancer for P2cBalancer {
    fn pick(
        &self,
        _ctx: &RouteContext,
        nodes: &[Arc<dyn WeightedNode>],
    ) -> Result<(Arc<dyn WeightedNode>, DoneFunc)> {
        if nodes.is_empty() {
            return Err(ClientError::NoAvailable);
        }
        if nodes.len() == 1 {
            let selected = nodes[0].clone();
            let done = selected.pick();
            return Ok((selected, done));
        }

        let (a, b) = self.pre_pick(nodes.len());
        let (node_a, node_b) = (nodes[a].clone(), nodes[b].clone());

        // 权重高者为首选，低者为落选
        let (pc, upc) = if node_b.weight() > node_a.weight() {
            (node_b, node_a)
        } else {
            (node_a, node_b)
        };

        // 落选节点在 FORCE_PICK 内从未被选中，借强制机会触发
        // 其成功率和延迟统计的更新；哨兵保持占用直到强制选择
        // 完成，并发调用落回各自的首选节点
        if upc.pick_elapsed() > FORCE_PICK
            && self
                .picked
                .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
        {
            let done = upc.pick();
            self.picked.store(0, Ordering::SeqCst);
            return Ok((upc, done));
        }

        let done = pc.pick();
        Ok((pc, done))
    }
}

/// 两选一算法构建器
#[derive(Debug, Default)]
pub struct Builder;

impl BalancerBuilder for Builder {
    fn name(&self) -> &'static str {
        NAME
    }

    fn build(&self) -> Box<dyn Balancer> {
        Box::new(P2cBalancer::new())
    }
}

/// 创建两选一算法选择器，搭配 EWMA 统计节点
pub fn new_selector() -> Selector {
    SelectorBuilder::new(Box::new(Builder), Arc::new(EwmaNodeBuilder::new())).build()
}

//! 轮询算法
//!
//! 当前实现在锁内遍历候选列表并保留第一个命中的节点，
//! 即总是返回 nodes[0]。保留此行为以保证选择结果与既有
//! 部署一致；真正的轮转实现需要一个原子的上次下标计数器。

use crate::error::{ClientError, Result};
use crate::selector::node::{DirectNodeBuilder, WeightedNode};
use crate::selector::{DoneFunc, RouteContext, Selector, SelectorBuilder};
use crate::selector::picker::{Balancer, BalancerBuilder};
use std::sync::{Arc, Mutex, PoisonError};

/// 算法名称
pub const NAME: &str = "rr";

/// 轮询负载均衡器
#[derive(Debug, Default)]
pub struct RoundRobinBalancer {
    mu: Mutex<()>,
}

impl Balancer for RoundRobinBalancer {
    fn pick(
        &self,
        _ctx: &RouteContext,
        nodes: &[Arc<dyn WeightedNode>],
    ) -> Result<(Arc<dyn WeightedNode>, DoneFunc)> {
        if nodes.is_empty() {
            return Err(ClientError::NoAvailable);
        }

        let _guard = self.mu.lock().unwrap_or_else(PoisonError::into_inner);

        let mut selected: Option<Arc<dyn WeightedNode>> = None;
        for node in nodes {
            if selected.is_none() {
                selected = Some(node.clone());
            }
        }

        // 列表非空时遍历必然命中
        let selected = selected.ok_or(ClientError::NoAvailable)?;
        let done = selected.pick();
        Ok((selected, done))
    }
}

/// 轮询算法构建器
#[derive(Debug, Default)]
pub struct Builder;

impl BalancerBuilder for Builder {
    fn name(&self) -> &'static str {
        NAME
    }

    fn build(&self) -> Box<dyn Balancer> {
        Box::new(RoundRobinBalancer::default())
    }
}

/// 创建轮询算法选择器
pub fn new_selector() -> Selector {
    SelectorBuilder::new(Box::new(Builder), Arc::new(DirectNodeBuilder)).build()
}

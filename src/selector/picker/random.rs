//! 随机算法
//!
//! 在候选列表里均匀抽一个下标，无状态。

use crate::error::{ClientError, Result};
use crate::selector::node::{DirectNodeBuilder, WeightedNode};
use crate::selector::{DoneFunc, RouteContext, Selector, SelectorBuilder};
use crate::selector::picker::{Balancer, BalancerBuilder};
use rand::Rng;
use std::sync::Arc;

/// 算法名称
pub const NAME: &str = "random";

/// 随机负载均衡器
#[derive(Debug, Default)]
pub struct RandomBalancer;

impl Balancer for RandomBalancer {
    fn pick(
        &self,
        _ctx: &RouteContext,
        nodes: &[Arc<dyn WeightedNode>],
    ) -> Result<(Arc<dyn WeightedNode>, DoneFunc)> {
        if nodes.is_empty() {
            return Err(ClientError::NoAvailable);
        }
        let cur = rand::thread_rng().gen_range(0..nodes.len());
        let selected = nodes[cur].clone();
        let done = selected.pick();
        Ok((selected, done))
    }
}

/// 随机算法构建器
#[derive(Debug, Default)]
pub struct Builder;

impl BalancerBuilder for Builder {
    fn name(&self) -> &'static str {
        NAME
    }

    fn build(&self) -> Box<dyn Balancer> {
        Box::new(RandomBalancer)
    }
}

/// 创建随机算法选择器
pub fn new_selector() -> Selector {
    SelectorBuilder::new(Box::new(Builder), Arc::new(DirectNodeBuilder)).build()
}

//! 方法名哈希算法
//!
//! 对路由上下文里的完整方法名取 CRC32，再对候选数取模。
//! 同一个方法名在列表不变时总是落到同一个节点。

use crate::error::{ClientError, Result};
use crate::selector::node::{DirectNodeBuilder, WeightedNode};
use crate::selector::{DoneFunc, RouteContext, Selector, SelectorBuilder};
use crate::selector::picker::{Balancer, BalancerBuilder};
use std::sync::Arc;

/// 算法名称
pub const NAME: &str = "hash";

/// 哈希取模负载均衡器
#[derive(Debug, Default)]
pub struct HashBalancer;

impl Balancer for HashBalancer {
    fn pick(
        &self,
        ctx: &RouteContext,
        nodes: &[Arc<dyn WeightedNode>],
    ) -> Result<(Arc<dyn WeightedNode>, DoneFunc)> {
        if nodes.is_empty() {
            return Err(ClientError::NoAvailable);
        }

        let method = ctx.full_method.as_deref().ok_or(ClientError::NoAvailable)?;
        let hash = crc32fast::hash(method.as_bytes());
        let key = hash as usize % nodes.len();

        let selected = nodes[key].clone();
        let done = selected.pick();
        Ok((selected, done))
    }
}

/// 哈希算法构建器
#[derive(Debug, Default)]
pub struct Builder;

impl BalancerBuilder for Builder {
    fn name(&self) -> &'static str {
        NAME
    }

    fn build(&self) -> Box<dyn Balancer> {
        Box::new(HashBalancer)
    }
}

/// 创建哈希算法选择器
pub fn new_selector() -> Selector {
    SelectorBuilder::new(Box::new(Builder), Arc::new(DirectNodeBuilder)).build()
}

//! 按权随机算法
//!
//! 每次 pick 都按列表顺序重算一遍累积权重区间 `[start, end)`，
//! 在 `[0, total)` 上均匀取一个浮点数，线性扫描找到所在区间。
//! 区间表不跨调用缓存（按地址集哈希做缓存失效是可行的性能
//! 优化，但不是语义要求）。

use crate::error::{ClientError, Result};
use crate::selector::node::{DirectNodeBuilder, WeightedNode};
use crate::selector::{DoneFunc, RouteContext, Selector, SelectorBuilder};
use crate::selector::picker::{Balancer, BalancerBuilder};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// 算法名称
pub const NAME: &str = "wrandom";

/// 一个节点占据的权重区间
#[derive(Debug, Clone, Copy, Default)]
struct WeightRange {
    start: f64,
    end: f64,
}

/// 按权随机负载均衡器
#[derive(Debug, Default)]
pub struct WeightedRandomBalancer {
    current_weight: RwLock<HashMap<String, WeightRange>>,
}

impl Balancer for WeightedRandomBalancer {
    fn pick(
        &self,
        _ctx: &RouteContext,
        nodes: &[Arc<dyn WeightedNode>],
    ) -> Result<(Arc<dyn WeightedNode>, DoneFunc)> {
        if nodes.is_empty() {
            return Err(ClientError::NoAvailable);
        }

        let mut total_weight = 0.0;
        {
            let mut ranges = self
                .current_weight
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            for node in nodes {
                let weight = node.weight();
                let range = ranges.entry(node.address().to_string()).or_default();
                range.start = total_weight;
                total_weight += weight;
                range.end = total_weight;
            }
        }

        let cur = rand::random::<f64>() * total_weight;

        let mut selected: Option<Arc<dyn WeightedNode>> = None;
        {
            let ranges = self
                .current_weight
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            for node in nodes {
                if let Some(range) = ranges.get(node.address()) {
                    if cur >= range.start && cur < range.end {
                        selected = Some(node.clone());
                        break;
                    }
                }
            }
        }

        let selected = selected.ok_or(ClientError::NoAvailable)?;
        let done = selected.pick();
        Ok((selected, done))
    }
}

/// 按权随机算法构建器
#[derive(Debug, Default)]
pub struct Builder;

impl BalancerBuilder for Builder {
    fn name(&self) -> &'static str {
        NAME
    }

    fn build(&self) -> Box<dyn Balancer> {
        Box::new(WeightedRandomBalancer::default())
    }
}

/// 创建按权随机算法选择器
pub fn new_selector() -> Selector {
    SelectorBuilder::new(Box::new(Builder), Arc::new(DirectNodeBuilder)).build()
}

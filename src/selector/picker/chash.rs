//! 一致性哈希算法
//!
//! 每个节点按 `"{id}#{replica}"` 生成 5 个虚拟点，CRC32 后插入
//! 有序环；查找时对方法名取同一个哈希，二分找到第一个不小于它
//! 的环上键，越界回绕到环首。环在每次 pick 时整体重建。
//!
//! 节点集不变、方法名不变时选择结果确定；增删一个节点只影响
//! 落在该节点虚拟点区段内的键。

use crate::error::{ClientError, Result};
use crate::selector::node::{DirectNodeBuilder, WeightedNode};
use crate::selector::{DoneFunc, RouteContext, Selector, SelectorBuilder};
use crate::selector::picker::{Balancer, BalancerBuilder};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// 算法名称
pub const NAME: &str = "chash";

/// 每个节点的虚拟点数量
const REPLICAS: usize = 5;

/// 哈希环
#[derive(Default)]
struct HashRing {
    /// 升序排列的虚拟点
    keys: Vec<u32>,
    /// 虚拟点到节点的映射
    nodes: HashMap<u32, Arc<dyn WeightedNode>>,
}

/// 一致性哈希负载均衡器
#[derive(Default)]
pub struct ConsistentHashBalancer {
    ring: RwLock<HashRing>,
}

impl Balancer for ConsistentHashBalancer {
    fn pick(
        &self,
        ctx: &RouteContext,
        nodes: &[Arc<dyn WeightedNode>],
    ) -> Result<(Arc<dyn WeightedNode>, DoneFunc)> {
        if nodes.is_empty() {
            return Err(ClientError::NoAvailable);
        }

        {
            let mut ring = self.ring.write().unwrap_or_else(PoisonError::into_inner);
            ring.keys.clear();
            ring.nodes.clear();
            for node in nodes {
                for i in 0..REPLICAS {
                    let point = format!("{}#{}", node.id(), i);
                    let hash = crc32fast::hash(point.as_bytes());
                    ring.keys.push(hash);
                    ring.nodes.insert(hash, node.clone());
                }
            }
            ring.keys.sort_unstable();
        }

        let method = ctx.full_method.as_deref().ok_or(ClientError::NoAvailable)?;
        let hash = crc32fast::hash(method.as_bytes());

        let selected = {
            let ring = self.ring.read().unwrap_or_else(PoisonError::into_inner);
            let idx = match ring.keys.binary_search(&hash) {
                Ok(idx) => idx,
                // 没有不小于 hash 的键时回绕到环首
                Err(idx) if idx == ring.keys.len() => 0,
                Err(idx) => idx,
            };
            ring.nodes.get(&ring.keys[idx]).cloned()
        };

        let selected = selected.ok_or(ClientError::NoAvailable)?;
        let done = selected.pick();
        Ok((selected, done))
    }
}

/// 一致性哈希算法构建器
#[derive(Debug, Default)]
pub struct Builder;

impl BalancerBuilder for Builder {
    fn name(&self) -> &'static str {
        NAME
    }

    fn build(&self) -> Box<dyn Balancer> {
        Box::new(ConsistentHashBalancer::default())
    }
}

/// 创建一致性哈希算法选择器
pub fn new_selector() -> Selector {
    SelectorBuilder::new(Box::new(Builder), Arc::new(DirectNodeBuilder)).build()
}

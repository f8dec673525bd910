//! 节点选择模块
//!
//! `Selector` 是 RPC 层每次发起调用时使用的选择门面：
//! 解析器推送新地址集时通过 `apply` 重建候选节点，
//! 每次调用通过 `select` 让负载均衡算法挑出一个节点，
//! 调用完成后执行返回的 `DoneFunc` 回写统计信息。

pub mod node;
pub mod picker;

pub use node::{WeightedNode, WeightedNodeBuilder};
pub use picker::{BalancePolicy, Balancer, BalancerBuilder};

use crate::error::Result;
use crate::resolver::Address;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// 路由上下文
///
/// 携带哈希类算法使用的路由键，约定为完整方法名
#[derive(Debug, Clone, Default)]
pub struct RouteContext {
    /// 完整方法名，如 "/user.v1.User/GetUser"
    pub full_method: Option<String>,
}

impl RouteContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置完整方法名
    pub fn with_full_method(mut self, method: impl Into<String>) -> Self {
        self.full_method = Some(method.into());
        self
    }
}

/// 调用完成信息
pub struct DoneInfo {
    /// 本次调用耗时
    pub latency: Duration,

    /// 调用错误，None 表示成功
    pub err: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl DoneInfo {
    /// 成功完成
    pub fn success(latency: Duration) -> Self {
        Self { latency, err: None }
    }

    /// 失败完成
    pub fn failure(latency: Duration, err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self {
            latency,
            err: Some(err),
        }
    }
}

/// 调用完成回调，由调用方在 RPC 结束后执行一次
pub type DoneFunc = Box<dyn FnOnce(DoneInfo) + Send>;

/// 节点选择器
///
/// 组合一个节点构建器和一个负载均衡算法。候选节点列表在
/// 解析器每次更新时整体重建，选择本身只做内存操作、立即返回。
pub struct Selector {
    node_builder: Arc<dyn WeightedNodeBuilder>,
    balancer: Box<dyn Balancer>,
    nodes: RwLock<Vec<Arc<dyn WeightedNode>>>,
}

impl Selector {
    /// 按新的地址集重建候选节点列表
    pub fn apply(&self, addresses: &[Address]) {
        let nodes: Vec<Arc<dyn WeightedNode>> = addresses
            .iter()
            .map(|addr| self.node_builder.build(addr))
            .collect();
        *self
            .nodes
            .write()
            .unwrap_or_else(PoisonError::into_inner) = nodes;
    }

    /// 选择一个节点及其完成回调
    pub fn select(&self, ctx: &RouteContext) -> Result<(Arc<dyn WeightedNode>, DoneFunc)> {
        let nodes = self
            .nodes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        self.balancer.pick(ctx, &nodes)
    }

    /// 当前候选节点数量
    pub fn node_count(&self) -> usize {
        self.nodes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// 选择器构建器
///
/// 负载均衡算法构建器 + 节点构建器的组合
pub struct SelectorBuilder {
    balancer: Box<dyn BalancerBuilder>,
    node: Arc<dyn WeightedNodeBuilder>,
}

impl SelectorBuilder {
    pub fn new(balancer: Box<dyn BalancerBuilder>, node: Arc<dyn WeightedNodeBuilder>) -> Self {
        Self { balancer, node }
    }

    /// 构建一个可用的选择器，每次调用产生独立的算法状态
    pub fn build(&self) -> Selector {
        Selector {
            node_builder: self.node.clone(),
            balancer: self.balancer.build(),
            nodes: RwLock::new(Vec::new()),
        }
    }
}

//! 负载均衡算法模块
//!
//! 每个算法一个子模块，统一实现 `Balancer`，并通过 `BalancePolicy`
//! 按名称选取。有状态的算法（wrandom 的区间表、chash 的哈希环、
//! p2c 的随机源和防饿哨兵）的共享状态都限定在 balancer 实例内部，
//! 必须容忍多个调用任务并发 pick。

pub mod chash;
pub mod hash;
pub mod p2c;
pub mod random;
pub mod rr;
pub mod wrandom;

use crate::error::Result;
use crate::selector::node::WeightedNode;
use crate::selector::{DoneFunc, RouteContext, Selector};
use std::sync::Arc;

/// 负载均衡算法
pub trait Balancer: Send + Sync {
    /// 从候选列表中挑出一个节点及其完成回调
    ///
    /// 候选列表为空或算法约束不满足时返回 `ClientError::NoAvailable`。
    /// 实现只做内存操作，不允许阻塞在 I/O 上。
    fn pick(
        &self,
        ctx: &RouteContext,
        nodes: &[Arc<dyn WeightedNode>],
    ) -> Result<(Arc<dyn WeightedNode>, DoneFunc)>;
}

/// 负载均衡算法构建器
pub trait BalancerBuilder: Send + Sync {
    /// 算法名称
    fn name(&self) -> &'static str;

    /// 创建一个新的算法实例（独立状态）
    fn build(&self) -> Box<dyn Balancer>;
}

/// 负载均衡策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalancePolicy {
    /// 均匀随机
    Random,
    /// 轮询
    RoundRobin,
    /// 方法名哈希取模
    Hash,
    /// 按权随机
    WeightedRandom,
    /// 一致性哈希
    ConsistentHash,
    /// 两选一 + EWMA
    P2c,
}

impl BalancePolicy {
    /// 按名称解析策略，未知名称回退到随机
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "rr" | "roundrobin" => BalancePolicy::RoundRobin,
            "hash" => BalancePolicy::Hash,
            "wrandom" => BalancePolicy::WeightedRandom,
            "chash" => BalancePolicy::ConsistentHash,
            "p2c" => BalancePolicy::P2c,
            _ => BalancePolicy::Random,
        }
    }

    /// 策略名称
    pub fn name(&self) -> &'static str {
        match self {
            BalancePolicy::Random => random::NAME,
            BalancePolicy::RoundRobin => rr::NAME,
            BalancePolicy::Hash => hash::NAME,
            BalancePolicy::WeightedRandom => wrandom::NAME,
            BalancePolicy::ConsistentHash => chash::NAME,
            BalancePolicy::P2c => p2c::NAME,
        }
    }

    /// 构建该策略对应的选择器
    ///
    /// p2c 搭配 EWMA 节点，其余算法搭配静态权重节点
    pub fn build_selector(&self) -> Selector {
        match self {
            BalancePolicy::Random => random::new_selector(),
            BalancePolicy::RoundRobin => rr::new_selector(),
            BalancePolicy::Hash => hash::new_selector(),
            BalancePolicy::WeightedRandom => wrandom::new_selector(),
            BalancePolicy::ConsistentHash => chash::new_selector(),
            BalancePolicy::P2c => p2c::new_selector(),
        }
    }
}

//! 可选节点抽象
//!
//! 把一条已解析地址包装成可被算法挑选、带统计信息的节点句柄。
//! 节点的生命周期与地址集一致：解析器每次更新都会重建节点列表。

pub mod direct;
pub mod ewma;

pub use direct::DirectNodeBuilder;
pub use ewma::EwmaNodeBuilder;

use crate::resolver::Address;
use crate::selector::DoneFunc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// 元数据里声明权重的键
const METADATA_WEIGHT_KEY: &str = "weight";

/// 未声明权重时的默认值
const DEFAULT_WEIGHT: f64 = 100.0;

/// 带权节点
pub trait WeightedNode: Send + Sync {
    /// 实例唯一标识，没有实例信息时退化为地址
    fn id(&self) -> &str;

    /// host:port 连接地址
    fn address(&self) -> &str;

    /// 实例所属服务名
    fn service_name(&self) -> &str;

    /// 实例元数据
    fn metadata(&self) -> &HashMap<String, String>;

    /// 相对选择权重，语义随算法不同
    fn weight(&self) -> f64;

    /// 标记节点被选中，返回调用完成回调
    fn pick(&self) -> DoneFunc;

    /// 距离上一次被选中经过的时间
    fn pick_elapsed(&self) -> Duration;
}

/// 带权节点构建器
pub trait WeightedNodeBuilder: Send + Sync {
    /// 把一条已解析地址包装成带权节点
    fn build(&self, address: &Address) -> Arc<dyn WeightedNode>;
}

/// 各节点实现共享的基础字段
#[derive(Debug, Clone)]
pub(crate) struct BaseNode {
    pub id: String,
    pub addr: String,
    pub name: String,
    pub metadata: HashMap<String, String>,
    /// 服务发布方在注册中心声明的权重
    pub base_weight: f64,
}

impl BaseNode {
    pub(crate) fn from_address(address: &Address) -> Self {
        let (id, name, metadata) = match &address.instance {
            Some(instance) => (
                instance.id.clone(),
                instance.name.clone(),
                instance.metadata.clone(),
            ),
            None => (
                address.addr.clone(),
                address.server_name.clone(),
                address.attributes.clone(),
            ),
        };
        let base_weight = metadata
            .get(METADATA_WEIGHT_KEY)
            .and_then(|w| w.parse::<f64>().ok())
            .unwrap_or(DEFAULT_WEIGHT);
        Self {
            id,
            addr: address.addr.clone(),
            name,
            metadata,
            base_weight,
        }
    }
}

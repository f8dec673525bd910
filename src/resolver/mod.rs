//! 地址解析模块
//!
//! 解析器负责把一个 target 字符串（`<scheme>:///<path>`）翻译成一组
//! 可连接的后端地址，并在地址集变化时推送给传输层。
//!
//! - `direct`：静态地址列表，构建时推送一次
//! - `discovery`：基于注册中心 watch 的动态解析，后台循环持续推送

pub mod direct;
pub mod discovery;
pub mod endpoint;

pub use direct::DirectResolverBuilder;
pub use discovery::{DiscoveryResolver, DiscoveryResolverBuilder};

use crate::error::{ClientError, Result};
use crate::registry::ServiceInstance;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

/// 解析目标
///
/// 约定格式 `<scheme>:///<path>`：
/// direct 模式下 path 是逗号分隔的端点列表，
/// discovery 模式下 path 是注册中心里的逻辑服务名。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// 解析协议，如 "direct"、"discovery"
    pub scheme: String,

    /// 权威部分，一般为空
    pub authority: String,

    /// 路径部分，保留前导 '/'
    pub path: String,
}

impl Target {
    /// 解析 target 字符串
    pub fn parse(target: &str) -> Result<Self> {
        let url = Url::parse(target)
            .map_err(|e| ClientError::resolver(format!("invalid target {target}: {e}")))?;
        Ok(Self {
            scheme: url.scheme().to_string(),
            authority: url.authority().to_string(),
            path: url.path().to_string(),
        })
    }

    /// 去掉前导 '/' 的路径，即端点列表或服务名
    pub fn endpoint(&self) -> &str {
        self.path.trim_start_matches('/')
    }
}

/// 已解析的后端地址
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Address {
    /// host:port 形式的连接地址
    pub addr: String,

    /// 实例所属的服务名
    pub server_name: String,

    /// 附加属性（来自实例元数据）
    pub attributes: HashMap<String, String>,

    /// 原始服务实例，供下游（节点构建等）使用
    pub instance: Option<ServiceInstance>,
}

impl Address {
    /// 创建仅含地址的 Address
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            ..Default::default()
        }
    }
}

/// 解析器推送给传输层的地址快照
#[derive(Debug, Clone, Default)]
pub struct ResolverState {
    /// 当前可用的地址列表，已去重
    pub addresses: Vec<Address>,
}

/// 地址更新的接收端
///
/// 传输层实现此 trait 持有权威地址快照；解析器只负责推送，
/// 不等待确认（fire-and-forget，最后一次写入生效）。
pub trait AddressSink: Send + Sync {
    /// 接收新的地址快照
    fn update_state(&self, state: ResolverState) -> Result<()>;
}

/// 解析器构建器
#[async_trait]
pub trait ResolverBuilder: Send + Sync {
    /// 此构建器负责的 scheme
    fn scheme(&self) -> &'static str;

    /// 按 target 创建解析器，初始地址集推送到 sink
    async fn build(
        &self,
        target: &Target,
        sink: Arc<dyn AddressSink>,
    ) -> Result<Box<dyn Resolver>>;
}

/// 地址解析器实例
#[async_trait]
pub trait Resolver: Send + Sync {
    /// 提示立即重新解析，允许实现为空操作
    fn resolve_now(&self);

    /// 关闭解析器，可重复调用
    async fn close(&self);
}

/// 基于 `tokio::sync::watch` 的地址接收端
///
/// 最后一次写入生效，传输层通过 `subscribe` 拿到自己的快照通道
#[derive(Debug)]
pub struct WatchSink {
    tx: tokio::sync::watch::Sender<ResolverState>,
}

impl WatchSink {
    /// 创建空快照的 WatchSink
    pub fn new() -> Self {
        let (tx, _) = tokio::sync::watch::channel(ResolverState::default());
        Self { tx }
    }

    /// 订阅地址快照变化
    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<ResolverState> {
        self.tx.subscribe()
    }
}

impl Default for WatchSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressSink for WatchSink {
    fn update_state(&self, state: ResolverState) -> Result<()> {
        // send_replace 在没有订阅者时也会保留最新快照
        self.tx.send_replace(state);
        Ok(())
    }
}

//! 基于服务发现的地址解析器
//!
//! 构建时在限定时间内从 `Discovery` 拿到 watcher，然后启动后台循环：
//! 每次 `Watcher::next` 返回实例集时按协议与安全模式过滤端点、去重，
//! 非空则推送新的地址快照给传输层；取消信号使循环干净退出，
//! 可重试错误记录日志后固定退避重试，其余错误终止循环。
//!
//! 示例 target：`discovery:///user-service`

use crate::error::{ClientError, Result};
use crate::registry::{Discovery, ServiceInstance, Watcher};
use crate::resolver::endpoint::parse_endpoint;
use crate::resolver::{Address, AddressSink, Resolver, ResolverBuilder, ResolverState, Target};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// discovery 解析器的 scheme
pub const SCHEME: &str = "discovery";

/// 创建 watcher 的默认超时
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// watch 循环出错后的固定退避
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// 服务发现解析器构建器
pub struct DiscoveryResolverBuilder {
    discovery: Arc<dyn Discovery>,
    timeout: Duration,
    insecure: bool,
    protocol: String,
}

impl DiscoveryResolverBuilder {
    /// 创建构建器，默认 10s 超时、安全模式、grpc 协议
    pub fn new(discovery: Arc<dyn Discovery>) -> Self {
        Self {
            discovery,
            timeout: DEFAULT_TIMEOUT,
            insecure: false,
            protocol: "grpc".to_string(),
        }
    }

    /// 设置 watcher 创建超时
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 设置安全模式：true 表示只接受声明了 `insecure=true` 的端点
    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    /// 设置端点协议，默认 "grpc"
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }
}

#[async_trait]
impl ResolverBuilder for DiscoveryResolverBuilder {
    fn scheme(&self) -> &'static str {
        SCHEME
    }

    async fn build(
        &self,
        target: &Target,
        sink: Arc<dyn AddressSink>,
    ) -> Result<Box<dyn Resolver>> {
        let service_name = target.endpoint().to_string();

        // 超时即放弃：future 被丢弃，进行中的 watch 创建随之取消
        let watcher = tokio::time::timeout(self.timeout, self.discovery.watch(&service_name))
            .await
            .map_err(|_| ClientError::ResolveTimeout)??;

        let token = CancellationToken::new();
        let resolver = DiscoveryResolver {
            watcher: watcher.clone(),
            token: token.clone(),
            closed: AtomicBool::new(false),
        };

        let protocol = self.protocol.clone();
        let insecure = self.insecure;
        tokio::spawn(async move {
            watch_loop(watcher, sink, token, protocol, insecure).await;
        });

        Ok(Box::new(resolver))
    }
}

/// 服务发现解析器
pub struct DiscoveryResolver {
    watcher: Arc<dyn Watcher>,
    token: CancellationToken,
    closed: AtomicBool,
}

#[async_trait]
impl Resolver for DiscoveryResolver {
    fn resolve_now(&self) {}

    async fn close(&self) {
        // 只有第一次 close 执行取消和 stop
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.token.cancel();
        if let Err(e) = self.watcher.stop().await {
            error!(error = %e, "failed to stop discovery watcher");
        }
    }
}

/// 后台 watch 循环，直到取消信号才退出
async fn watch_loop(
    watcher: Arc<dyn Watcher>,
    sink: Arc<dyn AddressSink>,
    token: CancellationToken,
    protocol: String,
    insecure: bool,
) {
    loop {
        let instances = tokio::select! {
            // 取消信号优先于已就绪的监听事件
            biased;
            _ = token.cancelled() => return,
            res = watcher.next() => match res {
                Ok(instances) => instances,
                Err(e) if e.is_cancelled() => return,
                Err(e) if e.is_retryable() => {
                    error!(error = %e, "failed to watch discovery endpoint");
                    tokio::time::sleep(RETRY_BACKOFF).await;
                    continue;
                }
                Err(e) => {
                    error!(error = %e, "unrecoverable watch error, watch loop exits");
                    return;
                }
            },
        };
        update(sink.as_ref(), &protocol, insecure, instances);
    }
}

/// 把实例集翻译成地址快照并推送
fn update(sink: &dyn AddressSink, protocol: &str, insecure: bool, instances: Vec<ServiceInstance>) {
    let mut addresses = Vec::new();
    let mut seen = HashSet::new();

    for instance in &instances {
        let host = match parse_endpoint(&instance.endpoints, protocol, insecure) {
            Ok(Some(host)) => host,
            // 没有匹配端点的实例直接跳过
            Ok(None) => continue,
            Err(e) => {
                error!(error = %e, "failed to parse discovery endpoint");
                continue;
            }
        };

        // 同一个 host 只发布一次
        if !seen.insert(host.clone()) {
            continue;
        }

        addresses.push(Address {
            addr: host,
            server_name: instance.name.clone(),
            attributes: instance.metadata.clone(),
            instance: Some(instance.clone()),
        });
    }

    if addresses.is_empty() {
        // 保留上一次推送的地址集
        warn!("no available endpoint");
        return;
    }

    if let Err(e) = sink.update_state(ResolverState { addresses }) {
        error!(error = %e, "failed to update resolver state");
        return;
    }

    if let Ok(payload) = serde_json::to_string(&instances) {
        info!(instances = %payload, "resolver state updated");
    }
}

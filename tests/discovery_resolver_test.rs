//! 服务发现解析器测试
//!
//! 用基于 channel 的 mock Discovery/Watcher 驱动 watch 循环，
//! 验证端点过滤、去重、空集跳过、构建超时、瞬时错误重试和幂等关闭。

use async_trait::async_trait;
use flare_client_core::{
    AddressSink, ClientError, Discovery, DiscoveryResolverBuilder, Resolver, ResolverBuilder,
    ResolverState, Result, ServiceInstance, Target, Watcher,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// 记录每次推送的测试 sink
#[derive(Default)]
struct RecordingSink {
    states: Mutex<Vec<ResolverState>>,
}

impl RecordingSink {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn published(&self) -> Vec<ResolverState> {
        self.states.lock().unwrap().clone()
    }

    /// 轮询等待第 n 次推送到达
    async fn wait_for_updates(&self, n: usize, timeout: Duration) -> Vec<ResolverState> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let states = self.published();
            if states.len() >= n {
                return states;
            }
            if tokio::time::Instant::now() >= deadline {
                panic!("timed out waiting for {n} updates, got {}", states.len());
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

impl AddressSink for RecordingSink {
    fn update_state(&self, state: ResolverState) -> Result<()> {
        self.states.lock().unwrap().push(state);
        Ok(())
    }
}

/// 把 channel 里的事件逐条交给 watch 循环的 mock watcher
struct MockWatcher {
    rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<Result<Vec<ServiceInstance>>>>,
    stop_count: AtomicUsize,
}

impl MockWatcher {
    fn new() -> (Arc<Self>, mpsc::UnboundedSender<Result<Vec<ServiceInstance>>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Arc::new(Self {
                rx: tokio::sync::Mutex::new(rx),
                stop_count: AtomicUsize::new(0),
            }),
            tx,
        )
    }
}

#[async_trait]
impl Watcher for MockWatcher {
    async fn next(&self) -> Result<Vec<ServiceInstance>> {
        match self.rx.lock().await.recv().await {
            Some(result) => result,
            // 发送端关闭视为取消
            None => Err(ClientError::Cancelled),
        }
    }

    async fn stop(&self) -> Result<()> {
        self.stop_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct MockDiscovery {
    watcher: Arc<MockWatcher>,
}

#[async_trait]
impl Discovery for MockDiscovery {
    async fn get_service(&self, _service_name: &str) -> Result<Vec<ServiceInstance>> {
        Ok(Vec::new())
    }

    async fn watch(&self, _service_name: &str) -> Result<Arc<dyn Watcher>> {
        Ok(self.watcher.clone())
    }
}

/// watch 永远不返回的 discovery，用于超时测试
struct StuckDiscovery;

#[async_trait]
impl Discovery for StuckDiscovery {
    async fn get_service(&self, _service_name: &str) -> Result<Vec<ServiceInstance>> {
        Ok(Vec::new())
    }

    async fn watch(&self, _service_name: &str) -> Result<Arc<dyn Watcher>> {
        std::future::pending().await
    }
}

fn user_service_target() -> Target {
    Target::parse("discovery:///user-service").unwrap()
}

#[tokio::test]
async fn test_scheme() {
    let (watcher, _tx) = MockWatcher::new();
    let builder = DiscoveryResolverBuilder::new(Arc::new(MockDiscovery { watcher }));
    assert_eq!(builder.scheme(), "discovery");
}

#[tokio::test]
async fn test_filters_endpoints_by_protocol_and_security() {
    let (watcher, tx) = MockWatcher::new();
    let builder = DiscoveryResolverBuilder::new(Arc::new(MockDiscovery { watcher }))
        .with_insecure(true);
    let sink = RecordingSink::new();

    let resolver = builder.build(&user_service_target(), sink.clone()).await.unwrap();

    let instance = ServiceInstance::new("user-service")
        .with_id("ins-1")
        .with_endpoint("grpc://10.0.0.1:9000?insecure=true")
        .with_endpoint("http://10.0.0.1:8080")
        .with_metadata("zone", "cn-east-1");
    tx.send(Ok(vec![instance.clone()])).unwrap();

    let states = sink.wait_for_updates(1, Duration::from_secs(2)).await;
    assert_eq!(states[0].addresses.len(), 1);
    let address = &states[0].addresses[0];
    assert_eq!(address.addr, "10.0.0.1:9000");
    assert_eq!(address.server_name, "user-service");
    assert_eq!(address.attributes.get("zone").unwrap(), "cn-east-1");
    assert_eq!(address.instance.as_ref().unwrap(), &instance);

    resolver.close().await;
}

#[tokio::test]
async fn test_deduplicates_hosts_across_instances() {
    let (watcher, tx) = MockWatcher::new();
    let builder = DiscoveryResolverBuilder::new(Arc::new(MockDiscovery { watcher }))
        .with_insecure(true);
    let sink = RecordingSink::new();

    let resolver = builder.build(&user_service_target(), sink.clone()).await.unwrap();

    let a = ServiceInstance::new("user-service")
        .with_id("ins-1")
        .with_endpoint("grpc://10.0.0.1:9000?insecure=true");
    let b = ServiceInstance::new("user-service")
        .with_id("ins-2")
        .with_endpoint("grpc://10.0.0.1:9000?insecure=true");
    let c = ServiceInstance::new("user-service")
        .with_id("ins-3")
        .with_endpoint("grpc://10.0.0.2:9000?insecure=true");
    tx.send(Ok(vec![a, b, c])).unwrap();

    let states = sink.wait_for_updates(1, Duration::from_secs(2)).await;
    let addrs: Vec<&str> = states[0].addresses.iter().map(|a| a.addr.as_str()).collect();
    assert_eq!(addrs, vec!["10.0.0.1:9000", "10.0.0.2:9000"]);

    resolver.close().await;
}

#[tokio::test]
async fn test_empty_filtered_set_keeps_previous_state() {
    let (watcher, tx) = MockWatcher::new();
    let builder = DiscoveryResolverBuilder::new(Arc::new(MockDiscovery { watcher }))
        .with_insecure(true);
    let sink = RecordingSink::new();

    let resolver = builder.build(&user_service_target(), sink.clone()).await.unwrap();

    let good = ServiceInstance::new("user-service")
        .with_id("ins-1")
        .with_endpoint("grpc://10.0.0.1:9000?insecure=true");
    tx.send(Ok(vec![good])).unwrap();
    sink.wait_for_updates(1, Duration::from_secs(2)).await;

    // 只有 http 端点的实例集被整体过滤掉，不应产生新的推送
    let http_only = ServiceInstance::new("user-service")
        .with_id("ins-2")
        .with_endpoint("http://10.0.0.2:8080");
    tx.send(Ok(vec![http_only])).unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(sink.published().len(), 1);

    resolver.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_build_timeout() {
    let builder = DiscoveryResolverBuilder::new(Arc::new(StuckDiscovery))
        .with_timeout(Duration::from_millis(100));
    let sink = RecordingSink::new();

    assert!(matches!(
        builder.build(&user_service_target(), sink).await,
        Err(ClientError::ResolveTimeout)
    ));
}

#[tokio::test]
async fn test_transient_watch_error_retries() {
    let (watcher, tx) = MockWatcher::new();
    let builder = DiscoveryResolverBuilder::new(Arc::new(MockDiscovery { watcher }))
        .with_insecure(true);
    let sink = RecordingSink::new();

    let resolver = builder.build(&user_service_target(), sink.clone()).await.unwrap();

    // 第一次 next 返回瞬时错误，循环应退避后继续
    tx.send(Err(ClientError::watch("etcd unavailable"))).unwrap();
    let good = ServiceInstance::new("user-service")
        .with_id("ins-1")
        .with_endpoint("grpc://10.0.0.1:9000?insecure=true");
    tx.send(Ok(vec![good])).unwrap();

    let states = sink.wait_for_updates(1, Duration::from_secs(3)).await;
    assert_eq!(states[0].addresses[0].addr, "10.0.0.1:9000");

    resolver.close().await;
}

#[tokio::test]
async fn test_unrecoverable_watch_error_stops_loop() {
    let (watcher, tx) = MockWatcher::new();
    let builder = DiscoveryResolverBuilder::new(Arc::new(MockDiscovery { watcher }))
        .with_insecure(true);
    let sink = RecordingSink::new();

    let resolver = builder.build(&user_service_target(), sink.clone()).await.unwrap();

    // 不可重试错误终止循环，之后的事件不会再被消费
    tx.send(Err(ClientError::invalid_endpoint("bad uri"))).unwrap();
    let late = ServiceInstance::new("user-service")
        .with_id("ins-1")
        .with_endpoint("grpc://10.0.0.1:9000?insecure=true");
    tx.send(Ok(vec![late])).unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(sink.published().is_empty());

    resolver.close().await;
}

#[tokio::test]
async fn test_close_is_idempotent_and_stops_watcher() {
    let (watcher, tx) = MockWatcher::new();
    let builder = DiscoveryResolverBuilder::new(Arc::new(MockDiscovery {
        watcher: watcher.clone(),
    }))
    .with_insecure(true);
    let sink = RecordingSink::new();

    let resolver = builder.build(&user_service_target(), sink.clone()).await.unwrap();

    resolver.close().await;
    resolver.close().await;
    assert_eq!(watcher.stop_count.load(Ordering::SeqCst), 1);

    // 关闭后循环已退出，后续事件不会再产生推送
    let late = ServiceInstance::new("user-service")
        .with_id("ins-1")
        .with_endpoint("grpc://10.0.0.1:9000?insecure=true");
    tx.send(Ok(vec![late])).unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(sink.published().is_empty());
}

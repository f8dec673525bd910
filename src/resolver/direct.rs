//! 直连地址解析器
//!
//! 把 target 的路径按逗号拆成静态端点列表，构建时推送一次，
//! 之后没有任何需要监视的内容。
//!
//! 示例 target：`direct:///127.0.0.1:8080,127.0.0.1:8081`

use crate::error::{ClientError, Result};
use crate::resolver::{Address, AddressSink, Resolver, ResolverBuilder, ResolverState, Target};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

/// direct 解析器的 scheme
pub const SCHEME: &str = "direct";

/// 直连解析器构建器
#[derive(Debug, Default)]
pub struct DirectResolverBuilder;

impl DirectResolverBuilder {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ResolverBuilder for DirectResolverBuilder {
    fn scheme(&self) -> &'static str {
        SCHEME
    }

    async fn build(
        &self,
        target: &Target,
        sink: Arc<dyn AddressSink>,
    ) -> Result<Box<dyn Resolver>> {
        let mut seen = HashSet::new();
        let addresses: Vec<Address> = target
            .endpoint()
            .split(',')
            .filter(|endpoint| !endpoint.is_empty())
            .filter(|endpoint| seen.insert(endpoint.to_string()))
            .map(Address::new)
            .collect();

        if addresses.is_empty() {
            return Err(ClientError::resolver("direct resolver: no endpoints provided"));
        }

        sink.update_state(ResolverState { addresses })
            .map_err(|e| ClientError::resolver(format!("direct resolver: update state failed: {e}")))?;

        Ok(Box::new(DirectResolver))
    }
}

/// 直连解析器
///
/// 直接模式不需要监视服务变更，两个方法都是空实现
struct DirectResolver;

#[async_trait]
impl Resolver for DirectResolver {
    fn resolve_now(&self) {}

    async fn close(&self) {}
}

//! 服务注册发现 Trait 定义

use crate::error::Result;
use crate::registry::instance::ServiceInstance;
use async_trait::async_trait;
use std::sync::Arc;

/// 服务注册
///
/// 由应用层在启动/退出时调用，路由核心本身不使用
#[async_trait]
pub trait Registrar: Send + Sync {
    /// 注册服务实例
    async fn register(&self, instance: &ServiceInstance) -> Result<()>;

    /// 注销服务实例
    async fn deregister(&self, instance: &ServiceInstance) -> Result<()>;
}

/// 服务发现
#[async_trait]
pub trait Discovery: Send + Sync {
    /// 按服务名返回当前已知的实例列表
    async fn get_service(&self, service_name: &str) -> Result<Vec<ServiceInstance>>;

    /// 按服务名创建 watcher
    async fn watch(&self, service_name: &str) -> Result<Arc<dyn Watcher>>;
}

/// 服务监听
///
/// 阻塞拉取接口：
/// 1. 首次监听时，如果实例列表非空，立即返回当前列表
/// 2. 实例列表发生变化时，返回变化后的列表
/// 3. 否则阻塞，直到超时或收到取消信号（返回 `ClientError::Cancelled`）
#[async_trait]
pub trait Watcher: Send + Sync {
    /// 获取服务实例列表
    async fn next(&self) -> Result<Vec<ServiceInstance>>;

    /// 停止监听，可重复调用
    async fn stop(&self) -> Result<()>;
}

/// 心跳检测
#[async_trait]
pub trait Heartbeat: Send + Sync {
    /// 向注册中心上报实例心跳
    async fn heartbeat(&self, instance: &ServiceInstance) -> Result<()>;
}

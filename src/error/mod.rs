//! Flare Client Core 错误处理模块
//!
//! 提供路由层统一的错误类型：节点选择错误同步返回给调用方，
//! 解析/监听错误在内部记录并重试，不会打断进行中的 RPC。

use thiserror::Error;

/// 客户端路由层统一错误类型
#[derive(Error, Debug)]
pub enum ClientError {
    /// 候选节点列表为空，或算法过滤后没有可用节点
    #[error("no available node")]
    NoAvailable,

    /// 在超时时间内未能从注册中心创建 watcher
    #[error("discovery create watcher timeout")]
    ResolveTimeout,

    /// 上下文取消，视为正常关闭信号
    #[error("operation cancelled")]
    Cancelled,

    /// 端点 URI 无法解析
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// 解析器错误（构建失败、地址推送失败等）
    #[error("resolver error: {0}")]
    Resolver(String),

    /// 服务监听错误（Watcher.next 返回的非取消错误）
    #[error("watch error: {0}")]
    Watch(String),

    /// 服务注册错误
    #[error("registry error: {0}")]
    Registry(String),
}

impl ClientError {
    /// 创建解析器错误
    pub fn resolver(msg: impl Into<String>) -> Self {
        ClientError::Resolver(msg.into())
    }

    /// 创建监听错误
    pub fn watch(msg: impl Into<String>) -> Self {
        ClientError::Watch(msg.into())
    }

    /// 创建注册中心错误
    pub fn registry(msg: impl Into<String>) -> Self {
        ClientError::Registry(msg.into())
    }

    /// 创建端点解析错误
    pub fn invalid_endpoint(msg: impl Into<String>) -> Self {
        ClientError::InvalidEndpoint(msg.into())
    }

    /// 是否为取消信号
    ///
    /// watch 循环收到取消信号时干净退出，不记录错误日志
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::Cancelled)
    }

    /// 是否可在 watch 循环内本地重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Watch(_) | ClientError::Registry(_))
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, ClientError>;

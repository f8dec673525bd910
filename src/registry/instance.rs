//! 服务实例定义

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 服务实例
///
/// 注册中心产出的一条服务记录，描述一个正在运行、可寻址的进程。
/// 交给路由层后视为不可变值类型。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceInstance {
    /// 实例唯一标识
    pub id: String,

    /// 服务名称
    pub name: String,

    /// 服务版本
    pub version: String,

    /// 实例端点列表
    ///
    /// 每个端点是一个 URI，如 "http://127.0.0.1:8080"、"grpc://127.0.0.1:9000?insecure=true"，
    /// 同一个实例可以同时暴露多种协议
    pub endpoints: Vec<String>,

    /// 实例元数据
    pub metadata: HashMap<String, String>,

    /// 自定义标签
    pub tags: Vec<String>,
}

impl ServiceInstance {
    /// 创建新的服务实例，自动生成实例 ID
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            version: String::new(),
            endpoints: Vec::new(),
            metadata: HashMap::new(),
            tags: Vec::new(),
        }
    }

    /// 设置实例 ID
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// 设置版本
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// 添加端点
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoints.push(endpoint.into());
        self
    }

    /// 添加元数据
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// 添加标签
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

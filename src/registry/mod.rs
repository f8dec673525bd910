//! 服务注册发现模块
//!
//! 定义路由核心消费的注册中心契约（`Discovery`/`Watcher`）以及
//! 应用层使用的注册契约（`Registrar`）。具体后端（etcd、consul 等）
//! 在各自的 crate 中实现这些 trait。

pub mod instance;
pub mod trait_def;

pub use instance::ServiceInstance;
pub use trait_def::{Discovery, Heartbeat, Registrar, Watcher};

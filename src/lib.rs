//! Flare IM Client Core Library
//!
//! Provides the client-side request routing layer for RPC clients:
//! address resolution (static "direct" and registry-backed "discovery")
//! and per-call node selection with pluggable load balancing algorithms.

pub mod error;
pub mod registry;
pub mod resolver;
pub mod selector;

// Re-exports
pub use error::{ClientError, Result};
pub use registry::{Discovery, Heartbeat, Registrar, ServiceInstance, Watcher};
pub use resolver::{
    Address, AddressSink, DirectResolverBuilder, DiscoveryResolver, DiscoveryResolverBuilder,
    Resolver, ResolverBuilder, ResolverState, Target, WatchSink,
};
pub use selector::{
    BalancePolicy, Balancer, BalancerBuilder, DoneFunc, DoneInfo, RouteContext, Selector,
    SelectorBuilder, WeightedNode, WeightedNodeBuilder,
};
pub use selector::node::{DirectNodeBuilder, EwmaNodeBuilder};

//! 端点 URI 工具
//!
//! 实例端点形如 `grpc://10.0.0.1:9000?insecure=true`：
//! scheme 标识协议，host 是连接地址，安全标志放在 query 里。

use crate::error::{ClientError, Result};
use url::Url;

/// 构造端点 URI
pub fn new_endpoint(scheme: &str, host: &str, insecure: bool) -> String {
    if insecure {
        format!("{scheme}://{host}?insecure=true")
    } else {
        format!("{scheme}://{host}")
    }
}

/// 判断端点是否声明为非安全连接
pub fn is_insecure(url: &Url) -> bool {
    url.query_pairs()
        .find(|(k, _)| k == "insecure")
        .and_then(|(_, v)| v.parse::<bool>().ok())
        .unwrap_or(false)
}

/// 从端点列表中取出第一个协议与安全模式都匹配的 host
///
/// 没有匹配项时返回 `Ok(None)`，由调用方决定跳过该实例；
/// URI 无法解析时返回 `InvalidEndpoint`。
pub fn parse_endpoint(endpoints: &[String], scheme: &str, insecure: bool) -> Result<Option<String>> {
    for endpoint in endpoints {
        let url = Url::parse(endpoint)
            .map_err(|e| ClientError::invalid_endpoint(format!("{endpoint}: {e}")))?;
        if url.scheme() == scheme && is_insecure(&url) == insecure {
            let host = url.host_str().unwrap_or_default();
            if host.is_empty() {
                continue;
            }
            return Ok(Some(match url.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            }));
        }
    }
    Ok(None)
}

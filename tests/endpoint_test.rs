//! 端点工具与 target 解析测试

use flare_client_core::resolver::endpoint::{is_insecure, new_endpoint, parse_endpoint};
use flare_client_core::{ClientError, Target};
use url::Url;

#[test]
fn test_new_endpoint() {
    assert_eq!(
        new_endpoint("grpc", "10.0.0.1:9000", true),
        "grpc://10.0.0.1:9000?insecure=true"
    );
    assert_eq!(new_endpoint("http", "10.0.0.1:8080", false), "http://10.0.0.1:8080");
}

#[test]
fn test_is_insecure() {
    assert!(is_insecure(&Url::parse("grpc://h:1?insecure=true").unwrap()));
    assert!(!is_insecure(&Url::parse("grpc://h:1").unwrap()));
    assert!(!is_insecure(&Url::parse("grpc://h:1?insecure=false").unwrap()));
    // 非法布尔值按安全处理
    assert!(!is_insecure(&Url::parse("grpc://h:1?insecure=maybe").unwrap()));
}

#[test]
fn test_parse_endpoint_picks_first_match() {
    let endpoints = vec![
        "http://10.0.0.1:8080".to_string(),
        "grpc://10.0.0.1:9000?insecure=true".to_string(),
        "grpc://10.0.0.2:9000?insecure=true".to_string(),
    ];
    let host = parse_endpoint(&endpoints, "grpc", true).unwrap();
    assert_eq!(host.as_deref(), Some("10.0.0.1:9000"));
}

#[test]
fn test_parse_endpoint_respects_security_mode() {
    let endpoints = vec!["grpc://10.0.0.1:9000?insecure=true".to_string()];
    // 安全模式下不接受 insecure 端点
    assert_eq!(parse_endpoint(&endpoints, "grpc", false).unwrap(), None);
    // 协议不匹配同样没有结果
    assert_eq!(parse_endpoint(&endpoints, "http", true).unwrap(), None);
}

#[test]
fn test_parse_endpoint_invalid_uri() {
    let endpoints = vec!["not a uri".to_string()];
    let err = parse_endpoint(&endpoints, "grpc", false).unwrap_err();
    assert!(matches!(err, ClientError::InvalidEndpoint(_)));
}

#[test]
fn test_target_parse() {
    let target = Target::parse("direct:///10.0.0.1:9000,10.0.0.2:9000").unwrap();
    assert_eq!(target.scheme, "direct");
    assert_eq!(target.endpoint(), "10.0.0.1:9000,10.0.0.2:9000");

    let target = Target::parse("discovery:///user-service").unwrap();
    assert_eq!(target.scheme, "discovery");
    assert_eq!(target.endpoint(), "user-service");
}

#[test]
fn test_target_parse_invalid() {
    assert!(Target::parse("not a target").is_err());
}

//! Proxy tests
//!
//! Covers:
//! - URL binding and unbound proxies
//! - User-Agent handling
//! - Configuration from serde and the builder
//! - Proxy-wide prepare hooks

mod common;

use common::ScriptedExecutor;
use restproxy::http::CallConfig;
use restproxy::{CallError, CallState, ProxyConfig, RestProxy};
use std::sync::Arc;

#[test]
fn test_unbound_proxy_rejects_calls() {
    let executor = ScriptedExecutor::always_ok();
    let proxy = RestProxy::builder()
        .url_format("http://{}.example.com/")
        .binding_required(true)
        .executor(executor.clone())
        .build();
    let call = proxy.new_call();

    assert_eq!(call.call_sync(), Err(CallError::Unbound));
    assert_eq!(call.state(), CallState::Idle);
    assert_eq!(executor.started(), 0);

    proxy.bind(&["eu"]).unwrap();
    call.set_function(Some("status"));
    call.call_sync().unwrap();
    assert_eq!(
        executor.last_request().unwrap().uri,
        "http://eu.example.com/status"
    );
}

#[test]
fn test_rebinding_affects_later_calls() {
    let executor = ScriptedExecutor::always_ok();
    let proxy = RestProxy::builder()
        .url_format("http://api.example.com/{}/")
        .binding_required(true)
        .executor(executor.clone())
        .build();

    proxy.bind(&["v1"]).unwrap();
    proxy.new_call().call_sync().unwrap();
    proxy.bind(&["v2"]).unwrap();
    proxy.new_call().call_sync().unwrap();

    let uris: Vec<String> = executor.requests().into_iter().map(|r| r.uri).collect();
    assert_eq!(
        uris,
        vec!["http://api.example.com/v1/", "http://api.example.com/v2/"]
    );
}

#[test]
fn test_user_agent_applied_and_overridable() {
    let executor = ScriptedExecutor::always_ok();
    let proxy = RestProxy::builder()
        .url_format("http://api.example.com/")
        .user_agent("restproxy-test/1.0")
        .executor(executor.clone())
        .build();

    proxy.new_call().call_sync().unwrap();
    assert_eq!(
        executor.last_request().unwrap().header("user-agent"),
        Some("restproxy-test/1.0")
    );

    let call = proxy.new_call();
    call.add_header("User-Agent", "custom/2.0");
    call.call_sync().unwrap();
    assert_eq!(
        executor.last_request().unwrap().header("user-agent"),
        Some("custom/2.0")
    );

    proxy.set_user_agent(None);
    proxy.new_call().call_sync().unwrap();
    assert!(executor.last_request().unwrap().header("user-agent").is_none());
}

#[test]
fn test_config_from_json() {
    let config: ProxyConfig = serde_json::from_str(
        r#"{
            "url_format": "http://{}.svc.local/",
            "binding_required": true,
            "user_agent": "svc/3"
        }"#,
    )
    .unwrap();
    let executor = ScriptedExecutor::always_ok();
    let proxy = RestProxy::with_config(config, executor.clone());

    assert!(proxy.binding_required());
    assert_eq!(proxy.url_format(), "http://{}.svc.local/");
    proxy.bind(&["orders"]).unwrap();
    proxy.new_call().call_sync().unwrap();

    let request = executor.last_request().unwrap();
    assert_eq!(request.uri, "http://orders.svc.local/");
    assert_eq!(request.header("user-agent"), Some("svc/3"));
}

#[test]
fn test_proxy_prepare_hook_applies_to_new_calls() {
    let executor = ScriptedExecutor::always_ok();
    let proxy = RestProxy::builder()
        .url_format("http://api.example.com/")
        .executor(executor.clone())
        .prepare_hook(Arc::new(
            |_: &str, config: &mut CallConfig| -> Result<(), CallError> {
                config
                    .params_mut()
                    .add(restproxy::Param::string("api_key", "k1"));
                Ok(())
            },
        ))
        .build();

    let call = proxy.new_call();
    call.set_function(Some("me"));
    call.call_sync().unwrap();
    assert_eq!(
        executor.last_request().unwrap().uri,
        "http://api.example.com/me?api_key=k1"
    );
    assert!(call.lookup_param("api_key").is_some());
}

#[test]
fn test_calls_share_proxy() {
    let proxy = RestProxy::builder()
        .url_format("http://api.example.com/")
        .executor(ScriptedExecutor::always_ok())
        .build();
    let call = proxy.new_call();
    assert!(Arc::ptr_eq(call.proxy(), &proxy));
    drop(proxy);
    assert_eq!(call.proxy().url_format(), "http://api.example.com/");
}

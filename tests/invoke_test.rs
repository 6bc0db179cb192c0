//! Future-style execution tests
//!
//! Covers:
//! - `invoke` / `invoke_finish` success and failure
//! - Call state across resolve and finish
//! - Rejections delivered through the result
//! - Foreign and abandoned results

mod common;

use common::{Reply, ScriptedExecutor};
use restproxy::{CallError, CallState, ErrorKind, NetError, ProxyCall, RestProxy};
use std::sync::Arc;
use std::time::Duration;

fn proxy_with(executor: Arc<ScriptedExecutor>) -> Arc<RestProxy> {
    RestProxy::builder()
        .url_format("http://svc.example.com/api/")
        .executor(executor)
        .build()
}

fn call_with(executor: Arc<ScriptedExecutor>) -> ProxyCall {
    proxy_with(executor).new_call()
}

#[tokio::test]
async fn test_invoke_success() {
    let call = call_with(ScriptedExecutor::new([Reply::ok("[1,2,3]")]));
    call.set_function(Some("list"));

    let result = call.invoke(None).await;
    assert_eq!(call.state(), CallState::InFlight);
    assert!(call.invoke_finish(result).is_ok());
    assert_eq!(call.state(), CallState::Completed);
    assert_eq!(call.payload().unwrap(), "[1,2,3]");
    assert_eq!(call.status_code(), 200);
}

#[tokio::test]
async fn test_invoke_http_error() {
    let call = call_with(ScriptedExecutor::new([Reply::status(404, "")]));

    let result = call.invoke(None).await;
    let err = call.invoke_finish(result).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Http);
    assert_eq!(err.status_code(), Some(404));
    assert_eq!(err.reason(), Some("Not Found"));
}

#[tokio::test]
async fn test_invoke_transport_error() {
    let call = call_with(ScriptedExecutor::new([Reply::Fail(NetError::SslFailed)]));

    let result = call.invoke(None).await;
    let err = call.invoke_finish(result).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Tls);
    assert_eq!(call.status_code(), NetError::SslFailed.as_u32());
}

#[tokio::test]
async fn test_invoke_while_in_flight() {
    let executor = ScriptedExecutor::delayed(Duration::from_millis(100), [Reply::ok("first")]);
    let call = call_with(executor.clone());

    let first = call.invoke(None);
    let second = call.invoke(None).await;
    assert_eq!(call.invoke_finish(second), Err(CallError::AlreadyInProgress));
    assert_eq!(call.state(), CallState::InFlight);

    let first = first.await;
    assert!(call.invoke_finish(first).is_ok());
    assert_eq!(call.payload().unwrap(), "first");
    assert_eq!(executor.started(), 1);
}

#[tokio::test]
async fn test_build_error_delivered_through_result() {
    let executor = ScriptedExecutor::always_ok();
    let call = call_with(executor.clone());
    call.set_method("NOT VALID");

    let result = call.invoke(None).await;
    assert!(matches!(
        call.invoke_finish(result),
        Err(CallError::InvalidMethod(_))
    ));
    assert_eq!(call.state(), CallState::Idle);
    assert_eq!(executor.started(), 0);
}

#[tokio::test]
async fn test_foreign_result_rejected() {
    let proxy = proxy_with(ScriptedExecutor::always_ok());
    let first = proxy.new_call();
    let second = proxy.new_call();

    let result = first.invoke(None).await;
    assert_eq!(second.invoke_finish(result), Err(CallError::ForeignResult));
    assert_eq!(second.state(), CallState::Idle);
}

#[tokio::test]
async fn test_dropped_result_releases_call() {
    let call = call_with(ScriptedExecutor::new([Reply::ok("a"), Reply::ok("b")]));

    let result = call.invoke(None).await;
    assert_eq!(call.state(), CallState::InFlight);
    drop(result);
    assert_eq!(call.state(), CallState::Completed);

    let result = call.invoke(None).await;
    assert!(call.invoke_finish(result).is_ok());
    assert_eq!(call.payload().unwrap(), "b");
}

#[tokio::test]
async fn test_cancel_invocation() {
    let call = call_with(ScriptedExecutor::new([Reply::Hang]));

    let invocation = call.invoke(None);
    call.cancel().unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), invocation)
        .await
        .unwrap();
    let err = call.invoke_finish(result).unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(call.status_code(), 1);
}

#[test]
fn test_invoke_outside_runtime() {
    let call = call_with(ScriptedExecutor::always_ok());

    let result = futures::executor::block_on(call.invoke(None));
    assert!(matches!(call.invoke_finish(result), Err(CallError::Runtime(_))));
    assert_eq!(call.state(), CallState::Idle);
}

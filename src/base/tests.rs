use crate::base::neterror::NetError;

#[test]
fn test_net_error_roundtrip() {
    let original = NetError::CantConnect;
    let code = original.as_u32();
    assert_eq!(code, 4);
    let converted = NetError::from(code);
    assert!(matches!(converted, NetError::CantConnect));

    let resolve = NetError::from(NetError::CantResolveProxy.as_u32());
    assert!(matches!(resolve, NetError::CantResolveProxy));
}

#[test]
fn test_unknown_error() {
    let err = NetError::from(42);
    assert!(matches!(err, NetError::Unknown(42)));
    assert_eq!(err.as_u32(), 42);
}

#[test]
fn test_sentinel_range() {
    // Every named class must stay clear of real HTTP statuses.
    let classes = [
        NetError::Cancelled,
        NetError::CantResolve,
        NetError::CantResolveProxy,
        NetError::CantConnect,
        NetError::CantConnectProxy,
        NetError::SslFailed,
        NetError::IoError,
        NetError::Malformed,
        NetError::TryAgain,
    ];
    for class in classes {
        assert!(NetError::is_sentinel(class.as_u32()), "{class:?}");
    }
    assert!(!NetError::is_sentinel(100));
    assert!(!NetError::is_sentinel(200));
}

#[test]
fn test_display_is_never_empty() {
    assert_eq!(NetError::CantResolve.to_string(), "Could not resolve host name");
    assert!(!NetError::Unknown(77).to_string().is_empty());
}

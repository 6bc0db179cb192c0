//! Connector for the hyper client.
//!
//! TCP comes from hyper-util's [`HttpConnector`]; `https` destinations are
//! then wrapped in a BoringSSL session with peer and hostname verification.

use boring::ssl::{SslConnector, SslMethod};
use http::Uri;
use hyper::rt::{Read, ReadBufCursor, Write};
use hyper_util::client::legacy::connect::{Connected, Connection, HttpConnector};
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::net::TcpStream;
use tokio_boring::SslStream;
use tower::Service;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// TLS setup or handshake failure for one destination.
#[derive(Debug, thiserror::Error)]
#[error("TLS handshake with {host} failed: {message}")]
pub(crate) struct TlsFailure {
    host: String,
    message: String,
}

impl TlsFailure {
    pub(crate) fn new(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            message: message.into(),
        }
    }
}

/// Plain TCP for `http`, TLS over TCP for `https`.
#[derive(Clone)]
pub(crate) struct TlsConnector {
    http: HttpConnector,
}

impl TlsConnector {
    pub(crate) fn new() -> Self {
        let mut http = HttpConnector::new();
        http.set_nodelay(true);
        http.enforce_http(false);
        Self { http }
    }
}

impl Service<Uri> for TlsConnector {
    type Response = MaybeTls;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<MaybeTls, BoxError>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.http.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, dst: Uri) -> Self::Future {
        let mut http = self.http.clone();
        Box::pin(async move {
            let secure = dst.scheme_str() == Some("https");
            let host = dst
                .host()
                .unwrap_or_default()
                .trim_start_matches('[')
                .trim_end_matches(']')
                .to_string();

            let tcp = http.call(dst).await?;
            if !secure {
                return Ok(MaybeTls::Plain(tcp));
            }
            let stream = handshake(&host, tcp.into_inner()).await?;
            Ok(MaybeTls::Tls(TokioIo::new(stream)))
        })
    }
}

async fn handshake(host: &str, tcp: TcpStream) -> Result<SslStream<TcpStream>, TlsFailure> {
    let connector = SslConnector::builder(SslMethod::tls())
        .map_err(|e| TlsFailure::new(host, e.to_string()))?
        .build();
    let config = connector
        .configure()
        .map_err(|e| TlsFailure::new(host, e.to_string()))?;

    tokio_boring::connect(config, host, tcp).await.map_err(|e| {
        tracing::debug!(host = %host, error = ?e, "TLS handshake failed");
        TlsFailure::new(host, format!("{:?}", e))
    })
}

/// Stream handed to hyper by [`TlsConnector`].
pub(crate) enum MaybeTls {
    Plain(TokioIo<TcpStream>),
    Tls(TokioIo<SslStream<TcpStream>>),
}

impl Connection for MaybeTls {
    fn connected(&self) -> Connected {
        match self {
            MaybeTls::Plain(stream) => stream.connected(),
            MaybeTls::Tls(stream) => stream.inner().get_ref().connected(),
        }
    }
}

impl Read for MaybeTls {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: ReadBufCursor<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            MaybeTls::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            MaybeTls::Tls(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

impl Write for MaybeTls {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            MaybeTls::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            MaybeTls::Tls(stream) => Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            MaybeTls::Plain(stream) => Pin::new(stream).poll_flush(cx),
            MaybeTls::Tls(stream) => Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            MaybeTls::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            MaybeTls::Tls(stream) => Pin::new(stream).poll_shutdown(cx),
        }
    }
}

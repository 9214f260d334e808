//! TCP/TLS transport.
//!
//! Owns socket establishment: DNS resolution, TCP connect with
//! keepalive, and the optional TLS wrapper. The result is a
//! [`Framed`] line stream the client splits into its reader and writer
//! halves.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use tokio_rustls::rustls::client::WebPkiServerVerifier;
use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use tokio_rustls::rustls::{self, DigitallySignedStruct, SignatureScheme};
use tokio_rustls::TlsConnector;
use tokio_util::codec::Framed;
use tracing::warn;

use crate::endpoint::ServerEndpoint;
use crate::error::ConnectError;
use crate::line::LineCodec;

/// Decides whether to accept a certificate that failed standard
/// validation. Receives the end-entity certificate in DER form.
pub type CertAcceptHook = Arc<dyn Fn(&CertificateDer<'_>) -> bool + Send + Sync>;

/// TLS behavior knobs.
#[derive(Clone, Default)]
pub struct TlsOptions {
    /// Consulted only when standard verification fails; returning
    /// `true` overrides the failure. Default (`None`) is strict.
    pub accept_hook: Option<CertAcceptHook>,
}

impl std::fmt::Debug for TlsOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsOptions")
            .field("accept_hook", &self.accept_hook.as_ref().map(|_| "..."))
            .finish()
    }
}

/// Either a plain TCP stream or a TLS-wrapped one.
#[allow(clippy::large_enum_variant)]
pub enum IrcStream {
    /// Plaintext connection.
    Tcp(TcpStream),
    /// TLS connection.
    Tls(Box<TlsStream<TcpStream>>),
}

impl AsyncRead for IrcStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            IrcStream::Tcp(stream) => Pin::new(stream).poll_read(cx, buf),
            IrcStream::Tls(stream) => Pin::new(stream.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for IrcStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        match self.get_mut() {
            IrcStream::Tcp(stream) => Pin::new(stream).poll_write(cx, buf),
            IrcStream::Tls(stream) => Pin::new(stream.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            IrcStream::Tcp(stream) => Pin::new(stream).poll_flush(cx),
            IrcStream::Tls(stream) => Pin::new(stream.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            IrcStream::Tcp(stream) => Pin::new(stream).poll_shutdown(cx),
            IrcStream::Tls(stream) => Pin::new(stream.as_mut()).poll_shutdown(cx),
        }
    }
}

/// Establish the socket for an endpoint and frame it with the codec.
pub async fn connect(
    endpoint: &ServerEndpoint,
    tls_options: TlsOptions,
    codec: LineCodec,
) -> Result<Framed<IrcStream, LineCodec>, ConnectError> {
    let stream = TcpStream::connect((endpoint.host.as_str(), endpoint.port)).await?;

    if let Err(err) = enable_keepalive(&stream) {
        warn!(%err, "failed to enable TCP keepalive");
    }

    let stream = if endpoint.use_tls {
        let connector = tls_connector(&tls_options)?;
        let server_name = ServerName::try_from(endpoint.host.clone())
            .map_err(|_| ConnectError::InvalidServerName(endpoint.host.clone()))?;
        let tls = connector.connect(server_name, stream).await?;
        IrcStream::Tls(Box::new(tls))
    } else {
        IrcStream::Tcp(stream)
    };

    Ok(Framed::new(stream, codec))
}

fn enable_keepalive(stream: &TcpStream) -> std::io::Result<()> {
    use socket2::{SockRef, TcpKeepalive};
    use std::time::Duration;

    let sock = SockRef::from(stream);
    let keepalive = TcpKeepalive::new()
        .with_time(Duration::from_secs(120))
        .with_interval(Duration::from_secs(30));

    sock.set_tcp_keepalive(&keepalive)
}

fn tls_connector(options: &TlsOptions) -> Result<TlsConnector, ConnectError> {
    let mut roots = rustls::RootCertStore::empty();
    let native = rustls_native_certs::load_native_certs();
    for err in &native.errors {
        warn!(%err, "skipping unreadable native root certificate");
    }
    for cert in native.certs {
        if let Err(err) = roots.add(cert) {
            warn!(%err, "skipping invalid native root certificate");
        }
    }

    let roots = Arc::new(roots);
    let mut config = rustls::ClientConfig::builder()
        .with_root_certificates(roots.clone())
        .with_no_client_auth();

    if let Some(hook) = options.accept_hook.clone() {
        let inner = WebPkiServerVerifier::builder(roots)
            .build()
            .map_err(|err| {
                ConnectError::Tls(rustls::Error::General(format!(
                    "failed to build certificate verifier: {}",
                    err
                )))
            })?;
        config
            .dangerous()
            .set_certificate_verifier(Arc::new(HookedVerifier { inner, hook }));
    }

    Ok(TlsConnector::from(Arc::new(config)))
}

/// Standard WebPKI verification with a fallback hook for certificates
/// that fail it (self-signed servers and the like).
struct HookedVerifier {
    inner: Arc<WebPkiServerVerifier>,
    hook: CertAcceptHook,
}

impl std::fmt::Debug for HookedVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookedVerifier").finish_non_exhaustive()
    }
}

impl ServerCertVerifier for HookedVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        match self.inner.verify_server_cert(
            end_entity,
            intermediates,
            server_name,
            ocsp_response,
            now,
        ) {
            Ok(verified) => Ok(verified),
            Err(err) => {
                if (self.hook)(end_entity) {
                    warn!(%err, "certificate accepted by hook despite failed validation");
                    Ok(ServerCertVerified::assertion())
                } else {
                    Err(err)
                }
            }
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}

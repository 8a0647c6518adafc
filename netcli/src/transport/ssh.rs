//! Interactive shell over SSH, built on russh.

use std::io;
use std::path::Path;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use log::{debug, info, warn};
use russh::ChannelStream;
use russh::client::{self, Handle, Msg};
use russh::keys::{self, PrivateKeyWithHashAlg, PublicKey};
use secrecy::ExposeSecret;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use super::config::{AuthMethod, HostKeyPolicy, SshConfig};
use crate::error::{Result, TransportError};

/// Log in to the device and start a shell on a pseudo-terminal.
///
/// The returned stream owns the SSH connection; dropping it closes both.
pub async fn open_shell(config: SshConfig) -> Result<SshStream> {
    let mut connection = connect(&config).await?;
    login(&mut connection, &config).await?;

    let channel = connection
        .channel_open_session()
        .await
        .map_err(TransportError::Ssh)?;
    channel
        .request_pty(
            true,
            "vt100",
            config.terminal.columns,
            config.terminal.rows,
            0,
            0,
            &[],
        )
        .await
        .map_err(TransportError::Ssh)?;
    channel
        .request_shell(true)
        .await
        .map_err(TransportError::Ssh)?;

    info!("{}: shell open as '{}'", config.endpoint(), config.username);
    Ok(SshStream {
        inner: Box::pin(channel.into_stream()),
        connection,
    })
}

async fn connect(config: &SshConfig) -> Result<Handle<HostKeyGate>> {
    let client_config = Arc::new(client_config(config));
    let gate = HostKeyGate {
        host: config.host.clone(),
        port: config.port,
        policy: config.host_keys,
        known_hosts: config.known_hosts.clone(),
        refusal: Arc::default(),
    };
    let refusal = gate.refusal.clone();

    debug!("{}: connecting", config.endpoint());
    let attempt = client::connect(client_config, (config.host.as_str(), config.port), gate);
    match tokio::time::timeout(config.connect_timeout, attempt).await {
        Err(_) => Err(TransportError::Timeout(config.connect_timeout).into()),
        Ok(Ok(connection)) => Ok(connection),
        // russh only reports UnknownKey; the gate knows the real reason.
        Ok(Err(e)) => {
            let refused = refusal.lock().ok().and_then(|mut slot| slot.take());
            Err(refused.unwrap_or(TransportError::Ssh(e)).into())
        }
    }
}

fn client_config(config: &SshConfig) -> client::Config {
    client::Config {
        inactivity_timeout: config.inactivity_timeout,
        keepalive_interval: config.keepalive_interval,
        ..Default::default()
    }
}

async fn login(connection: &mut Handle<HostKeyGate>, config: &SshConfig) -> Result<()> {
    let user = config.username.as_str();
    let outcome = match &config.auth {
        AuthMethod::None => connection.authenticate_none(user).await,
        AuthMethod::Password(password) => {
            connection
                .authenticate_password(user, password.expose_secret())
                .await
        }
        AuthMethod::PrivateKey { path, passphrase } => {
            let key = load_key(path, passphrase.as_ref().map(|p| p.expose_secret()))?;
            let rsa_hash = connection
                .best_supported_rsa_hash()
                .await
                .map_err(TransportError::Ssh)?
                .flatten();
            connection
                .authenticate_publickey(user, PrivateKeyWithHashAlg::new(Arc::new(key), rsa_hash))
                .await
        }
    }
    .map_err(TransportError::Ssh)?;

    if outcome.success() {
        Ok(())
    } else {
        Err(TransportError::AuthenticationFailed {
            user: user.to_string(),
        }
        .into())
    }
}

fn load_key(path: &Path, passphrase: Option<&str>) -> Result<keys::PrivateKey> {
    keys::load_secret_key(path, passphrase)
        .map_err(|e| TransportError::Key(format!("{}: {}", path.display(), e)).into())
}

/// Shell channel of an SSH connection, usable as a
/// [`Transport`](super::Transport).
pub struct SshStream {
    inner: Pin<Box<ChannelStream<Msg>>>,
    connection: Handle<HostKeyGate>,
}

impl SshStream {
    /// Say goodbye to the server instead of just dropping the socket.
    pub async fn disconnect(self) -> Result<()> {
        self.connection
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(TransportError::Ssh)?;
        Ok(())
    }
}

impl AsyncRead for SshStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        self.inner.as_mut().poll_read(cx, buf)
    }
}

impl AsyncWrite for SshStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.inner.as_mut().poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.inner.as_mut().poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.inner.as_mut().poll_shutdown(cx)
    }
}

/// russh client handler that applies the [`HostKeyPolicy`].
struct HostKeyGate {
    host: String,
    port: u16,
    policy: HostKeyPolicy,
    known_hosts: Option<std::path::PathBuf>,
    refusal: Arc<Mutex<Option<TransportError>>>,
}

impl HostKeyGate {
    /// `Ok(true)` when the key is on record, `Ok(false)` when the host is not.
    fn is_known(&self, key: &PublicKey) -> std::result::Result<bool, TransportError> {
        let checked = match &self.known_hosts {
            Some(path) => keys::check_known_hosts_path(&self.host, self.port, key, path),
            None => keys::check_known_hosts(&self.host, self.port, key),
        };
        checked.map_err(|e| match e {
            keys::Error::KeyChanged { line } => TransportError::HostKeyChanged {
                host: self.host.clone(),
                port: self.port,
                line,
            },
            other => TransportError::KnownHosts(other.to_string()),
        })
    }

    fn remember(&self, key: &PublicKey) {
        let learned = match &self.known_hosts {
            Some(path) => keys::known_hosts::learn_known_hosts_path(&self.host, self.port, key, path),
            None => keys::known_hosts::learn_known_hosts(&self.host, self.port, key),
        };
        if let Err(e) = learned {
            warn!("{}:{}: host key not recorded: {}", self.host, self.port, e);
        }
    }

    fn verdict(&self, key: &PublicKey) -> std::result::Result<(), TransportError> {
        match (self.policy, self.is_known(key)) {
            (HostKeyPolicy::AcceptAny, _) => Ok(()),
            (_, Ok(true)) => Ok(()),
            (HostKeyPolicy::TrustOnFirstUse, Ok(false)) => {
                self.remember(key);
                Ok(())
            }
            (HostKeyPolicy::Strict, Ok(false)) => Err(TransportError::HostKeyUnknown {
                host: self.host.clone(),
                port: self.port,
            }),
            (_, Err(e)) => Err(e),
        }
    }
}

impl client::Handler for HostKeyGate {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        match self.verdict(server_public_key) {
            Ok(()) => Ok(true),
            Err(refused) => {
                warn!("{}:{}: {}", self.host, self.port, refused);
                if let Ok(mut slot) = self.refusal.lock() {
                    *slot = Some(refused);
                }
                Ok(false)
            }
        }
    }
}

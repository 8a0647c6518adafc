//! Builder for opening sessions.

use std::path::PathBuf;
use std::time::Duration;

use log::info;
use secrecy::SecretString;

use super::config::SessionConfig;
use super::executor::SessionHandle;
use super::initializer::initialize;
use super::session::Session;
use crate::error::{DriverError, Result};
use crate::platform::{DeviceFamily, get_family};
use crate::transport::{AuthMethod, HostKeyPolicy, SshConfig, TerminalSize, Transport, open_shell};

/// Builder for constructing sessions.
///
/// # Example
///
/// ```rust,no_run
/// use netcli::driver::{Context, SessionBuilder};
///
/// # async fn example() -> Result<(), netcli::Error> {
/// let session = SessionBuilder::new("192.168.1.1")
///     .username("admin")
///     .password("secret")
///     .enable_secret("enable-secret")
///     .family("cisco_ios")
///     .connect()
///     .await?;
///
/// let version = session.read("show version", &Context::new("inventory")).await?;
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder {
    host: String,
    port: u16,
    username: Option<String>,
    auth: AuthMethod,
    enable_secret: Option<SecretString>,
    family_name: Option<String>,
    custom_family: Option<DeviceFamily>,
    device_id: Option<String>,
    config: SessionConfig,
    connect_timeout: Duration,
    keepalive_interval: Option<Duration>,
    terminal: TerminalSize,
    host_keys: HostKeyPolicy,
    known_hosts: Option<PathBuf>,
}

impl SessionBuilder {
    /// Create a new session builder for the specified host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: None,
            auth: AuthMethod::None,
            enable_secret: None,
            family_name: None,
            custom_family: None,
            device_id: None,
            config: SessionConfig::default(),
            connect_timeout: Duration::from_secs(30),
            keepalive_interval: Some(Duration::from_secs(30)),
            terminal: TerminalSize::default(),
            host_keys: HostKeyPolicy::default(),
            known_hosts: None,
        }
    }

    /// Set the SSH port (default: 22).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the username for authentication.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set password authentication.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.auth = AuthMethod::Password(SecretString::from(password.into()));
        self
    }

    /// Set private key authentication.
    pub fn private_key(mut self, key_path: impl Into<PathBuf>) -> Self {
        self.auth = AuthMethod::PrivateKey {
            path: key_path.into(),
            passphrase: None,
        };
        self
    }

    /// Set private key authentication with passphrase.
    pub fn private_key_with_passphrase(
        mut self,
        key_path: impl Into<PathBuf>,
        passphrase: impl Into<String>,
    ) -> Self {
        self.auth = AuthMethod::PrivateKey {
            path: key_path.into(),
            passphrase: Some(SecretString::from(passphrase.into())),
        };
        self
    }

    /// Secret sent when privilege elevation prompts for one.
    pub fn enable_secret(mut self, secret: impl Into<String>) -> Self {
        self.enable_secret = Some(SecretString::from(secret.into()));
        self
    }

    /// Set the family name (e.g., "cisco_ios", "juniper_junos").
    pub fn family(mut self, family: impl Into<String>) -> Self {
        self.family_name = Some(family.into());
        self
    }

    /// Use a family that is not in the registry.
    pub fn custom_family(mut self, family: DeviceFamily) -> Self {
        self.custom_family = Some(family);
        self
    }

    /// Identifier used in logs and errors (default: the host).
    pub fn device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    /// Replace the session timing configuration.
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the default per-command timeout.
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.config.command_timeout = timeout;
        self
    }

    /// Set the SSH connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the SSH keepalive interval; `None` turns keepalives off.
    pub fn keepalive_interval(mut self, interval: Option<Duration>) -> Self {
        self.keepalive_interval = interval;
        self
    }

    /// Set terminal dimensions.
    pub fn terminal_size(mut self, columns: u32, rows: u32) -> Self {
        self.terminal = TerminalSize { columns, rows };
        self
    }

    pub fn host_keys(mut self, policy: HostKeyPolicy) -> Self {
        self.host_keys = policy;
        self
    }

    pub fn known_hosts(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts = Some(path.into());
        self
    }

    fn resolve_family(&mut self) -> Result<DeviceFamily> {
        if let Some(custom) = self.custom_family.take() {
            return Ok(custom);
        }
        match &self.family_name {
            Some(name) => get_family(name),
            None => Err(DriverError::InvalidConfig {
                message: "device family must be specified".to_string(),
            }
            .into()),
        }
    }

    /// Connect over SSH, run the handshake and start the session worker.
    pub async fn connect(self) -> Result<SessionHandle> {
        let username = self.username.clone().ok_or_else(|| DriverError::InvalidConfig {
            message: "username is required".to_string(),
        })?;
        self.config.validate()?;

        let mut builder = self;
        let ssh = SshConfig {
            port: builder.port,
            auth: std::mem::replace(&mut builder.auth, AuthMethod::None),
            connect_timeout: builder.connect_timeout,
            keepalive_interval: builder.keepalive_interval,
            terminal: builder.terminal,
            host_keys: builder.host_keys,
            known_hosts: builder.known_hosts.take(),
            ..SshConfig::new(builder.host.clone(), username)
        };

        let stream = open_shell(ssh).await?;
        builder.open(stream).await
    }

    /// Run the handshake over an already established stream and start the
    /// session worker.
    pub async fn open(mut self, stream: impl Transport + 'static) -> Result<SessionHandle> {
        self.config.validate()?;
        let family = self.resolve_family()?;
        let device_id = self.device_id.take().unwrap_or_else(|| self.host.clone());

        let mut session = Session::new(device_id, family, stream, self.config);
        if let Some(secret) = self.enable_secret {
            session = session.with_enable_secret(secret);
        }

        initialize(&mut session).await?;
        info!(
            "{}: session open ({})",
            session.device_id(),
            session.family().name
        );
        SessionHandle::spawn(session)
    }
}

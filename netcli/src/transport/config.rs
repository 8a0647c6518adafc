//! SSH login parameters.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

/// What to do with the server's host key, in the spirit of OpenSSH's
/// `StrictHostKeyChecking`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HostKeyPolicy {
    /// The key must already be in known_hosts.
    Strict,

    /// Record keys of hosts seen for the first time; a changed key is
    /// still refused.
    #[default]
    TrustOnFirstUse,

    /// Take whatever key the server offers. Lab devices only.
    AcceptAny,
}

/// Credentials presented to the device.
#[derive(Debug)]
pub enum AuthMethod {
    /// `none` authentication; some lab images and console servers allow it.
    None,

    Password(SecretString),

    /// Key file on disk, optionally encrypted.
    PrivateKey {
        path: PathBuf,
        passphrase: Option<SecretString>,
    },
}

/// Size of the pseudo-terminal requested for the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalSize {
    pub columns: u32,
    pub rows: u32,
}

impl Default for TerminalSize {
    /// Wide enough that devices do not wrap long configuration lines.
    fn default() -> Self {
        Self {
            columns: 511,
            rows: 24,
        }
    }
}

/// Everything needed to log in to one device over SSH.
#[derive(Debug)]
pub struct SshConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub auth: AuthMethod,

    /// Bound on TCP connect plus key exchange.
    pub connect_timeout: Duration,

    /// Interval between SSH keepalives on an idle session. `None` disables
    /// them.
    pub keepalive_interval: Option<Duration>,

    /// Drop the connection after this long without traffic. `None` keeps
    /// idle sessions open for as long as their owner wants them.
    pub inactivity_timeout: Option<Duration>,

    pub terminal: TerminalSize,
    pub host_keys: HostKeyPolicy,

    /// known_hosts file to use instead of `~/.ssh/known_hosts`.
    pub known_hosts: Option<PathBuf>,
}

impl SshConfig {
    /// Port 22, no credentials, 30 second connect timeout, keepalives every
    /// 30 seconds and no inactivity cut-off.
    pub fn new(host: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: username.into(),
            auth: AuthMethod::None,
            connect_timeout: Duration::from_secs(30),
            keepalive_interval: Some(Duration::from_secs(30)),
            inactivity_timeout: None,
            terminal: TerminalSize::default(),
            host_keys: HostKeyPolicy::default(),
            known_hosts: None,
        }
    }

    /// `host:port`, as used in log lines.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

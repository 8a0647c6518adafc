//! Scripted network device for integration tests.
//!
//! The device sits on the far end of an in-memory duplex pipe. It echoes
//! every line it receives, answers from a table of canned replies and prints
//! its prompt afterwards, the way a vendor CLI does.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use netcli::SessionConfig;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

pub const PAGER: &str = " --More-- ";
pub const ERASE: &str = "\x08\x08\x08\x08\x08\x08\x08\x08\x08\x08          \x08\x08\x08\x08\x08\x08\x08\x08\x08\x08";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Short timings so tests finish quickly.
pub fn fast_config() -> SessionConfig {
    SessionConfig {
        command_timeout: Duration::from_secs(2),
        prompt_timeout: Duration::from_secs(2),
        quiet_period: Duration::from_millis(50),
        handshake_timeout: Duration::from_secs(5),
        shell_settle: Duration::from_millis(100),
        recovery_window: Duration::from_millis(300),
        ..Default::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Received(String),
    PromptSent(String),
}

#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<Event>>>);

impl EventLog {
    fn push(&self, event: Event) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    /// Lines the device received, in order.
    pub fn received(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Received(line) => Some(line),
                Event::PromptSent(_) => None,
            })
            .collect()
    }

    pub fn position(&self, event: &Event) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }
}

#[derive(Debug, Clone, Default)]
struct Rule {
    pages: Vec<String>,
    next_prompt: Option<String>,
    silent: bool,
    delay: Duration,
    secret: Option<(String, String)>,
}

pub struct MockDevice {
    prompt: String,
    banner: String,
    pager: String,
    rules: HashMap<String, Rule>,
    log: EventLog,
    pending_pages: VecDeque<String>,
    awaiting_secret: Option<(String, String)>,
}

impl MockDevice {
    pub fn new(prompt: &str) -> Self {
        Self {
            prompt: prompt.to_string(),
            banner: "\r\nWelcome to the lab\r\n".to_string(),
            pager: PAGER.to_string(),
            rules: HashMap::new(),
            log: EventLog::default(),
            pending_pages: VecDeque::new(),
            awaiting_secret: None,
        }
    }

    /// Use `pager` instead of the IOS-style `--More--` marker.
    pub fn with_pager(mut self, pager: &str) -> Self {
        self.pager = pager.to_string();
        self
    }

    fn rule(mut self, command: &str, rule: Rule) -> Self {
        self.rules.insert(command.to_string(), rule);
        self
    }

    /// Reply to `command` with `output`.
    pub fn on(self, command: &str, output: &str) -> Self {
        self.rule(
            command,
            Rule {
                pages: vec![output.to_string()],
                ..Default::default()
            },
        )
    }

    /// Reply to `command` with several pages separated by the pager.
    pub fn on_paged(self, command: &str, pages: &[&str]) -> Self {
        self.rule(
            command,
            Rule {
                pages: pages.iter().map(|p| p.to_string()).collect(),
                ..Default::default()
            },
        )
    }

    /// Reply to `command` and switch to `next_prompt`.
    pub fn on_switch(self, command: &str, output: &str, next_prompt: &str) -> Self {
        self.rule(
            command,
            Rule {
                pages: vec![output.to_string()],
                next_prompt: Some(next_prompt.to_string()),
                ..Default::default()
            },
        )
    }

    /// Echo `command`, then wait `delay` before replying.
    pub fn on_delayed(self, command: &str, delay: Duration, output: &str) -> Self {
        self.rule(
            command,
            Rule {
                pages: vec![output.to_string()],
                delay,
                ..Default::default()
            },
        )
    }

    /// Echo `command` and never print anything else.
    pub fn on_silent(self, command: &str) -> Self {
        self.rule(
            command,
            Rule {
                silent: true,
                ..Default::default()
            },
        )
    }

    /// Ask for a password after `command`; `secret` moves to `elevated`.
    pub fn on_secret(self, command: &str, secret: &str, elevated: &str) -> Self {
        self.rule(
            command,
            Rule {
                secret: Some((secret.to_string(), elevated.to_string())),
                ..Default::default()
            },
        )
    }

    /// Like [`MockDevice::on_secret`], with `delay` between the echo and the
    /// password prompt.
    pub fn on_secret_delayed(
        self,
        command: &str,
        delay: Duration,
        secret: &str,
        elevated: &str,
    ) -> Self {
        self.rule(
            command,
            Rule {
                secret: Some((secret.to_string(), elevated.to_string())),
                delay,
                ..Default::default()
            },
        )
    }

    /// Start the device. Returns the client end of the pipe and the log.
    pub fn spawn(self) -> (DuplexStream, EventLog) {
        let (client, device) = tokio::io::duplex(64 * 1024);
        let log = self.log.clone();
        tokio::spawn(self.run(device));
        (client, log)
    }

    async fn send(&mut self, io: &mut DuplexStream, text: &str) -> bool {
        io.write_all(text.as_bytes()).await.is_ok()
    }

    async fn send_prompt(&mut self, io: &mut DuplexStream, mut text: String) -> bool {
        text.push_str(&self.prompt);
        self.log.push(Event::PromptSent(self.prompt.clone()));
        self.send(io, &text).await
    }

    async fn run(mut self, mut io: DuplexStream) {
        let greeting = self.banner.clone();
        if !self.send_prompt(&mut io, greeting).await {
            return;
        }

        let mut line = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = match io.read(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(n) => n,
            };
            for &byte in &buf[..n] {
                if !self.pending_pages.is_empty() {
                    // Any key advances the pager.
                    if !self.next_page(&mut io).await {
                        return;
                    }
                    continue;
                }
                match byte {
                    b'\r' => {}
                    b'\n' => {
                        let text = String::from_utf8_lossy(&line).into_owned();
                        line.clear();
                        if !self.handle_line(&mut io, text).await {
                            return;
                        }
                    }
                    b => line.push(b),
                }
            }
        }
    }

    async fn next_page(&mut self, io: &mut DuplexStream) -> bool {
        let Some(page) = self.pending_pages.pop_front() else {
            return true;
        };
        let out = format!("{ERASE}{page}\r\n");
        if self.pending_pages.is_empty() {
            self.send_prompt(io, out).await
        } else {
            let out = format!("{out}{}", self.pager);
            self.send(io, &out).await
        }
    }

    async fn handle_line(&mut self, io: &mut DuplexStream, text: String) -> bool {
        self.log.push(Event::Received(text.clone()));

        if let Some((expected, elevated)) = self.awaiting_secret.take() {
            let out = if text == expected {
                self.prompt = elevated;
                "\r\n".to_string()
            } else {
                "\r\n% Access denied\r\n\r\n".to_string()
            };
            return self.send_prompt(io, out).await;
        }

        let rule = self.rules.get(&text).cloned().unwrap_or_default();
        let mut out = format!("{text}\r\n");

        if rule.silent {
            return self.send(io, &out).await;
        }
        if let Some(secret) = rule.secret {
            if !rule.delay.is_zero() {
                if !self.send(io, &out).await {
                    return false;
                }
                out.clear();
                tokio::time::sleep(rule.delay).await;
            }
            out.push_str("Password: ");
            self.awaiting_secret = Some(secret);
            return self.send(io, &out).await;
        }
        if !rule.delay.is_zero() {
            if !self.send(io, &out).await {
                return false;
            }
            out.clear();
            tokio::time::sleep(rule.delay).await;
        }
        if let Some(prompt) = rule.next_prompt {
            self.prompt = prompt;
        }

        let mut pages = rule.pages.into_iter();
        if let Some(first) = pages.next().filter(|p| !p.is_empty()) {
            out.push_str(&first);
            out.push_str("\r\n");
        }
        self.pending_pages = pages.collect();

        if self.pending_pages.is_empty() {
            self.send_prompt(io, out).await
        } else {
            out.push_str(&self.pager);
            self.send(io, &out).await
        }
    }
}

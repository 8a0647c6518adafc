//! Command execution.
//!
//! Each session runs in its own worker task. Callers talk to it through a
//! cloneable [`SessionHandle`]: jobs go into a bounded FIFO queue and the
//! result comes back on a oneshot, so two callers can never interleave
//! commands on one device. Every wait on either side is bounded by the
//! job's deadline.

use std::iter;
use std::sync::Arc;
use std::time::Duration;

use log::{Level, debug, log, warn};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, timeout_at};

use super::command::{Command, CommandKind};
use super::context::{Context, DEFAULT_TARGET};
use super::response::CapturedOutput;
use super::session::Session;
use super::state::SessionState;
use crate::channel::ReadResult;
use crate::error::{ChannelError, CommandError, DriverError, Result};
use crate::platform::{ConfigDump, Dialect, classify};

/// How long past a job's deadline the caller waits for the worker's answer.
///
/// The worker reports its own timeout at the deadline; this only covers the
/// hop back through the oneshot.
const RESPONSE_GRACE: Duration = Duration::from_millis(250);

/// Observable state of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub state: SessionState,
    pub last_prompt: Option<String>,
    pub consecutive_timeouts: u32,
}

type JobResult = std::result::Result<Vec<CapturedOutput>, CommandError>;

/// One queued unit of work: a batch that runs back to back.
struct CmdJob {
    commands: Vec<Command>,
    deadline: Instant,
    timeout: Duration,
    target: String,
    responder: oneshot::Sender<JobResult>,
}

/// Handle to a running session.
///
/// Cheap to clone. The worker exits once every handle is dropped.
#[derive(Clone)]
pub struct SessionHandle {
    device_id: Arc<str>,
    dialect: Arc<Dialect>,
    command_timeout: Duration,
    jobs: mpsc::Sender<CmdJob>,
    status: watch::Receiver<SessionStatus>,
    runtime: Handle,
}

impl SessionHandle {
    /// Move an initialized session into a worker task on the current
    /// runtime.
    pub fn spawn(session: Session) -> Result<Self> {
        if !session.state().is_ready() {
            return Err(DriverError::NotReady {
                device: session.device_id().to_string(),
                state: session.state().to_string(),
            }
            .into());
        }
        let runtime = Handle::try_current().map_err(|_| DriverError::NoRuntime)?;

        let (jobs, queue) = mpsc::channel(session.config().queue_depth);
        let (status_tx, status) = watch::channel(SessionStatus {
            state: session.state(),
            last_prompt: session.last_prompt().map(str::to_string),
            consecutive_timeouts: 0,
        });

        let handle = Self {
            device_id: Arc::from(session.device_id()),
            dialect: session.family().dialect.clone(),
            command_timeout: session.config().command_timeout,
            jobs,
            status,
            runtime: runtime.clone(),
        };

        runtime.spawn(Worker::new(session, status_tx).run(queue));
        Ok(handle)
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Snapshot of the session's state.
    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    /// Whether the worker is running and the session can take commands.
    pub fn is_alive(&self) -> bool {
        !self.jobs.is_closed() && self.status.borrow().state.is_ready()
    }

    pub(crate) fn runtime(&self) -> &Handle {
        &self.runtime
    }

    /// Run one command within `timeout`, queue wait included.
    pub async fn run(&self, command: Command, timeout: Duration) -> Result<CapturedOutput> {
        let mut outputs = self
            .submit(vec![command], timeout, DEFAULT_TARGET.to_string())
            .await?;
        outputs.pop().ok_or_else(|| {
            DriverError::SessionClosed {
                device: self.device_id.to_string(),
            }
            .into()
        })
    }

    /// Run a batch as one job. The first failing command ends the batch.
    pub async fn run_batch(
        &self,
        commands: Vec<Command>,
        timeout: Duration,
    ) -> Result<Vec<CapturedOutput>> {
        self.submit(commands, timeout, DEFAULT_TARGET.to_string()).await
    }

    /// Run a read-only command and return its output.
    pub async fn read(&self, command: &str, ctx: &Context) -> Result<String> {
        let outputs = self
            .with_context(ctx, vec![Command::read(command)])
            .await?;
        Ok(join_outputs(&outputs))
    }

    /// Send create/update lines and return their combined output.
    pub async fn write_and_read(&self, ctx: &Context, lines: &[&str]) -> Result<String> {
        let commands = lines.iter().map(|l| Command::write(*l)).collect();
        let outputs = self.with_context(ctx, commands).await?;
        Ok(join_outputs(&outputs))
    }

    /// Send delete lines and return their combined output.
    pub async fn delete_and_read(&self, ctx: &Context, lines: &[&str]) -> Result<String> {
        let commands = lines.iter().map(|l| Command::delete(*l)).collect();
        let outputs = self.with_context(ctx, commands).await?;
        Ok(join_outputs(&outputs))
    }

    /// Dump and clean the device's running configuration.
    pub async fn dump_config(&self, ctx: &Context) -> Result<ConfigDump> {
        let text = self.read(&self.dialect.config_dump_command, ctx).await?;
        Ok(self.dialect.clean_config(&text))
    }

    async fn with_context(&self, ctx: &Context, commands: Vec<Command>) -> Result<Vec<CapturedOutput>> {
        let timeout = ctx.timeout().unwrap_or(self.command_timeout);
        log!(
            target: ctx.target(),
            Level::Debug,
            "{}: {} submitting {} command(s)",
            self.device_id,
            ctx.label(),
            commands.len()
        );

        let result = self.submit(commands, timeout, ctx.target().to_string()).await;
        if let Err(e) = &result {
            log!(target: ctx.target(), Level::Warn, "{}: {}", ctx.label(), e);
        }
        result
    }

    async fn submit(
        &self,
        commands: Vec<Command>,
        timeout: Duration,
        target: String,
    ) -> Result<Vec<CapturedOutput>> {
        if commands.is_empty() {
            return Ok(vec![]);
        }

        let deadline = Instant::now() + timeout;
        let first = commands[0].text.clone();
        let timed_out = || CommandError::Timeout {
            device: self.device_id.to_string(),
            command: first.clone(),
            timeout,
        };

        let (responder, response) = oneshot::channel();
        let job = CmdJob {
            commands,
            deadline,
            timeout,
            target,
            responder,
        };

        match timeout_at(deadline, self.jobs.send(job)).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => {
                return Err(DriverError::SessionClosed {
                    device: self.device_id.to_string(),
                }
                .into());
            }
            Err(_) => return Err(timed_out().into()),
        }

        match timeout_at(deadline + RESPONSE_GRACE, response).await {
            Ok(Ok(Ok(outputs))) => Ok(outputs),
            Ok(Ok(Err(CommandError::Channel {
                source: ChannelError::Interrupted,
                ..
            }))) => Err(ChannelError::Interrupted.into()),
            Ok(Ok(Err(e))) => Err(e.into()),
            // Worker dropped the responder without answering.
            Ok(Err(_)) => Err(ChannelError::Interrupted.into()),
            Err(_) => Err(timed_out().into()),
        }
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("device_id", &self.device_id)
            .field("status", &*self.status.borrow())
            .finish()
    }
}

fn join_outputs(outputs: &[CapturedOutput]) -> String {
    outputs
        .iter()
        .map(|o| o.text.as_str())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// The task that owns a session and runs its jobs in order.
struct Worker {
    session: Session,
    status: watch::Sender<SessionStatus>,
    consecutive_timeouts: u32,
}

impl Worker {
    fn new(session: Session, status: watch::Sender<SessionStatus>) -> Self {
        Self {
            session,
            status,
            consecutive_timeouts: 0,
        }
    }

    async fn run(mut self, mut queue: mpsc::Receiver<CmdJob>) {
        while let Some(job) = queue.recv().await {
            self.handle(job).await;
        }
        debug!("{}: all handles dropped, worker exiting", self.session.device_id());
    }

    async fn handle(&mut self, job: CmdJob) {
        let CmdJob {
            commands,
            deadline,
            timeout,
            target,
            responder,
        } = job;

        if Instant::now() >= deadline {
            // Expired while queued: nothing was sent, the session is fine.
            let err = CommandError::Timeout {
                device: self.session.device_id().to_string(),
                command: commands[0].text.clone(),
                timeout,
            };
            let _ = responder.send(Err(err));
            return;
        }

        let mut outputs = Vec::with_capacity(commands.len());
        let mut failure = None;
        for command in commands {
            match self.execute(command, deadline, timeout, &target).await {
                Ok(output) => outputs.push(output),
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        let timed_out = matches!(failure, Some(CommandError::Timeout { .. }));
        // An interrupted read may still have its reply on the way.
        let interrupted = matches!(
            failure,
            Some(CommandError::Channel {
                source: ChannelError::Interrupted,
                ..
            })
        );
        let result = match failure {
            Some(e) => Err(e),
            None => Ok(outputs),
        };

        // The caller is answered before recovery starts.
        if timed_out || interrupted {
            self.respond(responder, result);
            if timed_out {
                self.consecutive_timeouts += 1;
            }
            self.recover().await;
            self.publish();
        } else {
            self.consecutive_timeouts = 0;
            self.publish();
            self.respond(responder, result);
        }
    }

    fn respond(&self, responder: oneshot::Sender<JobResult>, result: JobResult) {
        if responder.send(result).is_err() {
            debug!("{}: caller went away before the answer", self.session.device_id());
        }
    }

    /// Run one command. Assumes the caller holds the session exclusively.
    async fn execute(
        &mut self,
        command: Command,
        deadline: Instant,
        timeout: Duration,
        target: &str,
    ) -> std::result::Result<CapturedOutput, CommandError> {
        let device = self.session.device_id().to_string();
        if !self.session.state().is_ready() {
            return Err(CommandError::SessionUnusable {
                device,
                command: command.text,
            });
        }

        log!(target: target, Level::Debug, "{}: run '{}'", device, command.text);
        let started = Instant::now();
        self.session.clear_buffer();

        let read = match self.send_and_read(&command.text, deadline).await {
            Ok(read) => read,
            Err(ChannelError::PatternTimeout(_)) => {
                log!(
                    target: target,
                    Level::Warn,
                    "{}: '{}' timed out after {:?}",
                    device,
                    command.text,
                    timeout
                );
                return Err(CommandError::Timeout {
                    device,
                    command: command.text,
                    timeout,
                });
            }
            Err(source) => {
                if !matches!(source, ChannelError::Interrupted) {
                    self.session.fail();
                }
                return Err(CommandError::Channel {
                    device,
                    command: command.text,
                    source,
                });
            }
        };

        let prompt = read.prompt();
        self.session.set_last_prompt(prompt.clone());

        let raw = read.as_str().into_owned();
        let body = String::from_utf8_lossy(&read.data[..read.prompt_start]);
        let stripped = strip_output(&body, &command.text);
        let text = self.session.family().behavior.post_process_output(&stripped);

        if let Some(description) = classify(&text, &self.session.family().error_patterns) {
            log!(
                target: target,
                Level::Debug,
                "{}: '{}' failed: {}",
                device,
                command.text,
                description
            );
            let Command { text: command, kind } = command;
            return Err(match kind {
                CommandKind::Read => CommandError::Read {
                    device,
                    command,
                    description,
                },
                CommandKind::Write => CommandError::Write {
                    device,
                    command,
                    description,
                },
                CommandKind::Delete => CommandError::Delete {
                    device,
                    command,
                    description,
                },
            });
        }

        Ok(CapturedOutput {
            prompt,
            pages: read.pages,
            command,
            text,
            raw,
            elapsed: started.elapsed(),
        })
    }

    async fn send_and_read(
        &mut self,
        command: &str,
        deadline: Instant,
    ) -> std::result::Result<ReadResult, ChannelError> {
        self.session.write_line(command, deadline).await?;
        self.session.read_until_prompt(deadline).await
    }

    /// After a timeout or interruption, give the device one more window to
    /// finish its reply and show a prompt.
    async fn recover(&mut self) {
        let device = self.session.device_id().to_string();
        let max = self.session.config().max_consecutive_timeouts;
        if self.consecutive_timeouts >= max {
            warn!("{}: {} timeouts in a row, giving up on session", device, max);
            self.session.fail();
            return;
        }

        let deadline = Instant::now() + self.session.config().recovery_window;
        match self.session.read_until_prompt(deadline).await {
            Ok(_) => debug!("{}: prompt seen again, session recovered", device),
            Err(e) => {
                warn!("{}: no prompt after timeout ({}), marking failed", device, e);
                self.session.fail();
            }
        }
    }

    fn publish(&self) {
        self.status.send_replace(SessionStatus {
            state: self.session.state(),
            last_prompt: self.session.last_prompt().map(str::to_string),
            consecutive_timeouts: self.consecutive_timeouts,
        });
    }
}

/// Remove the command echo, pager erase residue and line-ending noise from
/// output that already had its trailing prompt cut off.
pub(crate) fn strip_output(body: &str, command: &str) -> String {
    let text = erase_backspaces(body).replace('\r', "");

    let mut lines = text.lines().skip_while(|l| l.trim().is_empty()).peekable();
    let echo = command.trim();
    if !echo.is_empty() && lines.peek().is_some_and(|l| l.trim_end().ends_with(echo)) {
        lines.next();
    }

    let mut out = lines.collect::<Vec<_>>().join("\n");
    out.truncate(out.trim_end().len());
    out
}

/// Drop backspaces together with the blanks a pager writes to erase its
/// marker.
fn erase_backspaces(text: &str) -> String {
    if memchr::memchr(b'\x08', text.as_bytes()).is_none() {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut blanks = 0;
    for ch in text.chars() {
        match ch {
            ' ' => blanks += 1,
            '\x08' => blanks = 0,
            _ => {
                out.extend(iter::repeat_n(' ', blanks));
                blanks = 0;
                out.push(ch);
            }
        }
    }
    out.extend(iter::repeat_n(' ', blanks));
    out
}

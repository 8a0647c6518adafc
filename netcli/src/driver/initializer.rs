//! Bringing a freshly connected session to `Ready`.

use log::{info, trace, warn};
use tokio::time::Instant;

use super::prompt::resolve_prompt;
use super::session::Session;
use super::state::SessionState;
use crate::error::{ChannelError, Error, InitError, Result};

/// Run the family handshake and accept or reject the resulting prompt.
///
/// On success the session is `Ready` and remembers its prompt. On failure it
/// is `Failed`: an unsupported prompt is reported as
/// [`InitError::UnsupportedPrompt`] and nothing further is sent, an
/// interruption is passed through untouched, and anything else is wrapped
/// once in [`InitError::Handshake`].
pub async fn initialize(session: &mut Session) -> Result<()> {
    match bring_up(session).await {
        Ok(()) => Ok(()),
        Err(err) => {
            session.fail();
            Err(wrap(session.device_id(), err))
        }
    }
}

async fn bring_up(session: &mut Session) -> Result<()> {
    let device = session.device_id().to_string();

    // Login banner and whatever the device printed before its first prompt.
    let deadline = Instant::now() + session.config().prompt_timeout;
    let banner = session.read_until_quiet(deadline).await?;
    trace!("{}: login banner {:?}", device, banner);

    let initializer = session.family().initializer.clone();
    initializer.handshake(session).await?;

    let prompt = resolve_prompt(session).await?;
    if prompt.is_empty() {
        return Err(ChannelError::PatternTimeout(session.config().prompt_timeout).into());
    }

    if session.dialect().is_unsupported_prompt(&prompt) {
        warn!("{}: unsupported prompt '{}' after handshake", device, prompt);
        return Err(InitError::UnsupportedPrompt { device, prompt }.into());
    }

    session.advance(SessionState::Ready)?;
    info!("{}: ready at '{}'", device, prompt);
    session.set_last_prompt(prompt);
    Ok(())
}

fn wrap(device: &str, err: Error) -> Error {
    match err {
        err if err.is_interrupted() => err,
        Error::Init(err) => Error::Init(err),
        other => InitError::Handshake {
            device: device.to_string(),
            source: Box::new(other),
        }
        .into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DriverError;

    #[test]
    fn test_wrap_passes_interruption_through() {
        let err = wrap("r1", ChannelError::Interrupted.into());
        assert!(err.is_interrupted());
    }

    #[test]
    fn test_wrap_keeps_unsupported_prompt() {
        let err = wrap(
            "r1",
            InitError::UnsupportedPrompt {
                device: "r1".to_string(),
                prompt: "r1>".to_string(),
            }
            .into(),
        );
        assert!(matches!(err, Error::Init(InitError::UnsupportedPrompt { .. })));
    }

    #[test]
    fn test_wrap_wraps_once() {
        let err = wrap("r1", ChannelError::PatternTimeout(std::time::Duration::from_secs(1)).into());
        match err {
            Error::Init(InitError::Handshake { device, source }) => {
                assert_eq!(device, "r1");
                assert!(source.is_timeout());
            }
            other => panic!("unexpected {:?}", other),
        }

        let err = wrap("r1", DriverError::SessionClosed { device: "r1".into() }.into());
        assert!(matches!(err, Error::Init(InitError::Handshake { .. })));
    }
}

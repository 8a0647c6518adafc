//! Prompt resolution.

use log::trace;
use tokio::time::Instant;

use super::session::Session;
use crate::error::ChannelError;

/// Find out which prompt the device is sitting on.
///
/// Discards anything buffered, sends one line terminator and reads until
/// the device has been quiet for the quiet period (bounded by the prompt
/// timeout). The last non-empty line read, trimmed, is the prompt. An idle
/// device yields an empty string.
pub async fn resolve_prompt(session: &mut Session) -> Result<String, ChannelError> {
    let deadline = Instant::now() + session.config().prompt_timeout;
    let newline = session.dialect().newline;

    session.clear_buffer();
    session.write(newline.as_bytes(), deadline).await?;
    let text = session.read_until_quiet(deadline).await?;

    let prompt = last_line(&text).to_string();
    trace!("{}: resolved prompt {:?}", session.device_id(), prompt);
    Ok(prompt)
}

/// Last non-empty line of `text`, trimmed.
fn last_line(text: &str) -> &str {
    text.lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::driver::SessionConfig;
    use crate::platform::vendors;

    fn config() -> SessionConfig {
        SessionConfig {
            quiet_period: Duration::from_millis(50),
            prompt_timeout: Duration::from_secs(2),
            ..Default::default()
        }
    }

    #[test]
    fn test_last_line() {
        assert_eq!(last_line("\r\n\r\nrouter# \r\n"), "router#");
        assert_eq!(last_line("banner\nuser@host:~$ "), "user@host:~$");
        assert_eq!(last_line(""), "");
        assert_eq!(last_line("\r\n  \r\n"), "");
    }

    #[tokio::test]
    async fn test_resolve_cisco_prompt() {
        let mock = tokio_test::io::Builder::new()
            .write(b"\n")
            .read(b"\r\nrouter#")
            .wait(Duration::from_millis(200))
            .build();
        let family = vendors::cisco_ios::family().unwrap();
        let mut session = Session::new("r1", family, mock, config());

        assert_eq!(resolve_prompt(&mut session).await.unwrap(), "router#");
    }

    #[tokio::test]
    async fn test_resolve_multiline_nokia_prompt() {
        let mock = tokio_test::io::Builder::new()
            .write(b"\n")
            .read(b"\r\n\r\n[/]\r\nA:admin@pe1# ")
            .wait(Duration::from_millis(200))
            .build();
        let family = vendors::nokia_sros::family().unwrap();
        let mut session = Session::new("pe1", family, mock, config());

        assert_eq!(resolve_prompt(&mut session).await.unwrap(), "A:admin@pe1#");
    }

    #[tokio::test]
    async fn test_resolve_arista_prompt() {
        let mock = tokio_test::io::Builder::new()
            .write(b"\n")
            .read(b"\r\nswitch(config-if-Et1)#")
            .wait(Duration::from_millis(200))
            .build();
        let family = vendors::arista_eos::family().unwrap();
        let mut session = Session::new("sw1", family, mock, config());

        assert_eq!(resolve_prompt(&mut session).await.unwrap(), "switch(config-if-Et1)#");
    }

    #[tokio::test]
    async fn test_resolve_juniper_prompt_below_banner() {
        let mock = tokio_test::io::Builder::new()
            .write(b"\n")
            .read(b"\r\n\r\n{master:0}\r\nadmin@mx1> ")
            .wait(Duration::from_millis(200))
            .build();
        let family = vendors::juniper_junos::family().unwrap();
        let mut session = Session::new("mx1", family, mock, config());

        assert_eq!(resolve_prompt(&mut session).await.unwrap(), "admin@mx1>");
    }

    #[tokio::test]
    async fn test_resolve_casa_prompt_in_chunks() {
        let mock = tokio_test::io::Builder::new()
            .write(b"\n")
            .read(b"\r\nCASA-C100G")
            .read(b"(config)#")
            .wait(Duration::from_millis(200))
            .build();
        let family = vendors::casa_cmts::family().unwrap();
        let mut session = Session::new("cmts1", family, mock, config());

        assert_eq!(resolve_prompt(&mut session).await.unwrap(), "CASA-C100G(config)#");
    }

    #[tokio::test]
    async fn test_resolve_strips_escape_codes() {
        let mock = tokio_test::io::Builder::new()
            .write(b"\n")
            .read(b"\r\n\x1b[1muser@host\x1b[0m:~$ ")
            .wait(Duration::from_millis(200))
            .build();
        let family = vendors::linux::family().unwrap();
        let mut session = Session::new("h1", family, mock, config());

        assert_eq!(resolve_prompt(&mut session).await.unwrap(), "user@host:~$");
    }
}

//! Command handling: `record <names...>` and `quit`.
//!
//! Every command gets a [`Reply`]. [`Response::handled`] additionally tells
//! the transport whether the command counts as handled: a `quit` with nothing
//! to stop is benign (handled), while a `record` that cannot start, or an
//! unknown command, is rejected.

use tracing::{error, info};

use crate::clock::Clock;
use crate::error::SessionError;
use crate::session::{header_line, RecordingSession};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Record { columns: Vec<String> },
    Quit,
    Unknown(String),
}

impl Command {
    /// Parse a request. Token 0 names the command, the rest are arguments.
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Self {
        match tokens.split_first() {
            Some((name, args)) if name.as_ref() == "record" => Command::Record {
                columns: args.iter().map(|a| a.as_ref().to_string()).collect(),
            },
            Some((name, _)) if name.as_ref() == "quit" => Command::Quit,
            Some((name, _)) => Command::Unknown(name.as_ref().to_string()),
            None => Command::Unknown(String::new()),
        }
    }
}

/// Status sent back on the command channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Failure = 0,
    Success = 1,
}

impl Reply {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Reply::Failure),
            1 => Some(Reply::Success),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response {
    pub reply: Reply,
    pub handled: bool,
}

impl Response {
    fn success() -> Self {
        Self {
            reply: Reply::Success,
            handled: true,
        }
    }

    fn failure(handled: bool) -> Self {
        Self {
            reply: Reply::Failure,
            handled,
        }
    }
}

/// Apply `command` to the session.
pub fn handle<C: Clock + ?Sized>(
    session: &mut RecordingSession,
    command: Command,
    clock: &C,
) -> Response {
    match command {
        Command::Quit => match session.close() {
            Ok(closed) => {
                info!(
                    "[rpc] the stream is closed: {} ({} rows)",
                    closed.path.display(),
                    closed.rows
                );
                Response::success()
            }
            // Nothing to stop is benign for the caller.
            Err(SessionError::NotOpen) => {
                error!("[rpc] the stream is not open");
                Response::failure(true)
            }
            Err(e) => {
                error!("[rpc] cannot close the stream: {}", e);
                Response::failure(false)
            }
        },

        Command::Record { columns } => {
            if session.is_open() {
                error!("[rpc] the stream is already open");
                return Response::failure(false);
            }

            info!(
                "[rpc] the following data will be stored: {}",
                header_line(&columns).trim_end()
            );

            match session.open(columns, clock.now()) {
                Ok(path) => {
                    info!("[rpc] recording to {}", path.display());
                    Response::success()
                }
                Err(e) => {
                    error!("[rpc] cannot start recording: {}", e);
                    Response::failure(false)
                }
            }
        }

        Command::Unknown(name) => {
            error!("[rpc] unknown command {:?}", name);
            Response::failure(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{Local, TimeZone};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn clock() -> ManualClock {
        ManualClock::new(Local.with_ymd_and_hms(2018, 6, 12, 9, 30, 5).unwrap())
    }

    fn record(names: &[&str]) -> Command {
        let mut tokens = vec!["record"];
        tokens.extend_from_slice(names);
        Command::parse(tokens.as_slice())
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            Command::parse(&["record", "x", "y"]),
            Command::Record {
                columns: vec!["x".to_string(), "y".to_string()]
            }
        );
        assert_eq!(
            Command::parse(&["record"]),
            Command::Record { columns: vec![] }
        );
        assert_eq!(Command::parse(&["quit"]), Command::Quit);
        assert_eq!(Command::parse(&["quit", "now"]), Command::Quit);
        assert_eq!(
            Command::parse(&["Record", "x"]),
            Command::Unknown("Record".to_string())
        );
        assert_eq!(Command::parse::<&str>(&[]), Command::Unknown(String::new()));
    }

    #[test]
    fn test_reply_codes() {
        assert_eq!(Reply::Success.code(), 1);
        assert_eq!(Reply::Failure.code(), 0);
        assert_eq!(Reply::from_code(1), Some(Reply::Success));
        assert_eq!(Reply::from_code(0), Some(Reply::Failure));
        assert_eq!(Reply::from_code(7), None);
    }

    #[test]
    fn test_record_on_closed_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = RecordingSession::new(dir.path());

        let response = handle(&mut session, record(&["x", "y"]), &clock());

        assert_eq!(response, Response { reply: Reply::Success, handled: true });
        let path = session.path().unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "time x y \n");
    }

    #[test]
    fn test_record_while_open_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let clock = clock();
        let mut session = RecordingSession::new(dir.path());
        handle(&mut session, record(&["x", "y"]), &clock);
        let first = session.path().unwrap().to_path_buf();

        clock.advance(Duration::from_secs(5));
        let response = handle(&mut session, record(&["z"]), &clock);

        assert_eq!(response, Response { reply: Reply::Failure, handled: false });
        assert_eq!(session.path(), Some(first.as_path()));
        assert_eq!(session.expected_columns(), Some(2));
        assert_eq!(std::fs::read_to_string(&first).unwrap(), "time x y \n");
    }

    #[test]
    fn test_quit_while_open_closes() {
        let dir = tempfile::tempdir().unwrap();
        let clock = clock();
        let mut session = RecordingSession::new(dir.path());
        handle(&mut session, record(&["x"]), &clock);

        let response = handle(&mut session, Command::Quit, &clock);

        assert_eq!(response, Response { reply: Reply::Success, handled: true });
        assert!(!session.is_open());
        assert!(matches!(
            session.append_row(&[1.0], clock.now()),
            Err(SessionError::NotOpen)
        ));
    }

    #[test]
    fn test_quit_while_closed_is_benign_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = RecordingSession::new(dir.path());

        let response = handle(&mut session, Command::Quit, &clock());

        assert_eq!(response, Response { reply: Reply::Failure, handled: true });
        assert!(!session.is_open());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_quit_while_closed_logs_quit_message() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = RecordingSession::new(dir.path());
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            handle(&mut session, Command::Quit, &clock());
        });

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("the stream is not open"), "logged: {output}");
        assert!(!output.contains("cannot store data"), "logged: {output}");
    }

    #[test]
    fn test_unknown_command() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = RecordingSession::new(dir.path());

        let response = handle(&mut session, Command::parse(&["start"]), &clock());

        assert_eq!(response, Response { reply: Reply::Failure, handled: false });
        assert!(!session.is_open());
    }

    #[test]
    fn test_record_failing_to_create_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = RecordingSession::new(dir.path().join("gone"));

        let response = handle(&mut session, record(&["x"]), &clock());

        assert_eq!(response, Response { reply: Reply::Failure, handled: false });
        assert!(!session.is_open());
    }

    #[test]
    fn test_record_quit_record_opens_fresh_file() {
        let dir = tempfile::tempdir().unwrap();
        let clock = clock();
        let mut session = RecordingSession::new(dir.path());

        handle(&mut session, record(&["x"]), &clock);
        handle(&mut session, Command::Quit, &clock);
        clock.advance(Duration::from_secs(1));
        let response = handle(&mut session, record(&["a", "b", "c"]), &clock);

        assert_eq!(response.reply, Reply::Success);
        assert_eq!(session.expected_columns(), Some(3));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }
}

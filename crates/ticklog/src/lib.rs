//! ticklog - periodic sample recorder
//!
//! Listens for sample vectors on a SUB socket and for `record <names...>` /
//! `quit` on a ROUTER socket, writing one timestamped row per tick to a
//! `Dataset_<date>.txt` file while a recording session is open.

pub mod client;
pub mod clock;
pub mod command;
pub mod daemon;
pub mod error;
pub mod poll;
pub mod session;
pub mod telemetry;
pub mod transport;
pub mod wire;

pub use client::{LoggerClient, SamplePublisher};
pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use command::{Command, Reply, Response};
pub use daemon::Logger;
pub use error::SessionError;
pub use poll::{LatestSample, SampleSource, Tick};
pub use session::{ClosedSession, RecordingSession};

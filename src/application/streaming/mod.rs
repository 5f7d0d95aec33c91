//! Live build-log streaming.
//!
//! The registry owns sessions, each session owns one bounded ordered
//! channel and one worker task, and the tailer turns raw sink reads into
//! whole log lines. The notifier shares the registry's delivery path so
//! status events interleave deterministically with lines.

pub mod notifier;
pub mod registry;
pub mod session;
pub mod tailer;

pub use notifier::{NotifyError, StatusNotifier};
pub use registry::{OpenError, SessionRegistry, StreamSettings};
pub use session::{SessionChannel, SessionStream};
pub use tailer::{LogTailer, RetryPolicy, TailPoll};

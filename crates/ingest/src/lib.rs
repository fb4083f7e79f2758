pub mod batch;
pub mod db;
pub mod discovery;
pub mod error;
pub mod guard;
pub mod inspect;
pub mod invoker;
pub mod pipeline;

pub use batch::{run_batch, BatchReport, FileOutcome, FileStatus};
pub use error::{IngestError, InvokeError};
pub use guard::NotificationGuard;
pub use invoker::{ParserInvocation, ParserRunner, ProcessRunner};
pub use pipeline::ingest;

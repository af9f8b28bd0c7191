pub mod api;
pub mod error;
pub mod reveal;
pub mod session;
pub mod state;

pub use api::{ApiClient, ChatBackend, ChatMessage, Role, ThreadSummary};
pub use error::{ClientError, Result};
pub use reveal::{Reveal, RevealFrame, DEFAULT_REVEAL_INTERVAL};
pub use session::{ChatSession, SubmitError, SubmitOutcome};
pub use state::{PendingReply, ReplyOutcome, SessionState, SubmitBlocked, SubmitTicket, SwitchTicket};

#![allow(missing_docs)]

pub mod session;
pub mod snapshot;
pub mod state;
pub mod submit;

pub use session::{
    Direction, FormSession, NavOutcome, Phase, SessionError, SessionEvent,
};
pub use snapshot::Snapshot;
pub use state::SessionState;
pub use submit::{SubmitFailure, SubmitReport, SubmitSink};

pub mod autofill;
pub mod classify;
pub mod dedup;
pub mod engine;
pub mod export;
pub mod io;
pub mod password;
pub mod record;
pub mod report;
pub mod sink;
pub mod stats;

pub mod prelude {
    pub use crate::engine::{Engine, ExtractOptions};
    pub use crate::record::{AutofillRecord, CredentialRecord, LogKind, Record};
}

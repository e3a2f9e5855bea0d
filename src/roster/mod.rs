//! Roster domain types and the upstream directory.
//!
//! # Data Flow
//! ```text
//! fetch strategies / cache warmer
//!     → directory.rs (RosterDirectory trait)
//!     → http.rs (HTTP implementation, retries 429/5xx)
//!     → types.rs (RosterPage → MemberSet)
//! ```

pub mod directory;
pub mod http;
pub mod types;

pub use directory::{RosterDirectory, SharedDirectory};
pub use http::HttpDirectory;
pub use types::{DirectoryError, DirectoryResult, Member, MemberId, MemberSet, RosterPage};

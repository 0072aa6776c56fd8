//! Data models for HandyHub

use chrono::{DateTime, SubsecRound, Utc};

mod booking;
mod conversation;
mod message;
mod token;
mod user;

pub use booking::*;
pub use conversation::*;
pub use message::*;
pub use token::*;
pub use user::*;

/// Current time at the microsecond precision timestamps are stored with,
/// so a freshly built record equals the row read back later.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

//! HandyHub Core Library
//!
//! Booking lifecycle, response tokens, conversation linkage and storage for
//! the HandyHub marketplace.

pub mod config;
pub mod directory;
pub mod error;
pub mod events;
pub mod invariants;
pub mod lifecycle;
pub mod link;
pub mod linkage;
pub mod marketplace;
pub mod models;
pub mod notify;
pub mod outcome;
pub mod storage;
pub mod store;

pub use config::{Config, ConfigError};
pub use directory::Directory;
pub use error::{Error, Result};
pub use events::{BookingEvent, BookingListener, ConversationOpener, EventDispatcher, EventKind};
pub use lifecycle::{BookingLifecycle, BookingRequested, TokenPolicy};
pub use link::ResponseLink;
pub use linkage::{ConversationLinkage, MessageIter};
pub use marketplace::Marketplace;
pub use models::*;
pub use notify::{LogNotifier, MemoryNotifier, Notifier, NotifyError, ProviderNotice};
pub use outcome::{Outcome, Warning};
pub use storage::{
    BookingRepository, ConversationRepository, Database, Storage, TokenRepository,
    UserRepository,
};
pub use store::BookingStore;

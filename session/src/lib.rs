// SPDX-License-Identifier: MIT OR Apache-2.0

//! Goban Session - serialized session actors and collaborator seams
//!
//! This crate hosts everything around the pure game core:
//! - One tokio task per session applying events in strict arrival order
//! - Debounced timeout scheduling driven by turn changes
//! - A session store abstraction (get/put/publish) for horizontal scaling
//! - The AI move-provider seam and its failure policy
//! - A lobby-style session manager with terminal-state eviction

#![deny(unsafe_code)]
#![deny(clippy::all)]

pub mod actor;
pub mod config;
pub mod manager;
pub mod provider;
pub mod store;

/// Opaque session identifier
pub type SessionId = String;

pub use actor::{SessionEvent, SessionHandle};
pub use config::{EngineConfig, EngineFailurePolicy};
pub use manager::{ManagerEvent, SessionManager};
pub use provider::{EngineUnavailable, MoveProvider, RandomProvider, Strength};
pub use store::{MemoryStore, NoticeKind, SessionStore, StoreNotice};

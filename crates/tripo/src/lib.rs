//! Client library for the remote image-to-model generation service.
//!
//! Provides typed request/response messages, the authenticated REST
//! wrapper ([`api::TripoApi`]), the decoded [`status::TaskStatus`], and the
//! bounded, cancellable [`poll::poll_until_done`] loop.

pub mod api;
pub mod client;
pub mod messages;
pub mod poll;
pub mod status;

//! HTTP handlers that feed query results through the projector.

pub mod users;

//! Provides helpers for turning a network into the list of hosts to probe

pub mod list;
pub mod range;

//! Notice and private-message distribution for an institution's staff and
//! students: who sees what, in which order, and how they reacted.

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod feed;
pub mod repository;
pub mod service;

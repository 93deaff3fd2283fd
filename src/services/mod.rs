//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own business logic and persistence concerns so route
//! handlers can stay focused on protocol translation and auth plumbing.

pub mod creator;
pub mod password;
pub mod persistence;
pub mod query;
pub mod session;
pub mod upload;

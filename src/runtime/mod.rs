//! Behavior of the collaborators generated code is written against:
//! capability markers, audit stamping, the per-call user context, the
//! repository abstraction, logout bookkeeping and error translation.

pub mod auth;
pub mod error;
pub mod model;
pub mod repository;
pub mod service;
pub mod user;

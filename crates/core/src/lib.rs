//! Domain logic for the labelkit annotation tool.
//!
//! Everything here is synchronous and free of I/O: the HTTP layer in
//! `labelkit-api` feeds uploaded bytes in and serves rendered forms and
//! exported bytes out.

pub mod annotation;
pub mod builder;
pub mod dataset;
pub mod error;
pub mod export;
pub mod navigation;
pub mod render;
pub mod schema;
pub mod session;
pub mod types;
pub mod widget;

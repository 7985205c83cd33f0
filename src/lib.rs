// src/lib.rs

//! Session emulation and scraping for the SIMA student portal.
//!
//! The portal exposes no usable API, so everything here works the way a
//! browser does: a cookie jar, a multi-hop login, and HTML parsers that
//! tolerate the several page layouts the portal serves.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod utils;

pub use error::{AppError, Result};

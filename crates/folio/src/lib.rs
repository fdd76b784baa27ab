#![forbid(unsafe_code)]

//! `folio` turns generated research articles into ordered prose and figure segments and, with the
//! `render` feature, into HTML.
//!
//! # Features
//!
//! - `render`: HTML rendering with asynchronous diagram figures (`folio::render`)

pub use folio_core::*;

#[cfg(feature = "render")]
pub mod render {
    pub use folio_render::*;
}

//! Editing of existing PDF documents.
//!
//! The only edit performed is stamping: overlaying a raster image onto every
//! page without touching existing content.

pub mod page_stamper;

pub use page_stamper::{media_box, PageStamper, StampReport};

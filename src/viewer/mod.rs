//! Guest-facing menu views.
//!
//! [`embed`] hands the PDF to the browser's own viewer inside a frame.
//! [`pages`] renders the document page by page on the server and streams each
//! page out as soon as it is ready.

pub mod embed;
pub mod pages;

pub use pages::{PageSurface, RenderOutcome, ViewerError, ViewerEvent};

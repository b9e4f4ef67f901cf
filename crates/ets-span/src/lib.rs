//! Source positions for the ETS lowering pipeline.
//!
//! Every node handed over by the front end carries a [`Span`] into the original
//! `.ets` text. Diagnostics and the `extraInfo` records attached to child component
//! construction turn those spans into line/column pairs through a [`LineIndex`].

mod line_index;
mod span;

pub use line_index::{LineCol, LineIndex};
pub use span::{ByteOffset, Span};

//! Highlight engine
//!
//! - `record`: the persisted description of one logical highlight
//! - `color`: palette and canonical colour tokens
//! - `fragment`: the markup contract for live highlight spans
//! - `splitter`: selection → fragments
//! - `anchor`: records → fragments on a reloaded page

pub mod anchor;
pub mod color;
pub mod fragment;
pub mod record;
pub mod splitter;

pub use anchor::{reload, restore, AnchorError, RestoreReport};
pub use color::{normalize_color, palette_index, ColorError, PALETTE};
pub use fragment::{HIGHLIGHT_CLASS, HIGHLIGHT_ID_ATTR};
pub use record::{generate_id, HighlightRecord};
pub use splitter::{split, SplitError};

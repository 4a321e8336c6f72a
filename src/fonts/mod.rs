//! Font encodings: the bridge between string operand bytes and Unicode text.

pub mod cmap;
pub mod encoding;
pub mod font;

pub use cmap::{CodespaceRange, ToUnicodeCMap};
pub use encoding::{BaseEncoding, SimpleEncoding, glyph_name_to_unicode};
pub use font::{CompositeEncoding, Font, FontArena, FontEncoding, FontHandle};

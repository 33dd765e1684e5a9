//! Currency display.
//!
//! Amounts are rendered with a fixed en-US layout regardless of the viewer's
//! locale, so symbol placement and separators are the same for every member
//! of a household.

pub mod format;
pub mod symbols;

pub use format::{format_amount, format_compact};
pub use symbols::{currency_symbol, is_known_currency};

//! Text scanning helpers shared by the wikitext round-trip crates.

pub mod comments;
pub mod lines;

pub use comments::{
    SepBit, comment_len_at, comment_wikitext, comment_wikitext_len, find_comment,
    is_valid_separator, separator_bits, strip_comments,
};
pub use lines::{count_newlines, ends_at_line_start, trailing_space_runs};

//! Line-oriented queries over emitted wikitext.

use std::ops::Range;

use memchr::{memchr_iter, memrchr_iter};

use crate::comments::comment_len_at;

pub fn count_newlines(s: &str) -> usize {
    memchr_iter(b'\n', s.as_bytes()).count()
}

/// True when `s` is empty or ends at the start of a line, ignoring any
/// comments that trail the last newline.
pub fn ends_at_line_start(s: &str) -> bool {
    if only_comments(s, 0) {
        return true;
    }
    memrchr_iter(b'\n', s.as_bytes()).any(|nl| only_comments(s, nl + 1))
}

fn only_comments(s: &str, mut pos: usize) -> bool {
    while pos < s.len() {
        match comment_len_at(s, pos) {
            Some(len) => pos += len,
            None => return false,
        }
    }
    true
}

/// Runs of spaces that reach the end of `s`, optionally followed by a
/// comment and then anything up to the end except a newline.
///
/// Runs are yielded left to right; the first one is what a leftmost
/// `( +)(<!--…-->[^\n]*)?$` match would capture.
pub fn trailing_space_runs(s: &str) -> Vec<Range<usize>> {
    let bytes = s.as_bytes();
    let mut runs = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        if bytes[pos] != b' ' {
            pos += 1;
            continue;
        }
        let start = pos;
        while bytes.get(pos) == Some(&b' ') {
            pos += 1;
        }
        let tail_ok = pos == bytes.len()
            || comment_len_at(s, pos)
                .is_some_and(|len| !bytes[pos + len..].contains(&b'\n'));
        if tail_ok {
            runs.push(start..pos);
        }
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newline_counting() {
        assert_eq!(count_newlines(""), 0);
        assert_eq!(count_newlines("a\n\nb\n"), 3);
    }

    #[test]
    fn line_start_ignores_trailing_comments() {
        assert!(ends_at_line_start(""));
        assert!(ends_at_line_start("abc\n"));
        assert!(ends_at_line_start("abc\n<!--x-->"));
        assert!(ends_at_line_start("abc\n<!--x\ny-->"));
        assert!(!ends_at_line_start("abc"));
        assert!(!ends_at_line_start("\nabc<!--x-->"));
    }

    #[test]
    fn space_runs_reaching_the_end() {
        assert_eq!(trailing_space_runs("\n  "), vec![1..3]);
        assert_eq!(trailing_space_runs("\n <!--c--> tail"), vec![1..2]);
        assert_eq!(trailing_space_runs("a b"), Vec::<Range<usize>>::new());
        assert_eq!(trailing_space_runs(" <!--c-->\nx"), Vec::<Range<usize>>::new());
    }
}

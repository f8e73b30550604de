//! HTML comment scanning for wikitext separator text.
//!
//! A comment is `<!--` followed by the shortest run of bytes that ends in
//! `-->`. An opening `<!--` with no terminator is plain text, and so is every
//! later `<!--` in the same string (none of them can be terminated either).

use std::borrow::Cow;

use memchr::memmem;

pub const COMMENT_OPEN: &str = "<!--";
pub const COMMENT_CLOSE: &str = "-->";

/// Byte length of the comment that starts exactly at `at`, if any.
pub fn comment_len_at(s: &str, at: usize) -> Option<usize> {
    let rest = s.as_bytes().get(at..)?;
    if !rest.starts_with(COMMENT_OPEN.as_bytes()) {
        return None;
    }
    let body = &rest[COMMENT_OPEN.len()..];
    let close = memmem::find(body, COMMENT_CLOSE.as_bytes())?;
    Some(COMMENT_OPEN.len() + close + COMMENT_CLOSE.len())
}

/// First complete comment at or after `from`, as a `(start, end)` byte range.
pub fn find_comment(s: &str, from: usize) -> Option<(usize, usize)> {
    let hay = s.as_bytes().get(from..)?;
    let start = from + memmem::find(hay, COMMENT_OPEN.as_bytes())?;
    let len = comment_len_at(s, start)?;
    Some((start, start + len))
}

/// `s` with every complete comment removed.
pub fn strip_comments(s: &str) -> Cow<'_, str> {
    let Some((first_start, first_end)) = find_comment(s, 0) else {
        return Cow::Borrowed(s);
    };
    let mut out = String::with_capacity(s.len());
    out.push_str(&s[..first_start]);
    let mut pos = first_end;
    while let Some((start, end)) = find_comment(s, pos) {
        out.push_str(&s[pos..start]);
        pos = end;
    }
    out.push_str(&s[pos..]);
    Cow::Owned(out)
}

/// Wikitext for a comment node whose data is `text`.
pub fn comment_wikitext(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 7);
    out.push_str(COMMENT_OPEN);
    out.push_str(text);
    out.push_str(COMMENT_CLOSE);
    out
}

/// Byte length of [`comment_wikitext`] without building it.
pub fn comment_wikitext_len(text: &str) -> usize {
    COMMENT_OPEN.len() + text.len() + COMMENT_CLOSE.len()
}

/// True when `sep` consists only of whitespace and complete comments.
pub fn is_valid_separator(sep: &str) -> bool {
    let mut pos = 0;
    while pos < sep.len() {
        if let Some(len) = comment_len_at(sep, pos) {
            pos += len;
            continue;
        }
        match sep[pos..].chars().next() {
            Some(ch) if ch.is_whitespace() => pos += ch.len_utf8(),
            _ => return false,
        }
    }
    true
}

/// One piece of a separator split for newline accounting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SepBit<'a> {
    pub text: &'a str,
    /// Comments, and runs of lines holding only comments and blanks. Newlines
    /// inside these bits are invisible to the wikitext parser.
    pub ignorable: bool,
}

/// Split a separator into countable and ignorable bits.
///
/// Ignorable bits are either a single comment, or one or more lines that
/// each contain at least one comment and otherwise only spaces or tabs,
/// taken together with their leading newline (the newline that ends the last
/// such line stays in the following bit).
pub fn separator_bits(sep: &str) -> Vec<SepBit<'_>> {
    let bytes = sep.as_bytes();
    let mut bits = Vec::new();
    let mut plain_start = 0;
    let mut pos = 0;
    while pos < bytes.len() {
        let matched = if bytes[pos] == b'\n' {
            comment_lines_end(sep, pos)
        } else {
            comment_len_at(sep, pos).map(|len| pos + len)
        };
        match matched {
            Some(end) => {
                if plain_start < pos {
                    bits.push(SepBit {
                        text: &sep[plain_start..pos],
                        ignorable: false,
                    });
                }
                bits.push(SepBit {
                    text: &sep[pos..end],
                    ignorable: true,
                });
                pos = end;
                plain_start = end;
            }
            None => pos += 1,
        }
    }
    if plain_start < bytes.len() {
        bits.push(SepBit {
            text: &sep[plain_start..],
            ignorable: false,
        });
    }
    bits
}

/// Match `(\n([ \t]*COMMENT[ \t]*)+ (?=\n))+` starting at a newline.
fn comment_lines_end(sep: &str, at: usize) -> Option<usize> {
    let bytes = sep.as_bytes();
    let mut end = None;
    let mut line_start = at;
    while bytes.get(line_start) == Some(&b'\n') {
        let mut pos = line_start + 1;
        let mut comments = 0;
        loop {
            let after_ws = skip_blanks(bytes, pos);
            match comment_len_at(sep, after_ws) {
                Some(len) => {
                    pos = after_ws + len;
                    comments += 1;
                }
                None => {
                    pos = after_ws;
                    break;
                }
            }
        }
        if comments == 0 || bytes.get(pos) != Some(&b'\n') {
            break;
        }
        end = Some(pos);
        line_start = pos;
    }
    end
}

fn skip_blanks(bytes: &[u8], mut pos: usize) -> usize {
    while matches!(bytes.get(pos), Some(b' ' | b'\t')) {
        pos += 1;
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_ends_at_first_terminator() {
        assert_eq!(comment_len_at("<!-- a -->b-->", 0), Some(10));
        assert_eq!(comment_len_at("<!---->", 0), Some(7));
        assert_eq!(comment_len_at("<!--->", 0), None);
        assert_eq!(comment_len_at("x<!--a-->", 0), None);
    }

    #[test]
    fn strip_comments_keeps_unterminated_open() {
        assert_eq!(strip_comments("a<!--x-->b"), "ab");
        assert_eq!(strip_comments("a<!--x"), "a<!--x");
        assert!(matches!(strip_comments("plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn separator_validity() {
        assert!(is_valid_separator(""));
        assert!(is_valid_separator("\n \t<!-- c -->\n"));
        assert!(!is_valid_separator("\nx"));
        assert!(!is_valid_separator("<!-- open"));
    }

    #[test]
    fn comment_only_lines_are_ignorable() {
        let bits = separator_bits("\n<!--a-->\n\n");
        assert_eq!(
            bits,
            vec![
                SepBit {
                    text: "\n<!--a-->",
                    ignorable: true
                },
                SepBit {
                    text: "\n\n",
                    ignorable: false
                },
            ]
        );
    }

    #[test]
    fn inline_comment_is_its_own_bit() {
        let bits = separator_bits("\n <!--a--> x");
        let texts: Vec<_> = bits.iter().map(|b| (b.text, b.ignorable)).collect();
        assert_eq!(
            texts,
            vec![("\n ", false), ("<!--a-->", true), (" x", false)]
        );
    }
}

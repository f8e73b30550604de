//! Mutable state of one serialization run.

use log::trace;
use tools::strip_comments;
use wtdom::NodeId;

use crate::config::{SerializeMode, WikiConfig};
use crate::constrained_text::{ConstrainedText, escape_line};
use crate::constraints::SeparatorConstraints;

const TRACE: &str = "html2wt.state";

/// Separator text collected since the last emitted chunk, and the
/// constraints accumulated for it.
#[derive(Clone, Debug, Default)]
pub struct SeparatorState {
    /// Whitespace and comments seen between the last chunk and the next.
    pub src: Option<String>,
    pub constraints: Option<SeparatorConstraints>,
    /// Node whose output (or diff marker) was seen last.
    pub last_source_node: Option<NodeId>,
}

/// The wikitext line being assembled. Chunks are escaped together once the
/// line is complete.
#[derive(Clone, Debug, Default)]
pub struct CurrLine {
    pub text: String,
    pub chunks: Vec<ConstrainedText>,
    pub first_node: Option<NodeId>,
}

/// Stack of "newlines are not allowed here" scopes. `disable` pushes a scope
/// that lifts an outer `enforce`.
#[derive(Clone, Debug, Default)]
pub struct SingleLineContext {
    stack: Vec<bool>,
}

impl SingleLineContext {
    pub fn enforce(&mut self) {
        self.stack.push(true);
    }

    pub fn disable(&mut self) {
        self.stack.push(false);
    }

    pub fn pop(&mut self) {
        self.stack.pop();
    }

    pub fn enforced(&self) -> bool {
        self.stack.last().copied().unwrap_or(false)
    }
}

#[derive(Clone, Debug)]
pub struct SerializerState {
    pub sep: SeparatorState,
    /// The next character starts a wikitext line.
    pub on_sol: bool,
    /// Escape the next chunk as novel text.
    pub escape_text: bool,
    pub at_start_of_output: bool,
    pub selser: bool,
    pub rt_test: bool,
    pub in_indent_pre: bool,
    pub in_php_block: bool,
    pub in_link: bool,
    /// Serializing inside a subtree the edit inserted.
    pub in_modified_content: bool,
    /// A separator received a `<nowiki> </nowiki>` indent-pre escape.
    pub has_indent_pre_nowikis: bool,
    pub prev_node_unmodified: bool,
    pub curr_node_unmodified: bool,
    pub prev_node: Option<NodeId>,
    pub wiki_table_nesting: usize,
    pub curr_line: CurrLine,
    pub out: String,
    pub single_line: SingleLineContext,
}

impl SerializerState {
    pub fn new(mode: SerializeMode) -> Self {
        let selser = mode == SerializeMode::Selser;
        Self {
            sep: SeparatorState::default(),
            on_sol: true,
            escape_text: false,
            at_start_of_output: true,
            selser,
            // Never both.
            rt_test: mode == SerializeMode::RtTest && !selser,
            in_indent_pre: false,
            in_php_block: false,
            in_link: false,
            in_modified_content: false,
            has_indent_pre_nowikis: false,
            prev_node_unmodified: false,
            curr_node_unmodified: false,
            prev_node: None,
            wiki_table_nesting: 0,
            curr_line: CurrLine::default(),
            out: String::new(),
            single_line: SingleLineContext::default(),
        }
    }

    /// Original source may be consulted for separators.
    pub fn reuses_source(&self) -> bool {
        self.selser || self.rt_test
    }

    pub fn set_sep(&mut self, src: String) {
        self.sep_introduced_sol(&src);
        self.sep.src = Some(src);
    }

    pub fn append_sep(&mut self, src: &str) {
        let mut sep = self.sep.src.take().unwrap_or_default();
        sep.push_str(src);
        self.set_sep(sep);
    }

    pub fn update_sep(&mut self, node: NodeId) {
        self.sep.last_source_node = Some(node);
    }

    pub fn reset_curr_line(&mut self, node: Option<NodeId>) {
        self.curr_line = CurrLine {
            first_node: node,
            ..CurrLine::default()
        };
    }

    /// Escape the buffered line and append it to the output.
    pub fn flush_line(&mut self, wiki: &WikiConfig) {
        self.out.push_str(&escape_line(&self.curr_line.chunks, wiki));
        self.curr_line.chunks.clear();
    }

    pub fn update_modification_flags(&mut self, node: NodeId) {
        self.prev_node_unmodified = self.curr_node_unmodified;
        self.curr_node_unmodified = false;
        self.prev_node = Some(node);
    }

    /// A separator ending in a newline (comments aside) puts us at SOL.
    pub fn sep_introduced_sol(&mut self, sep: &str) {
        if strip_comments(sep).ends_with('\n') {
            self.on_sol = true;
        }
    }

    pub fn push(&mut self, chunk: ConstrainedText) {
        self.curr_line.chunks.push(chunk);
    }

    pub fn push_sep(&mut self, sep: String, node: NodeId) {
        let sep = if self.single_line.enforced() {
            sep.replace('\n', " ")
        } else {
            sep
        };
        trace!(target: TRACE, "---> SEP {sep:?}");
        self.sep = SeparatorState {
            last_source_node: Some(node),
            ..SeparatorState::default()
        };
        self.sep_introduced_sol(&sep);
        self.push(ConstrainedText::plain(sep, node));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const N: NodeId = NodeId(0);

    #[test]
    fn selser_turns_rt_test_off() {
        let state = SerializerState::new(SerializeMode::Selser);
        assert!(state.selser && !state.rt_test);
        let state = SerializerState::new(SerializeMode::RtTest);
        assert!(!state.selser && state.rt_test);
        assert!(state.reuses_source());
        assert!(!SerializerState::new(SerializeMode::Normal).reuses_source());
    }

    #[test]
    fn separator_ending_in_newline_sets_sol() {
        let mut state = SerializerState::new(SerializeMode::Normal);
        state.on_sol = false;
        state.set_sep(" <!--x-->".into());
        assert!(!state.on_sol);
        state.set_sep("\n<!--x-->".into());
        assert!(state.on_sol);
    }

    #[test]
    fn push_sep_resets_collected_separator() {
        let mut state = SerializerState::new(SerializeMode::Normal);
        state.append_sep(" ");
        state.append_sep("<!--c-->");
        assert_eq!(state.sep.src.as_deref(), Some(" <!--c-->"));
        state.update_sep(NodeId(3));
        state.push_sep("\n".into(), N);
        assert!(state.sep.src.is_none());
        assert_eq!(state.sep.last_source_node, Some(N));
        assert_eq!(state.curr_line.chunks.len(), 1);
    }

    #[test]
    fn single_line_context_flattens_separators() {
        let mut state = SerializerState::new(SerializeMode::Normal);
        state.single_line.enforce();
        state.single_line.disable();
        assert!(!state.single_line.enforced());
        state.single_line.pop();
        state.push_sep("\n\n".into(), N);
        assert_eq!(state.curr_line.chunks[0].text, "  ");
    }

    #[test]
    fn flush_escapes_and_clears() {
        let mut state = SerializerState::new(SerializeMode::Normal);
        state.push(ConstrainedText::wiki_link("[[a]]", NodeId(1), "mw:WikiLink"));
        state.push(ConstrainedText::plain("b", N));
        state.flush_line(&WikiConfig::default());
        assert_eq!(state.out, "[[a]]<nowiki/>b");
        assert!(state.curr_line.chunks.is_empty());
    }
}

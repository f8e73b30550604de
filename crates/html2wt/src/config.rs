use std::sync::LazyLock;

use regex::Regex;

static DEFAULT_LINK_TRAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-z]+)").expect("valid link trail regex"));

/// How much of the original source the serializer may reuse.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SerializeMode {
    /// Everything is regenerated from the DOM.
    #[default]
    Normal,
    /// Regenerate, but reuse original separators where DSR allows it.
    RtTest,
    /// Selective serialization: unmodified subtrees are copied from source.
    Selser,
}

/// Per-wiki syntax knobs that affect escaping.
#[derive(Clone, Debug)]
pub struct WikiConfig {
    /// Letters glued onto `[[Foo]]` that become part of the link label.
    /// `None` disables trail handling.
    pub link_trail: Option<Regex>,
    /// Letters before `[[Foo]]` that become part of the label (used by a few
    /// languages).
    pub link_prefix: Option<Regex>,
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            link_trail: Some(DEFAULT_LINK_TRAIL.clone()),
            link_prefix: None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SerializerConfig {
    pub mode: SerializeMode,
    pub wiki: WikiConfig,
}

impl SerializerConfig {
    pub fn selser() -> Self {
        Self {
            mode: SerializeMode::Selser,
            ..Self::default()
        }
    }

    pub fn rt_test() -> Self {
        Self {
            mode: SerializeMode::RtTest,
            ..Self::default()
        }
    }
}

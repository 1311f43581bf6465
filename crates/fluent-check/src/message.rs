//! Fluent Message
//!
//! Assembles the text of a failed check from a sentence template and up to
//! two value blocks:
//!
//! ```text
//! The checked string is not the expected one.
//! The checked string:
//!     ["a"]
//! The expected string:
//!     ["b"]
//! ```
//!
//! Placeholders `{0}`/`{checked}` name the checked side, `{1}`/`{expected}`/
//! `{given}` the reference side. When both sides resolve to the same entity,
//! the side whose placeholder comes later in the template is called "one".

use std::fmt;

use crate::format::Formatter;
use crate::inspect::{Inspect, Kind, Snapshot, TypeInfo};
use crate::naming::EntityNaming;
use crate::render::{count_suffix, item_count, EnumerableRenderer};
use crate::settings::Settings;

const CHECKED_PLACEHOLDERS: [&str; 2] = ["{0}", "{checked}"];
const REFERENCE_PLACEHOLDERS: [&str; 3] = ["{1}", "{expected}", "{given}"];

/// Role of a block in a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockSide {
    /// The value under test
    Checked,
    /// The value it should match
    Expected,
    /// A value supplied to the check
    Given,
}

impl BlockSide {
    /// Adjective used in labels
    #[must_use]
    pub const fn word(self) -> &'static str {
        match self {
            Self::Checked => "checked",
            Self::Expected => "expected",
            Self::Given => "given",
        }
    }
}

/// One labelled value of a message
#[derive(Debug, Clone)]
pub struct MessageBlock {
    side: BlockSide,
    value: Snapshot,
    entity: EntityNaming,
    include_type: bool,
    enumerable_count: bool,
    highlight: Option<usize>,
    window: Option<usize>,
    comparison: Option<String>,
}

impl MessageBlock {
    /// Capture `value` for `side`
    #[must_use]
    pub fn new<V: Inspect + ?Sized>(side: BlockSide, value: &V) -> Self {
        Self::from_snapshot(side, Snapshot::of(value))
    }

    /// Block over an existing capture
    #[must_use]
    pub fn from_snapshot(side: BlockSide, value: Snapshot) -> Self {
        let entity = EntityNaming::for_type(value.node().info.clone());
        Self {
            side,
            value,
            entity,
            include_type: false,
            enumerable_count: false,
            highlight: None,
            window: None,
            comparison: None,
        }
    }

    /// Role of the block
    #[must_use]
    pub const fn side(&self) -> BlockSide {
        self.side
    }

    /// Captured value
    #[must_use]
    pub const fn value(&self) -> &Snapshot {
        &self.value
    }

    fn info(&self) -> &TypeInfo {
        &self.value.node().info
    }

    fn is_null(&self) -> bool {
        matches!(self.value.node().kind, Kind::Null)
    }

    fn naming(&self, message: &EntityNaming) -> EntityNaming {
        let mut naming = self.entity.clone();
        naming.merge(message);
        naming
    }

    fn text(&self, settings: &Settings) -> String {
        let (graph, root) = (&self.value.graph, self.value.root);
        if self.value.node().kind.is_enumerable() {
            let window = self.window.or_else(|| self.highlight.map(|_| settings.window_size));
            EnumerableRenderer::new(settings).render(graph, root, self.highlight, window)
        } else {
            Formatter::new(settings).format(graph, root)
        }
    }

    fn render(&self, entity: &str, text: &str, with_type: bool, hash: Option<u64>) -> String {
        let mut out = format!("The {} {entity}:", self.side.word());
        if let Some(comparison) = &self.comparison {
            out.push(' ');
            out.push_str(comparison);
        }
        out.push_str("\n\t[");
        out.push_str(text);
        out.push(']');
        if self.enumerable_count {
            if let Some(count) = item_count(&self.value.graph, self.value.root) {
                out.push(' ');
                out.push_str(&count_suffix(count));
            }
        }
        if with_type || self.include_type {
            out.push_str(&format!(" of type: [{}]", self.info().name()));
        }
        if let Some(hash) = hash {
            out.push_str(&format!(" with HashCode: [{hash}]"));
        }
        out
    }
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// Identity of the shared allocation, else FNV-1a of type token and text
#[must_use]
pub fn hash_code(value: &Snapshot, text: &str) -> u64 {
    if let Some(identity) = value.node().identity {
        return identity as u64;
    }
    let mut hash = FNV_OFFSET;
    for byte in value.node().info.token().bytes().chain(text.bytes()) {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

fn first_position(template: &str, placeholders: &[&str]) -> Option<usize> {
    placeholders.iter().filter_map(|p| template.find(p)).min()
}

fn substitute(template: &str, placeholders: &[&str], text: &str) -> String {
    placeholders
        .iter()
        .fold(template.to_string(), |acc, p| acc.replace(p, text))
}

/// Builder and renderer of a failure message
#[derive(Debug, Clone)]
pub struct FluentMessage {
    template: String,
    checked: Option<MessageBlock>,
    reference: Option<MessageBlock>,
    current: Option<BlockSide>,
    prefix: Option<String>,
    entity: EntityNaming,
    settings: Settings,
}

impl FluentMessage {
    /// Start a message from a sentence template, using process-wide settings
    #[must_use]
    pub fn build(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            checked: None,
            reference: None,
            current: None,
            prefix: None,
            entity: EntityNaming::new(),
            settings: Settings::current(),
        }
    }

    /// Render with explicit settings
    #[must_use]
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Set the checked value; following block options apply to it
    #[must_use]
    pub fn on<V: Inspect + ?Sized>(mut self, value: &V) -> Self {
        self.checked = Some(MessageBlock::new(BlockSide::Checked, value));
        self.current = Some(BlockSide::Checked);
        self
    }

    /// Continuation, reads as "on(x).and().expected(y)"
    #[must_use]
    pub fn and(self) -> Self {
        self
    }

    /// Set the expected value; following block options apply to it
    #[must_use]
    pub fn expected<V: Inspect + ?Sized>(self, value: &V) -> Self {
        self.reference_block(MessageBlock::new(BlockSide::Expected, value))
    }

    /// Expected value holding several acceptable values, named in plural
    #[must_use]
    pub fn expected_values<V: Inspect + ?Sized>(self, values: &V) -> Self {
        let mut block = MessageBlock::new(BlockSide::Expected, values);
        block.entity = EntityNaming::new();
        block.entity.set_plural(true);
        block.enumerable_count = true;
        self.reference_block(block)
    }

    /// Set a given value, labelled "given"
    #[must_use]
    pub fn given<V: Inspect + ?Sized>(self, value: &V) -> Self {
        self.reference_block(MessageBlock::new(BlockSide::Given, value))
    }

    fn reference_block(mut self, block: MessageBlock) -> Self {
        self.current = Some(block.side);
        self.reference = Some(block);
        self
    }

    fn current_block(&mut self) -> Option<&mut MessageBlock> {
        match self.current? {
            BlockSide::Checked => self.checked.as_mut(),
            BlockSide::Expected | BlockSide::Given => self.reference.as_mut(),
        }
    }

    fn with_current(mut self, apply: impl FnOnce(&mut MessageBlock)) -> Self {
        if let Some(block) = self.current_block() {
            apply(block);
        }
        self
    }

    /// Qualify the current block's label (`The expected value: different from`)
    #[must_use]
    pub fn comparison(self, verb: impl Into<String>) -> Self {
        let verb = verb.into();
        self.with_current(|block| block.comparison = Some(verb))
    }

    /// Show the current block's type
    #[must_use]
    pub fn with_type(self) -> Self {
        self.with_current(|block| block.include_type = true)
    }

    /// Show the current block's item count
    #[must_use]
    pub fn with_enumerable_count(self) -> Self {
        self.with_current(|block| block.enumerable_count = true)
    }

    /// Highlight an item of the current block
    #[must_use]
    pub fn reference_index(self, index: usize) -> Self {
        self.with_current(|block| block.highlight = Some(index))
    }

    /// Items shown around the highlight of the current block
    #[must_use]
    pub fn window(self, size: usize) -> Self {
        self.with_current(|block| block.window = Some(size))
    }

    /// Name the current block explicitly
    #[must_use]
    pub fn label(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.with_current(|block| block.entity.set_override(name))
    }

    /// Name both sides after `info`
    #[must_use]
    pub fn for_type(mut self, info: TypeInfo) -> Self {
        self.entity.set_type(info);
        self
    }

    /// Name both sides explicitly
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.entity.set_override(name);
        self
    }

    /// Line printed before the sentence
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    fn side_label(&self, block: Option<&MessageBlock>) -> String {
        match block {
            Some(block) => block.naming(&self.entity).label(),
            None => self.entity.label(),
        }
    }

    fn sentence(&self, checked_entity: &str, reference_entity: &str) -> String {
        let reference_word = self
            .reference
            .as_ref()
            .map_or(BlockSide::Expected, MessageBlock::side)
            .word();
        let mut checked_text = format!("checked {checked_entity}");
        let mut reference_text = format!("{reference_word} {reference_entity}");
        if checked_entity == reference_entity {
            match (
                first_position(&self.template, &CHECKED_PLACEHOLDERS),
                first_position(&self.template, &REFERENCE_PLACEHOLDERS),
            ) {
                (Some(c), Some(r)) if c < r => reference_text = format!("{reference_word} one"),
                (Some(_), Some(_)) => checked_text = "checked one".to_string(),
                _ => {}
            }
        }
        let sentence = substitute(&self.template, &CHECKED_PLACEHOLDERS, &checked_text);
        substitute(&sentence, &REFERENCE_PLACEHOLDERS, &reference_text)
    }

    /// Render the message
    #[must_use]
    pub fn render(&self) -> String {
        let checked_entity = self.side_label(self.checked.as_ref());
        let reference_entity = self.side_label(self.reference.as_ref());

        let mut lines = Vec::with_capacity(4);
        if let Some(prefix) = &self.prefix {
            lines.push(prefix.clone());
        }
        lines.push(self.sentence(&checked_entity, &reference_entity));

        let checked_text = self.checked.as_ref().map(|b| b.text(&self.settings));
        let reference_text = self.reference.as_ref().map(|b| b.text(&self.settings));

        let (force_type, hashes) = match (&self.checked, &self.reference) {
            (Some(c), Some(r)) => {
                let same_type = c.info().token() == r.info().token();
                let force = !same_type || c.is_null();
                let shared = c.value.node().identity.is_some() || r.value.node().identity.is_some();
                let hashes = (same_type && shared && checked_text == reference_text).then(|| {
                    let text = checked_text.as_deref().unwrap_or_default();
                    (hash_code(&c.value, text), hash_code(&r.value, text))
                });
                (force, hashes)
            }
            (Some(c), None) => (c.is_null(), None),
            _ => (false, None),
        };

        if let (Some(block), Some(text)) = (&self.checked, &checked_text) {
            lines.push(block.render(&checked_entity, text, force_type, hashes.map(|h| h.0)));
        }
        if let (Some(block), Some(text)) = (&self.reference, &reference_text) {
            lines.push(block.render(&reference_entity, text, force_type, hashes.map(|h| h.1)));
        }
        lines.join("\n")
    }
}

impl fmt::Display for FluentMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

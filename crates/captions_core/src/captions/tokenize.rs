//! Cue text markup tokenizer.
//!
//! Turns WebVTT cue text such as `<v Bob><i>Hi</i> &amp; bye` into a tree
//! of [`CueNode`]s for a renderer. Unknown tags are dropped but their text
//! is kept. Unclosed tags simply nest; end tags close the innermost open
//! tag regardless of their name.

use serde::Serialize;

use super::timing::parse_vtt_timestamp;
use super::types::Cue;

/// Inline markup kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TagKind {
    /// `<c>` class span
    Class,
    Italic,
    Bold,
    Underline,
    Ruby,
    RubyText,
    Voice,
    Lang,
    Timestamp,
}

impl TagKind {
    fn from_tag(name: &str) -> Option<Self> {
        match name {
            "c" => Some(Self::Class),
            "i" => Some(Self::Italic),
            "b" => Some(Self::Bold),
            "u" => Some(Self::Underline),
            "ruby" => Some(Self::Ruby),
            "rt" => Some(Self::RubyText),
            "v" => Some(Self::Voice),
            "lang" => Some(Self::Lang),
            _ => None,
        }
    }

    /// Element name a renderer would use for this kind.
    pub fn element_name(&self) -> &'static str {
        match self {
            TagKind::Italic => "i",
            TagKind::Bold => "b",
            TagKind::Underline => "u",
            TagKind::Ruby => "ruby",
            TagKind::RubyText => "rt",
            TagKind::Class | TagKind::Voice | TagKind::Lang | TagKind::Timestamp => "span",
        }
    }
}

/// A markup element and its children.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CueElement {
    pub kind: TagKind,
    /// Space separated class names (colors excluded).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bg_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    /// Seconds, for timestamp tags.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
    pub children: Vec<CueNode>,
}

impl CueElement {
    fn new(kind: TagKind) -> Self {
        Self {
            kind,
            class: None,
            color: None,
            bg_color: None,
            voice: None,
            lang: None,
            time: None,
            children: Vec::new(),
        }
    }
}

/// A node of the tokenized cue text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CueNode {
    Text(String),
    Element(CueElement),
}

const COLORS: [&str; 8] = [
    "white", "lime", "cyan", "red", "yellow", "magenta", "blue", "black",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Data,
    Tag,
    Class,
    Annotation,
    EndTag,
    Timestamp,
}

struct Tokenizer {
    start_time: f64,
    end_time: f64,
    mode: Mode,
    buffer: String,
    root: Vec<CueNode>,
    /// Innermost open element last.
    open: Vec<CueElement>,
    /// Set when the current tag opened an element.
    opened: bool,
}

impl Tokenizer {
    fn new(start_time: f64, end_time: f64) -> Self {
        Self {
            start_time,
            end_time,
            mode: Mode::Data,
            buffer: String::new(),
            root: Vec::new(),
            open: Vec::new(),
            opened: false,
        }
    }

    fn push_node(&mut self, node: CueNode) {
        match self.open.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.root.push(node),
        }
    }

    fn add_text(&mut self) {
        if !self.buffer.is_empty() {
            let text = decode_entities(&std::mem::take(&mut self.buffer));
            self.push_node(CueNode::Text(text));
        }
    }

    fn open_element(&mut self, kind: TagKind) {
        self.open.push(CueElement::new(kind));
        self.opened = true;
    }

    fn add_tag(&mut self) {
        if let Some(kind) = TagKind::from_tag(&self.buffer) {
            self.open_element(kind);
        }
        self.buffer.clear();
    }

    fn close_element(&mut self) {
        if let Some(element) = self.open.pop() {
            self.push_node(CueNode::Element(element));
        }
    }

    fn add_class(&mut self) {
        let name = std::mem::take(&mut self.buffer);
        if !self.opened || name.is_empty() {
            return;
        }
        let Some(element) = self.open.last_mut() else {
            return;
        };

        let (is_bg, color) = match name.strip_prefix("bg_") {
            Some(rest) => (true, rest),
            None => (false, name.as_str()),
        };
        if COLORS.contains(&color) {
            if is_bg {
                element.bg_color = Some(color.to_string());
            } else {
                element.color = Some(color.to_string());
            }
        } else {
            element.class = Some(match element.class.take() {
                Some(existing) => format!("{} {}", existing, name),
                None => name,
            });
        }
    }

    fn add_annotation(&mut self) {
        let annotation = decode_entities(&collapse_whitespace(&std::mem::take(&mut self.buffer)));
        if !self.opened {
            return;
        }
        if let Some(element) = self.open.last_mut() {
            match element.kind {
                TagKind::Voice => element.voice = Some(annotation),
                TagKind::Lang => element.lang = Some(annotation),
                _ => {}
            }
        }
    }

    fn add_timestamp(&mut self) {
        let text = std::mem::take(&mut self.buffer);
        if let Some(time) = parse_vtt_timestamp(&text) {
            if time >= self.start_time && time <= self.end_time {
                self.open_element(TagKind::Timestamp);
                if let Some(element) = self.open.last_mut() {
                    element.time = Some(time);
                }
            }
        }
    }

    fn feed(&mut self, c: char) {
        match self.mode {
            Mode::Data => {
                if c == '<' {
                    self.add_text();
                    self.opened = false;
                    self.mode = Mode::Tag;
                } else {
                    self.buffer.push(c);
                }
            }
            Mode::Tag => match c {
                c if c.is_whitespace() => {
                    self.add_tag();
                    self.mode = Mode::Annotation;
                }
                '.' => {
                    self.add_tag();
                    self.mode = Mode::Class;
                }
                '/' => self.mode = Mode::EndTag,
                '>' => {
                    self.add_tag();
                    self.mode = Mode::Data;
                }
                _ => {
                    if self.buffer.is_empty() && c.is_ascii_digit() {
                        self.mode = Mode::Timestamp;
                    }
                    self.buffer.push(c);
                }
            },
            Mode::Class => match c {
                c if c.is_whitespace() => {
                    self.add_class();
                    self.mode = Mode::Annotation;
                }
                '.' => self.add_class(),
                '>' => {
                    self.add_class();
                    self.mode = Mode::Data;
                }
                _ => self.buffer.push(c),
            },
            Mode::Annotation => {
                if c == '>' {
                    self.add_annotation();
                    self.mode = Mode::Data;
                } else {
                    self.buffer.push(c);
                }
            }
            Mode::EndTag => {
                if c == '>' {
                    self.buffer.clear();
                    self.close_element();
                    self.mode = Mode::Data;
                }
            }
            Mode::Timestamp => {
                if c == '>' {
                    self.add_timestamp();
                    self.mode = Mode::Data;
                } else {
                    self.buffer.push(c);
                }
            }
        }
    }

    fn finish(mut self) -> Vec<CueNode> {
        if self.mode == Mode::Data {
            self.add_text();
        }
        while !self.open.is_empty() {
            self.close_element();
        }
        self.root
    }
}

/// Tokenize a cue's text.
pub fn tokenize_cue(cue: &Cue) -> Vec<CueNode> {
    tokenize_text(&cue.text, cue.start_time, cue.end_time)
}

/// Tokenize markup text. Timestamp tags outside `start..=end` are dropped.
pub fn tokenize_text(text: &str, start_time: f64, end_time: f64) -> Vec<CueNode> {
    let mut tokenizer = Tokenizer::new(start_time, end_time);
    for c in text.chars() {
        tokenizer.feed(c);
    }
    tokenizer.finish()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    const ENTITIES: [(&str, &str); 9] = [
        ("&amp;", "&"),
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&quot;", "\""),
        ("&#39;", "'"),
        ("&#039;", "'"),
        ("&nbsp;", "\u{a0}"),
        ("&lrm;", "\u{200e}"),
        ("&rlm;", "\u{200f}"),
    ];

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    'outer: while let Some(index) = rest.find('&') {
        out.push_str(&rest[..index]);
        rest = &rest[index..];
        for (entity, replacement) in ENTITIES {
            if let Some(after) = rest.strip_prefix(entity) {
                out.push_str(replacement);
                rest = after;
                continue 'outer;
            }
        }
        out.push('&');
        rest = &rest[1..];
    }
    out.push_str(rest);
    out
}

//! Inline resolution.
//!
//! Leaf text is scanned left to right once. Leaf constructs (see
//! [`crate::leaf`]) are taken greedily; emphasis and strikethrough markers
//! become delimiter runs and `[`/`![` become bracket openers. A `]` closes the
//! nearest opener as a link or image, and the delimiter runs inside it are
//! paired before the link swallows them. Runs left over at the end are paired
//! once more across the whole text; anything unpaired stays literal.
//!
//! Pairing resolves strikethrough before emphasis: a `~` span wins over an
//! emphasis span crossing it, and emphasis nested inside it is resolved
//! within its bounds.
//!
//! Nodes live in a [`Chain`], an arena with prev/next links, so wrapping a
//! range of nodes into emphasis never shifts the positions held by the
//! delimiter and bracket stacks.

use crate::ast::{Emphasis, Image, Inline, Link, ReferenceMap};
use crate::error::Diagnostic;
use crate::leaf;
use crate::options::{Extension, Options};
use crate::text::{
    is_punctuation, is_whitespace, normalize_label, read_link_destination, read_link_label,
    read_link_title, skip_inner_spaces, trim_spaces, MAX_LABEL_LEN,
};

/// Bytes that may start something other than literal text.
static SPECIAL: [bool; 256] = {
    let mut table = [false; 256];
    let bytes = b"\\`*_~[]!<$ \n";
    let mut i = 0;
    while i < bytes.len() {
        table[bytes[i] as usize] = true;
        i += 1;
    }
    table
};

/// Bytes after which an extended autolink may start.
static BOUNDARY: [bool; 256] = {
    let mut table = [false; 256];
    let bytes = b" \t\n\r\x0c*_~(";
    let mut i = 0;
    while i < bytes.len() {
        table[bytes[i] as usize] = true;
        i += 1;
    }
    table
};

/// Resolves the raw text of leaf blocks into inline nodes.
pub(crate) struct InlineParser<'p> {
    references: &'p ReferenceMap,
    options: &'p Options,
    /// Findings collected across every leaf this parser resolved.
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl<'p> InlineParser<'p> {
    pub(crate) fn new(references: &'p ReferenceMap, options: &'p Options) -> Self {
        Self {
            references,
            options,
            diagnostics: Vec::new(),
        }
    }

    /// Resolve one leaf's text. Leading and trailing spaces and tabs are
    /// not part of the content.
    pub(crate) fn parse(&mut self, text: &str) -> Vec<Inline> {
        let text = trim_spaces(text);
        if text.is_empty() {
            return Vec::new();
        }
        let mut scan = Scan::new(text, self.options);
        scan.run(self);
        scan.chain.into_inlines()
    }
}

// =============================================================================
// Node chain
// =============================================================================

/// A delimiter run of `*`, `_` or `~`.
#[derive(Debug, Clone, Copy)]
struct Run {
    marker: u8,
    /// Markers not yet consumed by a pairing.
    len: usize,
    /// Length as written, for the rule of three.
    original: usize,
    can_open: bool,
    can_close: bool,
}

#[derive(Debug)]
enum Item {
    Node(Inline),
    Run(Run),
    Vacant,
}

impl Item {
    fn into_inline(self) -> Option<Inline> {
        match self {
            Item::Node(inline) => Some(inline),
            Item::Run(run) if run.len > 0 => {
                Some(Inline::Text(String::from(run.marker as char).repeat(run.len)))
            }
            Item::Run(_) | Item::Vacant => None,
        }
    }
}

#[derive(Debug)]
struct Slot {
    item: Item,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Doubly linked list of inline items backed by a vector.
#[derive(Debug, Default)]
struct Chain {
    slots: Vec<Slot>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl Chain {
    fn push(&mut self, item: Item) -> usize {
        let id = self.slots.len();
        self.slots.push(Slot {
            item,
            prev: self.tail,
            next: None,
        });
        match self.tail {
            Some(tail) => self.slots[tail].next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        id
    }

    fn insert_after(&mut self, at: usize, item: Item) -> usize {
        let id = self.slots.len();
        let next = self.slots[at].next;
        self.slots.push(Slot {
            item,
            prev: Some(at),
            next,
        });
        self.slots[at].next = Some(id);
        match next {
            Some(next) => self.slots[next].prev = Some(id),
            None => self.tail = Some(id),
        }
        id
    }

    fn unlink(&mut self, id: usize) -> Item {
        let (prev, next) = (self.slots[id].prev, self.slots[id].next);
        match prev {
            Some(prev) => self.slots[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.slots[next].prev = prev,
            None => self.tail = prev,
        }
        self.slots[id].prev = None;
        self.slots[id].next = None;
        std::mem::replace(&mut self.slots[id].item, Item::Vacant)
    }

    /// Remove the items strictly after `from` and before `until` (the end of
    /// the chain when `None`) and return them as inline nodes.
    fn take_between(&mut self, from: usize, until: Option<usize>) -> Vec<Inline> {
        let mut taken = Vec::new();
        let mut cursor = self.slots[from].next;
        while let Some(id) = cursor {
            if Some(id) == until {
                break;
            }
            cursor = self.slots[id].next;
            if let Some(inline) = self.unlink(id).into_inline() {
                taken.push(inline);
            }
        }
        merge_text(taken)
    }

    fn run_mut(&mut self, id: usize) -> Option<&mut Run> {
        match &mut self.slots[id].item {
            Item::Run(run) => Some(run),
            _ => None,
        }
    }

    fn into_inlines(mut self) -> Vec<Inline> {
        let mut inlines = Vec::new();
        let mut cursor = self.head;
        while let Some(id) = cursor {
            cursor = self.slots[id].next;
            let item = std::mem::replace(&mut self.slots[id].item, Item::Vacant);
            if let Some(inline) = item.into_inline() {
                inlines.push(inline);
            }
        }
        merge_text(inlines)
    }
}

/// Join adjacent text nodes. A text ending in a backslash is kept apart so
/// it cannot form an escape with the next node.
fn merge_text(inlines: Vec<Inline>) -> Vec<Inline> {
    let mut merged: Vec<Inline> = Vec::with_capacity(inlines.len());
    for inline in inlines {
        if let (Some(Inline::Text(last)), Inline::Text(text)) = (merged.last_mut(), &inline) {
            if !last.ends_with('\\') {
                last.push_str(text);
                continue;
            }
        }
        merged.push(inline);
    }
    merged
}

// =============================================================================
// Scanning
// =============================================================================

#[derive(Debug)]
struct Delimiter {
    slot: usize,
    /// Cleared once the run is paired away or can no longer pair.
    live: bool,
}

#[derive(Debug)]
struct Bracket {
    slot: usize,
    image: bool,
    /// Links may not contain links; a formed link deactivates earlier `[`.
    active: bool,
    /// Byte offset just after the opener.
    content_start: usize,
    /// Delimiter stack height when the bracket opened.
    bottom: usize,
}

/// State for resolving a single leaf.
struct Scan<'t, 'o> {
    text: &'t str,
    options: &'o Options,
    chain: Chain,
    delimiters: Vec<Delimiter>,
    brackets: Vec<Bracket>,
    pos: usize,
    literal_start: usize,
}

impl<'t, 'o> Scan<'t, 'o> {
    fn new(text: &'t str, options: &'o Options) -> Self {
        Self {
            text,
            options,
            chain: Chain::default(),
            delimiters: Vec::new(),
            brackets: Vec::new(),
            pos: 0,
            literal_start: 0,
        }
    }

    fn run(&mut self, parser: &mut InlineParser<'_>) {
        let bytes = self.text.as_bytes();
        while self.pos < bytes.len() {
            self.pos = self.next_candidate(self.pos);
            if self.pos >= bytes.len() {
                break;
            }

            if let Some((node, len)) = leaf::parse(self.text, self.pos, self.options) {
                self.flush_literal();
                self.chain.push(Item::Node(node));
                self.pos += len;
                self.literal_start = self.pos;
                continue;
            }

            match bytes[self.pos] {
                b'\\' if bytes.get(self.pos + 1).is_some_and(u8::is_ascii_punctuation) => {
                    self.pos += 2;
                }
                b'*' | b'_' => self.delimiter_run(),
                b'~' if self.options.has(Extension::Strikethrough) => self.delimiter_run(),
                b'[' => self.open_bracket(false, 1),
                b'!' if bytes.get(self.pos + 1) == Some(&b'[') => self.open_bracket(true, 2),
                b']' => self.close_bracket(parser),
                _ => self.advance_char(),
            }
        }
        self.pos = bytes.len();
        self.flush_literal();
        self.resolve_delimiters(0);
    }

    /// Next position at or after `from` worth a closer look.
    fn next_candidate(&self, from: usize) -> usize {
        let bytes = self.text.as_bytes();
        let autolinks = self.options.has(Extension::ExtendedAutolinks);
        let mut i = from;
        while i < bytes.len() {
            let b = bytes[i];
            if SPECIAL[b as usize] {
                return i;
            }
            if autolinks && (i == 0 || BOUNDARY[bytes[i - 1] as usize]) {
                return i;
            }
            i += 1;
        }
        i
    }

    fn advance_char(&mut self) {
        let len = self.text[self.pos..].chars().next().map_or(1, char::len_utf8);
        self.pos += len;
    }

    fn flush_literal(&mut self) {
        if self.literal_start < self.pos {
            let literal = &self.text[self.literal_start..self.pos];
            self.chain.push(Item::Node(Inline::Text(literal.to_string())));
        }
        self.literal_start = self.pos;
    }

    fn push_literal(&mut self, literal: &str) -> usize {
        self.flush_literal();
        self.chain.push(Item::Node(Inline::Text(literal.to_string())))
    }

    // -------------------------------------------------------------------------
    // Delimiter runs
    // -------------------------------------------------------------------------

    fn delimiter_run(&mut self) {
        let bytes = self.text.as_bytes();
        let marker = bytes[self.pos];
        let len = bytes[self.pos..].iter().take_while(|b| **b == marker).count();
        let end = self.pos + len;

        // three or more tildes are never strikethrough
        if marker == b'~' && len > 2 {
            self.pos = end;
            return;
        }

        let before = self.text[..self.pos].chars().next_back().unwrap_or('\n');
        let after = self.text[end..].chars().next().unwrap_or('\n');
        let left = is_left_flanking(before, after);
        let right = is_left_flanking(after, before);

        let (can_open, can_close) = match marker {
            b'~' => (true, true),
            b'_' => (
                left && (!right || is_punctuation(before)),
                right && (!left || is_punctuation(after)),
            ),
            _ => (left, right),
        };

        self.flush_literal();
        let slot = self.chain.push(Item::Run(Run {
            marker,
            len,
            original: len,
            can_open,
            can_close,
        }));
        if can_open || can_close {
            self.delimiters.push(Delimiter { slot, live: true });
        }
        self.pos = end;
        self.literal_start = end;
    }

    /// Pair the delimiter runs above `bottom` on the stack, strikethrough
    /// first, and drop every delimiter above `bottom` afterwards.
    fn resolve_delimiters(&mut self, bottom: usize) {
        self.pair_strikethrough(bottom);
        self.pair_emphasis(bottom, self.delimiters.len());
        self.delimiters.truncate(bottom);
    }

    /// Each `~` opener takes the nearest later run of the same length.
    /// Emphasis between the two is paired before the span is wrapped; any
    /// other delimiter inside it is literal.
    fn pair_strikethrough(&mut self, bottom: usize) {
        let mut opener = bottom;
        while opener < self.delimiters.len() {
            let Some(opening) = self.live_run(opener).filter(|run| run.marker == b'~') else {
                opener += 1;
                continue;
            };
            let found = (opener + 1..self.delimiters.len()).find(|&candidate| {
                self.live_run(candidate)
                    .is_some_and(|closing| closing.marker == b'~' && closing.len == opening.len)
            });
            let Some(closer) = found else {
                opener += 1;
                continue;
            };

            self.pair_emphasis(opener + 1, closer);
            let opener_slot = self.delimiters[opener].slot;
            let closer_slot = self.delimiters[closer].slot;
            let children = self.chain.take_between(opener_slot, Some(closer_slot));
            self.chain
                .insert_after(opener_slot, Item::Node(Inline::Strikethrough(children)));
            for slot in [opener_slot, closer_slot] {
                if let Some(run) = self.chain.run_mut(slot) {
                    run.len = 0;
                }
            }
            for delimiter in &mut self.delimiters[opener..=closer] {
                delimiter.live = false;
            }
            opener = closer + 1;
        }
    }

    /// Pair `*` and `_` runs whose closers lie in `bottom..top` on the
    /// stack, innermost closers first.
    fn pair_emphasis(&mut self, bottom: usize, top: usize) {
        // search floors per (marker, closer can open, closer length mod 3)
        let mut floors = [bottom; 12];
        let mut closer = bottom;

        while closer < top {
            let closer_slot = self.delimiters[closer].slot;
            let Some(closing) = self.live_run(closer) else {
                closer += 1;
                continue;
            };
            if !closing.can_close || closing.marker == b'~' {
                closer += 1;
                continue;
            }

            let key = floor_key(&closing);
            let floor = floors[key].max(bottom);
            let found = (floor..closer).rev().find_map(|candidate| {
                self.live_run(candidate)
                    .filter(|opening| pairs_with(opening, &closing))
                    .map(|opening| (candidate, opening))
            });

            let Some((opener, opening)) = found else {
                floors[key] = closer;
                if !closing.can_open {
                    self.delimiters[closer].live = false;
                }
                closer += 1;
                continue;
            };

            let opener_slot = self.delimiters[opener].slot;
            let used = if opening.len >= 2 && closing.len >= 2 { 2 } else { 1 };

            let children = self.chain.take_between(opener_slot, Some(closer_slot));
            let node = Inline::Emphasis(Emphasis {
                strong: used == 2,
                children,
            });
            self.chain.insert_after(opener_slot, Item::Node(node));

            for between in &mut self.delimiters[opener + 1..closer] {
                between.live = false;
            }
            if let Some(run) = self.chain.run_mut(opener_slot) {
                run.len -= used;
                if run.len == 0 {
                    self.delimiters[opener].live = false;
                }
            }
            if let Some(run) = self.chain.run_mut(closer_slot) {
                run.len -= used;
                if run.len == 0 {
                    self.delimiters[closer].live = false;
                    closer += 1;
                }
            }
        }
    }

    fn live_run(&self, index: usize) -> Option<Run> {
        let delimiter = &self.delimiters[index];
        if !delimiter.live {
            return None;
        }
        match self.chain.slots[delimiter.slot].item {
            Item::Run(run) if run.len > 0 => Some(run),
            _ => None,
        }
    }

    // -------------------------------------------------------------------------
    // Links and images
    // -------------------------------------------------------------------------

    fn open_bracket(&mut self, image: bool, len: usize) {
        let opener = &self.text[self.pos..self.pos + len];
        let slot = self.push_literal(opener);
        self.pos += len;
        self.literal_start = self.pos;
        self.brackets.push(Bracket {
            slot,
            image,
            active: true,
            content_start: self.pos,
            bottom: self.delimiters.len(),
        });
    }

    fn close_bracket(&mut self, parser: &mut InlineParser<'_>) {
        self.flush_literal();
        let close = self.pos;
        self.pos += 1;
        self.literal_start = self.pos;

        let Some(bracket) = self.brackets.pop() else {
            self.chain.push(Item::Node(Inline::Text("]".into())));
            return;
        };
        if !bracket.active {
            self.chain.push(Item::Node(Inline::Text("]".into())));
            return;
        }

        let text = self.text;
        let label = &text[bracket.content_start..close];
        let after = &text[self.pos..];
        let Some((destination, title, consumed)) =
            inline_link(after).or_else(|| reference_link(parser, label, after))
        else {
            self.chain.push(Item::Node(Inline::Text("]".into())));
            return;
        };

        self.pos += consumed;
        self.literal_start = self.pos;
        self.resolve_delimiters(bracket.bottom);
        let children = self.chain.take_between(bracket.slot, None);
        let node = if bracket.image {
            Inline::Image(Image {
                children,
                source: destination,
                title,
            })
        } else {
            Inline::Link(Link {
                children,
                destination,
                title,
            })
        };
        self.chain.slots[bracket.slot].item = Item::Node(node);

        if !bracket.image {
            for earlier in &mut self.brackets {
                if !earlier.image {
                    earlier.active = false;
                }
            }
        }
    }
}

/// Full, collapsed or shortcut reference after a bracket's `]`.
fn reference_link(
    parser: &mut InlineParser<'_>,
    text_label: &str,
    after: &str,
) -> Option<(String, Option<String>, usize)> {
    let (label, consumed, full) = if after.starts_with("[]") {
        (text_label, 2, false)
    } else if let Some((label, rest)) = read_link_label(after) {
        (label, after.len() - rest.len(), true)
    } else {
        (text_label, 0, false)
    };

    if label.chars().count() > MAX_LABEL_LEN || label.trim().is_empty() {
        return None;
    }
    match parser.references.get(&normalize_label(label)) {
        Some(definition) => Some((
            definition.destination.clone(),
            definition.title.clone(),
            consumed,
        )),
        None => {
            if full {
                parser.diagnostics.push(Diagnostic::unresolved_reference(label));
            }
            None
        }
    }
}

/// `(destination "title")` right after a `]`.
fn inline_link(after: &str) -> Option<(String, Option<String>, usize)> {
    let inner = after.strip_prefix('(')?;
    let rest = skip_inner_spaces(inner)?;
    let (destination, rest) = if rest.starts_with(')') {
        ("", rest)
    } else {
        read_link_destination(rest)?
    };

    let spaced = skip_inner_spaces(rest)?;
    let (title, rest) = match read_link_title(spaced) {
        Some((title, after_title)) if spaced.len() < rest.len() => {
            (Some(title), skip_inner_spaces(after_title)?)
        }
        _ => (None, spaced),
    };

    let rest = rest.strip_prefix(')')?;
    Some((
        destination.to_string(),
        title.map(str::to_string),
        after.len() - rest.len(),
    ))
}

/// A run is left-flanking when the next character is not whitespace, and
/// is either not punctuation or follows whitespace or punctuation. Swapping
/// the arguments gives right-flanking.
fn is_left_flanking(before: char, after: char) -> bool {
    !is_whitespace(after)
        && (!is_punctuation(after) || is_whitespace(before) || is_punctuation(before))
}

fn floor_key(closer: &Run) -> usize {
    let marker = usize::from(closer.marker == b'_');
    marker * 6 + usize::from(closer.can_open) * 3 + closer.original % 3
}

fn pairs_with(opener: &Run, closer: &Run) -> bool {
    if opener.marker != closer.marker || !opener.can_open {
        return false;
    }
    // rule of three
    let sum = opener.original + closer.original;
    !((opener.can_close || closer.can_open)
        && sum % 3 == 0
        && !(opener.original % 3 == 0 && closer.original % 3 == 0))
}

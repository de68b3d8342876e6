//! # Character Formatting
//!
//! Formatting is edited by flattening an element into styled runs, changing
//! the runs that fall inside the selection, and writing the runs back in a
//! canonical shape:
//!
//! ```text
//! span(style: font-size, color) > strong > em > u > s > text
//! ```
//!
//! Only plain `strong/b`, `em/i`, `u`, `s/strike/del` and `span` elements
//! whose style holds nothing but `font-size`/`color` are format carriers.
//! Any other inline element (links, line breaks, icons) is an atom: it keeps
//! its node and is never split, so keys inside it survive a format change.
//!
//! Offsets are character offsets over the element's visible text.

use crate::markers;
use crate::surface::decorate::replace_content;
use serde::{Deserialize, Serialize};
use sitecanvas_dom::{style, DomResult, ElementData, NodeData, NodeId, Tree};

pub const SIZE_MIN: f64 = 8.0;
pub const SIZE_MAX: f64 = 120.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormatFlag {
    Bold,
    Italic,
    Underline,
    Strike,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Format {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    pub size: Option<f64>,
    pub color: Option<String>,
}

impl Format {
    pub fn flag(&self, flag: FormatFlag) -> bool {
        match flag {
            FormatFlag::Bold => self.bold,
            FormatFlag::Italic => self.italic,
            FormatFlag::Underline => self.underline,
            FormatFlag::Strike => self.strike,
        }
    }

    pub fn set_flag(&mut self, flag: FormatFlag, on: bool) {
        match flag {
            FormatFlag::Bold => self.bold = on,
            FormatFlag::Italic => self.italic = on,
            FormatFlag::Underline => self.underline = on,
            FormatFlag::Strike => self.strike = on,
        }
    }
}

/// Toolbar button state at the current selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatState {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    /// Shared font size of the selection, if uniform
    pub size: Option<f64>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
enum Piece {
    Text(String),
    Atom { node: NodeId, chars: usize },
}

#[derive(Debug, Clone, PartialEq)]
struct Run {
    piece: Piece,
    format: Format,
}

impl Run {
    fn chars(&self) -> usize {
        match &self.piece {
            Piece::Text(text) => text.chars().count(),
            Piece::Atom { chars, .. } => *chars,
        }
    }
}

/// Default font size by tag, in px
pub fn default_size(tag: &str) -> f64 {
    match tag {
        "h1" => 48.0,
        "h2" => 36.0,
        "h3" => 28.0,
        "h4" => 24.0,
        "h5" => 20.0,
        "h6" => 18.0,
        _ => 16.0,
    }
}

pub fn clamp_size(size: f64) -> f64 {
    size.clamp(SIZE_MIN, SIZE_MAX)
}

fn parse_px(value: &str) -> Option<f64> {
    let value = value.trim();
    value
        .strip_suffix("px")
        .unwrap_or(value)
        .trim()
        .parse::<f64>()
        .ok()
}

fn format_px(size: f64) -> String {
    format!("{}px", size)
}

/// Font size of the element itself: inline style, else the tag default
pub fn element_size(tree: &Tree, id: NodeId) -> f64 {
    let Some(el) = tree.element(id) else {
        return default_size("");
    };
    el.style("font-size")
        .and_then(|v| parse_px(&v))
        .unwrap_or_else(|| default_size(&el.tag))
}

/// Visible text length of the element's content
pub fn text_len(tree: &Tree, id: NodeId) -> usize {
    collect_runs(tree, id).iter().map(Run::chars).sum()
}

fn carrier_format(el: &ElementData, base: &Format) -> Option<Format> {
    let mut format = base.clone();
    let plain = el.attributes.is_empty();
    match el.tag.as_str() {
        "strong" | "b" if plain => format.bold = true,
        "em" | "i" if plain => format.italic = true,
        "u" if plain => format.underline = true,
        "s" | "strike" | "del" if plain => format.strike = true,
        "span" => {
            if el.attributes.len() != 1 {
                return None;
            }
            let decls = style::parse_declarations(el.attr("style")?);
            if decls.is_empty() {
                return None;
            }
            for (prop, value) in decls {
                match prop.as_str() {
                    "font-size" => format.size = Some(parse_px(&value)?),
                    "color" => format.color = Some(value),
                    _ => return None,
                }
            }
        }
        _ => return None,
    }
    Some(format)
}

fn collect_runs(tree: &Tree, id: NodeId) -> Vec<Run> {
    let mut runs = Vec::new();
    for child in tree.children(id) {
        walk(tree, *child, &Format::default(), &mut runs);
    }
    runs
}

fn walk(tree: &Tree, id: NodeId, format: &Format, out: &mut Vec<Run>) {
    match tree.data(id) {
        Some(NodeData::Text(text)) => out.push(Run {
            piece: Piece::Text(text.clone()),
            format: format.clone(),
        }),
        Some(NodeData::Element(el)) => {
            if el.has_attr(markers::UI) {
                return;
            }
            match carrier_format(el, format) {
                Some(inner) => {
                    for child in tree.children(id) {
                        walk(tree, *child, &inner, out);
                    }
                }
                None => out.push(Run {
                    piece: Piece::Atom {
                        node: id,
                        chars: tree.text_content(id).chars().count(),
                    },
                    format: format.clone(),
                }),
            }
        }
        _ => {}
    }
}

// Split text runs so that `start` and `end` fall on run boundaries
fn split_at_bounds(runs: Vec<Run>, start: usize, end: usize) -> Vec<Run> {
    let mut out = Vec::with_capacity(runs.len() + 2);
    let mut pos = 0;
    for run in runs {
        let len = run.chars();
        let run_start = pos;
        pos += len;
        if matches!(run.piece, Piece::Atom { .. }) {
            out.push(run);
            continue;
        }
        let Piece::Text(text) = &run.piece else {
            continue;
        };
        let mut cuts: Vec<usize> = [start, end]
            .into_iter()
            .filter(|cut| *cut > run_start && *cut < run_start + len)
            .map(|cut| cut - run_start)
            .collect();
        cuts.dedup();
        if cuts.is_empty() {
            out.push(run);
            continue;
        }
        let chars: Vec<char> = text.chars().collect();
        let mut from = 0;
        for cut in cuts.into_iter().chain(std::iter::once(len)) {
            out.push(Run {
                piece: Piece::Text(chars[from..cut].iter().collect()),
                format: run.format.clone(),
            });
            from = cut;
        }
    }
    out
}

fn merge_adjacent(runs: Vec<Run>) -> Vec<Run> {
    let mut out: Vec<Run> = Vec::with_capacity(runs.len());
    for run in runs {
        if let Piece::Text(text) = &run.piece {
            if text.is_empty() {
                continue;
            }
            if let Some(Run {
                piece: Piece::Text(prev),
                format,
            }) = out.last_mut()
            {
                if *format == run.format {
                    prev.push_str(text);
                    continue;
                }
            }
        }
        out.push(run);
    }
    out
}

// Runs overlapping [start, end) with their index
fn selected(runs: &[Run], start: usize, end: usize) -> Vec<usize> {
    let mut pos = 0;
    let mut indices = Vec::new();
    for (i, run) in runs.iter().enumerate() {
        let len = run.chars();
        if len > 0 && pos < end && pos + len > start {
            indices.push(i);
        }
        pos += len;
    }
    indices
}

fn build_run(tree: &mut Tree, run: &Run) -> DomResult<NodeId> {
    let mut node = match &run.piece {
        Piece::Text(text) => tree.create_text(text.clone()),
        Piece::Atom { node, .. } => {
            tree.detach(*node)?;
            *node
        }
    };

    let f = &run.format;
    for (on, tag) in [
        (f.strike, "s"),
        (f.underline, "u"),
        (f.italic, "em"),
        (f.bold, "strong"),
    ] {
        if on {
            let wrapper = tree.create_element(ElementData::new(tag));
            tree.append_child(wrapper, node)?;
            node = wrapper;
        }
    }

    let mut decls = Vec::new();
    if let Some(size) = f.size {
        decls.push(("font-size".to_string(), format_px(size)));
    }
    if let Some(color) = &f.color {
        decls.push(("color".to_string(), color.clone()));
    }
    if !decls.is_empty() {
        let span = tree.create_element(
            ElementData::new("span").with_attr("style", style::format_declarations(&decls)),
        );
        tree.append_child(span, node)?;
        node = span;
    }
    Ok(node)
}

fn write_runs(tree: &mut Tree, id: NodeId, runs: Vec<Run>) -> DomResult<()> {
    let runs = merge_adjacent(runs);
    let mut nodes = Vec::with_capacity(runs.len());
    for run in &runs {
        nodes.push(build_run(tree, run)?);
    }
    replace_content(tree, id, nodes)
}

/// Resolve an empty selection to the whole element
fn range(tree: &Tree, id: NodeId, start: usize, end: usize) -> (usize, usize) {
    if start == end {
        (0, text_len(tree, id))
    } else {
        (start.min(end), start.max(end))
    }
}

/// Rewrite the runs inside `[start, end)` with `edit`
fn edit_runs(
    tree: &mut Tree,
    id: NodeId,
    start: usize,
    end: usize,
    edit: impl Fn(&mut Format),
) -> DomResult<()> {
    let runs = split_at_bounds(collect_runs(tree, id), start, end);
    let picked = selected(&runs, start, end);
    let mut runs = runs;
    for i in picked {
        edit(&mut runs[i].format);
    }
    write_runs(tree, id, runs)
}

/// Formatting shared by every run in the selection
pub fn query(tree: &Tree, id: NodeId, start: usize, end: usize) -> FormatState {
    let (start, end) = range(tree, id, start, end);
    let runs = split_at_bounds(collect_runs(tree, id), start, end);
    let picked: Vec<&Run> = selected(&runs, start, end).into_iter().map(|i| &runs[i]).collect();
    if picked.is_empty() {
        return FormatState {
            size: Some(element_size(tree, id)),
            ..FormatState::default()
        };
    }

    let base = element_size(tree, id);
    let all = |flag: FormatFlag| picked.iter().all(|r| r.format.flag(flag));
    let sizes: Vec<f64> = picked.iter().map(|r| r.format.size.unwrap_or(base)).collect();
    let colors: Vec<Option<&String>> = picked.iter().map(|r| r.format.color.as_ref()).collect();

    FormatState {
        bold: all(FormatFlag::Bold),
        italic: all(FormatFlag::Italic),
        underline: all(FormatFlag::Underline),
        strike: all(FormatFlag::Strike),
        size: sizes.iter().all(|s| *s == sizes[0]).then_some(sizes[0]),
        color: colors
            .iter()
            .all(|c| *c == colors[0])
            .then(|| colors[0].cloned())
            .flatten()
            .or_else(|| tree.element(id).and_then(|el| el.style("color"))),
    }
}

/// Toggle a flag over the selection: on unless every run already has it
pub fn toggle(tree: &mut Tree, id: NodeId, start: usize, end: usize, flag: FormatFlag) -> DomResult<bool> {
    let (start, end) = range(tree, id, start, end);
    let state = query(tree, id, start, end);
    let on = !match flag {
        FormatFlag::Bold => state.bold,
        FormatFlag::Italic => state.italic,
        FormatFlag::Underline => state.underline,
        FormatFlag::Strike => state.strike,
    };
    edit_runs(tree, id, start, end, |f| f.set_flag(flag, on))?;
    Ok(on)
}

/// Grow or shrink the font size by `delta` px, clamped to [8, 120].
///
/// An empty selection resizes the element itself.
pub fn change_size(tree: &mut Tree, id: NodeId, start: usize, end: usize, delta: f64) -> DomResult<f64> {
    let base = element_size(tree, id);
    if start == end {
        let size = clamp_size(base + delta);
        if let Some(el) = tree.element_mut(id) {
            el.set_style("font-size", &format_px(size));
        }
        let len = text_len(tree, id);
        edit_runs(tree, id, 0, len, |f| f.size = None)?;
        return Ok(size);
    }

    let (start, end) = range(tree, id, start, end);
    let current = query(tree, id, start, end).size.unwrap_or(base);
    edit_runs(tree, id, start, end, |f| {
        f.size = Some(clamp_size(f.size.unwrap_or(base) + delta));
    })?;
    Ok(clamp_size(current + delta))
}

/// Set the text colour of the selection, or of the element when empty
pub fn set_color(tree: &mut Tree, id: NodeId, start: usize, end: usize, color: &str) -> DomResult<()> {
    if start == end {
        if let Some(el) = tree.element_mut(id) {
            el.set_style("color", color);
        }
        let len = text_len(tree, id);
        return edit_runs(tree, id, 0, len, |f| f.color = None);
    }
    let (start, end) = range(tree, id, start, end);
    edit_runs(tree, id, start, end, |f| f.color = Some(color.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitecanvas_dom::{parse_document, serialize_children_with, KeepAll};

    fn para(inner: &str) -> (Tree, NodeId) {
        let tree = parse_document(&format!("<p>{}</p>", inner));
        let p = tree.children(tree.root())[0];
        (tree, p)
    }

    fn inner(tree: &Tree, id: NodeId) -> String {
        serialize_children_with(tree, id, &KeepAll)
    }

    #[test]
    fn test_bold_middle_of_text() {
        let (mut tree, p) = para("Hello world");
        assert!(toggle(&mut tree, p, 6, 11, FormatFlag::Bold).unwrap());
        assert_eq!(inner(&tree, p), "Hello <strong>world</strong>");
    }

    #[test]
    fn test_toggle_off_merges_runs() {
        let (mut tree, p) = para("Hello <b>world</b>");
        assert!(!toggle(&mut tree, p, 6, 11, FormatFlag::Bold).unwrap());
        assert_eq!(inner(&tree, p), "Hello world");
        assert_eq!(tree.children(p).len(), 1);
    }

    #[test]
    fn test_mixed_selection_turns_on() {
        let (mut tree, p) = para("<em>ab</em>cd");
        assert!(toggle(&mut tree, p, 0, 4, FormatFlag::Italic).unwrap());
        assert_eq!(inner(&tree, p), "<em>abcd</em>");
    }

    #[test]
    fn test_canonical_nesting() {
        let (mut tree, p) = para("<u><strong>x</strong></u>y");
        set_color(&mut tree, p, 0, 1, "red").unwrap();
        assert_eq!(
            inner(&tree, p),
            r#"<span style="color: red"><strong><u>x</u></strong></span>y"#
        );
    }

    #[test]
    fn test_query_reflects_selection() {
        let (tree, p) = para("plain <strong>bold <em>both</em></strong>");
        assert!(!query(&tree, p, 0, 5).bold);
        let state = query(&tree, p, 6, 15);
        assert!(state.bold);
        assert!(!state.italic);
        let state = query(&tree, p, 11, 15);
        assert!(state.bold && state.italic);
    }

    #[test]
    fn test_atoms_are_kept_whole() {
        let (mut tree, p) = para(r#"Call <a href="/x" data-sc-key="link_1">us now</a>!"#);
        let link = tree.children(p)[1];
        toggle(&mut tree, p, 0, 12, FormatFlag::Bold).unwrap();

        assert!(tree.is_alive(link));
        assert_eq!(tree.attr(link, "data-sc-key"), Some("link_1"));
        assert_eq!(
            inner(&tree, p),
            r#"<strong>Call </strong><strong><a href="/x" data-sc-key="link_1">us now</a></strong><strong>!</strong>"#
        );
    }

    #[test]
    fn test_size_on_selection_and_element() {
        let tree = parse_document("<h2>Big title</h2>");
        let h2 = tree.children(tree.root())[0];
        let mut tree = tree;

        assert_eq!(change_size(&mut tree, h2, 0, 3, 2.0).unwrap(), 38.0);
        assert_eq!(inner(&tree, h2), r#"<span style="font-size: 38px">Big</span> title"#);

        assert_eq!(change_size(&mut tree, h2, 0, 0, -4.0).unwrap(), 32.0);
        assert_eq!(inner(&tree, h2), "Big title");
        assert_eq!(tree.attr(h2, "style"), Some("font-size: 32px"));
    }

    #[test]
    fn test_size_clamped() {
        let (mut tree, p) = para("tiny");
        for _ in 0..10 {
            change_size(&mut tree, p, 0, 0, -2.0).unwrap();
        }
        assert_eq!(element_size(&tree, p), SIZE_MIN);
    }

    #[test]
    fn test_controls_are_not_content() {
        let (mut tree, p) = para(r#"Text<span data-sc-ui="delete" role="button"></span>"#);
        toggle(&mut tree, p, 0, 0, FormatFlag::Underline).unwrap();
        assert_eq!(
            inner(&tree, p),
            r#"<u>Text</u><span data-sc-ui="delete" role="button"></span>"#
        );
    }
}

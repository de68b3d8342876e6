//! Layer outline: per section, every remaining editable node in order.

use crate::identity::{find_sections, managed_category, Category};
use crate::markers;
use sitecanvas_dom::{NodeId, Tree};
use sitecanvas_protocol::{LayerItem, SectionOutline};

const LABEL_CHARS: usize = 40;

pub fn build_outline(tree: &Tree) -> Vec<SectionOutline> {
    find_sections(tree)
        .into_iter()
        .filter_map(|section| {
            let section_id = tree.attr(section, markers::SECTION)?.to_string();
            let items: Vec<LayerItem> = tree
                .descendants(section)
                .into_iter()
                .filter(|id| !markers::in_ui(tree, *id))
                .filter_map(|id| {
                    let category = managed_category(tree, id)?;
                    let key = tree.attr(id, markers::KEY)?.to_string();
                    Some(LayerItem {
                        item_type: category.item_type(),
                        label: item_label(tree, id, category),
                        key,
                    })
                })
                .collect();

            Some(SectionOutline {
                label: section_label(tree, section),
                section_id,
                items,
            })
        })
        .collect()
}

fn item_label(tree: &Tree, id: NodeId, category: Category) -> String {
    match category {
        Category::Text | Category::Link => {
            let text = collapse(&tree.text_content(id));
            if text.is_empty() && category == Category::Link {
                tree.attr(id, "href").unwrap_or("").to_string()
            } else {
                truncate(&text)
            }
        }
        Category::Image => tree
            .attr(id, "alt")
            .filter(|alt| !alt.trim().is_empty())
            .map(truncate)
            .unwrap_or_else(|| tree.tag(id).unwrap_or("image").to_string()),
    }
}

// First heading, else class, else tag
fn section_label(tree: &Tree, section: NodeId) -> String {
    let heading = tree.descendants(section).into_iter().find(|id| {
        matches!(
            tree.tag(*id),
            Some("h1" | "h2" | "h3" | "h4" | "h5" | "h6")
        ) && !markers::in_ui(tree, *id)
    });
    if let Some(heading) = heading {
        let text = collapse(&tree.text_content(heading));
        if !text.is_empty() {
            return truncate(&text);
        }
    }
    tree.element(section)
        .map(|el| {
            el.classes()
                .next()
                .map(str::to_string)
                .unwrap_or_else(|| el.tag.clone())
        })
        .unwrap_or_default()
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= LABEL_CHARS {
        return text.to_string();
    }
    let mut out: String = text.chars().take(LABEL_CHARS - 1).collect();
    out.push('…');
    out
}

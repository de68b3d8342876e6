//! Parse → edit → serialize over realistic template markup

use sitecanvas_dom::{parse_document, render_template, serialize, ElementData, Tree, VNode};
use std::collections::HashMap;

const LANDING: &str = r##"<!DOCTYPE html>
<html>
<head><style>.hero h1 { font-size: 48px; }</style></head>
<body>
  <section class="hero">
    <h1>{{ headline }}</h1>
    <p>{{ tagline }}</p>
    <img src="/img/hero.jpg" alt="Hero shot">
  </section>
  <footer><a href="#">Contact</a></footer>
</body>
</html>"##;

fn body(tree: &Tree) -> sitecanvas_dom::NodeId {
    tree.descendants(tree.root())
        .into_iter()
        .find(|id| tree.tag(*id) == Some("body"))
        .unwrap()
}

#[test]
fn test_template_renders_into_tree() {
    let mut values = HashMap::new();
    values.insert("headline".to_string(), "Bakery <Fresh>".to_string());
    values.insert("tagline".to_string(), "Since 1982".to_string());

    let html = render_template(LANDING, &values);
    let tree = parse_document(&html);

    let body = body(&tree);
    let sections = tree.element_children(body);
    assert_eq!(sections.len(), 2);
    assert_eq!(
        tree.text_content(tree.element_children(sections[0])[0]),
        "Bakery <Fresh>"
    );
    assert!(serialize(&tree).contains("<h1>Bakery &lt;Fresh&gt;</h1>"));
}

#[test]
fn test_serialize_is_stable_after_reparse() {
    let once = serialize(&parse_document(LANDING));
    let twice = serialize(&parse_document(&once));
    assert_eq!(once, twice);
}

#[test]
fn test_snapshot_rebuild_matches_original() {
    let mut tree = parse_document(LANDING);
    let body = body(&tree);
    let hero = tree.element_children(body)[0];
    let before = serialize(&tree);

    let copy: VNode = tree.to_vnode(hero).unwrap();

    let heading = tree.element_children(hero)[0];
    tree.set_text(heading, "Changed").unwrap();
    let badge = tree.create_element(ElementData::new("span").with_attr("data-sc-ui", "delete"));
    tree.append_child(heading, badge).unwrap();
    assert_ne!(serialize(&tree), before);

    let rebuilt = tree.build(&copy);
    tree.replace(hero, rebuilt).unwrap();

    assert_eq!(serialize(&tree), before);
    assert!(!tree.is_alive(hero));
}

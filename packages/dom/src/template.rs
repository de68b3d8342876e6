use std::collections::HashMap;

/// Substitute `{{ key }}` placeholders with HTML-escaped values.
///
/// Placeholders with no value are left as written so a half-filled template
/// still renders and the gap stays visible.
pub fn render_template(source: &str, values: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];

        let Some(close) = after.find("}}") else {
            out.push_str(&rest[open..]);
            return out;
        };

        let key = after[..close].trim();
        match values.get(key) {
            Some(value) => escape_value(&mut out, value),
            None => out.push_str(&rest[open..open + 2 + close + 2]),
        }
        rest = &after[close + 2..];
    }

    out.push_str(rest);
    out
}

fn escape_value(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_substitutes_and_escapes() {
        let out = render_template(
            "<h1>{{ headline }}</h1><img alt=\"{{alt}}\">",
            &values(&[("headline", "Fish & Chips"), ("alt", "\"Our\" shop")]),
        );
        assert_eq!(
            out,
            "<h1>Fish &amp; Chips</h1><img alt=\"&quot;Our&quot; shop\">"
        );
    }

    #[test]
    fn test_unknown_and_unterminated_left_intact() {
        let out = render_template("{{ missing }} and {{ open", &values(&[]));
        assert_eq!(out, "{{ missing }} and {{ open");
    }
}

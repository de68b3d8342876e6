//! Inline `style` attribute helpers.
//!
//! Declarations keep their original order; setting an existing property
//! replaces it in place.

/// Parse `a: b; c: d` into ordered (property, value) pairs
pub fn parse_declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            let prop = prop.trim().to_ascii_lowercase();
            let value = value.trim();
            if prop.is_empty() || value.is_empty() {
                None
            } else {
                Some((prop, value.to_string()))
            }
        })
        .collect()
}

pub fn format_declarations(decls: &[(String, String)]) -> String {
    decls
        .iter()
        .map(|(prop, value)| format!("{}: {}", prop, value))
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn get_property(style: &str, property: &str) -> Option<String> {
    parse_declarations(style)
        .into_iter()
        .find(|(prop, _)| prop == property)
        .map(|(_, value)| value)
}

pub fn set_property(style: &str, property: &str, value: &str) -> String {
    let mut decls = parse_declarations(style);
    match decls.iter_mut().find(|(prop, _)| prop == property) {
        Some(decl) => decl.1 = value.to_string(),
        None => decls.push((property.to_string(), value.to_string())),
    }
    format_declarations(&decls)
}

pub fn remove_property(style: &str, property: &str) -> String {
    let mut decls = parse_declarations(style);
    decls.retain(|(prop, _)| prop != property);
    format_declarations(&decls)
}

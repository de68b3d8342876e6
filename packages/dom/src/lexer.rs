use logos::{Lexer, Logos};

/// Markup tokens.
///
/// Tags are lexed whole (name plus attributes) and split afterwards with
/// [`parse_start_tag`]; anything that fails to lex as markup is text.
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token<'src> {
    #[token("<!--", lex_comment)]
    Comment(&'src str),

    // <!DOCTYPE ...>
    #[regex(r"<![a-zA-Z]", lex_declaration)]
    Declaration(&'src str),

    #[regex(r"<[a-zA-Z]", lex_start_tag)]
    StartTag(&'src str),

    #[regex(r"</[a-zA-Z][a-zA-Z0-9:_-]*[ \t\r\n]*>", |lex| lex.slice())]
    EndTag(&'src str),

    #[regex(r"[^<]+", |lex| lex.slice())]
    #[token("<", |lex| lex.slice())]
    Text(&'src str),
}

fn lex_comment<'src>(lex: &mut Lexer<'src, Token<'src>>) -> &'src str {
    let rest = lex.remainder();
    match rest.find("-->") {
        Some(end) => {
            lex.bump(end + 3);
            &rest[..end]
        }
        None => {
            lex.bump(rest.len());
            rest
        }
    }
}

fn lex_declaration<'src>(lex: &mut Lexer<'src, Token<'src>>) -> Option<&'src str> {
    let rest = lex.remainder();
    let end = rest.find('>')?;
    lex.bump(end + 1);
    let slice = lex.slice();
    Some(slice[2..slice.len() - 1].trim())
}

fn lex_start_tag<'src>(lex: &mut Lexer<'src, Token<'src>>) -> Option<&'src str> {
    let rest = lex.remainder();
    let mut quote: Option<char> = None;
    for (i, c) in rest.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '>') => {
                lex.bump(i + 1);
                return Some(lex.slice());
            }
            (None, '<') => return None,
            _ => {}
        }
    }
    None
}

/// A lexed start tag split into its parts
#[derive(Debug, Clone, PartialEq)]
pub struct StartTag {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub self_closing: bool,
}

/// Split `<tag a="b" c>` into name, attributes and the self-closing flag
pub fn parse_start_tag(slice: &str) -> StartTag {
    let inner = slice.trim_start_matches('<').trim_end_matches('>');
    let self_closing = inner.ends_with('/');
    let inner = inner.trim_end_matches('/');

    let name_end = inner
        .find(|c: char| c.is_whitespace() || c == '/')
        .unwrap_or(inner.len());
    let name = inner[..name_end].to_ascii_lowercase();

    let mut attributes: Vec<(String, String)> = Vec::new();
    let chars: Vec<char> = inner[name_end..].chars().collect();
    let mut i = 0;

    while i < chars.len() {
        while i < chars.len() && (chars[i].is_whitespace() || chars[i] == '/') {
            i += 1;
        }
        if i >= chars.len() {
            break;
        }

        let start = i;
        while i < chars.len() && !chars[i].is_whitespace() && chars[i] != '=' && chars[i] != '/' {
            i += 1;
        }
        let attr_name: String = chars[start..i].iter().collect::<String>().to_ascii_lowercase();

        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }

        let mut value = String::new();
        if i < chars.len() && chars[i] == '=' {
            i += 1;
            while i < chars.len() && chars[i].is_whitespace() {
                i += 1;
            }
            if i < chars.len() && (chars[i] == '"' || chars[i] == '\'') {
                let quote = chars[i];
                i += 1;
                let start = i;
                while i < chars.len() && chars[i] != quote {
                    i += 1;
                }
                value = chars[start..i].iter().collect();
                i += 1;
            } else {
                let start = i;
                while i < chars.len() && !chars[i].is_whitespace() {
                    i += 1;
                }
                value = chars[start..i].iter().collect();
            }
        }

        if attr_name.is_empty() || attributes.iter().any(|(n, _)| *n == attr_name) {
            continue;
        }
        attributes.push((attr_name, decode_entities(&value)));
    }

    StartTag {
        name,
        attributes,
        self_closing,
    }
}

/// Tag name of an end tag slice (`</div >` → `div`)
pub fn end_tag_name(slice: &str) -> String {
    slice
        .trim_start_matches("</")
        .trim_end_matches('>')
        .trim()
        .to_ascii_lowercase()
}

/// Decode the character references templates actually use.
/// Unknown references are left as written.
pub fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp..];
        let decoded = candidate
            .find(';')
            .filter(|end| *end <= 10)
            .and_then(|end| decode_reference(&candidate[1..end]).map(|c| (c, end)));

        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &candidate[end + 1..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Result<Token<'_>, ()>> {
        Token::lexer(source).collect()
    }

    #[test]
    fn test_lex_markup() {
        let toks = tokens(r#"<!DOCTYPE html><p class="a>b">Hi<!-- note --></p>"#);
        assert_eq!(
            toks,
            vec![
                Ok(Token::Declaration("DOCTYPE html")),
                Ok(Token::StartTag(r#"<p class="a>b">"#)),
                Ok(Token::Text("Hi")),
                Ok(Token::Comment(" note ")),
                Ok(Token::EndTag("</p>")),
            ]
        );
    }

    #[test]
    fn test_lone_angle_is_text() {
        let toks = tokens("a < b");
        assert_eq!(
            toks,
            vec![
                Ok(Token::Text("a ")),
                Ok(Token::Text("<")),
                Ok(Token::Text(" b")),
            ]
        );
    }

    #[test]
    fn test_parse_start_tag_attributes() {
        let tag = parse_start_tag(r#"<IMG src="a.png" alt='Team &amp; co' hidden data-x=1 />"#);
        assert_eq!(tag.name, "img");
        assert!(tag.self_closing);
        assert_eq!(
            tag.attributes,
            vec![
                ("src".to_string(), "a.png".to_string()),
                ("alt".to_string(), "Team & co".to_string()),
                ("hidden".to_string(), String::new()),
                ("data-x".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a &lt;b&gt; &#39;c&#x27; &nbsp;"), "a <b> 'c' \u{a0}");
        assert_eq!(decode_entities("fish & chips &bogus;"), "fish & chips &bogus;");
    }

    #[test]
    fn test_end_tag_name() {
        assert_eq!(end_tag_name("</DIV >"), "div");
    }
}

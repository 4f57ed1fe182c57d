use std::ops::Range;

/// A `$...$` span inside an extraction template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    /// Byte range of the whole token, delimiters included.
    pub span: Range<usize>,
    /// Text between the delimiters (never empty, never contains `$`).
    pub inner: &'a str,
}

/// What a token refers to, decided by its first component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenRef<'a> {
    /// `$n$`: capture group `n` of the active match.
    Group(usize),
    /// `$json:a,b$`: object traversal of the parsed response body.
    Json(Vec<&'a str>),
    /// Anything else is left in the output untouched.
    Literal,
}

/// Finds non-overlapping `$...$` tokens, scanning left to right.
///
/// A `$$` pair is not a token; its second `$` may open the next one.
pub fn tokenize(template: &str) -> Vec<Token<'_>> {
    let bytes = template.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while let Some(open) = find_dollar(bytes, pos) {
        let Some(close) = find_dollar(bytes, open + 1) else {
            break;
        };
        if close == open + 1 {
            pos = close;
            continue;
        }
        tokens.push(Token {
            span: open..close + 1,
            inner: &template[open + 1..close],
        });
        pos = close + 1;
    }

    tokens
}

fn find_dollar(bytes: &[u8], from: usize) -> Option<usize> {
    bytes
        .get(from..)?
        .iter()
        .position(|&b| b == b'$')
        .map(|offset| from + offset)
}

/// Splits a token's inner text on `:` and `,`, dropping empty components.
pub fn components(inner: &str) -> Vec<&str> {
    inner
        .split([':', ','])
        .filter(|part| !part.is_empty())
        .collect()
}

pub fn classify(inner: &str) -> TokenRef<'_> {
    let parts = components(inner);
    let Some((first, keys)) = parts.split_first() else {
        return TokenRef::Literal;
    };
    if let Ok(group) = first.parse::<usize>() {
        TokenRef::Group(group)
    } else if *first == "json" && !keys.is_empty() {
        TokenRef::Json(keys.to_vec())
    } else {
        TokenRef::Literal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inners(template: &str) -> Vec<&str> {
        tokenize(template).into_iter().map(|t| t.inner).collect()
    }

    #[test]
    fn finds_tokens_with_spans() {
        let template = "https://x.test/$1$?d=$json:data,id$";
        let tokens = tokenize(template);
        assert_eq!(tokens.len(), 2);
        assert_eq!(&template[tokens[0].span.clone()], "$1$");
        assert_eq!(tokens[1].inner, "json:data,id");
    }

    #[test]
    fn empty_pairs_and_unterminated_dollars() {
        assert_eq!(inners("a$$1$b"), vec!["1"]);
        assert_eq!(inners("cost: $5"), Vec::<&str>::new());
        assert_eq!(inners("$1$$2$"), vec!["1", "2"]);
        assert_eq!(inners("$a$b$c$"), vec!["a", "c"]);
    }

    #[test]
    fn classifies_components() {
        assert_eq!(classify("2"), TokenRef::Group(2));
        assert_eq!(classify("json:data,link"), TokenRef::Json(vec!["data", "link"]));
        assert_eq!(classify("json"), TokenRef::Literal);
        assert_eq!(classify("json:"), TokenRef::Literal);
        assert_eq!(classify("json::a,,b"), TokenRef::Json(vec!["a", "b"]));
        assert_eq!(classify("name"), TokenRef::Literal);
        assert_eq!(classify("-1"), TokenRef::Literal);
        assert_eq!(classify(",:"), TokenRef::Literal);
    }
}

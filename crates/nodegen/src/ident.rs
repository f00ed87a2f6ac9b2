//! Identifier sanitization for generated Go code.
//!
//! Node kinds are arbitrary strings: `snake_case` rule names, keywords, and
//! punctuation-only tokens such as `"**="` or `"is not"`. Every one of them has
//! to become a valid Go identifier, in an exported (`PublicCase`) and an
//! unexported (`privateCase`) form. The mapping is a pure function of the input
//! so repeated runs always agree.

use std::borrow::Cow;

/// Go keywords, which cannot be used as identifiers.
pub const GO_KEYWORDS: &[&str] = &[
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "interface",
    "map",
    "package",
    "range",
    "return",
    "select",
    "struct",
    "switch",
    "type",
    "var",
];

/// Returns `true` if `s` is a Go keyword.
#[must_use]
pub fn is_keyword(s: &str) -> bool {
    GO_KEYWORDS.contains(&s)
}

/// Converts a schema name into an exported Go identifier.
///
/// The name is lowercased, split on underscores, and each word is title-cased.
/// Characters that cannot appear in an identifier are spelled out as words
/// (`"!="` becomes `NotEq`), so distinct operators stay distinct.
///
/// ```
/// use nodegen::ident::public_name;
///
/// assert_eq!(public_name("binary_operator"), "BinaryOperator");
/// assert_eq!(public_name("is not"), "IsSpaceNot");
/// assert_eq!(public_name("**="), "MulMulEq");
/// assert_eq!(public_name("_"), "Underscore");
/// ```
#[must_use]
pub fn public_name(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }

    let lower = s.to_lowercase();
    let trimmed = lower.trim_matches('_');
    if trimmed.is_empty() {
        return "Underscore".to_string();
    }

    let mut out = String::with_capacity(trimmed.len());
    for word in trimmed.split('_').filter(|word| !word.is_empty()) {
        push_title_word(&mut out, word);
    }
    out
}

/// Converts a schema name into an unexported Go identifier.
///
/// This is [`public_name`] with a lowercase first letter. Results that collide
/// with a Go keyword get a trailing underscore.
///
/// ```
/// use nodegen::ident::private_name;
///
/// assert_eq!(private_name("pattern_list"), "patternList");
/// assert_eq!(private_name("type"), "type_");
/// assert_eq!(private_name("-"), "sub");
/// ```
#[must_use]
pub fn private_name(s: &str) -> String {
    let public = public_name(s);
    let mut chars = public.chars();
    let Some(first) = chars.next() else {
        return public;
    };

    let mut out: String = first.to_lowercase().collect();
    out.push_str(chars.as_str());
    if is_keyword(&out) {
        out.push('_');
    }
    out
}

/// Appends one underscore-free word, title-cased, to `out`.
fn push_title_word(out: &mut String, word: &str) {
    let mut in_word = false;
    for c in word.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.push(c);
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else if c.is_ascii_digit() && !out.is_empty() {
            out.push(c);
            in_word = true;
        } else {
            out.push_str(&symbol_word(c));
            in_word = false;
        }
    }
}

/// Spells out a character that cannot appear in an identifier.
#[must_use]
pub fn symbol_word(c: char) -> Cow<'static, str> {
    let word = match c {
        '&' => "Ampersand",
        '|' => "Bar",
        '!' => "Not",
        '=' => "Eq",
        '<' => "Lt",
        '>' => "Gt",
        '+' => "Add",
        '-' => "Sub",
        '*' => "Mul",
        '/' => "Div",
        '~' => "BitNot",
        '%' => "Mod",
        '^' => "BitXor",
        '?' => "Question",
        ':' => "Colon",
        '.' => "Dot",
        ',' => "Comma",
        ';' => "Semicolon",
        '(' => "LParen",
        ')' => "RParen",
        '[' => "LBracket",
        ']' => "RBracket",
        '{' => "LBrace",
        '}' => "RBrace",
        '\\' => "Backslash",
        '\'' => "Quote",
        '"' => "DoubleQuote",
        '#' => "Hash",
        '@' => "At",
        '$' => "Dollar",
        '`' => "Backtick",
        ' ' => "Space",
        '\t' => "Tab",
        '\n' => "Newline",
        '\r' => "CarriageReturn",
        _ => return Cow::Owned(format!("U{:X}", u32::from(c))),
    };
    Cow::Borrowed(word)
}

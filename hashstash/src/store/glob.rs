use regex::Regex;

use crate::errors::HashStashResult;

/// Compiles a key glob into an anchored regex.
///
/// Supports `*` (any run), `?` (any single character), `[...]` classes with
/// `^` negation and ranges, and `\` escapes. An unterminated class is taken
/// literally.
pub fn compile_glob(pattern: &str) -> HashStashResult<Regex> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut expr = String::with_capacity(pattern.len() * 2 + 8);
    expr.push_str("(?s)^");

    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            '\\' if i + 1 < chars.len() => {
                i += 1;
                expr.push_str(&regex::escape(&chars[i].to_string()));
            }
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    expr.push_str(&translate_class(&chars[i + 1..end]));
                    i = end;
                }
                None => expr.push_str(r"\["),
            },
            c => expr.push_str(&regex::escape(&c.to_string())),
        }
        i += 1;
    }

    expr.push('$');
    Ok(Regex::new(&expr)?)
}

fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            ']' if i > start + 1 => return Some(i),
            _ => i += 1,
        }
    }
    None
}

fn translate_class(body: &[char]) -> String {
    let mut class = String::from("[");
    let mut chars = body.iter().peekable();
    if let Some('^') = chars.peek() {
        class.push('^');
        chars.next();
    }
    while let Some(&c) = chars.next() {
        match c {
            '\\' => {
                if let Some(&escaped) = chars.next() {
                    push_class_literal(&mut class, escaped);
                }
            }
            '-' => class.push('-'),
            c => push_class_literal(&mut class, c),
        }
    }
    class.push(']');
    class
}

fn push_class_literal(class: &mut String, c: char) {
    if matches!(c, '[' | ']' | '\\' | '^' | '-' | '&' | '~') {
        class.push('\\');
    }
    class.push(c);
}

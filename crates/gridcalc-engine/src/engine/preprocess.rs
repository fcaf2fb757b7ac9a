//! Formula preprocessing before Rhai compilation.
//!
//! Rhai treats `5` as an integer, so `5 / 2` would be integer division and
//! `1 / 0` a hard error. Spreadsheet arithmetic is floating point throughout,
//! so bare integer literals are rewritten to float literals (`5` -> `5.0`)
//! before compiling. Cell references (`A1`), decimals (`1.5`), exponents
//! (`1e3`), ranges (`1..5`) and string contents are left untouched.

/// Rewrite bare integer literals in `script` as float literals.
pub fn promote_integer_literals(script: &str) -> String {
    let chars: Vec<char> = script.chars().collect();
    let mut out = String::with_capacity(script.len() + 8);
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];

        if let Some(q) = quote {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            i += 1;
            continue;
        }

        if ch == '"' || ch == '`' {
            quote = Some(ch);
            out.push(ch);
            i += 1;
            continue;
        }

        let starts_literal = ch.is_ascii_digit()
            && (i == 0 || !is_literal_char(chars[i - 1]))
            && !is_signed_exponent(&chars, i);
        if !starts_literal {
            out.push(ch);
            i += 1;
            continue;
        }

        let start = i;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        out.extend(&chars[start..i]);
        if chars.get(i).is_none_or(|next| !is_literal_char(*next)) {
            out.push_str(".0");
        }
    }

    out
}

/// True if the digits at `i` are the exponent of a number like `1.5e-3`.
fn is_signed_exponent(chars: &[char], i: usize) -> bool {
    if i < 3 || !matches!(chars[i - 1], '+' | '-') || !matches!(chars[i - 2], 'e' | 'E') {
        return false;
    }
    // The mantissa must be a numeric literal, not the tail of an identifier.
    let mantissa_end = i - 2;
    let mut start = mantissa_end;
    while start > 0 && (chars[start - 1].is_ascii_digit() || matches!(chars[start - 1], '.' | '_')) {
        start -= 1;
    }
    start < mantissa_end
        && chars[start].is_ascii_digit()
        && (start == 0 || !is_literal_char(chars[start - 1]))
}

/// Characters that glue onto a digit run and make it something other than a
/// bare integer literal.
fn is_literal_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '.'
}

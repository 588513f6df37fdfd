use crate::{LiteSqlError, Result, Token, consume_while};
use std::fmt::{Display, Write};

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_part(c: &char) -> bool {
    c.is_ascii_alphanumeric() || *c == '_'
}

/// Split a SQL template into text and `@name` / `:name` placeholders.
///
/// Quoted literals and identifiers are copied verbatim, `::` casts and `@@` variables
/// are not placeholders.
pub fn scan_template(template: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut input = template;
    while let Some(c) = input.chars().next() {
        input = &input[c.len_utf8()..];
        match c {
            '\'' | '"' | '`' => {
                text.push(c);
                text.push_str(consume_while(&mut input, |v| *v != c));
                if input.starts_with(c) {
                    text.push(c);
                    input = &input[1..];
                }
            }
            ':' | '@' if input.starts_with(c) => {
                text.push(c);
                text.push(c);
                input = &input[1..];
                text.push_str(consume_while(&mut input, is_name_part));
            }
            ':' | '@' if input.starts_with(is_name_start) => {
                if !text.is_empty() {
                    tokens.push(Token::Text(std::mem::take(&mut text)));
                }
                let name = consume_while(&mut input, is_name_part);
                tokens.push(Token::Param(name.to_owned()));
            }
            _ => text.push(c),
        }
    }
    if !text.is_empty() {
        tokens.push(Token::Text(text));
    }
    tokens
}

/// Distinct placeholder names in order of first appearance.
pub fn placeholder_names(tokens: &[Token]) -> Vec<&str> {
    let mut result: Vec<&str> = Vec::new();
    for token in tokens {
        if let Token::Param(name) = token {
            if !result.contains(&name.as_str()) {
                result.push(name);
            }
        }
    }
    result
}

/// Positional `{0}`, `{1}` substitution, `{{` and `}}` escape braces.
///
/// Fails on templates carrying placeholders, those values must be bound instead.
pub fn format_positional(template: &str, args: &[&dyn Display]) -> Result<String> {
    let placeholders = scan_template(template)
        .iter()
        .filter(|t| matches!(t, Token::Param(..)))
        .count();
    if placeholders > 0 {
        return Err(LiteSqlError::RawTemplateViolation(format!(
            "`{}` contains {} placeholder(s), use append to bind values",
            template, placeholders
        ))
        .into());
    }
    let mut out = String::with_capacity(template.len());
    let mut input = template;
    while let Some(c) = input.chars().next() {
        input = &input[c.len_utf8()..];
        match c {
            '{' if input.starts_with('{') => {
                out.push('{');
                input = &input[1..];
            }
            '}' if input.starts_with('}') => {
                out.push('}');
                input = &input[1..];
            }
            '{' => {
                let digits = consume_while(&mut input, char::is_ascii_digit);
                let index = digits.parse::<usize>().ok().filter(|_| input.starts_with('}'));
                let Some(index) = index else {
                    return Err(LiteSqlError::RawTemplateViolation(format!(
                        "`{}` has a malformed positional slot",
                        template
                    ))
                    .into());
                };
                input = &input[1..];
                let Some(arg) = args.get(index) else {
                    return Err(LiteSqlError::ParameterCount(format!(
                        "`{}` references argument {} but {} were provided",
                        template,
                        index,
                        args.len()
                    ))
                    .into());
                };
                let _ = write!(out, "{}", arg);
            }
            _ => out.push(c),
        }
    }
    Ok(out)
}

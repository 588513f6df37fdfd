pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut len = out.len();
    for v in values {
        if out.len() > len {
            out.push_str(separator);
        }
        len = out.len();
        f(out, v);
    }
}

/// Split off the longest prefix whose characters satisfy `predicate`.
pub fn consume_while<'s>(input: &mut &'s str, mut predicate: impl FnMut(&char) -> bool) -> &'s str {
    let len = input
        .char_indices()
        .find(|(_, c)| !predicate(c))
        .map(|(i, _)| i)
        .unwrap_or(input.len());
    if len == 0 {
        return "";
    }
    let result = &input[..len];
    *input = &input[len..];
    result
}

#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        format_args!(
            "{}{}",
            &$query[..$crate::floor_char_boundary(&$query, 497)].trim_end(),
            if $query.len() > 497 { "..." } else { "" },
        )
    };
}

pub fn floor_char_boundary(value: &str, index: usize) -> usize {
    if index >= value.len() {
        return value.len();
    }
    (0..=index)
        .rev()
        .find(|i| value.is_char_boundary(*i))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_multibyte() {
        let mut input = "名前_1 rest";
        let taken = consume_while(&mut input, |c| !c.is_whitespace());
        assert_eq!(taken, "名前_1");
        assert_eq!(input, " rest");
    }

    #[test]
    fn truncate() {
        let long = "é".repeat(400);
        let text = format!("{}", truncate_long!(long));
        assert!(text.ends_with("..."));
        let short = "SELECT 1";
        assert_eq!(format!("{}", truncate_long!(short)), "SELECT 1");
    }
}

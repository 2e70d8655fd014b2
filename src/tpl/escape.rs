use std::borrow::Cow;
use std::fmt;

/// HTML-escapes `&`, `<`, `>` and `"`; every non-ASCII character becomes a
/// numeric character reference.
pub fn escape_html(text: &str) -> Cow<'_, str> {
    if !text.chars().any(needs_escape) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 16);
    // writing into a String cannot fail
    let _ = write_escaped(&mut out, text);
    Cow::Owned(out)
}

pub(crate) fn write_escaped<W: fmt::Write>(out: &mut W, text: &str) -> fmt::Result {
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if !needs_escape(c) {
            continue;
        }
        out.write_str(&text[start..i])?;
        match c {
            '&' => out.write_str("&amp;")?,
            '<' => out.write_str("&lt;")?,
            '>' => out.write_str("&gt;")?,
            '"' => out.write_str("&quot;")?,
            _ => write!(out, "&#{};", c as u32)?,
        }
        start = i + c.len_utf8();
    }
    out.write_str(&text[start..])
}

fn needs_escape(c: char) -> bool {
    matches!(c, '&' | '<' | '>' | '"') || !c.is_ascii()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a&b>"), "&lt;a&amp;b&gt;");
        assert_eq!(escape_html("say \"hi\""), "say &quot;hi&quot;");
        assert_eq!(escape_html("café"), "caf&#233;");
        assert_eq!(escape_html("plain 'text'"), "plain 'text'");
        assert!(matches!(escape_html("plain"), Cow::Borrowed(_)));
    }
}

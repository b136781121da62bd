//! HTML assembly helpers.

use super::DataContext;

/// Serialises `data` into a rehydration script assigning
/// `window.{state_variable}`.
///
/// Characters that could close the script element or break a JavaScript
/// string literal are escaped as unicode sequences.
pub fn data_markup(state_variable: &str, data: &DataContext) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(data)?;
    let mut escaped = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => escaped.push_str("\\u003c"),
            '>' => escaped.push_str("\\u003e"),
            '&' => escaped.push_str("\\u0026"),
            '\u{2028}' => escaped.push_str("\\u2028"),
            '\u{2029}' => escaped.push_str("\\u2029"),
            _ => escaped.push(c),
        }
    }
    Ok(format!("<script>window.{state_variable}={escaped};</script>"))
}

/// Wraps head and body markup in a complete HTML document.
#[must_use]
pub fn html_document(lang: &str, head: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html lang=\"{lang}\"><head><meta charset=\"utf-8\">{head}</head><body>{body}</body></html>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_markup_escapes_script_close() {
        let data = DataContext::empty().with_state(serde_json::json!({"html": "</script><b>&"}));
        let markup = data_markup("__SSR_STATE__", &data).unwrap();

        assert!(markup.starts_with("<script>window.__SSR_STATE__="));
        assert!(markup.ends_with(";</script>"));
        assert_eq!(markup.matches("</script>").count(), 1);
        assert!(markup.contains("\\u003c/script\\u003e"));
        assert!(markup.contains("\\u0026"));
    }

    #[test]
    fn test_data_markup_round_trips_through_json() {
        let data = DataContext::for_route("home").with_state(serde_json::json!({"n": 1}));
        let markup = data_markup("S", &data).unwrap();

        let json = markup
            .trim_start_matches("<script>window.S=")
            .trim_end_matches(";</script>");
        let parsed: DataContext = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, data);
    }

    #[test]
    fn test_html_document() {
        let doc = html_document("en", "<title>T</title>", "<main></main>");
        assert!(doc.starts_with("<!DOCTYPE html><html lang=\"en\">"));
        assert!(doc.contains("<head><meta charset=\"utf-8\"><title>T</title></head>"));
        assert!(doc.ends_with("<body><main></main></body></html>"));
    }
}

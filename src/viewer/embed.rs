use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

/// HTML for `/m/{id}`: the PDF in a frame plus explicit open and text-view links.
///
/// An empty `pdf_url` renders the "no menu" state instead of a frame.
pub fn menu_page(pdf_url: &str, pages_url: &str) -> String {
    let body = if pdf_url.is_empty() {
        "<p class=\"empty\">No menu available yet.</p>".to_string()
    } else {
        format!(
            r#"<p class="actions">
      <a href="{pdf}" target="_blank" rel="noreferrer">Open PDF in new tab</a>
      &middot;
      <a href="{pages}">View as text</a>
    </p>
    <iframe src="{pdf}" title="Menu PDF" style="width:100%;height:85vh;border:1px solid #ddd"></iframe>"#,
            pdf = attr(pdf_url),
            pages = attr(pages_url),
        )
    };

    format!(
        r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>
  </head>
  <body style="margin:0;padding:20px;font-family:system-ui,sans-serif">
    <h1>{title}</h1>
    {body}
  </body>
</html>
"#,
        title = text("Menu"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_values_are_escaped() {
        let html = menu_page("https://x.example/a\"onload=\"alert(1).pdf", "/m/u/pages");
        assert!(!html.contains("a\"onload"));
        assert!(html.contains("&quot;onload=&quot;"));
    }

    #[test]
    fn empty_url_renders_no_menu_state() {
        let html = menu_page("", "/m/u/pages");
        assert!(html.contains("No menu available yet."));
        assert!(!html.contains("<iframe"));
    }
}

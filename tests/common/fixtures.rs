//! Notice page and attachment fixtures

/// Page served for identifiers with no record behind them
pub const PLACEHOLDER_PAGE: &str = r#"<html>
<head><title>PhilGEPS - Bid Notice Abstract</title></head>
<body><div id="content"><p>The record you requested does not exist.</p></div></body>
</html>"#;

/// Minimal PDF body served as an attachment
pub const BOQ_PDF: &[u8] = b"%PDF-1.4\n1 0 obj << /Type /Catalog >> endobj\n% Bill of Quantities\ntrailer\n%%EOF\n";

/// A notice page laid out like the portal's printable abstract
pub fn notice_page(title: &str, category: &str, attachments: &[&str]) -> String {
    let links: String = attachments
        .iter()
        .map(|href| format!(r#"<tr><td><a href="{href}">{href}</a></td></tr>"#))
        .collect();
    format!(
        r#"<html>
<head><title>PhilGEPS - Bid Notice Abstract</title></head>
<body>
<table class="abstract">
  <tr><td class="label">Reference Number</td><td>ABS-2025-0001</td></tr>
  <tr><td class="label">Project Title</td>
      <td><span id="lblDisplayTitle">
        {title}
      </span></td></tr>
  <tr><td class="label">Category</td><td><span id="lblDisplayCategory">{category}</span></td></tr>
  <tr><td class="label">Area of Delivery</td><td>Region IV-A</td></tr>
</table>
<table class="attachments">{links}</table>
</body>
</html>"#
    )
}

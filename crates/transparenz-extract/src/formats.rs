//! Native parsers for structured-text and office formats
//!
//! Everything here is synchronous and offline; only the extractor's OCR
//! fallback path talks to the network.

use crate::ExtractError;
use std::io::{Cursor, Read};

/// Parse CSV content into searchable text, one row per line
///
/// Cells are joined with " | " so row structure survives into the record
/// text the fact checker matches against.
pub fn parse_csv(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut lines = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| ExtractError::Corrupt {
            format: "csv",
            detail: e.to_string(),
        })?;
        let cells: Vec<&str> = record.iter().map(str::trim).filter(|c| !c.is_empty()).collect();
        if !cells.is_empty() {
            lines.push(cells.join(" | "));
        }
    }

    Ok(lines.join("\n"))
}

/// Parse JSON content into "path: value" lines
pub fn parse_json(bytes: &[u8]) -> Result<String, ExtractError> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| ExtractError::Corrupt {
            format: "json",
            detail: e.to_string(),
        })?;

    let mut lines = Vec::new();
    flatten_json(&value, "", &mut lines);
    Ok(lines.join("\n"))
}

fn flatten_json(value: &serde_json::Value, path: &str, out: &mut Vec<String>) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, v) in map {
                let child = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                flatten_json(v, &child, out);
            }
        }
        serde_json::Value::Array(items) => {
            for (i, v) in items.iter().enumerate() {
                flatten_json(v, &format!("{}[{}]", path, i), out);
            }
        }
        serde_json::Value::Null => {}
        scalar => {
            let rendered = match scalar {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            if path.is_empty() {
                out.push(rendered);
            } else {
                out.push(format!("{}: {}", path, rendered));
            }
        }
    }
}

/// Decode plain text, falling back from UTF-8 to Latin-1
///
/// Municipal uploads predate UTF-8 often enough that the fallback matters;
/// Latin-1 maps every byte to a char, so it cannot fail.
pub fn parse_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Extract text from a docx container
///
/// A docx is a zip with the document body at `word/document.xml`;
/// paragraph ends become newlines, all other markup is stripped.
pub fn parse_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let xml = read_zip_entry(bytes, "word/document.xml", "docx")?;
    let with_breaks = xml.replace("</w:p>", "\n");
    Ok(unescape_xml(&strip_xml_tags(&with_breaks)))
}

/// Extract text from an xlsx container
///
/// Shared strings carry the text cells; numeric cells keep their raw `<v>`
/// values from the worksheet parts.
pub fn parse_xlsx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| ExtractError::Corrupt {
            format: "xlsx",
            detail: e.to_string(),
        })?;

    let mut lines = Vec::new();

    let names: Vec<String> = archive.file_names().map(str::to_string).collect();

    if names.iter().any(|n| n == "xl/sharedStrings.xml") {
        let xml = read_archive_entry(&mut archive, "xl/sharedStrings.xml", "xlsx")?;
        lines.extend(xml_element_texts(&xml, "t"));
    }

    for name in names.iter().filter(|n| n.starts_with("xl/worksheets/") && n.ends_with(".xml")) {
        let xml = read_archive_entry(&mut archive, name, "xlsx")?;
        for value in xml_element_texts(&xml, "v") {
            // Values that parse as numbers are real cell contents; other
            // <v> entries are shared-string indices already covered above
            if value.parse::<f64>().is_ok() {
                lines.push(value);
            }
        }
    }

    Ok(lines.join("\n"))
}

fn read_zip_entry(bytes: &[u8], entry: &str, format: &'static str) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| ExtractError::Corrupt {
        format,
        detail: e.to_string(),
    })?;
    read_archive_entry(&mut archive, entry, format)
}

fn read_archive_entry(
    archive: &mut zip::ZipArchive<Cursor<&[u8]>>,
    entry: &str,
    format: &'static str,
) -> Result<String, ExtractError> {
    let mut file = archive.by_name(entry).map_err(|e| ExtractError::Corrupt {
        format,
        detail: format!("missing {}: {}", entry, e),
    })?;
    let mut xml = String::new();
    file.read_to_string(&mut xml).map_err(|e| ExtractError::Corrupt {
        format,
        detail: e.to_string(),
    })?;
    Ok(xml)
}

/// Remove all XML tags, collapsing runs of whitespace
fn strip_xml_tags(xml: &str) -> String {
    let mut out = String::with_capacity(xml.len());
    let mut in_tag = false;

    for c in xml.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }

    let lines: Vec<String> = out
        .lines()
        .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|l| !l.is_empty())
        .collect();
    lines.join("\n")
}

/// Collect the text content of every `<tag>...</tag>` element
fn xml_element_texts(xml: &str, tag: &str) -> Vec<String> {
    let open_plain = format!("<{}>", tag);
    let open_attr = format!("<{} ", tag);
    let close = format!("</{}>", tag);

    let mut out = Vec::new();
    let mut rest = xml;

    loop {
        let pos = match (rest.find(&open_plain), rest.find(&open_attr)) {
            (Some(a), Some(b)) => a.min(b),
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (None, None) => break,
        };

        let after_open = &rest[pos..];
        let Some(gt) = after_open.find('>') else { break };
        // Self-closing elements have no text content
        if after_open[..gt].ends_with('/') {
            rest = &rest[pos + gt + 1..];
            continue;
        }

        let content_start = pos + gt + 1;
        let Some(end) = rest[content_start..].find(&close) else { break };

        let content = unescape_xml(&rest[content_start..content_start + end]);
        if !content.trim().is_empty() {
            out.push(content.trim().to_string());
        }

        rest = &rest[content_start + end + close.len()..];
    }

    out
}

fn unescape_xml(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_csv() {
        let bytes = b"Kategorie,Jahr,Betrag\nStra\xc3\x9fen,2023,25000\n";
        let text = parse_csv(bytes).unwrap();

        assert!(text.contains("Kategorie | Jahr | Betrag"));
        assert!(text.contains("Straßen | 2023 | 25000"));
    }

    #[test]
    fn test_parse_csv_skips_blank_rows() {
        let bytes = b"a,b\n,,\nc,d\n";
        let text = parse_csv(bytes).unwrap();
        assert_eq!(text, "a | b\nc | d");
    }

    #[test]
    fn test_parse_json() {
        let bytes = br#"{"kategorie": "finanzen", "betrag": 25000, "tags": ["budget"]}"#;
        let text = parse_json(bytes).unwrap();

        assert!(text.contains("kategorie: finanzen"));
        assert!(text.contains("betrag: 25000"));
        assert!(text.contains("tags[0]: budget"));
    }

    #[test]
    fn test_parse_json_corrupt() {
        let result = parse_json(b"{not json");
        assert!(matches!(result, Err(ExtractError::Corrupt { format: "json", .. })));
    }

    #[test]
    fn test_parse_text_utf8() {
        assert_eq!(parse_text("Straße".as_bytes()), "Straße");
    }

    #[test]
    fn test_parse_text_latin1_fallback() {
        // "Straße" in Latin-1: 0xDF is ß
        let bytes = b"Stra\xdfe";
        assert_eq!(parse_text(bytes), "Straße");
    }

    fn docx_fixture(body_xml: &str) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buf);
            let options = zip::write::SimpleFileOptions::default();
            writer.start_file("word/document.xml", options).unwrap();
            writer.write_all(body_xml.as_bytes()).unwrap();
            writer.finish().unwrap();
        }
        buf.into_inner()
    }

    #[test]
    fn test_parse_docx() {
        let xml = r#"<w:document><w:body>
            <w:p><w:r><w:t>Gemeinderatsbeschluss</w:t></w:r></w:p>
            <w:p><w:r><w:t>Budget 25000 Euro</w:t></w:r></w:p>
        </w:body></w:document>"#;
        let text = parse_docx(&docx_fixture(xml)).unwrap();

        assert!(text.contains("Gemeinderatsbeschluss"));
        assert!(text.contains("Budget 25000 Euro"));
    }

    #[test]
    fn test_parse_docx_not_a_zip() {
        let result = parse_docx(b"plainly not a zip archive");
        assert!(matches!(result, Err(ExtractError::Corrupt { format: "docx", .. })));
    }

    #[test]
    fn test_parse_xlsx() {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buf);
            let options = zip::write::SimpleFileOptions::default();
            writer.start_file("xl/sharedStrings.xml", options).unwrap();
            writer
                .write_all(
                    br#"<sst><si><t>Kategorie</t></si><si><t xml:space="preserve">Stra&#223;en</t></si></sst>"#,
                )
                .unwrap();
            writer.start_file("xl/worksheets/sheet1.xml", options).unwrap();
            writer
                .write_all(br#"<worksheet><row><c t="s"><v>0</v></c><c><v>25000</v></c></row></worksheet>"#)
                .unwrap();
            writer.finish().unwrap();
        }

        let text = parse_xlsx(&buf.into_inner()).unwrap();
        assert!(text.contains("Kategorie"));
        assert!(text.contains("25000"));
    }

    #[test]
    fn test_xml_element_texts_with_attributes() {
        let xml = r#"<t xml:space="preserve">hello</t><t>world</t><t/>"#;
        assert_eq!(xml_element_texts(xml, "t"), vec!["hello", "world"]);
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape_xml("a &amp; b &lt;c&gt;"), "a & b <c>");
    }
}

use lopdf::Document;
use tracing::debug;

use crate::error::ScrapeError;

/// Decode a PDF from memory and return the text of its first page.
pub fn first_page_text(bytes: &[u8]) -> Result<String, ScrapeError> {
    let doc = Document::load_mem(bytes)?;
    let first = doc
        .get_pages()
        .keys()
        .next()
        .copied()
        .ok_or(ScrapeError::EmptyDocument)?;

    let raw = doc.extract_text(&[first])?;
    debug!("Extracted {} chars from page {}", raw.len(), first);
    Ok(clean_text(&raw))
}

/// Strip PDF artifacts and blank lines, keeping one entry per line.
fn clean_text(text: &str) -> String {
    text.replace('\u{0}', "")
        .replace('\u{FEFF}', "")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Minimal Courier PDF with one line of text per page.
#[cfg(test)]
pub(crate) fn sample_pdf(pages: &[&str]) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for line in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*line)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Count" => kids.len() as i64,
        "Kids" => kids,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_drops_artifacts_and_blank_lines() {
        let dirty = "\u{FEFF}  FY 2025 Schedule  \n\n\n  March 14, 2024\u{0}  \n  ";
        assert_eq!(clean_text(dirty), "FY 2025 Schedule\nMarch 14, 2024");
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        assert!(matches!(
            first_page_text(b"not a pdf at all"),
            Err(ScrapeError::Pdf(_))
        ));
    }

    #[test]
    fn only_first_page_is_read() {
        let bytes = sample_pdf(&["July 9, 2024", "August 13, 2024"]);
        let text = first_page_text(&bytes).unwrap();
        assert!(text.contains("July 9, 2024"));
        assert!(!text.contains("August"));
    }
}

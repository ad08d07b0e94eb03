//! Word and PowerPoint text extraction. Both formats are zip archives of XML
//! parts; only the text runs are read.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use super::ExtractError;

const DOCX_BODY: &str = "word/document.xml";
const SLIDE_PREFIX: &str = "ppt/slides/slide";
const PRESENTATION: &str = "ppt/presentation.xml";
const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";

/// Paragraph texts of a .docx, one per line.
pub(super) fn docx_text(content: &[u8]) -> Result<String, ExtractError> {
    let mut archive = ZipArchive::new(Cursor::new(content))?;
    let xml = read_part(&mut archive, DOCX_BODY)?;

    let mut reader = Reader::from_str(&xml);
    let mut paragraphs = Vec::new();
    let mut open: Vec<String> = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => open.push(String::new()),
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:p" => paragraphs.push(String::new()),
                b"w:tab" => push_text(&mut open, "\t"),
                b"w:br" | b"w:cr" => push_text(&mut open, "\n"),
                _ => {}
            },
            Event::Text(t) if in_text => push_text(&mut open, &t.unescape()?),
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    if let Some(paragraph) = open.pop() {
                        paragraphs.push(paragraph);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs.join("\n"))
}

/// Text of every text-bearing shape on every slide, in presentation order.
pub(super) fn pptx_text(content: &[u8]) -> Result<String, ExtractError> {
    let mut archive = ZipArchive::new(Cursor::new(content))?;

    let mut slides = presentation_slide_parts(&mut archive)?;
    if slides.is_empty() {
        slides = numbered_slide_parts(&archive);
    }
    if slides.is_empty() {
        return Err(ExtractError::MissingPart(format!("{SLIDE_PREFIX}*.xml")));
    }

    let mut shapes = Vec::new();
    for name in &slides {
        let xml = read_part(&mut archive, name)?;
        shapes.extend(slide_shape_texts(&xml)?);
    }

    Ok(shapes.join("\n"))
}

/// Slide part names in the order of `p:sldIdLst`, resolved through the
/// presentation relationships. Empty when either part is absent.
fn presentation_slide_parts<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
) -> Result<Vec<String>, ExtractError> {
    let Some(presentation) = read_optional_part(archive, PRESENTATION)? else {
        return Ok(Vec::new());
    };
    let Some(rels) = read_optional_part(archive, PRESENTATION_RELS)? else {
        return Ok(Vec::new());
    };

    let mut slide_ids = Vec::new();
    let mut reader = Reader::from_str(&presentation);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"p:sldId" => {
                let id = e
                    .try_get_attribute("r:id")
                    .map_err(quick_xml::Error::from)?;
                if let Some(id) = id {
                    slide_ids.push(id.unescape_value()?.into_owned());
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let mut targets = HashMap::new();
    let mut reader = Reader::from_str(&rels);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"Relationship" => {
                let id = e.try_get_attribute("Id").map_err(quick_xml::Error::from)?;
                let target = e
                    .try_get_attribute("Target")
                    .map_err(quick_xml::Error::from)?;
                if let (Some(id), Some(target)) = (id, target) {
                    targets.insert(
                        id.unescape_value()?.into_owned(),
                        target.unescape_value()?.into_owned(),
                    );
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(slide_ids
        .iter()
        .filter_map(|id| targets.get(id))
        .map(|target| match target.strip_prefix('/') {
            Some(absolute) => absolute.to_string(),
            None => format!("ppt/{target}"),
        })
        .collect())
}

/// Slide part names ordered by the number in their file name.
fn numbered_slide_parts<R: Read + std::io::Seek>(archive: &ZipArchive<R>) -> Vec<String> {
    let mut slides: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| slide_number(name).map(|n| (n, name.to_string())))
        .collect();
    slides.sort_by_key(|(n, _)| *n);
    slides.into_iter().map(|(_, name)| name).collect()
}

#[derive(Default)]
struct ShapeText {
    has_text_body: bool,
    paragraphs: Vec<String>,
}

fn slide_shape_texts(xml: &str) -> Result<Vec<String>, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut texts = Vec::new();
    let mut open: Vec<ShapeText> = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"p:sp" => open.push(ShapeText::default()),
                b"p:txBody" => {
                    if let Some(shape) = open.last_mut() {
                        shape.has_text_body = true;
                    }
                }
                b"a:p" => start_paragraph(&mut open),
                b"a:t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"a:p" => start_paragraph(&mut open),
                b"a:br" => push_shape_text(&mut open, "\n"),
                _ => {}
            },
            Event::Text(t) if in_text => push_shape_text(&mut open, &t.unescape()?),
            Event::End(e) => match e.name().as_ref() {
                b"a:t" => in_text = false,
                b"p:sp" => {
                    if let Some(shape) = open.pop() {
                        if shape.has_text_body {
                            texts.push(shape.paragraphs.join("\n"));
                        }
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(texts)
}

fn start_paragraph(open: &mut [ShapeText]) {
    if let Some(shape) = open.last_mut() {
        shape.paragraphs.push(String::new());
    }
}

fn push_shape_text(open: &mut [ShapeText], text: &str) {
    if let Some(paragraph) = open.last_mut().and_then(|s| s.paragraphs.last_mut()) {
        paragraph.push_str(text);
    }
}

fn push_text(open: &mut [String], text: &str) {
    if let Some(paragraph) = open.last_mut() {
        paragraph.push_str(text);
    }
}

/// `ppt/slides/slide12.xml` -> 12
fn slide_number(name: &str) -> Option<u32> {
    name.strip_prefix(SLIDE_PREFIX)?
        .strip_suffix(".xml")?
        .parse()
        .ok()
}

fn read_part<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<String, ExtractError> {
    let mut part = match archive.by_name(name) {
        Ok(part) => part,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(ExtractError::MissingPart(name.to_string()))
        }
        Err(e) => return Err(e.into()),
    };
    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .map_err(|e| ExtractError::Archive(e.into()))?;
    Ok(xml)
}

fn read_optional_part<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<String>, ExtractError> {
    match read_part(archive, name) {
        Ok(xml) => Ok(Some(xml)),
        Err(ExtractError::MissingPart(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::fixtures;

    fn slide(shapes: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree>{shapes}</p:spTree></p:cSld></p:sld>"#
        )
    }

    fn text_shape(paragraphs: &[&str]) -> String {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<a:p><a:r><a:t>{p}</a:t></a:r></a:p>"))
            .collect();
        format!("<p:sp><p:nvSpPr/><p:txBody><a:bodyPr/>{body}</p:txBody></p:sp>")
    }

    #[test]
    fn test_docx_paragraphs_joined_by_newline() {
        let bytes = fixtures::docx(&["Thermodynamique", "Premier principe", "Second principe"]);
        assert_eq!(
            docx_text(&bytes).unwrap(),
            "Thermodynamique\nPremier principe\nSecond principe"
        );
    }

    #[test]
    fn test_docx_unescapes_entities_and_keeps_tabs() {
        let document = r#"<w:document xmlns:w="w"><w:body><w:p><w:r><w:t>A &amp; B</w:t><w:tab/><w:t>C</w:t></w:r></w:p><w:p/></w:body></w:document>"#;
        let bytes = fixtures::zip_archive(&[("word/document.xml", document)]);
        assert_eq!(docx_text(&bytes).unwrap(), "A & B\tC\n");
    }

    #[test]
    fn test_docx_without_body_part() {
        let bytes = fixtures::zip_archive(&[("word/styles.xml", "<w:styles/>")]);
        assert!(matches!(docx_text(&bytes), Err(ExtractError::MissingPart(_))));
    }

    #[test]
    fn test_docx_rejects_non_zip() {
        assert!(matches!(docx_text(b"plain text"), Err(ExtractError::Archive(_))));
    }

    #[test]
    fn test_pptx_shapes_in_slide_order() {
        let slide1 = slide(&format!(
            "{}{}",
            text_shape(&["Titre"]),
            text_shape(&["Point A", "Point B"])
        ));
        let slide2 = slide(&text_shape(&["Suite"]));
        let slide10 = slide(&text_shape(&["Fin"]));
        let bytes = fixtures::zip_archive(&[
            ("ppt/slides/slide10.xml", slide10.as_str()),
            ("ppt/slides/slide2.xml", slide2.as_str()),
            ("ppt/slides/slide1.xml", slide1.as_str()),
            ("ppt/slides/_rels/slide1.xml.rels", "<Relationships/>"),
        ]);

        assert_eq!(
            pptx_text(&bytes).unwrap(),
            "Titre\nPoint A\nPoint B\nSuite\nFin"
        );
    }

    #[test]
    fn test_pptx_follows_presentation_slide_list() {
        let presentation = r#"<p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><p:sldIdLst><p:sldId id="257" r:id="rId3"/><p:sldId id="256" r:id="rId2"/></p:sldIdLst></p:presentation>"#;
        let rels = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide1.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide2.xml"/></Relationships>"#;
        let slide1 = slide(&text_shape(&["Conclusion"]));
        let slide2 = slide(&text_shape(&["Introduction"]));
        let bytes = fixtures::zip_archive(&[
            ("ppt/presentation.xml", presentation),
            ("ppt/_rels/presentation.xml.rels", rels),
            ("ppt/slides/slide1.xml", slide1.as_str()),
            ("ppt/slides/slide2.xml", slide2.as_str()),
        ]);

        assert_eq!(pptx_text(&bytes).unwrap(), "Introduction\nConclusion");
    }

    #[test]
    fn test_pptx_skips_shapes_without_text_body() {
        let picture = "<p:sp><p:nvSpPr/><p:spPr/></p:sp>";
        let xml = slide(&format!("{picture}{}", text_shape(&["Seul texte"])));
        assert_eq!(slide_shape_texts(&xml).unwrap(), vec!["Seul texte".to_string()]);
    }

    #[test]
    fn test_pptx_without_slides() {
        let bytes = fixtures::zip_archive(&[("ppt/presentation.xml", "<p:presentation/>")]);
        assert!(matches!(pptx_text(&bytes), Err(ExtractError::MissingPart(_))));
    }

    #[test]
    fn test_slide_number_parsing() {
        assert_eq!(slide_number("ppt/slides/slide7.xml"), Some(7));
        assert_eq!(slide_number("ppt/slides/_rels/slide7.xml.rels"), None);
        assert_eq!(slide_number("ppt/slideLayouts/slideLayout1.xml"), None);
    }
}

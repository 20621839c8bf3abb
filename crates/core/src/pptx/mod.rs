//! PPTX (OOXML) serialization of a [`Deck`].
//!
//! The package uses a two-layout scheme: slide 1 takes the "title" layout
//! (centered title plus subtitle), every following slide the "title and
//! body" layout. Fixed parts come from [`templates`]; parts carrying deck
//! data are generated here, with user text routed through quick-xml so it
//! is escaped on write.

mod templates;

use std::io::{Cursor, Seek, Write};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use thiserror::Error;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::domain::deck::Deck;

#[derive(Debug, Error)]
pub enum PptxError {
    #[error("xml write failed: {0}")]
    Xml(String),
    #[error("archive write failed: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("archive io failed: {0}")]
    Io(#[from] std::io::Error),
}

pub struct DeckWriter;

impl DeckWriter {
    /// Serializes the deck into an in-memory PPTX archive. Slide numbering
    /// in the package is 1-based with the title slide first, so content
    /// slide `i` of the deck lands in `ppt/slides/slide{i + 2}.xml`.
    pub fn write(deck: &Deck) -> Result<Vec<u8>, PptxError> {
        let total_slides = deck.slides.len() + 1;
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        put_part(&mut zip, "[Content_Types].xml", &content_types_xml(total_slides), options)?;
        put_part(&mut zip, "_rels/.rels", templates::ROOT_RELS, options)?;
        put_part(&mut zip, "ppt/presentation.xml", &presentation_xml(total_slides), options)?;
        put_part(
            &mut zip,
            "ppt/_rels/presentation.xml.rels",
            &presentation_rels_xml(total_slides),
            options,
        )?;
        put_part(&mut zip, "ppt/slideMasters/slideMaster1.xml", templates::SLIDE_MASTER, options)?;
        put_part(
            &mut zip,
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            templates::SLIDE_MASTER_RELS,
            options,
        )?;
        put_part(&mut zip, "ppt/slideLayouts/slideLayout1.xml", templates::TITLE_LAYOUT, options)?;
        put_part(
            &mut zip,
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            templates::LAYOUT_RELS,
            options,
        )?;
        put_part(&mut zip, "ppt/slideLayouts/slideLayout2.xml", templates::CONTENT_LAYOUT, options)?;
        put_part(
            &mut zip,
            "ppt/slideLayouts/_rels/slideLayout2.xml.rels",
            templates::LAYOUT_RELS,
            options,
        )?;
        put_part(&mut zip, "ppt/theme/theme1.xml", templates::THEME, options)?;

        let subtitle = deck.subtitle();
        let title_slide =
            slide_xml(&SlideContent::Title { title: &deck.topic, subtitle: &subtitle })?;
        put_part(&mut zip, "ppt/slides/slide1.xml", &title_slide, options)?;
        put_part(&mut zip, "ppt/slides/_rels/slide1.xml.rels", &slide_rels_xml(1), options)?;

        for (index, slide) in deck.slides.iter().enumerate() {
            let number = index + 2;
            let body: Vec<&str> = slide.body.iter().map(String::as_str).collect();
            let content = slide_xml(&SlideContent::Body { title: &slide.title, lines: &body })?;
            put_part(&mut zip, &format!("ppt/slides/slide{number}.xml"), &content, options)?;
            put_part(
                &mut zip,
                &format!("ppt/slides/_rels/slide{number}.xml.rels"),
                &slide_rels_xml(2),
                options,
            )?;
        }

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }
}

enum SlideContent<'a> {
    Title { title: &'a str, subtitle: &'a str },
    Body { title: &'a str, lines: &'a [&'a str] },
}

const DRAWING_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const RELS_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PRESENTATION_NS: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";

fn put_part<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    name: &str,
    content: &str,
    options: FileOptions,
) -> Result<(), PptxError> {
    zip.start_file(name, options)?;
    zip.write_all(content.as_bytes())?;
    Ok(())
}

fn content_types_xml(total_slides: usize) -> String {
    let mut xml = String::from(templates::CONTENT_TYPES_PREFIX);
    for number in 1..=total_slides {
        xml.push_str(&format!(
            r#"<Override PartName="/ppt/slides/slide{number}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#
        ));
    }
    xml.push_str("</Types>");
    xml
}

fn presentation_xml(total_slides: usize) -> String {
    let mut slide_ids = String::new();
    for index in 0..total_slides {
        slide_ids
            .push_str(&format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + index, index + 2));
    }
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<p:presentation xmlns:a="{a}" xmlns:r="{r}" xmlns:p="{p}">"#,
            r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#,
            r#"<p:sldIdLst>{slides}</p:sldIdLst>"#,
            r#"<p:sldSz cx="9144000" cy="6858000" type="screen4x3"/>"#,
            r#"<p:notesSz cx="6858000" cy="9144000"/>"#,
            r#"</p:presentation>"#,
        ),
        a = DRAWING_NS,
        r = RELS_NS,
        p = PRESENTATION_NS,
        slides = slide_ids,
    )
}

fn presentation_rels_xml(total_slides: usize) -> String {
    let mut xml = String::from(concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="slideMasters/slideMaster1.xml"/>"#,
    ));
    for index in 0..total_slides {
        xml.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide{}.xml"/>"#,
            index + 2,
            index + 1,
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

fn slide_rels_xml(layout_number: usize) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout{}.xml"/>"#,
            r#"</Relationships>"#,
        ),
        layout_number,
    )
}

fn slide_xml(content: &SlideContent<'_>) -> Result<String, PptxError> {
    let mut xml = XmlBuilder::new();
    xml.declaration()?;
    xml.open("p:sld", &[("xmlns:a", DRAWING_NS), ("xmlns:r", RELS_NS), ("xmlns:p", PRESENTATION_NS)])?;
    xml.open("p:cSld", &[])?;
    xml.open("p:spTree", &[])?;
    xml.open("p:nvGrpSpPr", &[])?;
    xml.empty("p:cNvPr", &[("id", "1"), ("name", "")])?;
    xml.empty("p:cNvGrpSpPr", &[])?;
    xml.empty("p:nvPr", &[])?;
    xml.close("p:nvGrpSpPr")?;
    xml.empty("p:grpSpPr", &[])?;

    match *content {
        SlideContent::Title { title, subtitle } => {
            write_placeholder(&mut xml, 2, "Title 1", "ctrTitle", None, &[title])?;
            write_placeholder(&mut xml, 3, "Subtitle 2", "subTitle", Some("1"), &[subtitle])?;
        }
        SlideContent::Body { title, lines } => {
            write_placeholder(&mut xml, 2, "Title 1", "title", None, &[title])?;
            write_placeholder(&mut xml, 3, "Content Placeholder 2", "body", Some("1"), lines)?;
        }
    }

    xml.close("p:spTree")?;
    xml.close("p:cSld")?;
    xml.open("p:clrMapOvr", &[])?;
    xml.empty("a:masterClrMapping", &[])?;
    xml.close("p:clrMapOvr")?;
    xml.close("p:sld")?;
    xml.finish()
}

/// One paragraph per line; an empty line list still emits a single empty
/// paragraph so the placeholder keeps a text body.
fn write_placeholder(
    xml: &mut XmlBuilder,
    id: u32,
    name: &str,
    placeholder_type: &str,
    placeholder_index: Option<&str>,
    paragraphs: &[&str],
) -> Result<(), PptxError> {
    let id = id.to_string();
    xml.open("p:sp", &[])?;
    xml.open("p:nvSpPr", &[])?;
    xml.empty("p:cNvPr", &[("id", &id), ("name", name)])?;
    xml.open("p:cNvSpPr", &[])?;
    xml.empty("a:spLocks", &[("noGrp", "1")])?;
    xml.close("p:cNvSpPr")?;
    xml.open("p:nvPr", &[])?;
    match placeholder_index {
        Some(index) => xml.empty("p:ph", &[("type", placeholder_type), ("idx", index)])?,
        None => xml.empty("p:ph", &[("type", placeholder_type)])?,
    }
    xml.close("p:nvPr")?;
    xml.close("p:nvSpPr")?;
    xml.empty("p:spPr", &[])?;
    xml.open("p:txBody", &[])?;
    xml.empty("a:bodyPr", &[])?;
    xml.empty("a:lstStyle", &[])?;
    if paragraphs.is_empty() {
        xml.open("a:p", &[])?;
        xml.close("a:p")?;
    } else {
        for paragraph in paragraphs {
            xml.open("a:p", &[])?;
            xml.open("a:r", &[])?;
            xml.open("a:t", &[])?;
            xml.text(paragraph)?;
            xml.close("a:t")?;
            xml.close("a:r")?;
            xml.close("a:p")?;
        }
    }
    xml.close("p:txBody")?;
    xml.close("p:sp")?;
    Ok(())
}

struct XmlBuilder {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlBuilder {
    fn new() -> Self {
        Self { writer: Writer::new(Cursor::new(Vec::new())) }
    }

    fn declaration(&mut self) -> Result<(), PptxError> {
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
            .map_err(xml_error)
    }

    fn open(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), PptxError> {
        let mut element = BytesStart::new(name);
        for (key, value) in attributes {
            element.push_attribute((*key, *value));
        }
        self.writer.write_event(Event::Start(element)).map_err(xml_error)
    }

    fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), PptxError> {
        let mut element = BytesStart::new(name);
        for (key, value) in attributes {
            element.push_attribute((*key, *value));
        }
        self.writer.write_event(Event::Empty(element)).map_err(xml_error)
    }

    fn close(&mut self, name: &str) -> Result<(), PptxError> {
        self.writer.write_event(Event::End(BytesEnd::new(name))).map_err(xml_error)
    }

    fn text(&mut self, value: &str) -> Result<(), PptxError> {
        self.writer.write_event(Event::Text(BytesText::new(value))).map_err(xml_error)
    }

    fn finish(self) -> Result<String, PptxError> {
        String::from_utf8(self.writer.into_inner().into_inner())
            .map_err(|error| PptxError::Xml(error.to_string()))
    }
}

fn xml_error<E: std::fmt::Display>(error: E) -> PptxError {
    PptxError::Xml(error.to_string())
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use chrono::NaiveDate;
    use zip::ZipArchive;

    use crate::domain::deck::Deck;

    use super::DeckWriter;

    fn sample_deck() -> Deck {
        Deck::build(
            "AI trends",
            "- Overview\n- growth\n\nRisks & mitigations\nmodel drift",
            NaiveDate::from_ymd_opt(2025, 3, 14).expect("valid date"),
        )
    }

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes.to_vec())).expect("readable archive");
        let mut part = archive.by_name(name).expect("part present");
        let mut content = String::new();
        part.read_to_string(&mut content).expect("part is utf-8");
        content
    }

    #[test]
    fn package_contains_one_part_per_slide_plus_fixed_parts() {
        let bytes = DeckWriter::write(&sample_deck()).expect("deck serializes");
        let archive = ZipArchive::new(Cursor::new(bytes)).expect("readable archive");

        let names: Vec<&str> = archive.file_names().collect();
        assert!(names.contains(&"[Content_Types].xml"));
        assert!(names.contains(&"ppt/presentation.xml"));
        assert!(names.contains(&"ppt/slideMasters/slideMaster1.xml"));
        assert!(names.contains(&"ppt/theme/theme1.xml"));
        assert!(names.contains(&"ppt/slides/slide1.xml"));
        assert!(names.contains(&"ppt/slides/slide2.xml"));
        assert!(names.contains(&"ppt/slides/slide3.xml"));
        assert!(!names.contains(&"ppt/slides/slide4.xml"));
    }

    #[test]
    fn title_slide_uses_the_title_layout_and_carries_topic_and_date() {
        let bytes = DeckWriter::write(&sample_deck()).expect("deck serializes");

        let slide = read_part(&bytes, "ppt/slides/slide1.xml");
        assert!(slide.contains(r#"<p:ph type="ctrTitle"/>"#));
        assert!(slide.contains("<a:t>AI trends</a:t>"));
        assert!(slide.contains("<a:t>Created: 2025-03-14</a:t>"));

        let rels = read_part(&bytes, "ppt/slides/_rels/slide1.xml.rels");
        assert!(rels.contains("slideLayout1.xml"));
    }

    #[test]
    fn content_slides_use_the_body_layout_with_one_paragraph_per_line() {
        let bytes = DeckWriter::write(&sample_deck()).expect("deck serializes");

        let slide = read_part(&bytes, "ppt/slides/slide2.xml");
        assert!(slide.contains(r#"<p:ph type="title"/>"#));
        assert!(slide.contains("<a:t>Overview</a:t>"));
        assert!(slide.contains("<a:t>growth</a:t>"));

        let rels = read_part(&bytes, "ppt/slides/_rels/slide2.xml.rels");
        assert!(rels.contains("slideLayout2.xml"));
    }

    #[test]
    fn user_text_is_escaped_in_slide_parts() {
        let bytes = DeckWriter::write(&sample_deck()).expect("deck serializes");

        let slide = read_part(&bytes, "ppt/slides/slide3.xml");
        assert!(slide.contains("<a:t>Risks &amp; mitigations</a:t>"));
    }

    #[test]
    fn content_types_lists_every_slide_exactly_once() {
        let bytes = DeckWriter::write(&sample_deck()).expect("deck serializes");

        let content_types = read_part(&bytes, "[Content_Types].xml");
        assert_eq!(content_types.matches("/ppt/slides/slide").count(), 3);
    }

    #[test]
    fn presentation_lists_slides_in_deck_order() {
        let bytes = DeckWriter::write(&sample_deck()).expect("deck serializes");

        let presentation = read_part(&bytes, "ppt/presentation.xml");
        assert!(presentation.contains(r#"<p:sldId id="256" r:id="rId2"/>"#));
        assert!(presentation.contains(r#"<p:sldId id="257" r:id="rId3"/>"#));
        assert!(presentation.contains(r#"<p:sldId id="258" r:id="rId4"/>"#));
    }

    #[test]
    fn empty_body_still_yields_a_text_body() {
        let deck = Deck::build("T", "only-title", NaiveDate::from_ymd_opt(2025, 1, 1).expect("date"));
        let bytes = DeckWriter::write(&deck).expect("deck serializes");

        let slide = read_part(&bytes, "ppt/slides/slide2.xml");
        assert!(slide.contains("<a:p></a:p>"));
    }
}

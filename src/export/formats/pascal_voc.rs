//! Pascal VOC XML export.
//!
//! One `<annotation>` per exported image with an `<object>` per detection.
//! Box corners are written as integer pixel coordinates
//! (`xmin`, `ymin`, `xmax`, `ymax`).

use std::io::Write;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::export::document::ExportDocument;
use crate::export::error::FormatError;
use crate::export::traits::ExportFormat;
use crate::model::Detection;

/// Pascal VOC XML format.
///
/// Does not support:
/// - Detection scores (not part of the VOC schema)
pub struct PascalVocFormat;

impl ExportFormat for PascalVocFormat {
    fn id(&self) -> &'static str {
        "voc"
    }

    fn display_name(&self) -> &'static str {
        "Pascal VOC (XML)"
    }

    fn extension(&self) -> &'static str {
        "xml"
    }

    fn mime_type(&self) -> &'static str {
        "application/xml"
    }

    fn encode(&self, document: &ExportDocument) -> Result<Vec<u8>, FormatError> {
        let (width, height) = document
            .image_size
            .map_or((0, 0), |size| (size.width, size.height));
        if width == 0 || height == 0 {
            log::warn!(
                "Image '{}' has no dimensions, using 0x0",
                document.filename
            );
        }

        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", None, None)))
            .map_err(|e| FormatError::Xml(e.into()))?;

        writer
            .write_event(Event::Start(BytesStart::new("annotation")))
            .map_err(|e| FormatError::Xml(e.into()))?;

        self.write_text_element(&mut writer, "filename", &document.filename)?;

        writer
            .write_event(Event::Start(BytesStart::new("size")))
            .map_err(|e| FormatError::Xml(e.into()))?;
        self.write_text_element(&mut writer, "width", &width.to_string())?;
        self.write_text_element(&mut writer, "height", &height.to_string())?;
        self.write_text_element(&mut writer, "depth", "3")?;
        writer
            .write_event(Event::End(BytesEnd::new("size")))
            .map_err(|e| FormatError::Xml(e.into()))?;

        self.write_text_element(&mut writer, "segmented", "0")?;

        for det in &document.detections {
            self.write_object(&mut writer, det)?;
        }

        writer
            .write_event(Event::End(BytesEnd::new("annotation")))
            .map_err(|e| FormatError::Xml(e.into()))?;

        Ok(writer.into_inner())
    }
}

impl PascalVocFormat {
    fn write_object<W: Write>(
        &self,
        writer: &mut Writer<W>,
        det: &Detection,
    ) -> Result<(), FormatError> {
        let b = det.bounding_box;

        writer
            .write_event(Event::Start(BytesStart::new("object")))
            .map_err(|e| FormatError::Xml(e.into()))?;

        self.write_text_element(writer, "name", &det.category)?;
        self.write_text_element(writer, "pose", "Unspecified")?;
        self.write_text_element(writer, "truncated", "0")?;
        self.write_text_element(writer, "difficult", "0")?;

        writer
            .write_event(Event::Start(BytesStart::new("bndbox")))
            .map_err(|e| FormatError::Xml(e.into()))?;
        self.write_text_element(writer, "xmin", &(b.x.round() as u32).to_string())?;
        self.write_text_element(writer, "ymin", &(b.y.round() as u32).to_string())?;
        self.write_text_element(writer, "xmax", &(b.right().round() as u32).to_string())?;
        self.write_text_element(writer, "ymax", &(b.bottom().round() as u32).to_string())?;
        writer
            .write_event(Event::End(BytesEnd::new("bndbox")))
            .map_err(|e| FormatError::Xml(e.into()))?;

        writer
            .write_event(Event::End(BytesEnd::new("object")))
            .map_err(|e| FormatError::Xml(e.into()))?;
        Ok(())
    }

    /// Write a simple text element.
    fn write_text_element<W: Write>(
        &self,
        writer: &mut Writer<W>,
        name: &str,
        value: &str,
    ) -> Result<(), FormatError> {
        writer
            .write_event(Event::Start(BytesStart::new(name)))
            .map_err(|e| FormatError::Xml(e.into()))?;
        writer
            .write_event(Event::Text(BytesText::new(value)))
            .map_err(|e| FormatError::Xml(e.into()))?;
        writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(|e| FormatError::Xml(e.into()))?;
        Ok(())
    }
}

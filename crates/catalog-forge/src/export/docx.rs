//! Minimal WordprocessingML (.docx) package writer.

use std::io::{Cursor, Write};

use chrono::NaiveDate;
use quick_xml::escape::escape;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::ExportOptions;
use crate::types::{CatalogData, CatalogError, CatalogResult};

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const HEADING_COLOR: &str = "1E293B";
const SUBTITLE_COLOR: &str = "64748B";
const FOOTER_COLOR: &str = "94A3B8";

/// Formatting of a single text run. Sizes are half-points.
#[derive(Default)]
struct Run<'a> {
    text: &'a str,
    size: u32,
    bold: bool,
    italic: bool,
    color: Option<&'a str>,
}

impl Run<'_> {
    fn write(&self, out: &mut String) {
        out.push_str("<w:r><w:rPr>");
        if self.bold {
            out.push_str("<w:b/>");
        }
        if self.italic {
            out.push_str("<w:i/>");
        }
        if let Some(color) = self.color {
            out.push_str(&format!(r#"<w:color w:val="{color}"/>"#));
        }
        out.push_str(&format!(r#"<w:sz w:val="{}"/>"#, self.size));
        out.push_str("</w:rPr>");
        out.push_str(&format!(
            r#"<w:t xml:space="preserve">{}</w:t></w:r>"#,
            escape(self.text)
        ));
    }
}

#[derive(Default)]
struct Spacing {
    before: u32,
    after: u32,
}

/// Accumulates the `<w:body>` of a document.
struct Body {
    xml: String,
}

impl Body {
    fn new() -> Self {
        Self { xml: String::new() }
    }

    fn paragraph(&mut self, runs: &[Run<'_>], spacing: Spacing, centered: bool) {
        self.xml.push_str("<w:p><w:pPr>");
        self.xml.push_str(&format!(
            r#"<w:spacing w:before="{}" w:after="{}"/>"#,
            spacing.before, spacing.after
        ));
        if centered {
            self.xml.push_str(r#"<w:jc w:val="center"/>"#);
        }
        self.xml.push_str("</w:pPr>");
        for run in runs {
            run.write(&mut self.xml);
        }
        self.xml.push_str("</w:p>");
    }

    fn heading(&mut self, text: &str) {
        self.paragraph(
            &[Run {
                text,
                size: 24,
                bold: true,
                color: Some(HEADING_COLOR),
                ..Default::default()
            }],
            Spacing { before: 400, after: 200 },
            false,
        );
    }

    fn bullet(&mut self, text: &str) {
        let line = format!("• {text}");
        self.paragraph(
            &[Run { text: &line, size: 20, ..Default::default() }],
            Spacing { after: 100, ..Default::default() },
            false,
        );
    }

    fn finish(self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}<w:sectPr><w:pgSz w:w="12240" w:h="15840"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="720" w:footer="720" w:gutter="0"/></w:sectPr></w:body></w:document>"#,
            self.xml
        )
    }
}

/// Build `word/document.xml` for the catalog.
pub fn document_xml(catalog: &CatalogData, options: &ExportOptions, generated_on: NaiveDate) -> String {
    let content = &catalog.generated_content;
    let mut body = Body::new();

    body.paragraph(
        &[Run {
            text: &content.title,
            size: 32,
            bold: true,
            color: Some(catalog.layout.color_scheme.primary_hex()),
            ..Default::default()
        }],
        Spacing { after: 400, ..Default::default() },
        true,
    );
    body.paragraph(
        &[Run {
            text: "Professional Product Catalog",
            size: 20,
            color: Some(SUBTITLE_COLOR),
            ..Default::default()
        }],
        Spacing { after: 600, ..Default::default() },
        true,
    );

    body.heading("Product Overview");
    body.paragraph(
        &[Run { text: &content.description, size: 22, ..Default::default() }],
        Spacing { after: 400, ..Default::default() },
        false,
    );

    if options.include_features && !content.features.is_empty() {
        body.heading("Key Features");
        for feature in &content.features {
            body.bullet(feature);
        }
    }

    if options.include_specs && !content.specifications.is_empty() {
        body.heading("Specifications");
        for (key, value) in &content.specifications {
            let label = format!("{key}: ");
            body.paragraph(
                &[
                    Run { text: &label, size: 20, bold: true, ..Default::default() },
                    Run { text: value, size: 20, ..Default::default() },
                ],
                Spacing { after: 100, ..Default::default() },
                false,
            );
        }
    }

    if options.include_benefits && !content.benefits.is_empty() {
        body.heading("Why Choose This Product");
        for benefit in &content.benefits {
            body.bullet(benefit);
        }
    }

    let footer = format!(
        "Generated on {} with Product Catalog Generator",
        generated_on.format("%-m/%-d/%Y")
    );
    body.paragraph(
        &[Run {
            text: &footer,
            size: 16,
            italic: true,
            color: Some(FOOTER_COLOR),
            ..Default::default()
        }],
        Spacing { before: 800, ..Default::default() },
        true,
    );

    body.finish()
}

fn zip_err(e: zip::result::ZipError) -> CatalogError {
    CatalogError::Export(format!("DOCX: {e}"))
}

/// Render the catalog as a .docx package.
pub fn render_docx(
    catalog: &CatalogData,
    options: &ExportOptions,
    generated_on: NaiveDate,
) -> CatalogResult<Vec<u8>> {
    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES_XML.to_string()),
        ("_rels/.rels", RELS_XML.to_string()),
        ("word/document.xml", document_xml(catalog, options, generated_on)),
    ];

    let file_options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, xml) in parts {
        zip.start_file(name, file_options).map_err(zip_err)?;
        zip.write_all(xml.as_bytes())?;
    }
    let bytes = zip.finish().map_err(zip_err)?.into_inner();
    tracing::debug!(bytes = bytes.len(), "rendered DOCX");
    Ok(bytes)
}

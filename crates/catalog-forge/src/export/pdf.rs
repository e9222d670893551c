//! Single-page PDF rendering with the standard Helvetica/Times fonts.

use chrono::NaiveDate;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use super::text::{to_win_ansi, truncate, wrap_text};
use super::ExportOptions;
use crate::types::{CatalogData, CatalogError, CatalogResult};

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const HEADER_HEIGHT: f32 = 120.0;
const MARGIN: f32 = 50.0;
const WRAP_CHARS: usize = 70;
const MAX_DESCRIPTION_LINES: usize = 8;
const MAX_FEATURES: usize = 6;
const MAX_SPECS: usize = 8;

const WHITE: [f32; 3] = [1.0, 1.0, 1.0];
const BODY: [f32; 3] = [0.2, 0.2, 0.2];
const MUTED: [f32; 3] = [0.3, 0.3, 0.3];
const VALUE: [f32; 3] = [0.4, 0.4, 0.4];
const FOOTER: [f32; 3] = [0.6, 0.6, 0.6];

#[derive(Clone, Copy)]
enum Font {
    Regular,
    Bold,
    Serif,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
            Font::Serif => "F3",
        }
    }
}

/// Accumulates content stream operations for one page.
struct Page {
    ops: Vec<Operation>,
}

impl Page {
    fn new() -> Self {
        Self { ops: Vec::new() }
    }

    fn fill_color(&mut self, [r, g, b]: [f32; 3]) {
        self.ops
            .push(Operation::new("rg", vec![r.into(), g.into(), b.into()]));
    }

    fn rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: [f32; 3]) {
        self.fill_color(color);
        self.ops.push(Operation::new(
            "re",
            vec![x.into(), y.into(), w.into(), h.into()],
        ));
        self.ops.push(Operation::new("f", vec![]));
    }

    fn text(&mut self, x: f32, y: f32, size: f32, font: Font, color: [f32; 3], text: &str) {
        self.fill_color(color);
        self.ops.push(Operation::new("BT", vec![]));
        self.ops.push(Operation::new(
            "Tf",
            vec![font.resource().into(), size.into()],
        ));
        self.ops.push(Operation::new("Td", vec![x.into(), y.into()]));
        self.ops.push(Operation::new(
            "Tj",
            vec![Object::string_literal(to_win_ansi(text))],
        ));
        self.ops.push(Operation::new("ET", vec![]));
    }
}

fn base_font(doc: &mut Document, name: &str) -> lopdf::ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => name,
        "Encoding" => "WinAnsiEncoding",
    })
}

fn export_err(e: lopdf::Error) -> CatalogError {
    CatalogError::Export(format!("PDF: {e}"))
}

/// Lay out the catalog onto a single US Letter page.
fn layout_page(catalog: &CatalogData, options: &ExportOptions, generated_on: NaiveDate) -> Page {
    let content = &catalog.generated_content;
    let primary = catalog.layout.color_scheme.primary_rgb();
    let mut page = Page::new();

    page.rect(0.0, PAGE_HEIGHT - HEADER_HEIGHT, PAGE_WIDTH, HEADER_HEIGHT, primary);
    page.text(MARGIN, PAGE_HEIGHT - 70.0, 24.0, Font::Bold, WHITE, &truncate(&content.title, 40));
    page.text(
        MARGIN,
        PAGE_HEIGHT - 100.0,
        14.0,
        Font::Regular,
        [0.9, 0.9, 0.9],
        "Professional Product Catalog",
    );

    let mut y = PAGE_HEIGHT - 160.0;
    page.text(MARGIN, y, 18.0, Font::Bold, primary, "Product Overview");
    y -= 30.0;
    for line in wrap_text(&content.description, WRAP_CHARS)
        .iter()
        .take(MAX_DESCRIPTION_LINES)
    {
        page.text(MARGIN, y, 11.0, Font::Serif, BODY, line);
        y -= 16.0;
    }
    y -= 20.0;

    if options.include_features && !content.features.is_empty() {
        page.text(MARGIN, y, 16.0, Font::Bold, primary, "Key Features");
        y -= 25.0;
        for feature in content.features.iter().take(MAX_FEATURES) {
            let line = format!("• {}", truncate(feature, 90));
            page.text(MARGIN + 10.0, y, 10.0, Font::Regular, MUTED, &line);
            y -= 18.0;
        }
        y -= 15.0;
    }

    if options.include_specs && !content.specifications.is_empty() {
        page.text(MARGIN, y, 16.0, Font::Bold, primary, "Specifications");
        y -= 25.0;
        for (key, value) in content.specifications.iter().take(MAX_SPECS) {
            page.text(MARGIN + 10.0, y, 10.0, Font::Bold, BODY, &format!("{}:", truncate(key, 24)));
            page.text(200.0, y, 10.0, Font::Regular, VALUE, &truncate(value, 65));
            y -= 18.0;
        }
    }

    page.text(
        MARGIN,
        30.0,
        8.0,
        Font::Regular,
        FOOTER,
        &format!("Generated on {}", generated_on.format("%-m/%-d/%Y")),
    );
    page.text(
        PAGE_WIDTH - 250.0,
        30.0,
        8.0,
        Font::Regular,
        FOOTER,
        "Created with Product Catalog Generator",
    );
    page
}

/// Render the catalog as a one-page PDF.
pub fn render_pdf(
    catalog: &CatalogData,
    options: &ExportOptions,
    generated_on: NaiveDate,
) -> CatalogResult<Vec<u8>> {
    let page = layout_page(catalog, options, generated_on);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let regular = base_font(&mut doc, "Helvetica");
    let bold = base_font(&mut doc, "Helvetica-Bold");
    let serif = base_font(&mut doc, "Times-Roman");
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular,
            "F2" => bold,
            "F3" => serif,
        },
    });

    let content = Content { operations: page.ops };
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        content.encode().map_err(export_err)?,
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buf = Vec::new();
    doc.save_to(&mut buf)?;
    tracing::debug!(bytes = buf.len(), "rendered PDF");
    Ok(buf)
}

//! Catalog assembly and the edit operations behind the block editor.
//!
//! The editor is stateless from the server's point of view: it sends the
//! current catalog plus a list of [`CatalogEdit`]s and receives the updated
//! catalog back.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::types::{
    BlockKind, BlockSettings, CatalogData, CatalogError, CatalogImage, CatalogResult,
    ContentBlock, GeneratedContent, ImageCandidate, Layout, ScrapedData, Specifications,
};

/// Maximum number of images a gallery holds.
pub const MAX_GALLERY_IMAGES: usize = 15;

fn settings(columns: Option<u32>, style: Option<&str>) -> Option<BlockSettings> {
    Some(BlockSettings {
        columns,
        style: style.map(str::to_string),
        ..Default::default()
    })
}

fn gallery_content(images: &[CatalogImage]) -> serde_json::Value {
    json!({ "images": images })
}

/// Default block sequence for a freshly assembled catalog.
pub fn default_blocks(
    product: &ScrapedData,
    generated: &GeneratedContent,
    images: &[CatalogImage],
) -> Vec<ContentBlock> {
    let block = |n: u32, kind: BlockKind, content, block_settings| ContentBlock {
        id: format!("block{n}"),
        kind,
        content,
        settings: block_settings,
    };
    vec![
        block(1, BlockKind::ImageGallery, gallery_content(images), settings(Some(3), None)),
        block(2, BlockKind::Title, json!({ "text": generated.title }), None),
        block(3, BlockKind::Description, json!({ "text": generated.description }), None),
        block(4, BlockKind::Price, json!({ "value": product.price }), None),
        block(
            5,
            BlockKind::Features,
            json!({ "items": generated.features }),
            settings(None, Some("list")),
        ),
        block(
            6,
            BlockKind::Specifications,
            json!({ "items": generated.specifications }),
            settings(None, Some("table")),
        ),
        block(
            7,
            BlockKind::Benefits,
            json!({ "items": generated.benefits }),
            settings(None, Some("cards")),
        ),
    ]
}

/// Combine scraped data, generated copy and chosen images into a catalog.
pub fn assemble_catalog(
    product: ScrapedData,
    generated: GeneratedContent,
    images: &[ImageCandidate],
) -> CatalogData {
    let images: Vec<CatalogImage> = images
        .iter()
        .take(MAX_GALLERY_IMAGES)
        .enumerate()
        .map(|(i, img)| CatalogImage {
            id: format!("img{}", i + 1),
            url: img.url.clone(),
            alt: img.alt.clone(),
            position: i as u32,
        })
        .collect();
    let content_blocks = default_blocks(&product, &generated, &images);

    CatalogData {
        product,
        generated_content: generated,
        layout: Layout::default(),
        images,
        content_blocks,
    }
}

/// Text or list field shared by the product record and the generated copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum ContentField {
    Title(String),
    Description(String),
    Price(Option<String>),
    Specifications(Specifications),
    Features(Vec<String>),
    Benefits(Vec<String>),
}

/// Partial block update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockUpdate {
    #[serde(default)]
    pub content: Option<serde_json::Value>,
    #[serde(default)]
    pub settings: Option<BlockSettings>,
}

/// A single editor action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum CatalogEdit {
    SetContent { change: ContentField },
    SetLayout { layout: Layout },
    #[serde(rename_all = "camelCase")]
    ReorderImages { image_ids: Vec<String> },
    AddFeature { text: String },
    UpdateFeature { index: usize, text: String },
    RemoveFeature { index: usize },
    AddBenefit { text: String },
    UpdateBenefit { index: usize, text: String },
    RemoveBenefit { index: usize },
    #[serde(rename_all = "camelCase")]
    SetSpecification { old_key: Option<String>, key: String, value: String },
    RemoveSpecification { key: String },
    MoveBlock { id: String, to: usize },
    AddBlock { block: ContentBlock, at: Option<usize> },
    RemoveBlock { id: String },
    UpdateBlock { id: String, update: BlockUpdate },
}

fn out_of_range(what: &str, index: usize, len: usize) -> CatalogError {
    CatalogError::InvalidInput(format!("{what} index {index} out of range (len {len})"))
}

fn block_index(catalog: &CatalogData, id: &str) -> CatalogResult<usize> {
    catalog
        .content_blocks
        .iter()
        .position(|b| b.id == id)
        .ok_or_else(|| CatalogError::NotFound(format!("block {id}")))
}

fn edit_list(
    list: &mut Vec<String>,
    what: &str,
    index: usize,
    text: Option<String>,
) -> CatalogResult<()> {
    if index >= list.len() {
        return Err(out_of_range(what, index, list.len()));
    }
    match text {
        Some(text) => list[index] = text,
        None => {
            list.remove(index);
        }
    }
    Ok(())
}

fn set_content(catalog: &mut CatalogData, change: ContentField) {
    let generated = &mut catalog.generated_content;
    match change {
        ContentField::Title(text) => {
            catalog.product.title = text.clone();
            generated.title = text;
        }
        ContentField::Description(text) => {
            catalog.product.description = text.clone();
            generated.description = text;
        }
        ContentField::Price(price) => catalog.product.price = price,
        ContentField::Specifications(specs) => {
            catalog.product.specifications = specs.clone();
            generated.specifications = specs;
        }
        ContentField::Features(items) => generated.features = items,
        ContentField::Benefits(items) => generated.benefits = items,
    }
}

/// Apply one edit in place.
pub fn apply_edit(catalog: &mut CatalogData, edit: CatalogEdit) -> CatalogResult<()> {
    match edit {
        CatalogEdit::SetContent { change } => set_content(catalog, change),
        CatalogEdit::SetLayout { layout } => catalog.layout = layout,
        CatalogEdit::ReorderImages { image_ids } => reorder_images(catalog, &image_ids)?,
        CatalogEdit::AddFeature { text } => catalog.generated_content.features.push(text),
        CatalogEdit::UpdateFeature { index, text } => {
            edit_list(&mut catalog.generated_content.features, "feature", index, Some(text))?
        }
        CatalogEdit::RemoveFeature { index } => {
            edit_list(&mut catalog.generated_content.features, "feature", index, None)?
        }
        CatalogEdit::AddBenefit { text } => catalog.generated_content.benefits.push(text),
        CatalogEdit::UpdateBenefit { index, text } => {
            edit_list(&mut catalog.generated_content.benefits, "benefit", index, Some(text))?
        }
        CatalogEdit::RemoveBenefit { index } => {
            edit_list(&mut catalog.generated_content.benefits, "benefit", index, None)?
        }
        CatalogEdit::SetSpecification { old_key, key, value } => {
            let key = key.trim().to_string();
            if key.is_empty() {
                return Err(CatalogError::InvalidInput("specification key is empty".into()));
            }
            let old = old_key.filter(|old| *old != key);
            for specs in [
                &mut catalog.product.specifications,
                &mut catalog.generated_content.specifications,
            ] {
                if let Some(old) = &old {
                    specs.remove(old);
                }
                specs.insert(key.clone(), value.clone());
            }
        }
        CatalogEdit::RemoveSpecification { key } => {
            let in_product = catalog.product.specifications.remove(&key).is_some();
            let in_generated = catalog.generated_content.specifications.remove(&key).is_some();
            if !in_product && !in_generated {
                return Err(CatalogError::NotFound(format!("specification {key}")));
            }
        }
        CatalogEdit::MoveBlock { id, to } => {
            let from = block_index(catalog, &id)?;
            let len = catalog.content_blocks.len();
            if to >= len {
                return Err(out_of_range("block", to, len));
            }
            let block = catalog.content_blocks.remove(from);
            catalog.content_blocks.insert(to, block);
        }
        CatalogEdit::AddBlock { block, at } => {
            if catalog.content_blocks.iter().any(|b| b.id == block.id) {
                return Err(CatalogError::InvalidInput(format!(
                    "block {} already exists",
                    block.id
                )));
            }
            let len = catalog.content_blocks.len();
            let at = at.unwrap_or(len);
            if at > len {
                return Err(out_of_range("block", at, len));
            }
            catalog.content_blocks.insert(at, block);
        }
        CatalogEdit::RemoveBlock { id } => {
            let index = block_index(catalog, &id)?;
            catalog.content_blocks.remove(index);
        }
        CatalogEdit::UpdateBlock { id, update } => {
            let index = block_index(catalog, &id)?;
            let block = &mut catalog.content_blocks[index];
            if let Some(content) = update.content {
                merge_json(&mut block.content, content);
            }
            if let Some(settings) = update.settings {
                block.settings = Some(merge_settings(block.settings.take(), settings));
            }
        }
    }
    Ok(())
}

/// Apply edits in order. On error the catalog is left untouched.
pub fn apply_edits(catalog: &CatalogData, edits: Vec<CatalogEdit>) -> CatalogResult<CatalogData> {
    let mut updated = catalog.clone();
    for edit in edits {
        apply_edit(&mut updated, edit)?;
    }
    Ok(updated)
}

/// Reorder images to match `image_ids`, reassigning positions.
///
/// Every current image must appear exactly once.
pub fn reorder_images(catalog: &mut CatalogData, image_ids: &[String]) -> CatalogResult<()> {
    if image_ids.len() != catalog.images.len() {
        return Err(CatalogError::InvalidInput(format!(
            "expected {} image ids, got {}",
            catalog.images.len(),
            image_ids.len()
        )));
    }
    let mut remaining = std::mem::take(&mut catalog.images);
    let mut ordered = Vec::with_capacity(remaining.len());
    for id in image_ids {
        let Some(pos) = remaining.iter().position(|img| &img.id == id) else {
            // Put things back before bailing out.
            remaining.extend(ordered);
            catalog.images = remaining;
            return Err(CatalogError::NotFound(format!("image {id}")));
        };
        ordered.push(remaining.swap_remove(pos));
    }
    for (i, img) in ordered.iter_mut().enumerate() {
        img.position = i as u32;
    }
    catalog.images = ordered;

    let gallery = gallery_content(&catalog.images);
    for block in catalog
        .content_blocks
        .iter_mut()
        .filter(|b| b.kind == BlockKind::ImageGallery)
    {
        merge_json(&mut block.content, gallery.clone());
    }
    Ok(())
}

/// Shallow merge of `patch` object keys into `target`.
fn merge_json(target: &mut serde_json::Value, patch: serde_json::Value) {
    match (target.as_object_mut(), patch) {
        (Some(obj), serde_json::Value::Object(patch)) => {
            for (k, v) in patch {
                obj.insert(k, v);
            }
        }
        (_, patch) => *target = patch,
    }
}

fn merge_settings(current: Option<BlockSettings>, patch: BlockSettings) -> BlockSettings {
    let current = current.unwrap_or_default();
    BlockSettings {
        columns: patch.columns.or(current.columns),
        style: patch.style.or(current.style),
        background_color: patch.background_color.or(current.background_color),
        text_color: patch.text_color.or(current.text_color),
    }
}

//! Overlay a raster image onto every page of an existing PDF.
//!
//! The image is embedded once as an XObject and drawn by a small content
//! stream appended to each page. The page's original content is bracketed with
//! `q`/`Q` so whatever graphics state it leaves behind cannot shift or clip the
//! stamp. Placement is computed per page from that page's visible area
//! (CropBox, else MediaBox) and `/Rotate`, so mixed page sizes, cropped scans
//! and landscape pages all get the stamp in the bottom-left corner as seen on
//! screen. An optional caption is set in Helvetica below the bars.
//!
//! Output is serialized to a hidden sibling file and renamed into place; a
//! failed stamp never leaves a partial document at the requested path.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::error::{Error, Result};
use crate::geometry::{PageBox, PageFrame, Rotation, StampPlacement};
use crate::writer::caption;
use crate::writer::image_handler::ImageData;

/// Resource name prefix for the stamped image XObject.
const XOBJECT_NAME: &str = "BcStamp";

/// Resource name prefix for the caption font.
const FONT_NAME: &str = "BcFont";

/// Page tree depth beyond which inheritance lookups give up.
const MAX_TREE_DEPTH: usize = 64;

static NULL_OBJECT: Object = Object::Null;

/// Outcome of a successful stamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StampReport {
    /// Number of pages stamped (every page of the source)
    pub page_count: usize,
}

/// Stamps an image at a fixed placement on every page.
#[derive(Debug, Clone, Default)]
pub struct PageStamper {
    placement: StampPlacement,
}

impl PageStamper {
    /// Create a stamper for the given placement.
    pub fn new(placement: StampPlacement) -> Self {
        Self { placement }
    }

    /// Placement in use.
    pub fn placement(&self) -> &StampPlacement {
        &self.placement
    }

    /// Read `source`, stamp `image_path` on every page, write `output`.
    ///
    /// `source` is never modified. On error nothing is left at `output`
    /// beyond what was there before the call.
    pub fn stamp(&self, source: &Path, output: &Path, image_path: &Path) -> Result<StampReport> {
        self.stamp_with_caption(source, output, image_path, None)
    }

    /// Like [`stamp`](Self::stamp), printing `caption` under the bars.
    ///
    /// The caption takes the bottom of the footprint; see
    /// [`StampPlacement::split`]. A placement with `caption_size` zero ignores
    /// it.
    pub fn stamp_with_caption(
        &self,
        source: &Path,
        output: &Path,
        image_path: &Path,
        caption: Option<&str>,
    ) -> Result<StampReport> {
        if same_file(source, output) {
            return Err(Error::Config(format!(
                "output path {} would overwrite the source",
                output.display()
            )));
        }

        let image = ImageData::from_file(image_path)?;
        let mut doc = Document::load(source)?;
        ensure_unencrypted(&doc)?;

        let page_count = self.stamp_document(&mut doc, &image, caption)?;
        save_atomically(&mut doc, output)?;

        log::debug!(
            "Stamped {} page(s) of {} into {}",
            page_count,
            source.display(),
            output.display()
        );
        Ok(StampReport { page_count })
    }

    /// Stamp an in-memory document, returning the number of pages touched.
    pub fn stamp_document(
        &self,
        doc: &mut Document,
        image: &ImageData,
        caption: Option<&str>,
    ) -> Result<usize> {
        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if pages.is_empty() {
            return Err(Error::InvalidPdf("document has no pages".to_string()));
        }

        let caption = caption.filter(|text| !text.is_empty() && self.placement.caption_band() > 0.0);
        let assets = StampAssets {
            image: image.embed(doc),
            font: caption.map(|_| doc.add_object(caption::font_dictionary())),
        };
        for page_id in &pages {
            self.stamp_page(doc, *page_id, &assets, caption)?;
        }
        Ok(pages.len())
    }

    fn stamp_page(
        &self,
        doc: &mut Document,
        page_id: ObjectId,
        assets: &StampAssets,
        caption: Option<&str>,
    ) -> Result<()> {
        let frame = page_frame(doc, page_id)?;
        let target = self.placement.target_rect(frame.height());
        let (bars, band) = self.placement.split(&target, caption.is_some());

        let mut resources =
            inherited_dict(doc, page_id, b"Resources")?.unwrap_or_else(Dictionary::new);
        let image_name = add_resource(doc, &mut resources, "XObject", XOBJECT_NAME, assets.image)?;

        let mut operations = vec![
            Operation::new("Q", vec![]),
            Operation::new("q", vec![]),
            Operation::new("cm", reals(&frame.image_matrix(&bars))),
            Operation::new("Do", vec![Object::Name(image_name.into_bytes())]),
            Operation::new("Q", vec![]),
        ];

        if let (Some(text), Some(band), Some(font_id)) = (caption, band, assets.font) {
            let font_name = add_resource(doc, &mut resources, "Font", FONT_NAME, font_id)?;
            let size = caption::fit_size(text, self.placement.caption_size, band.width);
            let x = band.left() + (band.width - caption::text_width(text, size)) / 2.0;
            // centred in the band, lifted by the descender
            let baseline = band.bottom() - (band.height - size) / 2.0 - size * 0.2;
            operations.extend([
                Operation::new("q", vec![]),
                Operation::new("BT", vec![]),
                Operation::new("g", vec![0.into()]),
                Operation::new(
                    "Tf",
                    vec![Object::Name(font_name.into_bytes()), Object::Real(size.into())],
                ),
                Operation::new("Tm", reals(&frame.text_matrix(x, baseline))),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
                Operation::new("Q", vec![]),
            ]);
        }

        let existing = content_refs(doc, page_id)?;

        // Pages are read by concatenating their streams, so each added stream
        // is separated from its neighbours by whitespace.
        let mut prefix = Content {
            operations: vec![Operation::new("q", vec![])],
        }
        .encode()?;
        prefix.push(b'\n');
        let mut overlay = vec![b'\n'];
        overlay.extend(Content { operations }.encode()?);

        let prefix_id = doc.add_object(Stream::new(Dictionary::new(), prefix));
        let overlay_id = doc.add_object(Stream::new(Dictionary::new(), overlay));

        let mut contents: Vec<Object> = Vec::with_capacity(existing.len() + 2);
        contents.push(prefix_id.into());
        contents.extend(existing);
        contents.push(overlay_id.into());

        let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
        page.set("Resources", resources);
        page.set("Contents", contents);
        Ok(())
    }
}

/// Objects shared by every stamped page of one document.
struct StampAssets {
    image: ObjectId,
    font: Option<ObjectId>,
}

/// Refuse documents that declare an `/Encrypt` dictionary.
fn ensure_unencrypted(doc: &Document) -> Result<()> {
    if doc.trailer.has(b"Encrypt") {
        return Err(Error::Encrypted);
    }
    Ok(())
}

/// Register `id` in the `category` sub-dictionary of `resources` under a
/// fresh name, returning the name.
fn add_resource(
    doc: &Document,
    resources: &mut Dictionary,
    category: &str,
    prefix: &str,
    id: ObjectId,
) -> Result<String> {
    let mut entries = match resources.get(category.as_bytes()) {
        Ok(obj) => resolve_dict(doc, obj)?,
        Err(_) => Dictionary::new(),
    };
    let name = unique_name(&entries, prefix);
    entries.set(name.clone(), id);
    resources.set(category, entries);
    Ok(name)
}

fn reals(values: &[f32]) -> Vec<Object> {
    values.iter().map(|v| Object::Real((*v).into())).collect()
}

/// Visible area and rotation of a page.
///
/// The CropBox (inherited, clipped to the MediaBox) defines the visible area;
/// without one the MediaBox is used. `/Rotate` is inherited as well.
pub fn page_frame(doc: &Document, page_id: ObjectId) -> Result<PageFrame> {
    let media = media_box(doc, page_id)?;
    let crop = match inherited(doc, page_id, b"CropBox")? {
        Some(obj) => match parse_box(doc, obj).map(|b| b.intersect(&media)) {
            Ok(Some(crop)) => crop,
            Ok(None) | Err(_) => {
                log::warn!("Ignoring unusable CropBox on page {:?}", page_id);
                media
            },
        },
        None => media,
    };
    let rotation = match inherited(doc, page_id, b"Rotate")? {
        Some(obj) => number(doc, obj)
            .map(|degrees| Rotation::from_degrees(degrees.round() as i64))
            .unwrap_or_default(),
        None => Rotation::None,
    };
    Ok(PageFrame::new(crop, rotation))
}

/// Effective MediaBox of a page, following `/Parent` inheritance.
pub fn media_box(doc: &Document, page_id: ObjectId) -> Result<PageBox> {
    match inherited(doc, page_id, b"MediaBox")? {
        Some(obj) => parse_box(doc, obj),
        None => Ok(PageBox::LETTER),
    }
}

/// Value of `key` on the page or the nearest ancestor that defines it.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Result<Option<&'a Object>> {
    let mut node = page_id;
    for _ in 0..MAX_TREE_DEPTH {
        let dict = doc.get_dictionary(node)?;
        if let Ok(obj) = dict.get(key) {
            return Ok(Some(obj));
        }
        match dict.get(b"Parent").and_then(Object::as_reference) {
            Ok(parent) => node = parent,
            Err(_) => break,
        }
    }
    Ok(None)
}

fn parse_box(doc: &Document, obj: &Object) -> Result<PageBox> {
    let values = resolve(doc, obj).as_array()?;
    let numbers: Vec<f32> = values.iter().filter_map(|v| number(doc, v)).collect();
    match numbers.as_slice() {
        [x0, y0, x1, y1] if (x1 - x0).abs() > 0.0 && (y1 - y0).abs() > 0.0 => {
            Ok(PageBox::new(*x0, *y0, *x1, *y1))
        },
        _ => Err(Error::InvalidPdf(format!("malformed page box {:?}", values))),
    }
}

fn number(doc: &Document, obj: &Object) -> Option<f32> {
    match resolve(doc, obj) {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// Follow one level of indirection; dangling references resolve to `Null`.
fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(&NULL_OBJECT),
        other => other,
    }
}

fn kind(obj: &Object) -> &'static str {
    match obj {
        Object::Null => "null",
        Object::Boolean(_) => "boolean",
        Object::Integer(_) | Object::Real(_) => "number",
        Object::Name(_) => "name",
        Object::String(..) => "string",
        Object::Array(_) => "array",
        Object::Dictionary(_) => "dictionary",
        Object::Stream(_) => "stream",
        Object::Reference(_) => "reference",
        #[allow(unreachable_patterns)]
        _ => "object",
    }
}

fn resolve_dict(doc: &Document, obj: &Object) -> Result<Dictionary> {
    match resolve(doc, obj) {
        Object::Dictionary(dict) => Ok(dict.clone()),
        other => Err(Error::InvalidPdf(format!(
            "expected dictionary, found {}",
            kind(other)
        ))),
    }
}

fn inherited_dict(doc: &Document, page_id: ObjectId, key: &[u8]) -> Result<Option<Dictionary>> {
    inherited(doc, page_id, key)?
        .map(|obj| resolve_dict(doc, obj))
        .transpose()
}

/// Existing `/Contents` entries as a flat list of stream references.
fn content_refs(doc: &Document, page_id: ObjectId) -> Result<Vec<Object>> {
    let page = doc.get_dictionary(page_id)?;
    let refs = match page.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id)? {
            Object::Array(items) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(items)) => items.clone(),
        Ok(other) => {
            return Err(Error::InvalidPdf(format!(
                "unsupported /Contents entry: {}",
                kind(other)
            )))
        },
        Err(_) => Vec::new(),
    };
    Ok(refs)
}

fn unique_name(entries: &Dictionary, prefix: &str) -> String {
    if !entries.has(prefix.as_bytes()) {
        return prefix.to_string();
    }
    (1..)
        .map(|n| format!("{}{}", prefix, n))
        .find(|candidate| !entries.has(candidate.as_bytes()))
        .unwrap_or_else(|| prefix.to_string())
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Serialize `doc` next to `output` and rename it into place.
fn save_atomically(doc: &mut Document, output: &Path) -> Result<()> {
    let partial = partial_path(output)?;
    let result = write_and_rename(doc, &partial, output);
    if result.is_err() {
        let _ = fs::remove_file(&partial);
    }
    result
}

fn write_and_rename(doc: &mut Document, partial: &Path, output: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(partial)?);
    doc.save_to(&mut writer)?;
    writer.flush()?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    drop(file);
    fs::rename(partial, output)?;
    Ok(())
}

fn partial_path(output: &Path) -> Result<PathBuf> {
    let file_name = output.file_name().ok_or_else(|| {
        Error::Config(format!("output path {} has no file name", output.display()))
    })?;
    let partial_name = format!(
        ".{}.{}.partial",
        file_name.to_string_lossy(),
        uuid::Uuid::new_v4().simple()
    );
    Ok(output.with_file_name(partial_name))
}

//! PDF assembly: one page per ordered bitmap, via `lopdf`.
//!
//! ## Coordinate system
//!
//! Page geometry is configured in millimetres from the top-left corner, but
//! PDF user space is in points with a **bottom-left** origin:
//!
//! ```text
//! x_pt = mm_to_pt(offset)
//! y_pt = page_height_pt - mm_to_pt(offset) - image_height_pt
//! ```
//!
//! ## Image embedding
//!
//! The builder takes PNG bytes, not raw rasters. Each page image becomes a
//! Flate-compressed `/DeviceRGB` XObject; alpha, when any pixel is not fully
//! opaque, goes into a `/DeviceGray` soft mask.

use crate::config::{mm_to_pt, PageLayout};
use crate::error::{ItemError, ScanbindError};
use crate::pipeline::collect::OrderedPages;
use crate::pipeline::encode::encode_png;
use crate::progress::ProgressCallback;
use image::{ImageFormat, RgbaImage};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, info, warn};

/// Incrementally builds a multi-page PDF.
pub struct PdfBuilder {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
    layout: PageLayout,
}

impl PdfBuilder {
    pub fn new(layout: PageLayout) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
            layout,
        }
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Append a page showing the PNG image for `id`.
    pub fn append_page(&mut self, id: u32, png: &[u8]) -> Result<(), ItemError> {
        let builder_err = |detail: String| ItemError::Builder { id, detail };

        let img = image::load_from_memory_with_format(png, ImageFormat::Png)
            .map_err(|e| builder_err(e.to_string()))?
            .to_rgba8();
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(builder_err(format!("empty image ({width}x{height})")));
        }

        let image_id = self.add_image(&img);
        let name = format!("Im{id}");

        let (page_w_mm, page_h_mm) = self.layout.page_size_mm(width, height);
        let (img_w_mm, img_h_mm) = self.layout.image_size_mm(width, height);
        let page_w = mm_to_pt(page_w_mm);
        let page_h = mm_to_pt(page_h_mm);
        let img_w = mm_to_pt(img_w_mm);
        let img_h = mm_to_pt(img_h_mm);
        let x = mm_to_pt(self.layout.offset_mm);
        let y = page_h - mm_to_pt(self.layout.offset_mm) - img_h;

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        img_w.into(),
                        0.into(),
                        0.into(),
                        img_h.into(),
                        x.into(),
                        y.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(name.clone().into_bytes())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_bytes = content.encode().map_err(|e| builder_err(e.to_string()))?;
        let content_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), content_bytes));

        let resources = Dictionary::from_iter([(
            "XObject",
            Object::Dictionary(Dictionary::from_iter([(
                name.as_str(),
                Object::Reference(image_id),
            )])),
        )]);

        let page_id = self.doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(self.pages_id)),
            (
                "MediaBox",
                Object::Array(vec![0.into(), 0.into(), page_w.into(), page_h.into()]),
            ),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Dictionary(resources)),
        ]));
        self.kids.push(Object::Reference(page_id));

        debug!(
            id,
            page = self.kids.len(),
            "Added {}x{} px image as {:.1}x{:.1} mm",
            width,
            height,
            img_w_mm,
            img_h_mm
        );
        Ok(())
    }

    /// Close the page tree and serialise the document.
    pub fn finish(mut self) -> Result<Vec<u8>, ScanbindError> {
        let count = self.kids.len() as i64;
        let pages = Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(self.kids)),
            ("Count", Object::Integer(count)),
        ]);
        self.doc
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(self.pages_id)),
        ]));
        let info_id = self.doc.add_object(Dictionary::from_iter([(
            "Producer",
            Object::string_literal(concat!("scanbind ", env!("CARGO_PKG_VERSION"))),
        )]));
        self.doc.trailer.set("Root", Object::Reference(catalog_id));
        self.doc.trailer.set("Info", Object::Reference(info_id));

        let mut output = Vec::new();
        self.doc
            .save_to(&mut output)
            .map_err(|e| ScanbindError::DocumentSerialize(e.to_string()))?;
        Ok(output)
    }

    /// Embed `img` as an image XObject (plus soft mask when needed).
    fn add_image(&mut self, img: &RgbaImage) -> ObjectId {
        let (width, height) = img.dimensions();
        let pixels = (width as usize) * (height as usize);
        let mut rgb = Vec::with_capacity(pixels * 3);
        let mut alpha = Vec::with_capacity(pixels);
        for px in img.pixels() {
            rgb.extend_from_slice(&px.0[..3]);
            alpha.push(px.0[3]);
        }
        let opaque = alpha.iter().all(|&a| a == u8::MAX);

        let mut image_dict = image_dictionary(width, height, b"DeviceRGB");
        if !opaque {
            let mask_id = self
                .doc
                .add_object(compressed(image_dictionary(width, height, b"DeviceGray"), alpha));
            image_dict.set("SMask", Object::Reference(mask_id));
        }
        self.doc.add_object(compressed(image_dict, rgb))
    }
}

fn image_dictionary(width: u32, height: u32, colour_space: &[u8]) -> Dictionary {
    Dictionary::from_iter([
        ("Type", Object::Name(b"XObject".to_vec())),
        ("Subtype", Object::Name(b"Image".to_vec())),
        ("Width", Object::Integer(i64::from(width))),
        ("Height", Object::Integer(i64::from(height))),
        ("ColorSpace", Object::Name(colour_space.to_vec())),
        ("BitsPerComponent", Object::Integer(8)),
    ])
}

fn compressed(dict: Dictionary, data: Vec<u8>) -> Stream {
    let mut stream = Stream::new(dict, data);
    if let Err(e) = stream.compress() {
        // lopdf leaves the stream uncompressed; still a valid PDF.
        warn!("Image stream compression failed: {}", e);
    }
    stream
}

/// Pages written and pages skipped by [`bind_pages`].
pub struct BoundDocument {
    pub bytes: Vec<u8>,
    /// Identifiers that became pages, ascending.
    pub pages: Vec<u32>,
    /// Identifiers that were fetched but could not be placed.
    pub failures: Vec<ItemError>,
}

/// Encode every ordered bitmap as PNG and append it as a page.
///
/// Encode and builder failures skip that page and carry on. Blocking:
/// call from `spawn_blocking`.
pub fn bind_pages(
    pages: OrderedPages,
    layout: PageLayout,
    progress: Option<&ProgressCallback>,
) -> Result<BoundDocument, ScanbindError> {
    let mut builder = PdfBuilder::new(layout);
    let mut written = Vec::with_capacity(pages.len());
    let mut failures = Vec::new();

    for (id, bitmap) in pages {
        let appended = encode_png(id, &bitmap).and_then(|png| builder.append_page(id, &png));
        match appended {
            Ok(()) => written.push(id),
            Err(e) => {
                warn!(id, "Error adding image {} to PDF: {}", id, e);
                if let Some(cb) = progress {
                    cb.on_page_error(id, &e.to_string());
                }
                failures.push(e);
            }
        }
    }

    info!("Bound {} pages ({} skipped)", written.len(), failures.len());
    let bytes = builder.finish()?;
    Ok(BoundDocument {
        bytes,
        pages: written,
        failures,
    })
}

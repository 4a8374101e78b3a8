//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::path::Path;
use std::sync::Mutex;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use pdf_barcode_stamper::batch::BatchObserver;

pub const A4: (i64, i64) = (595, 842);
pub const LETTER: (i64, i64) = (612, 792);

/// A text-only document with one page per entry in `page_sizes`.
///
/// Resources are inherited from the page tree root, like many producers emit.
pub fn build_pdf(page_sizes: &[(i64, i64)]) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for (index, (width, height)) in page_sizes.iter().enumerate() {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), (*height - 72).into()]),
                Operation::new(
                    "Tj",
                    vec![Object::string_literal(format!("Page {}", index + 1))],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), (*width).into(), (*height).into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

/// Write a fixture PDF to `path`.
pub fn write_pdf(path: &Path, page_sizes: &[(i64, i64)]) {
    let mut doc = build_pdf(page_sizes);
    doc.save(path).expect("Failed to write fixture PDF");
}

/// Write bytes that no PDF parser will accept.
pub fn write_corrupt_pdf(path: &Path) {
    std::fs::write(path, b"this is not a pdf at all\n").unwrap();
}

fn as_f32(obj: &Object) -> f32 {
    match obj {
        Object::Integer(i) => *i as f32,
        Object::Real(r) => *r as f32,
        other => panic!("expected number, found {:?}", other),
    }
}

/// The `cm` matrix in effect for the last `Do` on a page.
pub fn stamp_transform(doc: &Document, page_id: ObjectId) -> [f32; 6] {
    let bytes = doc.get_page_content(page_id).expect("page content");
    let content = Content::decode(&bytes).expect("decodable content");
    let ops = &content.operations;
    let do_index = ops
        .iter()
        .rposition(|op| op.operator == "Do")
        .expect("page should draw an XObject");
    let cm = ops[..do_index]
        .iter()
        .rev()
        .find(|op| op.operator == "cm")
        .expect("XObject should be positioned with cm");
    let mut matrix = [0.0; 6];
    for (slot, operand) in matrix.iter_mut().zip(cm.operands.iter()) {
        *slot = as_f32(operand);
    }
    matrix
}

/// Page height from the page's own MediaBox.
pub fn page_height(doc: &Document, page_id: ObjectId) -> f32 {
    let page = doc.get_dictionary(page_id).unwrap();
    let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
    as_f32(&media_box[3]) - as_f32(&media_box[1])
}

/// Files directly inside `dir`, sorted.
pub fn list_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Observer that keeps everything it is told.
#[derive(Default)]
pub struct CollectingObserver {
    pub logs: Mutex<Vec<String>>,
    pub progress: Mutex<Vec<(usize, usize)>>,
}

impl CollectingObserver {
    pub fn logs(&self) -> Vec<String> {
        self.logs.lock().unwrap().clone()
    }

    pub fn progress(&self) -> Vec<(usize, usize)> {
        self.progress.lock().unwrap().clone()
    }

    pub fn any_log_contains(&self, needle: &str) -> bool {
        self.logs().iter().any(|line| line.contains(needle))
    }
}

impl BatchObserver for CollectingObserver {
    fn on_log(&self, message: &str) {
        self.logs.lock().unwrap().push(message.to_string());
    }

    fn on_progress(&self, current: usize, total: usize) {
        self.progress.lock().unwrap().push((current, total));
    }
}

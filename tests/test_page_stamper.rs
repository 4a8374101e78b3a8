//! Stamping existing PDFs with a barcode image.

mod common;

use std::fs;
use std::path::{Path, PathBuf};

use common::{build_pdf, list_names, page_height, stamp_transform, write_corrupt_pdf, write_pdf, A4, LETTER};
use lopdf::content::Content;
use lopdf::{dictionary, Document, Object};
use pdf_barcode_stamper::editor::PageStamper;
use pdf_barcode_stamper::geometry::StampPlacement;
use pdf_barcode_stamper::writer::barcode::{generate_code128, BarcodeOptions};
use pdf_barcode_stamper::Error;
use tempfile::{tempdir, TempDir};

fn barcode_png(dir: &TempDir, payload: &str) -> PathBuf {
    let bytes = generate_code128(payload, &BarcodeOptions::default()).unwrap();
    let path = dir.path().join(format!("barcode_{}.png", payload));
    fs::write(&path, bytes).unwrap();
    path
}

fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 0.01,
        "expected {}, got {}",
        expected,
        actual
    );
}

fn assert_no_partials(dir: &Path) {
    for name in list_names(dir) {
        assert!(!name.ends_with(".partial"), "leftover partial file {}", name);
    }
}

#[test]
fn test_every_page_is_stamped_at_bottom_left() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("mixed-42.pdf");
    let output = dir.path().join("out.pdf");
    write_pdf(&source, &[A4, LETTER, A4]);
    let image = barcode_png(&dir, "42");

    let report = PageStamper::default().stamp(&source, &output, &image).unwrap();
    assert_eq!(report.page_count, 3);

    let doc = Document::load(&output).unwrap();
    let pages = doc.get_pages();
    assert_eq!(pages.len(), 3);

    for page_id in pages.values() {
        let [a, b, c, d, e, f] = stamp_transform(&doc, *page_id);
        let height = page_height(&doc, *page_id);

        assert_close(a, 200.0);
        assert_close(b, 0.0);
        assert_close(c, 0.0);
        assert_close(d, 80.0);
        // left edge 20pt from the page edge, 200pt wide
        assert_close(e, 20.0);
        assert_close(e + a, 220.0);
        // 20pt above the bottom edge, 80pt tall
        assert_close(f, 20.0);
        assert_close(height - (f + d), height - 100.0);
    }
}

#[test]
fn test_existing_content_is_preserved() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("text-7.pdf");
    let output = dir.path().join("out.pdf");
    write_pdf(&source, &[LETTER]);
    let image = barcode_png(&dir, "7");

    PageStamper::default().stamp(&source, &output, &image).unwrap();

    let doc = Document::load(&output).unwrap();
    let page_id = *doc.get_pages().values().next().unwrap();
    let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
    let operators: Vec<&str> = content.operations.iter().map(|op| op.operator.as_str()).collect();
    // original text bracketed by q/Q, then the barcode painted over it
    assert_eq!(
        operators,
        vec!["q", "BT", "Tf", "Td", "Tj", "ET", "Q", "q", "cm", "Do", "Q"]
    );

    // the inherited font stays reachable alongside the new image
    let page = doc.get_dictionary(page_id).unwrap();
    let resources = match page.get(b"Resources").unwrap() {
        Object::Reference(id) => doc.get_dictionary(*id).unwrap(),
        Object::Dictionary(dict) => dict,
        other => panic!("unexpected Resources {:?}", other),
    };
    assert!(resources.has(b"Font"));
    let xobjects = match resources.get(b"XObject").unwrap() {
        Object::Reference(id) => doc.get_dictionary(*id).unwrap(),
        Object::Dictionary(dict) => dict,
        other => panic!("unexpected XObject {:?}", other),
    };
    assert_eq!(xobjects.len(), 1);
}

#[test]
fn test_image_is_embedded_once() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("many-5.pdf");
    let output = dir.path().join("out.pdf");
    write_pdf(&source, &[A4, A4, A4, A4]);
    let image = barcode_png(&dir, "5");

    PageStamper::default().stamp(&source, &output, &image).unwrap();

    let doc = Document::load(&output).unwrap();
    let images = doc
        .objects
        .values()
        .filter(|obj| match obj {
            Object::Stream(stream) => stream
                .dict
                .get(b"Subtype")
                .and_then(|s| s.as_name())
                .map(|name| name == b"Image")
                .unwrap_or(false),
            _ => false,
        })
        .count();
    // one barcode, no soft mask since it is fully opaque
    assert_eq!(images, 1);
}

#[test]
fn test_custom_placement() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("a-1.pdf");
    let output = dir.path().join("out.pdf");
    write_pdf(&source, &[A4]);
    let image = barcode_png(&dir, "1");

    let placement = StampPlacement {
        margin_left: 50.0,
        margin_bottom: 30.0,
        width: 150.0,
        height: 40.0,
        ..StampPlacement::default()
    };
    PageStamper::new(placement).stamp(&source, &output, &image).unwrap();

    let doc = Document::load(&output).unwrap();
    let page_id = *doc.get_pages().values().next().unwrap();
    let [a, _, _, d, e, f] = stamp_transform(&doc, page_id);
    assert_close(a, 150.0);
    assert_close(d, 40.0);
    assert_close(e, 50.0);
    assert_close(f, 30.0);
}

#[test]
fn test_source_is_not_modified() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("keep-3.pdf");
    let output = dir.path().join("out.pdf");
    write_pdf(&source, &[LETTER, LETTER]);
    let before = fs::read(&source).unwrap();
    let image = barcode_png(&dir, "3");

    PageStamper::default().stamp(&source, &output, &image).unwrap();

    assert_eq!(fs::read(&source).unwrap(), before);
}

#[test]
fn test_rerun_overwrites_output() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("again-9.pdf");
    let output = dir.path().join("out.pdf");
    write_pdf(&source, &[A4]);
    fs::write(&output, b"stale").unwrap();
    let image = barcode_png(&dir, "9");

    PageStamper::default().stamp(&source, &output, &image).unwrap();
    PageStamper::default().stamp(&source, &output, &image).unwrap();

    let doc = Document::load(&output).unwrap();
    assert_eq!(doc.get_pages().len(), 1);
    assert_no_partials(dir.path());
}

#[test]
fn test_corrupt_source_leaves_no_output() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("broken-8.pdf");
    let output = dir.path().join("out.pdf");
    write_corrupt_pdf(&source);
    let image = barcode_png(&dir, "8");

    let result = PageStamper::default().stamp(&source, &output, &image);

    assert!(result.is_err());
    assert!(!output.exists());
    assert_no_partials(dir.path());
}

#[test]
fn test_missing_output_directory_fails_cleanly() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("a-1.pdf");
    let output = dir.path().join("missing").join("out.pdf");
    write_pdf(&source, &[A4]);
    let image = barcode_png(&dir, "1");

    let result = PageStamper::default().stamp(&source, &output, &image);

    assert!(result.is_err());
    assert!(!output.exists());
    assert!(!dir.path().join("missing").exists());
}

#[test]
fn test_output_equal_to_source_is_rejected() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("a-1.pdf");
    write_pdf(&source, &[A4]);
    let before = fs::read(&source).unwrap();
    let image = barcode_png(&dir, "1");

    let result = PageStamper::default().stamp(&source, &source, &image);

    assert!(matches!(result, Err(Error::Config(_))));
    assert_eq!(fs::read(&source).unwrap(), before);
}

#[test]
fn test_missing_image_fails_before_writing() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("a-1.pdf");
    let output = dir.path().join("out.pdf");
    write_pdf(&source, &[A4]);

    let result = PageStamper::default().stamp(&source, &output, &dir.path().join("nope.png"));

    assert!(result.is_err());
    assert!(!output.exists());
}

#[test]
fn test_stamp_document_in_memory() {
    use pdf_barcode_stamper::writer::image_handler::ImageData;

    let mut doc = build_pdf(&[LETTER, A4]);
    let png = generate_code128("2233", &BarcodeOptions::default()).unwrap();
    let image = ImageData::from_bytes(&png).unwrap();

    let stamped = PageStamper::default().stamp_document(&mut doc, &image, None).unwrap();
    assert_eq!(stamped, 2);

    for page_id in doc.get_pages().values() {
        let [_, _, _, _, e, f] = stamp_transform(&doc, *page_id);
        assert_close(e, 20.0);
        assert_close(f, 20.0);
    }
}

/// Write a one-page Letter fixture with `key` set on the page dictionary.
fn write_page_with(path: &Path, key: &str, value: Object) {
    let mut doc = build_pdf(&[LETTER]);
    let page_id = *doc.get_pages().values().next().unwrap();
    doc.get_object_mut(page_id)
        .unwrap()
        .as_dict_mut()
        .unwrap()
        .set(key, value);
    doc.save(path).unwrap();
}

fn first_page_transform(path: &Path) -> [f32; 6] {
    let doc = Document::load(path).unwrap();
    let page_id = *doc.get_pages().values().next().unwrap();
    stamp_transform(&doc, page_id)
}

#[test]
fn test_rotated_page_is_stamped_bottom_left_as_displayed() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("turned-4.pdf");
    let output = dir.path().join("out.pdf");
    write_page_with(&source, "Rotate", Object::Integer(90));
    let image = barcode_png(&dir, "4");

    PageStamper::default().stamp(&source, &output, &image).unwrap();

    // shown clockwise, the visual bottom-left is the unrotated bottom-right
    let [a, b, c, d, e, f] = first_page_transform(&output);
    assert_close(a, 0.0);
    assert_close(b, 200.0);
    assert_close(c, -80.0);
    assert_close(d, 0.0);
    assert_close(e, 592.0);
    assert_close(f, 20.0);
}

#[test]
fn test_cropped_page_is_stamped_inside_crop_box() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("cropped-6.pdf");
    let output = dir.path().join("out.pdf");
    write_page_with(
        &source,
        "CropBox",
        Object::Array(vec![
            Object::Integer(50),
            Object::Integer(60),
            Object::Integer(562),
            Object::Integer(742),
        ]),
    );
    let image = barcode_png(&dir, "6");

    PageStamper::default().stamp(&source, &output, &image).unwrap();

    let [a, _, _, d, e, f] = first_page_transform(&output);
    assert_close(a, 200.0);
    assert_close(d, 80.0);
    assert_close(e, 70.0);
    assert_close(f, 80.0);
}

#[test]
fn test_caption_is_printed_under_the_bars() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("caption-0102.pdf");
    let output = dir.path().join("out.pdf");
    write_pdf(&source, &[LETTER]);
    let image = barcode_png(&dir, "0102");

    PageStamper::default()
        .stamp_with_caption(&source, &output, &image, Some("0102"))
        .unwrap();

    let doc = Document::load(&output).unwrap();
    let page_id = *doc.get_pages().values().next().unwrap();

    // bars shrink to leave a 15pt band at the bottom of the footprint
    let [a, _, _, d, e, f] = stamp_transform(&doc, page_id);
    assert_close(a, 200.0);
    assert_close(d, 65.0);
    assert_close(e, 20.0);
    assert_close(f, 35.0);

    let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
    let ops = &content.operations;
    let shown = ops
        .iter()
        .rposition(|op| op.operator == "Tj")
        .expect("caption drawn");
    assert_eq!(ops[shown].operands[0].as_str().unwrap(), b"0102");

    let tm = ops[..shown]
        .iter()
        .rev()
        .find(|op| op.operator == "Tm")
        .expect("caption positioned with Tm");
    let origin: Vec<f32> = tm.operands.iter().map(|o| o.as_float().unwrap()).collect();
    assert!(origin[4] > 20.0 && origin[4] < 220.0, "caption x {}", origin[4]);
    assert!(origin[5] >= 20.0 && origin[5] < 35.0, "caption y {}", origin[5]);
}

#[test]
fn test_encrypted_source_is_refused() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("locked-5.pdf");
    let output = dir.path().join("out.pdf");
    let mut doc = build_pdf(&[A4]);
    let encrypt_id = doc.add_object(dictionary! {
        "Filter" => "Standard",
        "V" => 1,
        "R" => 2,
        "O" => Object::string_literal(vec![0u8; 32]),
        "U" => Object::string_literal(vec![0u8; 32]),
        "P" => -4,
    });
    doc.trailer.set("Encrypt", encrypt_id);
    doc.save(&source).unwrap();
    let image = barcode_png(&dir, "5");

    let result = PageStamper::default().stamp(&source, &output, &image);

    assert!(matches!(result, Err(Error::Encrypted)));
    assert!(!output.exists());
    assert_no_partials(dir.path());
}

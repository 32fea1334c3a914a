//! End-to-end registration workflow tests against real (local) backends:
//! in-memory SQLite, a tempdir asset store, and the shipped ticket assets.

use std::path::Path;

use image::{codecs::png::PngEncoder, ExtendedColorType, ImageEncoder, Rgba, RgbaImage};
use ticketgen_backend::{
    asset::{AssetStore, LocalAssetStore},
    error::RegisterError,
    record::{RecordStore, SqliteRecordStore, Status},
    register::{register, RegistrationForm},
    ticket::TicketAssets,
};

const SECRET: &str = "test_secret";

fn ticket_assets() -> TicketAssets {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets");
    TicketAssets::load(&dir).expect("ticket assets")
}

fn sample_photo() -> Vec<u8> {
    let img = RgbaImage::from_fn(48, 48, |x, y| Rgba([(x * 5) as u8, 64, (y * 5) as u8, 255]));
    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(img.as_raw(), 48, 48, ExtendedColorType::Rgba8)
        .unwrap();
    png
}

fn form(roll_no: &str, name: &str) -> RegistrationForm {
    RegistrationForm::from_parts(
        Some(name.to_string()),
        Some(roll_no.to_string()),
        Some("2nd Year".to_string()),
        Some(("photo.png".to_string(), sample_photo())),
    )
    .unwrap()
}

#[test]
fn registration_persists_record_and_returns_decodable_png() {
    let records = SqliteRecordStore::open_in_memory().unwrap();
    let blob_dir = tempfile::tempdir().unwrap();
    let assets = LocalAssetStore::new(blob_dir.path()).unwrap();
    let ticket = ticket_assets();

    let issued = register(&records, &assets, &ticket, SECRET, form("21-001", "Ada Lovelace")).unwrap();

    assert!(issued.student_id.starts_with("STU-"));
    assert_eq!(issued.student_id.len(), "STU-".len() + 8);

    let decoded = image::load_from_memory(&issued.png).expect("ticket decodes as an image");
    assert_eq!(
        (decoded.width(), decoded.height()),
        ticket.template_dimensions()
    );

    let rec = records.find_by_roll_no("21-001").unwrap().expect("record stored");
    assert_eq!(rec.student_id, issued.student_id);
    assert_eq!(rec.name, "Ada Lovelace");
    assert_eq!(rec.status, Status::Active);

    // the stored reference must resolve back to the uploaded bytes
    assert_eq!(assets.get(&rec.profile_pic_ref).unwrap(), sample_photo());
}

#[test]
fn second_registration_with_same_roll_no_conflicts() {
    let records = SqliteRecordStore::open_in_memory().unwrap();
    let blob_dir = tempfile::tempdir().unwrap();
    let assets = LocalAssetStore::new(blob_dir.path()).unwrap();
    let ticket = ticket_assets();

    let first = register(&records, &assets, &ticket, SECRET, form("21-002", "Ada Lovelace")).unwrap();

    let err = register(&records, &assets, &ticket, SECRET, form("21-002", "Grace Hopper"))
        .unwrap_err();
    assert!(matches!(err, RegisterError::DuplicateRollNo(roll) if roll == "21-002"));

    // the first record is unaffected by the failed attempt
    let rec = records.find_by_roll_no("21-002").unwrap().unwrap();
    assert_eq!(rec.student_id, first.student_id);
    assert_eq!(rec.name, "Ada Lovelace");
}

#[test]
fn distinct_roll_nos_get_distinct_student_ids() {
    let records = SqliteRecordStore::open_in_memory().unwrap();
    let blob_dir = tempfile::tempdir().unwrap();
    let assets = LocalAssetStore::new(blob_dir.path()).unwrap();
    let ticket = ticket_assets();

    let a = register(&records, &assets, &ticket, SECRET, form("21-003", "Ada Lovelace")).unwrap();
    let b = register(&records, &assets, &ticket, SECRET, form("21-004", "Ada Lovelace")).unwrap();

    assert_ne!(a.student_id, b.student_id);
    assert!(records.find_by_roll_no("21-003").unwrap().is_some());
    assert!(records.find_by_roll_no("21-004").unwrap().is_some());
}

#[test]
fn invalid_form_leaves_no_side_effects() {
    let records = SqliteRecordStore::open_in_memory().unwrap();
    let blob_dir = tempfile::tempdir().unwrap();
    let _assets = LocalAssetStore::new(blob_dir.path()).unwrap();

    let err = RegistrationForm::from_parts(
        Some("Ada Lovelace".to_string()),
        Some("21-005".to_string()),
        None,
        Some(("photo.png".to_string(), sample_photo())),
    )
    .unwrap_err();
    assert!(matches!(err, RegisterError::MissingFormData));

    assert!(records.find_by_roll_no("21-005").unwrap().is_none());
    let stored: Vec<_> = std::fs::read_dir(blob_dir.path()).unwrap().collect();
    assert!(stored.is_empty(), "no asset may be written for invalid forms");
}

#[test]
fn corrupt_photo_fails_after_upload_without_compensation() {
    let records = SqliteRecordStore::open_in_memory().unwrap();
    let blob_dir = tempfile::tempdir().unwrap();
    let assets = LocalAssetStore::new(blob_dir.path()).unwrap();
    let ticket = ticket_assets();

    let form = RegistrationForm::from_parts(
        Some("Ada Lovelace".to_string()),
        Some("21-006".to_string()),
        Some("2nd Year".to_string()),
        Some(("broken.png".to_string(), b"not an image".to_vec())),
    )
    .unwrap();

    let err = register(&records, &assets, &ticket, SECRET, form).unwrap_err();
    assert!(matches!(err, RegisterError::Render(_)));

    // no rollback: the record and the uploaded blob stay behind
    let rec = records.find_by_roll_no("21-006").unwrap().expect("record kept");
    assert_eq!(assets.get(&rec.profile_pic_ref).unwrap(), b"not an image");
}

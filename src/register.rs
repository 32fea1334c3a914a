//! Registration workflow.
//!
//! Linear: validate → duplicate check → generate id → store photo → insert
//! record → fetch photo back → render ticket. A failure at any step
//! short-circuits; side effects already performed are left in place (no
//! compensating cleanup).

use chrono::Utc;
use tracing::info;

use crate::{
    asset::AssetStore,
    error::RegisterError,
    record::{RecordStore, Status, StoreError, StudentRecord},
    student_id,
    ticket::TicketAssets,
};

/// A fully validated registration form.
#[derive(Clone, Debug)]
pub struct RegistrationForm {
    pub student_name: String,
    pub roll_no: String,
    pub study_year: String,
    pub photo_filename: String,
    pub photo_bytes: Vec<u8>,
}

impl RegistrationForm {
    /// Assemble a form from optional multipart parts. Any absent or empty
    /// part fails validation before any side effect can happen.
    pub fn from_parts(
        student_name: Option<String>,
        roll_no: Option<String>,
        study_year: Option<String>,
        photo: Option<(String, Vec<u8>)>,
    ) -> Result<Self, RegisterError> {
        let (student_name, roll_no, study_year) = match (student_name, roll_no, study_year) {
            (Some(n), Some(r), Some(y)) if !n.is_empty() && !r.is_empty() && !y.is_empty() => {
                (n, r, y)
            }
            _ => return Err(RegisterError::MissingFormData),
        };
        let (photo_filename, photo_bytes) = match photo {
            Some((f, b)) if !b.is_empty() => (f, b),
            _ => return Err(RegisterError::MissingFormData),
        };

        // uploads may carry a client path; keep only the final component
        let photo_filename = photo_filename
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
            .to_string();
        if photo_filename.is_empty() {
            return Err(RegisterError::MissingFormData);
        }

        Ok(Self {
            student_name,
            roll_no,
            study_year,
            photo_filename,
            photo_bytes,
        })
    }
}

#[derive(Debug)]
pub struct IssuedTicket {
    pub student_id: String,
    pub png: Vec<u8>,
}

/// Run one registration end to end and return the rendered ticket.
pub fn register(
    records: &dyn RecordStore,
    assets: &dyn AssetStore,
    ticket: &TicketAssets,
    secret: &str,
    form: RegistrationForm,
) -> Result<IssuedTicket, RegisterError> {
    // pre-check is an optimization; the store's unique constraint below is
    // what actually closes the race between concurrent registrations
    if records.find_by_roll_no(&form.roll_no)?.is_some() {
        return Err(RegisterError::DuplicateRollNo(form.roll_no));
    }

    let student_id = student_id::generate(secret);

    let key = format!("profile_pics/{student_id}_{}", form.photo_filename);
    let profile_pic_ref = assets.put(&key, &form.photo_bytes)?;
    info!(%student_id, roll_no = %form.roll_no, "stored profile photo at {profile_pic_ref}");

    let record = StudentRecord {
        roll_no: form.roll_no.clone(),
        student_id: student_id.clone(),
        name: form.student_name.clone(),
        year: form.study_year.clone(),
        profile_pic_ref: profile_pic_ref.clone(),
        status: Status::Active,
        registered_at: Utc::now(),
    };
    // a student_id collision (StoreError::StudentIdExists) is not the
    // caller's fault and falls through to the generic failure path
    match records.insert(&record) {
        Err(StoreError::RollNoExists { roll_no }) => {
            return Err(RegisterError::DuplicateRollNo(roll_no))
        }
        other => other?,
    }

    let photo = assets.get(&profile_pic_ref)?;
    let png = ticket.render_ticket(&form.student_name, &form.study_year, &student_id, &photo)?;
    info!(%student_id, "ticket rendered ({} bytes)", png.len());

    Ok(IssuedTicket { student_id, png })
}

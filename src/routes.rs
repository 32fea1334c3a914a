use axum::{
    extract::{Multipart, State},
    http::header,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::json;
use utoipa::ToSchema;

use crate::{error::RegisterError, register, state::AppState};

/// Multipart form shape for `/api/register-student` (schema only; the
/// handler reads the parts directly).
#[derive(Debug, ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct RegisterStudentForm {
    pub student_name: String,
    pub roll_no: String,
    pub study_year: String,
    #[schema(value_type = String, format = Binary)]
    pub profile_image: String,
}

#[utoipa::path(
    get,
    path = "/",
    tag = "tickets",
    responses((status = 200, description = "Registration page", content_type = "text/html"))
)]
pub async fn homepage() -> impl IntoResponse {
    Html(include_str!("../assets/index.html"))
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "tickets",
    responses((status = 200, body = serde_json::Value))
)]
pub async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

#[utoipa::path(
    post,
    path = "/api/register-student",
    tag = "tickets",
    request_body(content = RegisterStudentForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Ticket PNG, served as an attachment", content_type = "image/png"),
        (status = 400, description = "Missing form data", body = serde_json::Value),
        (status = 409, description = "Roll number already registered", body = serde_json::Value),
        (status = 500, description = "Unexpected server error", body = serde_json::Value)
    )
)]
pub async fn register_student(
    State(st): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, RegisterError> {
    let mut student_name = None;
    let mut roll_no = None;
    let mut study_year = None;
    let mut photo = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| RegisterError::MissingFormData)?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("studentName") => {
                student_name =
                    Some(field.text().await.map_err(|_| RegisterError::MissingFormData)?)
            }
            Some("rollNo") => {
                roll_no = Some(field.text().await.map_err(|_| RegisterError::MissingFormData)?)
            }
            Some("studyYear") => {
                study_year = Some(field.text().await.map_err(|_| RegisterError::MissingFormData)?)
            }
            Some("profileImage") => {
                let filename = field.file_name().unwrap_or("profile.png").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| RegisterError::MissingFormData)?;
                photo = Some((filename, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let form = register::RegistrationForm::from_parts(student_name, roll_no, study_year, photo)?;
    let ticket = register::register(
        st.records.as_ref(),
        st.assets.as_ref(),
        &st.ticket,
        &st.secret_key,
        form,
    )?;

    let disposition = format!("attachment; filename=\"{}_ticket.png\"", ticket.student_id);
    Ok((
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        ticket.png,
    )
        .into_response())
}

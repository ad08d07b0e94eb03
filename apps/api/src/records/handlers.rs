use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};

use crate::errors::AppError;
use crate::extract::Upload;
use crate::models::record::RecordKind;
use crate::records::{
    deposit, deposit_uploads, list, NewRecord, StoredRecord, UploadForm, UploadReport,
};
use crate::state::AppState;

/// GET /api/v1/courses
pub async fn handle_list_courses(State(state): State<AppState>) -> Json<Vec<StoredRecord>> {
    Json(list(state.records(RecordKind::Course)).await)
}

/// GET /api/v1/exams
pub async fn handle_list_exams(State(state): State<AppState>) -> Json<Vec<StoredRecord>> {
    Json(list(state.records(RecordKind::Exam)).await)
}

/// POST /api/v1/courses
pub async fn handle_create_course(
    State(state): State<AppState>,
    Json(new): Json<NewRecord>,
) -> Result<(StatusCode, Json<StoredRecord>), AppError> {
    let stored = deposit(state.records(RecordKind::Course), new).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// POST /api/v1/exams
pub async fn handle_create_exam(
    State(state): State<AppState>,
    Json(new): Json<NewRecord>,
) -> Result<(StatusCode, Json<StoredRecord>), AppError> {
    let stored = deposit(state.records(RecordKind::Exam), new).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// POST /api/v1/courses/upload
pub async fn handle_upload_courses(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadReport>), AppError> {
    upload(&state, RecordKind::Course, multipart).await
}

/// POST /api/v1/exams/upload
pub async fn handle_upload_exams(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadReport>), AppError> {
    upload(&state, RecordKind::Exam, multipart).await
}

async fn upload(
    state: &AppState,
    kind: RecordKind,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadReport>), AppError> {
    let (form, uploads) = read_upload_form(multipart).await?;
    let report = deposit_uploads(state.records(kind), uploads, form, state.extract_options).await?;

    let status = if report.stored.is_empty() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(report)))
}

/// Reads `title`, `year` and every file part of a multipart upload.
async fn read_upload_form(
    mut multipart: Multipart,
) -> Result<(UploadForm, Vec<Upload>), AppError> {
    let mut form = UploadForm::default();
    let mut uploads = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        if let Some(file_name) = field.file_name().map(str::to_string) {
            let content = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("could not read {file_name}: {e}")))?;
            uploads.push(Upload { file_name, content });
            continue;
        }

        let name = field.name().unwrap_or_default().to_string();
        let value = field
            .text()
            .await
            .map_err(|e| AppError::Validation(format!("could not read field '{name}': {e}")))?;

        match name.as_str() {
            "title" => form.title = Some(value),
            "year" if !value.trim().is_empty() => {
                let year = value.trim().parse::<i32>().map_err(|_| {
                    AppError::Validation(format!("year must be an integer, got '{value}'"))
                })?;
                form.year = Some(year);
            }
            _ => {}
        }
    }

    Ok((form, uploads))
}

use crate::{
    dto::mcq_dto::{GenerateFromTextPayload, GenerateMcqResponse},
    error::{Error, Result},
    models::mcq::DEFAULT_QUESTION_COUNT,
    services::extract_service::DocumentKind,
    AppState,
};
use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    Json,
};
use validator::Validate;

struct Upload {
    filename: Option<String>,
    kind: DocumentKind,
    data: bytes::Bytes,
}

fn parse_count(raw: &str) -> i64 {
    raw.trim().parse().unwrap_or(DEFAULT_QUESTION_COUNT)
}

#[axum::debug_handler]
pub async fn generate_from_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut upload = None;
    let mut count = DEFAULT_QUESTION_COUNT;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to get next field: {}", e);
        Error::BadRequest(e.to_string())
    })? {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "pdf" | "file" => {
                let filename = field.file_name().map(|s| s.to_string());
                let kind = DocumentKind::detect(field.content_type(), filename.as_deref())
                    .ok_or_else(|| Error::BadRequest("Only PDF files are allowed".to_string()))?;
                let data = field.bytes().await?;
                upload = Some(Upload {
                    filename,
                    kind,
                    data,
                });
            }
            "count" => count = parse_count(&field.text().await?),
            _ => {}
        }
    }

    let upload = upload.ok_or_else(|| Error::BadRequest("No PDF file uploaded".to_string()))?;
    tracing::info!(
        filename = upload.filename.as_deref().unwrap_or("<unnamed>"),
        bytes = upload.data.len(),
        requested = count,
        "Processing uploaded document"
    );

    let text = state
        .extract_service
        .extract_text(upload.kind, &upload.data)
        .await?;
    let result = state.mcq_service.generate(&text, count).await?;

    Ok(Json(GenerateMcqResponse::from_result(result, upload.filename)))
}

#[axum::debug_handler]
pub async fn generate_from_text(
    State(state): State<AppState>,
    Json(payload): Json<GenerateFromTextPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let count = payload.count.unwrap_or(DEFAULT_QUESTION_COUNT);
    let result = state.mcq_service.generate(&payload.text, count).await?;
    Ok(Json(GenerateMcqResponse::from_result(result, None)))
}

pub async fn service_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.mcq_service.status().await)
}

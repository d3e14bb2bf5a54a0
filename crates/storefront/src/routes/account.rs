//! Account route handlers. All require a stored auth token.

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError},
};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::{AppError, Result};
use crate::services::account::UserProfile;
use crate::services::documents::{Attachment, DocumentSubmission, SubmissionReceipt};
use crate::state::AppState;

/// Account overview.
#[derive(Debug, Serialize)]
pub struct AccountView {
    /// Cached profile; `None` if the token is stored without one.
    pub user: Option<UserProfile>,
}

fn not_signed_in() -> AppError {
    AppError::Unauthorized("Not signed in".to_string())
}

fn bad_multipart(err: &MultipartError) -> AppError {
    AppError::BadRequest(err.body_text())
}

/// Show the signed-in shopper's profile.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<AccountView>> {
    let account = state.account();
    if account.token().is_none() {
        return Err(not_signed_in());
    }
    Ok(Json(AccountView {
        user: account.current_user(),
    }))
}

/// Forward a multipart document submission to the documents API.
///
/// Text fields `subject`, `recipient` and `content` are required; every
/// other field is treated as an attachment. Empty file inputs are skipped.
#[instrument(skip_all)]
pub async fn submit_documents(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SubmissionReceipt>> {
    let token = state.account().token().ok_or_else(not_signed_in)?;

    let mut submission = DocumentSubmission::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_multipart(&e))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "subject" | "recipient" | "content" => {
                let value = field.text().await.map_err(|e| bad_multipart(&e))?;
                match name.as_str() {
                    "subject" => submission.subject = value,
                    "recipient" => submission.recipient = value,
                    _ => submission.content = value,
                }
            }
            _ => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(|e| bad_multipart(&e))?;
                if file_name.is_empty() && bytes.is_empty() {
                    debug!(field = %name, "skipping empty file input");
                    continue;
                }
                submission.attachments.push(Attachment {
                    file_name: if file_name.is_empty() {
                        name.clone()
                    } else {
                        file_name
                    },
                    field: name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
        }
    }

    let receipt = state.documents().submit(&token, submission).await?;
    Ok(Json(receipt))
}

//! Document submission for signed-in shoppers.
//!
//! Submissions are forwarded to the documents API as `multipart/form-data`
//! with the stored auth token in the `Authorization` header.

use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};
use url::Url;

/// Form fields that may carry an attachment.
pub const ATTACHMENT_FIELDS: &[&str] = &[
    "file",
    "malumotnoma",
    "photo",
    "passport",
    "kengashBayyonomma",
    "dekanatTaqdimnoma",
    "sinovNatijalari",
    "ilmiyIshlar",
    "annotatsiya",
    "maqolalar",
    "xulosa",
    "testBallari",
    "tarjimaiXol",
    "reytingDaftarcha",
    "guvohnoma",
    "yutuqlar",
    "boshqa",
];

const FIELDS_REQUIRED: &str = "Subject, recipient and content are required";
const SUBMISSION_FAILED: &str = "Failed to submit documents";

/// Errors that can occur when submitting documents.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// A required text field is empty.
    #[error("{0}")]
    Validation(String),

    /// Attachment under a field the form does not have.
    #[error("unknown attachment field: {0}")]
    UnknownField(String),

    /// Two attachments under the same field.
    #[error("duplicate attachment field: {0}")]
    DuplicateField(String),

    /// Documents API answered with an error.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// One uploaded file.
#[derive(Debug, Clone)]
pub struct Attachment {
    /// Form field name, one of [`ATTACHMENT_FIELDS`].
    pub field: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// A document submission.
#[derive(Debug, Clone, Default)]
pub struct DocumentSubmission {
    pub subject: String,
    pub recipient: String,
    pub content: String,
    pub attachments: Vec<Attachment>,
}

impl DocumentSubmission {
    /// Check required fields and attachment names.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::Validation` if subject, recipient or content is
    /// blank, and `UnknownField`/`DuplicateField` for bad attachments.
    pub fn validate(&self) -> Result<(), DocumentError> {
        if [&self.subject, &self.recipient, &self.content]
            .iter()
            .any(|v| v.trim().is_empty())
        {
            return Err(DocumentError::Validation(FIELDS_REQUIRED.to_string()));
        }

        let mut seen: Vec<&str> = Vec::with_capacity(self.attachments.len());
        for attachment in &self.attachments {
            let field = attachment.field.as_str();
            if !ATTACHMENT_FIELDS.contains(&field) {
                return Err(DocumentError::UnknownField(attachment.field.clone()));
            }
            if seen.contains(&field) {
                return Err(DocumentError::DuplicateField(attachment.field.clone()));
            }
            seen.push(field);
        }
        Ok(())
    }

    fn into_form(self) -> Result<Form, DocumentError> {
        let mut form = Form::new()
            .text("subject", self.subject)
            .text("recipient", self.recipient)
            .text("content", self.content);

        for attachment in self.attachments {
            let mut part = Part::bytes(attachment.bytes).file_name(attachment.file_name);
            if let Some(content_type) = attachment.content_type {
                part = part.mime_str(&content_type)?;
            }
            form = form.part(attachment.field, part);
        }
        Ok(form)
    }
}

/// What the documents API returned on success.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Client for the documents API.
#[derive(Debug, Clone)]
pub struct DocumentClient {
    client: reqwest::Client,
    url: Url,
}

impl DocumentClient {
    #[must_use]
    pub const fn new(client: reqwest::Client, url: Url) -> Self {
        Self { client, url }
    }

    /// Validate and forward a submission.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError` if validation fails, the request fails, or the
    /// API rejects the submission.
    #[instrument(skip_all, fields(attachments = submission.attachments.len()))]
    pub async fn submit(
        &self,
        token: &SecretString,
        submission: DocumentSubmission,
    ) -> Result<SubmissionReceipt, DocumentError> {
        submission.validate()?;
        let form = submission.into_form()?;

        let response = self
            .client
            .post(self.url.clone())
            .header(AUTHORIZATION, token.expose_secret())
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|b| b.error)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| SUBMISSION_FAILED.to_string());
            return Err(DocumentError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        info!("documents submitted");
        Ok(serde_json::from_str(&text).unwrap_or_default())
    }
}

use std::collections::HashMap;

use axum::extract::Multipart;

use crate::error::ApiError;
use crate::utils::images::sniff_image_mime;

pub struct UploadedImage {
    pub bytes: Vec<u8>,
    pub mime: String,
}

pub struct FormData {
    pub fields: HashMap<String, String>,
    pub image: Option<UploadedImage>,
}

impl FormData {
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

/// Drain a multipart body into text fields plus an optional `image` file.
/// The image is magic-byte checked here; an upload that is not a decodable
/// image format is a 400, same as a malformed body.
pub async fn collect_form(mut multipart: Multipart) -> Result<FormData, ApiError> {
    let mut fields = HashMap::new();
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "image" {
            let declared_mime = field.content_type().map(|s| s.to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Invalid image: {e}")))?
                .to_vec();
            let sniffed = sniff_image_mime(&bytes).ok_or_else(|| {
                ApiError::BadRequest("Invalid image: unrecognized format".into())
            })?;
            let mime = declared_mime.unwrap_or_else(|| sniffed.to_string());
            image = Some(UploadedImage { bytes, mime });
        } else if !name.is_empty() {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Invalid form field {name}: {e}")))?;
            fields.insert(name, value);
        }
    }

    Ok(FormData { fields, image })
}

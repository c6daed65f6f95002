//! Image upload to the backend.

use gloo_net::http::Request;
use serde_json::Value;
use web_sys::{File, FormData};

use crate::{AppError, AppResult, UPLOAD_PATH};

/// Upload one image as a multipart `file` field and return its id.
pub async fn upload_image(file: &File, backend_url: &str) -> AppResult<String> {
    let form_data =
        FormData::new().map_err(|e| AppError::Network(format!("Failed to create FormData: {:?}", e)))?;

    form_data
        .append_with_blob_and_filename("file", file, &file.name())
        .map_err(|e| AppError::Network(format!("Failed to append file: {:?}", e)))?;

    let url = format!("{}{}", backend_url, UPLOAD_PATH);
    let request = Request::post(&url)
        .body(form_data)
        .map_err(|e| AppError::Network(format!("Failed to build request: {}", e)))?;

    let response = request
        .send()
        .await
        .map_err(|e| AppError::Network(format!("HTTP request failed: {}", e)))?;

    if !response.ok() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(AppError::Upload(format!(
            "Server error ({}): {}",
            response.status(),
            error_text
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| AppError::Network(format!("Failed to read response: {}", e)))?;
    parse_upload_response(&body)
}

/// Extract the image id from an upload response body.
pub fn parse_upload_response(body: &str) -> AppResult<String> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| AppError::InvalidResponse(format!("Failed to parse response: {}", e)))?;
    imgdrop::extract_remote_id(&value)
        .ok_or_else(|| AppError::InvalidResponse(format!("no id in response: {}", body)))
}

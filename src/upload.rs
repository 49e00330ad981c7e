use std::rc::Rc;

use uuid::Uuid;

use crate::client::{ApiCall, ApiClient};
use crate::error::{ApiError, ApiResult};
use crate::normalize::FromPayload;
use crate::request::{HttpClient, MultipartForm, RequestBody};
use floodwatch_shared::UploadedObject;
use floodwatch_shared::protocol::UPLOAD_PATH;

/// A file picked by the user, read into memory.
#[derive(Debug, Clone, PartialEq)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Text after the last dot, if any.
    pub fn extension(&self) -> Option<&str> {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
    }
}

/// Object name the backend stores the file under: a fresh v4 UUID plus the
/// original extension.
pub fn unique_object_name(file: &FileUpload) -> String {
    let id = Uuid::new_v4();
    match file.extension() {
        Some(ext) => format!("{}.{}", id, ext),
        None => id.to_string(),
    }
}

/// Hands files to the backend, which stores them in the public image bucket.
pub struct ObjectUploader<C: HttpClient> {
    client: Rc<ApiClient<C>>,
}

impl<C: HttpClient> Clone for ObjectUploader<C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
        }
    }
}

impl<C: HttpClient> ObjectUploader<C> {
    pub fn new(client: Rc<ApiClient<C>>) -> Self {
        Self { client }
    }

    /// Uploads one file and returns its public URL.
    ///
    /// # Arguments
    /// * `file` - contents plus the original name and MIME type
    ///
    /// # Returns
    /// `{upload_public_base}/{objectName}`.
    ///
    /// # Errors
    /// `Decode` if the reply names no object, otherwise whatever the client
    /// returned.
    pub async fn upload(&self, file: FileUpload) -> ApiResult<String> {
        let object_name = unique_object_name(&file);
        log_info!(
            "Uploading {} ({} bytes) as {}",
            file.file_name,
            file.bytes.len(),
            object_name
        );

        let form = MultipartForm::new()
            .file("file", &file.file_name, &file.content_type, file.bytes)
            .text("filename", object_name.clone())
            .text("contentType", file.content_type.clone());

        let response = self
            .client
            .send(ApiCall::post(UPLOAD_PATH).with_body(RequestBody::Multipart(form)))
            .await
            .map_err(|e| e.in_op_with("upload", object_name.clone()))?;

        let stored = response
            .json_value()
            .and_then(UploadedObject::from_payload)
            .ok()
            .and_then(|obj| obj.object_name)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                ApiError::decode("Upload response did not include an object name")
                    .with_body(response.body.clone())
                    .in_op_with("upload", object_name.clone())
            })?;

        let url = format!("{}/{}", self.client.config().upload_public_base, stored);
        log_info!("Upload stored at {}", url);
        Ok(url)
    }
}

//! File upload client methods

use super::{ClientError, EchoClient};
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::path::Path;

/// Form field carrying the uploaded file
pub const FILE_FIELD: &str = "file";

impl EchoClient {
    /// Upload a prepared multipart form
    ///
    /// # Errors
    ///
    /// Returns the [`ClientError`] from [`EchoClient::execute`]
    pub async fn upload_file(&self, form: Form) -> Result<Value, ClientError> {
        let request = self.request(Method::POST, "/upload").multipart(form);
        self.execute(request).await
    }

    /// Upload a file from disk under the `file` field
    ///
    /// # Errors
    ///
    /// [`ClientError::Io`] if the file cannot be read, otherwise the
    /// [`ClientError`] from [`EchoClient::execute`]
    pub async fn upload_path(&self, path: &Path) -> Result<Value, ClientError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                ClientError::Configuration(format!("{} is not a file path", path.display()))
            })?;

        let form = Form::new().part(FILE_FIELD, Part::bytes(bytes).file_name(file_name));
        self.upload_file(form).await
    }
}

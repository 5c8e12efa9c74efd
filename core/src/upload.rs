//! Uploaded files: native descriptors and opaque file objects.
//!
//! # Design
//! The host describes each upload with a flat descriptor
//! (`name`/`type`/`size`/`tmp_name`/`error`), the fluent contract with an
//! opaque `UploadedFile` value. A request stores only descriptors and
//! converts with the two functions below whenever one side is read or
//! written, so the two views cannot drift apart. Both functions are total and
//! keep the entry count and field names.

use serde::{Deserialize, Serialize};

/// Upload completed without error.
pub const UPLOAD_ERR_OK: i64 = 0;
/// The upload exceeded the host's size limit.
pub const UPLOAD_ERR_INI_SIZE: i64 = 1;
/// The upload exceeded the form's size limit.
pub const UPLOAD_ERR_FORM_SIZE: i64 = 2;
/// Only part of the file arrived.
pub const UPLOAD_ERR_PARTIAL: i64 = 3;
/// No file was sent for the field.
pub const UPLOAD_ERR_NO_FILE: i64 = 4;

/// Native upload status: hosts send either a numeric code or a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UploadError {
    Code(i64),
    Message(String),
}

impl Default for UploadError {
    fn default() -> Self {
        UploadError::Code(UPLOAD_ERR_OK)
    }
}

impl UploadError {
    /// Numeric code, casting a message the way the host casts strings to
    /// integers: leading digits, or 0.
    pub fn code(&self) -> i64 {
        match self {
            UploadError::Code(code) => *code,
            UploadError::Message(message) => {
                let trimmed = message.trim_start();
                let digits: String = trimmed
                    .char_indices()
                    .take_while(|&(i, c)| c.is_ascii_digit() || (i == 0 && c == '-'))
                    .map(|(_, c)| c)
                    .collect();
                digits.parse().unwrap_or(UPLOAD_ERR_OK)
            }
        }
    }
}

/// One upload in the host's native shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDescriptor {
    /// Client-side file name.
    pub name: String,
    /// Client-declared media type.
    #[serde(rename = "type")]
    pub media_type: String,
    pub size: u64,
    /// Where the host stored the upload.
    pub tmp_name: String,
    pub error: UploadError,
}

/// Opaque uploaded-file value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    file: String,
    size: u64,
    error: i64,
    client_filename: String,
    client_media_type: String,
}

impl UploadedFile {
    pub fn new(file: impl Into<String>, size: u64, error: i64) -> Self {
        Self {
            file: file.into(),
            size,
            error,
            client_filename: String::new(),
            client_media_type: String::new(),
        }
    }

    pub fn with_client_filename(mut self, name: impl Into<String>) -> Self {
        self.client_filename = name.into();
        self
    }

    pub fn with_client_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.client_media_type = media_type.into();
        self
    }

    /// Path of the stored upload.
    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn error(&self) -> i64 {
        self.error
    }

    pub fn is_ok(&self) -> bool {
        self.error == UPLOAD_ERR_OK
    }

    pub fn client_filename(&self) -> &str {
        &self.client_filename
    }

    pub fn client_media_type(&self) -> &str {
        &self.client_media_type
    }
}

impl From<&FileDescriptor> for UploadedFile {
    fn from(descriptor: &FileDescriptor) -> Self {
        UploadedFile::new(&*descriptor.tmp_name, descriptor.size, descriptor.error.code())
            .with_client_filename(&*descriptor.name)
            .with_client_media_type(&*descriptor.media_type)
    }
}

impl From<&UploadedFile> for FileDescriptor {
    fn from(file: &UploadedFile) -> Self {
        FileDescriptor {
            name: file.client_filename.clone(),
            media_type: file.client_media_type.clone(),
            size: file.size,
            tmp_name: file.file.clone(),
            error: UploadError::Code(file.error),
        }
    }
}

/// Native upload params keyed by form field.
pub type FileParams = Vec<(String, FileDescriptor)>;

/// Opaque uploads keyed by form field.
pub type UploadedFiles = Vec<(String, UploadedFile)>;

pub fn descriptors_to_objects(params: &[(String, FileDescriptor)]) -> UploadedFiles {
    params
        .iter()
        .map(|(field, descriptor)| (field.clone(), UploadedFile::from(descriptor)))
        .collect()
}

pub fn objects_to_descriptors(files: &[(String, UploadedFile)]) -> FileParams {
    files
        .iter()
        .map(|(field, file)| (field.clone(), FileDescriptor::from(file)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> FileDescriptor {
        FileDescriptor {
            name: "avatar.png".into(),
            media_type: "image/png".into(),
            size: 123,
            tmp_name: "/tmp/php123".into(),
            error: UploadError::Code(UPLOAD_ERR_OK),
        }
    }

    #[test]
    fn descriptor_to_object_keeps_fields() {
        let files = descriptors_to_objects(&[("avatar".into(), descriptor())]);
        assert_eq!(files.len(), 1);
        let (field, file) = &files[0];
        assert_eq!(field, "avatar");
        assert_eq!(file.file(), "/tmp/php123");
        assert_eq!(file.size(), 123);
        assert_eq!(file.client_filename(), "avatar.png");
        assert_eq!(file.client_media_type(), "image/png");
        assert!(file.is_ok());
    }

    #[test]
    fn object_round_trip_is_lossless() {
        let files = vec![
            ("a".to_string(), UploadedFile::new("", 0, 0)),
            (
                "b".to_string(),
                UploadedFile::new("/tmp/x", 9, UPLOAD_ERR_PARTIAL).with_client_filename("x.txt"),
            ),
        ];
        let back = descriptors_to_objects(&objects_to_descriptors(&files));
        assert_eq!(back, files);
    }

    #[test]
    fn message_errors_cast_like_the_host() {
        assert_eq!(UploadError::Message("some error here".into()).code(), UPLOAD_ERR_OK);
        assert_eq!(UploadError::Message("4".into()).code(), UPLOAD_ERR_NO_FILE);
        assert_eq!(UploadError::Message(" 2 bytes".into()).code(), UPLOAD_ERR_FORM_SIZE);
        assert_eq!(UploadError::Code(UPLOAD_ERR_INI_SIZE).code(), 1);
    }

    #[test]
    fn descriptor_serde_uses_native_names() {
        let raw = r#"{"name":"n","type":"t","size":1,"tmp_name":"p","error":"oops"}"#;
        let parsed: FileDescriptor = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.media_type, "t");
        assert_eq!(parsed.error, UploadError::Message("oops".into()));
        assert_eq!(serde_json::to_string(&parsed).unwrap(), raw);
    }

    #[test]
    fn missing_descriptor_fields_default() {
        let parsed: FileDescriptor = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, FileDescriptor::default());
    }
}

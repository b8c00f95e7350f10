pub mod generation;
pub mod mesh;
pub mod scripts;

use axum::extract::multipart::{Multipart, MultipartError};

/// An uploaded file pulled out of a multipart form.
pub struct UploadedFile {
    /// Client-supplied file name, if any.
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

/// Read the multipart field called `field`, skipping all others.
///
/// Returns `Ok(None)` when the form has no such field.
pub async fn read_file_field(
    multipart: &mut Multipart,
    field: &str,
) -> Result<Option<UploadedFile>, MultipartError> {
    let mut found = None;
    while let Some(part) = multipart.next_field().await? {
        if part.name() != Some(field) {
            continue;
        }
        let filename = part.file_name().map(str::to_string);
        let bytes = part.bytes().await?;
        found = Some(UploadedFile {
            filename,
            bytes: bytes.to_vec(),
        });
    }
    Ok(found)
}

//! Mesh object model and its API representation.

use std::fmt::Write;

use meshgen_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Timestamp layout used when a mesh is rendered for clients.
pub const UPLOAD_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A row from the `mesh_objects` table.
///
/// Rows are immutable once inserted; the id is assigned by the database.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct MeshObject {
    pub id: DbId,
    pub name: String,
    pub data: Vec<u8>,
    pub upload_time: Timestamp,
}

/// Client-facing view of a [`MeshObject`].
///
/// The binary payload is rendered as lowercase hex and the timestamp as
/// `YYYY-MM-DD HH:MM:SS` (UTC).
#[derive(Debug, Clone, Serialize)]
pub struct MeshObjectResponse {
    pub id: DbId,
    pub name: String,
    pub upload_time: String,
    pub data: String,
}

impl From<&MeshObject> for MeshObjectResponse {
    fn from(mesh: &MeshObject) -> Self {
        Self {
            id: mesh.id,
            name: mesh.name.clone(),
            upload_time: mesh.upload_time.format(UPLOAD_TIME_FORMAT).to_string(),
            data: to_hex(&mesh.data),
        }
    }
}

/// Encode bytes as a lowercase hex string.
pub fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        // Writing into a String cannot fail.
        let _ = write!(out, "{b:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn hex_encoding_is_lowercase_and_padded() {
        assert_eq!(to_hex(&[0x00, 0x0f, 0xab, 0xff]), "000fabff");
        assert_eq!(to_hex(&[]), "");
    }

    #[test]
    fn response_formats_timestamp_and_payload() {
        let mesh = MeshObject {
            id: 7,
            name: "GeneratedObject".into(),
            data: b"usd".to_vec(),
            upload_time: chrono::Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap(),
        };

        let resp = MeshObjectResponse::from(&mesh);
        assert_eq!(resp.id, 7);
        assert_eq!(resp.name, "GeneratedObject");
        assert_eq!(resp.upload_time, "2024-03-09 14:05:00");
        assert_eq!(resp.data, "757364");
    }
}

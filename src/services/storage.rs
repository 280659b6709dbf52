// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Blob storage for course images.

use anyhow::Context;
use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use dashmap::DashMap;

/// Object store seam. Keys are `/`-separated paths.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()>;

    /// URL under which `key` can be read by anyone.
    fn public_url(&self, key: &str) -> String;
}

/// S3-compatible bucket.
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3Storage {
    pub async fn new(
        endpoint: &str,
        bucket: &str,
        access_key: &str,
        secret_key: &str,
        region: &str,
        public_base_url: &str,
    ) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(Credentials::new(
                access_key, secret_key, None, None, "static",
            ))
            .endpoint_url(endpoint)
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(endpoint)
            .force_path_style(true)
            .build();

        tracing::info!(endpoint, bucket, "Blob storage configured");

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: bucket.to_string(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl BlobStorage for S3Storage {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .context("s3 put_object")?;
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}

/// In-process object store for local mode and tests.
#[derive(Default)]
pub struct MemoryStorage {
    objects: DashMap<String, (Bytes, String)>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn object(&self, key: &str) -> Option<(Bytes, String)> {
        self.objects.get(key).map(|o| o.clone())
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.iter().map(|o| o.key().clone()).collect()
    }
}

#[async_trait]
impl BlobStorage for MemoryStorage {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        self.objects
            .insert(key.to_string(), (body, content_type.to_string()));
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("memory://{}", key)
    }
}

/// Image attached to a course create/update request.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUpload {
    pub file_name: String,
    #[serde(default)]
    pub content_type: Option<String>,
    /// base64 encoded
    pub data: String,
}

/// Image refused before anything is stored.
#[derive(Debug, thiserror::Error)]
pub enum ImageRejected {
    #[error("image is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("image has no file name")]
    NoFileName,
}

/// Last path segment of whatever the browser sent, when it names a file.
fn image_file_name(file_name: &str) -> Option<&str> {
    let name = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
        .trim();
    (!name.is_empty() && name != "." && name != "..").then_some(name)
}

/// Object key for a course image: `formations/{unix_millis}_{file_name}`.
pub fn formation_image_key(unix_millis: i64, file_name: &str) -> String {
    format!(
        "formations/{}_{}",
        unix_millis,
        image_file_name(file_name).unwrap_or_default()
    )
}

fn guess_content_type(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit('.')
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// Decode and upload a course image. Returns its public URL.
pub async fn upload_formation_image(
    storage: &dyn BlobStorage,
    upload: &ImageUpload,
) -> anyhow::Result<String> {
    let name = image_file_name(&upload.file_name).ok_or(ImageRejected::NoFileName)?;
    let bytes = STANDARD
        .decode(upload.data.trim())
        .map_err(ImageRejected::from)?;

    let key = formation_image_key(chrono::Utc::now().timestamp_millis(), name);
    let content_type = upload
        .content_type
        .clone()
        .unwrap_or_else(|| guess_content_type(name).to_string());

    storage
        .put_object(&key, Bytes::from(bytes), &content_type)
        .await?;

    tracing::info!(key = %key, "Formation image uploaded");
    Ok(storage.public_url(&key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_key() {
        assert_eq!(
            formation_image_key(1700000000000, "C:\\photos\\cours.png"),
            "formations/1700000000000_cours.png"
        );
        assert_eq!(formation_image_key(5, "a.jpg"), "formations/5_a.jpg");
    }

    #[tokio::test]
    async fn test_upload_decodes_and_stores() {
        let storage = MemoryStorage::new();
        let upload = ImageUpload {
            file_name: "logo.PNG".to_string(),
            content_type: None,
            data: STANDARD.encode(b"\x89PNG"),
        };

        let url = upload_formation_image(&storage, &upload).await.unwrap();

        let keys = storage.keys();
        assert_eq!(keys.len(), 1);
        assert!(keys[0].starts_with("formations/") && keys[0].ends_with("_logo.PNG"));
        assert_eq!(url, format!("memory://{}", keys[0]));
        let (body, content_type) = storage.object(&keys[0]).unwrap();
        assert_eq!(&body[..], b"\x89PNG");
        assert_eq!(content_type, "image/png");
    }

    #[tokio::test]
    async fn test_upload_rejects_missing_file_name() {
        let storage = MemoryStorage::new();
        for file_name in ["", "  ", "photos/", "C:\\photos\\", ".."] {
            let upload = ImageUpload {
                file_name: file_name.to_string(),
                content_type: None,
                data: STANDARD.encode(b"png"),
            };
            let err = upload_formation_image(&storage, &upload).await.unwrap_err();
            assert!(matches!(
                err.downcast_ref::<ImageRejected>(),
                Some(ImageRejected::NoFileName)
            ));
        }
        assert!(storage.keys().is_empty());
    }

    #[tokio::test]
    async fn test_upload_rejects_bad_base64() {
        let storage = MemoryStorage::new();
        let upload = ImageUpload {
            file_name: "x.png".to_string(),
            content_type: None,
            data: "%%%".to_string(),
        };
        assert!(upload_formation_image(&storage, &upload).await.is_err());
        assert!(storage.keys().is_empty());
    }
}

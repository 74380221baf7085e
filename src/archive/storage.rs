use std::time::Duration;

use anyhow::Context;
use axum::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    presigning::PresigningConfig,
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;
use uuid::Uuid;

use crate::config::ArchiveConfig;

/// File-archive service: stores export documents and hands out download links.
#[async_trait]
pub trait ArchiveClient: Send + Sync {
    /// Uploads `body` for `owner` and returns the object key.
    async fn put_export(
        &self,
        owner: Uuid,
        name: &str,
        body: Bytes,
        content_type: &str,
    ) -> anyhow::Result<String>;
    async fn presign_get(&self, key: &str, seconds: u64) -> anyhow::Result<String>;
}

pub fn export_key(owner: Uuid, id: Uuid, name: &str) -> String {
    format!("exports/{}/{}-{}", owner, id, name)
}

#[derive(Clone)]
pub struct S3Archive {
    client: Client,
    bucket: String,
}

impl S3Archive {
    pub async fn new(cfg: &ArchiveConfig) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()))
            .credentials_provider(Credentials::new(
                &cfg.access_key,
                &cfg.secret_key,
                None,
                None,
                "static",
            ))
            .endpoint_url(&cfg.endpoint)
            .load()
            .await;

        // MinIO serves buckets by path, not by subdomain
        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(&cfg.endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: cfg.bucket.clone(),
        })
    }
}

#[async_trait]
impl ArchiveClient for S3Archive {
    async fn put_export(
        &self,
        owner: Uuid,
        name: &str,
        body: Bytes,
        content_type: &str,
    ) -> anyhow::Result<String> {
        let key = export_key(owner, Uuid::new_v4(), name);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .with_context(|| format!("s3 put_object {}", key))?;
        Ok(key)
    }

    async fn presign_get(&self, key: &str, seconds: u64) -> anyhow::Result<String> {
        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(PresigningConfig::expires_in(Duration::from_secs(seconds))?)
            .await
            .context("s3 presign_get")?;
        Ok(presigned.uri().to_string())
    }
}

#[cfg(test)]
pub mod fake {
    use std::collections::HashMap;

    use tokio::sync::Mutex;

    use super::*;

    /// Keeps uploads in memory; optionally refuses every upload.
    #[derive(Default)]
    pub struct FakeArchive {
        pub objects: Mutex<HashMap<String, (Bytes, String)>>,
        pub fail_uploads: bool,
    }

    #[async_trait]
    impl ArchiveClient for FakeArchive {
        async fn put_export(
            &self,
            owner: Uuid,
            name: &str,
            body: Bytes,
            content_type: &str,
        ) -> anyhow::Result<String> {
            if self.fail_uploads {
                anyhow::bail!("archive unavailable");
            }
            let key = export_key(owner, Uuid::new_v4(), name);
            self.objects
                .lock()
                .await
                .insert(key.clone(), (body, content_type.to_string()));
            Ok(key)
        }

        async fn presign_get(&self, key: &str, _seconds: u64) -> anyhow::Result<String> {
            Ok(format!("https://fake.local/{}", key))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeArchive;
    use super::*;

    #[test]
    fn keys_are_scoped_by_owner() {
        let owner = Uuid::new_v4();
        let id = Uuid::new_v4();
        let key = export_key(owner, id, "plan.csv");
        assert_eq!(key, format!("exports/{}/{}-plan.csv", owner, id));
    }

    #[tokio::test]
    async fn fake_archive_stores_and_presigns() {
        let archive = FakeArchive::default();
        let owner = Uuid::new_v4();
        let key = archive
            .put_export(owner, "plan.csv", Bytes::from_static(b"a,b"), "text/csv")
            .await
            .unwrap();
        assert!(key.starts_with(&format!("exports/{}/", owner)));
        assert!(archive.objects.lock().await.contains_key(&key));

        let url = archive.presign_get(&key, 60).await.unwrap();
        assert!(url.contains(&key));
    }
}

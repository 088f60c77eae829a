use futures::StreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore as _;
use std::sync::Arc;
use tokio::runtime::{Builder as RuntimeBuilder, Runtime};

use crate::error::BlockStoreError;
use crate::{BlockPath, BlockStore, BlockStoreResult};

/// A [`BlockStore`] backed by an S3-compatible object store.
///
/// Every other durable-write path in this workspace (WAL segment rotation,
/// SSTable publish, the local block store) is synchronous blocking I/O, so
/// this implementor holds a dedicated single-threaded Tokio runtime and
/// drives the `object_store` crate's async client through `block_on` rather
/// than exposing `async fn` across the `BlockStore` trait boundary — that
/// keeps the orchestrator's call sites identical regardless of backend.
pub struct S3BlockStore {
    client: Arc<dyn object_store::ObjectStore>,
    runtime: Runtime,
}

impl S3BlockStore {
    /// Builds a client against `bucket` in `region`, using the endpoint and
    /// credentials supplied via the standard `AWS_*` environment variables
    /// (or an S3-compatible endpoint override for MinIO-style deployments).
    pub fn new(bucket: &str, region: &str, endpoint: Option<&str>) -> BlockStoreResult<Self> {
        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket).with_region(region);
        if let Some(endpoint) = endpoint {
            builder = builder.with_endpoint(endpoint).with_allow_http(true);
        }
        let client = builder
            .build()
            .map_err(|e| BlockStoreError::Remote(format!("failed to build S3 client: {e}")))?;

        let runtime = RuntimeBuilder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| BlockStoreError::Remote(format!("failed to start runtime: {e}")))?;

        Ok(Self { client: Arc::new(client), runtime })
    }
}

impl BlockStore for S3BlockStore {
    fn put(&self, path: &str, bytes: &[u8]) -> BlockStoreResult<()> {
        let client = self.client.clone();
        let object_path = ObjectPath::from(path);
        let payload = bytes.to_vec();
        self.runtime.block_on(async move {
            client
                .put(&object_path, payload.into())
                .await
                .map(|_| ())
                .map_err(|e| BlockStoreError::Remote(e.to_string()))
        })
    }

    fn get(&self, path: &str) -> BlockStoreResult<Vec<u8>> {
        let client = self.client.clone();
        let object_path = ObjectPath::from(path);
        self.runtime.block_on(async move {
            let result = client.get(&object_path).await.map_err(|e| match e {
                object_store::Error::NotFound { .. } => BlockStoreError::NotFound(path.to_string()),
                other => BlockStoreError::Remote(other.to_string()),
            })?;
            let bytes = result.bytes().await.map_err(|e| BlockStoreError::Remote(e.to_string()))?;
            Ok(bytes.to_vec())
        })
    }

    fn list(&self, prefix: &str) -> BlockStoreResult<Vec<BlockPath>> {
        let client = self.client.clone();
        let object_prefix = ObjectPath::from(prefix);
        self.runtime.block_on(async move {
            let mut stream = client.list(Some(&object_prefix));
            let mut out = Vec::new();
            while let Some(meta) = stream.next().await {
                let meta = meta.map_err(|e| BlockStoreError::Remote(e.to_string()))?;
                out.push(meta.location.to_string());
            }
            Ok(out)
        })
    }

    fn delete(&self, path: &str) -> BlockStoreResult<()> {
        let client = self.client.clone();
        let object_path = ObjectPath::from(path);
        self.runtime.block_on(async move {
            match client.delete(&object_path).await {
                Ok(()) => Ok(()),
                Err(object_store::Error::NotFound { .. }) => Ok(()),
                Err(e) => Err(BlockStoreError::Remote(e.to_string())),
            }
        })
    }
}

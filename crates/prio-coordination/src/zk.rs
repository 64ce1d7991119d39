use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::warn;
use zookeeper_client::{Client, CreateMode};

use crate::client::{CoordinationClient, WatchOnce};
use crate::error::{CoordError, CoordResult};

/// [`CoordinationClient`] backed by a real ensemble.
pub struct ZkClient {
    client: Client,
}

impl ZkClient {
    pub async fn connect(connect_string: &str) -> CoordResult<Self> {
        let client = Client::connect(connect_string)
            .await
            .map_err(|err| CoordError::Backend(err.to_string()))?;
        Ok(Self { client })
    }

    /// Relays a zookeeper watcher event onto a one-shot channel so callers
    /// only ever deal in [`WatchOnce`], regardless of backend.
    fn relay<W>(watcher: W) -> WatchOnce
    where
        W: std::future::Future<Output = zookeeper_client::WatchedEvent> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let _event = watcher.await;
            if tx.send(()).is_err() {
                warn!("watch fired after receiver was dropped");
            }
        });
        rx
    }
}

#[async_trait]
impl CoordinationClient for ZkClient {
    async fn ensure_persistent(&self, path: &str) -> CoordResult<()> {
        match self
            .client
            .create(path, b"", &CreateMode::Persistent)
            .await
        {
            Ok(_) => Ok(()),
            Err(zookeeper_client::Error::NodeExists) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    async fn create_ephemeral(&self, path: &str, data: Vec<u8>) -> CoordResult<()> {
        self.client
            .create(path, &data, &CreateMode::Ephemeral)
            .await
            .map_err(CoordError::from)?;
        Ok(())
    }

    async fn create_ephemeral_sequential(&self, parent: &str, data: Vec<u8>) -> CoordResult<String> {
        let prefix = format!("{}/n_", parent.trim_end_matches('/'));
        let (path, _stat) = self
            .client
            .create(&prefix, &data, &CreateMode::EphemeralSequential)
            .await
            .map_err(CoordError::from)?;
        Ok(path)
    }

    async fn exists_watch(&self, path: &str) -> CoordResult<(bool, WatchOnce)> {
        let (stat, watcher) = self
            .client
            .check_and_watch_stat(path)
            .await
            .map_err(CoordError::from)?;
        Ok((stat.is_some(), Self::relay(watcher)))
    }

    async fn children(&self, path: &str) -> CoordResult<Vec<String>> {
        self.client.list_children(path).await.map_err(CoordError::from)
    }

    async fn children_watch(&self, path: &str) -> CoordResult<(Vec<String>, WatchOnce)> {
        let (children, _stat, watcher) = self
            .client
            .get_and_watch_children(path)
            .await
            .map_err(CoordError::from)?;
        Ok((children, Self::relay(watcher)))
    }

    async fn get(&self, path: &str) -> CoordResult<Vec<u8>> {
        let (data, _stat) = self.client.get_data(path).await.map_err(CoordError::from)?;
        Ok(data)
    }

    async fn set(&self, path: &str, data: Vec<u8>) -> CoordResult<()> {
        self.client
            .set_data(path, &data, None)
            .await
            .map_err(CoordError::from)?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> CoordResult<()> {
        self.client.delete(path, None).await.map_err(CoordError::from)
    }
}

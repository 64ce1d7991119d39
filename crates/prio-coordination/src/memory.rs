use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::client::{CoordinationClient, WatchOnce};
use crate::error::{CoordError, CoordResult};

#[derive(Default)]
struct Node {
    data: Vec<u8>,
    sequence_counter: u64,
}

#[derive(Default)]
struct Inner {
    nodes: HashMap<String, Node>,
    exists_watchers: HashMap<String, Vec<oneshot::Sender<()>>>,
    children_watchers: HashMap<String, Vec<oneshot::Sender<()>>>,
}

impl Inner {
    fn fire_exists(&mut self, path: &str) {
        for tx in self.exists_watchers.remove(path).unwrap_or_default() {
            let _ = tx.send(());
        }
    }

    fn fire_children(&mut self, parent: &str) {
        for tx in self.children_watchers.remove(parent).unwrap_or_default() {
            let _ = tx.send(());
        }
    }

    fn list_children(&self, parent: &str) -> Vec<String> {
        let prefix = if parent.ends_with('/') {
            parent.to_string()
        } else {
            format!("{parent}/")
        };
        self.nodes
            .keys()
            .filter_map(|path| {
                let rest = path.strip_prefix(&prefix)?;
                if rest.is_empty() || rest.contains('/') {
                    None
                } else {
                    Some(rest.to_string())
                }
            })
            .collect()
    }
}

fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(idx) => &path[..idx],
        None => "/",
    }
}

/// In-process stand-in for a coordination-service ensemble. Every node lives
/// in a single `Mutex<Inner>`; there is no session concept, so watches never
/// report [`CoordError::SessionLost`] on their own.
pub struct InMemoryClient {
    inner: Mutex<Inner>,
}

impl InMemoryClient {
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert("/".to_string(), Node::default());
        Self {
            inner: Mutex::new(Inner {
                nodes,
                ..Inner::default()
            }),
        }
    }
}

impl Default for InMemoryClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CoordinationClient for InMemoryClient {
    async fn ensure_persistent(&self, path: &str) -> CoordResult<()> {
        let mut inner = self.inner.lock();
        if !inner.nodes.contains_key(path) {
            inner.nodes.insert(path.to_string(), Node::default());
            let parent = parent_of(path).to_string();
            inner.fire_children(&parent);
            inner.fire_exists(path);
        }
        Ok(())
    }

    async fn create_ephemeral(&self, path: &str, data: Vec<u8>) -> CoordResult<()> {
        let mut inner = self.inner.lock();
        if inner.nodes.contains_key(path) {
            return Err(CoordError::NodeExists(path.to_string()));
        }
        inner.nodes.insert(
            path.to_string(),
            Node {
                data,
                sequence_counter: 0,
            },
        );
        let parent = parent_of(path).to_string();
        inner.fire_children(&parent);
        inner.fire_exists(path);
        Ok(())
    }

    async fn create_ephemeral_sequential(&self, parent: &str, data: Vec<u8>) -> CoordResult<String> {
        let mut inner = self.inner.lock();
        let counter = {
            let parent_node = inner
                .nodes
                .get_mut(parent)
                .ok_or_else(|| CoordError::NoNode(parent.to_string()))?;
            parent_node.sequence_counter += 1;
            parent_node.sequence_counter
        };

        let suffix = format!("{counter:010}");
        let full_path = if parent.ends_with('/') {
            format!("{parent}n_{suffix}")
        } else {
            format!("{parent}/n_{suffix}")
        };

        inner.nodes.insert(full_path.clone(), Node { data, sequence_counter: 0 });
        inner.fire_children(parent);
        Ok(full_path)
    }

    async fn exists_watch(&self, path: &str) -> CoordResult<(bool, WatchOnce)> {
        let mut inner = self.inner.lock();
        let exists = inner.nodes.contains_key(path);
        let (tx, rx) = oneshot::channel();
        inner.exists_watchers.entry(path.to_string()).or_default().push(tx);
        Ok((exists, rx))
    }

    async fn children(&self, path: &str) -> CoordResult<Vec<String>> {
        let inner = self.inner.lock();
        if !inner.nodes.contains_key(path) {
            return Err(CoordError::NoNode(path.to_string()));
        }
        Ok(inner.list_children(path))
    }

    async fn children_watch(&self, path: &str) -> CoordResult<(Vec<String>, WatchOnce)> {
        let mut inner = self.inner.lock();
        if !inner.nodes.contains_key(path) {
            return Err(CoordError::NoNode(path.to_string()));
        }
        let children = inner.list_children(path);
        let (tx, rx) = oneshot::channel();
        inner.children_watchers.entry(path.to_string()).or_default().push(tx);
        Ok((children, rx))
    }

    async fn get(&self, path: &str) -> CoordResult<Vec<u8>> {
        let inner = self.inner.lock();
        inner
            .nodes
            .get(path)
            .map(|n| n.data.clone())
            .ok_or_else(|| CoordError::NoNode(path.to_string()))
    }

    async fn set(&self, path: &str, data: Vec<u8>) -> CoordResult<()> {
        let mut inner = self.inner.lock();
        {
            let node = inner
                .nodes
                .get_mut(path)
                .ok_or_else(|| CoordError::NoNode(path.to_string()))?;
            node.data = data;
        }
        inner.fire_exists(path);
        Ok(())
    }

    async fn delete(&self, path: &str) -> CoordResult<()> {
        let mut inner = self.inner.lock();
        if inner.nodes.remove(path).is_none() {
            return Err(CoordError::NoNode(path.to_string()));
        }
        let parent = parent_of(path).to_string();
        inner.fire_exists(path);
        inner.fire_children(&parent);
        Ok(())
    }
}

use std::sync::Arc;

use prio_coordination::CoordinationClient;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{ElectError, ElectResult};
use crate::status::{Role, Status};

/// Buffered to 1 so a slow consumer only ever sees the latest status, the
/// same way the original buffered channel of size one behaves.
pub type StatusReceiver = mpsc::Receiver<Status>;

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Ephemeral-sequential leader election against a [`CoordinationClient`].
/// The lowest sequence number under `election_root` is the leader; every
/// other candidate watches its immediate predecessor, so a departure only
/// wakes the one candidate behind it instead of the whole herd.
pub struct Elector<C: CoordinationClient> {
    client: Arc<C>,
    election_root: String,
    cancel: CancellationToken,
}

impl<C: CoordinationClient + 'static> Elector<C> {
    pub fn new(client: Arc<C>, election_root: impl Into<String>) -> Self {
        Self {
            client,
            election_root: election_root.into(),
            cancel: CancellationToken::new(),
        }
    }

    /// Nominates `candidate_id` and spawns the background task that tracks
    /// its role for as long as the returned handle is alive or [`Self::resign`]
    /// is called.
    pub fn elect(&self, candidate_id: impl Into<String>) -> (JoinHandle<()>, StatusReceiver) {
        let (tx, rx) = mpsc::channel(1);
        let client = self.client.clone();
        let election_root = self.election_root.clone();
        let cancel = self.cancel.clone();
        let candidate_id = candidate_id.into();

        let handle = tokio::spawn(async move {
            run(client, election_root, candidate_id, cancel, tx).await;
        });

        (handle, rx)
    }

    /// Signals the running election task to delete its node and stop.
    pub fn resign(&self) {
        self.cancel.cancel();
    }
}

async fn run<C: CoordinationClient>(
    client: Arc<C>,
    election_root: String,
    candidate_id: String,
    cancel: CancellationToken,
    status_tx: mpsc::Sender<Status>,
) {
    let my_path = match client
        .create_ephemeral_sequential(&election_root, candidate_id.clone().into_bytes())
        .await
    {
        Ok(path) => path,
        Err(err) => {
            let _ = status_tx
                .send(Status {
                    candidate_id,
                    role: Role::Follower,
                    following: None,
                    err: Some(err.into()),
                })
                .await;
            return;
        }
    };
    let znode = basename(&my_path).to_string();
    info!(candidate_id, znode, "nominated for election");

    loop {
        let resolved = find_leader(&client, &election_root, &my_path, &znode).await;
        let (role, following, watch_path) = match resolved {
            Ok(v) => v,
            Err(err) => {
                let _ = status_tx
                    .send(Status {
                        candidate_id,
                        role: Role::Follower,
                        following: None,
                        err: Some(err),
                    })
                    .await;
                break;
            }
        };

        let (exists, watch) = match client.exists_watch(&watch_path).await {
            Ok(v) => v,
            Err(err) => {
                let _ = status_tx
                    .send(Status {
                        candidate_id,
                        role,
                        following,
                        err: Some(err.into()),
                    })
                    .await;
                break;
            }
        };
        if !exists {
            // raced with a delete between listing children and watching; retry
            continue;
        }

        if role == Role::Leader {
            info!(candidate_id, znode, "elected leader");
        } else {
            info!(candidate_id, znode, following = ?following, "following predecessor");
        }

        if status_tx
            .send(Status {
                candidate_id: candidate_id.clone(),
                role,
                following: following.clone(),
                err: None,
            })
            .await
            .is_err()
        {
            break;
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                if let Err(err) = client.delete(&my_path).await {
                    warn!(candidate_id, %err, "error deleting election node on resign");
                }
                break;
            }
            result = watch => {
                if result.is_err() {
                    break;
                }
                if watch_path == my_path {
                    let _ = status_tx
                        .send(Status {
                            candidate_id,
                            role,
                            following,
                            err: Some(ElectError::CoordinationLost),
                        })
                        .await;
                    break;
                }
                // predecessor deleted, loop back and re-resolve
            }
        }
    }
}

async fn find_leader<C: CoordinationClient>(
    client: &Arc<C>,
    election_root: &str,
    my_path: &str,
    my_znode: &str,
) -> ElectResult<(Role, Option<String>, String)> {
    let mut children = client.children(election_root).await.map_err(ElectError::from)?;
    if children.is_empty() {
        return Err(ElectError::NoChildren(election_root.to_string()));
    }
    children.sort();

    if children[0] == my_znode {
        return Ok((Role::Leader, None, my_path.to_string()));
    }

    let my_index = children
        .iter()
        .position(|c| c == my_znode)
        .ok_or_else(|| ElectError::NodeMissing(my_znode.to_string()))?;

    let predecessor = children[my_index - 1].clone();
    let watch_path = format!("{}/{}", election_root.trim_end_matches('/'), predecessor);
    Ok((Role::Follower, Some(predecessor), watch_path))
}

use prio_coordination::{CoordError, CoordinationClient, InMemoryClient};

#[tokio::test]
async fn ensure_persistent_is_idempotent() {
    let client = InMemoryClient::new();
    client.ensure_persistent("/ns").await.unwrap();
    client.ensure_persistent("/ns").await.unwrap();
    assert_eq!(client.children("/").await.unwrap(), vec!["ns".to_string()]);
}

#[tokio::test]
async fn create_ephemeral_rejects_duplicates() {
    let client = InMemoryClient::new();
    client.create_ephemeral("/lock", vec![]).await.unwrap();
    let err = client.create_ephemeral("/lock", vec![]).await.unwrap_err();
    assert!(matches!(err, CoordError::NodeExists(path) if path == "/lock"));
}

#[tokio::test]
async fn sequential_children_get_increasing_suffixes() {
    let client = InMemoryClient::new();
    client.ensure_persistent("/election").await.unwrap();

    let first = client
        .create_ephemeral_sequential("/election", b"a".to_vec())
        .await
        .unwrap();
    let second = client
        .create_ephemeral_sequential("/election", b"b".to_vec())
        .await
        .unwrap();

    assert_ne!(first, second);
    assert!(first < second);

    let mut children = client.children("/election").await.unwrap();
    children.sort();
    assert_eq!(children.len(), 2);
}

#[tokio::test]
async fn exists_watch_fires_once_on_delete() {
    let client = InMemoryClient::new();
    client.create_ephemeral("/node", vec![]).await.unwrap();

    let (existed, watch) = client.exists_watch("/node").await.unwrap();
    assert!(existed);

    client.delete("/node").await.unwrap();
    watch.await.expect("watch should fire on delete");
}

#[tokio::test]
async fn children_watch_fires_once_on_new_child() {
    let client = InMemoryClient::new();
    client.ensure_persistent("/members").await.unwrap();

    let (children, watch) = client.children_watch("/members").await.unwrap();
    assert!(children.is_empty());

    client.create_ephemeral("/members/worker-1", vec![]).await.unwrap();
    watch.await.expect("watch should fire on new child");
}

#[tokio::test]
async fn get_set_round_trip() {
    let client = InMemoryClient::new();
    client.ensure_persistent("/partition").await.unwrap();
    client.set("/partition", b"payload".to_vec()).await.unwrap();
    assert_eq!(client.get("/partition").await.unwrap(), b"payload".to_vec());
}

#[tokio::test]
async fn operations_on_missing_nodes_fail() {
    let client = InMemoryClient::new();
    let err = client.get("/missing").await.unwrap_err();
    assert!(matches!(err, CoordError::NoNode(path) if path == "/missing"));
}

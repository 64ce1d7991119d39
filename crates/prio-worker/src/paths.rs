//! Znode path layout under a namespace root, mirroring the coordination
//! tree described for the worker: `/<ns>`, `/<ns>/election`,
//! `/<ns>/members`, `/<ns>/partition`.

pub fn namespace_root(namespace: &str) -> String {
    format!("/{namespace}")
}

pub fn election_root(namespace: &str) -> String {
    format!("/{namespace}/election")
}

pub fn members_root(namespace: &str) -> String {
    format!("/{namespace}/members")
}

pub fn member_path(namespace: &str, worker_id: &str) -> String {
    format!("/{namespace}/members/{worker_id}")
}

pub fn partition_path(namespace: &str) -> String {
    format!("/{namespace}/partition")
}

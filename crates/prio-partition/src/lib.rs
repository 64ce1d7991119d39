//! Deterministic assignment of topics to the members of a worker fleet.
//!
//! [`partition`] takes no state beyond its arguments, so every member can
//! run it independently and agree on the same assignment as long as they
//! see the same topic list and membership set — the leader is the only one
//! that actually calls it, but any member could.

use std::collections::{HashMap, HashSet};

/// Splits `topics` into `members.len()` contiguous, roughly equal shares and
/// assigns one share per member. Topics and members are sorted first so the
/// assignment only depends on their contents, not on iteration order.
///
/// The share size is `round(topics.len() / members.len())`; every member
/// except the last gets exactly that many topics, and the last member
/// absorbs whatever remains (which can be more, or fewer, than the even
/// share). Returns an empty map if either list is empty.
pub fn partition(topics: &[String], members: &[String]) -> HashMap<String, HashSet<String>> {
    let mut assignment = HashMap::new();
    if topics.is_empty() || members.is_empty() {
        return assignment;
    }

    let mut topics = topics.to_vec();
    topics.sort();
    let mut members = members.to_vec();
    members.sort();

    let topics_per_member = (topics.len() as f64 / members.len() as f64).round() as usize;

    let last = members.len() - 1;
    for (i, member) in members.iter().enumerate() {
        let share: HashSet<String> = if i == last {
            let start = (i * topics_per_member).min(topics.len());
            topics[start..].iter().cloned().collect()
        } else {
            let start = (i * topics_per_member).min(topics.len());
            let end = ((i + 1) * topics_per_member).min(topics.len());
            topics[start..end].iter().cloned().collect()
        };
        assignment.insert(member.clone(), share);
    }

    assignment
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn four_topics_two_members_split_evenly() {
        let topics = strings(&["a", "b", "c", "d"]);
        let members = strings(&["w1", "w2"]);
        let result = partition(&topics, &members);

        assert_eq!(result["w1"], strings(&["a", "b"]).into_iter().collect());
        assert_eq!(result["w2"], strings(&["c", "d"]).into_iter().collect());
    }

    #[test]
    fn four_topics_three_members_last_absorbs_remainder() {
        let topics = strings(&["a", "b", "c", "d"]);
        let members = strings(&["w1", "w2", "w3"]);
        let result = partition(&topics, &members);

        assert_eq!(result["w1"], strings(&["a"]).into_iter().collect());
        assert_eq!(result["w2"], strings(&["b"]).into_iter().collect());
        assert_eq!(result["w3"], strings(&["c", "d"]).into_iter().collect());
    }

    #[test]
    fn more_members_than_topics_leaves_some_empty() {
        let topics = strings(&["a", "b"]);
        let members = strings(&["w1", "w2", "w3"]);
        let result = partition(&topics, &members);

        assert_eq!(result.len(), 3);
        assert_eq!(result["w1"], strings(&["a"]).into_iter().collect());
        assert_eq!(result["w2"], strings(&["b"]).into_iter().collect());
        assert!(result["w3"].is_empty());
    }

    #[test]
    fn no_members_yields_empty_partition() {
        let topics = strings(&["a", "b"]);
        let members: Vec<String> = vec![];
        assert!(partition(&topics, &members).is_empty());
    }

    #[test]
    fn no_topics_yields_empty_partition() {
        let topics: Vec<String> = vec![];
        let members = strings(&["w1"]);
        assert!(partition(&topics, &members).is_empty());
    }

    #[test]
    fn every_topic_is_assigned_exactly_once() {
        let topics = strings(&["a", "b", "c", "d", "e", "f", "g"]);
        let members = strings(&["w1", "w2", "w3"]);
        let result = partition(&topics, &members);

        let mut seen: Vec<String> = result.values().flatten().cloned().collect();
        seen.sort();
        assert_eq!(seen, topics);
    }
}

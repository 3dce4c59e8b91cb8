// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test data generators for attack simulation.

use graphql_abuse_guard::tree::SelectionTree;
use std::net::{IpAddr, Ipv4Addr};

/// Generate a pool of client identities (private-range addresses) for testing.
pub fn generate_clients(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            // Use 10.x.x.x private range
            let a = ((i >> 16) & 0xFF) as u8;
            let b = ((i >> 8) & 0xFF) as u8;
            let c = (i & 0xFF) as u8;
            IpAddr::V4(Ipv4Addr::new(10, a, b, c)).to_string()
        })
        .collect()
}

/// `{ user { id name } }`
pub fn benign_query() -> SelectionTree {
    let mut tree = SelectionTree::new();
    let root = tree.root();
    let user = tree.add_field(root, "user");
    tree.add_field(user, "id");
    tree.add_field(user, "name");
    tree
}

/// `user { friends { friends { ... } } }` with `depth` levels in total.
pub fn friends_chain(depth: usize) -> SelectionTree {
    let mut tree = SelectionTree::new();
    let mut parent = tree.root();
    for level in 0..depth {
        parent = tree.add_field(parent, if level == 0 { "user" } else { "friends" });
    }
    tree
}

/// `{ a0: field a1: field ... }` with `copies` aliased root selections.
pub fn alias_amplification(field: &str, copies: usize) -> SelectionTree {
    let mut tree = SelectionTree::new();
    let root = tree.root();
    for i in 0..copies {
        tree.add_aliased_field(root, format!("a{}", i), field);
    }
    tree
}

/// `{ user { password password ... } }` with `count` password selections.
pub fn sensitive_harvest(count: usize) -> SelectionTree {
    let mut tree = SelectionTree::new();
    let root = tree.root();
    let user = tree.add_field(root, "user");
    for _ in 0..count {
        tree.add_field(user, "password");
    }
    tree
}

/// `{ user { f0 f1 ... } }` with `count` distinct scalar fields.
pub fn field_flood(count: usize) -> SelectionTree {
    let mut tree = SelectionTree::new();
    let root = tree.root();
    let user = tree.add_field(root, "user");
    for i in 0..count {
        tree.add_field(user, format!("f{}", i));
    }
    tree
}

/// `{ friends { friends { ... } } }` in wire form, `depth` levels deep.
pub fn nested_friends_document(depth: usize) -> String {
    format!(
        r#"{{"selections":{}[]{}}}"#,
        r#"[{"name":"friends","selections":"#.repeat(depth),
        "}]".repeat(depth)
    )
}

/// Wire-format documents the upstream parser could emit for abusive queries.
pub fn generate_malicious_documents() -> Vec<(&'static str, SelectionTree)> {
    let raw = [
        (
            "deep recursion",
            r#"{"selections":[{"name":"user","selections":[{"name":"friends","selections":[
                {"name":"friends","selections":[{"name":"friends","selections":[
                {"name":"friends","selections":[{"name":"friends","selections":[
                {"name":"name"}]}]}]}]}]}]}]}"#,
        ),
        (
            "alias amplification",
            r#"{"selections":[
                {"name":"systemUpdate","alias":"a"},{"name":"systemUpdate","alias":"b"},
                {"name":"systemUpdate","alias":"c"},{"name":"systemUpdate","alias":"d"},
                {"name":"systemUpdate","alias":"e"}]}"#,
        ),
        (
            "credential harvest",
            r#"{"selections":[{"name":"users","selections":[
                {"name":"password"},{"name":"friends","selections":[
                {"name":"password"},{"name":"friends","selections":[{"name":"password"}]}]}]}]}"#,
        ),
        (
            "root flood",
            r#"{"selections":[
                {"name":"q0"},{"name":"q1"},{"name":"q2"},{"name":"q3"},{"name":"q4"},{"name":"q5"},
                {"name":"q6"},{"name":"q7"},{"name":"q8"},{"name":"q9"},{"name":"q10"}]}"#,
        ),
    ];

    raw.into_iter()
        .map(|(label, json)| {
            let tree = SelectionTree::from_json(json)
                .unwrap_or_else(|e| panic!("{} document should decode: {}", label, e));
            (label, tree)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_clients() {
        let clients = generate_clients(256);
        assert_eq!(clients.len(), 256);
        // All should be unique
        let unique: std::collections::HashSet<_> = clients.iter().collect();
        assert_eq!(unique.len(), 256);
        assert_eq!(clients[1], "10.0.0.1");
    }

    #[test]
    fn test_shapes() {
        assert_eq!(friends_chain(8).field_count(), 8);
        assert_eq!(alias_amplification("systemUpdate", 5).root_fields().len(), 5);
        assert_eq!(sensitive_harvest(9).field_count(), 10);
        assert_eq!(field_flood(200).field_count(), 201);
    }

    #[test]
    fn test_malicious_documents_decode() {
        assert_eq!(generate_malicious_documents().len(), 4);
    }

    #[test]
    fn test_nested_friends_document() {
        let tree = SelectionTree::from_json(&nested_friends_document(70)).unwrap();
        assert_eq!(tree.field_count(), 70);
    }
}

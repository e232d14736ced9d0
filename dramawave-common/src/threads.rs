//! Comment thread building
//!
//! Turns the flat comment set of one content item into an ordered forest.
//! Comments attach to their direct parent; a comment whose parent is missing
//! becomes top-level. Top-level threads are newest first, replies oldest
//! first, and equal timestamps fall back to push-key order.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::models::Comment;

/// A comment with its direct replies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadNode {
    #[serde(flatten)]
    pub comment: Comment,
    pub replies: Vec<ThreadNode>,
}

impl ThreadNode {
    fn leaf(comment: Comment) -> Self {
        Self {
            comment,
            replies: Vec::new(),
        }
    }
}

/// Oldest first, push key breaking ties
fn chronological(a: &Comment, b: &Comment) -> Ordering {
    a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id))
}

/// Newest first, push key (ascending) breaking ties
fn newest_first(a: &Comment, b: &Comment) -> Ordering {
    b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id))
}

/// Build the comment forest for one content item
///
/// Every input comment (after dropping duplicate ids, first one wins)
/// appears exactly once in the output. Self-parented comments and parent
/// cycles cannot reach a root, so the earliest comment of each such cycle
/// is promoted to top level.
pub fn build_threads(comments: Vec<Comment>) -> Vec<ThreadNode> {
    let mut seen = HashSet::new();
    let mut nodes: Vec<Option<Comment>> = Vec::with_capacity(comments.len());
    for comment in comments {
        if seen.insert(comment.id.clone()) {
            nodes.push(Some(comment));
        }
    }
    let n = nodes.len();

    let mut parent: Vec<Option<usize>> = {
        let index: HashMap<&str, usize> = nodes
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.as_ref().map(|c| (c.id.as_str(), i)))
            .collect();

        nodes
            .iter()
            .enumerate()
            .map(|(i, c)| {
                c.as_ref()
                    .and_then(|c| c.parent_id.as_deref())
                    .and_then(|pid| index.get(pid).copied())
                    .filter(|&p| p != i)
            })
            .collect()
    };

    break_cycles(&nodes, &mut parent);

    let mut roots = Vec::new();
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (i, p) in parent.iter().enumerate() {
        match p {
            Some(p) => children[*p].push(i),
            None => roots.push(i),
        }
    }

    sort_indices(&mut roots, &nodes, newest_first);
    for list in children.iter_mut() {
        sort_indices(list, &nodes, chronological);
    }

    // Pre-order walk; building in reverse guarantees children exist before
    // their parent is assembled.
    let mut order = Vec::with_capacity(n);
    let mut stack: Vec<usize> = roots.iter().rev().copied().collect();
    while let Some(i) = stack.pop() {
        order.push(i);
        stack.extend(children[i].iter().rev().copied());
    }

    let mut built: Vec<Option<ThreadNode>> = (0..n).map(|_| None).collect();
    for &i in order.iter().rev() {
        let Some(comment) = nodes[i].take() else {
            continue;
        };
        let replies = children[i]
            .iter()
            .filter_map(|&c| built[c].take())
            .collect();
        built[i] = Some(ThreadNode { comment, replies });
    }

    roots.iter().filter_map(|&r| built[r].take()).collect()
}

fn sort_indices(
    list: &mut [usize],
    nodes: &[Option<Comment>],
    cmp: fn(&Comment, &Comment) -> Ordering,
) {
    list.sort_by(|&a, &b| match (nodes[a].as_ref(), nodes[b].as_ref()) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => Ordering::Equal,
    });
}

/// Detach one member of every parent cycle so all chains end at a root
fn break_cycles(nodes: &[Option<Comment>], parent: &mut [Option<usize>]) {
    const UNKNOWN: u8 = 0;
    const ROOTED: u8 = 1;

    let n = parent.len();
    let mut state = vec![UNKNOWN; n];
    let mut walk_of = vec![usize::MAX; n];
    let mut pos_in_walk = vec![0usize; n];

    for start in 0..n {
        if state[start] == ROOTED {
            continue;
        }

        let mut path: Vec<usize> = Vec::new();
        let mut cur = start;
        loop {
            if state[cur] == ROOTED {
                break;
            }
            if walk_of[cur] == start {
                let cycle = &path[pos_in_walk[cur]..];
                let earliest = cycle.iter().copied().min_by(|&a, &b| {
                    match (nodes[a].as_ref(), nodes[b].as_ref()) {
                        (Some(a), Some(b)) => chronological(a, b),
                        _ => a.cmp(&b),
                    }
                });
                if let Some(m) = earliest {
                    parent[m] = None;
                }
                break;
            }

            walk_of[cur] = start;
            pos_in_walk[cur] = path.len();
            path.push(cur);

            match parent[cur] {
                Some(p) => cur = p,
                None => break,
            }
        }

        for i in path {
            state[i] = ROOTED;
        }
    }
}

/// Upper bound on nested reply levels in a projected forest
///
/// Serializing and dropping a `ThreadNode` recurse once per level, so the
/// projection never nests deeper than this.
pub const MAX_DISPLAY_DEPTH: usize = 32;

/// Project a forest for display
///
/// Threads keep `display_depth` levels of nested replies below each
/// top-level comment, clamped to `1..=MAX_DISPLAY_DEPTH`. Replies deeper
/// than that are flattened, oldest first, into the reply list of their
/// ancestor at the last displayed level. Parent links on the comments are
/// untouched.
pub fn collapse_threads(threads: Vec<ThreadNode>, display_depth: usize) -> Vec<ThreadNode> {
    let depth = display_depth.clamp(1, MAX_DISPLAY_DEPTH);
    threads
        .into_iter()
        .map(|node| collapse_node(node, 0, depth))
        .collect()
}

fn collapse_node(mut node: ThreadNode, level: usize, depth: usize) -> ThreadNode {
    if level < depth {
        node.replies = node
            .replies
            .into_iter()
            .map(|child| collapse_node(child, level + 1, depth))
            .collect();
        return node;
    }

    let mut flat = Vec::new();
    let mut stack = std::mem::take(&mut node.replies);
    while let Some(mut descendant) = stack.pop() {
        stack.append(&mut descendant.replies);
        flat.push(ThreadNode::leaf(descendant.comment));
    }
    flat.sort_by(|a, b| chronological(&a.comment, &b.comment));
    node.replies = flat;
    node
}

/// Total number of comments in a forest
pub fn count_nodes(threads: &[ThreadNode]) -> usize {
    let mut count = 0;
    let mut stack: Vec<&ThreadNode> = threads.iter().collect();
    while let Some(node) = stack.pop() {
        count += 1;
        stack.extend(node.replies.iter());
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CommentBody;

    fn comment(id: &str, ts: i64, parent: Option<&str>) -> Comment {
        Comment {
            id: id.to_string(),
            content_id: "c1".to_string(),
            author_id: "u1".to_string(),
            author_name: "User".to_string(),
            author_avatar: String::new(),
            timestamp: ts,
            body: CommentBody::Text(format!("comment {}", id)),
            parent_id: parent.map(str::to_string),
        }
    }

    fn ids(nodes: &[ThreadNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.comment.id.as_str()).collect()
    }

    fn all_ids(threads: &[ThreadNode]) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack: Vec<&ThreadNode> = threads.iter().collect();
        while let Some(node) = stack.pop() {
            out.push(node.comment.id.clone());
            stack.extend(node.replies.iter());
        }
        out.sort();
        out
    }

    #[test]
    fn test_empty_input() {
        assert!(build_threads(Vec::new()).is_empty());
    }

    #[test]
    fn test_top_level_newest_first_replies_oldest_first() {
        let threads = build_threads(vec![
            comment("a", 100, None),
            comment("b", 300, None),
            comment("r2", 250, Some("a")),
            comment("r1", 150, Some("a")),
            comment("c", 200, None),
        ]);

        assert_eq!(ids(&threads), vec!["b", "c", "a"]);
        let a = &threads[2];
        assert_eq!(ids(&a.replies), vec!["r1", "r2"]);
    }

    #[test]
    fn test_timestamp_ties_use_key_order() {
        let threads = build_threads(vec![
            comment("k2", 100, None),
            comment("k1", 100, None),
            comment("r2", 200, Some("k1")),
            comment("r1", 200, Some("k1")),
        ]);

        assert_eq!(ids(&threads), vec!["k1", "k2"]);
        assert_eq!(ids(&threads[0].replies), vec!["r1", "r2"]);
    }

    #[test]
    fn test_orphan_becomes_top_level() {
        let threads = build_threads(vec![
            comment("a", 100, None),
            comment("orphan", 200, Some("deleted")),
        ]);

        assert_eq!(ids(&threads), vec!["orphan", "a"]);
        assert!(threads.iter().all(|t| t.replies.is_empty()));
    }

    #[test]
    fn test_nested_replies_attach_to_direct_parent() {
        let threads = build_threads(vec![
            comment("root", 1, None),
            comment("child", 2, Some("root")),
            comment("grandchild", 3, Some("child")),
        ]);

        assert_eq!(threads.len(), 1);
        let child = &threads[0].replies[0];
        assert_eq!(child.comment.id, "child");
        assert_eq!(ids(&child.replies), vec!["grandchild"]);
    }

    #[test]
    fn test_self_parent_is_top_level() {
        let threads = build_threads(vec![comment("self", 5, Some("self"))]);
        assert_eq!(ids(&threads), vec!["self"]);
    }

    #[test]
    fn test_cycle_promotes_earliest_member() {
        let threads = build_threads(vec![
            comment("x", 30, Some("y")),
            comment("y", 20, Some("z")),
            comment("z", 10, Some("x")),
            comment("tail", 40, Some("x")),
        ]);

        assert_eq!(ids(&threads), vec!["z"]);
        assert_eq!(count_nodes(&threads), 4);
        assert_eq!(all_ids(&threads), vec!["tail", "x", "y", "z"]);
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let threads = build_threads(vec![comment("a", 1, None), comment("a", 99, None)]);
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].comment.timestamp, 1);
    }

    #[test]
    fn test_every_comment_appears_once() {
        let mut input = Vec::new();
        for i in 0..200i64 {
            let parent = match i % 4 {
                0 => None,
                1 => Some(format!("n{:03}", i - 1)),
                2 => Some(format!("n{:03}", (i * 7) % 200)),
                _ => Some("missing".to_string()),
            };
            input.push(Comment {
                parent_id: parent,
                ..comment(&format!("n{:03}", i), i % 17, None)
            });
        }

        let threads = build_threads(input);
        assert_eq!(count_nodes(&threads), 200);
        let ids = all_ids(&threads);
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), 200);
    }

    #[test]
    fn test_deep_chain_does_not_overflow() {
        let mut input = vec![comment("n0", 0, None)];
        for i in 1..5_000i64 {
            input.push(comment(&format!("n{}", i), i, Some(&format!("n{}", i - 1))));
        }
        let threads = build_threads(input);
        assert_eq!(threads.len(), 1);
        assert_eq!(count_nodes(&threads), 5_000);

        let collapsed = collapse_threads(threads, 1);
        assert_eq!(collapsed[0].replies.len(), 1);
        assert_eq!(collapsed[0].replies[0].replies.len(), 4_998);
    }

    /// Nested levels below `node`, following the first reply
    fn nesting(node: &ThreadNode) -> usize {
        let mut levels = 0;
        let mut current = node;
        while let Some(first) = current.replies.first() {
            levels += 1;
            current = first;
        }
        levels
    }

    #[test]
    fn test_unbounded_display_depth_is_clamped() {
        let mut input = vec![comment("n0", 0, None)];
        for i in 1..20_000i64 {
            input.push(comment(&format!("n{}", i), i, Some(&format!("n{}", i - 1))));
        }
        let threads = build_threads(input);

        let collapsed = collapse_threads(threads, usize::MAX);
        assert_eq!(collapsed.len(), 1);
        assert_eq!(count_nodes(&collapsed), 20_000);
        // MAX_DISPLAY_DEPTH nested levels, plus the flattened leaves
        assert_eq!(nesting(&collapsed[0]), MAX_DISPLAY_DEPTH + 1);

        let json = serde_json::to_string(&collapsed).unwrap();
        assert!(json.contains("\"n19999\""));
    }

    #[test]
    fn test_collapse_flattens_below_display_depth() {
        let threads = build_threads(vec![
            comment("root", 1, None),
            comment("reply", 2, Some("root")),
            comment("deep2", 5, Some("reply")),
            comment("deep3", 3, Some("deep2")),
            comment("deep3b", 4, Some("deep2")),
        ]);

        let collapsed = collapse_threads(threads.clone(), 1);
        let reply = &collapsed[0].replies[0];
        assert_eq!(reply.comment.id, "reply");
        assert_eq!(ids(&reply.replies), vec!["deep3", "deep3b", "deep2"]);
        assert!(reply.replies.iter().all(|r| r.replies.is_empty()));
        // parent links survive the projection
        assert_eq!(reply.replies[0].comment.parent_id.as_deref(), Some("deep2"));

        let deeper = collapse_threads(threads, 2);
        let deep2 = &deeper[0].replies[0].replies[0];
        assert_eq!(deep2.comment.id, "deep2");
        assert_eq!(ids(&deep2.replies), vec!["deep3", "deep3b"]);
    }

    #[test]
    fn test_collapse_depth_zero_is_clamped() {
        let threads = build_threads(vec![
            comment("root", 1, None),
            comment("reply", 2, Some("root")),
            comment("deep", 3, Some("reply")),
        ]);
        assert_eq!(collapse_threads(threads.clone(), 0), collapse_threads(threads, 1));
    }

    #[test]
    fn test_thread_node_serializes_flat_comment() {
        let threads = build_threads(vec![comment("a", 1, None)]);
        let json = serde_json::to_value(&threads[0]).unwrap();
        assert_eq!(json["id"], "a");
        assert!(json["replies"].as_array().unwrap().is_empty());
    }
}

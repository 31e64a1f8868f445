//! Cycle detection over the resource graph.
//!
//! Depth-first search with an explicit recursion stack. A back edge to a
//! node still on the stack closes a cycle: the stack slice from that node to
//! the current one, plus the repeated node. Cycles reached from several DFS
//! roots are reported once, keyed by their sorted node-id set.

use std::collections::{BTreeSet, HashSet};

use crate::graph::ResourceGraph;

struct Frame<'a> {
    successors: Vec<&'a str>,
    next: usize,
}

/// Find dependency cycles, each as a closed list of node ids `[a, b, .., a]`.
pub fn find_cycles(graph: &ResourceGraph) -> Vec<Vec<String>> {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut on_stack: HashSet<&str> = HashSet::new();
    let mut seen_sets: HashSet<BTreeSet<&str>> = HashSet::new();
    let mut cycles: Vec<Vec<String>> = Vec::new();

    for start in graph.get_nodes() {
        let start = start.id.as_str();
        if visited.contains(start) {
            continue;
        }

        let mut path: Vec<&str> = vec![start];
        let mut stack: Vec<Frame> = vec![Frame {
            successors: graph.successor_ids(start),
            next: 0,
        }];
        visited.insert(start);
        on_stack.insert(start);

        while let Some(frame) = stack.last_mut() {
            if frame.next < frame.successors.len() {
                let next = frame.successors[frame.next];
                frame.next += 1;

                if on_stack.contains(next) {
                    if let Some(pos) = path.iter().position(|&id| id == next) {
                        let members: BTreeSet<&str> = path[pos..].iter().copied().collect();
                        if seen_sets.insert(members) {
                            let mut cycle: Vec<String> =
                                path[pos..].iter().map(|s| s.to_string()).collect();
                            cycle.push(next.to_string());
                            cycles.push(cycle);
                        }
                    }
                } else if !visited.contains(next) {
                    visited.insert(next);
                    on_stack.insert(next);
                    path.push(next);
                    stack.push(Frame {
                        successors: graph.successor_ids(next),
                        next: 0,
                    });
                }
            } else {
                stack.pop();
                if let Some(done) = path.pop() {
                    on_stack.remove(done);
                }
            }
        }
    }

    cycles
}

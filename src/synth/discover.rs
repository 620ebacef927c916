//! Candidate discovery in the selection subtree.
//!
//! Depth-first, pre-order, selection order as the outer loop. Only instance
//! nodes whose display name matches are collected. Candidates whose property
//! map cannot be read are dropped (detached component references); the
//! survivors are indexed in order.

use log::{debug, warn};

use crate::entities::{Element, NodeId, NodeKind};
use crate::host::{HostError, SceneHost};

/// Result of one discovery pass.
#[derive(Debug, Default)]
pub struct Discovery {
    pub elements: Vec<Element>,
    /// Matching instances dropped by the validity filter
    pub excluded: Vec<(NodeId, HostError)>,
}

/// Matching instance ids under the current selection, pre-order.
pub fn collect_instances<H: SceneHost + ?Sized>(host: &H, name: &str) -> Vec<NodeId> {
    let mut found = Vec::new();
    for root in host.selection() {
        // Explicit stack, children pushed reversed to keep pre-order
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let node = match host.node(&id) {
                Ok(node) => node,
                Err(e) => {
                    warn!("Skipping unreadable node {}: {}", id, e);
                    continue;
                }
            };
            if node.kind == NodeKind::Instance && node.name == name {
                found.push(node.id.clone());
            }
            stack.extend(node.children.into_iter().rev());
        }
    }
    found
}

/// Discover and validate candidates named `name`.
pub fn discover<H: SceneHost + ?Sized>(host: &H, name: &str) -> Discovery {
    let mut discovery = Discovery::default();

    for id in collect_instances(host, name) {
        match host.properties(&id) {
            Ok(properties) => {
                let index = discovery.elements.len();
                debug!("Candidate #{} {} ({} properties)", index, id, properties.len());
                discovery.elements.push(Element {
                    id,
                    name: name.to_string(),
                    index,
                    properties,
                });
            }
            Err(e) => {
                if e.is_structural() {
                    debug!("Excluding broken instance {}: {}", id, e);
                } else {
                    warn!("Excluding instance {}: {}", id, e);
                }
                discovery.excluded.push((id, e));
            }
        }
    }
    discovery
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::PropValue;
    use crate::host::MemoryHost;

    fn scene() -> MemoryHost {
        let mut host = MemoryHost::new();
        let a = host.add_frame(None, "A", "Row A");
        host.add_instance(Some(&a), "a1", "Tab", "c", &[("State", PropValue::Str("Idle".into()))]);
        let nested = host.add_frame(Some(&a), "a2", "Group");
        host.add_instance(Some(&nested), "a2.1", "Tab", "c", &[]);
        host.add_instance(Some(&a), "a3", "Tab", "c", &[]);
        host.add_instance(Some(&a), "a4", "Icon", "c", &[]);
        let b = host.add_frame(None, "B", "Row B");
        host.add_instance(Some(&b), "b1", "Tab", "c", &[]);
        // A frame that happens to share the name is not an instance
        host.add_frame(Some(&b), "b2", "Tab");
        host.select(&[&b, &a]);
        host
    }

    #[test]
    fn test_preorder_selection_order() {
        let host = scene();
        let ids: Vec<String> = collect_instances(&host, "Tab").iter().map(|i| i.to_string()).collect();
        assert_eq!(ids, vec!["b1", "a1", "a2.1", "a3"]);
    }

    #[test]
    fn test_selected_instance_itself_matches() {
        let mut host = scene();
        let a1 = NodeId::from("a1");
        host.select(&[&a1]);
        assert_eq!(collect_instances(&host, "Tab"), vec![a1]);
    }

    #[test]
    fn test_broken_candidates_excluded_and_reindexed() {
        let mut host = scene();
        host.mark_broken(&NodeId::from("a1"));
        let d = discover(&host, "Tab");
        assert_eq!(d.excluded.len(), 1);
        assert!(d.excluded[0].1.is_structural());

        let idx: Vec<(usize, &str)> = d.elements.iter().map(|e| (e.index, e.id.as_str())).collect();
        assert_eq!(idx, vec![(0, "b1"), (1, "a2.1"), (2, "a3")]);
    }

    #[test]
    fn test_empty_selection() {
        let mut host = scene();
        host.select(&[]);
        let d = discover(&host, "Tab");
        assert!(d.elements.is_empty());
        assert!(d.excluded.is_empty());
    }
}

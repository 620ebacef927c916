//! Destination frame: one top-level `"{name} State Machine"` frame per
//! candidate name on the current page, found by name before creating.

use log::{debug, info};

use crate::entities::NodeId;
use crate::entities::keys::FRAME_SUFFIX;
use crate::host::{HostResult, SceneHost};

pub fn destination_frame_name(candidate_name: &str) -> String {
    format!("{candidate_name}{FRAME_SUFFIX}")
}

/// Find the destination frame among the page's top-level nodes, creating it
/// on first use.
pub fn ensure_destination_frame<H: SceneHost + ?Sized>(host: &mut H, candidate_name: &str) -> HostResult<NodeId> {
    let name = destination_frame_name(candidate_name);
    for id in host.page()? {
        match host.node(&id) {
            Ok(node) if node.name == name => {
                debug!("Reusing destination frame {} ({})", name, id);
                return Ok(id);
            }
            Ok(_) => {}
            Err(e) => debug!("Skipping unreadable page node {}: {}", id, e),
        }
    }
    let id = host.create_frame(None, &name)?;
    info!("Created destination frame {} ({})", name, id);
    Ok(id)
}

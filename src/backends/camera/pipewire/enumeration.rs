// SPDX-License-Identifier: GPL-3.0-only

//! PipeWire camera enumeration
//!
//! Cameras are discovered by parsing `pw-cli ls Node`. The libcamera location
//! property is not part of that listing, so it is looked up per node with
//! `pw-cli info` and, failing that, guessed from the node description.

use super::super::types::{CameraDevice, CameraLocation};
use tracing::{debug, info};

/// Enumerate cameras known to PipeWire
///
/// Returns an empty list when `pw-cli` is missing or lists no video sources.
pub fn enumerate_pipewire_cameras() -> Vec<CameraDevice> {
    let output = match std::process::Command::new("pw-cli")
        .args(["ls", "Node"])
        .output()
    {
        Ok(output) if output.status.success() => output,
        Ok(_) => {
            debug!("pw-cli command failed");
            return Vec::new();
        }
        Err(e) => {
            debug!(error = %e, "pw-cli not available");
            return Vec::new();
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    let cameras: Vec<CameraDevice> = parse_pw_cli_nodes(&stdout)
        .into_iter()
        .map(|node| node.resolve_location(query_node_location))
        .collect();

    info!(count = cameras.len(), "Enumerated PipeWire cameras");
    cameras
}

/// A video source node from `pw-cli ls Node`
///
/// The node ID is kept apart from the device path: paths prefer the stable
/// `object.serial`, while `pw-cli info` only accepts the node ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipeWireNode {
    pub node_id: String,
    pub device: CameraDevice,
}

impl PipeWireNode {
    /// Fill in an unknown location from node info, then from the name
    fn resolve_location(mut self, query: impl FnOnce(&str) -> CameraLocation) -> CameraDevice {
        if self.device.location == CameraLocation::Unknown {
            self.device.location = query(&self.node_id);
        }
        if self.device.location == CameraLocation::Unknown {
            self.device.location = CameraLocation::guess_from_name(&self.device.name);
        }
        self.device
    }
}

/// A node block being accumulated while parsing
#[derive(Default)]
struct NodeBlock {
    id: Option<String>,
    serial: Option<String>,
    name: Option<String>,
    location: Option<String>,
    is_video_source: bool,
}

impl NodeBlock {
    fn into_node(self) -> Option<PipeWireNode> {
        if !self.is_video_source {
            return None;
        }
        let id = self.id?;
        let name = self.name?;

        // object.serial is stable across restarts, node IDs are not
        let path = match self.serial {
            Some(serial) => format!("pipewire-serial-{}", serial),
            None => format!("pipewire-{}", id),
        };
        let location = self
            .location
            .as_deref()
            .map(CameraLocation::from_property)
            .unwrap_or_default();

        debug!(id = %id, name = %name, path = %path, location = %location, "Found video camera");
        Some(PipeWireNode {
            node_id: id,
            device: CameraDevice {
                name,
                path,
                location,
            },
        })
    }
}

/// Parse the output of `pw-cli ls Node` into video source nodes
pub fn parse_pw_cli_nodes(output: &str) -> Vec<PipeWireNode> {
    let mut cameras = Vec::new();
    let mut current = NodeBlock::default();

    for line in output.lines() {
        let trimmed = line.trim();

        // "id 76, type PipeWire:Interface:Node/3" starts a new block
        if let Some(rest) = trimmed.strip_prefix("id ")
            && trimmed.contains("type PipeWire:Interface:Node")
        {
            cameras.extend(std::mem::take(&mut current).into_node());
            current.id = rest.split(',').next().map(|id| id.trim().to_string());
            continue;
        }

        let Some((key, _)) = trimmed.split_once('=') else {
            continue;
        };
        let value = extract_quoted_value(trimmed);

        match key.trim_start_matches('*').trim() {
            "media.class" => {
                current.is_video_source = value.as_deref() == Some("Video/Source");
            }
            "object.serial" => current.serial = value,
            "node.description" => current.name = value,
            "api.libcamera.location" => current.location = value,
            _ => {}
        }
    }

    cameras.extend(current.into_node());
    cameras
}

/// Extract quoted value from a property line (e.g., 'property = "value"' -> "value")
fn extract_quoted_value(line: &str) -> Option<String> {
    let start = line.find('"')?;
    let end = line[start + 1..].find('"')?;
    Some(line[start + 1..start + 1 + end].to_string())
}

/// Look up `api.libcamera.location` for a node
fn query_node_location(node_id: &str) -> CameraLocation {
    let output = match std::process::Command::new("pw-cli")
        .args(["info", node_id])
        .output()
    {
        Ok(output) if output.status.success() => output,
        _ => {
            debug!(node_id, "Failed to query node info for location");
            return CameraLocation::Unknown;
        }
    };

    parse_location_from_info(&String::from_utf8_lossy(&output.stdout))
}

fn parse_location_from_info(output: &str) -> CameraLocation {
    output
        .lines()
        .map(str::trim)
        .find(|line| line.contains("api.libcamera.location"))
        .and_then(extract_quoted_value)
        .map(|value| CameraLocation::from_property(&value))
        .unwrap_or_default()
}

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Optional decoration for a replay row. Every field is independently
/// absent or present; a fully empty value is as valid as a full one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayMeta {
    pub date: Option<String>,
    pub player: Option<String>,
    pub vehicle: Option<String>,
    pub map: Option<String>,
}

impl ReplayMeta {
    pub fn is_empty(&self) -> bool {
        self.date.is_none() && self.player.is_none() && self.vehicle.is_none() && self.map.is_none()
    }

    pub fn present_fields(&self) -> impl Iterator<Item = &str> {
        [&self.date, &self.player, &self.vehicle, &self.map]
            .into_iter()
            .flatten()
            .map(String::as_str)
    }
}

/// Best-effort decoration seam. Implementations must swallow malformed
/// input and answer `None`; decoration never affects identity or ordering.
pub trait MetadataSource {
    fn enrich(&self, path: &Path) -> Option<ReplayMeta>;
}

/// Null decorator for headless scans and tests.
pub struct NoMetadata;

impl MetadataSource for NoMetadata {
    fn enrich(&self, _path: &Path) -> Option<ReplayMeta> {
        None
    }
}

/// Reads the JSON block a `.wotreplay` container embeds after its 8-byte
/// preamble (4 magic bytes, then a little-endian block count, then a
/// length-prefixed JSON payload).
pub struct WotHeaderSource;

const PREAMBLE_LEN: usize = 8;
const MAX_BLOCK_COUNT: u32 = 8;
const MAX_BLOCK_LEN: u32 = 8 * 1024 * 1024;

impl MetadataSource for WotHeaderSource {
    fn enrich(&self, path: &Path) -> Option<ReplayMeta> {
        let block = read_first_block(path)?;
        let value: serde_json::Value = serde_json::from_slice(&block).ok()?;

        let meta = ReplayMeta {
            date: string_field(&value, &["dateTime"]),
            player: string_field(&value, &["playerName"]),
            vehicle: string_field(&value, &["playerVehicle"]),
            map: string_field(&value, &["mapDisplayName", "mapName"]),
        };

        (!meta.is_empty()).then_some(meta)
    }
}

fn read_first_block(path: &Path) -> Option<Vec<u8>> {
    let mut file = File::open(path).ok()?;

    let mut preamble = [0u8; PREAMBLE_LEN];
    file.read_exact(&mut preamble).ok()?;
    let block_count = u32::from_le_bytes(preamble[4..8].try_into().ok()?);
    if block_count == 0 || block_count > MAX_BLOCK_COUNT {
        return None;
    }

    let mut len_bytes = [0u8; 4];
    file.read_exact(&mut len_bytes).ok()?;
    let len = u32::from_le_bytes(len_bytes);
    if len == 0 || len > MAX_BLOCK_LEN {
        return None;
    }

    let mut block = vec![0u8; len as usize];
    file.read_exact(&mut block).ok()?;
    Some(block)
}

fn string_field(value: &serde_json::Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        value
            .get(key)
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
    })
}

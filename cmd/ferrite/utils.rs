use ferrite_common::types::{Block, Genesis};
use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path};

/// A genesis description followed by the blocks to import on top of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainFile {
    pub genesis: Genesis,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

pub fn read_chain_file(path: &Path) -> eyre::Result<ChainFile> {
    let file = File::open(path)
        .map_err(|err| eyre::eyre!("Failed to open chain file {}: {err}", path.display()))?;
    let chain_file = serde_json::from_reader(BufReader::new(file))
        .map_err(|err| eyre::eyre!("Failed to decode chain file {}: {err}", path.display()))?;
    Ok(chain_file)
}

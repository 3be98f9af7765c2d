#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command as ProcCommand, Output};

use tempfile::TempDir;

/// The binary pointed at a scratch workspace, isolated from the caller's env.
pub fn base_cmd(workspace: &TempDir) -> ProcCommand {
    let mut command = ProcCommand::new(env!("CARGO_BIN_EXE_table-nft"));

    command
        .env("DOTENV_PATH", workspace.path().join("missing.env"))
        .env_remove("PRIVATE_KEY")
        .env_remove("TABLE_NFT_NETWORK")
        .env_remove("TABLE_NFT_LOG_FILE")
        .env_remove("TABLE_NFT_API_LISTEN")
        .env_remove("TABLELAND_BASE_URI")
        .arg("--network")
        .arg("local")
        .arg("--data-dir")
        .arg(workspace.path().join("state"))
        .arg("--metadata-dir")
        .arg(metadata_dir(workspace))
        .arg("--images-dir")
        .arg(workspace.path().join("images"));

    command
}

pub fn metadata_dir(workspace: &TempDir) -> PathBuf {
    workspace.path().join("metadata")
}

/// One descriptor and one image per id; every token gets a `color` trait.
pub fn write_fixtures(workspace: &TempDir, ids: &[u64]) {
    let images = workspace.path().join("images");
    std::fs::create_dir_all(metadata_dir(workspace)).expect("metadata dir");
    std::fs::create_dir_all(&images).expect("images dir");

    for id in ids {
        let descriptor = serde_json::json!({
            "name": format!("Token {id}"),
            "description": format!("Token number {id}"),
            "image": "",
            "attributes": [{"trait_type": "color", "value": "blue"}],
            "external_url": "https://example.org",
        });
        std::fs::write(
            metadata_dir(workspace).join(id.to_string()),
            descriptor.to_string(),
        )
        .expect("write descriptor");
        std::fs::write(images.join(format!("{id}.jpeg")), format!("jpeg-{id}"))
            .expect("write image");
    }
}

pub fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

pub fn read_descriptor(workspace: &TempDir, id: u64) -> serde_json::Value {
    let raw = std::fs::read(metadata_dir(workspace).join(id.to_string())).expect("read descriptor");
    serde_json::from_slice(&raw).expect("descriptor json")
}

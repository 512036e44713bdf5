use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Identity version document listing v2.0 and v3.14 under `base_url`
#[allow(dead_code)]
pub fn version_document(base_url: &str) -> serde_json::Value {
    serde_json::json!({
        "versions": {
            "values": [
                {
                    "id": "v3.14",
                    "status": "stable",
                    "links": [{"rel": "self", "href": format!("{}/v3/", base_url)}]
                },
                {
                    "id": "v2.0",
                    "status": "deprecated",
                    "links": [{"rel": "self", "href": format!("{}/v2.0/", base_url)}]
                }
            ]
        }
    })
}

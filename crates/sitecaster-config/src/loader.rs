// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::path::Path;

use anyhow::Context;

use crate::schema::PublishOptions;

/// Load [`PublishOptions`] from a YAML file.
///
/// A missing file is an error here — there is no safe default
/// `root`/`relays`/`servers` for a publish run, so the caller must supply a
/// real file or construct [`PublishOptions`] directly.
pub fn load(path: &Path) -> anyhow::Result<PublishOptions> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let options: PublishOptions =
        serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    tracing::info!(path = %path.display(), relays = options.relays.len(), servers = options.servers.len(), "loaded publish config");
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_minimal_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sitecaster.yaml");
        std::fs::write(
            &path,
            r#"
root: /tmp/site
relays:
  - wss://relay.example.com
servers:
  - https://blossom.example.com
"#,
        )
        .unwrap();

        let options = load(&path).unwrap();
        assert_eq!(options.relays, vec!["wss://relay.example.com".to_string()]);
        assert_eq!(options.servers, vec!["https://blossom.example.com".to_string()]);
        assert_eq!(options.concurrency, 4);
        assert!(!options.force);
        assert!(!options.purge);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.yaml");
        assert!(load(&path).is_err());
    }
}

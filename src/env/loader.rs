use std::{fs, io::Cursor, path::Path};

use anyhow::{Context, Result};

use crate::env::EnvMap;

/// Reads a dotenv-style file into a variable table. Later keys override
/// earlier ones.
pub fn load_env_file_sync(path: &Path) -> Result<EnvMap> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading env file {}", path.display()))?;

    let mut env = EnvMap::new();
    for item in dotenvy::from_read_iter(Cursor::new(content)) {
        let (key, value) = item.with_context(|| format!("parsing env file {}", path.display()))?;
        env.insert(key, value);
    }
    tracing::debug!(path = %path.display(), count = env.len(), "loaded env file");

    Ok(env)
}

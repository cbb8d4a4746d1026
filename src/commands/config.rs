// ABOUTME: `config set` and `config show` implementations.
// ABOUTME: Reads and rewrites config.yml in the state directory.

use scon::config::{Config, ConfigKey};
use scon::error::Result;
use scon::output::Output;
use scon::paths::StatePaths;

pub fn set(paths: &StatePaths, key: &str, value: &str, output: &Output) -> Result<()> {
    let path = paths.config();
    let mut config = Config::load(&path)?;
    let key = config.set(key, value)?;
    config.save(&path)?;

    output.success(&format!("{key} = {}", config.get(key)));
    Ok(())
}

pub fn show(paths: &StatePaths, output: &Output) -> Result<()> {
    let config = Config::load(&paths.config())?;
    let pairs: Vec<(&str, String)> = ConfigKey::ALL
        .iter()
        .map(|key| (key.as_str(), config.get(*key)))
        .collect();

    output.pairs(&pairs);
    Ok(())
}

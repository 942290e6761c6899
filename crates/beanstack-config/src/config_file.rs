use std::{
    env,
    path::{Path, PathBuf},
};

pub(crate) const CONFIG_FILE: &str = ".beanstack.toml";

/// Load config file content from CWD first, then home directory
///
/// Searches for .beanstack.toml in:
/// 1. Current working directory
/// 2. Home directory
///
/// Returns the file content if found, None otherwise.
pub fn load_config_file() -> Option<String> {
    let mut candidates = vec![PathBuf::from(CONFIG_FILE)];
    candidates.extend(get_home_config_path());
    read_first(&candidates)
}

/// Content of the first readable file among `candidates`
pub(crate) fn read_first(candidates: &[PathBuf]) -> Option<String> {
    candidates.iter().find_map(|path| read(path))
}

fn read(path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    log::debug!("Loaded config from {}", path.display());
    Some(content)
}

/// Returns ~/.beanstack.toml if HOME environment variable is set.
fn get_home_config_path() -> Option<PathBuf> {
    env::var_os("HOME").map(|home| PathBuf::from(home).join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_existing_candidate_wins() {
        let cwd = tempfile::tempdir().unwrap();
        let home = tempfile::tempdir().unwrap();
        let local = cwd.path().join(CONFIG_FILE);
        let global = home.path().join(CONFIG_FILE);
        std::fs::write(&global, "debounce_ms = 1").unwrap();

        assert_eq!(
            read_first(&[local.clone(), global.clone()]).as_deref(),
            Some("debounce_ms = 1")
        );

        std::fs::write(&local, "debounce_ms = 2").unwrap();
        assert_eq!(
            read_first(&[local, global]).as_deref(),
            Some("debounce_ms = 2")
        );
    }

    #[test]
    fn test_no_candidate_found() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_first(&[dir.path().join(CONFIG_FILE)]), None);
    }
}

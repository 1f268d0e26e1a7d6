use std::path::{Path, PathBuf};

/// Resolve the project root.
///
/// Priority:
/// 1. `--root` flag / `STEPPER_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `.stepper/`
/// 3. Walk upward from `cwd` looking for `.git/`
/// 4. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_upward(&cwd, ".stepper")
        .or_else(|| find_upward(&cwd, ".git"))
        .unwrap_or(cwd)
}

fn find_upward(start: &Path, marker: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(marker).is_dir())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_root_wins() {
        let dir = TempDir::new().unwrap();
        let result = resolve_root(Some(dir.path()));
        assert_eq!(result, dir.path());
    }

    #[test]
    fn finds_marker_in_ancestor() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".stepper")).unwrap();
        let deep = dir.path().join("forms/issuer/launch");
        std::fs::create_dir_all(&deep).unwrap();

        assert_eq!(find_upward(&deep, ".stepper").as_deref(), Some(dir.path()));
        assert_eq!(find_upward(&deep, ".no-such-marker"), None);
    }

    #[test]
    fn nearest_marker_is_preferred() {
        let outer = TempDir::new().unwrap();
        let inner = outer.path().join("nested");
        std::fs::create_dir_all(outer.path().join(".stepper")).unwrap();
        std::fs::create_dir_all(inner.join(".stepper")).unwrap();

        assert_eq!(find_upward(&inner, ".stepper").as_deref(), Some(inner.as_path()));
    }
}

//! Summary file discovery under the simulator's result folders.

use crate::data::columns::Scenario;
use glob::{glob, Pattern};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Result folders written by successive simulation campaigns.
pub const RESULT_BASES: [&str; 2] = ["resultsfinal", "resultsfinal2"];

/// Expand a glob rooted at `dir`, ignoring unreadable entries.
fn glob_in(dir: &Path, pattern: &str) -> Vec<PathBuf> {
    let full = format!("{}/{}", Pattern::escape(&dir.to_string_lossy()), pattern);
    match glob(&full) {
        Ok(paths) => paths.filter_map(Result::ok).filter(|p| p.is_file()).collect(),
        Err(e) => {
            debug!(pattern = %full, error = %e, "invalid glob pattern");
            Vec::new()
        }
    }
}

/// Locate one summary file for a scenario.
///
/// Tries `filename` relative to `root`, then
/// `<base>/summaries/<scenario>/<filename>`, then run-file globs inside that
/// folder, then any CSV mentioning the scenario anywhere under
/// `<base>/summaries`.
pub fn find_summary_path(root: &Path, scenario: Scenario, filename: &str) -> Option<PathBuf> {
    let direct = root.join(filename);
    if direct.is_file() {
        return Some(direct);
    }

    let name = scenario.name();
    for base_name in RESULT_BASES {
        let base = root.join(base_name).join("summaries");
        let scen_dir = base.join(name);

        let alt = scen_dir.join(filename);
        if alt.is_file() {
            return Some(alt);
        }

        if scen_dir.is_dir() {
            let mut candidates = glob_in(&scen_dir, &format!("summary*{}*run*.csv", name));
            candidates.extend(glob_in(&scen_dir, "summary_*_run*.csv"));
            if let Some(first) = candidates.into_iter().next() {
                return Some(first);
            }
        }

        if base.is_dir() {
            if let Some(first) = glob_in(&base, &format!("**/*{}*.csv", name)).into_iter().next() {
                return Some(first);
            }
        }
    }

    None
}

/// Every CSV that belongs to a scenario, first-seen order, no duplicates.
///
/// `roots` are searched in order; the first is usually the working
/// directory, the others alternative repository roots.
pub fn find_all_summary_paths(roots: &[PathBuf], scenario: Scenario) -> Vec<PathBuf> {
    let name = scenario.name();
    let mut paths = Vec::new();

    if let Some(cwd) = roots.first() {
        paths.extend(glob_in(cwd, &format!("*{}*.csv", name)));
    }

    for base_name in RESULT_BASES {
        let bases: Vec<PathBuf> = roots
            .iter()
            .map(|root| root.join(base_name).join("summaries"))
            .collect();

        for base in &bases {
            let scen_dir = base.join(name);
            if scen_dir.is_dir() {
                paths.extend(glob_in(&scen_dir, "*.csv"));
            }
        }

        for base in &bases {
            if base.is_dir() {
                paths.extend(glob_in(base, &format!("**/*{}*.csv", name)));
            }
        }
    }

    dedup_preserving_order(paths)
}

fn dedup_preserving_order(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    paths
        .into_iter()
        .filter(|p| {
            let key = p.canonicalize().unwrap_or_else(|_| p.clone());
            seen.insert(key)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "NumDevices\n1\n").unwrap();
        path
    }

    #[test]
    fn direct_file_wins() {
        let dir = TempDir::new().unwrap();
        let direct = touch(dir.path(), "summary_density_run1.csv");
        touch(dir.path(), "resultsfinal/summaries/density/summary_density_run1.csv");
        let found = find_summary_path(dir.path(), Scenario::Density, "summary_density_run1.csv");
        assert_eq!(found, Some(direct));
    }

    #[test]
    fn falls_back_to_scenario_folder() {
        let dir = TempDir::new().unwrap();
        let alt = touch(dir.path(), "resultsfinal2/summaries/sigma/summary_sigma_run1.csv");
        let found = find_summary_path(dir.path(), Scenario::Sigma, "summary_sigma_run1.csv");
        assert_eq!(found, Some(alt));
    }

    #[test]
    fn falls_back_to_run_glob() {
        let dir = TempDir::new().unwrap();
        let run = touch(
            dir.path(),
            "resultsfinal/summaries/density/summary_scen1_dev100_ADR-AVG_run3.csv",
        );
        let found = find_summary_path(dir.path(), Scenario::Density, "summary_density_run1.csv");
        assert_eq!(found, Some(run));
    }

    #[test]
    fn falls_back_to_recursive_search() {
        let dir = TempDir::new().unwrap();
        let nested = touch(dir.path(), "resultsfinal/summaries/old/x_mobilite_y.csv");
        let found = find_summary_path(dir.path(), Scenario::Mobility, "summary_mobilite_run1.csv");
        assert_eq!(found, Some(nested));
    }

    #[test]
    fn nothing_found() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            find_summary_path(dir.path(), Scenario::Sigma, "summary_sigma_run1.csv"),
            None
        );
        assert!(find_all_summary_paths(&[dir.path().to_path_buf()], Scenario::Sigma).is_empty());
    }

    #[test]
    fn all_paths_are_deduplicated_in_order() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let cwd_file = touch(root, "summary_density_extra.csv");
        let a = touch(root, "resultsfinal/summaries/density/a.csv");
        let b = touch(root, "resultsfinal/summaries/density/summary_density_b.csv");
        let c = touch(root, "resultsfinal2/summaries/density/c.csv");
        touch(root, "resultsfinal/summaries/sigma/summary_sigma_run1.csv");

        let found = find_all_summary_paths(&[root.to_path_buf()], Scenario::Density);
        assert_eq!(found, vec![cwd_file, a, b, c]);
    }

    #[test]
    fn secondary_root_is_searched() {
        let cwd = TempDir::new().unwrap();
        let repo = TempDir::new().unwrap();
        let file = touch(repo.path(), "resultsfinal/summaries/sigma/s.csv");
        let found = find_all_summary_paths(
            &[cwd.path().to_path_buf(), repo.path().to_path_buf()],
            Scenario::Sigma,
        );
        assert_eq!(found, vec![file]);
    }
}

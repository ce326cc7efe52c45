use std::path::{Path, PathBuf};

/// The on-disk layout of a ledger workspace root, per the persisted
/// state layout: `data/accounts/*.csv`, `data/events.db`,
/// `data/projections.db`, `data/budget_projections.db`,
/// `config/categories.yml`, `ingest/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceLayout {
    root: PathBuf,
}

impl WorkspaceLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    pub fn accounts_dir(&self) -> PathBuf {
        self.data_dir().join("accounts")
    }

    pub fn events_db(&self) -> PathBuf {
        self.data_dir().join("events.db")
    }

    pub fn projections_db(&self) -> PathBuf {
        self.data_dir().join("projections.db")
    }

    pub fn budget_projections_db(&self) -> PathBuf {
        self.data_dir().join("budget_projections.db")
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root.join("config")
    }

    pub fn categories_file(&self) -> PathBuf {
        self.config_dir().join("categories.yml")
    }

    pub fn ingest_dir(&self) -> PathBuf {
        self.root.join("ingest")
    }

    /// Creates every directory this layout names, if absent. Does not
    /// touch files — `events.db` etc. are created lazily by their
    /// respective stores.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.data_dir())?;
        std::fs::create_dir_all(self.accounts_dir())?;
        std::fs::create_dir_all(self.config_dir())?;
        std::fs::create_dir_all(self.ingest_dir())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn ensure_dirs_creates_expected_tree() {
        let dir = tempdir().unwrap();
        let layout = WorkspaceLayout::new(dir.path());
        layout.ensure_dirs().unwrap();
        assert!(layout.accounts_dir().is_dir());
        assert!(layout.config_dir().is_dir());
        assert!(layout.ingest_dir().is_dir());
        assert_eq!(layout.events_db(), dir.path().join("data/events.db"));
    }
}

//! Export watcher
//!
//! Keeps the CSV snapshot current: converts the existing export once at
//! startup, then reconverts whenever an `ALINAN*.xlsx` in the watched
//! directory is added or changed. Removals are only logged.

use crate::convert;
use anyhow::{Context, Result};
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportChange {
    Added,
    Changed,
    Removed,
}

impl ExportChange {
    pub fn needs_conversion(self) -> bool {
        matches!(self, Self::Added | Self::Changed)
    }
}

/// Export files touched by `event`, with what happened to each.
///
/// Paths that are not exports (the CSV output itself, lock files, other
/// workbooks) and metadata-only or access events yield nothing.
pub fn classify(event: &Event) -> Vec<(ExportChange, PathBuf)> {
    let per_path = |index: usize| -> Option<ExportChange> {
        match event.kind {
            EventKind::Create(_) => Some(ExportChange::Added),
            EventKind::Remove(_) => Some(ExportChange::Removed),
            EventKind::Modify(ModifyKind::Metadata(_)) => None,
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Some(ExportChange::Removed),
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Some(ExportChange::Added),
            // [from, to]
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => Some(if index == 0 {
                ExportChange::Removed
            } else {
                ExportChange::Added
            }),
            EventKind::Modify(_) => Some(ExportChange::Changed),
            _ => None,
        }
    };

    event
        .paths
        .iter()
        .enumerate()
        .filter(|(_, path)| convert::is_export_path(path))
        .filter_map(|(i, path)| per_path(i).map(|change| (change, path.clone())))
        .collect()
}

/// Relative outputs land next to the watched exports.
pub fn output_path(dir: &Path, output: &Path) -> PathBuf {
    if output.is_absolute() {
        output.to_path_buf()
    } else {
        dir.join(output)
    }
}

fn reconvert(input: &Path, output: &Path) {
    match convert::convert_to_csv(input, output) {
        Ok(rows) => info!("Snapshot refreshed from {} ({} rows)", input.display(), rows),
        // half-written workbooks fail here; the next modify event retries
        Err(e) => error!("Conversion of {} failed: {:#}", input.display(), e),
    }
}

/// Watch `dir` until the process is stopped.
pub fn run(dir: &Path, output: &Path) -> Result<()> {
    let output = output_path(dir, output);

    match convert::find_export(dir)? {
        Some(existing) => {
            info!("Existing export found: {}", existing.display());
            reconvert(&existing, &output);
        }
        None => warn!("No export in {} yet; waiting for one to be added", dir.display()),
    }

    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;
    watcher
        .watch(dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("Failed to watch {}", dir.display()))?;
    info!("Watching {} for export changes", dir.display());

    for result in rx {
        let event = match result {
            Ok(event) => event,
            Err(e) => {
                error!("File watcher error: {}", e);
                continue;
            }
        };

        for (change, path) in classify(&event) {
            match change {
                ExportChange::Added => info!("Export added: {}", path.display()),
                ExportChange::Changed => info!("Export changed: {}", path.display()),
                ExportChange::Removed => info!("Export removed: {}", path.display()),
            }
            if change.needs_conversion() {
                reconvert(&path, &output);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, RemoveKind};

    const EXPORT: &str = "/data/ALINAN SİPARİŞLER.xlsx";

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        paths
            .iter()
            .fold(Event::new(kind), |event, path| event.add_path(PathBuf::from(path)))
    }

    fn changes(kind: EventKind, paths: &[&str]) -> Vec<ExportChange> {
        classify(&event(kind, paths)).into_iter().map(|(c, _)| c).collect()
    }

    // -------------------------------------------------------------------------
    // EVENT FILTER
    // -------------------------------------------------------------------------

    #[test]
    fn test_create_and_write_trigger_conversion() {
        let added = changes(EventKind::Create(CreateKind::File), &[EXPORT]);
        assert_eq!(added, vec![ExportChange::Added]);
        assert!(added[0].needs_conversion());

        let changed = changes(EventKind::Modify(ModifyKind::Data(DataChange::Content)), &[EXPORT]);
        assert_eq!(changed, vec![ExportChange::Changed]);
        assert!(changed[0].needs_conversion());

        assert_eq!(
            changes(EventKind::Modify(ModifyKind::Any), &[EXPORT]),
            vec![ExportChange::Changed]
        );
    }

    #[test]
    fn test_remove_is_logged_only() {
        let removed = changes(EventKind::Remove(RemoveKind::File), &[EXPORT]);
        assert_eq!(removed, vec![ExportChange::Removed]);
        assert!(!removed[0].needs_conversion());
    }

    #[test]
    fn test_non_export_paths_ignored() {
        for path in [
            "/data/orders.csv",
            "/data/notes.xlsx",
            "/data/~$ALINAN SİPARİŞLER.xlsx",
            "/data/ALINAN SİPARİŞLER.xls",
        ] {
            assert!(changes(EventKind::Create(CreateKind::File), &[path]).is_empty(), "{}", path);
        }
    }

    #[test]
    fn test_metadata_and_access_ignored() {
        assert!(changes(EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime)), &[EXPORT]).is_empty());
        assert!(changes(EventKind::Access(AccessKind::Any), &[EXPORT]).is_empty());
    }

    #[test]
    fn test_rename_into_export_name() {
        // Excel saves through a temp file renamed over the export
        let classified = classify(&event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/data/~tmp1234.tmp", EXPORT],
        ));
        assert_eq!(classified, vec![(ExportChange::Added, PathBuf::from(EXPORT))]);

        assert_eq!(
            changes(EventKind::Modify(ModifyKind::Name(RenameMode::From)), &[EXPORT]),
            vec![ExportChange::Removed]
        );
        assert_eq!(
            changes(EventKind::Modify(ModifyKind::Name(RenameMode::To)), &[EXPORT]),
            vec![ExportChange::Added]
        );
    }

    #[test]
    fn test_output_path_relative_to_dir() {
        let dir = Path::new("/data");
        assert_eq!(output_path(dir, Path::new("orders.csv")), PathBuf::from("/data/orders.csv"));
        assert_eq!(output_path(dir, Path::new("/srv/orders.csv")), PathBuf::from("/srv/orders.csv"));
    }

    #[test]
    fn test_run_fails_on_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone");
        assert!(run(&missing, Path::new("orders.csv")).is_err());
    }
}

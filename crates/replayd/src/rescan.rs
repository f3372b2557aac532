use std::path::PathBuf;
use std::sync::mpsc;

use replaycore_catalog::Catalog;
use replaycore_meta::WotHeaderSource;
use replaycore_store::IdStore;

/// The worker's single terminal message. The consumer swaps its catalog
/// wholesale when this arrives; nothing partial ever crosses the thread
/// boundary.
pub(crate) struct ScanDone {
    pub(crate) job_id: u64,
    pub(crate) catalog: Catalog,
    pub(crate) store: IdStore,
    pub(crate) hints: Vec<String>,
}

pub(crate) fn run_scan_job(
    job_id: u64,
    roots: Vec<PathBuf>,
    mut store: IdStore,
    tx: mpsc::Sender<ScanDone>,
) {
    tracing::debug!(job_id, roots = roots.len(), "rescan started");

    let mut hints = Vec::new();
    let resolved = replaycore_scan::resolve(&roots);
    for root in &resolved.missing_roots {
        hints.push(format!("skipped unreadable replay folder {}", root.display()));
    }

    let known_before = store.len();
    let catalog = Catalog::build(&resolved.files, &mut store, &WotHeaderSource);

    if store.len() > known_before {
        if let Err(err) = store.persist() {
            hints.push(format!("replay numbering not saved: {err}"));
        }
    }

    if catalog.is_empty() {
        hints.push(
            "no replays found; set the game folder with --exe or add a folder with --root"
                .to_string(),
        );
    }

    tracing::debug!(job_id, replays = catalog.len(), "rescan finished");
    let _ = tx.send(ScanDone {
        job_id,
        catalog,
        store,
        hints,
    });
}

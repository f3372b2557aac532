use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use replaycore_catalog::{display_label, Catalog, CatalogRow};
use replaycore_config::Settings;
use replaycore_launch::LaunchAdapter;
use replaycore_store::IdStore;

use crate::rescan::{self, ScanDone};

#[derive(Debug, Clone, PartialEq)]
pub enum LaunchOutcome {
    Started,
    Failed { reason: String },
}

/// Events for the presentation layer. The engine never renders anything
/// itself; frontends drain these from `Engine::tick`.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    CatalogUpdated(Vec<CatalogRow>),
    LaunchOutcome {
        replay: PathBuf,
        outcome: LaunchOutcome,
    },
    LogHint(String),
}

/// The replay index & discovery engine.
///
/// At most one rescan worker runs at a time; a request arriving mid-scan
/// queues exactly one follow-up. The id store moves into the worker for the
/// duration of a scan and comes back with the terminal message, which keeps
/// identifier allocation and persistence on a single thread at a time.
pub struct Engine {
    settings: Settings,
    store: Option<IdStore>,
    catalog: Catalog,
    adapter: LaunchAdapter,
    scan_rx: Option<mpsc::Receiver<ScanDone>>,
    scan_job_counter: u64,
    active_scan: Option<u64>,
    rescan_queued: bool,
    pending: VecDeque<EngineEvent>,
}

impl Engine {
    pub fn new(settings: Settings, store_path: impl Into<PathBuf>) -> Self {
        Self {
            settings,
            store: Some(IdStore::load(store_path.into())),
            catalog: Catalog::default(),
            adapter: LaunchAdapter::default(),
            scan_rx: None,
            scan_job_counter: 0,
            active_scan: None,
            rescan_queued: false,
            pending: VecDeque::new(),
        }
    }

    pub fn with_adapter(mut self, adapter: LaunchAdapter) -> Self {
        self.adapter = adapter;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn filter(&self, query: &str) -> Vec<CatalogRow> {
        self.catalog.filter(query)
    }

    pub fn scanning(&self) -> bool {
        self.active_scan.is_some()
    }

    pub fn request_rescan(&mut self) {
        if self.active_scan.is_some() {
            self.rescan_queued = true;
            return;
        }

        self.begin_rescan();
    }

    /// Launches a catalog row by its persistent number.
    pub fn launch_id(&mut self, id: u32) {
        let Some(row) = self.catalog.row_by_id(id) else {
            self.pending.push_back(EngineEvent::LogHint(format!(
                "no replay numbered {}",
                display_label(id)
            )));
            return;
        };

        let replay = row.file.path.clone();
        self.launch(&replay);
    }

    /// Launches a concrete path directly (drag-and-drop, manual selection);
    /// catalog membership is not required.
    pub fn launch(&mut self, replay: &Path) {
        let outcome = match self
            .adapter
            .launch(self.settings.executable_path.as_deref(), replay)
        {
            Ok(()) => LaunchOutcome::Started,
            Err(err) => LaunchOutcome::Failed {
                reason: err.to_string(),
            },
        };

        self.pending.push_back(EngineEvent::LaunchOutcome {
            replay: replay.to_path_buf(),
            outcome,
        });
    }

    /// Drains worker results and queued notifications. Stale scan results
    /// (superseded job ids) are discarded; a queued rescan starts as soon as
    /// the active one lands.
    pub fn tick(&mut self) -> Vec<EngineEvent> {
        let mut events: Vec<EngineEvent> = self.pending.drain(..).collect();

        let mut done = None;
        if let Some(rx) = &self.scan_rx {
            while let Ok(message) = rx.try_recv() {
                done = Some(message);
            }
        }

        if let Some(done) = done {
            if self.active_scan == Some(done.job_id) {
                self.active_scan = None;
                self.scan_rx = None;
                self.store = Some(done.store);
                self.catalog = done.catalog;

                for hint in done.hints {
                    events.push(EngineEvent::LogHint(hint));
                }
                events.push(EngineEvent::CatalogUpdated(self.catalog.rows().to_vec()));

                if self.rescan_queued {
                    self.rescan_queued = false;
                    self.begin_rescan();
                }
            }
        }

        events
    }

    fn begin_rescan(&mut self) {
        let Some(store) = self.store.take() else {
            self.rescan_queued = true;
            return;
        };

        self.scan_job_counter += 1;
        let job_id = self.scan_job_counter;
        self.active_scan = Some(job_id);

        let roots = replaycore_scan::replay_roots(
            self.settings.executable_path.as_deref(),
            &self.settings.extra_roots,
        );

        let (tx, rx) = mpsc::channel();
        self.scan_rx = Some(rx);
        thread::spawn(move || rescan::run_scan_job(job_id, roots, store, tx));
    }
}

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use pix_docs::{AssetDoc, EntitlementDoc, LiveQuery};

use crate::pager::{GalleryItem, GalleryPager};

/// Wires a [`GalleryPager`] to the two live queries that feed it.
///
/// Updates are recomputed synchronously on delivery and published as
/// whole snapshots; consumers watch `subscribe()` or poll
/// `rendered()`. The session owns the subscriptions: dropping it (or
/// calling `cancel`) tears down the live queries and stops the
/// driving task, which is what a view must do when it disappears.
pub struct GallerySession {
    pager: Arc<Mutex<GalleryPager>>,
    out: Arc<watch::Sender<Vec<GalleryItem>>>,
    rx: watch::Receiver<Vec<GalleryItem>>,
    task: JoinHandle<()>,
}

impl GallerySession {
    pub fn spawn(
        mut assets: LiveQuery<AssetDoc>,
        mut entitlements: LiveQuery<EntitlementDoc>,
        user_id: impl Into<String>,
        page_size: usize,
    ) -> Self {
        let pager = Arc::new(Mutex::new(GalleryPager::new(user_id, page_size)));
        {
            let mut p = pager.lock().unwrap();
            p.set_assets(assets.current());
            p.set_entitlements(entitlements.current().into_iter().map(|e| e.asset_id));
        }

        let initial = pager.lock().unwrap().rendered();
        let (tx, rx) = watch::channel(initial);
        let out = Arc::new(tx);

        let task = tokio::spawn({
            let pager = Arc::clone(&pager);
            let out = Arc::clone(&out);
            async move {
                loop {
                    tokio::select! {
                        snapshot = assets.changed() => match snapshot {
                            Some(list) => pager.lock().unwrap().set_assets(list),
                            None => break,
                        },
                        snapshot = entitlements.changed() => match snapshot {
                            Some(list) => pager
                                .lock()
                                .unwrap()
                                .set_entitlements(list.into_iter().map(|e| e.asset_id)),
                            None => break,
                        },
                    }
                    if out.send(pager.lock().unwrap().rendered()).is_err() {
                        break;
                    }
                }
                debug!("gallery session input stream ended");
            }
        });

        Self {
            pager,
            out,
            rx,
            task,
        }
    }

    /// The current render-ready list.
    pub fn rendered(&self) -> Vec<GalleryItem> {
        self.rx.borrow().clone()
    }

    /// Watch for recomputed snapshots.
    pub fn subscribe(&self) -> watch::Receiver<Vec<GalleryItem>> {
        self.rx.clone()
    }

    /// The "near end of window" signal: grow by one page and
    /// republish. Returns `false` once the full list is covered.
    pub fn extend_window(&self) -> bool {
        let mut pager = self.pager.lock().unwrap();
        let grew = pager.extend_window();
        if grew {
            let _ = self.out.send(pager.rendered());
        }
        grew
    }

    pub fn has_more(&self) -> bool {
        self.pager.lock().unwrap().has_more()
    }

    /// Explicit teardown; equivalent to dropping the session.
    pub fn cancel(self) {
        self.task.abort();
    }
}

impl Drop for GallerySession {
    fn drop(&mut self) {
        self.task.abort();
    }
}

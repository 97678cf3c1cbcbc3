use std::collections::HashSet;

use pix_docs::AssetDoc;

/// Items rendered per page, matching the original viewer.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// One render-ready gallery entry.
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryItem {
    pub asset: AssetDoc,
    pub is_entitled: bool,
    /// The URL the view must present for this caller.
    pub display_url: String,
}

/// Pure state machine over three input slots: the live ordered asset
/// list, the caller's entitlement set, and a monotonically growing
/// window. Recomputation is synchronous and a pure function of the
/// three slots; callers re-render from `rendered()` whenever any
/// input changes.
pub struct GalleryPager {
    user_id: String,
    page_size: usize,
    window: usize,
    assets: Vec<AssetDoc>,
    entitled: HashSet<String>,
}

impl GalleryPager {
    pub fn new(user_id: impl Into<String>, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            user_id: user_id.into(),
            page_size,
            window: page_size,
            assets: Vec::new(),
            entitled: HashSet::new(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Replace the full asset list. Ordering is enforced here so a
    /// stale or unordered snapshot cannot reorder the rendered
    /// prefix: newest first, id as the tie-break.
    pub fn set_assets(&mut self, mut assets: Vec<AssetDoc>) {
        assets.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        self.assets = assets;
    }

    /// Replace the entitlement set with the asset ids this user may
    /// view in full resolution.
    pub fn set_entitlements<I>(&mut self, asset_ids: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.entitled = asset_ids.into_iter().collect();
    }

    /// Grow the window by one page. Returns `false` (and does not
    /// grow) once the window already covers the full list.
    pub fn extend_window(&mut self) -> bool {
        if !self.has_more() {
            return false;
        }
        self.window += self.page_size;
        true
    }

    pub fn has_more(&self) -> bool {
        self.window < self.assets.len()
    }

    /// The rendered slice: the first `window` elements of the full
    /// ordered list, each annotated. Non-entitled items are forced to
    /// the preview URL even when a full-resolution URL is present.
    pub fn rendered(&self) -> Vec<GalleryItem> {
        self.assets
            .iter()
            .take(self.window)
            .map(|asset| {
                let is_entitled = self.entitled.contains(&asset.id);
                let display_url = if is_entitled {
                    asset.original_url.clone()
                } else {
                    asset
                        .derived_url
                        .clone()
                        .unwrap_or_else(|| asset.original_url.clone())
                };
                GalleryItem {
                    asset: asset.clone(),
                    is_entitled,
                    display_url,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(id: &str, created_at: i64, derived: bool) -> AssetDoc {
        let mut doc = AssetDoc::new(
            id,
            "owner-1",
            "Owner",
            format!("https://cdn.test/original/{id}.jpg"),
        );
        doc.created_at = created_at;
        if derived {
            doc.derived_url = Some(format!("https://cdn.test/derived/preview_{id}.jpg"));
            doc.derived_path = Some(format!("derived/{id}/preview_{id}.jpg"));
            doc.processed = true;
        }
        doc
    }

    fn ids(items: &[GalleryItem]) -> Vec<&str> {
        items.iter().map(|i| i.asset.id.as_str()).collect()
    }

    #[test]
    fn renders_newest_first_regardless_of_input_order() {
        let mut pager = GalleryPager::new("u1", 10);
        pager.set_assets(vec![asset("a", 1, true), asset("c", 3, true), asset("b", 2, true)]);
        assert_eq!(ids(&pager.rendered()), vec!["c", "b", "a"]);
    }

    #[test]
    fn window_growth_is_monotonic_and_bounded() {
        let mut pager = GalleryPager::new("u1", 2);
        pager.set_assets((0..5).map(|i| asset(&format!("a{i}"), i as i64, true)).collect());

        let first = pager.rendered();
        assert_eq!(first.len(), 2);
        assert!(pager.has_more());

        assert!(pager.extend_window());
        let second = pager.rendered();
        assert_eq!(second.len(), 4);
        // Prefix extension: the earlier window is unchanged.
        assert_eq!(&second[..2], &first[..]);

        assert!(pager.extend_window());
        assert_eq!(pager.rendered().len(), 5);

        // Fully covered: no further growth.
        assert!(!pager.extend_window());
        assert!(!pager.has_more());
        assert_eq!(pager.rendered().len(), 5);
    }

    #[test]
    fn rendered_never_exceeds_the_full_list() {
        let mut pager = GalleryPager::new("u1", 20);
        pager.set_assets(vec![asset("a", 1, true)]);
        assert_eq!(pager.rendered().len(), 1);
        assert!(!pager.extend_window());
    }

    #[test]
    fn non_entitled_items_are_forced_to_the_preview() {
        let mut pager = GalleryPager::new("u1", 10);
        pager.set_assets(vec![asset("paid", 2, true), asset("free", 1, true)]);
        pager.set_entitlements(vec!["paid".to_string()]);

        let items = pager.rendered();
        let paid = items.iter().find(|i| i.asset.id == "paid").unwrap();
        let free = items.iter().find(|i| i.asset.id == "free").unwrap();

        assert!(paid.is_entitled);
        assert_eq!(paid.display_url, "https://cdn.test/original/paid.jpg");

        assert!(!free.is_entitled);
        assert_eq!(
            free.display_url,
            "https://cdn.test/derived/preview_free.jpg"
        );
    }

    #[test]
    fn unprocessed_assets_fall_back_to_the_only_url_there_is() {
        let mut pager = GalleryPager::new("u1", 10);
        pager.set_assets(vec![asset("fresh", 1, false)]);

        let items = pager.rendered();
        assert_eq!(items[0].display_url, "https://cdn.test/original/fresh.jpg");
        assert!(!items[0].is_entitled);
    }

    #[test]
    fn entitlement_updates_recompute_without_reordering() {
        let mut pager = GalleryPager::new("u1", 10);
        pager.set_assets(vec![asset("a", 2, true), asset("b", 1, true)]);
        let rendered = pager.rendered();
        let before = ids(&rendered);

        pager.set_entitlements(vec!["b".to_string()]);
        let after = pager.rendered();
        assert_eq!(ids(&after), before);
        assert!(after[1].is_entitled);
    }
}

use outpost_domain::{EntityRecord, RecordId};

pub const DEFAULT_COMPACT_BREAKPOINT_PX: u32 = 768;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// Narrow viewport: details slide over the list in a drawer.
    Compact,
    /// Wide viewport: details sit in a persistent side panel.
    #[default]
    Wide,
}

impl ViewMode {
    pub fn from_width(width_px: u32, compact_breakpoint_px: u32) -> Self {
        if width_px < compact_breakpoint_px {
            Self::Compact
        } else {
            Self::Wide
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailPresentation {
    Hidden,
    SidePanel(RecordId),
    Drawer(RecordId),
}

impl DetailPresentation {
    pub fn drawer_visible(&self) -> bool {
        matches!(self, Self::Drawer(_))
    }

    pub fn side_panel_visible(&self) -> bool {
        matches!(self, Self::SidePanel(_))
    }

    pub fn record_id(&self) -> Option<&RecordId> {
        match self {
            Self::Hidden => None,
            Self::SidePanel(id) | Self::Drawer(id) => Some(id),
        }
    }
}

/// Tracks the selected record of one page and decides where its details are
/// shown.
///
/// Closing the drawer or the side panel clears the selection itself, so a
/// selection is never held without a visible surface. Re-opening means
/// selecting again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionCoordinator {
    selected: Option<RecordId>,
    view_mode: ViewMode,
}

impl SelectionCoordinator {
    pub fn new(view_mode: ViewMode) -> Self {
        Self {
            selected: None,
            view_mode,
        }
    }

    pub fn select(&mut self, id: RecordId) {
        self.selected = Some(id);
    }

    pub fn close(&mut self) {
        self.selected = None;
    }

    pub fn set_view_mode(&mut self, view_mode: ViewMode) {
        self.view_mode = view_mode;
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn selected_id(&self) -> Option<&RecordId> {
        self.selected.as_ref()
    }

    /// Looks the selected record up in `records`.
    pub fn current<'a, R: EntityRecord>(&self, records: &'a [R]) -> Option<&'a R> {
        let selected = self.selected.as_ref()?;
        records.iter().find(|record| record.id() == selected)
    }

    /// Drops a selection whose record is no longer in `records`. Returns
    /// whether it was dropped.
    pub fn reconcile<R: EntityRecord>(&mut self, records: &[R]) -> bool {
        if self.selected.is_some() && self.current(records).is_none() {
            self.selected = None;
            return true;
        }
        false
    }

    pub fn presentation(&self) -> DetailPresentation {
        present(self.view_mode, self.selected.as_ref())
    }
}

pub fn present(view_mode: ViewMode, selected: Option<&RecordId>) -> DetailPresentation {
    match (view_mode, selected) {
        (_, None) => DetailPresentation::Hidden,
        (ViewMode::Compact, Some(id)) => DetailPresentation::Drawer(id.clone()),
        (ViewMode::Wide, Some(id)) => DetailPresentation::SidePanel(id.clone()),
    }
}

#[cfg(test)]
mod tests {
    use outpost_domain::{ApiKey, ApiKeyStatus};

    use super::*;

    fn key(id: &str) -> ApiKey {
        ApiKey {
            id: RecordId::from(id),
            name: id.to_owned(),
            key_prefix: "oz_live".to_owned(),
            scope: "read".to_owned(),
            status: ApiKeyStatus::Active,
            request_count: 0,
            created_at: "2026-01-01T00:00:00Z".to_owned(),
            last_used_at: None,
        }
    }

    #[test]
    fn compact_selection_shows_drawer_only() {
        let mut selection = SelectionCoordinator::new(ViewMode::Compact);
        selection.select(RecordId::from("key-1"));

        let presentation = selection.presentation();
        assert!(presentation.drawer_visible());
        assert!(!presentation.side_panel_visible());
    }

    #[test]
    fn wide_selection_shows_side_panel_only() {
        let mut selection = SelectionCoordinator::new(ViewMode::Wide);
        selection.select(RecordId::from("key-1"));

        let presentation = selection.presentation();
        assert!(presentation.side_panel_visible());
        assert!(!presentation.drawer_visible());
    }

    #[test]
    fn exactly_one_surface_whenever_something_is_selected() {
        for mode in [ViewMode::Compact, ViewMode::Wide] {
            for selected in [None, Some(RecordId::from("key-1"))] {
                let presentation = present(mode, selected.as_ref());
                let visible = usize::from(presentation.drawer_visible())
                    + usize::from(presentation.side_panel_visible());
                assert_eq!(visible, usize::from(selected.is_some()), "{mode:?}");
            }
        }
    }

    #[test]
    fn resizing_moves_the_selection_between_surfaces() {
        let mut selection = SelectionCoordinator::new(ViewMode::Wide);
        selection.select(RecordId::from("key-2"));
        selection.set_view_mode(ViewMode::from_width(500, DEFAULT_COMPACT_BREAKPOINT_PX));

        assert_eq!(
            selection.presentation(),
            DetailPresentation::Drawer(RecordId::from("key-2"))
        );
    }

    #[test]
    fn closing_clears_selection() {
        let mut selection = SelectionCoordinator::new(ViewMode::Compact);
        selection.select(RecordId::from("key-1"));
        selection.close();

        assert_eq!(selection.presentation(), DetailPresentation::Hidden);
        assert_eq!(selection.selected_id(), None);
    }

    #[test]
    fn reconcile_drops_missing_records() {
        let records = vec![key("key-1"), key("key-2")];
        let mut selection = SelectionCoordinator::default();
        selection.select(RecordId::from("key-2"));
        assert!(!selection.reconcile(&records));
        assert_eq!(selection.current(&records), Some(&records[1]));

        selection.select(RecordId::from("key-9"));
        assert!(selection.reconcile(&records));
        assert_eq!(selection.selected_id(), None);
    }

    #[test]
    fn breakpoint_is_exclusive_on_the_compact_side() {
        assert_eq!(ViewMode::from_width(767, 768), ViewMode::Compact);
        assert_eq!(ViewMode::from_width(768, 768), ViewMode::Wide);
    }
}

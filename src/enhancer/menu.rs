use ratatui::layout::Rect;

use super::Label;
use super::engine::ActiveMenu;

const MIN_WIDTH: u16 = 16;

/// One visible row of the menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    /// Index into the full candidate list.
    pub index: usize,
    pub label: Label,
    pub selected: bool,
}

/// Render-ready projection of an open menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuView {
    pub title: String,
    /// Outer rectangle, borders included.
    pub area: Rect,
    pub entries: Vec<MenuEntry>,
    pub total: usize,
    pub scroll: usize,
}

impl MenuView {
    /// Map a terminal cell to the candidate index drawn there.
    pub fn hit_test(&self, column: u16, row: u16) -> Option<usize> {
        let inner_x = self.area.x + 1;
        let inner_y = self.area.y + 1;
        let inner_w = self.area.width.saturating_sub(2);

        if column < inner_x || column >= inner_x + inner_w || row < inner_y {
            return None;
        }

        self.entries
            .get(usize::from(row - inner_y))
            .map(|entry| entry.index)
    }
}

/// Keeps the scroll window of the completion menu across frames.
#[derive(Debug, Clone)]
pub struct MenuPresenter {
    max_rows: usize,
    scroll: usize,
}

impl MenuPresenter {
    pub fn new(max_rows: usize) -> Self {
        Self {
            max_rows: max_rows.max(1),
            scroll: 0,
        }
    }

    pub fn set_max_rows(&mut self, max_rows: usize) {
        self.max_rows = max_rows.max(1);
    }

    pub fn reset(&mut self) {
        self.scroll = 0;
    }

    /// Project `menu` into a view anchored to `anchor` and clipped to `bounds`.
    ///
    /// Returns `None` when there is no open menu, no anchor, or no
    /// candidates; each is checked on its own.
    pub fn present(
        &mut self,
        menu: Option<&ActiveMenu>,
        anchor: Option<Rect>,
        bounds: Rect,
    ) -> Option<MenuView> {
        let Some(menu) = menu else {
            self.reset();
            return None;
        };
        let anchor = anchor?;
        if menu.is_empty() {
            return None;
        }

        let labels = menu.labels();
        if labels.is_empty() {
            return None;
        }
        let selected = menu.selected().min(labels.len() - 1);
        let rows = self.max_rows.min(labels.len());
        self.ensure_visible(selected, rows, labels.len());

        let entries: Vec<MenuEntry> = labels
            .into_iter()
            .enumerate()
            .skip(self.scroll)
            .take(rows)
            .map(|(index, label)| MenuEntry {
                index,
                label,
                selected: index == selected,
            })
            .collect();

        let hint = menu.hint();
        let title = format!(" {} {} ", hint.icon, hint.label);
        let area = place(anchor, bounds, &entries, &title, rows);

        Some(MenuView {
            title,
            area,
            entries,
            total: menu.len(),
            scroll: self.scroll,
        })
    }

    fn ensure_visible(&mut self, selected: usize, rows: usize, total: usize) {
        if selected < self.scroll {
            self.scroll = selected;
        }
        if selected >= self.scroll + rows {
            self.scroll = selected + 1 - rows;
        }
        self.scroll = self.scroll.min(total.saturating_sub(rows));
    }
}

/// Open above the anchor when there is room, otherwise below it.
fn place(anchor: Rect, bounds: Rect, entries: &[MenuEntry], title: &str, rows: usize) -> Rect {
    let content = entries
        .iter()
        .map(|entry| {
            let detail = entry
                .label
                .detail
                .as_ref()
                .map_or(0, |d| d.chars().count() + 2);
            entry.label.text.chars().count() + detail + 2
        })
        .chain(std::iter::once(title.chars().count()))
        .max()
        .unwrap_or(0);

    let width = u16::try_from(content + 2)
        .unwrap_or(u16::MAX)
        .max(MIN_WIDTH)
        .min(bounds.width);
    let height = u16::try_from(rows + 2)
        .unwrap_or(u16::MAX)
        .min(bounds.height);

    let x = anchor.x.min((bounds.x + bounds.width).saturating_sub(width));
    let y = if anchor.y >= bounds.y + height {
        anchor.y - height
    } else {
        (anchor.y + anchor.height).min((bounds.y + bounds.height).saturating_sub(height))
    };

    Rect::new(x, y, width, height)
}

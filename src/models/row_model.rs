use super::MediaItem;

#[derive(Debug, Clone)]
pub struct RowItem {
    pub item: MediaItem,
    /// Left edge relative to the row's first item.
    pub x: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct Row {
    pub row_index: u32,
    pub items: Vec<RowItem>,
    pub scale: f64,
    /// Scale was clamped to the maximum row height; render centered.
    pub capped: bool,
    pub height: u32,
    pub gap: u32,
}

impl Row {
    pub fn new(
        row_index: u32,
        items: Vec<RowItem>,
        scale: f64,
        capped: bool,
        height: u32,
        gap: u32,
    ) -> Self {
        Self {
            row_index,
            items,
            scale,
            capped,
            height,
            gap,
        }
    }

    /// Sum of item widths plus inter-item gaps.
    pub fn rendered_width(&self) -> u32 {
        let widths: u32 = self.items.iter().map(|i| i.width).sum();
        widths + self.gap * (self.items.len().saturating_sub(1) as u32)
    }

    /// Horizontal offset that centers the row inside the container.
    /// Zero for rows that span the full width.
    pub fn leading_offset(&self, container_width: u32) -> u32 {
        container_width.saturating_sub(self.rendered_width()) / 2
    }

    pub fn original_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.items.iter().map(|i| i.item.original_index)
    }
}

/// Total height of all rows. Useful for scroll calculations.
pub fn total_height(rows: &[Row], row_gap: u32) -> u32 {
    if rows.is_empty() {
        return 0;
    }
    let heights: u32 = rows.iter().map(|r| r.height).sum();
    heights + row_gap * (rows.len() as u32 - 1)
}

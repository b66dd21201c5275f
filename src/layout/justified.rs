use crate::config::LayoutConfig;
use crate::models::{MediaItem, Row, RowItem};

/// Slack for float noise when testing whether an item still fits a row.
const FIT_EPSILON: f64 = 1e-9;

/// Configuration for the justified row layout.
///
/// Items are packed greedily left-to-right at a shared target height, then
/// every row is scaled so its items plus gaps span the container exactly.
#[derive(Debug, Clone)]
pub struct JustifiedLayout {
    /// Natural row height in pixels before scaling (default: 300)
    pub target_height: f64,
    /// Maximum rendered row height in pixels (default: 500)
    pub max_height: f64,
    /// Gap between items in a row in pixels (default: 16)
    pub gap: u32,
}

impl Default for JustifiedLayout {
    fn default() -> Self {
        Self::from_config(&LayoutConfig::default())
    }
}

impl JustifiedLayout {
    pub fn new(target_height: f64, max_height: f64, gap: u32) -> Self {
        Self {
            target_height,
            max_height,
            gap,
        }
    }

    pub fn from_config(config: &LayoutConfig) -> Self {
        Self::new(config.target_row_height, config.max_row_height, config.gap)
    }

    fn natural_width(&self, item: &MediaItem) -> f64 {
        item.aspect_ratio() * self.target_height
    }

    fn close_row(&self, start: usize, end: usize, natural: f64, container: f64) -> RowBreak {
        let count = end - start;
        let gaps = self.gap as f64 * count.saturating_sub(1) as f64;
        let mut scale = if natural > 0.0 {
            (container - gaps) / natural
        } else {
            1.0
        };
        let capped = self.target_height * scale > self.max_height;
        if capped {
            scale = self.max_height / self.target_height;
        }
        RowBreak {
            start_index: start,
            end_index: end,
            scale,
            capped,
        }
    }

    /// Packs resolved items into justified rows.
    ///
    /// # Algorithm
    /// 1. Accumulate items at `target_height` while the row (plus gaps) fits.
    /// 2. Close the row on the first item that overflows and scale it to fill.
    /// 3. Clamp rows that would exceed `max_height` and mark them capped.
    /// 4. Round item widths and spread the residual pixels so non-capped rows
    ///    are exactly `container_width` wide.
    ///
    /// The final row is scaled like every other row.
    pub fn pack(&self, items: &[MediaItem], container_width: u32) -> Vec<Row> {
        let breaks = self.compute_breaks(items, container_width);
        self.rows_from_breaks(items, &breaks, container_width)
    }

    /// Computes row partitions and scales without materializing rows.
    pub fn compute_breaks(&self, items: &[MediaItem], container_width: u32) -> Vec<RowBreak> {
        if items.is_empty() || container_width == 0 {
            return Vec::new();
        }

        let container = container_width as f64;
        let gap = self.gap as f64;
        let mut breaks = Vec::new();
        let mut start = 0usize;
        let mut natural = 0.0f64;

        for (index, item) in items.iter().enumerate() {
            let width = self.natural_width(item);
            let count = index - start;
            if count > 0 {
                let required = natural + gap * count as f64 + width;
                if required > container + FIT_EPSILON {
                    breaks.push(self.close_row(start, index, natural, container));
                    start = index;
                    natural = 0.0;
                }
            }
            natural += width;
        }

        breaks.push(self.close_row(start, items.len(), natural, container));
        breaks
    }

    /// Materializes rows from partitions, applying integer width correction.
    pub fn rows_from_breaks(
        &self,
        items: &[MediaItem],
        breaks: &[RowBreak],
        container_width: u32,
    ) -> Vec<Row> {
        breaks
            .iter()
            .enumerate()
            .filter(|(_, brk)| brk.end_index <= items.len() && brk.start_index < brk.end_index)
            .map(|(row_idx, brk)| {
                let slice = &items[brk.start_index..brk.end_index];
                let height = (self.target_height * brk.scale).round() as u32;
                let mut widths: Vec<i64> = slice
                    .iter()
                    .map(|item| ((self.natural_width(item) * brk.scale).round() as i64).max(1))
                    .collect();

                if !brk.capped {
                    let gaps = self.gap as i64 * (widths.len() as i64 - 1);
                    let total: i64 = widths.iter().sum::<i64>() + gaps;
                    distribute_residual(&mut widths, container_width as i64 - total);
                }

                let mut x = 0u32;
                let row_items = slice
                    .iter()
                    .zip(widths)
                    .map(|(item, width)| {
                        let width = width as u32;
                        let placed = RowItem {
                            item: item.clone(),
                            x,
                            width,
                            height,
                        };
                        x += width + self.gap;
                        placed
                    })
                    .collect();

                Row::new(
                    row_idx as u32,
                    row_items,
                    brk.scale,
                    brk.capped,
                    height,
                    self.gap,
                )
            })
            .collect()
    }
}

/// Spreads `diff` pixels one at a time over the row, front to back. Items
/// already at 1px never shrink further.
fn distribute_residual(widths: &mut [i64], diff: i64) {
    let step = diff.signum();
    let len = widths.len();
    let mut remaining = diff.unsigned_abs();
    let mut i = 0;
    let mut skipped = 0;
    while remaining > 0 && skipped < len {
        let width = &mut widths[i % len];
        if step > 0 || *width > 1 {
            *width += step;
            remaining -= 1;
            skipped = 0;
        } else {
            skipped += 1;
        }
        i += 1;
    }
}

/// Represents a row break for caching purposes.
/// Contains only the indices and scale, not the actual items.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowBreak {
    /// Start index in the items array (inclusive)
    pub start_index: usize,
    /// End index in the items array (exclusive)
    pub end_index: usize,
    pub scale: f64,
    pub capped: bool,
}

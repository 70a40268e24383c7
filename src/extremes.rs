use crate::cumulative_price_change::SymbolSeries;
use std::cmp::Ordering;

pub const EXTREME_COUNT: usize = 5;

/// Best and worst performers by final return. The two slices never share a series.
#[derive(Debug, Clone, PartialEq)]
pub struct Extremes<'a> {
    pub best: Vec<&'a SymbolSeries>,
    pub worst: Vec<&'a SymbolSeries>,
}

impl<'a> Extremes<'a> {
    pub fn iter(&self) -> impl Iterator<Item = &'a SymbolSeries> + '_ {
        self.best.iter().chain(self.worst.iter()).copied()
    }
}

fn by_final_return_desc(a: &SymbolSeries, b: &SymbolSeries) -> Ordering {
    b.final_return().partial_cmp(&a.final_return()).unwrap_or(Ordering::Equal)
}

/// Sorts series best first; stable, so ties keep their ranking order.
pub fn sort_by_final_return(series: &mut [SymbolSeries]) {
    series.sort_by(by_final_return_desc);
}

/// Up to `count` from the top, then up to `count` of what is left from the bottom.
///
/// With fewer than `2 * count` series the worst slice shrinks instead of repeating symbols.
pub fn select_extremes(sorted: &[SymbolSeries], count: usize) -> Extremes<'_> {
    let best_len = count.min(sorted.len());
    let worst_len = count.min(sorted.len() - best_len);

    Extremes {
        best: sorted[..best_len].iter().collect(),
        worst: sorted[sorted.len() - worst_len..].iter().collect(),
    }
}

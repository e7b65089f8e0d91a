//! Stable pen colors for plotted sensors.
//!
//! [`PlotColorAssigner::recompute`] runs three passes over the tree-visible
//! sensors in traversal order:
//!
//! 1. Every plotted sensor without a pen override gets
//!    `palette[ordinal % palette.len()]`, where `ordinal` counts *every* visited
//!    sensor, plotted or not. Unplotting an unrelated sensor therefore never
//!    shifts anyone's default color.
//! 2. Defaults are walked again in order. A color already claimed by an earlier
//!    default is replaced by the first palette color no default currently
//!    holds. When none is free the sensor keeps its color.
//! 3. Overrides take their literal color, possibly equal to a default.
//!
//! With at least as many palette entries as plotted sensors, defaults are
//! pairwise distinct. Overrides are never checked against anything.

use std::collections::{BTreeMap, HashSet};

use hwscope_types::{DEFAULT_PALETTE, Rgb};

/// Color assignment result keyed by sensor identifier.
pub type ColorMap = BTreeMap<String, Rgb>;

/// One tree-visible sensor as seen by the assigner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotEntry<K> {
    /// Sensor key in the resulting map.
    pub key: K,
    /// Whether the sensor is selected for charting.
    pub plotted: bool,
    /// Explicit pen color chosen by the user.
    pub pen_color: Option<Rgb>,
}

impl<K> PlotEntry<K> {
    /// A plotted sensor without an override.
    pub fn plotted(key: K) -> Self {
        Self {
            key,
            plotted: true,
            pen_color: None,
        }
    }

    /// A sensor that is visited but not plotted.
    pub fn unplotted(key: K) -> Self {
        Self {
            key,
            plotted: false,
            pen_color: None,
        }
    }

    /// Set the pen override.
    #[must_use]
    pub fn with_pen(mut self, color: Rgb) -> Self {
        self.pen_color = Some(color);
        self
    }
}

/// Maps plotted sensors to palette colors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotColorAssigner {
    palette: Vec<Rgb>,
}

impl Default for PlotColorAssigner {
    fn default() -> Self {
        Self::new(DEFAULT_PALETTE.to_vec())
    }
}

impl PlotColorAssigner {
    /// Create an assigner over `palette`.
    ///
    /// An empty palette is allowed; only override colors are produced then.
    pub fn new(palette: Vec<Rgb>) -> Self {
        Self { palette }
    }

    pub fn palette(&self) -> &[Rgb] {
        &self.palette
    }

    pub fn set_palette(&mut self, palette: Vec<Rgb>) {
        self.palette = palette;
    }

    /// Compute the color of every plotted entry.
    ///
    /// `entries` must list every tree-visible sensor in traversal order.
    /// Unplotted entries only advance the ordinal and never appear in the result.
    pub fn recompute<K: Ord + Clone>(&self, entries: &[PlotEntry<K>]) -> BTreeMap<K, Rgb> {
        let mut defaults: Vec<(&K, Rgb)> = Vec::new();
        let mut overrides: Vec<(&K, Rgb)> = Vec::new();

        if !self.palette.is_empty() {
            for (ordinal, entry) in entries.iter().enumerate() {
                if !entry.plotted {
                    continue;
                }
                match entry.pen_color {
                    Some(color) => overrides.push((&entry.key, color)),
                    None => defaults.push((&entry.key, self.palette[ordinal % self.palette.len()])),
                }
            }
        } else {
            overrides.extend(
                entries
                    .iter()
                    .filter(|e| e.plotted)
                    .filter_map(|e| e.pen_color.map(|c| (&e.key, c))),
            );
        }

        let mut used: HashSet<Rgb> = HashSet::new();
        for i in 0..defaults.len() {
            let color = defaults[i].1;
            if used.contains(&color) {
                let free = self
                    .palette
                    .iter()
                    .copied()
                    .find(|candidate| !defaults.iter().any(|(_, c)| c == candidate));
                if let Some(free) = free {
                    defaults[i].1 = free;
                    used.insert(free);
                }
            } else {
                used.insert(color);
            }
        }

        let mut map: BTreeMap<K, Rgb> = defaults.into_iter().map(|(k, c)| (k.clone(), c)).collect();
        for (key, color) in overrides {
            map.insert(key.clone(), color);
        }
        map
    }
}

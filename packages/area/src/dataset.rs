//! Load-once, read-only area dataset.

use std::collections::BTreeMap;
use std::path::Path;

use area_insights_area_models::{Area, LockedAreaStat, PinCode, ServedAreaStat};
use serde::de::DeserializeOwned;

use crate::DatasetError;

/// File name of the area table.
pub const AREAS_FILE: &str = "areas.json";
/// File name of the served-area statistics table.
pub const SERVED_STATS_FILE: &str = "stats.json";
/// File name of the unserved-area fallback statistics table.
pub const LOCKED_STATS_FILE: &str = "lockedArea.json";

/// Default directory holding the three fixture files.
pub const DEFAULT_DATA_DIR: &str = "data";

/// The statistics row attached to an area, picked by its served flag.
#[derive(Debug, Clone, Copy)]
pub enum AreaStat<'a> {
    /// Operational statistics of a served area.
    Served(&'a ServedAreaStat),
    /// Socioeconomic statistics of an unserved area.
    Locked(&'a LockedAreaStat),
}

impl AreaStat<'_> {
    /// Looks up a metric by its camelCase field name.
    #[must_use]
    pub fn metric(&self, name: &str) -> Option<serde_json::Value> {
        match self {
            Self::Served(stat) => stat.metric(name),
            Self::Locked(stat) => stat.metric(name),
        }
    }
}

/// The three static tables, indexed by pin code.
///
/// Built once at startup and shared behind an `Arc`; there is no way to
/// mutate it after construction.
#[derive(Debug)]
pub struct Dataset {
    areas: Vec<Area>,
    names_lower: Vec<String>,
    by_pin: BTreeMap<PinCode, usize>,
    served_stats: BTreeMap<PinCode, ServedAreaStat>,
    locked_stats: BTreeMap<PinCode, LockedAreaStat>,
}

impl Dataset {
    /// Builds a dataset from already-parsed tables.
    ///
    /// Statistics rows whose pin code does not belong to any area are
    /// logged and dropped, so lookups for them report "not found".
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::DuplicatePinCode`] if two areas share a pin
    /// code.
    pub fn new(
        areas: Vec<Area>,
        served_stats: Vec<ServedAreaStat>,
        locked_stats: Vec<LockedAreaStat>,
    ) -> Result<Self, DatasetError> {
        let mut by_pin = BTreeMap::new();
        for (idx, area) in areas.iter().enumerate() {
            if by_pin.insert(area.pin_code, idx).is_some() {
                return Err(DatasetError::DuplicatePinCode(area.pin_code));
            }
        }

        let served_stats = index_stats(served_stats, &by_pin, SERVED_STATS_FILE, |s| s.pin_code);
        let locked_stats = index_stats(locked_stats, &by_pin, LOCKED_STATS_FILE, |s| s.pin_code);

        let names_lower = areas.iter().map(|a| a.name.to_lowercase()).collect();

        Ok(Self {
            areas,
            names_lower,
            by_pin,
            served_stats,
            locked_stats,
        })
    }

    /// Loads `areas.json`, `stats.json` and `lockedArea.json` from `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if a file is missing, malformed, or the
    /// area table has duplicate pin codes.
    pub fn load_from_dir(dir: &Path) -> Result<Self, DatasetError> {
        let areas: Vec<Area> = read_table(&dir.join(AREAS_FILE))?;
        let served: Vec<ServedAreaStat> = read_table(&dir.join(SERVED_STATS_FILE))?;
        let locked: Vec<LockedAreaStat> = read_table(&dir.join(LOCKED_STATS_FILE))?;

        let dataset = Self::new(areas, served, locked)?;
        log::info!(
            "Loaded {} areas ({} served stats, {} locked stats) from {}",
            dataset.areas.len(),
            dataset.served_stats.len(),
            dataset.locked_stats.len(),
            dir.display()
        );
        Ok(dataset)
    }

    /// Parses the three tables from JSON strings.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if any table is malformed or the area table
    /// has duplicate pin codes.
    pub fn from_json_str(areas: &str, served: &str, locked: &str) -> Result<Self, DatasetError> {
        Self::new(
            parse_table(AREAS_FILE, areas)?,
            parse_table(SERVED_STATS_FILE, served)?,
            parse_table(LOCKED_STATS_FILE, locked)?,
        )
    }

    /// All areas in fixture order.
    #[must_use]
    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    /// Area names lower-cased, paired with their area, in fixture order.
    pub fn lower_names(&self) -> impl Iterator<Item = (&str, &Area)> {
        self.names_lower
            .iter()
            .map(String::as_str)
            .zip(self.areas.iter())
    }

    /// Finds an area by pin code.
    #[must_use]
    pub fn area(&self, pin_code: PinCode) -> Option<&Area> {
        self.by_pin.get(&pin_code).map(|&idx| &self.areas[idx])
    }

    /// Finds an area by case-insensitive exact name.
    #[must_use]
    pub fn area_by_name(&self, name: &str) -> Option<&Area> {
        let needle = name.trim().to_lowercase();
        self.lower_names()
            .find(|(lower, _)| *lower == needle)
            .map(|(_, area)| area)
    }

    /// Statistics row of a served area.
    #[must_use]
    pub fn served_stat(&self, pin_code: PinCode) -> Option<&ServedAreaStat> {
        self.served_stats.get(&pin_code)
    }

    /// Fallback statistics row of an unserved area.
    #[must_use]
    pub fn locked_stat(&self, pin_code: PinCode) -> Option<&LockedAreaStat> {
        self.locked_stats.get(&pin_code)
    }

    /// The statistics row matching the area's served flag.
    #[must_use]
    pub fn stat_for(&self, area: &Area) -> Option<AreaStat<'_>> {
        if area.is_served {
            self.served_stat(area.pin_code).map(AreaStat::Served)
        } else {
            self.locked_stat(area.pin_code).map(AreaStat::Locked)
        }
    }

    /// The statistics row for a pin code from either table, served first.
    #[must_use]
    pub fn any_stat(&self, pin_code: PinCode) -> Option<AreaStat<'_>> {
        self.served_stat(pin_code)
            .map(AreaStat::Served)
            .or_else(|| self.locked_stat(pin_code).map(AreaStat::Locked))
    }
}

fn index_stats<T>(
    rows: Vec<T>,
    by_pin: &BTreeMap<PinCode, usize>,
    table: &str,
    pin_of: impl Fn(&T) -> PinCode,
) -> BTreeMap<PinCode, T> {
    let mut indexed = BTreeMap::new();
    for row in rows {
        let pin = pin_of(&row);
        if !by_pin.contains_key(&pin) {
            log::warn!("{table}: pin code {pin} has no matching area, ignoring row");
            continue;
        }
        if indexed.contains_key(&pin) {
            log::warn!("{table}: duplicate row for pin code {pin}, keeping the first");
            continue;
        }
        indexed.insert(pin, row);
    }
    indexed
}

fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, DatasetError> {
    let raw = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_table(&path.display().to_string(), &raw)
}

fn parse_table<T: DeserializeOwned>(name: &str, raw: &str) -> Result<Vec<T>, DatasetError> {
    serde_json::from_str(raw).map_err(|source| DatasetError::Json {
        path: name.to_string(),
        source,
    })
}

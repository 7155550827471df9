//! Blueprint database and resolver.
//!
//! `BlueprintDatabase` holds the loaded unit, building and locale tables and
//! is immutable once built, so one instance can back any number of
//! concurrent enrichment runs through an `Arc`. `BlueprintResolver` is the
//! cheap per-run handle the pipeline talks to.

use ahash::AHashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::schema::{BlueprintEntry, BuildingFile, LocaleFile, UnitFile};
use super::tables;
use crate::core::error::{EnrichError, Result};
use crate::core::types::{title_case, Pbgid};

pub const UNIT_FILE: &str = "sbps.json";
pub const BUILDING_FILE: &str = "ebps.json";
pub const FALLBACK_LOCALE_FILE: &str = "locstring.json";

/// Which database an entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlueprintKind {
    Unit,
    Building,
}

/// Display category of a resolved blueprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UnitCategory {
    Infantry,
    Vehicle,
    Aircraft,
    Support,
    Engineer,
    Building,
    Unit,
}

impl UnitCategory {
    /// Category from the unit database sub-category the entry sits in
    pub fn from_group(group: &str) -> Option<Self> {
        match group {
            "vehicles" => Some(UnitCategory::Vehicle),
            "infantry" => Some(UnitCategory::Infantry),
            "aircraft" => Some(UnitCategory::Aircraft),
            "emplacements" | "team_weapons" => Some(UnitCategory::Support),
            _ => None,
        }
    }

    /// Guess from the entry key when there is no structural category
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.to_lowercase();
        if ["vehicle", "tank", "halftrack"].iter().any(|w| key.contains(w)) {
            Some(UnitCategory::Vehicle)
        } else if ["engineer", "pioneer"].iter().any(|w| key.contains(w)) {
            Some(UnitCategory::Engineer)
        } else if ["gun", "mortar", "mg"].iter().any(|w| key.contains(w)) {
            Some(UnitCategory::Support)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UnitCategory::Infantry => "Infantry",
            UnitCategory::Vehicle => "Vehicle",
            UnitCategory::Aircraft => "Aircraft",
            UnitCategory::Support => "Support",
            UnitCategory::Engineer => "Engineer",
            UnitCategory::Building => "Building",
            UnitCategory::Unit => "Unit",
        }
    }
}

impl fmt::Display for UnitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved blueprint information
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitInfo {
    pub name: String,
    pub faction: String,
    pub category: UnitCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub kind: BlueprintKind,
}

/// Display name for a faction key of the reference data
pub fn faction_display_name(key: &str) -> String {
    match key {
        "afrika_korps" => "Afrika Korps".to_string(),
        "american" => "US Forces".to_string(),
        "british" | "british_africa" => "British".to_string(),
        "german" => "Wehrmacht".to_string(),
        "common" => "Common".to_string(),
        _ => title_case(key),
    }
}

/// Counts gathered while indexing, for the load log line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub units: usize,
    pub buildings: usize,
    pub locstrings: usize,
    /// Entries without a usable pbgid
    pub skipped: usize,
    /// Entries whose pbgid was already taken within the same database
    pub duplicates: usize,
}

/// Immutable, indexed reference data
#[derive(Debug, Default)]
pub struct BlueprintDatabase {
    /// Unit entries by decimal pbgid
    units: AHashMap<String, UnitInfo>,
    /// Building entries by decimal pbgid
    buildings: AHashMap<String, UnitInfo>,
    locale_loaded: bool,
    stats: LoadStats,
}

impl BlueprintDatabase {
    /// Load `sbps.json`, `ebps.json` and the locale table from a data
    /// directory. The locale table is optional.
    pub fn load(data_dir: &Path, locale: &str) -> Result<Self> {
        let units: UnitFile = read_json(&data_dir.join(UNIT_FILE))?;
        let buildings: BuildingFile = read_json(&data_dir.join(BUILDING_FILE))?;
        let locstrings = load_locale(data_dir, locale);

        let database = Self::from_parts(&units, &buildings, locstrings);
        tracing::info!(
            "Loaded blueprint data from {}: {} units, {} buildings, {} locstrings ({} skipped, {} duplicate ids)",
            data_dir.display(),
            database.stats.units,
            database.stats.buildings,
            database.stats.locstrings,
            database.stats.skipped,
            database.stats.duplicates,
        );
        Ok(database)
    }

    /// Build from in-memory JSON documents
    pub fn from_json_strs(units: &str, buildings: &str, locstrings: Option<&str>) -> Result<Self> {
        let units: UnitFile = serde_json::from_str(units)?;
        let buildings: BuildingFile = serde_json::from_str(buildings)?;
        let locstrings = match locstrings {
            Some(json) => Some(serde_json::from_str::<LocaleFile>(json)?),
            None => None,
        };
        Ok(Self::from_parts(&units, &buildings, locstrings))
    }

    /// Index parsed files. Search order is units before buildings, then
    /// faction, sub-category and entry key in sorted order; the first entry
    /// claiming a pbgid keeps it.
    pub fn from_parts(
        units: &UnitFile,
        buildings: &BuildingFile,
        locstrings: Option<LocaleFile>,
    ) -> Self {
        let locale_loaded = locstrings.is_some();
        let locstrings: AHashMap<String, String> = locstrings
            .map(|file| file.strings.0.into_iter().collect())
            .unwrap_or_default();

        let mut stats = LoadStats {
            locstrings: locstrings.len(),
            ..Default::default()
        };

        let mut unit_index = AHashMap::new();
        for (faction_key, groups) in units.races.iter() {
            let faction = faction_display_name(faction_key);
            for (group, entries) in groups.iter() {
                for (key, entry) in entries.iter() {
                    let category = UnitCategory::from_group(group)
                        .or_else(|| UnitCategory::from_key(key))
                        .unwrap_or(UnitCategory::Unit);
                    let info = describe(entry, key, &faction, category, BlueprintKind::Unit, &locstrings);
                    index_entry(&mut unit_index, entry, info, &mut stats);
                }
            }
        }

        let mut building_index = AHashMap::new();
        for (faction_key, entries) in buildings.races.iter() {
            let faction = faction_display_name(faction_key);
            for (key, entry) in entries.iter() {
                let category = UnitCategory::from_key(key).unwrap_or(UnitCategory::Building);
                let info = describe(entry, key, &faction, category, BlueprintKind::Building, &locstrings);
                index_entry(&mut building_index, entry, info, &mut stats);
            }
        }

        stats.units = unit_index.len();
        stats.buildings = building_index.len();

        Self {
            units: unit_index,
            buildings: building_index,
            locale_loaded,
            stats,
        }
    }

    /// Look up a decimal pbgid, unit database first
    pub fn lookup(&self, key: &str) -> Option<&UnitInfo> {
        self.lookup_unit(key).or_else(|| self.lookup_building(key))
    }

    pub fn lookup_unit(&self, key: &str) -> Option<&UnitInfo> {
        self.units.get(key)
    }

    pub fn lookup_building(&self, key: &str) -> Option<&UnitInfo> {
        self.buildings.get(key)
    }

    pub fn locale_loaded(&self) -> bool {
        self.locale_loaded
    }

    pub fn stats(&self) -> LoadStats {
        self.stats
    }
}

fn describe(
    entry: &BlueprintEntry,
    key: &str,
    faction: &str,
    category: UnitCategory,
    kind: BlueprintKind,
    locstrings: &AHashMap<String, String>,
) -> UnitInfo {
    let localized = |refs: Vec<String>| {
        refs.into_iter()
            .find_map(|id| locstrings.get(&id).filter(|s| !s.is_empty()).cloned())
    };
    UnitInfo {
        name: localized(entry.name_refs()).unwrap_or_else(|| title_case(key)),
        faction: faction.to_string(),
        category,
        description: localized(entry.description_refs()),
        kind,
    }
}

fn index_entry(
    index: &mut AHashMap<String, UnitInfo>,
    entry: &BlueprintEntry,
    info: UnitInfo,
    stats: &mut LoadStats,
) {
    let Some(pbgid) = entry.pbgid_key() else {
        stats.skipped += 1;
        return;
    };
    if index.contains_key(&pbgid) {
        stats.duplicates += 1;
        return;
    }
    index.insert(pbgid, info);
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|source| EnrichError::DataIo {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| EnrichError::DataParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Locale-specific table first, then the generic one; `None` if neither loads
fn load_locale(data_dir: &Path, locale: &str) -> Option<LocaleFile> {
    let candidates = [
        data_dir.join("locales").join(format!("{}-locstring.json", locale)),
        data_dir.join(FALLBACK_LOCALE_FILE),
    ];
    for path in &candidates {
        match read_json::<LocaleFile>(path) {
            Ok(file) => return Some(file),
            Err(e) => tracing::debug!("Locale table unavailable: {}", e),
        }
    }
    tracing::warn!(
        "No locale table for '{}' under {}; names fall back to blueprint keys",
        locale,
        data_dir.display()
    );
    None
}

/// Per-run resolver over a shared database
#[derive(Debug, Clone)]
pub struct BlueprintResolver {
    database: Arc<BlueprintDatabase>,
}

impl BlueprintResolver {
    pub fn new(database: Arc<BlueprintDatabase>) -> Self {
        Self { database }
    }

    /// Load a fresh database and wrap it
    pub fn load(data_dir: &Path, locale: &str) -> Result<Self> {
        Ok(Self::new(Arc::new(BlueprintDatabase::load(data_dir, locale)?)))
    }

    /// Resolve a unit or building pbgid; unit entries win over building
    /// entries with the same id
    pub fn resolve(&self, pbgid: Pbgid) -> Option<&UnitInfo> {
        self.database.lookup(&pbgid.key())
    }

    /// Resolve a decoder identifier string; malformed strings resolve to nothing
    pub fn resolve_str(&self, raw: &str) -> Option<&UnitInfo> {
        Pbgid::parse(raw).and_then(|pbgid| self.resolve(pbgid))
    }

    pub fn friendly_name(&self, pbgid: Pbgid) -> Option<&str> {
        self.resolve(pbgid).map(|info| info.name.as_str())
    }

    pub fn battlegroup_name(&self, pbgid: Pbgid) -> Option<&'static str> {
        tables::battlegroup_name(pbgid)
    }

    pub fn upgrade_name(&self, pbgid: Pbgid) -> Option<&'static str> {
        tables::upgrade_name(pbgid)
    }

    pub fn database(&self) -> &Arc<BlueprintDatabase> {
        &self.database
    }
}

/// Loaded databases keyed by data directory and locale.
///
/// Owned by whoever hosts the pipeline (a server, a batch job); each lookup
/// hands out a shared handle to the same immutable tables.
#[derive(Debug, Default)]
pub struct DatabaseCache {
    entries: Mutex<AHashMap<(PathBuf, String), Arc<BlueprintDatabase>>>,
}

impl DatabaseCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, AHashMap<(PathBuf, String), Arc<BlueprintDatabase>>> {
        // Entries are only ever inserted whole, so a poisoned map is still valid
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the cached database or load it. Failed loads are not cached.
    ///
    /// The lock is not held while reading from disk. When two callers load the
    /// same key concurrently, the first insert wins and both get that database.
    pub fn get_or_load(&self, data_dir: &Path, locale: &str) -> Result<Arc<BlueprintDatabase>> {
        let key = (data_dir.to_path_buf(), locale.to_string());
        let cached = self.entries().get(&key).cloned();
        if let Some(database) = cached {
            return Ok(database);
        }

        let loaded = Arc::new(BlueprintDatabase::load(data_dir, locale)?);
        Ok(Arc::clone(self.entries().entry(key).or_insert(loaded)))
    }

    pub fn resolver(&self, data_dir: &Path, locale: &str) -> Result<BlueprintResolver> {
        self.get_or_load(data_dir, locale).map(BlueprintResolver::new)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNITS: &str = r#"{"races": {
        "afrika_korps": {
            "infantry": {
                "panzergrenadier_ak": {"pbgid": 198340, "extensions": [
                    {"squadexts": {"race_list": [{"race_data": {"info": {
                        "screen_name": {"locstring": {"value": "100"}},
                        "help_text": {"locstring": {"value": "101"}}
                    }}}]}}
                ]},
                "no_id_squad": {"extensions": []}
            },
            "vehicles": {
                "stug_iii_d_ak": {"pbgid": 2033664}
            },
            "misc": {
                "halftrack_250_ak": {"pbgid": 2063111.0},
                "walking_stuka_ak": {"pbgid": 198413}
            }
        },
        "german": {
            "team_weapons": {"mg42_ger": {"pbgid": 198347}}
        },
        "soviet_union": {
            "infantry": {"conscripts": {"pbgid": 555}}
        }
    }}"#;

    const BUILDINGS: &str = r#"{"races": {
        "afrika_korps": {
            "light_support_kompanie_ak": {"pbgid": 198236, "ui_info": {"screen_name_id": 200}},
            "mechanized_kompanie_ak": {"pbgid": 198237},
            "shared_id_building": {"pbgid": 198340}
        },
        "german": {
            "mortar_pit_ger": {"pbgid": 300}
        }
    }}"#;

    const LOCALE: &str = r#"{"100": "Panzergrenadier Squad", "101": "Elite infantry.", "200": "Light Support Kompanie"}"#;

    fn resolver() -> BlueprintResolver {
        let db = BlueprintDatabase::from_json_strs(UNITS, BUILDINGS, Some(LOCALE)).unwrap();
        BlueprintResolver::new(Arc::new(db))
    }

    #[test]
    fn test_localized_unit() {
        let resolver = resolver();
        let info = resolver.resolve(Pbgid(198340)).unwrap();
        assert_eq!(info.name, "Panzergrenadier Squad");
        assert_eq!(info.faction, "Afrika Korps");
        assert_eq!(info.category, UnitCategory::Infantry);
        assert_eq!(info.description.as_deref(), Some("Elite infantry."));
        assert_eq!(info.kind, BlueprintKind::Unit);
    }

    #[test]
    fn test_unit_wins_over_building() {
        let resolver = resolver();
        assert_eq!(resolver.resolve(Pbgid(198340)).unwrap().kind, BlueprintKind::Unit);
        let building = resolver.database().lookup_building("198340").unwrap();
        assert_eq!(building.name, "Shared Id Building");
    }

    #[test]
    fn test_building_resolution() {
        let resolver = resolver();
        let info = resolver.resolve(Pbgid(198236)).unwrap();
        assert_eq!(info.name, "Light Support Kompanie");
        assert_eq!(info.kind, BlueprintKind::Building);
        assert_eq!(info.category, UnitCategory::Building);

        let fallback = resolver.resolve(Pbgid(198237)).unwrap();
        assert_eq!(fallback.name, "Mechanized Kompanie Ak");
        assert!(fallback.description.is_none());
    }

    #[test]
    fn test_categories() {
        let resolver = resolver();
        assert_eq!(resolver.resolve(Pbgid(2033664)).unwrap().category, UnitCategory::Vehicle);
        assert_eq!(resolver.resolve(Pbgid(198347)).unwrap().category, UnitCategory::Support);
        // unknown sub-category falls back to key keywords, then Unit
        assert_eq!(resolver.resolve(Pbgid(2063111)).unwrap().category, UnitCategory::Vehicle);
        assert_eq!(resolver.resolve(Pbgid(198413)).unwrap().category, UnitCategory::Unit);
        // building keys use keywords too
        assert_eq!(resolver.resolve(Pbgid(300)).unwrap().category, UnitCategory::Support);
    }

    #[test]
    fn test_faction_names() {
        let resolver = resolver();
        assert_eq!(resolver.resolve(Pbgid(198347)).unwrap().faction, "Wehrmacht");
        assert_eq!(resolver.resolve(Pbgid(555)).unwrap().faction, "Soviet Union");
        assert_eq!(faction_display_name("american"), "US Forces");
        assert_eq!(faction_display_name("british_africa"), "British");
    }

    #[test]
    fn test_misses() {
        let resolver = resolver();
        assert!(resolver.resolve(Pbgid(1)).is_none());
        assert!(resolver.resolve_str("not-a-number").is_none());
        assert_eq!(resolver.resolve_str("2033664").unwrap().name, "Stug Iii D Ak");
    }

    #[test]
    fn test_static_tables_through_resolver() {
        let resolver = resolver();
        assert_eq!(resolver.battlegroup_name(Pbgid(199091)), Some("Luftwaffe"));
        assert_eq!(resolver.upgrade_name(Pbgid(170742)), Some("Medical Station (Wehrmacht)"));
        // static tables never consult the blueprint databases
        assert_eq!(resolver.battlegroup_name(Pbgid(198340)), None);
    }

    #[test]
    fn test_missing_locale_degrades_to_keys() {
        let db = BlueprintDatabase::from_json_strs(UNITS, BUILDINGS, None).unwrap();
        assert!(!db.locale_loaded());
        assert_eq!(db.lookup("198340").unwrap().name, "Panzergrenadier Ak");
        assert_eq!(db.lookup("198340").unwrap().description, None);
    }

    #[test]
    fn test_load_stats() {
        let db = BlueprintDatabase::from_json_strs(UNITS, BUILDINGS, Some(LOCALE)).unwrap();
        let stats = db.stats();
        assert_eq!(stats.units, 6);
        assert_eq!(stats.buildings, 4);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.locstrings, 3);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(BlueprintDatabase::from_json_strs("{", BUILDINGS, None).is_err());
    }

    #[test]
    fn test_load_missing_directory_fails() {
        let missing = Path::new("/nonexistent/coh3-data");
        let err = BlueprintDatabase::load(missing, "en").unwrap_err();
        assert!(matches!(err, EnrichError::DataIo { .. }));
        assert!(err.to_string().contains("sbps.json"));

        let cache = DatabaseCache::new();
        assert!(cache.get_or_load(missing, "en").is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_survives_poisoned_lock() {
        let cache = Arc::new(DatabaseCache::new());
        let dir = Path::new("/nonexistent/coh3-data");
        let db = Arc::new(BlueprintDatabase::from_json_strs(UNITS, BUILDINGS, None).unwrap());
        cache
            .entries()
            .insert((dir.to_path_buf(), "en".to_string()), Arc::clone(&db));

        let holder = Arc::clone(&cache);
        let panicked = std::thread::spawn(move || {
            let _guard = holder.entries.lock().unwrap();
            panic!("panic while holding the cache lock");
        })
        .join();
        assert!(panicked.is_err());
        assert!(cache.entries.is_poisoned());

        // both paths see the same entry; the hit never touches the missing directory
        assert_eq!(cache.len(), 1);
        let hit = cache.get_or_load(dir, "en").unwrap();
        assert!(Arc::ptr_eq(&hit, &db));
        assert!(cache.get_or_load(dir, "de").is_err());
        assert_eq!(cache.len(), 1);
    }
}

//! Reference data schema for JSON deserialization.
//!
//! The unit (`sbps.json`) and building (`ebps.json`) databases are large,
//! externally owned documents of which only a few nested fields matter here.
//! Every level is optional and tolerant: a value of the wrong shape reads as
//! absent instead of failing the whole document.

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::{Number, Value};
use std::collections::BTreeMap;

/// Optional value that reads as `None` when present but malformed
#[derive(Debug, Clone)]
pub struct Lenient<T>(pub Option<T>);

impl<T> Default for Lenient<T> {
    fn default() -> Self {
        Lenient(None)
    }
}

impl<T> Lenient<T> {
    pub fn get(&self) -> Option<&T> {
        self.0.as_ref()
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Lenient<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Lenient(serde_json::from_value(value).ok()))
    }
}

/// Sequence that silently drops elements of the wrong shape
#[derive(Debug, Clone)]
pub struct LenientVec<T>(pub Vec<T>);

impl<T> Default for LenientVec<T> {
    fn default() -> Self {
        LenientVec(Vec::new())
    }
}

impl<T> LenientVec<T> {
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for LenientVec<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = match Value::deserialize(deserializer)? {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
            _ => Vec::new(),
        };
        Ok(LenientVec(items))
    }
}

/// String-keyed map that silently drops entries of the wrong shape.
/// Keys iterate in sorted order.
#[derive(Debug, Clone)]
pub struct LenientMap<T>(pub BTreeMap<String, T>);

impl<T> Default for LenientMap<T> {
    fn default() -> Self {
        LenientMap(BTreeMap::new())
    }
}

impl<T> LenientMap<T> {
    pub fn iter(&self) -> std::collections::btree_map::Iter<'_, String, T> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for LenientMap<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = match Value::deserialize(deserializer)? {
            Value::Object(map) => map
                .into_iter()
                .filter_map(|(key, value)| serde_json::from_value(value).ok().map(|v| (key, v)))
                .collect(),
            _ => BTreeMap::new(),
        };
        Ok(LenientMap(entries))
    }
}

/// Identifier stored either as a JSON number or a string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(Number),
    Text(String),
}

impl RawId {
    /// Canonical decimal-string form. Floats are only accepted when they
    /// carry no fractional part.
    pub fn as_key(&self) -> Option<String> {
        match self {
            RawId::Number(n) => {
                if let Some(v) = n.as_u64() {
                    Some(v.to_string())
                } else if let Some(v) = n.as_i64() {
                    Some(v.to_string())
                } else {
                    n.as_f64()
                        .filter(|f| f.is_finite() && f.fract() == 0.0)
                        .map(|f| format!("{:.0}", f))
                }
            }
            RawId::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
        }
    }
}

/// `{ "locstring": { "value": "<id>" } }`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocRef {
    #[serde(default)]
    pub locstring: Lenient<LocValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocValue {
    #[serde(default)]
    pub value: Lenient<RawId>,
}

impl LocRef {
    pub fn key(&self) -> Option<String> {
        self.locstring.get()?.value.get()?.as_key()
    }
}

/// Squad UI block: `race_data.info`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RaceInfo {
    #[serde(default)]
    pub screen_name: Lenient<LocRef>,
    #[serde(default)]
    pub help_text: Lenient<LocRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RaceData {
    #[serde(default)]
    pub info: Lenient<RaceInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RaceListItem {
    #[serde(default)]
    pub race_data: Lenient<RaceData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SquadExts {
    #[serde(default)]
    pub race_list: LenientVec<RaceListItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Extension {
    #[serde(default)]
    pub squadexts: Lenient<SquadExts>,
}

/// Flat UI block used by entity blueprints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UiInfo {
    #[serde(default)]
    pub screen_name_id: Lenient<RawId>,
    #[serde(default)]
    pub help_text_id: Lenient<RawId>,
}

/// One unit or building definition
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlueprintEntry {
    #[serde(default)]
    pub pbgid: Lenient<RawId>,
    #[serde(default)]
    pub ui_info: Lenient<UiInfo>,
    #[serde(default)]
    pub extensions: LenientVec<Extension>,
}

/// Locstring id meaning "no text"
const EMPTY_LOCSTRING: &str = "0";

impl BlueprintEntry {
    pub fn pbgid_key(&self) -> Option<String> {
        self.pbgid.get()?.as_key()
    }

    fn race_infos(&self) -> impl Iterator<Item = &RaceInfo> {
        self.extensions
            .iter()
            .filter_map(|ext| ext.squadexts.get())
            .flat_map(|squadexts| squadexts.race_list.iter())
            .filter_map(|item| item.race_data.get())
            .filter_map(|race_data| race_data.info.get())
    }

    /// Candidate locstring ids for the display name, most specific first
    pub fn name_refs(&self) -> Vec<String> {
        let mut refs: Vec<String> = self
            .race_infos()
            .filter_map(|info| info.screen_name.get().and_then(LocRef::key))
            .collect();
        if let Some(key) = self
            .ui_info
            .get()
            .and_then(|ui| ui.screen_name_id.get())
            .and_then(RawId::as_key)
        {
            refs.push(key);
        }
        refs.retain(|key| key != EMPTY_LOCSTRING);
        refs
    }

    /// Candidate locstring ids for the description
    pub fn description_refs(&self) -> Vec<String> {
        let mut refs: Vec<String> = self
            .race_infos()
            .filter_map(|info| info.help_text.get().and_then(LocRef::key))
            .collect();
        if let Some(key) = self
            .ui_info
            .get()
            .and_then(|ui| ui.help_text_id.get())
            .and_then(RawId::as_key)
        {
            refs.push(key);
        }
        refs.retain(|key| key != EMPTY_LOCSTRING);
        refs
    }
}

/// `sbps.json`: races -> faction -> sub-category -> unit key -> entry
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UnitFile {
    #[serde(default)]
    pub races: LenientMap<LenientMap<LenientMap<BlueprintEntry>>>,
}

/// `ebps.json`: races -> faction -> entity key -> entry
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildingFile {
    #[serde(default)]
    pub races: LenientMap<LenientMap<BlueprintEntry>>,
}

/// Locale table: locstring id -> display string
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct LocaleFile {
    pub strings: LenientMap<String>,
}

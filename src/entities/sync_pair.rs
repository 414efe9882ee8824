// 🧩 Sync Pair Entity - Canonical roster pairing from the static catalog
//
// "Display name is a VALUE, (dex, pokemon) is IDENTITY"
//
// Identity: PairId = dexNumber | pokemonNumber (stable across catalog versions)
// Values:   trainer / alt / pokemon / forms / images (immutable once loaded)

use crate::error::LoadError;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

// ============================================================================
// PAIR IDENTITY
// ============================================================================

/// Two-part composite identity, rendered as `"dex|pokemon"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PairId {
    pub dex: String,
    pub pokemon: String,
}

impl PairId {
    pub fn new(dex: impl Into<String>, pokemon: impl Into<String>) -> Self {
        PairId {
            dex: dex.into(),
            pokemon: pokemon.into(),
        }
    }
}

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.dex, self.pokemon)
    }
}

impl FromStr for PairId {
    type Err = String;

    /// First segment is the dex number, the rest (re-joined) the pokemon number
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('|') {
            Some((dex, pokemon)) if !dex.trim().is_empty() && !pokemon.trim().is_empty() => {
                Ok(PairId::new(dex.trim(), pokemon.trim()))
            }
            _ => Err(format!("Invalid pair id (expected \"dex|pokemon\"): {}", s)),
        }
    }
}

impl From<PairId> for String {
    fn from(id: PairId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for PairId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ============================================================================
// SYNC PAIR ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPair {
    #[serde(deserialize_with = "id_segment")]
    pub dex_number: String,

    #[serde(deserialize_with = "id_segment")]
    pub pokemon_number: String,

    /// Primary name
    #[serde(default)]
    pub trainer_name: String,

    /// Alternate-form tag, e.g. "Sygna Suit (Renegade)"
    #[serde(default)]
    pub trainer_alt: Option<String>,

    /// Secondary name
    #[serde(default)]
    pub pokemon_name: String,

    /// Form qualifiers, e.g. ["Alolan"]
    #[serde(default)]
    pub pokemon_form: Option<Vec<String>>,

    #[serde(default)]
    pub images: BTreeSet<String>,
}

impl SyncPair {
    pub fn id(&self) -> PairId {
        PairId::new(self.dex_number.clone(), self.pokemon_number.clone())
    }

    /// Alternate-form tag, treating "" as absent
    pub fn alt(&self) -> Option<&str> {
        self.trainer_alt
            .as_deref()
            .map(str::trim)
            .filter(|alt| !alt.is_empty())
    }

    pub fn forms(&self) -> &[String] {
        self.pokemon_form.as_deref().unwrap_or(&[])
    }

    /// "Trainer (Alt) & Pokemon Form"
    pub fn display_name(&self) -> String {
        let alt = self.alt().map(|a| format!(" ({})", a)).unwrap_or_default();
        let form = if self.forms().is_empty() {
            String::new()
        } else {
            format!(" {}", self.forms().join(" "))
        };
        format!("{}{} & {}{}", self.trainer_name, alt, self.pokemon_name, form)
    }
}

/// Catalog ids show up as both numbers and strings
fn id_segment<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Segment {
        Text(String),
        Number(i64),
    }

    Ok(match Segment::deserialize(deserializer)? {
        Segment::Text(s) => s.trim().to_string(),
        Segment::Number(n) => n.to_string(),
    })
}

// ============================================================================
// CATALOG
// ============================================================================

/// Static catalog of every known sync pair, loaded once at startup
#[derive(Debug, Clone, Default)]
pub struct SyncPairCatalog {
    pairs: Vec<Arc<SyncPair>>,
    by_id: HashMap<PairId, usize>,
}

impl SyncPairCatalog {
    pub fn new(pairs: Vec<SyncPair>) -> Self {
        let mut catalog = SyncPairCatalog::default();
        for pair in pairs {
            let id = pair.id();
            // First definition of an id wins
            if catalog.by_id.contains_key(&id) {
                continue;
            }
            catalog.by_id.insert(id, catalog.pairs.len());
            catalog.pairs.push(Arc::new(pair));
        }
        catalog
    }

    pub fn from_json_str(json: &str) -> Result<Self, LoadError> {
        let pairs: Vec<SyncPair> = serde_json::from_str(json).map_err(|source| LoadError::Json {
            what: "sync pair catalog",
            source,
        })?;
        Ok(SyncPairCatalog::new(pairs))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let json = LoadError::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }

    pub fn get(&self, id: &PairId) -> Option<&Arc<SyncPair>> {
        self.by_id.get(id).map(|&i| &self.pairs[i])
    }

    pub fn contains(&self, id: &PairId) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn pairs(&self) -> &[Arc<SyncPair>] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG_JSON: &str = r#"[
        {"dexNumber": 5, "pokemonNumber": 12, "trainerName": "Lear", "trainerAlt": "Sygna Suit",
         "pokemonName": "Hoopa", "images": ["icons/lear_ss.png"]},
        {"dexNumber": "7", "pokemonNumber": "3", "trainerName": "Red", "pokemonName": "Pikachu"},
        {"dexNumber": 9, "pokemonNumber": 1, "trainerName": "Hau", "trainerAlt": "",
         "pokemonName": "Raichu", "pokemonForm": ["Alolan"]}
    ]"#;

    #[test]
    fn test_pair_id_roundtrip_text() {
        let id: PairId = "5|12".parse().unwrap();
        assert_eq!(id, PairId::new("5", "12"));
        assert_eq!(id.to_string(), "5|12");
    }

    #[test]
    fn test_pair_id_keeps_extra_segments_in_pokemon_part() {
        let id: PairId = "5|12|extra".parse().unwrap();
        assert_eq!(id.dex, "5");
        assert_eq!(id.pokemon, "12|extra");
    }

    #[test]
    fn test_pair_id_rejects_malformed() {
        assert!("512".parse::<PairId>().is_err());
        assert!("|12".parse::<PairId>().is_err());
        assert!("5|".parse::<PairId>().is_err());
    }

    #[test]
    fn test_catalog_loads_numeric_and_string_ids() {
        let catalog = SyncPairCatalog::from_json_str(CATALOG_JSON).unwrap();

        assert_eq!(catalog.len(), 3);
        assert!(catalog.contains(&PairId::new("5", "12")));
        assert!(catalog.contains(&PairId::new("7", "3")));

        let lear = catalog.get(&PairId::new("5", "12")).unwrap();
        assert_eq!(lear.trainer_name, "Lear");
        assert_eq!(lear.alt(), Some("Sygna Suit"));
        assert!(lear.images.contains("icons/lear_ss.png"));
    }

    #[test]
    fn test_catalog_rejects_malformed_json() {
        let result = SyncPairCatalog::from_json_str("{not json");
        assert!(matches!(result, Err(LoadError::Json { .. })));
    }

    #[test]
    fn test_display_name() {
        let catalog = SyncPairCatalog::from_json_str(CATALOG_JSON).unwrap();

        let lear = catalog.get(&PairId::new("5", "12")).unwrap();
        assert_eq!(lear.display_name(), "Lear (Sygna Suit) & Hoopa");

        // Empty alt is treated as absent
        let hau = catalog.get(&PairId::new("9", "1")).unwrap();
        assert_eq!(hau.alt(), None);
        assert_eq!(hau.display_name(), "Hau & Raichu Alolan");
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let catalog = SyncPairCatalog::new(vec![
            SyncPair {
                dex_number: "1".to_string(),
                pokemon_number: "1".to_string(),
                trainer_name: "First".to_string(),
                trainer_alt: None,
                pokemon_name: "Mon".to_string(),
                pokemon_form: None,
                images: BTreeSet::new(),
            },
            SyncPair {
                dex_number: "1".to_string(),
                pokemon_number: "1".to_string(),
                trainer_name: "Second".to_string(),
                trainer_alt: None,
                pokemon_name: "Mon".to_string(),
                pokemon_form: None,
                images: BTreeSet::new(),
            },
        ]);

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(&PairId::new("1", "1")).unwrap().trainer_name, "First");
    }
}

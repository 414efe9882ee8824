// 🪪 Alias Variant Generator
// Every free-text spelling a transcriber might use for one sync pair
//
//   "Lear Sygna Suit & Hoopa", "Lear & Hoopa", "Lear Hoopa", "Lear SS", "Hoopa", ...

use crate::alt_tags::AltTagTable;
use crate::entities::SyncPair;
use std::collections::BTreeSet;

/// Generate the alias set for a pair (duplicates collapsed, order irrelevant)
pub fn alias_variants(pair: &SyncPair, table: &AltTagTable) -> BTreeSet<String> {
    let mut variants = BTreeSet::new();

    let trainer = pair.trainer_name.trim();
    let pokemon = pair.pokemon_name.trim();
    let alt = pair.alt().map(|a| format!(" {}", a)).unwrap_or_default();

    variants.insert(format!("{}{} & {}", trainer, alt, pokemon));
    variants.insert(format!("{} & {}", trainer, pokemon));
    variants.insert(format!("{} {}", trainer, pokemon));
    variants.insert(format!("{}{} {}", trainer, alt, pokemon));
    variants.insert(format!("{}{}", trainer, alt).trim().to_string());
    variants.insert(pokemon.to_string());

    if let Some(alt_text) = pair.alt() {
        for tag in table.variants(alt_text) {
            variants.insert(format!("{} {} & {}", trainer, tag, pokemon));
            variants.insert(format!("{} {} {}", trainer, tag, pokemon));
            variants.insert(format!("{} {}", trainer, tag).trim().to_string());
        }
    }

    if !pair.forms().is_empty() {
        variants.insert(format!(
            "{}{} & {} {}",
            trainer,
            alt,
            pokemon,
            pair.forms().join(" ")
        ));
    }

    variants.retain(|v| !v.trim().is_empty());
    variants
}

// ============================================================================
// TESTS
// ============================================================================

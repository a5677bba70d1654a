//! Emoji metadata: short names and sprite-sheet coordinates.
//!
//! [`EmojiData`] is the lookup port the composer talks to. [`EmojiCatalog`]
//! implements it over the bundled `emojis` tables, optionally backed by an
//! emoji-datasource sprite table for exact sheet positions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::emoji::to_unified;
use crate::error::EmojiError;

/// Where an emoji sits on a sprite sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteCoordinates {
    pub sheet: String,
    pub x: u32,
    pub y: u32,
}

/// One emoji as shown in a candidate list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmojiEntry {
    pub native: String,
    pub short_name: String,
    pub short_names: Vec<String>,
    pub name: String,
    pub unified: String,
}

/// Lookup port for emoji metadata.
pub trait EmojiData {
    /// Sheet position for the emoji with code points `unified` at tone
    /// `skin` (1 is the default tone).
    fn sprite_coordinates(&self, unified: &str, skin: u8, set: &str) -> Option<SpriteCoordinates>;

    /// Emoji whose short name, or any alias, starts with `prefix`,
    /// ignoring case.
    fn search_by_short_name(&self, prefix: &str) -> Result<Vec<EmojiEntry>, EmojiError>;
}

impl<T: EmojiData + ?Sized> EmojiData for &T {
    fn sprite_coordinates(&self, unified: &str, skin: u8, set: &str) -> Option<SpriteCoordinates> {
        (**self).sprite_coordinates(unified, skin, set)
    }

    fn search_by_short_name(&self, prefix: &str) -> Result<Vec<EmojiEntry>, EmojiError> {
        (**self).search_by_short_name(prefix)
    }
}

/// Sprite-table keys drop variation selectors and ignore case.
fn normalize_unified(unified: &str) -> String {
    unified.to_ascii_uppercase().replace("-FE0F", "")
}

fn native_from_unified(unified: &str) -> Option<String> {
    unified
        .split('-')
        .map(|cp| u32::from_str_radix(cp, 16).ok().and_then(char::from_u32))
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
struct SkinVariation {
    sheet_x: u32,
    sheet_y: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct SpriteRow {
    unified: String,
    #[serde(default)]
    name: Option<String>,
    short_name: String,
    #[serde(default)]
    short_names: Vec<String>,
    sheet_x: u32,
    sheet_y: u32,
    #[serde(default)]
    skin_variations: HashMap<String, SkinVariation>,
}

/// Rows of an emoji-datasource `emoji.json`.
#[derive(Debug, Clone, Default)]
pub struct SpriteTable {
    rows: Vec<SpriteRow>,
    by_unified: HashMap<String, usize>,
}

impl SpriteTable {
    pub fn from_json(json: &str) -> Result<Self, EmojiError> {
        let rows: Vec<SpriteRow> = serde_json::from_str(json)?;
        let by_unified = rows
            .iter()
            .enumerate()
            .map(|(i, row)| (normalize_unified(&row.unified), i))
            .collect();
        tracing::debug!(rows = rows.len(), "loaded sprite table");
        Ok(Self { rows, by_unified })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn coordinates(&self, unified: &str, skin: u8) -> Option<(u32, u32)> {
        let key = normalize_unified(unified);
        // Toned code points may be passed whole; strip the modifier to find the base row.
        let base_key = key
            .split('-')
            .filter(|cp| !matches!(*cp, "1F3FB" | "1F3FC" | "1F3FD" | "1F3FE" | "1F3FF"))
            .collect::<Vec<_>>()
            .join("-");
        let row = &self.rows[*self
            .by_unified
            .get(&key)
            .or_else(|| self.by_unified.get(&base_key))?];
        if skin > 1 {
            let modifier = format!("{:X}", 0x1F3FB + u32::from(skin - 2));
            if let Some(v) = row.skin_variations.get(&modifier) {
                return Some((v.sheet_x, v.sheet_y));
            }
        }
        Some((row.sheet_x, row.sheet_y))
    }

    fn entry(row: &SpriteRow) -> Option<EmojiEntry> {
        Some(EmojiEntry {
            native: native_from_unified(&row.unified)?,
            short_name: row.short_name.clone(),
            short_names: if row.short_names.is_empty() {
                vec![row.short_name.clone()]
            } else {
                row.short_names.clone()
            },
            name: row.name.clone().unwrap_or_default().to_lowercase(),
            unified: row.unified.clone(),
        })
    }
}

/// [`EmojiData`] over the bundled emoji list.
///
/// Without a sprite table, sheet positions are laid out on a grid of
/// `columns` in catalog order.
#[derive(Debug, Clone)]
pub struct EmojiCatalog {
    columns: u32,
    grid: HashMap<String, u32>,
    table: Option<SpriteTable>,
}

impl EmojiCatalog {
    pub fn new(columns: u32) -> Self {
        let grid = emojis::iter()
            .enumerate()
            .map(|(i, e)| (normalize_unified(&to_unified(e.as_str().chars())), i as u32))
            .collect();
        Self {
            columns: columns.max(1),
            grid,
            table: None,
        }
    }

    pub fn with_sprite_table(mut self, table: SpriteTable) -> Self {
        self.table = Some(table);
        self
    }

    fn catalog_entry(e: &'static emojis::Emoji) -> Option<EmojiEntry> {
        let short_names: Vec<String> = e.shortcodes().map(str::to_string).collect();
        Some(EmojiEntry {
            native: e.as_str().to_string(),
            short_name: short_names.first()?.clone(),
            name: e.name().to_string(),
            unified: to_unified(e.as_str().chars()),
            short_names,
        })
    }
}

impl Default for EmojiCatalog {
    fn default() -> Self {
        Self::new(crate::sprite::SpriteSheet::default().columns)
    }
}

impl EmojiData for EmojiCatalog {
    fn sprite_coordinates(&self, unified: &str, skin: u8, set: &str) -> Option<SpriteCoordinates> {
        let (x, y) = match &self.table {
            Some(table) => table.coordinates(unified, skin)?,
            None => {
                let idx = *self.grid.get(&normalize_unified(unified))?;
                (idx % self.columns, idx / self.columns)
            }
        };
        Some(SpriteCoordinates {
            sheet: set.to_string(),
            x,
            y,
        })
    }

    fn search_by_short_name(&self, prefix: &str) -> Result<Vec<EmojiEntry>, EmojiError> {
        let prefix = prefix.to_lowercase();
        let starts = |name: &str| name.to_lowercase().starts_with(&prefix);
        let matches = |names: &[String]| names.iter().any(|n| starts(n));
        let found: Vec<EmojiEntry> = match &self.table {
            Some(table) => table
                .rows
                .iter()
                .filter_map(SpriteTable::entry)
                .filter(|e| starts(&e.short_name) || matches(&e.short_names))
                .collect(),
            None => emojis::iter()
                .filter_map(Self::catalog_entry)
                .filter(|e| matches(&e.short_names))
                .collect(),
        };
        tracing::trace!(%prefix, found = found.len(), "emoji short name search");
        Ok(found)
    }
}

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::debug;
use tracing::warn;

use crate::color::Rgba;
use crate::error::ConfigError;

/// Primary/secondary colour pair for one object class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorPair {
    pub primary: Rgba,
    pub secondary: Rgba,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectType {
    pub name: String,
    pub colors: ColorPair,
    pub prefix: String,
}

impl ObjectType {
    fn unknown() -> Self {
        Self {
            name: "UNKNOWN".to_string(),
            colors: ColorPair { primary: Rgba::rgb(0xff, 0xaa, 0x00), secondary: Rgba::WHITE },
            prefix: "UNKNOWN".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColorPreset {
    White,
    Red,
    Green,
    Blue,
    Yellow,
    Orange,
    Purple,
    Cyan,
}

impl ColorPreset {
    pub fn colors(self) -> ColorPair {
        let (primary, secondary) = match self {
            ColorPreset::White => (Rgba::rgb(0xff, 0xff, 0xff), Rgba::rgb(0xcc, 0xcc, 0xcc)),
            ColorPreset::Red => (Rgba::rgb(0xff, 0x44, 0x44), Rgba::rgb(0xff, 0xff, 0xff)),
            ColorPreset::Green => (Rgba::rgb(0x00, 0xff, 0x41), Rgba::rgb(0x00, 0xcc, 0x33)),
            ColorPreset::Blue => (Rgba::rgb(0x00, 0xaa, 0xff), Rgba::rgb(0x88, 0xcc, 0xff)),
            ColorPreset::Yellow => (Rgba::rgb(0xff, 0xff, 0x00), Rgba::rgb(0xff, 0xcc, 0x00)),
            ColorPreset::Orange => (Rgba::rgb(0xff, 0x88, 0x00), Rgba::rgb(0xff, 0xaa, 0x44)),
            ColorPreset::Purple => (Rgba::rgb(0xaa, 0x44, 0xff), Rgba::rgb(0xcc, 0x88, 0xff)),
            ColorPreset::Cyan => (Rgba::rgb(0x00, 0xff, 0xff), Rgba::rgb(0x88, 0xff, 0xff)),
        };
        ColorPair { primary, secondary }
    }
}

/// Partial update applied by [`ObjectTypeRegistry::update`].
#[derive(Debug, Clone, Default)]
pub struct ObjectTypeUpdate {
    pub name: Option<String>,
    pub colors: Option<ColorPair>,
    pub prefix: Option<String>,
}

/// One `[[object_types]]` table from the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectTypeConfig {
    pub class_id: i32,
    pub name: String,
    #[serde(default)]
    pub preset: Option<ColorPreset>,
    #[serde(default)]
    pub primary: Option<Rgba>,
    #[serde(default)]
    pub secondary: Option<Rgba>,
    #[serde(default)]
    pub prefix: Option<String>,
}

impl ObjectTypeConfig {
    fn colors(&self) -> Result<ColorPair, ConfigError> {
        match (self.preset, self.primary, self.secondary) {
            (_, Some(primary), Some(secondary)) => Ok(ColorPair { primary, secondary }),
            (Some(preset), primary, secondary) => {
                let base = preset.colors();
                Ok(ColorPair {
                    primary: primary.unwrap_or(base.primary),
                    secondary: secondary.unwrap_or(base.secondary),
                })
            }
            _ => Err(ConfigError::Invalid(format!(
                "object type {} needs either a preset or both primary and secondary colors",
                self.class_id
            ))),
        }
    }
}

/// Class id → display metadata. Lookups never fail: ids without an entry
/// resolve to the `UNKNOWN` fallback.
#[derive(Debug, Clone)]
pub struct ObjectTypeRegistry {
    entries: BTreeMap<i32, ObjectType>,
    fallback: ObjectType,
}

impl Default for ObjectTypeRegistry {
    fn default() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            0,
            ObjectType {
                name: "AGENT_PIONEER".to_string(),
                colors: ColorPair { primary: Rgba::WHITE, secondary: Rgba::rgb(0xff, 0xfb, 0x1f) },
                prefix: "AGENT_PIONEER".to_string(),
            },
        );
        entries.insert(
            4,
            ObjectType {
                name: "RESOURCE".to_string(),
                colors: ColorPair { primary: Rgba::rgb(0xff, 0x44, 0x44), secondary: Rgba::WHITE },
                prefix: "RESOURCE".to_string(),
            },
        );
        Self { entries, fallback: ObjectType::unknown() }
    }
}

fn normalize_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join("_").to_uppercase()
}

impl ObjectTypeRegistry {
    /// Built-in entries plus any config-supplied ones, later entries winning.
    pub fn with_overrides(entries: &[ObjectTypeConfig]) -> Result<Self, ConfigError> {
        let mut registry = Self::default();
        for entry in entries {
            registry.add(entry.class_id, &entry.name, entry.colors()?, entry.prefix.as_deref());
        }
        Ok(registry)
    }

    pub fn lookup(&self, class_id: i32) -> &ObjectType {
        self.entries.get(&class_id).unwrap_or(&self.fallback)
    }

    pub fn contains(&self, class_id: i32) -> bool {
        self.entries.contains_key(&class_id)
    }

    /// Register (or replace) a class. The name is upper-cased with whitespace
    /// collapsed to `_`; the prefix defaults to that normalized name.
    pub fn add(&mut self, class_id: i32, name: &str, colors: ColorPair, prefix: Option<&str>) {
        let name = normalize_name(name);
        let prefix = prefix.map(str::to_string).unwrap_or_else(|| name.clone());
        debug!(class_id, %name, "registered object type");
        self.entries.insert(class_id, ObjectType { name, colors, prefix });
    }

    /// Returns `false` (and changes nothing) when `class_id` is not registered.
    pub fn update(&mut self, class_id: i32, update: ObjectTypeUpdate) -> bool {
        let Some(entry) = self.entries.get_mut(&class_id) else {
            warn!(class_id, "object type not found, update ignored");
            return false;
        };
        if let Some(name) = update.name {
            entry.name = name;
        }
        if let Some(colors) = update.colors {
            entry.colors = colors;
        }
        if let Some(prefix) = update.prefix {
            entry.prefix = prefix;
        }
        debug!(class_id, "updated object type");
        true
    }

    /// Lower-case class name, or `unknown_{id}` for unregistered ids.
    pub fn class_label(&self, class_id: i32) -> String {
        match self.entries.get(&class_id) {
            Some(entry) => entry.name.to_lowercase(),
            None => format!("unknown_{class_id}"),
        }
    }

    /// Display id for the object at `index` in the current frame, e.g. `RESOURCE_007`.
    pub fn object_id(&self, class_id: i32, index: usize) -> String {
        format!("{}_{:03}", self.lookup(class_id).prefix, index + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_ids_fall_back() {
        let registry = ObjectTypeRegistry::default();
        let entry = registry.lookup(17);
        assert_eq!(entry.name, "UNKNOWN");
        assert_eq!(entry.prefix, "UNKNOWN");
        assert_eq!(entry.colors.primary, Rgba::rgb(0xff, 0xaa, 0x00));
        assert_eq!(entry.colors.secondary, Rgba::WHITE);
        assert_eq!(registry.class_label(17), "unknown_17");
    }

    #[test]
    fn builtin_classes() {
        let registry = ObjectTypeRegistry::default();
        assert_eq!(registry.lookup(0).name, "AGENT_PIONEER");
        assert_eq!(registry.lookup(4).colors.primary, Rgba::rgb(0xff, 0x44, 0x44));
        assert_eq!(registry.class_label(4), "resource");
    }

    #[test]
    fn object_ids_are_one_based_and_padded() {
        let registry = ObjectTypeRegistry::default();
        assert_eq!(registry.object_id(4, 0), "RESOURCE_001");
        assert_eq!(registry.object_id(0, 41), "AGENT_PIONEER_042");
        assert_eq!(registry.object_id(9, 999), "UNKNOWN_1000");
    }

    #[test]
    fn add_normalizes_name_and_prefix() {
        let mut registry = ObjectTypeRegistry::default();
        registry.add(5, "supply  depot", ColorPreset::Blue.colors(), None);
        let entry = registry.lookup(5);
        assert_eq!(entry.name, "SUPPLY_DEPOT");
        assert_eq!(entry.prefix, "SUPPLY_DEPOT");
        assert_eq!(entry.colors.primary, Rgba::rgb(0x00, 0xaa, 0xff));

        registry.add(6, "vehicle", ColorPreset::Green.colors(), Some("VEH"));
        assert_eq!(registry.object_id(6, 2), "VEH_003");
    }

    #[test]
    fn update_only_touches_existing_entries() {
        let mut registry = ObjectTypeRegistry::default();
        assert!(registry.update(
            4,
            ObjectTypeUpdate { name: Some("SUPPLY_DEPOT".into()), prefix: Some("SUPPLY".into()), ..Default::default() }
        ));
        assert_eq!(registry.lookup(4).name, "SUPPLY_DEPOT");
        assert_eq!(registry.lookup(4).colors.primary, Rgba::rgb(0xff, 0x44, 0x44));

        assert!(!registry.update(12, ObjectTypeUpdate::default()));
        assert!(!registry.contains(12));
    }

    #[test]
    fn config_entries_need_colors() {
        let entry = ObjectTypeConfig {
            class_id: 3,
            name: "neutral".into(),
            preset: None,
            primary: Some(Rgba::WHITE),
            secondary: None,
            prefix: None,
        };
        assert!(ObjectTypeRegistry::with_overrides(&[entry]).is_err());
    }
}

//! Category colors for detection overlays.

/// Color used for categories without a palette entry (#FF6B6B).
pub const FALLBACK_COLOR: [u8; 3] = [0xFF, 0x6B, 0x6B];

/// A detection category with a name and color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Unique identifier for the category
    pub id: u32,
    /// Display name of the category
    pub name: String,
    /// RGB color for the category
    pub color: [u8; 3],
}

impl Category {
    /// Create a new category with the given ID, name, and color.
    pub fn new(id: u32, name: &str, color: [u8; 3]) -> Self {
        Self {
            id,
            name: name.to_string(),
            color,
        }
    }
}

/// Built-in categories: drawing symbols first, then hardware parts.
pub fn default_categories() -> Vec<Category> {
    vec![
        Category::new(1, "Valve", [0xFF, 0x6B, 0x6B]),
        Category::new(2, "Pump", [0x4E, 0xCD, 0xC4]),
        Category::new(3, "Filter", [0x45, 0xB7, 0xD1]),
        Category::new(4, "Pipe Joint", [0x96, 0xCE, 0xB4]),
        Category::new(5, "Pressure Gauge", [0xFF, 0xEA, 0xA7]),
        Category::new(6, "Flow Meter", [0xDD, 0xA0, 0xDD]),
        Category::new(7, "Bolt", [0xFF, 0x6B, 0x6B]),
        Category::new(8, "Nut", [0x4E, 0xCD, 0xC4]),
        Category::new(9, "Washer", [0x45, 0xB7, 0xD1]),
        Category::new(10, "Screw", [0x96, 0xCE, 0xB4]),
        Category::new(11, "Bearing", [0xFF, 0xEA, 0xA7]),
    ]
}

/// Fixed mapping from category name to color.
///
/// Lookups are exact-name matches; anything unmapped gets [`FALLBACK_COLOR`],
/// so the same name always renders in the same color.
#[derive(Debug, Clone)]
pub struct CategoryPalette {
    categories: Vec<Category>,
}

impl CategoryPalette {
    /// Palette with the built-in categories.
    pub fn new() -> Self {
        Self {
            categories: default_categories(),
        }
    }

    /// Palette with no entries; every category uses the fallback.
    pub fn empty() -> Self {
        Self {
            categories: Vec::new(),
        }
    }

    /// Set the color for a category name, adding it if missing.
    pub fn set_color(&mut self, name: &str, color: [u8; 3]) {
        if let Some(existing) = self.categories.iter_mut().find(|c| c.name == name) {
            existing.color = color;
            return;
        }
        let next_id = self.categories.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        self.categories.push(Category::new(next_id, name, color));
    }

    /// Builder form of [`CategoryPalette::set_color`].
    pub fn with_color(mut self, name: &str, color: [u8; 3]) -> Self {
        self.set_color(name, color);
        self
    }

    /// Look up the category entry by name.
    pub fn get(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// RGB color for a category name.
    pub fn color_for(&self, name: &str) -> [u8; 3] {
        self.get(name).map_or(FALLBACK_COLOR, |c| c.color)
    }

    /// Iterate over all palette entries.
    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }
}

impl Default for CategoryPalette {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_category_colors() {
        let palette = CategoryPalette::new();
        assert_eq!(palette.color_for("Pump"), [0x4E, 0xCD, 0xC4]);
        assert_eq!(palette.color_for("Flow Meter"), [0xDD, 0xA0, 0xDD]);
    }

    #[test]
    fn test_unmapped_category_uses_fallback() {
        let palette = CategoryPalette::new();
        assert_eq!(palette.color_for("Gearbox"), FALLBACK_COLOR);
        assert_eq!(palette.color_for("gearbox"), palette.color_for("Gearbox"));
    }

    #[test]
    fn test_override_existing_and_add_new() {
        let palette = CategoryPalette::new()
            .with_color("Valve", [1, 2, 3])
            .with_color("Gearbox", [4, 5, 6]);

        assert_eq!(palette.color_for("Valve"), [1, 2, 3]);
        assert_eq!(palette.color_for("Gearbox"), [4, 5, 6]);
        assert_eq!(palette.get("Gearbox").map(|c| c.id), Some(12));
    }
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The twelve land-use classes of the 100 m land-use mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LandUseCategory {
    PaddyField,
    OtherAgricultural,
    Forest,
    Wasteland,
    BuildingLand,
    Road,
    Railway,
    OtherLand,
    InlandWater,
    Beach,
    SeaWater,
    GolfCourse,
}

impl LandUseCategory {
    pub const ALL: [LandUseCategory; 12] = [
        LandUseCategory::PaddyField,
        LandUseCategory::OtherAgricultural,
        LandUseCategory::Forest,
        LandUseCategory::Wasteland,
        LandUseCategory::BuildingLand,
        LandUseCategory::Road,
        LandUseCategory::Railway,
        LandUseCategory::OtherLand,
        LandUseCategory::InlandWater,
        LandUseCategory::Beach,
        LandUseCategory::SeaWater,
        LandUseCategory::GolfCourse,
    ];

    /// Label used by the producer's land-use tables
    pub fn label(&self) -> &'static str {
        match self {
            LandUseCategory::PaddyField => "田",
            LandUseCategory::OtherAgricultural => "他農用地",
            LandUseCategory::Forest => "森林",
            LandUseCategory::Wasteland => "荒地",
            LandUseCategory::BuildingLand => "建物用地",
            LandUseCategory::Road => "道路",
            LandUseCategory::Railway => "鉄道",
            LandUseCategory::OtherLand => "他用地",
            LandUseCategory::InlandWater => "河川湖沼",
            LandUseCategory::Beach => "海浜",
            LandUseCategory::SeaWater => "海水域",
            LandUseCategory::GolfCourse => "ゴルフ場",
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            LandUseCategory::PaddyField => "paddy_field",
            LandUseCategory::OtherAgricultural => "other_agricultural",
            LandUseCategory::Forest => "forest",
            LandUseCategory::Wasteland => "wasteland",
            LandUseCategory::BuildingLand => "building_land",
            LandUseCategory::Road => "road",
            LandUseCategory::Railway => "railway",
            LandUseCategory::OtherLand => "other_land",
            LandUseCategory::InlandWater => "inland_water",
            LandUseCategory::Beach => "beach",
            LandUseCategory::SeaWater => "sea_water",
            LandUseCategory::GolfCourse => "golf_course",
        }
    }
}

impl fmt::Display for LandUseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for LandUseCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        LandUseCategory::ALL
            .into_iter()
            .find(|c| c.label() == trimmed || c.key().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("Unknown land-use category: '{}'", s))
    }
}

/// Area per land-use category for one grid square
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LandUseComposition {
    areas: BTreeMap<LandUseCategory, f64>,
}

impl LandUseComposition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the category was already present
    pub fn insert(&mut self, category: LandUseCategory, area: f64) -> bool {
        self.areas.insert(category, area).is_none()
    }

    pub fn area(&self, category: LandUseCategory) -> Option<f64> {
        self.areas.get(&category).copied()
    }

    pub fn total_area(&self) -> f64 {
        self.areas.values().sum()
    }

    /// Largest class by area; ties go to the earlier class
    pub fn dominant(&self) -> Option<(LandUseCategory, f64)> {
        self.areas
            .iter()
            .fold(None, |best: Option<(LandUseCategory, f64)>, (&c, &a)| match best {
                Some((_, best_area)) if best_area >= a => best,
                _ => Some((c, a)),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = (LandUseCategory, f64)> + '_ {
        self.areas.iter().map(|(c, a)| (*c, *a))
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_label_or_key() {
        assert_eq!("森林".parse::<LandUseCategory>(), Ok(LandUseCategory::Forest));
        assert_eq!("ゴルフ場".parse::<LandUseCategory>(), Ok(LandUseCategory::GolfCourse));
        assert_eq!("Sea_Water".parse::<LandUseCategory>(), Ok(LandUseCategory::SeaWater));
        assert!("desert".parse::<LandUseCategory>().is_err());
    }

    #[test]
    fn test_composition_keys_are_unique() {
        let mut composition = LandUseComposition::new();
        assert!(composition.insert(LandUseCategory::Forest, 6200.0));
        assert!(!composition.insert(LandUseCategory::Forest, 10.0));
        assert_eq!(composition.len(), 1);
    }

    #[test]
    fn test_dominant_and_total() {
        let mut composition = LandUseComposition::new();
        composition.insert(LandUseCategory::PaddyField, 2500.0);
        composition.insert(LandUseCategory::Forest, 6200.0);
        composition.insert(LandUseCategory::Road, 300.0);

        assert_eq!(composition.total_area(), 9000.0);
        assert_eq!(
            composition.dominant(),
            Some((LandUseCategory::Forest, 6200.0))
        );
        assert_eq!(LandUseComposition::new().dominant(), None);
    }
}

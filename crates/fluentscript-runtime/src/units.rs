//! Measurement groups and unit scales.
//!
//! Each group has a base unit (inch, ounce, byte); every subgroup declares
//! its scale as base units per one subgroup unit. The table is owned by the
//! interpreter instance, and its subgroup names seed the parser's unit-suffix
//! plugin.

use rustc_hash::FxHashSet;

#[derive(Debug, Clone)]
pub struct UnitDef {
    /// Accepted spellings; the first is the canonical subgroup name.
    pub names: &'static [&'static str],
    /// Base units per one of this unit.
    pub scale: f64,
}

#[derive(Debug, Clone)]
pub struct UnitGroup {
    pub name: &'static str,
    pub base: &'static str,
    pub units: Vec<UnitDef>,
}

/// A resolved unit name.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedUnit {
    pub group: &'static str,
    pub subgroup: &'static str,
    pub scale: f64,
}

#[derive(Debug, Clone)]
pub struct UnitsTable {
    groups: Vec<UnitGroup>,
}

impl UnitsTable {
    pub fn standard() -> Self {
        let groups = vec![
            UnitGroup {
                name: "length",
                base: "inch",
                units: vec![
                    UnitDef { names: &["inch", "inches", "in"], scale: 1.0 },
                    UnitDef { names: &["foot", "feet", "ft"], scale: 12.0 },
                    UnitDef { names: &["yard", "yards", "yd"], scale: 36.0 },
                    UnitDef { names: &["mile", "miles", "mi"], scale: 63_360.0 },
                    UnitDef { names: &["centimeter", "centimeters", "cm"], scale: 0.393_700_787_401_574_8 },
                    UnitDef { names: &["meter", "meters", "m"], scale: 39.370_078_740_157_48 },
                    UnitDef { names: &["kilometer", "kilometers", "km"], scale: 39_370.078_740_157_48 },
                ],
            },
            UnitGroup {
                name: "weight",
                base: "ounce",
                units: vec![
                    UnitDef { names: &["ounce", "ounces", "oz"], scale: 1.0 },
                    UnitDef { names: &["pound", "pounds", "lb", "lbs"], scale: 16.0 },
                    UnitDef { names: &["gram", "grams", "g"], scale: 0.035_273_961_95 },
                    UnitDef { names: &["kilogram", "kilograms", "kg"], scale: 35.273_961_95 },
                    UnitDef { names: &["ton", "tons"], scale: 32_000.0 },
                ],
            },
            UnitGroup {
                name: "storage",
                base: "byte",
                units: vec![
                    UnitDef { names: &["byte", "bytes"], scale: 1.0 },
                    UnitDef { names: &["kilobyte", "kilobytes", "kb"], scale: 1024.0 },
                    UnitDef { names: &["megabyte", "megabytes", "mb"], scale: 1024.0 * 1024.0 },
                    UnitDef { names: &["gigabyte", "gigabytes", "gb"], scale: 1024.0 * 1024.0 * 1024.0 },
                    UnitDef { names: &["terabyte", "terabytes", "tb"], scale: 1024.0 * 1024.0 * 1024.0 * 1024.0 },
                ],
            },
        ];
        Self { groups }
    }

    pub fn lookup(&self, name: &str) -> Option<ResolvedUnit> {
        for group in &self.groups {
            for unit in &group.units {
                if unit.names.contains(&name) {
                    return Some(ResolvedUnit {
                        group: group.name,
                        subgroup: unit.names[0],
                        scale: unit.scale,
                    });
                }
            }
        }
        None
    }

    /// All accepted unit spellings, for the parser's suffix plugin.
    pub fn names(&self) -> FxHashSet<String> {
        let mut names = FxHashSet::default();
        for group in &self.groups {
            for unit in &group.units {
                for name in unit.names {
                    names.insert(name.to_string());
                }
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_resolves_aliases_to_canonical_subgroup() {
        let table = UnitsTable::standard();
        let ft = table.lookup("ft").unwrap();
        assert_eq!(ft.group, "length");
        assert_eq!(ft.subgroup, "foot");
        assert_eq!(ft.scale, 12.0);
    }

    #[test]
    fn unknown_unit_is_none() {
        assert!(UnitsTable::standard().lookup("furlong").is_none());
    }
}

//! Spell catalog and spell book management.
//!
//! The catalog is a fixed list of common 3.5e spells. Eligibility is by
//! class and level only: every spellcasting class sees the same list, capped
//! at the highest spell level its caster level allows.

use crate::character::{Character, Spell, ValidationError};
use crate::rules::CharacterClass;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::LazyLock;

/// Schools of magic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpellSchool {
    Abjuration,
    Conjuration,
    Divination,
    Enchantment,
    Evocation,
    Illusion,
    Necromancy,
    Transmutation,
}

impl SpellSchool {
    pub fn name(&self) -> &'static str {
        match self {
            SpellSchool::Abjuration => "Abjuration",
            SpellSchool::Conjuration => "Conjuration",
            SpellSchool::Divination => "Divination",
            SpellSchool::Enchantment => "Enchantment",
            SpellSchool::Evocation => "Evocation",
            SpellSchool::Illusion => "Illusion",
            SpellSchool::Necromancy => "Necromancy",
            SpellSchool::Transmutation => "Transmutation",
        }
    }
}

impl fmt::Display for SpellSchool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A spell in the static catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogSpell {
    pub name: &'static str,
    pub level: u8,
    pub school: SpellSchool,
    pub description: &'static str,
}

impl CatalogSpell {
    const fn new(
        name: &'static str,
        level: u8,
        school: SpellSchool,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            level,
            school,
            description,
        }
    }

    /// Copy onto a character sheet.
    pub fn to_spell(&self, prepared: bool) -> Spell {
        Spell {
            name: self.name.to_string(),
            level: self.level,
            school: self.school.name().to_string(),
            description: self.description.to_string(),
            prepared,
        }
    }
}

use SpellSchool::*;

/// Catalog in display order.
pub const SPELL_CATALOG: [CatalogSpell; 20] = [
    CatalogSpell::new("Detect Magic", 0, Divination, "Detects spells and magic items within 60 ft."),
    CatalogSpell::new("Light", 0, Evocation, "Object shines like a torch."),
    CatalogSpell::new("Mage Hand", 0, Transmutation, "Telekinetically move 5-pound object."),
    CatalogSpell::new("Prestidigitation", 0, Transmutation, "Performs minor tricks."),
    CatalogSpell::new("Read Magic", 0, Divination, "Read scrolls and spellbooks."),
    CatalogSpell::new(
        "Magic Missile",
        1,
        Evocation,
        "1d4+1 damage; +1 missile per two levels above 1st (max 5).",
    ),
    CatalogSpell::new("Shield", 1, Abjuration, "+4 AC, immunity to magic missile."),
    CatalogSpell::new("Burning Hands", 1, Evocation, "1d4/level fire damage (max 5d4)."),
    CatalogSpell::new("Cure Light Wounds", 1, Conjuration, "Cures 1d8 damage +1/level (max +5)."),
    CatalogSpell::new("Bless", 1, Enchantment, "Allies gain +1 on attack rolls and saves against fear."),
    CatalogSpell::new("Fireball", 3, Evocation, "1d6/level damage, 20-ft. radius."),
    CatalogSpell::new("Lightning Bolt", 3, Evocation, "1d6/level damage in 120-ft. line."),
    CatalogSpell::new(
        "Invisibility",
        2,
        Illusion,
        "Subject is invisible for 1 min./level or until it attacks.",
    ),
    CatalogSpell::new("Web", 2, Conjuration, "Fills 20-ft.-radius spread with sticky spiderwebs."),
    CatalogSpell::new(
        "Haste",
        3,
        Transmutation,
        "One creature/level moves faster, +1 on attack rolls, AC, and Reflex saves.",
    ),
    CatalogSpell::new("Hold Person", 3, Enchantment, "Paralyzes one humanoid for 1 round/level."),
    CatalogSpell::new("Polymorph", 4, Transmutation, "Gives one willing subject a new form."),
    CatalogSpell::new("Teleport", 5, Conjuration, "Instantly transports you as far as 100 miles/level."),
    CatalogSpell::new(
        "Disintegrate",
        6,
        Transmutation,
        "Ray deals 2d6 damage/level, destroying one creature or object.",
    ),
    CatalogSpell::new("Wish", 9, Conjuration, "As limited wish, but with fewer limits."),
];

static CATALOG_BY_NAME: LazyLock<HashMap<String, &'static CatalogSpell>> = LazyLock::new(|| {
    SPELL_CATALOG
        .iter()
        .map(|spell| (spell.name.to_lowercase(), spell))
        .collect()
});

/// Look up a catalog spell by name (case-insensitive).
pub fn catalog_spell(name: &str) -> Option<&'static CatalogSpell> {
    CATALOG_BY_NAME.get(&name.trim().to_lowercase()).copied()
}

/// Highest spell level available at a caster level: min(9, floor((level + 1) / 2)).
pub fn max_spell_level(level: u8) -> u8 {
    let level = u16::from(level);
    ((level + 1) / 2).min(9) as u8
}

/// Catalog spells a class can use at `level`, in catalog order.
///
/// Non-spellcasting and custom classes get nothing.
pub fn spells_for_class(class: &CharacterClass, level: u8) -> Vec<&'static CatalogSpell> {
    if !class.can_cast_spells() {
        return Vec::new();
    }
    let max = max_spell_level(level);
    SPELL_CATALOG.iter().filter(|s| s.level <= max).collect()
}

// ============================================================================
// Spell book
// ============================================================================

fn level_then_name(a: &Spell, b: &Spell) -> std::cmp::Ordering {
    a.level
        .cmp(&b.level)
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
}

/// Spell book operations. Spells are addressed by their slot index in
/// `Character::spells`; views return `(index, spell)` pairs so callers can
/// act on a sorted or filtered listing.
impl Character {
    pub fn add_spell(&mut self, spell: Spell) -> Result<usize, ValidationError> {
        if spell.name.trim().is_empty() {
            return Err(ValidationError::MissingSpellName);
        }
        self.spells.push(spell);
        Ok(self.spells.len() - 1)
    }

    pub fn remove_spell(&mut self, index: usize) -> Result<Spell, ValidationError> {
        self.check_spell_index(index)?;
        Ok(self.spells.remove(index))
    }

    /// Flip the prepared flag of one slot, returning the new value.
    pub fn toggle_spell_prepared(&mut self, index: usize) -> Result<bool, ValidationError> {
        self.check_spell_index(index)?;
        let spell = &mut self.spells[index];
        spell.prepared = !spell.prepared;
        Ok(spell.prepared)
    }

    pub fn prepared_spell_count(&self) -> usize {
        self.spells.iter().filter(|s| s.prepared).count()
    }

    /// All spells ordered by level, then name.
    pub fn sorted_spells(&self) -> Vec<(usize, &Spell)> {
        self.filter_spells(None, None)
    }

    /// Spells matching an optional level and an optional school
    /// (case-insensitive), ordered by level then name.
    pub fn filter_spells(&self, level: Option<u8>, school: Option<&str>) -> Vec<(usize, &Spell)> {
        let mut matching: Vec<_> = self
            .spells
            .iter()
            .enumerate()
            .filter(|(_, s)| level.map_or(true, |l| s.level == l))
            .filter(|(_, s)| school.map_or(true, |sc| s.school.eq_ignore_ascii_case(sc.trim())))
            .collect();
        matching.sort_by(|(_, a), (_, b)| level_then_name(a, b));
        matching
    }

    /// Sorted spells grouped by level.
    pub fn spells_by_level(&self) -> BTreeMap<u8, Vec<(usize, &Spell)>> {
        let mut groups: BTreeMap<u8, Vec<(usize, &Spell)>> = BTreeMap::new();
        for (index, spell) in self.sorted_spells() {
            groups.entry(spell.level).or_default().push((index, spell));
        }
        groups
    }

    fn check_spell_index(&self, index: usize) -> Result<(), ValidationError> {
        if index >= self.spells.len() {
            return Err(ValidationError::SpellIndexOutOfRange {
                index,
                len: self.spells.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spell(name: &str, level: u8, school: &str) -> Spell {
        Spell {
            name: name.to_string(),
            level,
            school: school.to_string(),
            description: String::new(),
            prepared: false,
        }
    }

    #[test]
    fn test_max_spell_level() {
        assert_eq!(max_spell_level(1), 1);
        assert_eq!(max_spell_level(2), 1);
        assert_eq!(max_spell_level(3), 2);
        assert_eq!(max_spell_level(9), 5);
        assert_eq!(max_spell_level(17), 9);
        assert_eq!(max_spell_level(20), 9);
        assert_eq!(max_spell_level(255), 9);
    }

    #[test]
    fn test_wizard_level_one_gets_cantrips_and_first_level() {
        let spells = spells_for_class(&CharacterClass::Wizard, 1);
        assert_eq!(spells.len(), 10);
        assert!(spells.iter().all(|s| s.level <= 1));
        assert_eq!(spells[0].name, "Detect Magic");
        assert_eq!(spells[9].name, "Bless");
    }

    #[test]
    fn test_catalog_order_preserved() {
        let spells = spells_for_class(&CharacterClass::Cleric, 5);
        let names: Vec<_> = spells.iter().map(|s| s.name).collect();
        let fireball = names.iter().position(|n| *n == "Fireball").unwrap();
        let web = names.iter().position(|n| *n == "Web").unwrap();
        assert!(fireball < web, "catalog order, not level order");
        assert!(!names.contains(&"Polymorph"));
    }

    #[test]
    fn test_high_level_caster_sees_everything() {
        assert_eq!(spells_for_class(&CharacterClass::Sorcerer, 20).len(), 20);
    }

    #[test]
    fn test_paladin_and_ranger_are_eligible() {
        assert!(!spells_for_class(&CharacterClass::Paladin, 4).is_empty());
        assert!(!spells_for_class(&CharacterClass::Ranger, 4).is_empty());
    }

    #[test]
    fn test_non_casters_get_nothing() {
        assert!(spells_for_class(&CharacterClass::Fighter, 20).is_empty());
        assert!(spells_for_class(&CharacterClass::Rogue, 20).is_empty());
        assert!(spells_for_class(&CharacterClass::Custom("Warlock".into()), 20).is_empty());
    }

    #[test]
    fn test_catalog_lookup() {
        let fireball = catalog_spell("fireball").unwrap();
        assert_eq!(fireball.level, 3);
        assert_eq!(fireball.school, SpellSchool::Evocation);
        assert!(catalog_spell("Eldritch Blast").is_none());

        let on_sheet = fireball.to_spell(true);
        assert_eq!(on_sheet.school, "Evocation");
        assert!(on_sheet.prepared);
    }

    #[test]
    fn test_add_spell_requires_name() {
        let mut character = Character::default();
        assert_eq!(
            character.add_spell(spell("  ", 1, "Evocation")),
            Err(ValidationError::MissingSpellName)
        );
        assert!(character.spells.is_empty());
        assert_eq!(character.add_spell(spell("Shield", 1, "Abjuration")), Ok(0));
    }

    #[test]
    fn test_toggle_and_remove_by_index() {
        let mut character = Character::default();
        // Same spell twice: slots are independent.
        character.add_spell(spell("Light", 0, "Evocation")).unwrap();
        character.add_spell(spell("Light", 0, "Evocation")).unwrap();

        assert_eq!(character.toggle_spell_prepared(1), Ok(true));
        assert!(!character.spells[0].prepared);
        assert_eq!(character.prepared_spell_count(), 1);

        assert_eq!(
            character.toggle_spell_prepared(2),
            Err(ValidationError::SpellIndexOutOfRange { index: 2, len: 2 })
        );

        let removed = character.remove_spell(1).unwrap();
        assert!(removed.prepared);
        assert_eq!(character.spells.len(), 1);
        assert_eq!(character.prepared_spell_count(), 0);
    }

    #[test]
    fn test_sorted_filtered_and_grouped() {
        let mut character = Character::default();
        character.add_spell(spell("Fireball", 3, "Evocation")).unwrap();
        character.add_spell(spell("shield", 1, "Abjuration")).unwrap();
        character.add_spell(spell("Burning Hands", 1, "Evocation")).unwrap();
        character.add_spell(spell("Light", 0, "Evocation")).unwrap();

        let sorted: Vec<_> = character
            .sorted_spells()
            .into_iter()
            .map(|(i, s)| (i, s.name.as_str()))
            .collect();
        assert_eq!(
            sorted,
            vec![(3, "Light"), (2, "Burning Hands"), (1, "shield"), (0, "Fireball")]
        );

        let evocation = character.filter_spells(None, Some("evocation"));
        assert_eq!(evocation.len(), 3);
        let first_level_evocation = character.filter_spells(Some(1), Some("EVOCATION"));
        assert_eq!(first_level_evocation.len(), 1);
        assert_eq!(first_level_evocation[0].1.name, "Burning Hands");

        let groups = character.spells_by_level();
        assert_eq!(groups.keys().copied().collect::<Vec<_>>(), vec![0, 1, 3]);
        assert_eq!(groups[&1].len(), 2);
    }
}

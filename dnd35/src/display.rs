//! Plain-text rendering of characters and rolls.

use dnd35_core::character::{Character, CharacterProfile};
use dnd35_core::spells::CatalogSpell;
use dnd35_core::{Ability, DiceRoll};
use std::fmt::Write;

fn signed(value: i32) -> String {
    if value >= 0 {
        format!("+{value}")
    } else {
        value.to_string()
    }
}

pub fn profile_line(profile: &CharacterProfile, current: bool) -> String {
    format!(
        "{} {}  {} (level {} {} {})  last played {}",
        if current { "*" } else { " " },
        profile.id,
        profile.name,
        profile.level,
        profile.race,
        profile.character_class,
        profile.last_played.format("%Y-%m-%d %H:%M"),
    )
}

/// Full character sheet.
pub fn character_sheet(character: &Character) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}  [{}]", character.name, character.id);
    if !character.player_name.is_empty() {
        let _ = writeln!(out, "Player: {}", character.player_name);
    }
    let _ = writeln!(
        out,
        "Level {} {} {}, {}, {:?}",
        character.level,
        character.race,
        character.character_class,
        character.alignment,
        character.size
    );
    let _ = writeln!(out);

    for ability in Ability::all() {
        let _ = writeln!(
            out,
            "  {}  {:>2} ({})",
            ability.abbreviation(),
            character.ability_scores.get(ability),
            signed(character.ability_modifiers.get(ability))
        );
    }
    let _ = writeln!(out);

    let hp = &character.hit_points;
    let _ = write!(out, "HP {}/{}", hp.current, hp.maximum);
    if hp.temporary > 0 {
        let _ = write!(out, " (+{} temp)", hp.temporary);
    }
    let _ = writeln!(
        out,
        "   AC {}   BAB {}",
        character.armor_class.total,
        signed(character.base_attack_bonus)
    );
    let saves = &character.saving_throws;
    let _ = writeln!(
        out,
        "Fort {}  Ref {}  Will {}",
        signed(saves.fortitude),
        signed(saves.reflex),
        signed(saves.will)
    );
    let _ = writeln!(
        out,
        "XP {}/{}",
        character.experience.current, character.experience.needed
    );

    let trained: Vec<_> = character
        .skills
        .iter()
        .filter(|s| s.ranks > 0 || s.misc_modifier != 0)
        .collect();
    if !trained.is_empty() {
        let _ = writeln!(out, "\nSkills:");
        for skill in trained {
            let _ = writeln!(
                out,
                "  {:<20} {}",
                skill.name,
                signed(skill.total(&character.ability_scores))
            );
        }
    }

    if !character.attacks.is_empty() {
        let _ = writeln!(out, "\nAttacks:");
        for (slot, attack) in character.attacks.iter().enumerate() {
            let _ = writeln!(
                out,
                "  [{slot}] {} {} ({}, {})",
                attack.name,
                signed(attack.attack_bonus),
                attack.damage,
                attack.critical
            );
        }
    }

    if !character.feats.is_empty() {
        let names: Vec<_> = character.feats.iter().map(|f| f.name.as_str()).collect();
        let _ = writeln!(out, "\nFeats: {}", names.join(", "));
    }

    if !character.spells.is_empty() {
        let _ = writeln!(out, "\nSpells ({} prepared):", character.prepared_spell_count());
        let _ = write!(out, "{}", spell_book(character, None, None));
    }

    let money = &character.money;
    let _ = writeln!(
        out,
        "\n{}pp {}gp {}sp {}cp",
        money.platinum, money.gold, money.silver, money.copper
    );
    if !character.notes.is_empty() {
        let _ = writeln!(out, "\n{}", character.notes);
    }
    out
}

/// Spell book grouped by level, with slot indexes.
pub fn spell_book(character: &Character, level: Option<u8>, school: Option<&str>) -> String {
    let mut out = String::new();
    let mut current_level = None;
    for (slot, spell) in character.filter_spells(level, school) {
        if current_level != Some(spell.level) {
            let _ = writeln!(out, "  Level {}:", spell.level);
            current_level = Some(spell.level);
        }
        let _ = writeln!(
            out,
            "    [{slot}] {}{} ({})",
            if spell.prepared { "* " } else { "" },
            spell.name,
            spell.school
        );
    }
    out
}

pub fn catalog_line(spell: &CatalogSpell) -> String {
    format!(
        "  {} (level {}, {}): {}",
        spell.name, spell.level, spell.school, spell.description
    )
}

pub fn roll_line(roll: &DiceRoll) -> String {
    roll.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dnd35_core::testing::sample_fighter;

    #[test]
    fn test_sheet_mentions_key_stats() {
        let sheet = character_sheet(&sample_fighter());
        assert!(sheet.contains("Tordek"));
        assert!(sheet.contains("Level 1 Dwarf Fighter, True Neutral, Medium"));
        assert!(sheet.contains("STR  16 (+3)"));
        assert!(sheet.contains("CHA   8 (-1)"));
        assert!(sheet.contains("HP 12/12"));
        assert!(sheet.contains("AC 17"));
        assert!(sheet.contains("Climb"));
        assert!(sheet.contains("[0] Dwarven Waraxe +4 (1d10+3, x3)"));
    }

    #[test]
    fn test_spell_book_groups_by_level() {
        let mut character = sample_fighter();
        for (name, level) in [("Shield", 1), ("Light", 0), ("Bless", 1)] {
            character
                .add_spell(dnd35_core::character::Spell {
                    name: name.to_string(),
                    level,
                    school: "Abjuration".to_string(),
                    ..Default::default()
                })
                .unwrap();
        }
        let book = spell_book(&character, None, None);
        let lines: Vec<_> = book.lines().collect();
        assert_eq!(lines[0], "  Level 0:");
        assert_eq!(lines[1], "    [1] Light (Abjuration)");
        assert_eq!(lines[2], "  Level 1:");
        assert_eq!(lines[3], "    [2] Bless (Abjuration)");
        assert_eq!(lines[4], "    [0] Shield (Abjuration)");
    }
}

//! QA tests for the create, play and save flow.
//!
//! These tests walk a character from creation through the spell book and
//! gameplay rolls to storage, using scripted dice where exact values matter.
//! Run with: `cargo test -p dnd35-core --test qa_character_flow`

use dnd35_core::character::sort_by_last_played;
use dnd35_core::spells::{catalog_spell, spells_for_class};
use dnd35_core::testing::ScriptedDice;
use dnd35_core::{
    generator, Ability, ActionError, ActionRoller, CharacterBuilder, CharacterClass,
    CharacterStorage, CreationMode, DiceError, MemoryBackend, Race, RandomizeOptions, SaveKind,
};

// =============================================================================
// TEST 1: Build a wizard, fill the spell book, roll, save
// =============================================================================

#[tokio::test]
async fn test_wizard_flow() {
    let mut wizard = CharacterBuilder::new()
        .name("Mialee")
        .race(Race::Elf)
        .class(CharacterClass::Wizard)
        .level(5)
        .ability_scores(dnd35_core::AbilityScores::new(8, 16, 12, 18, 12, 10))
        .build()
        .expect("Valid wizard");

    assert_eq!(wizard.base_attack_bonus, 2);
    assert_eq!(wizard.saving_throws.will, 4);
    // 4 + 1, then 4 * (2 + 1 + 1)
    assert_eq!(wizard.hit_points.maximum, 21);

    let eligible = spells_for_class(&wizard.character_class, wizard.level);
    assert!(eligible.iter().all(|s| s.level <= 3));
    for name in ["Fireball", "Magic Missile", "Light"] {
        let spell = catalog_spell(name).expect("Catalog spell");
        wizard.add_spell(spell.to_spell(false)).unwrap();
    }
    wizard.toggle_spell_prepared(0).unwrap();

    let by_level: Vec<_> = wizard
        .sorted_spells()
        .into_iter()
        .map(|(_, s)| s.name.clone())
        .collect();
    assert_eq!(by_level, vec!["Light", "Magic Missile", "Fireball"]);
    assert_eq!(wizard.prepared_spell_count(), 1);

    let mut table = ActionRoller::with_dice(ScriptedDice::new([15, 20]));
    let will = table.saving_throw(&wizard, SaveKind::Will);
    assert_eq!(will.result, 19);
    let int_check = table.ability_check(&wizard, Ability::Intelligence);
    assert!(int_check.natural_20);
    assert_eq!(int_check.result, 24);
    assert_eq!(table.history().latest(), Some(&int_check));

    let storage = CharacterStorage::new(MemoryBackend::new());
    storage.save(&mut wizard).await.unwrap();
    let loaded = storage.load(wizard.id).await.unwrap().unwrap();
    assert_eq!(loaded.spells, wizard.spells);
    assert!(loaded.spells[0].prepared);
}

// =============================================================================
// TEST 2: Combat rolls from a random character
// =============================================================================

#[test]
fn test_combat_rolls() {
    let mut script: Vec<u32> = vec![4; 24];
    // Half-Orc, Fighter, Neutral Evil
    script.extend([7, 5, 8]);
    let mut character =
        generator::generate_with(&CreationMode::Random, &mut ScriptedDice::new(script));
    character.name = "Krusk".to_string();

    assert_eq!(character.race, Race::HalfOrc);
    assert_eq!(character.character_class, CharacterClass::Fighter);
    assert_eq!(character.ability_scores.strength, 12);
    assert_eq!(character.hit_points.maximum, 11);

    character.attacks.push(dnd35_core::character::Attack {
        name: "Greataxe".to_string(),
        attack_bonus: character.base_attack_bonus + character.modifier(Ability::Strength),
        damage: "1d12+1".to_string(),
        critical: "x3".to_string(),
        range: String::new(),
        attack_type: "Slashing".to_string(),
    });
    character.attacks.push(dnd35_core::character::Attack {
        name: "Broken Sword".to_string(),
        damage: "a lot".to_string(),
        ..Default::default()
    });

    let mut table = ActionRoller::with_dice(ScriptedDice::new([1, 9, 13]));
    let attack = table.attack(&character.attacks[0]);
    assert!(attack.natural_1);
    assert_eq!(attack.breakdown, "1d20(1) + 2");

    let damage = table.damage(&character.attacks[0]).unwrap();
    assert_eq!(damage.result, 10);
    assert_eq!(damage.breakdown, "1d12(9) +1");

    let broken = table.damage(&character.attacks[1]);
    assert!(matches!(
        broken,
        Err(ActionError::Dice(DiceError::InvalidNotation(_)))
    ));

    let init = table.initiative(&character);
    assert_eq!(init.result, 14);
    assert_eq!(table.history().len(), 3);
}

// =============================================================================
// TEST 3: Partial randomization keeps the chosen race
// =============================================================================

#[test]
fn test_partial_randomization_keeps_choices() {
    let options = RandomizeOptions {
        randomize_race: false,
        ..RandomizeOptions::default()
    };
    for _ in 0..50 {
        let mut character = CharacterBuilder::new()
            .name("Lidda")
            .race(Race::Halfling)
            .build()
            .unwrap();
        generator::apply_partial(&mut character, &options);

        assert_eq!(character.race, Race::Halfling);
        assert_eq!(
            character.ability_modifiers,
            character.ability_scores.modifiers()
        );
        assert_eq!(character.hit_points.current, character.hit_points.maximum);
        assert_eq!(character.hit_points.temporary, 0);
    }
}

// =============================================================================
// TEST 4: Profiles sorted for the home screen
// =============================================================================

#[tokio::test]
async fn test_profiles_sorted_by_last_played() {
    let storage = CharacterStorage::new(MemoryBackend::new());
    for name in ["Alpha", "Beta", "Gamma"] {
        let mut character = CharacterBuilder::new().name(name).build().unwrap();
        storage.save(&mut character).await.unwrap();
    }

    // Re-saving moves a character to the front.
    let alpha_id = storage.list_profiles().await.unwrap()[0].id;
    let mut alpha = storage.load(alpha_id).await.unwrap().unwrap();
    storage.save(&mut alpha).await.unwrap();

    let mut profiles = storage.list_profiles().await.unwrap();
    sort_by_last_played(&mut profiles);
    assert_eq!(profiles[0].name, "Alpha");
    assert_eq!(profiles.len(), 3);
}

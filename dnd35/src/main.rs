//! D&D 3.5e character sheet command-line tool.
//!
//! Characters are stored as JSON files in the data directory
//! (`DND35_DATA_DIR`, default `./dnd35-data`).
//!
//! ```bash
//! cargo run -p dnd35 -- new random --name Krusk
//! cargo run -p dnd35 -- roll save fort attack 0 damage 0
//! ```

mod args;
mod display;

use anyhow::{anyhow, bail, Context, Result};
use args::{Command, NewCharacter, RollKind, Target};
use dnd35_core::character::sort_by_last_played;
use dnd35_core::spells::{catalog_spell, spells_for_class};
use dnd35_core::{
    generator, ActionRoller, Character, CharacterBuilder, CharacterId, CharacterStorage,
    CreationMode, DamageExpression, Dnd35Config, FileBackend,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Storage = CharacterStorage<FileBackend>;

#[tokio::main]
async fn main() {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dnd35=info,dnd35_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let command = match args::parse_command(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Run with --help for usage.");
            std::process::exit(2);
        }
    };

    if let Err(e) = run(command).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(command: Command) -> Result<()> {
    if command == Command::Help {
        print_help();
        return Ok(());
    }

    let config = Dnd35Config::from_env()?;
    tracing::debug!(data_dir = %config.data_dir.display(), "Configuration loaded");
    let storage = CharacterStorage::new(FileBackend::new(&config.data_dir));

    match command {
        Command::Help => print_help(),
        Command::List => list(&storage).await?,
        Command::New(new) => create(&storage, new).await?,
        Command::Show(target) => {
            let character = resolve(&storage, &target).await?;
            print!("{}", display::character_sheet(&character));
        }
        Command::Use(id) => {
            let character = resolve(&storage, &Target::Id(id)).await?;
            println!("Now playing {}", character.name);
        }
        Command::Roll { target, kinds } => {
            let character = resolve(&storage, &target).await?;
            let mut table = ActionRoller::new().with_history_capacity(config.roll_history);
            for kind in kinds {
                let roll = match kind {
                    RollKind::Save(kind) => table.saving_throw(&character, kind),
                    RollKind::Check(ability) => table.ability_check(&character, ability),
                    RollKind::Skill(name) => table.skill_check(&character, &name)?,
                    RollKind::Attack(slot) => table.attack(attack_at(&character, slot)?),
                    RollKind::Damage(slot) => table.damage(attack_at(&character, slot)?)?,
                    RollKind::Initiative => table.initiative(&character),
                };
                println!("{}", display::roll_line(&roll));
            }
        }
        Command::Dice(notation) => {
            let roll = DamageExpression::parse(&notation)?.roll();
            println!("{roll}");
        }
        Command::Spells {
            target,
            level,
            school,
        } => {
            let character = resolve(&storage, &target).await?;
            println!("Spell book ({} prepared):", character.prepared_spell_count());
            print!(
                "{}",
                display::spell_book(&character, level, school.as_deref())
            );
            let eligible = spells_for_class(&character.character_class, character.level);
            if !eligible.is_empty() {
                println!("\nAvailable to a level {} {}:", character.level, character.character_class);
                for spell in eligible {
                    println!("{}", display::catalog_line(spell));
                }
            }
        }
        Command::Learn { target, spell } => {
            let mut character = resolve(&storage, &target).await?;
            let spell = catalog_spell(&spell)
                .ok_or_else(|| anyhow!("{spell} is not in the spell catalog"))?;
            let slot = character.add_spell(spell.to_spell(false))?;
            storage.save(&mut character).await?;
            println!("{} learned {} (slot {slot})", character.name, spell.name);
        }
        Command::Prepare { target, index } => {
            let mut character = resolve(&storage, &target).await?;
            let prepared = character.toggle_spell_prepared(index)?;
            storage.save(&mut character).await?;
            let name = &character.spells[index].name;
            if prepared {
                println!("Prepared {name}");
            } else {
                println!("Unprepared {name}");
            }
        }
        Command::Forget { target, index } => {
            let mut character = resolve(&storage, &target).await?;
            let spell = character.remove_spell(index)?;
            storage.save(&mut character).await?;
            println!("{} forgot {}", character.name, spell.name);
        }
        Command::Export { target, file } => {
            let character = resolve(&storage, &target).await?;
            let json = storage
                .export_character(character.id)
                .await?
                .ok_or_else(|| anyhow!("Character {} not found", character.id))?;
            match file {
                Some(path) => {
                    tokio::fs::write(&path, json)
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Exported {} to {}", character.name, path.display());
                }
                None => println!("{json}"),
            }
        }
        Command::Import(path) => {
            let json = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let character = storage.import_character(&json).await?;
            println!("Imported {} as {}", character.name, character.id);
        }
        Command::Duplicate(target) => {
            let character = resolve(&storage, &target).await?;
            let copy = storage
                .duplicate_character(character.id)
                .await?
                .ok_or_else(|| anyhow!("Character {} not found", character.id))?;
            println!("Created {} ({})", copy.name, copy.id);
        }
        Command::Delete(id) => {
            let id = parse_id(&id)?;
            if storage.delete(id).await? {
                println!("Deleted {id}");
            } else {
                println!("No character with id {id}");
            }
        }
        Command::Clear => {
            storage.clear_all().await?;
            println!("All character data removed");
        }
    }
    Ok(())
}

fn parse_id(id: &str) -> Result<CharacterId> {
    id.parse()
        .with_context(|| format!("{id:?} is not a character id"))
}

/// Load the targeted character, making it current.
async fn resolve(storage: &Storage, target: &Target) -> Result<Character> {
    let id = match target {
        Target::Id(id) => parse_id(id)?,
        Target::Current => storage
            .current()
            .await?
            .ok_or_else(|| anyhow!("No current character; pass an id or run `use <id>`"))?,
    };
    storage
        .load(id)
        .await?
        .ok_or_else(|| anyhow!("Character {id} not found"))
}

fn attack_at(character: &Character, slot: usize) -> Result<&dnd35_core::character::Attack> {
    character.attacks.get(slot).ok_or_else(|| {
        anyhow!(
            "{} has no attack in slot {slot} ({} attacks)",
            character.name,
            character.attacks.len()
        )
    })
}

async fn list(storage: &Storage) -> Result<()> {
    let mut profiles = storage.list_profiles().await?;
    if profiles.is_empty() {
        println!("No characters yet. Create one with `dnd35 new`.");
        return Ok(());
    }
    sort_by_last_played(&mut profiles);
    let current = storage.current().await?;
    for profile in &profiles {
        println!("{}", display::profile_line(profile, current == Some(profile.id)));
    }
    Ok(())
}

fn builder_for(new: &NewCharacter) -> CharacterBuilder {
    let mut builder = CharacterBuilder::new()
        .name(new.name.clone().unwrap_or_else(|| "New Character".to_string()));
    if let Some(race) = new.race.clone() {
        builder = builder.race(race);
    }
    if let Some(class) = new.class.clone() {
        builder = builder.class(class);
    }
    if let Some(level) = new.level {
        builder = builder.level(level);
    }
    builder
}

async fn create(storage: &Storage, new: NewCharacter) -> Result<()> {
    let mut character = match new.mode {
        CreationMode::Manual => builder_for(&new).build()?,
        CreationMode::Random => {
            if new.race.is_some() || new.class.is_some() || new.level.is_some() {
                bail!("random creation takes only --name; use `new partial` to fix choices");
            }
            let mut character = generator::random_character();
            if let Some(name) = new.name {
                character.name = name;
            }
            character
        }
        CreationMode::Partial(mut options) => {
            // Explicit choices are never randomized.
            options.randomize_race &= new.race.is_none();
            options.randomize_class &= new.class.is_none();
            let mut character = builder_for(&new).build()?;
            generator::apply_partial(&mut character, &options);
            character
        }
    };

    storage.save(&mut character).await?;
    storage.set_current(character.id).await?;
    print!("{}", display::character_sheet(&character));
    Ok(())
}

fn print_help() {
    println!("dnd35 - D&D 3.5e character sheets");
    println!();
    println!("USAGE:");
    println!("  dnd35 <COMMAND> [ARGS]");
    println!();
    println!("Commands taking [id] use the current character when it is omitted.");
    println!();
    println!("COMMANDS:");
    println!("  list                         List characters, most recently played first");
    println!("  new [manual|random|partial]  Create a character and make it current");
    println!("      --name <NAME> --race <RACE> --class <CLASS> --level <N>");
    println!("      --keep-stats --keep-race --keep-class --keep-alignment  (partial)");
    println!("  show [id]                    Print a character sheet");
    println!("  use <id>                     Make a character current");
    println!("  roll [id] <ROLL>...          Roll for a character:");
    println!("      save <fort|ref|will>, check <ability>, skill <name>,");
    println!("      attack <slot>, damage <slot>, init");
    println!("  dice <NdM+K>                 Roll a damage expression");
    println!("  spells [id] [--level N] [--school S]  Show the spell book");
    println!("  learn [id] <spell>           Add a catalog spell");
    println!("  prepare [id] <slot>          Toggle a spell's prepared flag");
    println!("  forget [id] <slot>           Remove a spell");
    println!("  export [id] [file]           Export as JSON");
    println!("  import <file>                Import a JSON export as a new character");
    println!("  duplicate [id]               Copy a character");
    println!("  delete <id>                  Delete a character");
    println!("  clear                        Delete all character data");
    println!();
    println!("ENVIRONMENT:");
    println!("  DND35_DATA_DIR       Storage directory (default: dnd35-data)");
    println!("  DND35_ROLL_HISTORY   Rolls kept in history (default: 10)");
    println!("  RUST_LOG             Log filter (default: dnd35=info,dnd35_core=info)");
}

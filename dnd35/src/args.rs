//! Command-line parsing.

use dnd35_core::{
    Ability, CharacterClass, CharacterId, CreationMode, Race, RandomizeOptions, SaveKind,
};
use std::path::PathBuf;

/// Which character a command applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Current,
    Id(String),
}

impl Target {
    fn parse(arg: Option<&String>) -> Target {
        match arg.map(String::as_str) {
            None | Some("current") => Target::Current,
            Some(id) => Target::Id(id.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCharacter {
    pub mode: CreationMode,
    pub name: Option<String>,
    pub race: Option<Race>,
    pub class: Option<CharacterClass>,
    pub level: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollKind {
    Save(SaveKind),
    Check(Ability),
    Skill(String),
    Attack(usize),
    Damage(usize),
    Initiative,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    List,
    New(NewCharacter),
    Show(Target),
    Use(String),
    Roll { target: Target, kinds: Vec<RollKind> },
    Dice(String),
    Spells { target: Target, level: Option<u8>, school: Option<String> },
    Learn { target: Target, spell: String },
    Prepare { target: Target, index: usize },
    Forget { target: Target, index: usize },
    Export { target: Target, file: Option<PathBuf> },
    Import(PathBuf),
    Duplicate(Target),
    Delete(String),
    Clear,
}

/// Parse `args` as passed to the program (the first entry is the binary).
pub fn parse_command(args: &[String]) -> Result<Command, String> {
    let rest = args.get(1..).unwrap_or_default();
    if rest.iter().any(|a| a == "--help" || a == "-h") {
        return Ok(Command::Help);
    }
    let Some((command, rest)) = rest.split_first() else {
        return Ok(Command::Help);
    };

    match command.as_str() {
        "help" => Ok(Command::Help),
        "list" | "ls" => Ok(Command::List),
        "new" => parse_new(rest).map(Command::New),
        "show" => Ok(Command::Show(Target::parse(rest.first()))),
        "use" => rest
            .first()
            .cloned()
            .map(Command::Use)
            .ok_or_else(|| "use needs a character id".to_string()),
        "roll" => parse_roll(rest),
        "dice" => rest
            .first()
            .cloned()
            .map(Command::Dice)
            .ok_or_else(|| "dice needs a notation such as 2d6+3".to_string()),
        "spells" => parse_spells(rest),
        "learn" => {
            let (target, spell) = target_and_value(rest, "learn needs a spell name")?;
            Ok(Command::Learn { target, spell })
        }
        "prepare" => {
            let (target, index) = target_and_value(rest, "prepare needs a spell slot")?;
            Ok(Command::Prepare {
                target,
                index: parse_number(&index)?,
            })
        }
        "forget" => {
            let (target, index) = target_and_value(rest, "forget needs a spell slot")?;
            Ok(Command::Forget {
                target,
                index: parse_number(&index)?,
            })
        }
        "export" => parse_export(rest),
        "import" => rest
            .first()
            .map(|f| Command::Import(PathBuf::from(f)))
            .ok_or_else(|| "import needs a file".to_string()),
        "duplicate" | "copy" => Ok(Command::Duplicate(Target::parse(rest.first()))),
        "delete" | "rm" => rest
            .first()
            .cloned()
            .map(Command::Delete)
            .ok_or_else(|| "delete needs a character id".to_string()),
        "clear" => Ok(Command::Clear),
        other => Err(format!("Unknown command: {other}")),
    }
}

fn parse_number<T: std::str::FromStr>(value: &str) -> Result<T, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("Expected a number, got {value:?}"))
}

fn is_target(arg: &str) -> bool {
    arg == "current" || arg.parse::<CharacterId>().is_ok()
}

/// `[id] <value...>`. Without an id the current character is used.
fn target_and_value(rest: &[String], missing: &str) -> Result<(Target, String), String> {
    let (target, value) = match rest {
        [first, value @ ..] if is_target(first) => (Target::parse(Some(first)), value),
        value => (Target::Current, value),
    };
    if value.is_empty() {
        return Err(missing.to_string());
    }
    Ok((target, value.join(" ")))
}

/// `export [id] [file]`. A first argument that is not a character id is
/// the file.
fn parse_export(args: &[String]) -> Result<Command, String> {
    let (target, rest) = match args {
        [first, rest @ ..] if is_target(first) => (Target::parse(Some(first)), rest),
        rest => (Target::Current, rest),
    };
    match rest {
        [] => Ok(Command::Export { target, file: None }),
        [file] => Ok(Command::Export {
            target,
            file: Some(PathBuf::from(file)),
        }),
        [_, extra, ..] => Err(format!("Unexpected argument for export: {extra}")),
    }
}

fn parse_new(args: &[String]) -> Result<NewCharacter, String> {
    let mut mode = CreationMode::Manual;
    let mut options = RandomizeOptions::default();
    let mut new = NewCharacter {
        mode: CreationMode::Manual,
        name: None,
        race: None,
        class: None,
        level: None,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "manual" => mode = CreationMode::Manual,
            "random" => mode = CreationMode::Random,
            "partial" => mode = CreationMode::Partial(options),
            "--name" => {
                if let Some(name) = args.get(i + 1) {
                    new.name = Some(name.clone());
                    i += 1;
                }
            }
            "--race" => {
                if let Some(race) = args.get(i + 1) {
                    new.race = Some(Race::from_name(race));
                    i += 1;
                }
            }
            "--class" => {
                if let Some(class) = args.get(i + 1) {
                    new.class = Some(CharacterClass::from_name(class));
                    i += 1;
                }
            }
            "--level" => {
                if let Some(level) = args.get(i + 1) {
                    new.level = Some(parse_number(level)?);
                    i += 1;
                }
            }
            "--keep-stats" => options.randomize_stats = false,
            "--keep-race" => options.randomize_race = false,
            "--keep-class" => options.randomize_class = false,
            "--keep-alignment" => options.randomize_alignment = false,
            other => return Err(format!("Unknown option for new: {other}")),
        }
        i += 1;
    }

    if let CreationMode::Partial(_) = mode {
        mode = CreationMode::Partial(options);
    }
    new.mode = mode;
    Ok(new)
}

fn parse_roll(args: &[String]) -> Result<Command, String> {
    let (target, args) = match args.first().map(String::as_str) {
        Some(first) if !is_roll_keyword(first) => (Target::parse(args.first()), &args[1..]),
        _ => (Target::Current, args),
    };

    let mut kinds = Vec::new();
    let mut i = 0;
    while i < args.len() {
        let value = args.get(i + 1);
        let kind = match args[i].as_str() {
            "init" | "initiative" => RollKind::Initiative,
            "save" => {
                let name = value.ok_or("save needs fort, ref or will")?;
                i += 1;
                RollKind::Save(
                    SaveKind::from_name(name).ok_or_else(|| format!("Unknown save: {name}"))?,
                )
            }
            "check" => {
                let name = value.ok_or("check needs an ability")?;
                i += 1;
                RollKind::Check(
                    Ability::from_name(name).ok_or_else(|| format!("Unknown ability: {name}"))?,
                )
            }
            "skill" => {
                let name = value.ok_or("skill needs a skill name")?;
                i += 1;
                RollKind::Skill(name.clone())
            }
            "attack" => {
                let slot = value.ok_or("attack needs an attack slot")?;
                i += 1;
                RollKind::Attack(parse_number(slot)?)
            }
            "damage" => {
                let slot = value.ok_or("damage needs an attack slot")?;
                i += 1;
                RollKind::Damage(parse_number(slot)?)
            }
            other => return Err(format!("Unknown roll: {other}")),
        };
        kinds.push(kind);
        i += 1;
    }

    if kinds.is_empty() {
        return Err("roll needs something to roll, e.g. `roll save fort`".to_string());
    }
    Ok(Command::Roll { target, kinds })
}

fn is_roll_keyword(arg: &str) -> bool {
    matches!(
        arg,
        "init" | "initiative" | "save" | "check" | "skill" | "attack" | "damage"
    )
}

fn parse_spells(args: &[String]) -> Result<Command, String> {
    let mut target = Target::Current;
    let mut level = None;
    let mut school = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--level" => {
                let value = args.get(i + 1).ok_or("--level needs a value")?;
                level = Some(parse_number(value)?);
                i += 1;
            }
            "--school" => {
                school = args.get(i + 1).cloned();
                i += 1;
            }
            id => target = Target::parse(Some(&id.to_string())),
        }
        i += 1;
    }
    Ok(Command::Spells {
        target,
        level,
        school,
    })
}

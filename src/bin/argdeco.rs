// src/bin/argdeco.rs

//! `argdeco`: a small notes manager built from a declarative command tree.

use anyhow::{Context, Result, anyhow};
use argdeco::prelude::*;
use colored::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

// --- Storage ---

#[derive(Serialize, Deserialize, Debug, Clone)]
struct Note {
    id: u64,
    text: String,
    tags: Vec<String>,
    pinned: bool,
}

/// The context object every command receives, built by the root `bind`.
#[derive(Debug)]
struct Notebook {
    path: PathBuf,
    verbosity: u64,
}

impl Notebook {
    fn load(&self) -> Result<Vec<Note>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read notes from '{}'", self.path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Corrupt notes file '{}'", self.path.display()))
    }

    fn save(&self, notes: &[Note]) -> Result<()> {
        let content = serde_json::to_string_pretty(notes)?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write notes to '{}'", self.path.display()))
    }

    fn log(&self, message: &str) {
        if self.verbosity > 0 {
            eprintln!("{} {}", "·".dimmed(), message);
        }
    }
}

fn notebook<'a>(call: &'a Call<'_>) -> Result<&'a Notebook> {
    call.context::<Notebook>()
        .ok_or_else(|| anyhow!("{}() needs a notebook", call.function().name()))
}

// --- Commands ---

fn add() -> Function {
    Function::new("add", |call| {
        let book = notebook(call)?;
        let mut notes = book.load()?;
        let id = notes.iter().map(|n| n.id).max().unwrap_or(0) + 1;
        let note = Note {
            id,
            text: call.get("text")?,
            tags: call.get::<Option<Vec<String>>>("tags")?.unwrap_or_default(),
            pinned: call.get("pin")?,
        };
        book.log(&format!("adding note {}", id));
        notes.push(note);
        book.save(&notes)?;
        Ok(Value::from(format!("Added note {}", id)))
    })
    .doc("Add a note")
    .with_context()
    .arg("text", Arg::new(["text"]).help("The note text"))
    .arg("tags", Arg::append(["-t", "--tag"]).help("Tag the note (repeatable)"))
    .arg("pin", Arg::flag(["--pin"]).help("Pin the note to the top"))
}

fn list() -> Function {
    Function::new("list", |call| {
        let book = notebook(call)?;
        let mut notes = book.load()?;
        notes.sort_by_key(|n| (!n.pinned, n.id));
        if let Some(tag) = call.get::<Option<String>>("tag")? {
            notes.retain(|n| n.tags.contains(&tag));
        }
        if call.get::<bool>("json")? {
            return Ok(serde_json::to_value(&notes)?);
        }
        let lines: Vec<String> = notes
            .iter()
            .map(|n| {
                let marker = if n.pinned { "*".yellow().to_string() } else { " ".to_string() };
                let tags = if n.tags.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", n.tags.join(", ")).cyan().to_string()
                };
                format!("{}{:>3}  {}{}", marker, n.id, n.text, tags)
            })
            .collect();
        Ok(Value::from(lines.join("\n")))
    })
    .doc("List notes")
    .with_context()
    .arg("tag", Arg::new(["--tag"]).in_group("filter").help("Only notes with this tag"))
    .arg("json", Arg::flag(["--json"]).in_group("format").help("Print JSON"))
    .arg("plain", Arg::flag(["--plain"]).in_group("format").help("Print text (default)"))
}

fn remove() -> Function {
    Function::new("remove", |call| {
        let book = notebook(call)?;
        let id: u64 = call.get("id")?;
        let mut notes = book.load()?;
        let before = notes.len();
        notes.retain(|n| n.id != id);
        if notes.len() == before {
            return Err(anyhow!("No note with id {}", id));
        }
        book.save(&notes)?;
        Ok(Value::from(format!("Removed note {}", id)))
    })
    .doc("Remove a note")
    .with_context()
    .arg("id", Arg::new(["id"]).option("type", "int"))
}

fn tags() -> Result<Command, Error> {
    let all = Function::new("all", |call| {
        let book = notebook(call)?;
        let mut tags: Vec<String> = book.load()?.into_iter().flat_map(|n| n.tags).collect();
        tags.sort();
        tags.dedup();
        Ok(Value::from(tags.join("\n")))
    })
    .doc("List every tag in use")
    .with_context();

    let class = Class::new("tags").doc("Inspect tags").member("all", all);
    Command::new(class)
}

fn app() -> Result<Command, Error> {
    let mut root = Command::new(Class::new("argdeco").doc("A tiny notes manager"))?;
    root.configure_parser(["argdeco"], kwargs! { "epilog" => "Notes are stored as JSON." })
        .argument(
            ["-s", "--store"],
            kwargs! { "default" => "notes.json", "metavar" => "FILE", "help" => "Notes file" },
        )
        .argument(["-v", "--verbose"], kwargs! { "action" => "count", "help" => "Chatty output" })
        .subparsers(Vec::<String>::new(), kwargs! { "title" => "Commands", "dest" => "command" })
        .bind(Binder::new(|_, ns| {
            let path = ns.get("store").and_then(Value::as_str).unwrap_or("notes.json");
            Ok(Notebook {
                path: PathBuf::from(path),
                verbosity: ns.get("verbose").and_then(Value::as_u64).unwrap_or(0),
            })
        }));

    root.subcommand(add())?.alias("new");
    root.subcommand(list())?
        .alias("ls")
        .group("filter", Some("Filtering"), None)
        .mutually_exclusive("format", false);
    root.subcommand(remove())?.alias("rm");
    root.subcommand(tags()?)?;
    Ok(root)
}

/// The main entry point of the `argdeco` demo.
/// It sets up logging, assembles the command tree, dispatches and performs
/// centralized error handling.
fn main() {
    env_logger::init();

    let outcome = app().and_then(|app| app.run(None));
    match outcome {
        Ok(Dispatch::Completed(Value::Null)) => {}
        Ok(Dispatch::Completed(Value::String(text))) => {
            if !text.is_empty() {
                println!("{}", text);
            }
        }
        Ok(Dispatch::Completed(value)) => match serde_json::to_string_pretty(&value) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("\n{}: {}", "Error".red().bold(), e),
        },
        Ok(Dispatch::Usage(_)) => std::process::exit(2),
        Err(Error::Parser(ParserError::Clap(e))) => e.exit(),
        Err(e) => {
            eprintln!("\n{}: {}", "Error".red().bold(), e);
            std::process::exit(e.exit_code());
        }
    }
}

// src/system/clap_parser.rs

//! The clap implementation of the parser contract.
//!
//! [`ClapParser`] records argparse-style configuration calls and only turns
//! them into a `clap::Command` tree when a command line is parsed. The parsed
//! `ArgMatches` are then folded into a [`Namespace`] the way argparse fills
//! one: parser defaults first, every argument of the matched parser (its
//! default when absent), then the same for the matched subcommand.

use crate::{
    constants::FALLBACK_PROG,
    core::namespace::{Namespace, NamespaceDefault},
    models::{Destination, GroupId, Kwargs, Value, is_truthy},
    system::parser::{ArgumentParser, ParserError, ParserHandle, ParserRef},
};
use clap::{
    Arg, ArgAction, ArgGroup, ArgMatches, Command,
    builder::PossibleValuesParser,
    parser::ValueSource,
};
use std::env;
use std::num::{ParseFloatError, ParseIntError};
use std::path::Path;
use std::rc::Rc;

/// The id clap gives its generated `--help` argument.
const HELP_ID: &str = "help";

// --- ARGUMENT SPECS ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoreAction {
    Store,
    StoreConst,
    StoreTrue,
    StoreFalse,
    Append,
    Count,
}

impl StoreAction {
    fn parse(action: &str, argument: &str) -> Result<Self, ParserError> {
        Ok(match action {
            "store" => Self::Store,
            "store_const" => Self::StoreConst,
            "store_true" => Self::StoreTrue,
            "store_false" => Self::StoreFalse,
            "append" => Self::Append,
            "count" => Self::Count,
            other => {
                return Err(ParserError::UnknownAction {
                    action: other.to_string(),
                    argument: argument.to_string(),
                });
            }
        })
    }

    /// Whether the argument consumes values from the command line.
    fn takes_values(self) -> bool {
        matches!(self, Self::Store | Self::Append)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Nargs {
    Optional,
    ZeroOrMore,
    OneOrMore,
    Exactly(usize),
}

impl Nargs {
    fn parse(value: &Value, argument: &str) -> Result<Self, ParserError> {
        let invalid = || ParserError::InvalidValue {
            argument: argument.to_string(),
            reason: format!("invalid nargs value {}", value),
        };
        match value {
            Value::String(s) => match s.as_str() {
                "?" => Ok(Self::Optional),
                "*" => Ok(Self::ZeroOrMore),
                "+" => Ok(Self::OneOrMore),
                digits => digits.parse().map(Self::Exactly).map_err(|_| invalid()),
            },
            Value::Number(n) => n
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .map(Self::Exactly)
                .ok_or_else(invalid),
            _ => Err(invalid()),
        }
    }

    /// Whether the parsed result is a list rather than a single value.
    fn is_list(self) -> bool {
        !matches!(self, Self::Optional)
    }

    /// Whether a positional with these nargs may be left out.
    fn is_optional(self) -> bool {
        matches!(self, Self::Optional | Self::ZeroOrMore)
    }

    /// Whether more than one value may land on the argument.
    fn is_multiple(self) -> bool {
        match self {
            Self::Optional => false,
            Self::ZeroOrMore | Self::OneOrMore => true,
            Self::Exactly(n) => n > 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ValueKind {
    #[default]
    Str,
    Int,
    Float,
}

impl ValueKind {
    fn parse(kind: &str, argument: &str) -> Result<Self, ParserError> {
        match kind {
            "str" => Ok(Self::Str),
            "int" => Ok(Self::Int),
            "float" => Ok(Self::Float),
            other => Err(ParserError::UnknownType {
                kind: other.to_string(),
                argument: argument.to_string(),
            }),
        }
    }

    fn convert(self, raw: &str, argument: &str) -> Result<Value, ParserError> {
        let invalid = |reason: String| ParserError::InvalidValue {
            argument: argument.to_string(),
            reason,
        };
        match self {
            Self::Str => Ok(Value::from(raw)),
            Self::Int => raw
                .parse::<i64>()
                .map(Value::from)
                .map_err(|e| invalid(e.to_string())),
            Self::Float => raw
                .parse::<f64>()
                .map(Value::from)
                .map_err(|e| invalid(e.to_string())),
        }
    }
}

fn validate_int(raw: &str) -> Result<String, ParseIntError> {
    raw.parse::<i64>().map(|_| raw.to_string())
}

fn validate_float(raw: &str) -> Result<String, ParseFloatError> {
    raw.parse::<f64>().map(|_| raw.to_string())
}

/// Everything recorded by one `add_argument` call.
#[derive(Debug, Clone)]
struct ArgSpec {
    dest: String,
    display: String,
    longs: Vec<String>,
    shorts: Vec<char>,
    action: StoreAction,
    default: Option<Value>,
    constant: Option<Value>,
    help: Option<String>,
    metavar: Option<String>,
    required: bool,
    choices: Option<Vec<String>>,
    nargs: Option<Nargs>,
    kind: ValueKind,
    group: Option<GroupId>,
}

impl ArgSpec {
    fn from_call(names: &[String], kwargs: Kwargs, group: Option<GroupId>) -> Result<Self, ParserError> {
        let (flags, positionals): (Vec<&String>, Vec<&String>) = names.iter().partition(|n| n.starts_with('-'));
        if (!flags.is_empty() && !positionals.is_empty()) || positionals.len() > 1 {
            return Err(ParserError::InvalidName(names.join(", ")));
        }

        let mut longs = Vec::new();
        let mut shorts = Vec::new();
        for flag in &flags {
            let mut chars = flag.chars().skip(1);
            match (flag.strip_prefix("--"), chars.next(), chars.next()) {
                (Some(long), _, _) if !long.is_empty() && !long.starts_with('-') => longs.push(long.to_string()),
                (None, Some(short), None) => shorts.push(short),
                _ => return Err(ParserError::InvalidName(flag.to_string())),
            }
        }

        let mut spec = Self {
            dest: String::new(),
            display: names.first().cloned().unwrap_or_default(),
            longs,
            shorts,
            action: StoreAction::Store,
            default: None,
            constant: None,
            help: None,
            metavar: None,
            required: false,
            choices: None,
            nargs: None,
            kind: ValueKind::Str,
            group,
        };

        let mut dest = None;
        let mut action = None;
        let mut kind = None;
        for (key, value) in kwargs {
            match key.as_str() {
                "action" => action = Some(text(&key, &value, &spec.display)?),
                "dest" => dest = Some(text(&key, &value, &spec.display)?),
                "default" => spec.default = Some(value),
                "const" => spec.constant = Some(value),
                "help" => spec.help = Some(text(&key, &value, &spec.display)?),
                "metavar" => spec.metavar = Some(text(&key, &value, &spec.display)?),
                "required" => spec.required = is_truthy(&value),
                "choices" => spec.choices = Some(choices(&value, &spec.display)?),
                "nargs" => spec.nargs = Some(Nargs::parse(&value, &spec.display)?),
                "type" => kind = Some(text(&key, &value, &spec.display)?),
                _ => {
                    return Err(ParserError::UnexpectedOption {
                        key,
                        target: format!("argument '{}'", spec.display),
                    });
                }
            }
        }

        spec.dest = match (dest, positionals.first()) {
            (Some(dest), _) => dest,
            (None, Some(name)) => name.to_string(),
            (None, None) => match (spec.longs.first(), spec.shorts.first()) {
                (Some(long), _) => long.replace('-', "_"),
                (None, Some(short)) => short.to_string(),
                (None, None) => return Err(ParserError::InvalidName(String::new())),
            },
        };
        if spec.display.is_empty() {
            spec.display.clone_from(&spec.dest);
        }
        if let Some(action) = action {
            spec.action = StoreAction::parse(&action, &spec.display)?;
        }
        if let Some(kind) = kind {
            spec.kind = ValueKind::parse(&kind, &spec.display)?;
        }

        if !spec.action.takes_values() && (spec.is_positional() || spec.nargs.is_some()) {
            return Err(ParserError::InvalidValue {
                argument: spec.display,
                reason: "this action takes no values".to_string(),
            });
        }
        if spec.nargs == Some(Nargs::Exactly(0)) {
            return Err(ParserError::InvalidValue {
                argument: spec.display,
                reason: "nargs must be != 0 for this action".to_string(),
            });
        }
        Ok(spec)
    }

    fn is_positional(&self) -> bool {
        self.longs.is_empty() && self.shorts.is_empty()
    }

    /// Whether a positional may be left out of the command line.
    fn is_optional_positional(&self) -> bool {
        self.nargs.is_some_and(Nargs::is_optional)
    }

    /// Whether several values may land on this argument.
    fn is_multiple(&self) -> bool {
        self.action == StoreAction::Append || self.nargs.is_some_and(Nargs::is_multiple)
    }

    /// The flag strings this argument occupies on its parser.
    fn flag_strings(&self) -> Vec<String> {
        let longs = self.longs.iter().map(|l| format!("--{}", l));
        let shorts = self.shorts.iter().map(|s| format!("-{}", s));
        longs.chain(shorts).collect()
    }

    fn to_clap(&self, heading: Option<&str>) -> Arg {
        let mut arg = Arg::new(self.dest.clone());
        let mut longs = self.longs.iter();
        if let Some(long) = longs.next() {
            arg = arg.long(long.clone());
        }
        for alias in longs {
            arg = arg.visible_alias(alias.clone());
        }
        let mut shorts = self.shorts.iter();
        if let Some(short) = shorts.next() {
            arg = arg.short(*short);
        }
        for alias in shorts {
            arg = arg.visible_short_alias(*alias);
        }

        arg = match self.action {
            StoreAction::Store => arg.action(ArgAction::Set),
            StoreAction::Append => arg.action(ArgAction::Append),
            StoreAction::StoreConst | StoreAction::StoreTrue | StoreAction::StoreFalse => {
                arg.action(ArgAction::SetTrue)
            }
            StoreAction::Count => arg.action(ArgAction::Count),
        };

        if self.action.takes_values() {
            arg = match self.nargs {
                None => arg.num_args(1),
                Some(Nargs::Optional) => arg.num_args(0..=1),
                Some(Nargs::ZeroOrMore) => arg.num_args(0..),
                Some(Nargs::OneOrMore) => arg.num_args(1..),
                Some(Nargs::Exactly(n)) => arg.num_args(n),
            };
            arg = match (&self.choices, self.kind) {
                (Some(choices), _) => arg.value_parser(PossibleValuesParser::new(choices.clone())),
                (None, ValueKind::Int) => arg.value_parser(validate_int),
                (None, ValueKind::Float) => arg.value_parser(validate_float),
                (None, ValueKind::Str) => arg,
            };
            let value_name = match (&self.metavar, self.is_positional()) {
                (Some(metavar), _) => Some(metavar.clone()),
                (None, true) => Some(self.display.clone()),
                (None, false) => None,
            };
            if let Some(value_name) = value_name {
                arg = arg.value_name(value_name);
            }
        }

        let required = if self.is_positional() {
            !matches!(self.nargs, Some(Nargs::Optional | Nargs::ZeroOrMore))
        } else {
            self.required
        };
        arg = arg.required(required);

        if let Some(help) = &self.help {
            arg = arg.help(help.clone());
        }
        if let Some(heading) = heading {
            arg = arg.help_heading(heading.to_string());
        }
        arg
    }

    fn convert_all<'a>(&self, raw: impl Iterator<Item = &'a String>) -> Result<Vec<Value>, ParserError> {
        raw.map(|value| self.kind.convert(value, &self.display)).collect()
    }

    /// Folds one occurrence's values into the stored shape.
    fn shape(&self, values: Vec<Value>) -> Value {
        match self.nargs {
            Some(nargs) if nargs.is_list() => Value::Array(values),
            _ => values
                .into_iter()
                .next()
                .or_else(|| self.constant.clone())
                .unwrap_or(Value::Null),
        }
    }

    /// The namespace value for this argument.
    fn extract(&self, matches: &ArgMatches) -> Result<Value, ParserError> {
        let matches_error = |e: clap::parser::MatchesError| ParserError::InvalidValue {
            argument: self.display.clone(),
            reason: e.to_string(),
        };

        let present = matches.value_source(&self.dest) == Some(ValueSource::CommandLine);
        if !present {
            return Ok(match (self.action, &self.default) {
                (_, Some(default)) => default.clone(),
                (StoreAction::StoreTrue, None) => Value::Bool(false),
                (StoreAction::StoreFalse, None) => Value::Bool(true),
                (StoreAction::Store, None) if self.is_positional() && self.nargs == Some(Nargs::ZeroOrMore) => {
                    Value::Array(Vec::new())
                }
                _ => Value::Null,
            });
        }

        match self.action {
            StoreAction::Store => {
                let raw = matches.try_get_many::<String>(&self.dest).map_err(matches_error)?;
                let values = match raw {
                    Some(raw) => self.convert_all(raw)?,
                    None => Vec::new(),
                };
                Ok(self.shape(values))
            }
            StoreAction::StoreConst => Ok(self.constant.clone().unwrap_or(Value::Null)),
            StoreAction::StoreTrue => Ok(Value::Bool(true)),
            StoreAction::StoreFalse => Ok(Value::Bool(false)),
            StoreAction::Append => {
                let mut items = match &self.default {
                    Some(Value::Array(items)) => items.clone(),
                    _ => Vec::new(),
                };
                let occurrences = matches.try_get_occurrences::<String>(&self.dest).map_err(matches_error)?;
                for occurrence in occurrences.into_iter().flatten() {
                    let values = self.convert_all(occurrence)?;
                    items.push(self.shape(values));
                }
                Ok(Value::Array(items))
            }
            StoreAction::Count => {
                let base = match &self.default {
                    None | Some(Value::Null) => 0,
                    Some(default) => default.as_i64().ok_or_else(|| ParserError::InvalidValue {
                        argument: self.display.clone(),
                        reason: format!("cannot count from default {}", default),
                    })?,
                };
                Ok(Value::from(base + i64::from(matches.get_count(&self.dest))))
            }
        }
    }
}

fn text(key: &str, value: &Value, target: &str) -> Result<String, ParserError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Err(ParserError::InvalidValue {
            argument: target.to_string(),
            reason: format!("'{}' must be a string, got {}", key, other),
        }),
    }
}

fn choices(value: &Value, target: &str) -> Result<Vec<String>, ParserError> {
    let Value::Array(items) = value else {
        return Err(ParserError::InvalidValue {
            argument: target.to_string(),
            reason: format!("'choices' must be a list, got {}", value),
        });
    };
    Ok(items
        .iter()
        .map(|item| match item {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect())
}

// --- GROUPS & SUBPARSERS ---

#[derive(Debug, Clone)]
struct GroupSpec {
    title: Option<String>,
    exclusive: bool,
    required: bool,
}

impl GroupSpec {
    const PREFIX: &'static str = "[group-";

    /// The clap id of an exclusive group. Groups share the id space of arguments.
    fn key(id: GroupId) -> String {
        format!("{}{}]", Self::PREFIX, id.0)
    }
}

#[derive(Debug, Clone, Default)]
struct SubparsersSpec {
    title: Option<String>,
    dest: Option<String>,
    required: bool,
    metavar: Option<String>,
}

// --- PARSER ---

/// argparse-style configuration recorded for one (sub)command.
#[derive(Debug, Clone)]
pub struct ClapParser {
    name: String,
    description: Option<String>,
    help: Option<String>,
    aliases: Vec<String>,
    epilog: Option<String>,
    usage: Option<String>,
    add_help: bool,
    groups: Vec<GroupSpec>,
    arguments: Vec<ArgSpec>,
    taken: Vec<String>,
    defaults: Vec<NamespaceDefault>,
    subparsers: Option<SubparsersSpec>,
    children: Vec<ClapParser>,
}

impl ClapParser {
    fn configured(name: String, kwargs: Kwargs) -> Result<Self, ParserError> {
        let mut parser = Self {
            name,
            description: None,
            help: None,
            aliases: Vec::new(),
            epilog: None,
            usage: None,
            add_help: true,
            groups: Vec::new(),
            arguments: Vec::new(),
            taken: Vec::new(),
            defaults: Vec::new(),
            subparsers: None,
            children: Vec::new(),
        };
        let target = format!("parser '{}'", parser.name);
        for (key, value) in kwargs {
            match key.as_str() {
                "prog" => parser.name = text(&key, &value, &target)?,
                "description" => parser.description = Some(text(&key, &value, &target)?),
                "help" => parser.help = Some(text(&key, &value, &target)?),
                "epilog" => parser.epilog = Some(text(&key, &value, &target)?),
                "usage" => parser.usage = Some(text(&key, &value, &target)?),
                "aliases" => parser.aliases = choices(&value, &target)?,
                "add_help" => parser.add_help = is_truthy(&value),
                _ => return Err(ParserError::UnexpectedOption { key, target }),
            }
        }
        if parser.add_help {
            parser.taken.extend(["--help".to_string(), "-h".to_string()]);
        }
        Ok(parser)
    }

    /// The program or subcommand name of this parser.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name and aliases this parser answers to as a subcommand.
    fn command_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// Ids clap uses for its own arguments and groups on this command.
    fn is_reserved_id(&self, dest: &str) -> bool {
        (self.add_help && dest == HELP_ID) || dest.starts_with(GroupSpec::PREFIX)
    }

    /// Keeps the positionals in an order clap can match unambiguously: no
    /// required positional after an optional one, and a multi-valued
    /// positional only as the last or the one before a required last.
    fn check_positional(&self, spec: &ArgSpec) -> Result<(), ParserError> {
        let positionals: Vec<&ArgSpec> = self.arguments.iter().filter(|a| a.is_positional()).collect();
        let reject = |reason: &str| {
            Err(ParserError::InvalidValue {
                argument: spec.display.clone(),
                reason: reason.to_string(),
            })
        };
        if !spec.is_optional_positional() && positionals.iter().any(|p| p.is_optional_positional()) {
            return reject("a required positional cannot follow an optional one");
        }
        let Some(first_multiple) = positionals.iter().position(|p| p.is_multiple()) else {
            return Ok(());
        };
        if first_multiple + 1 != positionals.len() || spec.is_multiple() || spec.is_optional_positional() {
            return reject("only one positional may take several values, and only the last or second to last");
        }
        Ok(())
    }

    fn heading(&self, group: Option<GroupId>) -> Option<&str> {
        let spec = self.groups.get(group?.0)?;
        if spec.exclusive { None } else { spec.title.as_deref() }
    }

    /// Materializes the clap command for this parser and its children.
    fn build(&self, bin_name: &str) -> Command {
        let mut command = Command::new(self.name.clone())
            .bin_name(bin_name.to_string())
            .args_override_self(true)
            .disable_help_subcommand(true)
            .disable_version_flag(true)
            .disable_help_flag(!self.add_help);

        match (&self.help, &self.description) {
            (Some(help), Some(description)) => {
                command = command.about(help.clone()).long_about(description.clone());
            }
            (Some(about), None) | (None, Some(about)) => command = command.about(about.clone()),
            (None, None) => {}
        }
        if let Some(epilog) = &self.epilog {
            command = command.after_help(epilog.clone());
        }
        if let Some(usage) = &self.usage {
            command = command.override_usage(usage.clone());
        }
        if !self.aliases.is_empty() {
            command = command.visible_aliases(self.aliases.clone());
        }

        for (index, group) in self.groups.iter().enumerate() {
            if group.exclusive {
                let key = GroupSpec::key(GroupId(index));
                command = command.group(ArgGroup::new(key).multiple(false).required(group.required));
            }
        }
        for spec in &self.arguments {
            let mut arg = spec.to_clap(self.heading(spec.group));
            if let Some(id) = spec.group
                && self.groups.get(id.0).is_some_and(|g| g.exclusive)
            {
                arg = arg.group(GroupSpec::key(id));
            }
            command = command.arg(arg);
        }

        if let Some(subparsers) = &self.subparsers {
            command = command.subcommand_required(subparsers.required);
            if let Some(title) = &subparsers.title {
                command = command.subcommand_help_heading(title.clone());
            }
            if let Some(metavar) = &subparsers.metavar {
                command = command.subcommand_value_name(metavar.clone());
            }
            for child in &self.children {
                command = command.subcommand(child.build(&format!("{} {}", bin_name, child.name)));
            }
        }
        command
    }

    /// Applies defaults and argument values of this level, then descends into
    /// the matched subcommand.
    fn collect(&self, command: &Command, matches: &ArgMatches, namespace: &mut Namespace) -> Result<(), ParserError> {
        let handle: ParserRef = Rc::new(ClapHandle {
            command: command.clone(),
        });
        for default in &self.defaults {
            namespace.apply_default(default, || Rc::clone(&handle));
        }
        for spec in &self.arguments {
            namespace.insert(spec.dest.clone(), spec.extract(matches)?);
        }

        let Some((name, sub_matches)) = matches.subcommand() else {
            return Ok(());
        };
        log::trace!("Matched subcommand '{}' of '{}'", name, self.name);
        if let Some(dest) = self.subparsers.as_ref().and_then(|s| s.dest.as_ref()) {
            namespace.insert(dest.clone(), Value::from(name));
        }
        let child = self.children.iter().find(|c| c.name == name);
        let sub_command = command.find_subcommand(name);
        match (child, sub_command) {
            (Some(child), Some(sub_command)) => child.collect(sub_command, sub_matches, namespace),
            _ => Ok(()),
        }
    }
}

impl ArgumentParser for ClapParser {
    fn create(args: &[String], kwargs: Kwargs) -> Result<Self, ParserError> {
        let mut args = args.iter();
        let name = match args.next() {
            Some(prog) => prog.clone(),
            None => env::args()
                .next()
                .and_then(|arg0| {
                    Path::new(&arg0)
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                })
                .unwrap_or_else(|| FALLBACK_PROG.to_string()),
        };
        if let Some(extra) = args.next() {
            return Err(ParserError::UnexpectedOption {
                key: extra.clone(),
                target: format!("parser '{}'", name),
            });
        }
        Self::configured(name, kwargs)
    }

    fn add_argument(
        &mut self,
        destination: Destination,
        name_or_flags: &[String],
        kwargs: Kwargs,
    ) -> Result<(), ParserError> {
        let group = match destination {
            Destination::Parser => None,
            Destination::Group(id) if id.0 < self.groups.len() => Some(id),
            Destination::Group(id) => return Err(ParserError::UnknownGroup(id)),
        };
        let spec = ArgSpec::from_call(name_or_flags, kwargs, group)?;
        if self.arguments.iter().any(|a| a.dest == spec.dest) || self.is_reserved_id(&spec.dest) {
            return Err(ParserError::ConflictingArgument(spec.dest));
        }
        let flags = spec.flag_strings();
        if let Some(flag) = flags.iter().find(|f| self.taken.contains(f)) {
            return Err(ParserError::ConflictingArgument(flag.clone()));
        }
        if spec.is_positional() {
            self.check_positional(&spec)?;
        }
        log::trace!("clap: argument '{}' on '{}'", spec.dest, self.name);
        self.taken.extend(flags);
        self.arguments.push(spec);
        Ok(())
    }

    fn add_argument_group(&mut self, kwargs: Kwargs) -> Result<GroupId, ParserError> {
        let target = format!("argument group of '{}'", self.name);
        let mut title = None;
        for (key, value) in kwargs {
            match key.as_str() {
                "title" => title = Some(text(&key, &value, &target)?),
                "description" => {}
                _ => return Err(ParserError::UnexpectedOption { key, target }),
            }
        }
        self.groups.push(GroupSpec {
            title,
            exclusive: false,
            required: false,
        });
        Ok(GroupId(self.groups.len() - 1))
    }

    fn add_mutually_exclusive_group(&mut self, kwargs: Kwargs) -> Result<GroupId, ParserError> {
        let target = format!("mutually exclusive group of '{}'", self.name);
        let mut required = false;
        for (key, value) in kwargs {
            match key.as_str() {
                "required" => required = is_truthy(&value),
                _ => return Err(ParserError::UnexpectedOption { key, target }),
            }
        }
        self.groups.push(GroupSpec {
            title: None,
            exclusive: true,
            required,
        });
        Ok(GroupId(self.groups.len() - 1))
    }

    fn add_subparsers(&mut self, args: &[String], kwargs: Kwargs) -> Result<(), ParserError> {
        if self.subparsers.is_some() {
            return Err(ParserError::DuplicateSubparsers);
        }
        let target = format!("subparsers of '{}'", self.name);
        if let Some(extra) = args.first() {
            return Err(ParserError::UnexpectedOption {
                key: extra.clone(),
                target,
            });
        }
        let mut spec = SubparsersSpec::default();
        for (key, value) in kwargs {
            match key.as_str() {
                "title" => spec.title = Some(text(&key, &value, &target)?),
                "dest" => spec.dest = Some(text(&key, &value, &target)?),
                "metavar" => spec.metavar = Some(text(&key, &value, &target)?),
                "required" => spec.required = is_truthy(&value),
                "description" | "help" => {}
                _ => return Err(ParserError::UnexpectedOption { key, target }),
            }
        }
        self.subparsers = Some(spec);
        Ok(())
    }

    fn add_parser(&mut self, args: &[String], kwargs: Kwargs) -> Result<&mut Self, ParserError> {
        if self.subparsers.is_none() {
            return Err(ParserError::NoSubparsers);
        }
        let name = args
            .first()
            .cloned()
            .ok_or_else(|| ParserError::InvalidName(String::new()))?;
        if let Some(extra) = args.get(1) {
            return Err(ParserError::UnexpectedOption {
                key: extra.clone(),
                target: format!("sub-parser '{}'", name),
            });
        }
        let child = Self::configured(name, kwargs)?;
        let mut seen: Vec<&str> = self.children.iter().flat_map(ClapParser::command_names).collect();
        for candidate in child.command_names() {
            if seen.contains(&candidate) {
                return Err(ParserError::ConflictingSubcommand(candidate.to_string()));
            }
            seen.push(candidate);
        }
        self.children.push(child);
        self.children.last_mut().ok_or(ParserError::NoSubparsers)
    }

    fn set_defaults(&mut self, defaults: Vec<NamespaceDefault>) {
        self.defaults.extend(defaults);
    }

    fn parse_args(&self, argv: Option<&[String]>) -> Result<Namespace, ParserError> {
        let argv: Vec<String> = match argv {
            Some(argv) => argv.to_vec(),
            None => env::args().skip(1).collect(),
        };
        log::debug!("Parsing {:?} with '{}'", argv, self.name);
        let mut command = self.build(&self.name);
        let matches = command.try_get_matches_from_mut(std::iter::once(self.name.clone()).chain(argv))?;
        let mut namespace = Namespace::new();
        self.collect(&command, &matches, &mut namespace)?;
        Ok(namespace)
    }
}

/// The stamped parser handle: the materialized clap command of one level.
#[derive(Debug, Clone)]
pub struct ClapHandle {
    command: Command,
}

impl ParserHandle for ClapHandle {
    fn prog(&self) -> String {
        self.command
            .get_bin_name()
            .unwrap_or_else(|| self.command.get_name())
            .to_string()
    }

    fn format_usage(&self) -> String {
        format!("{}\n", self.command.clone().render_usage())
    }
}

// MARK: --- UNIT TESTS ---

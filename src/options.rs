//! Parsing Options.
//! `pn [--config FILE] <check|simulate|codegen> NET ...`

use clap::{Arg, ArgAction, ArgMatches, Command};
use std::error::Error;
use std::path::PathBuf;

use crate::net::data::SimModeKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Assemble the net and report the first construction error.
    Check,
    Simulate {
        ticks: u64,
        inputs: Option<PathBuf>,
        mode: Option<SimModeKind>,
        json: bool,
    },
    Codegen {
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub action: Action,
    pub net: PathBuf,
    pub config: PathBuf,
}

fn net_arg() -> Arg {
    Arg::new("net")
        .value_name("NET")
        .help("Net description (.json/.apn, or .ron)")
        .required(true)
}

fn make_options_parser() -> clap::Command {
    Command::new("pn")
        .no_binary_name(true)
        .version("v0.1.0")
        .about("Automation Petri net simulator and structured-text generator")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Runtime settings (TOML)")
                .default_value("pn.toml")
                .global(true),
        )
        .subcommand(Command::new("check").about("Validate a net").arg(net_arg()))
        .subcommand(
            Command::new("simulate")
                .about("Run a net headless and print one line per tick")
                .arg(net_arg())
                .arg(
                    Arg::new("ticks")
                        .short('n')
                        .long("ticks")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("100"),
                )
                .arg(
                    Arg::new("inputs")
                        .short('i')
                        .long("inputs")
                        .value_name("FILE")
                        .help("JSON object of input values, re-read every tick"),
                )
                .arg(
                    Arg::new("mode")
                        .short('m')
                        .long("mode")
                        .help("Override the net's simulation mode")
                        .value_parser(["classic", "automation", "visobj"]),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print tick reports as JSON lines")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("codegen")
                .about("Translate a net to structured text")
                .arg(net_arg())
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("FILE")
                        .help("Write the program here instead of stdout"),
                ),
        )
}

fn path_of(matches: &ArgMatches, id: &str) -> Option<PathBuf> {
    matches.get_one::<String>(id).map(PathBuf::from)
}

impl Options {
    pub fn parse_from_str(s: &str) -> Result<Self, Box<dyn Error>> {
        let flags = shellwords::split(s)?;
        Self::parse_from_args(&flags)
    }

    pub fn parse_from_args(flags: &[String]) -> Result<Self, Box<dyn Error>> {
        let app = make_options_parser();
        let matches = app.try_get_matches_from(flags.iter())?;
        let (name, sub) = matches.subcommand().ok_or("missing subcommand")?;

        let action = match name {
            "check" => Action::Check,
            "simulate" => {
                let mode = match sub.get_one::<String>("mode").map(String::as_str) {
                    Some("classic") => Some(SimModeKind::Classic),
                    Some("automation") => Some(SimModeKind::Automation),
                    Some("visobj") => Some(SimModeKind::VisObj),
                    Some(_) => return Err("UnsupportedSimMode")?,
                    None => None,
                };
                Action::Simulate {
                    ticks: sub.get_one::<u64>("ticks").copied().unwrap_or(100),
                    inputs: path_of(sub, "inputs"),
                    mode,
                    json: sub.get_flag("json"),
                }
            }
            "codegen" => Action::Codegen {
                output: path_of(sub, "output"),
            },
            _ => return Err("UnsupportedCommand")?,
        };

        let net = path_of(sub, "net").ok_or("missing net file")?;
        let config = path_of(sub, "config")
            .or_else(|| path_of(&matches, "config"))
            .unwrap_or_else(|| PathBuf::from("pn.toml"));
        Ok(Options {
            action,
            net,
            config,
        })
    }
}

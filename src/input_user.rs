use std::path::Path;

use clap::{App, Arg, ArgMatches};
use colored::Colorize;

use crate::executor::symbolic_setting::SearchStrategy;
use crate::VERSION;

pub struct Input {
    pub input_program: String,
    pub function: Option<String>,
    pub strategy: Option<SearchStrategy>,
    pub path_to_setting: Option<String>,
    pub seed: Option<u64>,
    pub flag_printout_stats: bool,
    pub flag_printout_stats_csv: bool,
    pub flag_save_output: bool,
}

impl Input {
    pub fn new() -> Result<Input, ()> {
        let matches = input_processing::view();
        Input::from_matches(&matches)
    }

    pub fn from_matches(matches: &ArgMatches) -> Result<Input, ()> {
        let input_program = matches.value_of("input").unwrap_or_default().to_string();
        if !Path::new(&input_program).is_file() {
            eprintln!(
                "{} {}",
                "error: no program file at".red().bold(),
                input_program
            );
            return Err(());
        }

        let strategy = match matches.value_of("strategy") {
            Some(s) => match s.parse::<SearchStrategy>() {
                Ok(strategy) => Some(strategy),
                Err(e) => {
                    eprintln!("{} {}", "error:".red().bold(), e);
                    return Err(());
                }
            },
            None => None,
        };

        let seed = match matches.value_of("seed") {
            Some(s) => match s.parse::<u64>() {
                Ok(seed) => Some(seed),
                Err(_) => {
                    eprintln!("{} seed `{}` is not a number", "error:".red().bold(), s);
                    return Err(());
                }
            },
            None => None,
        };

        Ok(Input {
            input_program,
            function: matches.value_of("function").map(|f| f.to_string()),
            strategy,
            path_to_setting: matches.value_of("setting").map(|s| s.to_string()),
            seed,
            flag_printout_stats: matches.is_present("print_stats"),
            flag_printout_stats_csv: matches.is_present("print_stats_csv"),
            flag_save_output: matches.is_present("save_output"),
        })
    }

    pub fn input_file(&self) -> &str {
        &self.input_program
    }
}

pub mod input_processing {
    use super::*;

    pub fn app() -> App<'static, 'static> {
        App::new("pathsynth")
            .version(VERSION)
            .about("Symbolic execution of SSA programs for test input generation")
            .arg(
                Arg::with_name("input")
                    .required(true)
                    .takes_value(true)
                    .help("Program to explore, as a JSON file"),
            )
            .arg(
                Arg::with_name("function")
                    .long("function")
                    .takes_value(true)
                    .help("Explore only this function (default: every function)"),
            )
            .arg(
                Arg::with_name("strategy")
                    .long("strategy")
                    .takes_value(true)
                    .possible_values(&["dfs", "random", "nurs"])
                    .help("Search strategy, overriding the setting file"),
            )
            .arg(
                Arg::with_name("setting")
                    .long("setting")
                    .takes_value(true)
                    .help("JSON file with exploration settings"),
            )
            .arg(
                Arg::with_name("seed")
                    .long("seed")
                    .takes_value(true)
                    .help("Seed for the random strategy"),
            )
            .arg(
                Arg::with_name("print_stats")
                    .long("print_stats")
                    .takes_value(false)
                    .help("Print path statistics"),
            )
            .arg(
                Arg::with_name("print_stats_csv")
                    .long("print_stats_csv")
                    .takes_value(false)
                    .help("Print path statistics as CSV"),
            )
            .arg(
                Arg::with_name("save_output")
                    .long("save_output")
                    .takes_value(false)
                    .help("Save synthesized test cases as JSON next to the input"),
            )
    }

    pub fn view() -> ArgMatches<'static> {
        app().get_matches()
    }
}

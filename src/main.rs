use clap::{CommandFactory, Parser};
use geotable::cli::{args::Args, commands};
use std::process;

fn main() {
    let args = Args::parse();

    // Without a subcommand, show the help text
    if args.command.is_none() {
        if Args::command().print_help().is_err() {
            process::exit(1);
        }
        println!();
        process::exit(0);
    }

    match commands::run(args) {
        Ok(()) => process::exit(0),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

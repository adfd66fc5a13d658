//! Command-line arguments.

use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

use clap::Parser;

use crate::driver::Options;

/// Compiles Water source files to JVM class files.
#[derive(Debug, Parser)]
#[command(name = "water", disable_version_flag = true)]
pub struct Cli {
    /// Displays version information
    #[arg(short = 'v', long)]
    pub version: bool,

    /// Pretty print the parsed AST (also `-pp`), used for debugging the compiler
    #[arg(long = "prettyprint")]
    pub pretty_print: bool,

    /// The directory where generated files are placed
    #[arg(short = 'd', long = "outputDir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Set the optimization configuration path
    #[arg(short = 'o', long = "optimize", value_name = "FILE")]
    pub optimize: Option<PathBuf>,

    /// The directories or jars to add to the classpath of the compiler (also `-cp`)
    #[arg(short = 'p', long = "classpath", value_name = "PATHS")]
    pub classpath: Vec<OsString>,

    /// Log compiler progress to stderr
    #[arg(long)]
    pub verbose: bool,

    /// Files to be compiled
    #[arg(value_name = "FILES", required_unless_present = "version")]
    pub files: Vec<PathBuf>,
}

impl Cli {
    /// Parse `args`, accepting the two-letter short forms `-pp` and `-cp`.
    pub fn try_parse_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::try_parse_from(args.into_iter().map(|arg| rewrite_short_form(arg.into())))
    }

    pub fn options(&self) -> Options {
        Options {
            pretty_print: self.pretty_print,
            output_dir: self.output_dir.clone(),
            optimize: self.optimize.clone(),
            classpath: self.classpath.iter().flat_map(std::env::split_paths).collect(),
            files: self.files.clone(),
        }
    }
}

fn rewrite_short_form(arg: OsString) -> OsString {
    let Some(text) = arg.to_str() else {
        return arg;
    };
    if text == "-pp" {
        return OsString::from("--prettyprint");
    }
    if text == "-cp" {
        return OsString::from("--classpath");
    }
    match text.strip_prefix("-cp=") {
        Some(paths) => {
            let mut rewritten = OsString::from("--classpath=");
            rewritten.push(OsStr::new(paths));
            rewritten
        }
        None => arg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_letter_flags() {
        let cli = Cli::try_parse_args(["water", "-pp", "-cp", "lib", "main.wtr"]).unwrap();
        assert!(cli.pretty_print);
        assert_eq!(cli.classpath, [OsString::from("lib")]);
        assert_eq!(cli.files, [PathBuf::from("main.wtr")]);

        let cli = Cli::try_parse_args(["water", "-cp=a", "-p", "b", "x.wtr"]).unwrap();
        assert_eq!(cli.options().classpath, [PathBuf::from("a"), PathBuf::from("b")]);
    }

    #[test]
    fn classpath_lists_are_split() {
        let joined = std::env::join_paths(["one", "two"]).unwrap();
        let cli = Cli::try_parse_args([OsString::from("water"), "--classpath".into(), joined, "m.wtr".into()]).unwrap();
        assert_eq!(cli.options().classpath, [PathBuf::from("one"), PathBuf::from("two")]);
    }

    #[test]
    fn long_options() {
        let cli = Cli::try_parse_args(["water", "--outputDir", "out", "-o", "opt.properties", "--verbose", "a.wtr", "b.wtr"])
            .unwrap();
        assert_eq!(cli.output_dir, Some(PathBuf::from("out")));
        assert_eq!(cli.optimize, Some(PathBuf::from("opt.properties")));
        assert!(cli.verbose);
        assert_eq!(cli.files.len(), 2);
    }

    #[test]
    fn files_are_required_unless_asking_for_the_version() {
        assert!(Cli::try_parse_args(["water"]).is_err());
        assert!(Cli::try_parse_args(["water", "--bogus", "a.wtr"]).is_err());
        let cli = Cli::try_parse_args(["water", "-v"]).unwrap();
        assert!(cli.version);
    }
}

use std::time::Duration;

use anyhow::{Context, Result};
use clap::crate_version;
use clap::{Arg, ArgMatches, Command};

#[derive(Debug)]
pub struct Arguments {
    pub verbose: bool,
    pub home_only: bool,
    pub remote_labels: bool,
    pub timeout: Option<Duration>,
    pub config: Option<String>,
    pub debug: u64,
    pub user: Option<String>,
}

impl TryFrom<ArgMatches> for Arguments {
    type Error = anyhow::Error;

    fn try_from(args: ArgMatches) -> Result<Self, Self::Error> {
        let timeout = args
            .value_of("timeout")
            .map(|t| {
                t.parse::<u64>()
                    .with_context(|| format!("parsing timeout {} to seconds", t))
            })
            .transpose()?
            .map(Duration::from_secs);

        Ok(Self {
            verbose: args.is_present("verbose"),
            home_only: args.is_present("home"),
            remote_labels: args.is_present("remote"),
            timeout,
            config: args.value_of("config").map(Into::into),
            debug: args.occurrences_of("debug"),
            user: args.value_of("user").map(Into::into),
        })
    }
}

pub fn args() -> Result<Arguments> {
    let arguments = build().get_matches();
    let arguments = Arguments::try_from(arguments)?;
    Ok(arguments)
}

pub fn build() -> Command<'static> {
    let verbose = Arg::new("verbose")
        .short('v')
        .help("show usage and limits")
        .long_help("Show usage, limits and grace time of every filesystem instead of warnings only.");

    let home = Arg::new("home")
        .short('l')
        .help("home directory filesystem only");

    let remote = Arg::new("remote")
        .short('r')
        .help("label with host:path");

    let timeout = Arg::new("timeout")
        .short('t')
        .takes_value(true)
        .value_name("sec")
        .help("abort after sec seconds");

    let config = Arg::new("config")
        .short('f')
        .takes_value(true)
        .value_name("config_file")
        .env("QUOTA_CONF")
        .help("filesystem table")
        .long_help("Filesystem table. Defaults to /etc/quota.conf.");

    let debug = Arg::new("debug")
        .short('d')
        .multiple_occurrences(true)
        .help("log lookups, repeat for more");

    let user = Arg::new("user")
        .takes_value(true)
        .help("user name or uid")
        .long_help("User name or uid. Defaults to the calling user.");

    Command::new("quota")
        .about("display disk usage and limits")
        .version(crate_version!())
        .arg(verbose)
        .arg(home)
        .arg(remote)
        .arg(timeout)
        .arg(config)
        .arg(debug)
        .arg(user)
        .mut_arg("help", |a| {
            a.short('?').help("print help").long_help("Print help.")
        })
        .mut_arg("version", |a| {
            a.hide_short_help(true).long_help("Print version.")
        })
}

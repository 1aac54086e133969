use std::time::Duration;

use anyhow::{Context, Result};
use clap::crate_version;
use clap::{Arg, ArgMatches, Command};

use fsquota::{SortKey, Summary, Units};

#[derive(Debug)]
pub struct Arguments {
    pub filesystem: String,
    pub scan_dirs: bool,
    pub table: Option<Summary>,
    pub sort: Option<SortKey>,
    pub reverse: bool,
    pub min_uid: u32,
    pub timeout: Option<Duration>,
    pub config: Option<String>,
    pub debug: u64,
}

impl TryFrom<ArgMatches> for Arguments {
    type Error = anyhow::Error;

    fn try_from(args: ArgMatches) -> Result<Self, Self::Error> {
        let filesystem = args
            .value_of("filesystem")
            .with_context(|| "no filesystem argument")?
            .into();

        let block_size = args
            .value_of("block-size")
            .map(|b| {
                b.parse::<u64>()
                    .ok()
                    .filter(|b| *b > 0)
                    .with_context(|| format!("invalid block size {}", b))
            })
            .transpose()?
            .unwrap_or(1);

        let table = args.is_present("table").then(|| Summary {
            units: if args.is_present("human") {
                Units::Human
            } else {
                Units::Raw
            },
            usage_only: args.is_present("usage-only"),
            block_size,
        });

        let reverse = args.is_present("reverse");

        let sort = args
            .value_of("sort")
            .map(str::parse::<SortKey>)
            .transpose()?
            .or_else(|| reverse.then(|| SortKey::Uid));

        let min_uid = args
            .value_of("min-uid")
            .map(|m| {
                m.parse::<u32>()
                    .with_context(|| format!("parsing min uid {} to u32", m))
            })
            .transpose()?
            .unwrap_or(500);

        let timeout = args
            .value_of("timeout")
            .map(|t| {
                t.parse::<u64>()
                    .with_context(|| format!("parsing timeout {} to seconds", t))
            })
            .transpose()?
            .map(Duration::from_secs);

        Ok(Self {
            filesystem,
            scan_dirs: args.is_present("scan"),
            table,
            sort,
            reverse,
            min_uid,
            timeout,
            config: args.value_of("config").map(Into::into),
            debug: args.occurrences_of("debug"),
        })
    }
}

pub fn args() -> Result<Arguments> {
    let arguments = build().get_matches();
    let arguments = Arguments::try_from(arguments)?;
    Ok(arguments)
}

pub fn build() -> Command<'static> {
    let fs = Arg::new("filesystem")
        .takes_value(true)
        .required(true)
        .help("filesystem label from the filesystem table");

    let scan = Arg::new("scan")
        .short('s')
        .help("users from top level directory owners")
        .long_help(
            "Report the owners of the top level directories of the filesystem \
             instead of all users from the passwd database.",
        );

    let table = Arg::new("table")
        .short('T')
        .help("summary table without grace times");

    let human = Arg::new("human")
        .short('h')
        .requires("table")
        .help("human readable byte columns");

    let usage_only = Arg::new("usage-only")
        .short('U')
        .requires("table")
        .help("usage columns only");

    let block_size = Arg::new("block-size")
        .short('b')
        .takes_value(true)
        .value_name("bytes")
        .requires("table")
        .help("divide raw byte columns by this");

    let sort = Arg::new("sort")
        .short('S')
        .takes_value(true)
        .possible_values(["uid", "bytes", "files"])
        .help("sort users");

    let reverse = Arg::new("reverse")
        .short('R')
        .help("reverse sort order");

    let min_uid = Arg::new("min-uid")
        .short('m')
        .takes_value(true)
        .value_name("uid")
        .help("skip passwd entries below this uid [default: 500]");

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

    Command::new("repquota")
        .about("report disk usage and limits of all users on a filesystem")
        .version(crate_version!())
        .arg(fs)
        .arg(scan)
        .arg(table)
        .arg(human)
        .arg(usage_only)
        .arg(block_size)
        .arg(sort)
        .arg(reverse)
        .arg(min_uid)
        .arg(timeout)
        .arg(config)
        .arg(debug)
        .mut_arg("help", |a| {
            a.short('?').help("print help").long_help("Print help.")
        })
        .mut_arg("version", |a| {
            a.hide_short_help(true).long_help("Print version.")
        })
}

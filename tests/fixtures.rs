//! End to end reports of the built-in fixture quotas.

use fsquota::record::sort_records;
use fsquota::report::{
    Reporter, Units, FILESYSTEM_HEADER, USER_HEADER, VERBOSE_PREFIX,
};
use fsquota::{Config, LookupError, QuotaRecord, SortKey, Sources, Summary};

const CONF: &str = "/test:test:/test:90\n";

/// Full report (`quota -v`) of `uid` on the fixture filesystem.
fn verbose(uid: u32) -> String {
    let config = CONF.parse::<Config>().unwrap();
    let entry = &config.entries()[0];

    let record = Sources::default().get(uid, entry).unwrap();

    let mut reporter = Reporter::new(Vec::new(), Units::Human);
    reporter.full(entry.label(), &record).unwrap();

    String::from_utf8(reporter.into_inner()).unwrap()
}

/// Warning-only report (`quota`) of `uid`, and the number of warnings.
fn terse(uid: u32) -> (String, usize) {
    let config = CONF.parse::<Config>().unwrap();
    let entry = &config.entries()[0];

    let record = Sources::default().get(uid, entry).unwrap();

    let mut reporter = Reporter::new(Vec::new(), Units::Human);
    let count = reporter.warn("", entry.label(), &record).unwrap();
    reporter.suggest().unwrap();

    (String::from_utf8(reporter.into_inner()).unwrap(), count)
}

#[test]
fn usage_without_limits() {
    assert_eq!(
        verbose(100),
        "/test          1M     n/a    n/a                445K   n/a    n/a      \n"
    );
    assert_eq!(terse(100), (String::new(), 0));
}

#[test]
fn expired_block_quota() {
    assert_eq!(
        verbose(101),
        concat!(
            "/test          1G     1M     1M       expired   445K   1M     1M       \n",
            "*** Over block quota on /test, time limit expired.\n",
        )
    );
    assert_eq!(
        terse(101),
        (
            concat!(
                "Over block quota on /test, time limit expired.\n",
                "Run quota -v for more detailed information.\n",
            )
            .to_string(),
            1
        )
    );
}

#[test]
fn expired_file_quota() {
    assert_eq!(
        verbose(102),
        concat!(
            "/test          1K     1M     1G                 445K   1K     1K       expired\n",
            "*** Over file quota on /test, time limit expired\n",
        )
    );
}

#[test]
fn high_usage() {
    assert_eq!(
        verbose(103),
        "/test          73P    n/a    n/a                17T    n/a    n/a      \n"
    );
}

#[test]
fn over_threshold() {
    assert_eq!(
        verbose(104),
        concat!(
            "/test          100K   105K   105K               0      n/a    n/a      \n",
            "*** Block usage on /test has exceeded 90% of quota.\n",
        )
    );
}

#[test]
fn block_grace_started() {
    assert_eq!(
        verbose(105),
        concat!(
            "/test          100K   90K    105K     3.0 days  0      n/a    n/a      \n",
            "*** Over block quota on /test, remove 10K within 3.0 days.\n",
        )
    );

    let (out, count) = terse(105);
    assert_eq!(count, 1);
    assert!(out.starts_with("Over block quota on /test, remove 10K within 3.0 days.\n"));
}

#[test]
fn file_grace_not_started() {
    assert_eq!(
        verbose(106),
        concat!(
            "/test          0      n/a    n/a                100K   90K    105K     [7 days]\n",
            "*** Over file quota on /test, remove 10K files within [7 days].\n",
        )
    );
}

#[test]
fn unknown_uid() {
    let config = CONF.parse::<Config>().unwrap();
    let err = Sources::default()
        .get(4242, &config.entries()[0])
        .unwrap_err();

    assert!(matches!(err, LookupError::NoQuota(4242)));
}

#[test]
fn multiple_filesystems() {
    let config = concat!(
        "/test:test:/test:90\n",
        "/home:nfs1:/export/home\n",
        "/scratch:test:/scratch\n",
    )
    .parse::<Config>()
    .unwrap();

    let sources = Sources::default();
    let mut reporter = Reporter::new(Vec::new(), Units::Human);

    reporter.line(FILESYSTEM_HEADER).unwrap();

    for entry in config.entries() {
        if let Ok(record) = sources.get(105, entry) {
            reporter.full(entry.label(), &record).unwrap();
        }
    }

    let out = String::from_utf8(reporter.into_inner()).unwrap();
    let lines = out.lines().collect::<Vec<_>>();

    // the nfs entry is skipped, config order is kept
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0], FILESYSTEM_HEADER);
    assert!(lines[1].starts_with("/test "));
    assert!(lines[2].starts_with(VERBOSE_PREFIX));
    assert!(lines[3].starts_with("/scratch "));
    assert_eq!(
        lines[4],
        "*** Over block quota on /scratch, remove 10K within 3.0 days."
    );
}

/// Every fixture user on the fixture filesystem, in uid order.
fn batch() -> Vec<QuotaRecord> {
    let config = CONF.parse::<Config>().unwrap();
    let entry = &config.entries()[0];
    let sources = Sources::default();

    (100..=106)
        .map(|uid| sources.get(uid, entry).unwrap())
        .collect()
}

#[test]
fn batch_reverse_uid() {
    let mut records = batch();
    sort_records(&mut records, SortKey::Uid, true);

    let mut reporter = Reporter::new(Vec::new(), Units::Human);
    reporter.line(USER_HEADER).unwrap();

    for record in &records {
        reporter.full(&record.user_label(), record).unwrap();
    }

    let out = String::from_utf8(reporter.into_inner()).unwrap();
    let lines = out.lines().collect::<Vec<_>>();

    assert_eq!(lines[0], USER_HEADER);
    assert_eq!(
        lines[1..5],
        [
            "106            0      n/a    n/a                100K   90K    105K     [7 days]",
            "*** Over file quota on 106, remove 10K files within [7 days].",
            "105            100K   90K    105K     3.0 days  0      n/a    n/a      ",
            "*** Over block quota on 105, remove 10K within 3.0 days.",
        ]
    );

    let users = lines[1..]
        .iter()
        .filter(|l| !l.starts_with(VERBOSE_PREFIX))
        .filter_map(|l| l.split_whitespace().next())
        .collect::<Vec<_>>();

    assert_eq!(users, ["106", "105", "104", "103", "102", "101", "100"]);
    assert_eq!(lines.len(), 13);
}

#[test]
fn batch_table_by_bytes() {
    let mut records = batch();
    sort_records(&mut records, SortKey::Bytes, true);

    let table = Summary {
        units: Units::Raw,
        usage_only: true,
        block_size: 1024,
    };

    let mut reporter = Reporter::new(Vec::new(), Units::Human);
    reporter.line(&table.heading()).unwrap();

    for record in &records {
        reporter.line(&table.row(record)).unwrap();
    }

    assert_eq!(
        String::from_utf8(reporter.into_inner()).unwrap(),
        concat!(
            "User       Space-used  Files-used  \n",
            "103        80264348827648 18691697672192\n",
            "101        1048576     455555      \n",
            "100        1024        455555      \n",
            "104        100         0           \n",
            "105        100         0           \n",
            "102        1           455555      \n",
            "106        0           102400      \n",
        )
    );
}

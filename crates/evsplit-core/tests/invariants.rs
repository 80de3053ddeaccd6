//! Invariants of the split engine over arbitrary well-formed sources.
//!
//! Sources are built from generated header lines and records, split into
//! in-memory shards, and the shards are checked against the source:
//! - **conservation**: every record lands in exactly one shard, unmodified,
//!   in source order within its shard;
//! - **fidelity**: every shard starts with the header and ends with the footer;
//! - **balance**: round-robin sends record `k` to shard `k mod N`;
//! - **determinism**: round-robin, and random under a fixed seed, repeat exactly.

use std::io::Cursor;

use evsplit_core::config::TrailingPolicy;
use evsplit_core::driver::StreamDriver;
use evsplit_core::format::Markers;
use evsplit_core::policy::PartitionPolicy;
use evsplit_core::pool::ShardPool;
use evsplit_core::progress::NoProgress;
use evsplit_core::summary::SplitSummary;
use proptest::prelude::*;

const FOOTER: &str = "</LesHouchesEvents>\n";

/// Build a source from header lines and record bodies. Odd-indexed records are
/// written on a single line to exercise same-line open/close.
fn build_source(header: &[String], bodies: &[Vec<String>]) -> (String, String, Vec<String>) {
    let head: String = header.iter().map(|l| format!("{l}\n")).collect();
    let records: Vec<String> = bodies
        .iter()
        .enumerate()
        .map(|(k, body)| {
            if k % 2 == 1 {
                format!("<event> {} </event>\n", body.join(" "))
            } else {
                let inner: String = body.iter().map(|l| format!("{l}\n")).collect();
                format!("<event>\n{inner}</event>\n")
            }
        })
        .collect();
    let src = format!("{head}{}{FOOTER}", records.concat());
    (src, head, records)
}

#[track_caller]
fn run_split(src: &str, n: usize, mut policy: PartitionPolicy) -> (SplitSummary, Vec<String>) {
    let mut pool = ShardPool::from_sinks(vec![Vec::<u8>::new(); n]);
    let driver = StreamDriver::new(Markers::default(), TrailingPolicy::Discard);
    let summary = driver
        .run(Cursor::new(src.as_bytes()), &mut pool, &mut policy, &mut NoProgress)
        .unwrap();
    let shards = pool
        .release()
        .unwrap()
        .into_iter()
        .map(|b| String::from_utf8(b).unwrap())
        .collect();
    (summary, shards)
}

/// Header lines never contain a marker.
fn header_line() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 =\"]{0,24}"
}

/// Body lines never contain `<` so they cannot fake a marker.
fn body_line() -> impl Strategy<Value = String> {
    "[a-z0-9 .+-]{1,16}"
}

fn source_parts() -> impl Strategy<Value = (Vec<String>, Vec<Vec<String>>)> {
    (
        prop::collection::vec(header_line(), 0..5),
        prop::collection::vec(prop::collection::vec(body_line(), 1..4), 0..40),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn records_are_conserved((header, bodies) in source_parts(), n in 1usize..9, seed in any::<u64>()) {
        let (src, head, records) = build_source(&header, &bodies);
        let (summary, shards) = run_split(&src, n, PartitionPolicy::random(Some(seed)));

        prop_assert_eq!(summary.events, records.len() as u64);
        prop_assert_eq!(summary.shard_total(), records.len() as u64);

        // Strip header/footer, then consume each shard's records in order.
        let mut cursors: Vec<&str> = shards
            .iter()
            .map(|s| {
                let body = s.strip_prefix(head.as_str()).expect("header prefix");
                body.strip_suffix(FOOTER).expect("footer suffix")
            })
            .collect();
        for rec in &records {
            let hit = cursors.iter().position(|c| c.starts_with(rec.as_str()));
            let slot = hit.expect("record found at the head of some shard");
            let rest = cursors[slot];
            cursors[slot] = &rest[rec.len()..];
        }
        prop_assert!(cursors.iter().all(|c| c.is_empty()));
    }

    #[test]
    fn header_and_footer_in_every_shard((header, bodies) in source_parts(), n in 1usize..9) {
        let (src, head, _) = build_source(&header, &bodies);
        let (summary, shards) = run_split(&src, n, PartitionPolicy::Sequential);
        prop_assert_eq!(shards.len(), n);
        prop_assert!(summary.terminated);
        for s in &shards {
            prop_assert!(s.starts_with(head.as_str()));
            prop_assert!(s.ends_with(FOOTER));
        }
    }

    #[test]
    fn round_robin_is_exact((header, bodies) in source_parts(), n in 1usize..9) {
        let (src, head, records) = build_source(&header, &bodies);
        let (summary, shards) = run_split(&src, n, PartitionPolicy::Sequential);

        for (i, shard) in shards.iter().enumerate() {
            let expected: String = records
                .iter()
                .enumerate()
                .filter(|(k, _)| k % n == i)
                .map(|(_, r)| r.as_str())
                .collect();
            prop_assert_eq!(shard, &format!("{head}{expected}{FOOTER}"));
        }
        let (min, max) = summary.spread().unwrap();
        prop_assert!(max - min <= 1);
    }

    #[test]
    fn runs_are_repeatable((header, bodies) in source_parts(), n in 1usize..9, seed in any::<u64>()) {
        let (src, _, _) = build_source(&header, &bodies);
        prop_assert_eq!(
            run_split(&src, n, PartitionPolicy::Sequential).1,
            run_split(&src, n, PartitionPolicy::Sequential).1
        );
        prop_assert_eq!(
            run_split(&src, n, PartitionPolicy::random(Some(seed))).1,
            run_split(&src, n, PartitionPolicy::random(Some(seed))).1
        );
    }

    #[test]
    fn one_shard_is_the_source((header, bodies) in source_parts(), seed in any::<u64>()) {
        let (src, _, _) = build_source(&header, &bodies);
        let (_, shards) = run_split(&src, 1, PartitionPolicy::random(Some(seed)));
        prop_assert_eq!(&shards[0], &src);
    }
}

#[test]
fn random_policy_spreads_records() {
    let bodies: Vec<Vec<String>> = (0..4_000).map(|k| vec![k.to_string()]).collect();
    let (src, _, _) = build_source(&[], &bodies);
    let (summary, _) = run_split(&src, 4, PartitionPolicy::random(Some(2024)));
    assert_eq!(summary.shard_total(), 4_000);
    // ~1000 each; a fair generator stays far inside this band.
    for s in &summary.shards {
        assert!((800..1_200).contains(&s.events), "{:?}", summary.shards);
    }
}

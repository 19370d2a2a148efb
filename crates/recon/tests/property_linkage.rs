// Property-based tests for partition, dedup, fusion and coverage invariants.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::{BTreeSet, HashMap, HashSet};

use proptest::prelude::*;
use unionlist_recon::coverage::{annotate_coverage, build_coverage_signal};
use unionlist_recon::dedup::deduplicate;
use unionlist_recon::fuse::fuse;
use unionlist_recon::normalize::{has_valid_identifier, normalize_identifier};
use unionlist_recon::partition::partition;
use unionlist_recon::{prepare_source, Record, Source};

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Identifier drawn from a small pool so duplicates are common; sometimes
/// invalid or decorated the way raw exports are.
fn arb_raw_identifier() -> impl Strategy<Value = String> {
    prop_oneof![
        6 => (0u8..12).prop_map(|n| format!("10.1000/item{n}")),
        1 => (0u8..12).prop_map(|n| format!(" 10.1000/ITEM{n} |")),
        1 => (0u8..12).prop_map(|n| format!("10.\u{200b}1000/item{n}")),
        1 => Just(String::new()),
        1 => Just("unavailable".to_string()),
    ]
}

fn arb_records(source: Source, max: usize) -> impl Strategy<Value = Vec<Record>> {
    proptest::collection::vec((arb_raw_identifier(), 1900i32..2025, 0u32..50), 0..=max).prop_map(
        move |rows| {
            rows.into_iter()
                .enumerate()
                .map(|(row, (raw, year, pmid))| Record {
                    row,
                    source,
                    identifier: normalize_identifier(&raw),
                    pmid: if pmid == 0 { String::new() } else { pmid.to_string() },
                    notice_pmid: String::new(),
                    year: Some(year),
                    author: format!("author {row}"),
                    title: format!("{} {row}", source.slug()),
                    journal: "journal".into(),
                })
                .collect()
        },
    )
}

fn unique_ids(records: &[Record]) -> BTreeSet<String> {
    records.iter().map(|r| r.identifier.clone()).collect()
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn normalization_is_idempotent(raw in ".{0,40}") {
        let once = normalize_identifier(&raw);
        prop_assert_eq!(normalize_identifier(&once), once);
    }

    #[test]
    fn partition_preserves_every_row(records in arb_records(Source::PubMed, 40)) {
        let total = records.len();
        let parts = partition(Source::PubMed, records, has_valid_identifier).unwrap();
        prop_assert_eq!(parts.with_id.len() + parts.without_id.len(), total);
        prop_assert!(parts.with_id.iter().all(|r| has_valid_identifier(&r.identifier)));
        prop_assert!(parts.without_id.iter().all(|r| !has_valid_identifier(&r.identifier)));
    }

    #[test]
    fn dedup_group_sizes(records in arb_records(Source::RetractionWatch, 40)) {
        let mut sizes: HashMap<String, usize> = HashMap::new();
        for r in &records {
            *sizes.entry(r.identifier.clone()).or_default() += 1;
        }
        let out = deduplicate(records, Source::RetractionWatch.dedup_policy());

        let groups = sizes.values().filter(|&&n| n > 1).count();
        let dropped: usize = sizes.values().filter(|&&n| n > 1).map(|n| n - 1).sum();
        prop_assert_eq!(out.survivors.len(), sizes.len());
        prop_assert_eq!(out.group_count, groups);
        prop_assert_eq!(out.dropped_one_copy.len(), dropped);
        prop_assert_eq!(out.dropped_all.len(), dropped + groups);
        prop_assert_eq!(unique_ids(&out.survivors).len(), out.survivors.len());
    }

    #[test]
    fn dedup_survivor_follows_policy(records in arb_records(Source::PubMed, 40)) {
        let mut last_row: HashMap<String, usize> = HashMap::new();
        for r in &records {
            last_row.insert(r.identifier.clone(), r.row);
        }
        let out = deduplicate(records, Source::PubMed.dedup_policy());
        for s in &out.survivors {
            prop_assert_eq!(Some(&s.row), last_row.get(&s.identifier));
        }
    }

    #[test]
    fn fusion_covers_union_of_identifiers(
        pm in arb_records(Source::PubMed, 30),
        rw in arb_records(Source::RetractionWatch, 30),
    ) {
        let pm = prepare_source(Source::PubMed, pm).unwrap().dedup.survivors;
        let rw = prepare_source(Source::RetractionWatch, rw).unwrap().dedup.survivors;

        let expected: BTreeSet<String> = unique_ids(&pm).union(&unique_ids(&rw)).cloned().collect();
        let pm_titles: HashMap<String, String> =
            pm.iter().map(|r| (r.identifier.clone(), r.title.clone())).collect();

        let fused = fuse(pm, rw).unwrap();
        let ids: Vec<String> = fused.iter().map(|r| r.identifier.clone()).collect();
        prop_assert_eq!(ids.len(), expected.len());
        prop_assert_eq!(ids.into_iter().collect::<BTreeSet<_>>(), expected);

        for row in &fused {
            prop_assert!(!row.indexed_in.is_empty());
            if let Some(title) = pm_titles.get(&row.identifier) {
                prop_assert_eq!(&row.title, title);
                prop_assert!(row.indexed_in.contains(Source::PubMed));
            }
        }
    }

    #[test]
    fn coverage_never_loses_indexing(
        pm in arb_records(Source::PubMed, 30),
        rw in arb_records(Source::RetractionWatch, 30),
        covered in proptest::collection::hash_set((1u32..50).prop_map(|n| n.to_string()), 0..20),
    ) {
        let pm = prepare_source(Source::PubMed, pm).unwrap().dedup.survivors;
        let rw = prepare_source(Source::RetractionWatch, rw).unwrap().dedup.survivors;
        let fused = fuse(pm, rw).unwrap();

        let covered: HashSet<String> = covered;
        let signal = build_coverage_signal(&fused, &covered, Source::PubMed);
        let rows = fused.len();
        let out = annotate_coverage(fused, signal, Source::PubMed).unwrap();

        prop_assert!(out.orphans.is_empty());
        prop_assert_eq!(out.annotated.len(), rows);
        for r in &out.annotated {
            prop_assert!(r.covered_in.is_superset(&r.record.indexed_in));
        }
    }
}

//! Property tests for feed ordering, dedup and paging.

use changefeed::{
    ChangeResolver, ChangesRequest, Entity, FilterParameters, MemoryEntityStore,
    MemorySequenceLog, MemoryTaxonomy, DEFAULT_WORKSPACE,
};
use proptest::prelude::*;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

/// One save: entity index, bundle, optional reference to another entity index.
type Save = (u8, bool, Option<u8>);

fn arb_saves() -> impl Strategy<Value = Vec<Save>> {
    prop::collection::vec((0u8..6, any::<bool>(), prop::option::of(0u8..6)), 0..24)
}

fn entity(index: u8, article: bool, reference: Option<u8>) -> Entity {
    let bundle = if article { "article" } else { "page" };
    let entity = Entity::new("node", bundle, index.to_string(), format!("uuid-{index}"));
    match reference {
        Some(target) => entity.with_reference("field_related", "node", target.to_string()),
        None => entity,
    }
}

fn populate(saves: &[Save]) -> ChangeResolver {
    let log = Arc::new(MemorySequenceLog::new());
    let store = Arc::new(MemoryEntityStore::new());

    for &(index, article, reference) in saves {
        let saved = store.save(Some(DEFAULT_WORKSPACE), entity(index, article, reference)).unwrap();
        log.record(DEFAULT_WORKSPACE, &saved);
    }

    ChangeResolver::new(log, store, Arc::new(MemoryTaxonomy::new()))
}

fn articles_only() -> FilterParameters {
    FilterParameters::new().with("types", json!(["node.article"]))
}

proptest! {
    #[test]
    fn prop_records_are_ordered_and_unique(
        saves in arb_saves(),
        since in 0u64..30,
        limit in 0usize..5,
        filtered in any::<bool>(),
    ) {
        let resolver = populate(&saves);
        let mut request = ChangesRequest::new().since(since).limit(limit);
        if filtered {
            request = request.filter("entity_type").parameters(articles_only());
        }

        let records = resolver.resolve(&request).unwrap();

        let mut uuids = HashSet::new();
        for record in &records {
            prop_assert!(uuids.insert(record.id.clone()), "duplicate uuid {}", record.id);
        }

        let seqs: Vec<u64> = records.iter().filter_map(|r| r.seq.map(|s| s.0)).collect();
        prop_assert!(seqs.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(seqs.iter().all(|&seq| seq > since));

        // Records without a seq come after every record with one.
        let first_unsequenced = records.iter().position(|r| r.seq.is_none());
        if let Some(position) = first_unsequenced {
            prop_assert!(records[position..].iter().all(|r| r.seq.is_none()));
        }
    }

    #[test]
    fn prop_limit_bounds_unreferenced_feed(
        saves in arb_saves(),
        limit in 1usize..5,
    ) {
        let saves: Vec<Save> = saves.into_iter().map(|(i, a, _)| (i, a, None)).collect();
        let resolver = populate(&saves);

        let feed = resolver.resolve_feed(&ChangesRequest::new().limit(limit)).unwrap();
        let distinct: HashSet<u8> = saves.iter().map(|s| s.0).collect();

        prop_assert_eq!(feed.results.len(), limit.min(distinct.len()));
        prop_assert_eq!(feed.pending == 0, distinct.len() <= limit);
    }

    #[test]
    fn prop_paging_with_last_seq_covers_every_uuid(
        saves in arb_saves(),
        limit in 1usize..4,
    ) {
        let saves: Vec<Save> = saves.into_iter().map(|(i, a, _)| (i, a, None)).collect();
        let resolver = populate(&saves);

        let mut seen = HashSet::new();
        let mut since = 0u64;
        for _ in 0..=saves.len() {
            let feed = resolver
                .resolve_feed(&ChangesRequest::new().since(since).limit(limit))
                .unwrap();
            seen.extend(feed.results.into_iter().map(|r| r.id));
            since = feed.last_seq.0;
            if feed.pending == 0 {
                break;
            }
        }

        let expected: HashSet<String> = saves.iter().map(|s| format!("uuid-{}", s.0)).collect();
        prop_assert_eq!(seen, expected);
    }

    #[test]
    fn prop_filter_only_admits_articles_or_references(saves in arb_saves()) {
        let resolver = populate(&saves);
        let records = resolver
            .resolve(&ChangesRequest::new().filter("entity_type").parameters(articles_only()))
            .unwrap();

        let referenced: HashSet<String> = saves
            .iter()
            .filter_map(|s| s.2)
            .map(|target| format!("uuid-{target}"))
            .collect();

        let saved_as_article: HashSet<String> = saves
            .iter()
            .filter(|s| s.1)
            .map(|s| format!("uuid-{}", s.0))
            .collect();

        for record in &records {
            let is_article = saved_as_article.contains(&record.id);
            prop_assert!(
                is_article || referenced.contains(&record.id),
                "{} passed without matching or being referenced",
                record.id
            );
        }
    }
}

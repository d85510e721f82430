use author_books::cache::CacheSnapshot;
use author_books::document::catalog;
use author_books::{CacheKey, InMemoryCache, NormalizedCache, PatchOutcome, RelationCachePatcher, RelationEdge};
use proptest::prelude::*;
use serde_json::{json, Value};

const LISTING_FIELD: &str = r#"authors({"filter":{}})"#;

fn book(id: &str, title: &str, author: &str) -> Value {
    json!({
        "__typename": "Book",
        "id": id,
        "title": title,
        "author": { "__typename": "Author", "id": author },
    })
}

fn author(id: &str, first: &str, last: &str, books: Vec<Value>) -> Value {
    json!({
        "__typename": "Author",
        "id": id,
        "firstName": first,
        "lastName": last,
        "books": books,
    })
}

fn cache_with(authors: Vec<Value>) -> InMemoryCache {
    let cache = InMemoryCache::new();
    cache.write_query(&catalog::authors(), &json!({ "filter": {} }), &json!({ "authors": authors }));
    cache
}

fn two_authors() -> InMemoryCache {
    cache_with(vec![
        author(
            "a:1",
            "Ursula",
            "LeGuin",
            vec![book("b:1", "The Dispossessed", "a:1"), book("b:2", "The Lathe of Heaven", "a:1")],
        ),
        author("a:2", "Octavia", "Butler", vec![book("b:3", "Kindred", "a:2")]),
    ])
}

fn detach(cache: &InMemoryCache, child: &str) -> PatchOutcome {
    RelationCachePatcher::new(cache).detach_child(&RelationEdge::authors_books(), child)
}

fn books_of(cache: &InMemoryCache, author: &str) -> Value {
    Value::Array(
        cache
            .read_entity(&CacheKey::new("Author", author))
            .and_then(|record| record.get("books").cloned())
            .and_then(|books| books.as_array().cloned())
            .unwrap_or_default(),
    )
}

#[test]
fn uncached_listing_is_a_silent_no_op() {
    let cache = InMemoryCache::new();
    cache.write_query(
        &catalog::books(),
        &Value::Null,
        &json!({ "books": [book("b:1", "The Dispossessed", "a:1")] }),
    );
    let before = cache.extract();

    assert_eq!(detach(&cache, "b:1"), PatchOutcome::QueryNotCached);
    assert_eq!(cache.extract(), before);
}

#[test]
fn removes_exactly_one_edge() {
    let cache = two_authors();
    let book_before = cache.read_entity(&CacheKey::new("Book", "b:2"));

    let outcome = detach(&cache, "b:1");

    assert_eq!(
        outcome,
        PatchOutcome::Detached {
            parent: CacheKey::new("Author", "a:1"),
            removed: 1,
        }
    );
    assert_eq!(books_of(&cache, "a:1"), json!([{ "__ref": "Book:b:2" }]));
    assert_eq!(cache.read_entity(&CacheKey::new("Book", "b:2")), book_before);
}

#[test]
fn unknown_child_leaves_collections_alone() {
    let cache = cache_with(vec![author("a:1", "Ursula", "LeGuin", vec![book("b:2", "The Lathe of Heaven", "a:1")])]);
    let before = cache.extract();

    assert_eq!(detach(&cache, "b:1"), PatchOutcome::OwnerNotFound);
    assert_eq!(cache.extract(), before);
}

#[test]
fn second_application_changes_nothing() {
    let cache = two_authors();
    assert!(detach(&cache, "b:1").is_detached());
    let once = cache.extract();

    assert_eq!(detach(&cache, "b:1"), PatchOutcome::OwnerNotFound);
    assert_eq!(cache.extract(), once);
}

#[test]
fn full_objects_and_references_compare_by_key() {
    let cache = two_authors();
    let mut snapshot: CacheSnapshot = cache.extract();
    let inline = book("b:1", "The Dispossessed", "a:1");
    let mut inline = inline.as_object().cloned().unwrap_or_default();
    inline.insert("author".to_string(), json!({ "__ref": "Author:a:1" }));
    snapshot.insert(
        "Author:a:1".to_string(),
        author(
            "a:1",
            "Ursula",
            "LeGuin",
            vec![
                Value::Object(inline),
                json!({ "__ref": "Book:b:1" }),
                json!({ "__ref": "Book:b:2" }),
            ],
        ),
    );
    cache.restore(snapshot);

    let outcome = detach(&cache, "b:1");

    assert_eq!(
        outcome,
        PatchOutcome::Detached {
            parent: CacheKey::new("Author", "a:1"),
            removed: 2,
        }
    );
    assert_eq!(books_of(&cache, "a:1"), json!([{ "__ref": "Book:b:2" }]));
}

#[test]
fn other_parents_and_records_are_untouched() {
    let cache = two_authors();
    let before = cache.extract();

    detach(&cache, "b:1");
    let after = cache.extract();

    for (key, record) in &before {
        if key != "Author:a:1" {
            assert_eq!(after.get(key), Some(record), "{key} changed");
        }
    }
    assert_eq!(books_of(&cache, "a:2"), json!([{ "__ref": "Book:b:3" }]));
    assert!(cache.contains(&CacheKey::new("Book", "b:1")));
}

#[test]
fn patched_listing_is_visible_to_the_next_read() {
    let cache = two_authors();
    detach(&cache, "b:2");

    let data = cache
        .read_query(&catalog::authors(), &json!({ "filter": {} }))
        .unwrap();
    let titles: Vec<&str> = data["authors"][0]["books"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|b| b["title"].as_str())
        .collect();
    assert_eq!(titles, ["The Dispossessed"]);
    assert!(cache.extract()["ROOT_QUERY"].get(LISTING_FIELD).is_some());
}

fn arb_listing() -> impl Strategy<Value = Vec<Vec<u8>>> {
    // Up to four authors each owning a disjoint run of book ids.
    prop::collection::vec(1u8..4, 1..5).prop_map(|sizes| {
        let mut next = 0u8;
        sizes
            .into_iter()
            .map(|n| {
                (0..n)
                    .map(|_| {
                        next += 1;
                        next
                    })
                    .collect()
            })
            .collect()
    })
}

fn build(listing: &[Vec<u8>]) -> InMemoryCache {
    let authors = listing
        .iter()
        .enumerate()
        .map(|(i, books)| {
            let id = format!("a:{}", i + 1);
            let books = books
                .iter()
                .map(|b| book(&format!("b:{b}"), &format!("Book {b}"), &id))
                .collect();
            author(&id, "First", &format!("Last{i}"), books)
        })
        .collect();
    cache_with(authors)
}

proptest! {
    #[test]
    fn detaching_is_idempotent(listing in arb_listing(), pick in 0u8..16) {
        let cache = build(&listing);
        let child = format!("b:{pick}");

        detach(&cache, &child);
        let once = cache.extract();
        let again = detach(&cache, &child);

        prop_assert!(!again.is_detached());
        prop_assert_eq!(cache.extract(), once);
    }

    #[test]
    fn only_the_owner_changes(listing in arb_listing(), pick in 1u8..16) {
        let cache = build(&listing);
        let before = cache.extract();
        let owner = listing.iter().position(|books| books.contains(&pick));

        let outcome = detach(&cache, &format!("b:{pick}"));
        let after = cache.extract();

        match owner {
            Some(i) => {
                let owner_key = format!("Author:a:{}", i + 1);
                prop_assert_eq!(
                    outcome,
                    PatchOutcome::Detached { parent: CacheKey::new("Author", &format!("a:{}", i + 1)), removed: 1 }
                );
                for (key, record) in &before {
                    if *key != owner_key {
                        prop_assert_eq!(after.get(key), Some(record));
                    }
                }
                let remaining = books_of(&cache, &format!("a:{}", i + 1));
                prop_assert_eq!(remaining.as_array().map(Vec::len), Some(listing[i].len() - 1));
            }
            None => {
                prop_assert_eq!(outcome, PatchOutcome::OwnerNotFound);
                prop_assert_eq!(after, before);
            }
        }
    }
}

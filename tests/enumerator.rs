// Enumerator suite.
//
// Core invariants exercised:
// - Head/tail anchors: `to_head` lands on the first live slot, `to_tail`
//   on the last; both are `None` on an empty table.
// - Symmetry: a backward walk from the tail mirrors the forward walk.
// - Tombstones and reserved slots: tombstones are skipped, reserved keys
//   are visited (their values read as zeroes through the value cursor).
// - Entries: the entry under a cursor resolves to the same key.
use chained_hashmap::{
    Backend, Cursor, EnumeratorAction, EnumeratorKind, FullySeparated, HashSeparated, HashTable,
    Interleaved,
};

fn k(n: u32) -> [u8; 4] {
    n.to_le_bytes()
}

fn decode(bytes: &[u8]) -> u32 {
    u32::from_le_bytes(bytes.try_into().unwrap())
}

fn walk_forward<B: Backend>(t: &HashTable<B>) -> Vec<u32> {
    let mut e = t.key_enumerator();
    let mut out = Vec::new();
    let mut cur = e.to_head();
    while let Some(key) = cur {
        out.push(decode(key));
        cur = e.move_next();
    }
    out
}

fn walk_backward<B: Backend>(t: &HashTable<B>) -> Vec<u32> {
    let mut e = t.key_enumerator();
    let mut out = Vec::new();
    let mut cur = e.to_tail();
    while let Some(key) = cur {
        out.push(decode(key));
        cur = e.move_previous();
    }
    out
}

fn churned<B: Backend>() -> HashTable<B> {
    let mut t: HashTable<B> = HashTable::builder(4, 4).bucket_count(5).build().unwrap();
    for n in 0..30 {
        t.set_value(&k(n), &k(n + 1000)).unwrap();
    }
    for n in (0..30).filter(|n| n % 4 == 1) {
        t.remove_value(&k(n));
    }
    t
}

fn symmetric_walks<B: Backend>() {
    let t = churned::<B>();
    let forward = walk_forward(&t);
    let mut backward = walk_backward(&t);
    backward.reverse();
    assert_eq!(forward.len(), t.count());
    assert_eq!(forward, backward);
    assert!(forward.iter().all(|n| n % 4 != 1));
}

fn keys_match_key_enumerator<B: Backend>() {
    let t = churned::<B>();
    let snapshot: Vec<u32> = t.keys().into_iter().map(decode).collect();
    assert_eq!(snapshot, walk_forward(&t));
    let values: Vec<u32> = t.values().into_iter().map(decode).collect();
    let expected: Vec<u32> = snapshot.iter().map(|n| n + 1000).collect();
    assert_eq!(values, expected);
}

fn entries_under_cursor_resolve<B: Backend>() {
    let t = churned::<B>();
    let mut e = t.key_enumerator();
    let mut cur = e.current();
    while let Some(key) = cur {
        let entry = e.entry().unwrap();
        assert_eq!(t.get_key(entry), Some(key));
        assert_eq!(t.find_key(key), Some(entry));
        cur = e.move_next();
    }
    assert_eq!(e.cursor(), Cursor::Exhausted);
}

#[test]
fn symmetric_walks_all_layouts() {
    symmetric_walks::<Interleaved>();
    symmetric_walks::<HashSeparated>();
    symmetric_walks::<FullySeparated>();
}

#[test]
fn keys_match_key_enumerator_all_layouts() {
    keys_match_key_enumerator::<Interleaved>();
    keys_match_key_enumerator::<HashSeparated>();
    keys_match_key_enumerator::<FullySeparated>();
}

#[test]
fn entries_under_cursor_resolve_all_layouts() {
    entries_under_cursor_resolve::<Interleaved>();
    entries_under_cursor_resolve::<HashSeparated>();
    entries_under_cursor_resolve::<FullySeparated>();
}

#[test]
fn empty_table_has_no_head_or_tail() {
    let t = HashTable::new(4, 4, 7).unwrap();
    let mut e = t.value_enumerator();
    assert_eq!(e.kind(), EnumeratorKind::Value);
    assert_eq!(e.to_head(), None);
    assert_eq!(e.to_tail(), None);
    assert_eq!(e.perform(EnumeratorAction::Current), None);
}

// Test: reserved keys are enumerated; their value bytes are zeroed.
#[test]
fn reserved_keys_are_visited() {
    let mut t = HashTable::new(4, 4, 3).unwrap();
    t.set_value(&k(1), &k(10)).unwrap();
    let (entry, created) = t.entry_for_key(&k(4)).unwrap();
    assert!(created);
    let entry = entry.unwrap();
    assert!(!t.entry_is_initialized(entry));

    assert_eq!(walk_forward(&t), vec![1, 4]);
    let mut values = t.value_enumerator();
    assert_eq!(values.current(), Some(&k(10)[..]));
    assert_eq!(values.move_next(), Some(&[0u8; 4][..]));
    assert_eq!(values.move_next(), None);
}

// Test: perform() drives the same transitions as the named helpers.
#[test]
fn perform_matches_named_moves() {
    let mut t = HashTable::new(4, 4, 2).unwrap();
    for n in [3, 6, 8] {
        t.set_value(&k(n), &k(n)).unwrap();
    }
    let mut a = t.key_enumerator();
    let mut b = t.key_enumerator();
    assert_eq!(a.perform(EnumeratorAction::Tail), b.to_tail());
    assert_eq!(a.perform(EnumeratorAction::Previous), b.move_previous());
    assert_eq!(a.perform(EnumeratorAction::Next), b.move_next());
    assert_eq!(a.perform(EnumeratorAction::Head), b.to_head());
    assert_eq!(a.cursor(), b.cursor());
}

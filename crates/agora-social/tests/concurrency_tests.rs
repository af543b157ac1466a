//! Race tests over the membership and content stores
//!
//! The uniqueness and counter invariants must hold under arbitrary
//! concurrent invocation from independent principals. These tests hammer
//! the stores from real threads and then check the counters against the
//! edge sets.

use std::sync::Arc;
use std::thread;

use agora_core::{ErrorKind, PhysicalTime, UserId};
use agora_social::{CommunityType, SocialStore, Visibility};

fn at(ms: u64) -> PhysicalTime {
    PhysicalTime::from_ms(ms)
}

fn user(seed: u8) -> UserId {
    UserId::new_from_entropy([seed; 32])
}

#[test]
fn concurrent_duplicate_follow_yields_one_edge() {
    let store = SocialStore::new();
    let community = store
        .graph()
        .create("C", CommunityType::City, None, at(1))
        .unwrap();
    let store = Arc::new(store);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                store
                    .membership()
                    .follow_community(user(1), community.id, at(10 + i))
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let successes = results.iter().filter(|r| r.is_ok()).count();
    let duplicates = results
        .iter()
        .filter(|r| matches!(r, Err(e) if e.kind() == ErrorKind::AlreadyExists))
        .count();

    assert_eq!(successes, 1);
    assert_eq!(duplicates, 7);
    assert_eq!(store.membership().member_count(community.id).unwrap(), 1);
    assert!(store.reconcile_counters().is_empty());
}

#[test]
fn follow_storm_counts_every_distinct_user_once() {
    let store = SocialStore::new();
    let community = store
        .graph()
        .create("C", CommunityType::City, None, at(1))
        .unwrap();
    let store = Arc::new(store);

    let handles: Vec<_> = (0..32u8)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                store
                    .membership()
                    .follow_community(user(i), community.id, at(10))
                    .unwrap();
                // Half the users leave again.
                if i % 2 == 0 {
                    store
                        .membership()
                        .unfollow_community(user(i), community.id)
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.membership().member_count(community.id).unwrap(), 16);
    assert!(store.reconcile_counters().is_empty());
}

#[test]
fn concurrent_duplicate_likes_count_once() {
    let store = SocialStore::new();
    let community = store
        .graph()
        .create("C", CommunityType::City, None, at(1))
        .unwrap();
    let post = store
        .content()
        .create_post(user(1), community.id, Visibility::Public, "p", at(2))
        .unwrap();
    let store = Arc::new(store);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || store.content().like_post(user(2), post.id, at(3)))
        })
        .collect();

    let successes = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(Result::is_ok)
        .count();
    assert_eq!(successes, 1);
    assert_eq!(store.content().get_post(post.id).unwrap().likes_count, 1);
    assert!(store.reconcile_counters().is_empty());
}

#[test]
fn mixed_mutations_never_desync_counters() {
    let store = SocialStore::new();
    let community = store
        .graph()
        .create("C", CommunityType::City, None, at(1))
        .unwrap();
    let post = store
        .content()
        .create_post(user(100), community.id, Visibility::Public, "p", at(2))
        .unwrap();
    let store = Arc::new(store);

    let handles: Vec<_> = (0..16u8)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let u = user(i);
                for _ in 0..10 {
                    store
                        .membership()
                        .follow_community(u, community.id, at(10))
                        .unwrap();
                    store.content().like_post(u, post.id, at(11)).unwrap();
                    store.content().unlike_post(u, post.id).unwrap();
                    store
                        .membership()
                        .unfollow_community(u, community.id)
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.membership().member_count(community.id).unwrap(), 0);
    assert_eq!(store.content().get_post(post.id).unwrap().likes_count, 0);
    // Nothing to repair: every increment/decrement landed with its edge.
    assert!(store.reconcile_counters().is_empty());
}

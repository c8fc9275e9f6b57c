use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rating_engine::{VotingService, VotingServiceConfig};
use rating_repository::{ContentRepository, InMemoryRepository, RatingAggregator, VotingRepository};
use rating_shared::types::{ItemId, NewWriteup, Principal, VoteDirection, VoteValue};

async fn create_writeup(repository: &InMemoryRepository, title: &str) -> ItemId {
    repository
        .create_writeup(&NewWriteup {
            title: title.to_string(),
            url: format!("https://example.com/{title}"),
            ..NewWriteup::default()
        })
        .await
        .unwrap()
        .id
}

fn service(repository: &InMemoryRepository) -> Arc<VotingService> {
    Arc::new(VotingService::with_config(
        Arc::new(repository.clone()),
        VotingServiceConfig::default(),
    ))
}

#[tokio::test]
async fn test_two_voters_scenario() {
    let repository = InMemoryRepository::new();
    let item = create_writeup(&repository, "rop-chains").await;
    let service = service(&repository);
    let a = Principal::member("A");
    let b = Principal::member("B");

    let first = service.cast_vote(Some(&a), item, VoteDirection::Up).await.unwrap();
    assert_eq!(first.applied_value, VoteValue::Up);
    assert_eq!(first.new_rating, 1);

    let retract = service.cast_vote(Some(&a), item, VoteDirection::Up).await.unwrap();
    assert_eq!(retract.applied_value, VoteValue::Retracted);
    assert_eq!(retract.new_rating, 0);

    let down = service.cast_vote(Some(&a), item, VoteDirection::Down).await.unwrap();
    assert_eq!(down.applied_value, VoteValue::Down);
    assert_eq!(down.new_rating, -1);

    let other = service.cast_vote(Some(&b), item, VoteDirection::Up).await.unwrap();
    assert_eq!(other.applied_value, VoteValue::Up);
    assert_eq!(other.new_rating, 0);

    assert_eq!(service.rating(item).await.unwrap(), 0);
    assert_eq!(repository.sum_of_votes(item).await, 0);
}

#[tokio::test]
async fn test_flip_moves_rating_by_two() {
    let repository = InMemoryRepository::new();
    let item = create_writeup(&repository, "format-strings").await;
    let service = service(&repository);
    let voter = Principal::member("flipper");

    service.cast_vote(Some(&voter), item, VoteDirection::Up).await.unwrap();
    let flipped = service
        .cast_vote(Some(&voter), item, VoteDirection::Down)
        .await
        .unwrap();

    assert_eq!(flipped.applied_value, VoteValue::Down);
    assert_eq!(flipped.new_rating, -1);
}

#[tokio::test]
async fn test_votes_on_one_item_do_not_touch_another() {
    let repository = InMemoryRepository::new();
    let first = create_writeup(&repository, "first").await;
    let second = create_writeup(&repository, "second").await;
    let service = service(&repository);
    let voter = Principal::member("alice");

    service.cast_vote(Some(&voter), first, VoteDirection::Up).await.unwrap();

    assert_eq!(service.rating(first).await.unwrap(), 1);
    assert_eq!(service.rating(second).await.unwrap(), 0);
    assert_eq!(service.current_vote(Some(&voter), second).await.unwrap(), None);
}

#[tokio::test]
async fn test_random_sequences_keep_rating_equal_to_vote_sum() {
    let repository = InMemoryRepository::new();
    let items = [
        create_writeup(&repository, "a").await,
        create_writeup(&repository, "b").await,
        create_writeup(&repository, "c").await,
    ];
    let service = service(&repository);
    let voters: Vec<Principal> = (0..5).map(|i| Principal::member(format!("voter-{i}"))).collect();

    let mut expected: HashMap<(ItemId, String), i64> = HashMap::new();
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for _ in 0..400 {
        let item = items[rng.gen_range(0..items.len())];
        let voter = &voters[rng.gen_range(0..voters.len())];
        let direction = if rng.gen_bool(0.5) {
            VoteDirection::Up
        } else {
            VoteDirection::Down
        };

        let outcome = service.cast_vote(Some(voter), item, direction).await.unwrap();

        let stored = expected.entry((item, voter.id.clone())).or_insert(0);
        let requested = VoteValue::from(direction).as_i64();
        *stored = if *stored == requested { 0 } else { requested };
        assert_eq!(outcome.applied_value.as_i64(), *stored);

        let model_rating: i64 = expected
            .iter()
            .filter(|((id, _), _)| *id == item)
            .map(|(_, value)| value)
            .sum();
        assert_eq!(outcome.new_rating, model_rating);
    }

    for item in items {
        assert_eq!(
            service.rating(item).await.unwrap(),
            repository.sum_of_votes(item).await
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_voters_are_all_counted() {
    let repository = InMemoryRepository::new();
    let item = create_writeup(&repository, "race").await;
    let service = service(&repository);
    let voters = 64;

    let handles: Vec<_> = (0..voters)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move {
                let voter = Principal::member(format!("voter-{i}"));
                service.cast_vote(Some(&voter), item, VoteDirection::Up).await
            })
        })
        .collect();

    let mut observed = Vec::new();
    for result in futures::future::join_all(handles).await {
        observed.push(result.unwrap().unwrap().new_rating);
    }

    // Every vote saw a distinct intermediate rating.
    observed.sort_unstable();
    assert_eq!(observed, (1..=voters).collect::<Vec<i64>>());

    assert_eq!(service.rating(item).await.unwrap(), voters);
    assert_eq!(repository.sum_of_votes(item).await, voters);
    assert_eq!(repository.vote_count(item).await, voters as usize);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_clicks_from_one_voter_are_serialized() {
    let repository = InMemoryRepository::new();
    let item = create_writeup(&repository, "double-click").await;
    let service = service(&repository);
    let clicks = 10;

    let handles: Vec<_> = (0..clicks)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move {
                let voter = Principal::member("impatient");
                service.cast_vote(Some(&voter), item, VoteDirection::Up).await
            })
        })
        .collect();

    for result in futures::future::join_all(handles).await {
        result.unwrap().unwrap();
    }

    // An even number of identical clicks always ends retracted.
    let voter = Principal::member("impatient");
    assert_eq!(
        service.current_vote(Some(&voter), item).await.unwrap(),
        Some(VoteValue::Retracted)
    );
    assert_eq!(service.rating(item).await.unwrap(), 0);
    assert_eq!(repository.sum_of_votes(item).await, 0);
}

#[tokio::test]
async fn test_cancelled_vote_leaves_no_trace() {
    let repository = InMemoryRepository::new();
    let item = create_writeup(&repository, "cancel").await;
    let service = service(&repository);
    let voter = Principal::member("alice");

    // Holds the item's rating lock so the vote stalls inside its unit of work.
    let mut blocker = repository.begin().await.unwrap();
    blocker.apply_delta(item, 0).await.unwrap();

    {
        let vote = service.cast_vote(Some(&voter), item, VoteDirection::Up);
        tokio::pin!(vote);
        assert!(futures::poll!(vote.as_mut()).is_pending());
    }
    drop(blocker);

    assert_eq!(service.rating(item).await.unwrap(), 0);
    assert_eq!(repository.sum_of_votes(item).await, 0);
    assert_eq!(service.current_vote(Some(&voter), item).await.unwrap(), None);

    let outcome = service.cast_vote(Some(&voter), item, VoteDirection::Up).await.unwrap();
    assert_eq!(outcome.applied_value, VoteValue::Up);
    assert_eq!(outcome.new_rating, 1);
}

mod common;

use common::*;
use turf_engine::core::distance::haversine_distance;
use turf_engine::domain::model::LatLng;
use turf_engine::domain::ports::MembershipStore;
use turf_engine::{EngineSettings, TurfEngine, TurfError};

/// Three doors on the equator; the walk starts at the lowest sort order.
fn street() -> Vec<turf_engine::domain::model::Voter> {
    vec![
        sorted(voter("far", Some("h-far"), 0.0, 0.003), 2),
        sorted(voter("start", Some("h-start"), 0.0, 0.0), 1),
        sorted(voter("near", Some("h-near"), 0.0, 0.001), 3),
        sorted(voter("near-2", Some("h-near"), 0.0, 0.001), 4),
    ]
}

fn around_street() -> serde_json::Value {
    box_polygon(-0.001, -0.001, 0.001, 0.004)
}

#[tokio::test]
async fn test_route_walks_nearest_door_first() -> anyhow::Result<()> {
    let engine = engine_with(street());
    let turf = engine.create_manual(LIST, &around_street(), "Main St").await?;

    let route = engine.get_route(turf.id).await?;

    let order: Vec<&str> = route.stops.iter().map(|s| s.household_id.as_str()).collect();
    assert_eq!(order, vec!["h-start", "h-near", "h-far"]);
    assert_eq!(
        route.stops.iter().map(|s| s.stop).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert_eq!(route.stops[1].voter_ids, vec!["near", "near-2"]);
    assert_eq!(route.stops[0].leg_distance_m, 0.0);

    let expected = haversine_distance(LatLng::new(0.0, 0.0), LatLng::new(0.0, 0.003));
    assert_eq!(route.total_distance_m, expected.round() as u64);
    // 3 doors at 3 minutes plus ~334 m at 80 m/min
    assert_eq!(route.estimated_minutes, (9.0 + expected / 80.0).round() as u32);
    Ok(())
}

#[tokio::test]
async fn test_second_request_is_served_from_cache() -> anyhow::Result<()> {
    let engine = engine_with(street());
    let turf = engine.create_manual(LIST, &around_street(), "Main St").await?;

    let first = engine.get_route(turf.id).await?;
    let cached = engine.get_turf(turf.id).await?.route.expect("route cached");
    let second = engine.get_route(turf.id).await?;
    let still_cached = engine.get_turf(turf.id).await?.route.expect("route cached");

    assert_eq!(first, second);
    assert_eq!(cached.computed_at, still_cached.computed_at);
    assert_eq!(cached.membership_version, turf.membership_version);
    Ok(())
}

#[tokio::test]
async fn test_membership_change_invalidates_cached_route() -> anyhow::Result<()> {
    let engine = engine_with(street());
    let turf = engine.create_manual(LIST, &around_street(), "Main St").await?;
    assert_eq!(engine.get_route(turf.id).await?.stops.len(), 3);

    engine.reassign_voter(LIST, "far", None).await?;

    let updated = engine.get_turf(turf.id).await?;
    assert_eq!(updated.voter_count, 3);
    assert_eq!(updated.door_count, 2);
    assert!(updated.fresh_route().is_none());

    let route = engine.get_route(turf.id).await?;
    assert_eq!(route.stops.len(), 2);
    assert!(engine.get_turf(turf.id).await?.fresh_route().is_some());
    Ok(())
}

#[tokio::test]
async fn test_reassign_between_turfs() -> anyhow::Result<()> {
    let engine = engine_with(street());
    let west = engine
        .create_manual(LIST, &box_polygon(-0.001, -0.001, 0.001, 0.002), "West")
        .await?;
    let east = engine
        .create_manual(LIST, &box_polygon(-0.001, 0.002, 0.001, 0.004), "East")
        .await?;

    engine.reassign_voter(LIST, "near-2", Some(east.id)).await?;

    assert_eq!(engine.store().turf_of(LIST, "near-2").await?, Some(east.id));
    assert_eq!(engine.get_turf(east.id).await?.door_count, 2);
    assert_eq!(engine.get_turf(west.id).await?.voter_count, 2);

    let err = engine.reassign_voter(LIST, "stranger", Some(east.id)).await.unwrap_err();
    assert!(matches!(err, TurfError::ValidationError { .. }));
    let err = engine.reassign_voter("other-list", "far", Some(east.id)).await.unwrap_err();
    assert!(matches!(err, TurfError::ValidationError { .. }));
    Ok(())
}

#[tokio::test]
async fn test_large_turf_is_routed_off_the_async_workers() -> anyhow::Result<()> {
    let settings = EngineSettings {
        blocking_route_threshold: 0,
        ..seeded_settings(1)
    };
    let engine = TurfEngine::new(store_with(street()), settings);
    let turf = engine.create_manual(LIST, &around_street(), "Main St").await?;

    let route = engine.get_route(turf.id).await?;

    assert_eq!(route.stops.len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_route_over_the_door_limit_is_refused() -> anyhow::Result<()> {
    let settings = EngineSettings {
        max_route_doors: 2,
        ..seeded_settings(1)
    };
    let engine = TurfEngine::new(store_with(street()), settings);
    let turf = engine.create_manual(LIST, &around_street(), "Main St").await?;

    let err = engine.get_route(turf.id).await.unwrap_err();

    assert!(matches!(
        err,
        TurfError::RouteTooLarge { doors: 3, limit: 2, .. }
    ));
    Ok(())
}

#[tokio::test]
async fn test_route_of_unknown_turf() {
    let engine = engine_with(street());

    let err = engine.get_route(404).await.unwrap_err();

    assert!(matches!(err, TurfError::TurfNotFound { turf_id: 404 }));
}

#[tokio::test]
async fn test_delete_releases_every_member() -> anyhow::Result<()> {
    let engine = engine_with(square_voters());
    let turf = engine
        .create_manual(LIST, &box_polygon(35.595, -82.565, 35.615, -82.545), "All")
        .await?;
    assert_eq!(turf.voter_count, 5);

    engine.delete_turf(turf.id).await?;

    for id in ["v1", "v2", "v3", "v4", "v5"] {
        assert_eq!(engine.store().turf_of(LIST, id).await?, None);
    }
    assert!(engine.list_turfs(LIST).await?.is_empty());
    assert!(matches!(
        engine.delete_turf(turf.id).await,
        Err(TurfError::TurfNotFound { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn test_rename_keeps_membership() -> anyhow::Result<()> {
    let engine = engine_with(square_voters());
    let turf = engine
        .create_manual(LIST, &box_polygon(35.595, -82.565, 35.615, -82.545), "All")
        .await?;

    let renamed = engine.rename_turf(turf.id, " Downtown ").await?;

    assert_eq!(renamed.name, "Downtown");
    assert_eq!(renamed.membership_version, turf.membership_version);
    assert!(engine.rename_turf(turf.id, "").await.is_err());
    assert!(matches!(
        engine.rename_turf(999, "x").await,
        Err(TurfError::TurfNotFound { turf_id: 999 })
    ));
    Ok(())
}

#[tokio::test]
async fn test_reassign_racing_delete_leaves_no_dangling_member() -> anyhow::Result<()> {
    let mut voters = square_voters();
    voters.push(voter("outside", Some("h9"), 35.70, -82.70));
    let mut store = FlakyStore::new(voters);
    store.slow_first_lookup = 20;
    let engine = TurfEngine::new(store, seeded_settings(1));
    let turf = engine
        .create_manual(LIST, &box_polygon(35.595, -82.565, 35.615, -82.545), "All")
        .await?;

    let (reassigned, deleted) = tokio::join!(
        engine.reassign_voter(LIST, "outside", Some(turf.id)),
        engine.delete_turf(turf.id)
    );

    reassigned?;
    deleted?;
    assert!(matches!(
        engine.get_turf(turf.id).await,
        Err(TurfError::TurfNotFound { .. })
    ));
    for id in ["v1", "v2", "v3", "v4", "v5", "outside"] {
        assert_eq!(engine.store().turf_of(LIST, id).await?, None, "{} still points at turf", id);
    }
    Ok(())
}

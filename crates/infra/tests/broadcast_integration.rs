//! Broadcast scoping tests across the full engine stack.

mod support;

use anyhow::Result;
use tempo_domain::{
    ActivityEventKind, ActivityKind, ActivityStart, ActivityStatus, NewActivity, Priority,
    SubscriptionScope, TransitionDetails,
};
use uuid::Uuid;

use support::{seed_collaborator, test_context};

fn spec(owner_id: Uuid, title: &str) -> NewActivity {
    NewActivity {
        title: title.to_string(),
        kind: ActivityKind::Simple,
        priority: Priority::Low,
        owner_id,
        subtasks: Vec::new(),
        start: ActivityStart::Queued,
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn sector_subscribers_see_only_their_sector_admins_see_all() -> Result<()> {
    let (context, _temp_dir) = test_context();
    let sector_a = Uuid::new_v4();
    let sector_b = Uuid::new_v4();
    let worker_a = seed_collaborator(&context, sector_a).await;
    let worker_b = seed_collaborator(&context, sector_b).await;

    let mut sub_a = context.subscribe(SubscriptionScope::Sector { sector_id: sector_a });
    let mut sub_b = context.subscribe(SubscriptionScope::Sector { sector_id: sector_b });
    let mut admin = context.subscribe(SubscriptionScope::Admin);

    let activity_a = context.activities.create_activity(spec(worker_a.id, "sector a work")).await?;
    context
        .activities
        .transition(activity_a.id, worker_a.id, ActivityStatus::InProgress, TransitionDetails::default())
        .await?;
    context.activities.create_activity(spec(worker_b.id, "sector b work")).await?;

    // sector A: created + status change
    let mut seen_a = Vec::new();
    while let Ok(event) = sub_a.receiver.try_recv() {
        seen_a.push(event);
    }
    assert_eq!(seen_a.len(), 2);
    assert!(seen_a.iter().all(|event| event.sector_id == sector_a));
    assert_eq!(seen_a[0].kind, ActivityEventKind::Created);
    assert_eq!(seen_a[1].kind, ActivityEventKind::StatusChanged);

    // sector B: only its own creation
    let mut seen_b = Vec::new();
    while let Ok(event) = sub_b.receiver.try_recv() {
        seen_b.push(event);
    }
    assert_eq!(seen_b.len(), 1);
    assert_eq!(seen_b[0].sector_id, sector_b);

    // admin: everything
    let mut seen_admin = Vec::new();
    while let Ok(event) = admin.receiver.try_recv() {
        seen_admin.push(event);
    }
    assert_eq!(seen_admin.len(), 3);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn unsubscribing_stops_delivery_without_affecting_mutations() -> Result<()> {
    let (context, _temp_dir) = test_context();
    let sector = Uuid::new_v4();
    let worker = seed_collaborator(&context, sector).await;

    let mut sub = context.subscribe(SubscriptionScope::Sector { sector_id: sector });
    context.activities.create_activity(spec(worker.id, "first")).await?;
    assert!(sub.receiver.try_recv().is_ok());

    assert!(context.unsubscribe(sub.id));
    context.activities.create_activity(spec(worker.id, "second")).await?;
    assert!(sub.receiver.try_recv().is_err());

    assert_eq!(context.activities.list_by_collaborator(worker.id).await?.len(), 2);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn dropped_subscriber_never_blocks_or_fails_mutations() -> Result<()> {
    let (context, _temp_dir) = test_context();
    let sector = Uuid::new_v4();
    let worker = seed_collaborator(&context, sector).await;

    let sub = context.subscribe(SubscriptionScope::Sector { sector_id: sector });
    drop(sub.receiver);

    // mutations proceed; the stale subscriber is pruned on first publish
    context.activities.create_activity(spec(worker.id, "unobserved")).await?;
    assert_eq!(context.broadcaster.subscriber_count(), 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn subtask_and_adjustment_events_reach_sector_subscribers() -> Result<()> {
    let (context, _temp_dir) = test_context();
    let sector = Uuid::new_v4();
    let worker = seed_collaborator(&context, sector).await;

    let checklist = NewActivity {
        title: "with steps".to_string(),
        kind: ActivityKind::Checklist,
        priority: Priority::Medium,
        owner_id: worker.id,
        subtasks: vec!["only step".to_string()],
        start: ActivityStart::Queued,
    };
    let activity = context.activities.create_activity(checklist).await?;
    context
        .activities
        .transition(activity.id, worker.id, ActivityStatus::InProgress, TransitionDetails::default())
        .await?;
    context
        .activities
        .transition(activity.id, worker.id, ActivityStatus::Paused, TransitionDetails::default())
        .await?;

    let mut sub = context.subscribe(SubscriptionScope::Sector { sector_id: sector });

    let subtasks = context.activities.get_subtasks(activity.id).await?;
    context.activities.toggle_subtask(subtasks[0].id, true).await?;
    context
        .adjustments
        .adjust_time(
            activity.id,
            worker.id,
            120,
            tempo_domain::AdjustmentDirection::Add,
            "work done before clock-in",
        )
        .await?;

    let first = sub.receiver.try_recv().expect("subtask event");
    assert_eq!(first.kind, ActivityEventKind::SubtaskToggled);
    let second = sub.receiver.try_recv().expect("adjustment event");
    assert_eq!(second.kind, ActivityEventKind::TimeAdjusted);
    assert_eq!(second.activity.total_seconds, first.activity.total_seconds + 120);
    Ok(())
}

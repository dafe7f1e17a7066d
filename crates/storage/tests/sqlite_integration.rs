use roadmap_core::model::{
    CompletedItem, Resource, ResourceId, ResourceKind, Roadmap, RoadmapId, RoadmapRequest,
    RoadmapStep, StepId, Timeframe,
};
use roadmap_core::time::fixed_now;
use storage::repository::{ProgressRepository, RoadmapRepository, StorageError};
use storage::sqlite::SqliteRepository;

fn build_item(id: &str, title: &str) -> CompletedItem {
    CompletedItem::new(StepId::new(id), title, fixed_now())
}

fn build_step(id: &str, with_resources: bool) -> RoadmapStep {
    let resources = if with_resources {
        vec![
            Resource::new(
                ResourceId::new(format!("{id}-res1")),
                "Introduction",
                ResourceKind::Video,
                "https://example.com/intro",
                "YouTube",
            )
            .unwrap(),
            Resource::new(
                ResourceId::new(format!("{id}-res2")),
                "Crash Course",
                ResourceKind::Tutorial,
                "https://example.com/tutorial",
                "freeCodeCamp",
            )
            .unwrap(),
        ]
    } else {
        vec![]
    };
    RoadmapStep::new(
        StepId::new(id),
        format!("Step {id}"),
        "What to learn here",
        "2 weeks",
        resources,
    )
}

fn build_roadmap(technology: &str, step_ids: &[&str]) -> Roadmap {
    let request = RoadmapRequest::new(technology, Timeframe::ThreeMonths).unwrap();
    let steps = step_ids
        .iter()
        .enumerate()
        .map(|(i, id)| build_step(id, i == 0))
        .collect();
    Roadmap::new(RoadmapId::generate(), &request, fixed_now(), steps).unwrap()
}

#[tokio::test]
async fn sqlite_replace_preserves_insertion_order() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_progress?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let items = vec![
        build_item("s2", "Intermediate"),
        build_item("s1", "Fundamentals"),
        build_item("s3", "In Practice"),
    ];
    repo.replace_items(&items).await.unwrap();

    let loaded = repo.load_items().await.unwrap();
    assert_eq!(loaded, items);

    // Overwrite wholesale with a shorter list; the old record is gone.
    let shorter = vec![build_item("s1", "Fundamentals")];
    repo.replace_items(&shorter).await.unwrap();
    assert_eq!(repo.load_items().await.unwrap(), shorter);
}

#[tokio::test]
async fn sqlite_roadmap_round_trip_keeps_steps_and_resources() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_roadmaps?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let roadmap = build_roadmap("Rust", &["s1", "s2", "s3"]);
    repo.insert_roadmap(&roadmap).await.unwrap();

    let fetched = repo
        .get_roadmap(roadmap.id())
        .await
        .expect("fetch")
        .expect("saved roadmap should exist");

    assert_eq!(fetched, roadmap);
    assert_eq!(fetched.steps()[0].resources.len(), 2);
    assert_eq!(fetched.steps()[0].resources[0].kind, ResourceKind::Video);
}

#[tokio::test]
async fn sqlite_list_and_delete_cascade() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_library?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let first = build_roadmap("Rust", &["s1"]);
    let second = build_roadmap("Python", &["p1", "p2"]);
    repo.insert_roadmap(&first).await.unwrap();
    repo.insert_roadmap(&second).await.unwrap();

    let listed = repo.list_roadmaps().await.unwrap();
    assert_eq!(listed.len(), 2);
    let python = listed.iter().find(|s| s.technology == "Python").unwrap();
    assert_eq!(python.total_steps, 2);
    assert_eq!(python.timeframe, Timeframe::ThreeMonths);

    repo.delete_roadmap(first.id()).await.unwrap();
    assert!(repo.get_roadmap(first.id()).await.unwrap().is_none());
    assert_eq!(repo.list_roadmaps().await.unwrap().len(), 1);

    let err = repo.delete_roadmap(first.id()).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn sqlite_missing_roadmap_is_none() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_missing?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let fetched = repo.get_roadmap(RoadmapId::generate()).await.unwrap();
    assert!(fetched.is_none());
}

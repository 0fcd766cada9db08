//! Engine-level tests for the weekly planning run, driven against the
//! in-memory repository.

use std::collections::HashMap;

use chrono::{NaiveDate, Weekday};

use crate::config::{AssignmentStrategy, PlannerConfig};
use crate::db::repositories::LocalRepository;
use crate::db::repository::{ResearcherRepository, VisitRepository};
use crate::models::{
    AvailabilityPattern, Cluster, ClusterId, DayPart, FunctionCategory, FunctionId, MinSpacing,
    PlanWeek, Project, ProjectId, Protocol, ProtocolId, ProtocolVisitWindow, Qualifications,
    Researcher, ResearcherId, SpacingUnit, Species, SpeciesFamily, SpeciesId, SurveyFunction,
    Visit, VisitId, WeeklyCaps, WindowId,
};
use crate::services::planner::run;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Target week for all tests: Monday 2026-05-11 through Friday 2026-05-15.
fn week() -> PlanWeek {
    PlanWeek::new(2026, 20)
}

fn today() -> NaiveDate {
    date(2026, 5, 11)
}

/// Repository with one project, one cluster, one bat protocol
/// (two-week spacing, four windows spanning March through September).
fn base_repo() -> LocalRepository {
    let repo = LocalRepository::new();
    repo.seed_project(Project {
        id: ProjectId::new(1),
        code: "P-01".into(),
        quote: false,
    });
    repo.seed_cluster(Cluster {
        id: ClusterId::new(1),
        project_id: ProjectId::new(1),
        cluster_number: 1,
        name: "north field".into(),
    });
    repo.seed_species(Species {
        id: SpeciesId::new(1),
        name: "Common pipistrelle".into(),
        family: Some(SpeciesFamily::Bat),
    });
    repo.seed_function(SurveyFunction {
        id: FunctionId::new(1),
        name: "Maternity roost".into(),
        category: FunctionCategory::General,
    });
    repo.seed_protocol(Protocol {
        id: ProtocolId::new(1),
        function_id: FunctionId::new(1),
        species_id: SpeciesId::new(1),
        visit_count: 4,
        min_spacing: Some(MinSpacing {
            value: 2,
            unit: SpacingUnit::Weeks,
        }),
    });
    for index in 1..=4u32 {
        repo.seed_window(ProtocolVisitWindow {
            id: WindowId::new(index as i64),
            protocol_id: ProtocolId::new(1),
            visit_index: index,
            window_from: date(2026, 3, 1),
            window_to: date(2026, 9, 30),
        });
    }
    repo
}

fn bat_researcher(id: i64) -> Researcher {
    Researcher {
        id: ResearcherId::new(id),
        name: format!("researcher {id}"),
        qualifications: Qualifications {
            families: [SpeciesFamily::Bat].into_iter().collect(),
            logistics: Default::default(),
            overflight_route: false,
        },
    }
}

/// Weekday pattern opening `slots` mornings per week through 2026.
fn morning_pattern(researcher: i64, slots: u32) -> AvailabilityPattern {
    let days = [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri];
    let mut schedule = HashMap::new();
    for day in days.into_iter().take(slots as usize) {
        schedule.insert(day, [DayPart::Morning].into_iter().collect());
    }
    AvailabilityPattern {
        id: 0,
        researcher_id: ResearcherId::new(researcher),
        start_date: date(2026, 1, 1),
        end_date: date(2026, 12, 31),
        schedule,
        weekly_caps: WeeklyCaps::default(),
    }
}

async fn seed_availability(repo: &LocalRepository, researcher: i64, slots: u32) {
    repo.insert_pattern(&morning_pattern(researcher, slots))
        .await
        .unwrap();
}

/// Open bat visit in the target week, linked to the given window.
fn open_visit(window: Option<i64>) -> Visit {
    Visit {
        id: VisitId::new(0),
        cluster_id: ClusterId::new(1),
        visit_nr: Some(1),
        from_date: Some(date(2026, 5, 11)),
        to_date: Some(date(2026, 5, 15)),
        day_part: Some(DayPart::Morning),
        required_researchers: 1,
        priority: false,
        logistics: Default::default(),
        planning_locked: false,
        planned_week: None,
        provisional_week: None,
        provisional_locked: false,
        custom_label: None,
        function_ids: vec![FunctionId::new(1)],
        species_ids: vec![SpeciesId::new(1)],
        researcher_ids: vec![],
        window_ids: window.map(WindowId::new).into_iter().collect(),
    }
}

fn greedy() -> PlannerConfig {
    PlannerConfig {
        strategy: AssignmentStrategy::Greedy,
        ..PlannerConfig::default()
    }
}

#[tokio::test]
async fn test_run_staffs_open_visit() {
    let repo = base_repo();
    repo.seed_researcher(bat_researcher(1));
    seed_availability(&repo, 1, 3).await;
    let id = repo.add_visit(open_visit(Some(1)));

    let outcome = run(&repo, week(), today(), &greedy()).await.unwrap();
    assert_eq!(outcome.planned, vec![id]);
    assert!(outcome.unplanned.is_empty());

    let stored = repo.get_visit(id).await.unwrap();
    assert_eq!(stored.researcher_ids, vec![ResearcherId::new(1)]);
    assert_eq!(stored.planned_week, Some(week()));
}

#[tokio::test]
async fn test_no_partial_staffing() {
    let repo = base_repo();
    repo.seed_researcher(bat_researcher(1));
    seed_availability(&repo, 1, 3).await;
    let mut visit = open_visit(Some(1));
    visit.required_researchers = 2;
    let id = repo.add_visit(visit);

    let outcome = run(&repo, week(), today(), &greedy()).await.unwrap();
    assert!(outcome.planned.is_empty());
    assert_eq!(outcome.unplanned, vec![id]);

    // No half-staffed leftovers.
    let stored = repo.get_visit(id).await.unwrap();
    assert!(stored.researcher_ids.is_empty());
    assert!(stored.planned_week.is_none());
}

#[tokio::test]
async fn test_capacity_is_never_exceeded() {
    let repo = base_repo();
    repo.seed_researcher(bat_researcher(1));
    seed_availability(&repo, 1, 1).await;
    let first = repo.add_visit(open_visit(Some(1)));
    let second = repo.add_visit(open_visit(Some(2)));

    let outcome = run(&repo, week(), today(), &greedy()).await.unwrap();
    assert_eq!(outcome.planned.len(), 1);
    assert_eq!(outcome.unplanned.len(), 1);

    let staffed_first = !repo.get_visit(first).await.unwrap().researcher_ids.is_empty();
    let staffed_second = !repo.get_visit(second).await.unwrap().researcher_ids.is_empty();
    assert!(staffed_first != staffed_second);
}

#[tokio::test]
async fn test_lookback_blocks_recent_protocol() {
    let repo = base_repo();
    repo.seed_researcher(bat_researcher(1));
    seed_availability(&repo, 1, 3).await;

    // Locked history visit ended the Friday before the target week.
    let mut history = open_visit(Some(1));
    history.from_date = Some(date(2026, 5, 4));
    history.to_date = Some(date(2026, 5, 8));
    history.researcher_ids = vec![ResearcherId::new(1)];
    repo.add_visit(history);

    let candidate = repo.add_visit(open_visit(Some(2)));

    let outcome = run(&repo, week(), today(), &greedy()).await.unwrap();
    assert!(outcome.planned.is_empty());
    assert_eq!(outcome.skipped, vec![candidate]);
    assert!(repo.get_visit(candidate).await.unwrap().planned_week.is_none());
}

#[tokio::test]
async fn test_custom_visit_bypasses_lookback() {
    let repo = base_repo();
    repo.seed_researcher(bat_researcher(1));
    seed_availability(&repo, 1, 3).await;

    let mut history = open_visit(Some(1));
    history.from_date = Some(date(2026, 5, 4));
    history.to_date = Some(date(2026, 5, 8));
    history.researcher_ids = vec![ResearcherId::new(1)];
    repo.add_visit(history);

    let mut candidate = open_visit(Some(2));
    candidate.custom_label = Some("repeat check".into());
    let id = repo.add_visit(candidate);

    let outcome = run(&repo, week(), today(), &greedy()).await.unwrap();
    assert_eq!(outcome.planned, vec![id]);
}

#[tokio::test]
async fn test_lookahead_unstaffs_close_future_visit() {
    let repo = base_repo();
    repo.seed_researcher(bat_researcher(1));
    repo.seed_researcher(bat_researcher(2));
    seed_availability(&repo, 1, 3).await;
    seed_availability(&repo, 2, 3).await;

    let candidate = repo.add_visit(open_visit(Some(1)));

    // Locked future visit three days past the run week's Friday; the
    // protocol demands two weeks.
    let mut future = open_visit(Some(2));
    future.from_date = Some(date(2026, 5, 18));
    future.to_date = Some(date(2026, 5, 22));
    future.researcher_ids = vec![ResearcherId::new(2)];
    future.planned_week = Some(PlanWeek::new(2026, 21));
    let future_id = repo.add_visit(future);

    let outcome = run(&repo, week(), today(), &greedy()).await.unwrap();
    assert_eq!(outcome.planned, vec![candidate]);
    assert_eq!(outcome.unstaffed, vec![future_id]);

    let cleared = repo.get_visit(future_id).await.unwrap();
    assert!(cleared.researcher_ids.is_empty());
    assert!(cleared.planned_week.is_none());
}

#[tokio::test]
async fn test_lookahead_spares_distant_future_visit() {
    let repo = base_repo();
    repo.seed_researcher(bat_researcher(1));
    repo.seed_researcher(bat_researcher(2));
    seed_availability(&repo, 1, 3).await;

    repo.add_visit(open_visit(Some(1)));

    let mut future = open_visit(Some(2));
    future.from_date = Some(date(2026, 6, 15));
    future.to_date = Some(date(2026, 6, 19));
    future.researcher_ids = vec![ResearcherId::new(2)];
    future.planned_week = Some(PlanWeek::new(2026, 25));
    let future_id = repo.add_visit(future);

    let outcome = run(&repo, week(), today(), &greedy()).await.unwrap();
    assert!(outcome.unstaffed.is_empty());
    let untouched = repo.get_visit(future_id).await.unwrap();
    assert_eq!(untouched.researcher_ids, vec![ResearcherId::new(2)]);
}

#[tokio::test]
async fn test_quote_project_is_excluded() {
    let repo = base_repo();
    repo.seed_project(Project {
        id: ProjectId::new(2),
        code: "Q-99".into(),
        quote: true,
    });
    repo.seed_cluster(Cluster {
        id: ClusterId::new(2),
        project_id: ProjectId::new(2),
        cluster_number: 1,
        name: "quoted".into(),
    });
    repo.seed_researcher(bat_researcher(1));
    seed_availability(&repo, 1, 3).await;

    let mut visit = open_visit(Some(1));
    visit.cluster_id = ClusterId::new(2);
    let id = repo.add_visit(visit);

    let outcome = run(&repo, week(), today(), &greedy()).await.unwrap();
    assert!(outcome.planned.is_empty());
    assert!(outcome.unplanned.is_empty());
    assert!(repo.get_visit(id).await.unwrap().planned_week.is_none());
}

#[tokio::test]
async fn test_planning_locked_visit_untouched() {
    let repo = base_repo();
    repo.seed_researcher(bat_researcher(1));
    seed_availability(&repo, 1, 3).await;

    let mut visit = open_visit(Some(1));
    visit.planning_locked = true;
    let id = repo.add_visit(visit);

    let outcome = run(&repo, week(), today(), &greedy()).await.unwrap();
    assert!(outcome.planned.is_empty());
    assert!(outcome.unplanned.is_empty());
    assert!(repo.get_visit(id).await.unwrap().planned_week.is_none());
}

#[tokio::test]
async fn test_visit_without_day_part_is_skipped() {
    let repo = base_repo();
    repo.seed_researcher(bat_researcher(1));
    seed_availability(&repo, 1, 3).await;

    let mut visit = open_visit(Some(1));
    visit.day_part = None;
    let id = repo.add_visit(visit);

    let outcome = run(&repo, week(), today(), &greedy()).await.unwrap();
    assert_eq!(outcome.skipped, vec![id]);
    assert!(outcome.planned.is_empty());
}

/// Two priority visits, one researcher each of two profiles, one slot
/// apiece. The first visit accepts anyone and the greedy tie-break hands
/// it researcher 1; the second strictly needs researcher 1 (bats).
async fn contention_fixture() -> (LocalRepository, VisitId, VisitId) {
    let repo = base_repo();
    repo.seed_species(Species {
        id: SpeciesId::new(2),
        name: "Hedgehog".into(),
        family: None,
    });
    repo.seed_researcher(bat_researcher(1));
    repo.seed_researcher(Researcher {
        id: ResearcherId::new(2),
        name: "generalist".into(),
        qualifications: Qualifications::default(),
    });
    seed_availability(&repo, 1, 1).await;
    seed_availability(&repo, 2, 1).await;

    let mut flexible = open_visit(Some(1));
    flexible.priority = true;
    flexible.species_ids = vec![SpeciesId::new(2)];
    let flexible_id = repo.add_visit(flexible);

    let mut bats_only = open_visit(Some(2));
    bats_only.priority = true;
    let bats_id = repo.add_visit(bats_only);

    (repo, flexible_id, bats_id)
}

#[tokio::test]
async fn test_greedy_strands_contended_visit() {
    let (repo, _, bats_id) = contention_fixture().await;
    let outcome = run(&repo, week(), today(), &greedy()).await.unwrap();
    assert_eq!(outcome.planned.len(), 1);
    assert_eq!(outcome.unplanned, vec![bats_id]);
}

#[tokio::test]
async fn test_backtracking_finds_alternative_combination() {
    let (repo, flexible_id, bats_id) = contention_fixture().await;

    // Default strategy is backtracking: the repair pass must move the
    // flexible visit to researcher 2 so researcher 1 can take the bats.
    let outcome = run(&repo, week(), today(), &PlannerConfig::default())
        .await
        .unwrap();
    assert_eq!(outcome.planned.len(), 2);
    assert!(outcome.unplanned.is_empty());

    let bats = repo.get_visit(bats_id).await.unwrap();
    assert_eq!(bats.researcher_ids, vec![ResearcherId::new(1)]);
    let moved = repo.get_visit(flexible_id).await.unwrap();
    assert_eq!(moved.researcher_ids, vec![ResearcherId::new(2)]);
}

#[tokio::test]
async fn test_priority_outranks_earlier_window_start() {
    let repo = base_repo();
    repo.seed_species(Species {
        id: SpeciesId::new(2),
        name: "Hedgehog".into(),
        family: None,
    });
    repo.seed_researcher(bat_researcher(1));
    seed_availability(&repo, 1, 1).await;

    // One slot, two visits. The non-priority one starts earlier, but the
    // priority flag outranks window start.
    let mut ordinary = open_visit(Some(1));
    ordinary.species_ids = vec![SpeciesId::new(2)];
    ordinary.from_date = Some(date(2026, 5, 11));
    let ordinary_id = repo.add_visit(ordinary);

    let mut urgent = open_visit(Some(2));
    urgent.priority = true;
    urgent.from_date = Some(date(2026, 5, 12));
    let urgent_id = repo.add_visit(urgent);

    let outcome = run(&repo, week(), today(), &PlannerConfig::default())
        .await
        .unwrap();
    assert_eq!(outcome.planned, vec![urgent_id]);
    assert_eq!(outcome.unplanned, vec![ordinary_id]);
}

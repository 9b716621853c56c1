mod common;

use common::mocks::{MockLLMClient, prompts};
use common::trip_request;
use itinera::agents::{flight::fallback_flights, planner::mock_day_plans};
use itinera::itinerary::{AgentCoordinator, Mode};
use itinera::types::{AppError, DayPlan, Itinerary};
use itinera::{ItineraConfig, LLMClient};
use rstest::rstest;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn coordinator(llm: Arc<MockLLMClient>) -> AgentCoordinator {
    coordinator_with(llm, ItineraConfig::default())
}

fn coordinator_with(llm: Arc<MockLLMClient>, config: ItineraConfig) -> AgentCoordinator {
    let llm: Arc<dyn LLMClient> = llm;
    AgentCoordinator::new(llm, Arc::new(config))
}

fn previous_itinerary(days: u32) -> Itinerary {
    Itinerary {
        summary: "Complete itinerary for Refine Test".into(),
        day_plans: mock_day_plans(days),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_unparseable_answers_still_produce_itinerary() {
    let llm = MockLLMClient::new("OK").shared();
    let itinerary = coordinator(llm.clone())
        .generate_itinerary(trip_request("Coord Test", 3))
        .await
        .expect("fallbacks keep the request alive");

    assert_eq!(itinerary.summary, "Complete itinerary for Coord Test");
    assert!(!itinerary.bookings.flights.is_empty());
    assert!(!itinerary.bookings.hotels.is_empty());
    assert!(!itinerary.bookings.transport.is_empty());
    assert_eq!(itinerary.bookings.flights, fallback_flights());
    assert_eq!(itinerary.events.len(), 3);
    assert!(!itinerary.weather.is_empty());
    assert_eq!(itinerary.day_plans, mock_day_plans(3));
    assert!(itinerary.notes_parsing_errors.is_empty());

    // five domain agents plus the planner
    assert_eq!(llm.prompts().len(), 6);
}

#[tokio::test]
async fn test_refine_parses_json_notes() {
    let flight_json = r#"{"recommended":{"carrier":"DemoAir","price":"400 USD","notes":"{\"seat\":\"aisle\"}"},"alternatives":[]}"#;
    let llm = MockLLMClient::new(flight_json).shared();

    let mut request = trip_request("Refine Test", 2);
    request.amendments = "Make it 3 days".into();
    request.previous_itinerary = Some(previous_itinerary(2));

    let itinerary = coordinator(llm.clone())
        .generate_itinerary(request)
        .await
        .unwrap();

    let recommended = &itinerary.bookings.flights["recommended"];
    assert_eq!(recommended["notes"], "{\"seat\":\"aisle\"}");
    assert_eq!(recommended["notes_parsed"], json!({"seat": "aisle"}));

    let typed = itinerary.bookings.flights_typed.as_ref().unwrap();
    assert_eq!(typed.carrier.as_deref(), Some("DemoAir"));
    assert_eq!(typed.notes.as_ref().unwrap()["seat"], "aisle");

    assert_eq!(itinerary.summary, "Refined itinerary for Refine Test");
    // no dayPlans in the planner answer, so the previous plan is kept
    assert_eq!(itinerary.day_plans, mock_day_plans(2));

    let planner_prompt = llm
        .prompts()
        .into_iter()
        .find(|p| p.contains(prompts::PLANNER))
        .unwrap();
    assert!(planner_prompt.contains("Day 1: Day 1 Activities; Day 2: Day 2 Activities"));
    assert!(planner_prompt.contains("Make it 3 days"));
}

#[tokio::test]
async fn test_amendments_without_previous_itinerary_generate() {
    let llm = MockLLMClient::new("OK").shared();
    let mut request = trip_request("Amended", 2);
    request.amendments = "quieter evenings".into();

    let itinerary = coordinator(llm.clone()).generate_itinerary(request).await.unwrap();
    assert_eq!(itinerary.summary, "Complete itinerary for Amended");

    let planner_prompt = llm
        .prompts()
        .into_iter()
        .find(|p| p.contains(prompts::PLANNER))
        .unwrap();
    assert!(planner_prompt.contains("Create a detailed day-by-day itinerary"));
}

#[tokio::test]
async fn test_planner_failure_fails_request() {
    let llm = MockLLMClient::new("OK").fail_on(prompts::PLANNER).shared();
    let result = coordinator(llm)
        .generate_itinerary(trip_request("Broken planner", 2))
        .await;

    assert!(matches!(result, Err(AppError::LLM(_))));
}

#[rstest]
#[case::flight(prompts::FLIGHT)]
#[case::hotel(prompts::HOTEL)]
#[case::transport(prompts::TRANSPORT)]
#[case::event(prompts::EVENT)]
#[case::weather(prompts::WEATHER)]
#[tokio::test]
async fn test_domain_failure_fails_request(#[case] fragment: &str) {
    let llm = MockLLMClient::new("OK").fail_on(fragment).shared();
    let result = coordinator(llm.clone())
        .generate_itinerary(trip_request("Broken agent", 2))
        .await;

    assert!(result.is_err());
    assert_eq!(llm.calls_matching(prompts::PLANNER), 0);
}

#[tokio::test(start_paused = true)]
async fn test_slow_agent_times_out() {
    let mut config = ItineraConfig::default();
    config.agents.weather.timeout_secs = 1;

    let llm = MockLLMClient::new("OK")
        .hang_on(prompts::WEATHER, Duration::from_secs(30))
        .shared();
    let result = coordinator_with(llm.clone(), config)
        .generate_itinerary(trip_request("Slow weather", 2))
        .await;

    match result {
        Err(AppError::Timeout(msg)) => assert!(msg.contains("weather")),
        other => panic!("expected timeout, got {:?}", other.map(|i| i.summary)),
    }
    assert_eq!(llm.calls_matching(prompts::PLANNER), 0);
}

#[rstest]
#[case(1)]
#[case(3)]
#[case(7)]
#[tokio::test]
async fn test_planner_day_count_is_preserved(#[case] days: u32) {
    let plans: Vec<_> = (1..=days)
        .map(|d| json!({"dayNumber": d, "title": format!("Day {}", d), "activities": [{"title": "Walk", "time": "10:00"}]}))
        .collect();
    let planner_answer = json!({"dayPlans": plans, "summary": "ok"}).to_string();

    let llm = MockLLMClient::new("OK")
        .route(prompts::PLANNER, &planner_answer)
        .shared();
    let itinerary = coordinator(llm)
        .generate_itinerary(trip_request("Counted", days))
        .await
        .unwrap();

    assert_eq!(itinerary.day_plans.len(), days as usize);
    let last: &DayPlan = itinerary.day_plans.last().unwrap();
    assert_eq!(last.day_number, days);
    assert_eq!(last.activities[0].time.as_deref(), Some("10:00"));
}

#[rstest]
#[case::one_day_short(3, 2)]
#[case::one_day_over(3, 4)]
#[tokio::test]
async fn test_planner_day_count_mismatch_is_annotated(#[case] days: u32, #[case] answered: u32) {
    let plans: Vec<_> = (1..=answered)
        .map(|d| json!({"dayNumber": d, "title": format!("Day {}", d), "activities": []}))
        .collect();
    let llm = MockLLMClient::new("OK")
        .route(prompts::PLANNER, &json!({"dayPlans": plans}).to_string())
        .shared();

    let itinerary = coordinator(llm)
        .generate_itinerary(trip_request("Short", days))
        .await
        .unwrap();

    assert_eq!(itinerary.day_plans.len(), answered as usize);
    assert_eq!(
        itinerary.notes_parsing_errors,
        vec![format!(
            "Planner mapping: returned {} day plans for a {}-day trip",
            answered, days
        )]
    );
}

#[tokio::test]
async fn test_refined_day_count_mismatch_is_annotated() {
    let llm = MockLLMClient::new("OK")
        .route(
            prompts::PLANNER,
            r#"{"dayPlans": [{"dayNumber": 1, "title": "Only day", "activities": []}]}"#,
        )
        .shared();
    let mut request = trip_request("Refine Test", 3);
    request.amendments = "Squeeze everything into one day".into();
    request.previous_itinerary = Some(previous_itinerary(3));

    let itinerary = coordinator(llm).generate_itinerary(request).await.unwrap();

    assert_eq!(itinerary.summary, "Refined itinerary for Refine Test");
    assert_eq!(
        itinerary.notes_parsing_errors,
        vec!["Planner mapping: returned 1 day plans for a 3-day trip".to_string()]
    );
}

#[tokio::test]
async fn test_mapping_issues_are_reported() {
    let llm = MockLLMClient::new("OK")
        .route(
            prompts::HOTEL,
            r#"{"recommended": {"name": "Grand", "notes": "{broken"}, "options": []}"#,
        )
        .route(prompts::EVENT, r#"{"events": [{"name": "Gig", "notes": "[1, 2"}]}"#)
        .shared();

    let itinerary = coordinator(llm)
        .generate_itinerary(trip_request("Messy", 2))
        .await
        .unwrap();

    assert_eq!(itinerary.notes_parsing_errors.len(), 2);
    assert!(itinerary.notes_parsing_errors[0].starts_with("Booking mapping: hotels.recommended.notes"));
    assert!(itinerary.notes_parsing_errors[1].starts_with("Event mapping: events[0].notes"));
    assert_eq!(
        itinerary.bookings.hotels_typed.unwrap().name.as_deref(),
        Some("Grand")
    );
}

#[tokio::test]
async fn test_questions_delegate_to_question_agent() {
    let llm = MockLLMClient::new("OK")
        .route(
            prompts::QUESTION,
            r#"{"questions": [{"question": "Coast or mountains?", "type": "destination", "required": true}], "context": "Testland is varied."}"#,
        )
        .shared();

    let response = coordinator(llm.clone())
        .generate_questions(&trip_request("Curious", 4))
        .await
        .unwrap();

    assert_eq!(response.questions.len(), 1);
    assert_eq!(response.context, "Testland is varied.");
    assert_eq!(llm.prompts().len(), 1);
}

#[rstest]
#[case("", false, Mode::Generate)]
#[case("   ", true, Mode::Generate)]
#[case("more beaches", false, Mode::Generate)]
#[case("more beaches", true, Mode::Refine)]
fn test_mode_selection(#[case] amendments: &str, #[case] has_previous: bool, #[case] expected: Mode) {
    let mut request = trip_request("Mode", 2);
    request.amendments = amendments.to_string();
    if has_previous {
        request.previous_itinerary = Some(previous_itinerary(2));
    }
    assert_eq!(Mode::for_request(&request), expected);
}

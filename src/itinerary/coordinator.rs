use crate::agents::{
    AgentSettings, DomainAgent, EventAgent, FlightAgent, HotelAgent, PlannerAgent, QuestionAgent,
    TransportAgent, WeatherAgent,
};
use crate::itinerary::mapper::{map_to_booking, map_to_events, map_to_weather};
use crate::llm::LLMClient;
use crate::types::{
    AppError, DayPlan, Document, Itinerary, QuestionResponse, Result, TripRequest,
};
use crate::utils::toml_config::{AgentConfig, ItineraConfig};
use std::sync::Arc;
use tokio::task::JoinSet;

/// Whether a request builds a new itinerary or amends a previous one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Generate,
    Refine,
}

impl Mode {
    /// Refine only when there is amendment text and an itinerary to amend.
    pub fn for_request(request: &TripRequest) -> Self {
        if request.is_refinement() {
            Mode::Refine
        } else {
            Mode::Generate
        }
    }
}

/// Output of one domain search task
enum DomainOutcome {
    Flights(Document),
    Hotels(Document),
    Transport(Document),
    Events(Vec<Document>),
    Weather(Document),
}

#[derive(Default)]
struct DomainResults {
    flights: Option<Document>,
    hotels: Option<Document>,
    transport: Option<Document>,
    events: Option<Vec<Document>>,
    weather: Option<Document>,
}

impl DomainResults {
    fn record(&mut self, outcome: DomainOutcome) {
        match outcome {
            DomainOutcome::Flights(doc) => self.flights = Some(doc),
            DomainOutcome::Hotels(doc) => self.hotels = Some(doc),
            DomainOutcome::Transport(doc) => self.transport = Some(doc),
            DomainOutcome::Events(list) => self.events = Some(list),
            DomainOutcome::Weather(doc) => self.weather = Some(doc),
        }
    }
}

fn missing(agent: &str) -> AppError {
    AppError::Internal(format!("{} agent produced no result", agent))
}

/// Runs the domain agents concurrently, then plans and assembles the itinerary.
///
/// The coordinator holds a configuration snapshot, so a reload between
/// requests takes effect on the next coordinator built from the manager.
pub struct AgentCoordinator {
    llm: Arc<dyn LLMClient>,
    config: Arc<ItineraConfig>,
}

impl AgentCoordinator {
    pub fn new(llm: Arc<dyn LLMClient>, config: Arc<ItineraConfig>) -> Self {
        Self { llm, config }
    }

    fn settings(&self, agent: &AgentConfig) -> AgentSettings {
        AgentSettings::resolve(&self.config, agent)
    }

    /// Clarifying questions for `request`.
    pub async fn generate_questions(&self, request: &TripRequest) -> Result<QuestionResponse> {
        let agent = QuestionAgent::new(self.llm.clone(), self.settings(&self.config.agents.question));
        let response = agent.generate_questions(request).await?;

        tracing::info!(
            title = %request.trip_title,
            questions = response.questions.len(),
            "Generated clarifying questions"
        );
        Ok(response)
    }

    /// Produce a complete itinerary, or a refined one when the request
    /// carries amendments and a previous itinerary.
    ///
    /// Any provider failure or per-agent timeout fails the whole request.
    /// Malformed model answers never do; they are absorbed by fallbacks and
    /// mapping issues are reported in `notes_parsing_errors`.
    pub async fn generate_itinerary(&self, request: TripRequest) -> Result<Itinerary> {
        let mode = Mode::for_request(&request);
        tracing::info!(title = %request.trip_title, days = request.days, ?mode, "Generating itinerary");

        let request = Arc::new(request);
        let results = self.gather(request.clone()).await?;

        let flights = results.flights.ok_or_else(|| missing("flight"))?;
        let hotels = results.hotels.ok_or_else(|| missing("hotel"))?;
        let transport = results.transport.ok_or_else(|| missing("transport"))?;
        let events = results.events.ok_or_else(|| missing("event"))?;
        let weather = results.weather.ok_or_else(|| missing("weather"))?;

        let day_plans = self
            .plan(mode, &request, &flights, &hotels, &transport, &events, &weather)
            .await?;

        let booking = map_to_booking(&flights, &transport, &hotels);
        let events = map_to_events(&events);
        let weather = map_to_weather(&weather);

        let day_count_issue = (day_plans.len() != request.days as usize).then(|| {
            tracing::warn!(
                requested = request.days,
                returned = day_plans.len(),
                "Planner day count differs from the trip length"
            );
            format!(
                "Planner mapping: returned {} day plans for a {}-day trip",
                day_plans.len(),
                request.days
            )
        });

        let notes_parsing_errors: Vec<String> = day_count_issue
            .into_iter()
            .chain(booking.issues.iter().map(|issue| format!("Booking mapping: {}", issue)))
            .chain(events.issues.iter().map(|issue| format!("Event mapping: {}", issue)))
            .chain(weather.issues.iter().map(|issue| format!("Weather mapping: {}", issue)))
            .collect();
        if !notes_parsing_errors.is_empty() {
            tracing::warn!(issues = notes_parsing_errors.len(), "Itinerary assembled with mapping issues");
        }

        let summary = match mode {
            Mode::Generate => format!("Complete itinerary for {}", request.trip_title),
            Mode::Refine => format!("Refined itinerary for {}", request.trip_title),
        };

        tracing::info!(days = day_plans.len(), "Itinerary ready");

        Ok(Itinerary {
            summary,
            day_plans,
            bookings: booking.value,
            events: events.value,
            weather: weather.value,
            notes_parsing_errors,
        })
    }

    /// Fan out the five domain searches and wait for all of them.
    async fn gather(&self, request: Arc<TripRequest>) -> Result<DomainResults> {
        let agents = &self.config.agents;
        let mut set = JoinSet::new();

        spawn_search(
            &mut set,
            FlightAgent::new(self.llm.clone(), self.settings(&agents.flight)),
            request.clone(),
            DomainOutcome::Flights,
        );
        spawn_search(
            &mut set,
            HotelAgent::new(self.llm.clone(), self.settings(&agents.hotel)),
            request.clone(),
            DomainOutcome::Hotels,
        );
        spawn_search(
            &mut set,
            TransportAgent::new(self.llm.clone(), self.settings(&agents.transport)),
            request.clone(),
            DomainOutcome::Transport,
        );
        spawn_search(
            &mut set,
            EventAgent::new(self.llm.clone(), self.settings(&agents.event)),
            request.clone(),
            DomainOutcome::Events,
        );
        spawn_search(
            &mut set,
            WeatherAgent::new(self.llm.clone(), self.settings(&agents.weather)),
            request,
            DomainOutcome::Weather,
        );

        let mut results = DomainResults::default();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Ok(outcome)) => results.record(outcome),
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "Domain agent failed, aborting remaining searches");
                    set.abort_all();
                    return Err(e);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Domain agent task panicked or was cancelled");
                    set.abort_all();
                    return Err(AppError::Internal(format!("Agent task failed: {}", e)));
                }
            }
        }

        Ok(results)
    }

    #[allow(clippy::too_many_arguments)]
    async fn plan(
        &self,
        mode: Mode,
        request: &TripRequest,
        flights: &Document,
        hotels: &Document,
        transport: &Document,
        events: &[Document],
        weather: &Document,
    ) -> Result<Vec<DayPlan>> {
        let planner = PlannerAgent::new(self.llm.clone(), self.settings(&self.config.agents.planner));

        match mode {
            Mode::Generate => {
                planner
                    .create_day_plans(request, flights, hotels, transport, events, weather)
                    .await
            }
            Mode::Refine => {
                let previous = request
                    .previous_itinerary
                    .as_ref()
                    .map(|it| it.day_plans.as_slice())
                    .unwrap_or_default();
                planner
                    .refine_day_plans(request, previous, &request.amendments)
                    .await
            }
        }
    }
}

fn spawn_search<A, F>(
    set: &mut JoinSet<Result<DomainOutcome>>,
    agent: A,
    request: Arc<TripRequest>,
    wrap: F,
) where
    A: DomainAgent + 'static,
    F: FnOnce(A::Output) -> DomainOutcome + Send + 'static,
{
    set.spawn(async move {
        let started = std::time::Instant::now();
        let outcome = agent.search(&request).await;
        tracing::debug!(
            agent = agent.name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = outcome.is_ok(),
            "Domain search finished"
        );
        outcome.map(wrap)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_selection() {
        let mut request = TripRequest::default();
        assert_eq!(Mode::for_request(&request), Mode::Generate);

        request.amendments = "add a spa day".into();
        assert_eq!(Mode::for_request(&request), Mode::Generate);

        request.previous_itinerary = Some(Itinerary::default());
        assert_eq!(Mode::for_request(&request), Mode::Refine);
    }
}

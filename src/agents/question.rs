use super::{ask, list_or, parse_object, AgentSettings, JSON_ONLY};
use crate::llm::LLMClient;
use crate::types::{ClarifyingQuestion, QuestionResponse, QuestionType, Result, TripRequest};
use serde_json::Value;
use std::sync::Arc;

const SCHEMA: &str = r#"{
  "questions": [
    {
      "question": "string",
      "type": "destination|activity|pace|budget|preference",
      "options": ["string"],
      "required": true
    }
  ],
  "context": "string"
}"#;

const DEFAULT_CONTEXT: &str = "Questions to help refine your travel preferences.";
const FALLBACK_CONTEXT: &str = "Default questions to help refine your travel preferences.";

/// Proposes clarifying questions before an itinerary is generated.
pub struct QuestionAgent {
    llm: Arc<dyn LLMClient>,
    settings: AgentSettings,
}

impl QuestionAgent {
    pub fn new(llm: Arc<dyn LLMClient>, settings: AgentSettings) -> Self {
        Self { llm, settings }
    }

    fn max_questions(&self) -> usize {
        self.settings.max_options.max(2) as usize
    }

    fn build_prompt(&self, request: &TripRequest) -> String {
        let or_unspecified = |s: &str| {
            if s.trim().is_empty() {
                "Not specified".to_string()
            } else {
                s.to_string()
            }
        };

        format!(
            "You are a travel planning assistant. Analyze this trip request and generate 2-{} \
             clarifying questions that would help create a better itinerary. Focus on areas where \
             the request is vague.\n\n\
             Trip Request:\n\
             - Title: {}\n\
             - Days: {}\n\
             - Region: {}\n\
             - Budget: {}\n\
             - People: {}\n\
             - Weather Preference: {}\n\
             - Interests: {}\n\
             - Special Needs: {}\n\
             - Notes: {}\n\n\
             Ask about specific destinations within the region, activity preferences and pace, \
             budget priorities, and must-see attractions. Tag each question with one type from \
             destination, activity, pace, budget or preference.\n{}\n{}",
            self.max_questions(),
            or_unspecified(&request.trip_title),
            request.days,
            or_unspecified(&request.region),
            or_unspecified(&request.budget),
            request.people,
            or_unspecified(&request.weather_preference),
            list_or(&request.interests, "Not specified"),
            request.special.describe(),
            if request.notes.trim().is_empty() {
                "None"
            } else {
                request.notes.as_str()
            },
            JSON_ONLY,
            SCHEMA,
        )
    }

    /// Ask the model for clarifying questions about `request`.
    ///
    /// Falls back to [`default_questions`] when the answer cannot be parsed
    /// or contains no usable question. Provider failures are returned.
    pub async fn generate_questions(&self, request: &TripRequest) -> Result<QuestionResponse> {
        let body = ask(&self.llm, &self.settings, "question", &self.build_prompt(request)).await?;

        match parse_questions(&body, self.max_questions()) {
            Some(response) => Ok(response),
            None => {
                tracing::warn!(agent = "question", "Unusable model answer, using default questions");
                Ok(default_questions())
            }
        }
    }
}

fn parse_questions(body: &str, max_questions: usize) -> Option<QuestionResponse> {
    let doc = parse_object(body)?;

    let questions: Vec<ClarifyingQuestion> = doc
        .get("questions")?
        .as_array()?
        .iter()
        .filter_map(parse_question)
        .take(max_questions)
        .collect();
    if questions.is_empty() {
        return None;
    }

    let context = doc
        .get("context")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_CONTEXT)
        .to_string();

    Some(QuestionResponse { questions, context })
}

fn parse_question(value: &Value) -> Option<ClarifyingQuestion> {
    let obj = value.as_object()?;
    let question = obj.get("question")?.as_str()?.trim();
    if question.is_empty() {
        return None;
    }

    let options = obj
        .get("options")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
        })
        .filter(|items| !items.is_empty());

    Some(ClarifyingQuestion {
        question: question.to_string(),
        question_type: QuestionType::from_tag(obj.get("type").and_then(Value::as_str).unwrap_or("")),
        options,
        required: obj.get("required").and_then(Value::as_bool).unwrap_or(false),
    })
}

/// Questions returned when the model answer is unusable.
pub fn default_questions() -> QuestionResponse {
    QuestionResponse {
        questions: vec![
            ClarifyingQuestion {
                question: "What specific cities or attractions are you most interested in visiting?"
                    .to_string(),
                question_type: QuestionType::Destination,
                options: None,
                required: true,
            },
            ClarifyingQuestion {
                question: "What pace do you prefer for your trip?".to_string(),
                question_type: QuestionType::Pace,
                options: Some(vec![
                    "Relaxed".to_string(),
                    "Moderate".to_string(),
                    "Fast-paced".to_string(),
                ]),
                required: true,
            },
        ],
        context: FALLBACK_CONTEXT.to_string(),
    }
}

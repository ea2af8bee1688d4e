//! Train Schedule DB — structured lookup of trains by station or number.

use async_trait::async_trait;
use railsage_core::error::{StoreError, ToolError};
use railsage_core::tool::{Tool, ToolResult};
use railsage_store::{LookupTerms, TrainStore};
use tracing::{debug, warn};

pub const NAME: &str = "Train Schedule DB";
pub const DESCRIPTION: &str = "Use this to find train numbers, routes, and schedules.";
pub const NO_TRAINS: &str = "No trains found in the database for that station.";

/// Words that describe the question rather than name a station.
const ROUTING_STOP_WORDS: &[&str] = &[
    "trains", "train", "from", "between", "route", "routes", "schedule", "schedules", "timing",
    "timings", "which", "what", "when", "where", "show", "find", "list", "available", "running",
    "going", "there", "about", "tell", "please", "details", "number", "numbers", "does", "leave",
    "leaves", "reach", "reaches", "arrive", "arrives", "depart", "departs", "towards", "direct",
];

/// Looks up trains in the structured store.
pub struct TrainScheduleTool {
    store: TrainStore,
    limit: usize,
}

impl TrainScheduleTool {
    pub const DEFAULT_LIMIT: usize = 5;

    pub fn new(store: TrainStore) -> Self {
        Self {
            store,
            limit: Self::DEFAULT_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    async fn lookup(&self, input: &str) -> Result<String, StoreError> {
        let terms = extract_terms(input);
        debug!(
            stations = ?terms.stations,
            train_numbers = ?terms.train_numbers,
            "Train lookup terms"
        );

        let trains = self.store.search(&terms, self.limit).await?;
        if trains.is_empty() {
            return Ok(NO_TRAINS.to_string());
        }

        Ok(trains
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

/// Split a free-text query into lookup terms.
///
/// Digit runs of three or more are train numbers; alphabetic words longer
/// than three characters that are not routing words are station names. When
/// nothing survives, the first word longer than three characters is used as
/// a station term.
pub fn extract_terms(query: &str) -> LookupTerms {
    let lower = query.to_lowercase();
    let tokens: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();

    let mut terms = LookupTerms::default();
    for token in &tokens {
        if token.chars().all(|c| c.is_ascii_digit()) {
            if token.len() >= 3 && !terms.train_numbers.iter().any(|t| t == token) {
                terms.train_numbers.push(token.to_string());
            }
        } else if token.chars().all(char::is_alphabetic)
            && token.chars().count() > 3
            && !ROUTING_STOP_WORDS.contains(token)
            && !terms.stations.iter().any(|t| t == token)
        {
            terms.stations.push(token.to_string());
        }
    }

    if terms.is_empty() {
        if let Some(first) = tokens.iter().find(|t| t.chars().count() > 3) {
            terms.stations.push(first.to_string());
        }
    }

    terms
}

#[async_trait]
impl Tool for TrainScheduleTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    async fn execute(&self, input: &str) -> Result<String, ToolError> {
        self.lookup(input)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: NAME.into(),
                reason: e.to_string(),
            })
    }

    async fn invoke(&self, input: &str) -> ToolResult {
        match self.lookup(input).await {
            Ok(output) => ToolResult::ok(output),
            Err(e) => {
                warn!(tool = NAME, error = %e, "Train lookup failed");
                ToolResult::error(format!("Database Error: {e}"))
            }
        }
    }
}

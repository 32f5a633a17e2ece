//! Extension packages shipped with the demo personas.
//!
//! Each persona directory under `apps/` has a matching package here; the
//! CLI puts only the selected persona's package on the search path.

use async_trait::async_trait;
use rasa::errors::StageError;
use rasa::registry::ExtensionPackage;
use rasa::stages::{Stage, StageKind};
use rasa::state::State;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Returns the extension package for `persona`, if one ships with the CLI.
pub fn package_for(persona: &str) -> Option<ExtensionPackage> {
    match persona {
        "travel_concierge" => Some(travel_concierge()),
        "economist_advisor" => Some(economist_advisor()),
        _ => None,
    }
}

fn travel_concierge() -> ExtensionPackage {
    ExtensionPackage::new("travel_concierge")
        .with_description(
            "Recommends a destination from region (europe, asia, americas), \
             travel_style (relaxed, adventurous) and season preferences.",
        )
        .with_stage("travel_heuristic_agent", |init| {
            Arc::new(TravelHeuristicAgent::new(init.name))
        })
}

fn economist_advisor() -> ExtensionPackage {
    ExtensionPackage::new("economist_advisor")
        .with_description(
            "Explains economic impacts for a topic and focus, \
             e.g. topic=interest_rates focus=small_business.",
        )
        .with_stage("economy_heuristic_agent", |init| {
            Arc::new(EconomyHeuristicAgent::new(init.name))
        })
}

/// Picks a destination from the normalised preferences in
/// `context.preferences`.
#[derive(Debug, Clone)]
pub struct TravelHeuristicAgent {
    name: String,
}

impl TravelHeuristicAgent {
    /// Creates the agent.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn select_destination(region: &str, style: &str) -> &'static str {
        match (region, style) {
            ("europe", "relaxed") => "Hallstatt, Austria",
            ("europe", "adventurous") => "Interlaken, Switzerland",
            ("asia", "relaxed") => "Ubud, Bali",
            ("asia", "adventurous") => "Pokhara, Nepal",
            ("americas", "relaxed") => "Santa Fe, New Mexico",
            ("americas", "adventurous") => "Patagonia, Argentina",
            _ => "a hidden gem in your chosen region",
        }
    }
}

#[async_trait]
impl Stage for TravelHeuristicAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StageKind {
        StageKind::Operator
    }

    async fn run(&self, mut state: State) -> Result<State, StageError> {
        info!(stage = %self.name, "Applying travel heuristics");

        let preferences = state
            .context()
            .and_then(|context| context.get("preferences"))
            .and_then(Value::as_object);
        let preference = |key: &str, default: &'static str| -> String {
            preferences
                .and_then(|prefs| prefs.get(key))
                .and_then(Value::as_str)
                .unwrap_or(default)
                .to_string()
        };

        let region = preference("region", "europe");
        let style = preference("travel_style", "relaxed");
        let season = preference("season", "spring");
        let destination = Self::select_destination(&region, &style);

        let output = format!(
            "For a {style} {season} getaway in {}, consider visiting {destination}.",
            title_case(&region)
        );
        state.set_output(output);
        Ok(state)
    }
}

/// Explains economic effects from `preferences.topic` and
/// `preferences.focus`.
#[derive(Debug, Clone)]
pub struct EconomyHeuristicAgent {
    name: String,
}

impl EconomyHeuristicAgent {
    /// Creates the agent.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Stage for EconomyHeuristicAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StageKind {
        StageKind::Operator
    }

    async fn run(&self, mut state: State) -> Result<State, StageError> {
        info!(stage = %self.name, "Applying economic heuristics");

        let preference = |key: &str| {
            state
                .preferences()
                .and_then(|prefs| prefs.get(key))
                .and_then(Value::as_str)
                .unwrap_or_default()
        };

        let explanation = match (preference("topic"), preference("focus")) {
            ("interest_rates", "small_business") => {
                "Rising interest rates increase borrowing costs, which reduces access to capital \
                 for small businesses. This can lead to slowed investment, reduced hiring, and \
                 higher default risk for debt-heavy firms."
            }
            _ => "Economic impacts vary. Please specify a clearer focus or topic for analysis.",
        };

        state.set_output(explanation);
        Ok(state)
    }
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

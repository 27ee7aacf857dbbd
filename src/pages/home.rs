//! Landing page: API status probe and feature overview.

use tracing::error;

use crate::client::ApiClient;

/// Reachability of the API as seen by the home page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiStatus {
    /// Probe not finished yet
    #[default]
    Loading,
    Online,
    Offline,
}

impl ApiStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ApiStatus::Loading => "Checking API...",
            ApiStatus::Online => "API Online",
            ApiStatus::Offline => "API Offline",
        }
    }

    pub fn is_online(&self) -> bool {
        matches!(self, ApiStatus::Online)
    }
}

impl std::fmt::Display for ApiStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A static feature card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureCard {
    pub title: &'static str,
    pub description: &'static str,
}

pub const FEATURES: [FeatureCard; 3] = [
    FeatureCard {
        title: "Equation Solver",
        description: "Solve systems of equations with multiple unknowns",
    },
    FeatureCard {
        title: "Matrix Operations",
        description: "Perform calculations on 1x2 and 1x3 matrices",
    },
    FeatureCard {
        title: "Pixel Art UI",
        description: "Beautiful retro-style interface with modern interactions",
    },
];

/// Call to action as `(label, path)`.
pub const CALCULATOR_LINK: (&str, &str) = ("Start Calculating", "/calculator");

const SUBTITLE: &str = "A modern mathematical calculator with pixel art aesthetics";

/// State of the landing page.
#[derive(Debug, Clone, Default)]
pub struct HomePage {
    status: ApiStatus,
}

impl HomePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> ApiStatus {
        self.status
    }

    /// Probe the API health endpoint and record the outcome.
    ///
    /// Any failure, including a timeout, marks the API offline.
    pub async fn check_api_health(&mut self, client: &ApiClient) -> ApiStatus {
        self.status = ApiStatus::Loading;
        self.status = match client.check_health().await {
            Ok(_) => ApiStatus::Online,
            Err(e) => {
                error!("API health check failed: {}", e);
                ApiStatus::Offline
            }
        };
        self.status
    }

    pub fn render(&self) -> String {
        let mut out = format!("{}\n{}\n\n", super::APP_TITLE, SUBTITLE);
        out.push_str(&format!("Status: {}\n\n", self.status));

        for card in FEATURES.iter() {
            out.push_str(&format!("* {}\n  {}\n", card.title, card.description));
        }

        let (label, path) = CALCULATOR_LINK;
        out.push_str(&format!("\n{} -> {}\n", label, path));
        out
    }
}

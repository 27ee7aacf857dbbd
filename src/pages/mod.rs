//! Page models driven by the CLI.
//!
//! Each page keeps the state a browser page would hold, updates it through
//! the [`ApiClient`](crate::client::ApiClient), and renders itself as terminal
//! text framed by the shared [`header`] and [`footer`].

pub mod calculator;
pub mod home;

pub use calculator::{
    CalculationResult, CalculatorPage, DEFAULT_OPERATION, EMPTY_EQUATION_MESSAGE,
    MATRIX_FAILED_MESSAGE, SAMPLE_MATRIX, SOLVE_FAILED_MESSAGE,
};
pub use home::{ApiStatus, FeatureCard, HomePage, CALCULATOR_LINK, FEATURES};

/// Application title shown in the header.
pub const APP_TITLE: &str = "PrivateCalculatorV2";

/// Navigation entries as `(label, path)`.
pub const NAV_LINKS: [(&str, &str); 2] = [("Home", "/"), ("Calculator", "/calculator")];

/// Project link shown in the footer.
pub const PROJECT_URL: &str = "https://github.com/withNoclout/PrivateCalculatorV2";

/// Title line followed by the navigation bar.
pub fn header() -> String {
    let nav = NAV_LINKS
        .iter()
        .map(|(label, path)| format!("{} ({})", label, path))
        .collect::<Vec<_>>()
        .join(" | ");
    format!("{}\n{}\n", APP_TITLE, nav)
}

pub fn footer() -> String {
    format!(
        "(c) 2025 {}. Built with Rust + axum\nGitHub: {}\n",
        APP_TITLE, PROJECT_URL
    )
}

/// Frame a page body with the header and footer.
pub fn layout(body: &str) -> String {
    format!("{}\n{}\n{}", header(), body, footer())
}

//! Calculator page: equation and matrix forms with their last result.
//!
//! Requests that fail leave the previous result in place and set a flat,
//! user-facing error message. The underlying error is logged.

use serde::Serialize;
use tracing::error;

use crate::client::ApiClient;
use crate::types::{EquationPlaceholder, MatrixPlaceholder};

/// Matrix the matrix form starts with.
pub const SAMPLE_MATRIX: [[f64; 2]; 2] = [[2.0, 3.0], [1.0, -1.0]];

/// Operation the matrix form starts with.
pub const DEFAULT_OPERATION: &str = "solve";

pub const EMPTY_EQUATION_MESSAGE: &str = "Please enter an equation";
pub const SOLVE_FAILED_MESSAGE: &str = "Failed to solve equation. Please try again.";
pub const MATRIX_FAILED_MESSAGE: &str = "Failed to perform matrix operation. Please try again.";

const EQUATION_HINT: &str = "Enter equation (e.g., 2x + 3 = 7)";

/// Last successful response shown on the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CalculationResult {
    Equation(EquationPlaceholder),
    Matrix(MatrixPlaceholder),
}

/// State of the calculator page.
#[derive(Debug, Clone)]
pub struct CalculatorPage {
    pub equation: String,
    pub matrix: Vec<Vec<f64>>,
    pub operation: String,
    result: Option<CalculationResult>,
    error: Option<String>,
    loading: bool,
}

impl Default for CalculatorPage {
    fn default() -> Self {
        Self {
            equation: String::new(),
            matrix: SAMPLE_MATRIX.iter().map(|row| row.to_vec()).collect(),
            operation: DEFAULT_OPERATION.to_string(),
            result: None,
            error: None,
            loading: false,
        }
    }
}

impl CalculatorPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_equation(mut self, equation: impl Into<String>) -> Self {
        self.equation = equation.into();
        self
    }

    pub fn with_matrix(mut self, matrix: Vec<Vec<f64>>, operation: impl Into<String>) -> Self {
        self.matrix = matrix;
        self.operation = operation.into();
        self
    }

    pub fn result(&self) -> Option<&CalculationResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Submit the equation form.
    ///
    /// A blank equation sets [`EMPTY_EQUATION_MESSAGE`] without a request.
    pub async fn solve_equation(&mut self, client: &ApiClient) {
        if self.equation.trim().is_empty() {
            self.error = Some(EMPTY_EQUATION_MESSAGE.to_string());
            return;
        }

        self.loading = true;
        self.error = None;

        match client.solve_equation(&self.equation).await {
            Ok(response) => self.result = Some(CalculationResult::Equation(response)),
            Err(e) => {
                error!("Error solving equation: {}", e);
                self.error = Some(SOLVE_FAILED_MESSAGE.to_string());
            }
        }

        self.loading = false;
    }

    /// Submit the matrix form.
    pub async fn perform_matrix_operation(&mut self, client: &ApiClient) {
        self.loading = true;
        self.error = None;

        match client
            .perform_matrix_operation(&self.matrix, &self.operation)
            .await
        {
            Ok(response) => self.result = Some(CalculationResult::Matrix(response)),
            Err(e) => {
                error!("Error with matrix operation: {}", e);
                self.error = Some(MATRIX_FAILED_MESSAGE.to_string());
            }
        }

        self.loading = false;
    }

    pub fn render(&self) -> String {
        let mut out = String::from("Mathematical Calculator\n\n");

        out.push_str("Equation Solver\n");
        if self.equation.is_empty() {
            out.push_str(&format!("  [{}]\n", EQUATION_HINT));
        } else {
            out.push_str(&format!("  [{}]\n", self.equation));
        }
        let solve_label = if self.loading { "Solving..." } else { "Solve Equation" };
        out.push_str(&format!("  <{}>\n\n", solve_label));

        out.push_str("Matrix Operations\n");
        out.push_str(&format!(
            "  Matrix: {}  Operation: {}\n",
            format_matrix(&self.matrix),
            self.operation
        ));
        let matrix_label = if self.loading {
            "Processing..."
        } else {
            "Perform Matrix Operation"
        };
        out.push_str(&format!("  <{}>\n", matrix_label));

        if let Some(error) = &self.error {
            out.push_str(&format!("\nError: {}\n", error));
        }

        if let Some(result) = &self.result {
            let json = serde_json::to_string_pretty(result).unwrap_or_default();
            out.push_str(&format!("\nResult:\n{}\n", json));
        }

        out
    }
}

/// `[[2, 3], [1, -1]]`
fn format_matrix(matrix: &[Vec<f64>]) -> String {
    let rows = matrix
        .iter()
        .map(|row| {
            let cells = row
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            format!("[{}]", cells)
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{}]", rows)
}

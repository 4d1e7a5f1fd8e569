use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("stock symbol must be non-empty")]
    EmptySymbol,

    #[error("market data provider unavailable for {symbol}")]
    ProviderUnavailable {
        symbol: String,
        #[source]
        source: anyhow::Error,
    },

    /// Optional provider field is absent. Components that need it are omitted from the report.
    #[error("missing provider field: {0}")]
    MissingField(&'static str),

    #[error("degenerate input: {field} = {value}")]
    DegenerateInput { field: &'static str, value: f64 },
}

impl AnalysisError {
    /// Message safe to show an end user. Provider detail stays in logs.
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::EmptySymbol => "Enter a stock symbol (for example TCS.NS or AAPL).".to_string(),
            AnalysisError::ProviderUnavailable { .. } => {
                "Market data is currently unavailable for this symbol. Check the symbol and your connection, then try again."
                    .to_string()
            }
            AnalysisError::MissingField(field) => format!("Data not available: {field}."),
            AnalysisError::DegenerateInput { .. } => {
                "The provider did not report a usable current price for this symbol.".to_string()
            }
        }
    }
}

/// Guard for percentage-based derivations.
pub fn require_positive_price(field: &'static str, value: f64) -> Result<f64, AnalysisError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(AnalysisError::DegenerateInput { field, value })
    }
}

use thiserror::Error;

/// Typed failures raised while compiling a chart.
///
/// Library entry points return `anyhow::Result`; callers that need to branch on
/// the failure kind can `downcast_ref::<ChartError>()`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChartError {
    #[error("Unsupported map configuration: must provide either xField and yField for scatter plot or geoField")]
    UnsupportedMapConfiguration,

    #[error("{chart} chart requires a bound {channel} field")]
    MissingField {
        chart: &'static str,
        channel: &'static str,
    },

    #[error("No chart kind fits the schema: at least one numeric or geographic column is required")]
    NoDefaultChart,

    #[error("Invalid input data: {0}")]
    InvalidData(String),

    #[error("Unknown column type '{0}'")]
    UnknownColumnType(String),
}

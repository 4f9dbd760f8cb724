//! Sampling defaults from a model's `parameters` text

/// Sampling defaults a model ships with
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SamplingParams {
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
}

impl SamplingParams {
    /// Parse the newline separated `key value` list returned by `api/show`
    ///
    /// Keys are matched by substring, later lines override earlier ones and
    /// values that are not numbers are ignored.
    pub fn parse(text: &str) -> Self {
        let mut params = Self::default();
        for line in text.lines() {
            let mut fields = line.split_whitespace();
            let (Some(key), Some(value)) = (fields.next(), fields.next()) else {
                continue;
            };
            let Ok(value) = value.trim().parse::<f64>() else {
                continue;
            };
            if key.contains("temperature") {
                params.temperature = Some(value);
            }
            if key.contains("top_p") {
                params.top_p = Some(value);
            }
        }
        params
    }
}

use colored::*;
use gapic_core::{
    client::{CallError, ClientBuildError},
    pager::Page,
    tonic::Status,
};

/// A wrapper struct for a formatted, colored string.
///
/// Implements `Display` so it can be printed directly.
pub struct FormattedString(pub String);

impl std::fmt::Display for FormattedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.0)
    }
}

impl From<serde_json::Value> for FormattedString {
    fn from(value: serde_json::Value) -> Self {
        let pretty = serde_json::to_string_pretty(&value);
        FormattedString(pretty.unwrap_or_else(|_| value.to_string()))
    }
}

impl From<Page<serde_json::Value>> for FormattedString {
    fn from(page: Page<serde_json::Value>) -> Self {
        let token = if page.is_last() {
            "(last page)".dimmed().to_string()
        } else {
            page.next_page_token.green().to_string()
        };

        let mut out = format!(
            "{} {} items, next page token: {}",
            "Page:".cyan().bold(),
            page.items.len(),
            token
        );
        for item in page.items {
            out.push('\n');
            out.push_str(&FormattedString::from(item).0);
        }
        FormattedString(out)
    }
}

impl From<&Status> for FormattedString {
    fn from(status: &Status) -> Self {
        FormattedString(format!(
            "{} code={:?} message={:?}",
            "gRPC Failed:".red().bold(),
            status.code(),
            status.message()
        ))
    }
}

impl From<CallError> for FormattedString {
    fn from(err: CallError) -> Self {
        match err.status() {
            Some(status) => FormattedString::from(status),
            None => FormattedString(format!("{}\n\n'{}'", "Call Failed:".red().bold(), err)),
        }
    }
}

impl From<ClientBuildError> for FormattedString {
    fn from(err: ClientBuildError) -> Self {
        FormattedString(format!(
            "{}\n\n'{}'",
            "Client Construction Failed:".red().bold(),
            err
        ))
    }
}

impl From<anyhow::Error> for FormattedString {
    fn from(err: anyhow::Error) -> Self {
        FormattedString(format!("{}\n\n'{:#}'", "Error:".red().bold(), err))
    }
}

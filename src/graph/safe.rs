//! Downgrade Graph failures into limitation notes
//!
//! Commands pull several unrelated Graph resources; losing one permission must
//! not abort the whole report. [`safe`] turns a failed fetch into a default value
//! plus exactly one human-readable note.

use crate::error::{AiItError, GraphErrorKind, Result};
use serde::{Serialize, Serializer};
use std::future::Future;

/// Notes about data that could not be fetched, in encounter order.
///
/// Each note keeps the kind of failure that produced it. Serializes as the
/// list of note strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Limitations(Vec<(GraphErrorKind, String)>);

impl Limitations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the note for a failed fetch
    pub fn record(&mut self, err: &AiItError) {
        self.0.push((err.kind(), limitation_note(err)));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(_, note)| note.as_str())
    }

    pub fn notes(&self) -> Vec<&str> {
        self.iter().collect()
    }

    /// True if any recorded failure was a 403
    pub fn any_forbidden(&self) -> bool {
        self.0
            .iter()
            .any(|(kind, _)| *kind == GraphErrorKind::Forbidden)
    }
}

impl Serialize for Limitations {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

/// The note recorded for a failed fetch
pub fn limitation_note(err: &AiItError) -> String {
    match err.kind() {
        GraphErrorKind::Forbidden => "Permission-limited: request returned 403".to_string(),
        GraphErrorKind::NotFound => "Not found (404)".to_string(),
        GraphErrorKind::Other => match err.status_code() {
            Some(code) => format!("Error: HTTP {}", code),
            None => "Error: network or auth failure".to_string(),
        },
    }
}

/// Run `fetch`; on failure record one note and return `default`. Never fails.
pub async fn safe<T, F, Fut>(fetch: F, default: T, limitations: &mut Limitations) -> T
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match fetch().await {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(error = %e, kind = ?e.kind(), "Graph call downgraded");
            limitations.record(&e);
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn fails(status: Option<u16>) -> Result<Vec<u32>> {
        Err(AiItError::graph(status, "Microsoft Graph request failed."))
    }

    #[tokio::test]
    async fn test_forbidden_yields_default_and_one_note() {
        let mut limitations = Limitations::new();
        let value = safe(|| fails(Some(403)), vec![7], &mut limitations).await;

        assert_eq!(value, vec![7]);
        assert_eq!(limitations.len(), 1);
        assert!(limitations.notes()[0].starts_with("Permission-limited"));
        assert!(limitations.any_forbidden());
    }

    #[tokio::test]
    async fn test_not_found_note() {
        let mut limitations = Limitations::new();
        let value = safe(|| fails(Some(404)), Vec::new(), &mut limitations).await;

        assert!(value.is_empty());
        assert_eq!(limitations.notes(), ["Not found (404)"]);
    }

    #[tokio::test]
    async fn test_other_status_and_no_status_notes() {
        let mut limitations = Limitations::new();
        safe(|| fails(Some(500)), Vec::new(), &mut limitations).await;
        safe(|| fails(None), Vec::new(), &mut limitations).await;
        safe(
            || async { Err::<Vec<u32>, _>(AiItError::AuthError("Failed to acquire Microsoft Graph token.".into())) },
            Vec::new(),
            &mut limitations,
        )
        .await;

        assert_eq!(
            limitations.notes(),
            [
                "Error: HTTP 500",
                "Error: network or auth failure",
                "Error: network or auth failure",
            ]
        );
        assert!(!limitations.any_forbidden());
    }

    #[tokio::test]
    async fn test_success_passes_value_through_without_notes() {
        let mut limitations = Limitations::new();
        let value = safe(|| async { Ok(vec![1, 2, 3]) }, Vec::new(), &mut limitations).await;

        assert_eq!(value, vec![1, 2, 3]);
        assert!(limitations.is_empty());
    }

    #[tokio::test]
    async fn test_notes_keep_order_and_duplicates() {
        let mut limitations = Limitations::new();
        safe(|| fails(Some(403)), Vec::new(), &mut limitations).await;
        safe(|| fails(Some(404)), Vec::new(), &mut limitations).await;
        safe(|| fails(Some(403)), Vec::new(), &mut limitations).await;

        assert_eq!(
            limitations.notes(),
            [
                "Permission-limited: request returned 403",
                "Not found (404)",
                "Permission-limited: request returned 403",
            ]
        );
    }

    #[tokio::test]
    async fn test_forbidden_is_tracked_by_kind_not_note_text() {
        let mut limitations = Limitations::new();
        safe(|| fails(Some(4031)), Vec::new(), &mut limitations).await;

        assert_eq!(limitations.notes(), ["Error: HTTP 4031"]);
        assert!(!limitations.any_forbidden());

        safe(|| fails(Some(403)), Vec::new(), &mut limitations).await;
        assert!(limitations.any_forbidden());
    }

    #[test]
    fn test_serializes_as_note_list() {
        let mut limitations = Limitations::new();
        limitations.record(&AiItError::graph(Some(404), "gone"));
        assert_eq!(
            serde_json::to_value(&limitations).unwrap(),
            serde_json::json!(["Not found (404)"])
        );
    }
}

//! Assembles a complete record set from consecutive pages.
//!
//! Pages are requested strictly in order through [`Session::execute`], so each
//! one is paced by the rate governor and retried under the session's policy.
//! Records are not deduplicated: if the upstream shifts rows between pages
//! while a long fetch runs, the same record can appear twice. Callers that
//! care must dedupe by their own key.

use log::{debug, info, warn};

use super::error::ApiError;
use super::outcome::Record;
use super::transport::RequestDescriptor;
use crate::session::Session;

/// Records requested per page unless told otherwise.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Page ceiling guarding against an upstream that never returns a short page.
pub const DEFAULT_MAX_PAGES: u32 = 1000;

/// Fetches every record at `path` matching `params`.
///
/// Continues while pages come back full, or while the reported total has not
/// been reached (the upstream may cap the page size below `page_size`).
/// Stops on an empty page, or on a short page when no total is reported.
#[tracing::instrument(skip(session, params))]
pub async fn fetch_all(
    session: &Session,
    path: &str,
    params: &[(String, String)],
    page_size: u32,
) -> Result<Vec<Record>, ApiError> {
    let page_size = page_size.max(1);
    let max_pages = session.options().max_pages;
    let mut records: Vec<Record> = Vec::new();
    let mut page_number = 1;

    loop {
        if page_number > max_pages {
            return Err(ApiError::PaginationBoundExceeded {
                max_pages,
                records: records.len(),
            });
        }
        session.check_cancelled()?;

        debug!("Fetching page {} from {}...", page_number, path);
        let request =
            RequestDescriptor::new(path, params.to_vec()).with_page(page_number, page_size);
        let page = session.execute(&request).await?;

        let total = page.meta.reported_total();
        let batch = page.into_records()?;
        let returned = batch.len();
        records.extend(batch);
        let fetched = records.len() as u64;

        if returned == 0 {
            if let Some(expected) = total {
                if fetched < expected {
                    return Err(ApiError::IncompleteResult {
                        expected,
                        received: records.len(),
                    });
                }
            }
            break;
        }

        match total {
            Some(expected) if fetched >= expected => {
                if fetched > expected {
                    warn!(
                        "{}: fetched {} records but the API reported {}; pages may overlap",
                        path, fetched, expected
                    );
                }
                break;
            }
            Some(_) => {}
            None if returned < page_size as usize => break,
            None => {}
        }

        page_number += 1;
    }

    info!("Retrieved {} total records from {}", records.len(), path);
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionOptions;
    use crate::http::outcome::Outcome;
    use crate::test_utils::{ScriptedTransport, full_page, page_of, session_with};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_short_last_page_ends_fetch() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Outcome::Success(full_page(100, None)),
            Outcome::Success(full_page(100, None)),
            Outcome::Success(full_page(100, None)),
            Outcome::Success(full_page(40, None)),
        ]));
        let session = session_with(transport.clone(), SessionOptions::default());

        let records = fetch_all(&session, "/saleList", &[], 100).await.unwrap();

        assert_eq!(records.len(), 340);
        assert_eq!(transport.calls(), 4);
        assert_eq!(transport.pages(), vec![1, 2, 3, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reported_total_ends_fetch() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Outcome::Success(full_page(100, Some(340))),
            Outcome::Success(full_page(100, Some(340))),
            Outcome::Success(full_page(100, Some(340))),
            Outcome::Success(full_page(40, Some(340))),
        ]));
        let session = session_with(transport.clone(), SessionOptions::default());

        let records = fetch_all(&session, "/saleList", &[], 100).await.unwrap();

        assert_eq!(records.len(), 340);
        assert_eq!(transport.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exact_multiple_with_total_stops_without_extra_call() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Outcome::Success(full_page(100, Some(200))),
            Outcome::Success(full_page(100, Some(200))),
        ]));
        let session = session_with(transport.clone(), SessionOptions::default());

        let records = fetch_all(&session, "/purchaseList", &[], 100).await.unwrap();

        assert_eq!(records.len(), 200);
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exact_multiple_without_total_reads_empty_page() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Outcome::Success(full_page(100, None)),
            Outcome::Success(page_of(json!([]))),
        ]));
        let session = session_with(transport.clone(), SessionOptions::default());

        let records = fetch_all(&session, "/ref/location", &[], 100).await.unwrap();

        assert_eq!(records.len(), 100);
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_capped_page_size_continues_until_total() {
        // Upstream serves 50 per page although 100 were requested
        let transport = Arc::new(ScriptedTransport::new(vec![
            Outcome::Success(full_page(50, Some(120))),
            Outcome::Success(full_page(50, Some(120))),
            Outcome::Success(full_page(20, Some(120))),
        ]));
        let session = session_with(transport.clone(), SessionOptions::default());

        let records = fetch_all(&session, "/product", &[], 100).await.unwrap();

        assert_eq!(records.len(), 120);
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_rows_are_reported() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Outcome::Success(full_page(100, Some(250))),
            Outcome::Success(full_page(30, Some(250))),
            Outcome::Success(full_page(0, Some(250))),
        ]));
        let session = session_with(transport.clone(), SessionOptions::default());

        let err = fetch_all(&session, "/saleList", &[], 100).await.unwrap_err();

        assert_eq!(
            err,
            ApiError::IncompleteResult {
                expected: 250,
                received: 130
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_ending_pages_hit_the_ceiling() {
        let transport = Arc::new(ScriptedTransport::repeating(Outcome::Success(full_page(
            100, None,
        ))));
        let session = session_with(
            transport.clone(),
            SessionOptions::default().with_max_pages(5),
        );

        let err = fetch_all(&session, "/saleList", &[], 100).await.unwrap_err();

        assert_eq!(
            err,
            ApiError::PaginationBoundExceeded {
                max_pages: 5,
                records: 500
            }
        );
        assert_eq!(transport.calls(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_total_with_rows_is_treated_as_unreported() {
        let transport = Arc::new(ScriptedTransport::new(vec![Outcome::Success(full_page(
            7,
            Some(0),
        ))]));
        let session = session_with(transport.clone(), SessionOptions::default());

        let records = fetch_all(&session, "/customer", &[], 100).await.unwrap();
        assert_eq!(records.len(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlap_is_returned_as_is() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Outcome::Success(full_page(100, Some(150))),
            Outcome::Success(full_page(100, Some(150))),
        ]));
        let session = session_with(transport.clone(), SessionOptions::default());

        let records = fetch_all(&session, "/saleList", &[], 100).await.unwrap();
        assert_eq!(records.len(), 200);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_page_aborts_fetch() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Outcome::Success(full_page(100, None)),
            Outcome::fatal(ApiError::InvalidParameters("bad".into())),
        ]));
        let session = session_with(transport.clone(), SessionOptions::default());

        let err = fetch_all(&session, "/saleList", &[], 100).await.unwrap_err();

        assert_eq!(err, ApiError::InvalidParameters("bad".into()));
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_filters_are_sent_on_every_page() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Outcome::Success(full_page(10, None)),
            Outcome::Success(full_page(3, None)),
        ]));
        let session = session_with(transport.clone(), SessionOptions::default());
        let params = vec![("Status".to_string(), "DRAFT".to_string())];

        fetch_all(&session, "/stockTransferList", &params, 10)
            .await
            .unwrap();

        for request in transport.requests() {
            assert_eq!(request.params(), params.as_slice());
            assert_eq!(request.paging().map(|p| p.limit), Some(10));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_between_pages() {
        let transport = Arc::new(ScriptedTransport::repeating(Outcome::Success(full_page(
            100, None,
        ))));
        let session = Arc::new(session_with(transport.clone(), SessionOptions::default()));
        let token = session.cancellation_token();

        let task = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { fetch_all(&session, "/saleList", &[], 100).await })
        };

        // Let a few governed pages go through, then stop
        tokio::time::sleep(std::time::Duration::from_millis(2500)).await;
        token.cancel();

        let err = task.await.unwrap().unwrap_err();
        assert_eq!(err, ApiError::Cancelled);
        assert!(transport.calls() >= 2 && transport.calls() <= 4);
    }
}

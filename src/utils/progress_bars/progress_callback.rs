// src/utils/progress_bars/progress_callback.rs - Progress callbacks for matching runs

use log::debug;
use std::sync::Arc;

/// Type alias for progress callback functions
/// Takes phase name and optional detailed progress information
pub type ProgressCallback = Arc<dyn Fn(String, Option<String>) + Send + Sync>;

/// Callback that only writes progress to the debug log
pub fn create_logging_callback(label: &str) -> ProgressCallback {
    let label = label.to_string();
    Arc::new(move |phase: String, details: Option<String>| {
        let detail_str = details.map(|d| format!(" - {}", d)).unwrap_or_default();
        debug!("[{}] Progress: {}{}", label, phase, detail_str);
    })
}

/// Convenience macro for reporting a phase change
#[macro_export]
macro_rules! update_progress {
    ($callback:expr, $phase:expr) => {
        if let Some(ref cb) = $callback {
            cb($phase.to_string(), None);
        }
    };
    ($callback:expr, $phase:expr, $details:expr) => {
        if let Some(ref cb) = $callback {
            cb($phase.to_string(), Some($details.to_string()));
        }
    };
}

/// Convenience macro for reporting `current/total` progress
#[macro_export]
macro_rules! update_detailed_progress {
    ($callback:expr, $phase:expr, $current:expr, $total:expr) => {
        if let Some(ref cb) = $callback {
            let details = format!("{}/{}", $current, $total);
            cb($phase.to_string(), Some(details));
        }
    };
    ($callback:expr, $phase:expr, $current:expr, $total:expr, $extra:expr) => {
        if let Some(ref cb) = $callback {
            let details = format!("{}/{} ({})", $current, $total, $extra);
            cb($phase.to_string(), Some(details));
        }
    };
}

/// Parse the `current/total` details produced by [`update_detailed_progress!`]
pub fn parse_counts(details: &str) -> Option<(u64, u64)> {
    let counts = details.split_whitespace().next()?;
    let (current, total) = counts.split_once('/')?;
    Some((current.parse().ok()?, total.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[test]
    fn test_progress_macros() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let last_details = Arc::new(Mutex::new(None));
        let call_count_clone = Arc::clone(&call_count);
        let last_details_clone = Arc::clone(&last_details);

        let callback: Option<ProgressCallback> =
            Some(Arc::new(move |_phase: String, details: Option<String>| {
                call_count_clone.fetch_add(1, Ordering::SeqCst);
                *last_details_clone.lock().unwrap() = details;
            }));

        update_progress!(callback, "Indexing document");
        update_progress!(callback, "Indexing document", "12 tokens");
        update_detailed_progress!(callback, "Matching clients", 3, 10);
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
        assert_eq!(last_details.lock().unwrap().as_deref(), Some("3/10"));

        update_detailed_progress!(callback, "Matching clients", 4, 10, "2 found");
        assert_eq!(last_details.lock().unwrap().as_deref(), Some("4/10 (2 found)"));
    }

    #[test]
    fn test_macros_ignore_missing_callback() {
        let callback: Option<ProgressCallback> = None;
        update_progress!(callback, "Nothing");
        update_detailed_progress!(callback, "Nothing", 1, 2);
    }

    #[test]
    fn test_logging_callback_creation() {
        let callback = create_logging_callback("CLIENTS");
        callback("TestPhase".to_string(), Some("TestDetails".to_string()));
        callback("TestPhase2".to_string(), None);
    }

    #[test]
    fn test_parse_counts() {
        assert_eq!(parse_counts("3/10"), Some((3, 10)));
        assert_eq!(parse_counts("4/10 (2 found)"), Some((4, 10)));
        assert_eq!(parse_counts("loading"), None);
    }
}

/// Container for [`crate::SyncDb`] metrics.
#[derive(Debug, Clone)]
pub(crate) struct Metrics;

impl Metrics {
    pub(crate) const STORAGE_REQUESTS_SUCCESS_TOTAL: &'static str =
        "chainsync_storage_success_total";
    pub(crate) const STORAGE_REQUESTS_ERROR_TOTAL: &'static str = "chainsync_storage_error_total";
    pub(crate) const STORAGE_REQUEST_DURATION_SECONDS: &'static str =
        "chainsync_storage_duration_seconds";

    pub(crate) const STORAGE_TABLE_SIZE: &'static str = "chainsync_storage.table_size";
    pub(crate) const STORAGE_TABLE_PAGES: &'static str = "chainsync_storage.table_pages";
    pub(crate) const STORAGE_TABLE_ENTRIES: &'static str = "chainsync_storage.table_entries";

    pub(crate) const STORAGE_METHOD_INSERT_LOG_FILTER_INTERVAL: &'static str =
        "insert_log_filter_interval";
    pub(crate) const STORAGE_METHOD_GET_LOG_FILTER_INTERVALS: &'static str =
        "get_log_filter_intervals";
    pub(crate) const STORAGE_METHOD_INSERT_FACTORY_CHILD_ADDRESS_LOGS: &'static str =
        "insert_factory_child_address_logs";
    pub(crate) const STORAGE_METHOD_GET_FACTORY_CHILD_ADDRESSES: &'static str =
        "get_factory_child_addresses";
    pub(crate) const STORAGE_METHOD_INSERT_FACTORY_LOG_FILTER_INTERVAL: &'static str =
        "insert_factory_log_filter_interval";
    pub(crate) const STORAGE_METHOD_GET_FACTORY_LOG_FILTER_INTERVALS: &'static str =
        "get_factory_log_filter_intervals";
    pub(crate) const STORAGE_METHOD_INSERT_REALTIME_BLOCK: &'static str = "insert_realtime_block";
    pub(crate) const STORAGE_METHOD_INSERT_REALTIME_INTERVAL: &'static str =
        "insert_realtime_interval";
    pub(crate) const STORAGE_METHOD_RECORD_INTERVAL: &'static str = "record_interval";
    pub(crate) const STORAGE_METHOD_QUERY_COVERAGE: &'static str = "query_coverage";
    pub(crate) const STORAGE_METHOD_DELETE_REALTIME_DATA: &'static str = "delete_realtime_data";
    pub(crate) const STORAGE_METHOD_INSERT_RPC_REQUEST_RESULT: &'static str =
        "insert_rpc_request_result";
    pub(crate) const STORAGE_METHOD_GET_RPC_REQUEST_RESULT: &'static str =
        "get_rpc_request_result";
    pub(crate) const STORAGE_METHOD_GET_LOG_EVENTS: &'static str = "get_log_events";
    pub(crate) const STORAGE_METHOD_GET_BLOCK: &'static str = "get_block";
    pub(crate) const STORAGE_METHOD_GET_TRANSACTION: &'static str = "get_transaction";
    pub(crate) const STORAGE_METHOD_GET_LOGS: &'static str = "get_logs";

    const METHODS: [&'static str; 17] = [
        Self::STORAGE_METHOD_INSERT_LOG_FILTER_INTERVAL,
        Self::STORAGE_METHOD_GET_LOG_FILTER_INTERVALS,
        Self::STORAGE_METHOD_INSERT_FACTORY_CHILD_ADDRESS_LOGS,
        Self::STORAGE_METHOD_GET_FACTORY_CHILD_ADDRESSES,
        Self::STORAGE_METHOD_INSERT_FACTORY_LOG_FILTER_INTERVAL,
        Self::STORAGE_METHOD_GET_FACTORY_LOG_FILTER_INTERVALS,
        Self::STORAGE_METHOD_INSERT_REALTIME_BLOCK,
        Self::STORAGE_METHOD_INSERT_REALTIME_INTERVAL,
        Self::STORAGE_METHOD_RECORD_INTERVAL,
        Self::STORAGE_METHOD_QUERY_COVERAGE,
        Self::STORAGE_METHOD_DELETE_REALTIME_DATA,
        Self::STORAGE_METHOD_INSERT_RPC_REQUEST_RESULT,
        Self::STORAGE_METHOD_GET_RPC_REQUEST_RESULT,
        Self::STORAGE_METHOD_GET_LOG_EVENTS,
        Self::STORAGE_METHOD_GET_BLOCK,
        Self::STORAGE_METHOD_GET_TRANSACTION,
        Self::STORAGE_METHOD_GET_LOGS,
    ];

    pub(crate) fn init() {
        Self::describe();
        Self::zero();
    }

    fn describe() {
        metrics::describe_counter!(
            Self::STORAGE_REQUESTS_SUCCESS_TOTAL,
            metrics::Unit::Count,
            "Total number of successful sync store requests"
        );
        metrics::describe_counter!(
            Self::STORAGE_REQUESTS_ERROR_TOTAL,
            metrics::Unit::Count,
            "Total number of failed sync store requests"
        );
        metrics::describe_histogram!(
            Self::STORAGE_REQUEST_DURATION_SECONDS,
            metrics::Unit::Seconds,
            "Duration of sync store requests"
        );
        metrics::describe_gauge!(
            Self::STORAGE_TABLE_SIZE,
            metrics::Unit::Bytes,
            "Size of each sync store table"
        );
        metrics::describe_gauge!(
            Self::STORAGE_TABLE_PAGES,
            metrics::Unit::Count,
            "Number of pages per sync store table and page type"
        );
        metrics::describe_gauge!(
            Self::STORAGE_TABLE_ENTRIES,
            metrics::Unit::Count,
            "Number of entries per sync store table"
        );
    }

    fn zero_storage_methods(method_name: &'static str) {
        metrics::counter!(Self::STORAGE_REQUESTS_SUCCESS_TOTAL, "method" => method_name)
            .increment(0);
        metrics::counter!(Self::STORAGE_REQUESTS_ERROR_TOTAL, "method" => method_name)
            .increment(0);
        metrics::histogram!(Self::STORAGE_REQUEST_DURATION_SECONDS, "method" => method_name)
            .record(0.0);
    }

    fn zero() {
        for method in Self::METHODS {
            Self::zero_storage_methods(method);
        }
    }
}

/// Observes a fallible call and records success/error counters and its duration.
macro_rules! observe_metrics_for_result {
    (
        $success_metric:expr,
        $error_metric:expr,
        $duration_metric:expr,
        $method_name:expr,
        $block:expr $(, $tag_key:expr => $tag_val:expr )*
    ) => {{
        let start_time = std::time::Instant::now();
        let result = $block;
        let duration = start_time.elapsed().as_secs_f64();

        if result.is_ok() {
            metrics::counter!(
                $success_metric,
                "method" => $method_name
                $(, $tag_key => $tag_val )*
            ).increment(1);
        } else {
            metrics::counter!(
                $error_metric,
                "method" => $method_name
                $(, $tag_key => $tag_val )*
            ).increment(1);
        }

        metrics::histogram!(
            $duration_metric,
            "method" => $method_name
            $(, $tag_key => $tag_val )*
        ).record(duration);

        result
    }};
}
pub(crate) use observe_metrics_for_result;

/// Defines a contract for types that can report metrics.
pub trait MetricsReporter {
    /// Reports metrics for the implementing type.
    ///
    /// Intended to be called periodically; values are published as gauges.
    fn report_metrics(&self);
}

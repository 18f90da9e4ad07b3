//! Tracing utilities for build observability.
//!
//! Enable the `tracing` feature to emit events via the `tracing` crate.
//! These macros no-op when the feature is disabled, avoiding `#[cfg]` boilerplate
//! at every call site.

/// Emit a debug-level event when a pipeline step starts for a resource.
///
/// ```ignore
/// relmodel_trace_step!("derive_columns", &resource_label);
/// ```
#[macro_export]
macro_rules! relmodel_trace_step {
    ($step:literal, $resource:expr) => {
        #[cfg(feature = "tracing")]
        ::tracing::debug!(step = $step, resource = %$resource, "relmodel.step");
    };
}

/// Emit a trace-level event for every derived table.
///
/// ```ignore
/// relmodel_trace_table!(&table_name, &json_scope);
/// ```
#[macro_export]
macro_rules! relmodel_trace_table {
    ($table:expr, $scope:expr) => {
        #[cfg(feature = "tracing")]
        ::tracing::trace!(table = %$table, scope = %$scope, "relmodel.table");
    };
}

/// Emit a warn-level event when a resource fails to build.
///
/// ```ignore
/// relmodel_trace_failure!(&endpoint, &err);
/// ```
#[macro_export]
macro_rules! relmodel_trace_failure {
    ($resource:expr, $error:expr) => {
        #[cfg(feature = "tracing")]
        ::tracing::warn!(resource = %$resource, error = %$error, "relmodel.failure");
    };
}

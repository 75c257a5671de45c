//! Shared primitive types used across the pipeline.

/// Identifier of an alert row.
pub type AlertId = String;

/// Identifier of a customer; the join key between all three tables.
pub type CustomerId = String;

/// Label class value as read from `priority_flag`.
pub type LabelClass = i64;

// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Order state model and the rules for creating and moving orders through
// their lifecycle. Storage, HTTP and scheduling are layered on top.
//
// ============================================================================

pub mod order;

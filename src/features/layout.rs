//! Feature Layout - Canonical encoded column order
//!
//! Models are trained against this exact order. Columns that cannot be
//! derived for a batch are dropped, never zero-filled, so the surviving
//! columns always appear in this relative order.

// ============================================================================
// FEATURE LAYOUT (Authoritative source)
// ============================================================================

/// Encoded feature names in output order
pub const FEATURE_LAYOUT: &[&str] = &[
    // === Categorical risk scores (0-4) ===
    "Airline",          // 0: carrier code
    "Origin",           // 1: origin airport
    "Dest",             // 2: destination airport
    "Route",            // 3: "{Origin}_{Dest}"
    "Hub_Airline",      // 4: "{Airline}_{Origin}"

    // === Calendar (5-7) ===
    "Month_cos",        // 5: month risk, keyed by integer month
    "DayofMonth_cos",   // 6: day risk, keyed by integer day
    "Is_Winter",        // 7: winter flag risk, keyed by month

    // === Interactions (8) ===
    "Hub_x_Dest",       // 8: "{Hub_Airline}_{Dest}"

    // === Outcome passthrough (9) ===
    "Cancelled",        // 9
];

/// Total number of encodable features
pub const FEATURE_COUNT: usize = 10;

// Slot indices into FEATURE_LAYOUT
pub const AIRLINE: usize = 0;
pub const ORIGIN: usize = 1;
pub const DEST: usize = 2;
pub const ROUTE: usize = 3;
pub const HUB_AIRLINE: usize = 4;
pub const MONTH_COS: usize = 5;
pub const DAY_OF_MONTH_COS: usize = 6;
pub const IS_WINTER: usize = 7;
pub const HUB_X_DEST: usize = 8;
pub const CANCELLED: usize = 9;

// ============================================================================
// RAW INPUT COLUMNS
// ============================================================================

pub const RAW_AIRLINE: &str = "Airline";
pub const RAW_ORIGIN: &str = "Origin";
pub const RAW_DEST: &str = "Dest";
pub const RAW_MONTH: &str = "Month";
pub const RAW_DAY_OF_MONTH: &str = "DayofMonth";
pub const RAW_FLIGHT_DATE: &str = "FlightDate";
pub const RAW_CANCELLED: &str = "Cancelled";

// ============================================================================
// FEATURE NAME LOOKUP
// ============================================================================

/// Get feature name by index
pub fn feature_name(index: usize) -> Option<&'static str> {
    FEATURE_LAYOUT.get(index).copied()
}

// ============================================================================
// TESTS
// ============================================================================

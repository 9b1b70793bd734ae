//! Application constants
//!
//! Centralized location for magic strings and configuration defaults.

/// Host used when the loaded document declares none
pub const DEFAULT_API_HOST: &str = "api.foodoscope.com";

/// Scheme used when the loaded document declares none
pub const DEFAULT_SCHEME: &str = "http";

/// Path of the profile endpoint on the API host
pub const PROFILE_PATH: &str = "/user/profile";

/// Statistics substituted when no source in the precedence chain matches
pub const FALLBACK_MIN: f64 = 0.0;
pub const FALLBACK_MAX: f64 = 100.0;
pub const FALLBACK_AVG: f64 = 50.0;
pub const FALLBACK_MEAN: f64 = 50.0;
pub const FALLBACK_STD_DEV: f64 = 25.0;

/// Upper bound for the energy dual slider when its pair has no statistics.
/// Applied by the form renderer only, never by the statistics resolver.
pub const ENERGY_FALLBACK_MAX: f64 = 3_440_456.64;

/// Fixed bounds for the calories_per_day control
pub const CALORIES_MIN: f64 = 0.0;
pub const CALORIES_MAX: f64 = 612_854.6;

/// Default upper value for calories_per_day when the max scratch field is blank
pub const CALORIES_DEFAULT_MAX: f64 = 2000.0;

/// Scratch keys backing the calories_per_day control
pub const CALORIES_MIN_KEY: &str = "minCalories";
pub const CALORIES_MAX_KEY: &str = "maxCalories";

/// Bounds and default for the limit / page_size slider
pub const LIMIT_SLIDER_MIN: i64 = 1;
pub const LIMIT_SLIDER_MAX: i64 = 10;
pub const LIMIT_SLIDER_DEFAULT: i64 = 10;

/// Maximum decimal places shown on continuous slider steps
pub const SLIDER_MAX_PRECISION: usize = 4;

/// Delay before the post-success profile refresh
pub const PROFILE_REFRESH_DELAY_MS: u64 = 1000;

/// Tag bucket for endpoints without one
pub const UNTAGGED_GROUP: &str = "other";

/// Application name
pub const APP_NAME: &str = "Palate TUI";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

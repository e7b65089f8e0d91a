//! Platform-agnostic types for the hwscope hardware monitor.
//!
//! This crate provides the shared value types used by the monitoring core
//! (`hwscope-core`) and its front-ends.
//!
//! # Features
//!
//! - Hardware and sensor classification ([`HardwareType`], [`SensorType`])
//! - Plot colors and the default palette ([`Rgb`], [`DEFAULT_PALETTE`])
//! - The fixed sets of refresh and logging intervals
//! - Error types for parsing these values from text
//!
//! # Example
//!
//! ```
//! use hwscope_types::{Rgb, SensorType, UpdateInterval, DEFAULT_PALETTE};
//!
//! let pen: Rgb = "#1E90FF".parse().unwrap();
//! assert_eq!(pen.to_string(), "#1E90FF");
//! assert_eq!(DEFAULT_PALETTE[0], Rgb::BLUE);
//! assert_eq!(SensorType::Power.format_value(65.0), "65.0 W");
//! assert_eq!(UpdateInterval::default().label(), "1s");
//! ```

pub mod color;
pub mod error;
pub mod types;

pub use color::{DEFAULT_PALETTE, Rgb};
pub use error::{ParseError, ParseResult};
pub use types::{HardwareType, LoggingInterval, SensorType, UpdateInterval};

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    proptest! {
        /// Any color survives a display/parse cycle.
        #[test]
        fn rgb_display_parses_back(r: u8, g: u8, b: u8) {
            let color = Rgb::new(r, g, b);
            prop_assert_eq!(color.to_string().parse::<Rgb>(), Ok(color));
        }

        /// Parsing arbitrary text never panics.
        #[test]
        fn rgb_parse_never_panics(s in "\\PC*") {
            let _ = s.parse::<Rgb>();
        }

        /// Interval parsing never panics and only accepts known labels.
        #[test]
        fn interval_parse_is_closed(s in "[0-9]{1,3}(ms|s|m|h)") {
            if let Ok(interval) = s.parse::<UpdateInterval>() {
                prop_assert!(UpdateInterval::ALL.contains(&interval));
            }
        }
    }
}

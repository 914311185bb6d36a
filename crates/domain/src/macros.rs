//! Display/FromStr conversions for string-backed enums
//!
//! Statuses, modes and roles are stored as lowercase strings in SQLite and
//! travel as strings over the API. The macro keeps the two directions in
//! one table.
//!
//! # Example
//!
//! ```rust
//! use kimai_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum TrackingMode {
//!     Default,
//!     Punch,
//! }
//!
//! impl_domain_status_conversions!(TrackingMode {
//!     Default => "default",
//!     Punch => "punch",
//! });
//!
//! assert_eq!("PUNCH".parse::<TrackingMode>().unwrap(), TrackingMode::Punch);
//! ```

/// Implements Display and case-insensitive FromStr for a fieldless enum.
///
/// Parsing failures produce `"Invalid {Enum}: {input}"`.
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Lowercase storage representation.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}

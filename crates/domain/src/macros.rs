//! Macro for implementing Display and FromStr for closed enums
//!
//! Used for the taxonomy kinds and HTTP methods so that the string form
//! printed in logs is the same one accepted from configuration.
//!
//! # Example
//!
//! ```rust
//! use adflow_domain::impl_domain_enum_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Direction {
//!     Asc,
//!     Desc,
//! }
//!
//! impl_domain_enum_conversions!(Direction {
//!     Asc => "asc",
//!     Desc => "desc",
//! });
//!
//! assert_eq!(Direction::Asc.to_string(), "asc");
//! assert_eq!("DESC".parse::<Direction>().unwrap(), Direction::Desc);
//! ```

/// Implements Display and FromStr for an enum from a variant/string table.
///
/// Display writes the string exactly as given. FromStr compares ASCII
/// case-insensitively, so tables may use upper-case (`"GET"`) or lower-case
/// (`"countries"`) spellings.
#[macro_export]
macro_rules! impl_domain_enum_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                $(
                    if s.eq_ignore_ascii_case($str) {
                        return Ok(Self::$variant);
                    }
                )+
                Err(format!("Invalid {}: {}", stringify!($enum_name), s))
            }
        }
    };
}

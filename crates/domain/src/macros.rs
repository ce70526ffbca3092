//! Macro for implementing Display and FromStr for string-backed enums
//!
//! Generates both conversions from a single variant table so the textual
//! form used in logs, config files and environment variables stays in sync.
//!
//! # Example
//!
//! ```rust
//! use restcollector_domain::impl_domain_str_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Verb {
//!     Get,
//!     Post,
//! }
//!
//! impl_domain_str_conversions!(Verb {
//!     Get => "GET",
//!     Post => "POST",
//! });
//!
//! assert_eq!(Verb::Post.to_string(), "POST");
//! assert_eq!("get".parse::<Verb>().unwrap(), Verb::Get);
//! ```

/// Implements Display and FromStr traits for string-backed enums
///
/// - Display writes the mapped string verbatim
/// - FromStr matches ASCII case-insensitively
/// - Parse errors name the enum type
#[macro_export]
macro_rules! impl_domain_str_conversions {
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

            fn from_str(s: &str) -> Result<Self, Self::Err> {
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

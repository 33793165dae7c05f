//! Macros for declaring state and event enums.

/// Declare a fieldless enum usable as a state identity.
///
/// Derives the traits a [`StateId`](crate::core::StateId) needs and names
/// each state after its variant.
///
/// # Example
///
/// ```
/// use hfsm::core::StateId;
/// use hfsm::state_enum;
///
/// state_enum! {
///     pub enum Light {
///         Operating,
///         Red,
///         Green,
///     }
/// }
///
/// assert_eq!(Light::Green.name(), "Green");
/// ```
#[macro_export]
macro_rules! state_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $crate::core::StateId for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }
        }
    };
}

/// Declare a fieldless enum usable as an event identity.
///
/// ```
/// use hfsm::event_enum;
///
/// event_enum! {
///     pub enum Signal {
///         Go,
///         Stop,
///     }
/// }
///
/// assert_ne!(Signal::Go, Signal::Stop);
/// ```
#[macro_export]
macro_rules! event_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }
    };
}

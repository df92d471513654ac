//! Common utilities for the checkout orchestration crates

/// Masking primitives for values that must never appear in logs or debug
/// output (client tokens, credential references, server nonces).
pub mod masking {
    use std::{fmt, marker::PhantomData};

    use serde::{Deserialize, Serialize};

    /// Strategy deciding how a masked value is rendered in debug output.
    pub trait Strategy<T> {
        fn fmt(val: &T, f: &mut fmt::Formatter<'_>) -> fmt::Result;
    }

    /// Default strategy: render only the type name of the inner value.
    pub struct WithType;

    impl<T> Strategy<T> for WithType {
        fn fmt(_val: &T, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "*** {} ***", std::any::type_name::<T>())
        }
    }

    /// A wrapper preventing accidental exposure of the inner value. The
    /// value can only be reached through [`PeekInterface`] or
    /// [`ExposeInterface`], which keeps access points grep-able.
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct Secret<T, S = WithType>(T, #[serde(skip)] PhantomData<S>);

    impl<T, S> Secret<T, S> {
        pub fn new(value: T) -> Self {
            Self(value, PhantomData)
        }
    }

    // The strategy parameter is a marker type; these impls bound the
    // inner value only.
    impl<T: Clone, S> Clone for Secret<T, S> {
        fn clone(&self) -> Self {
            Self::new(self.0.clone())
        }
    }

    impl<T: PartialEq, S> PartialEq for Secret<T, S> {
        fn eq(&self, other: &Self) -> bool {
            self.0 == other.0
        }
    }

    impl<T: Eq, S> Eq for Secret<T, S> {}

    impl<T: std::hash::Hash, S> std::hash::Hash for Secret<T, S> {
        fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
            self.0.hash(state);
        }
    }

    impl<T, S: Strategy<T>> fmt::Debug for Secret<T, S> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            S::fmt(&self.0, f)
        }
    }

    impl<T: Default, S> Default for Secret<T, S> {
        fn default() -> Self {
            Self::new(T::default())
        }
    }

    impl<T, S> From<T> for Secret<T, S> {
        fn from(value: T) -> Self {
            Self::new(value)
        }
    }

    /// Borrow the inner value without consuming the secret.
    pub trait PeekInterface<T> {
        fn peek(&self) -> &T;
    }

    impl<T, S> PeekInterface<T> for Secret<T, S> {
        fn peek(&self) -> &T {
            &self.0
        }
    }

    /// Consume the secret and hand out the inner value.
    pub trait ExposeInterface<T> {
        fn expose(self) -> T;
    }

    impl<T, S> ExposeInterface<T> for Secret<T, S> {
        fn expose(self) -> T {
            self.0
        }
    }

}

pub mod consts;
pub mod errors;
pub mod ext_traits;
pub mod request;
pub mod types;

pub use errors::{CustomResult, ParsingError, ValidationError};
pub use masking::{ExposeInterface, PeekInterface, Secret};
pub use request::{Method, Request, RequestContent};
pub use types::{AmountConvertor, Currency, MinorUnit, StringMajorUnit, StringMajorUnitForCore};

/// A `serde_json::Value` that is masked in debug output.
pub type SecretSerdeValue = Secret<serde_json::Value>;

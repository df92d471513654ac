//! Typed hosted-field events.
//!
//! The SDK reports field activity through string-keyed callbacks; this is
//! the typed form those callbacks take before anything downstream sees
//! them.

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "camelCase")]
pub enum FieldKind {
    Number,
    ExpirationDate,
    Cvv,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldEvent {
    Focus {
        field: FieldKind,
    },
    Blur {
        field: FieldKind,
        is_empty: bool,
    },
    Empty {
        field: FieldKind,
    },
    NotEmpty {
        field: FieldKind,
    },
    /// The SDK narrowed the possible card types for the number field.
    /// An empty candidate list means the input matches no known type.
    CardTypeChange {
        candidates: Vec<String>,
    },
}

pub trait FieldEventObserver: Send + Sync {
    fn on_field_event(&self, event: &FieldEvent);
}

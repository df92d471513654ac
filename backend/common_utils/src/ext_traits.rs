//! Extension traits for boundary parsing and option handling

use error_stack::{report, ResultExt};

use crate::errors::{CustomResult, ParsingError, ValidationError};

pub trait ValueExt {
    /// Convert a `serde_json::Value` into `T` using `serde::Deserialize`.
    fn parse_value<T>(self, type_name: &'static str) -> CustomResult<T, ParsingError>
    where
        T: serde::de::DeserializeOwned;
}

impl ValueExt for serde_json::Value {
    fn parse_value<T>(self, type_name: &'static str) -> CustomResult<T, ParsingError>
    where
        T: serde::de::DeserializeOwned,
    {
        let debug = format!("Unable to parse {type_name} from serde_json::Value: {self:?}");
        serde_json::from_value::<T>(self)
            .change_context(ParsingError::StructParseFailure(type_name))
            .attach_printable_lazy(|| debug)
    }
}

pub trait ByteSliceExt {
    /// Deserialize a byte slice into `T`.
    fn parse_struct<T>(&self, type_name: &'static str) -> CustomResult<T, ParsingError>
    where
        T: serde::de::DeserializeOwned;
}

impl ByteSliceExt for [u8] {
    fn parse_struct<T>(&self, type_name: &'static str) -> CustomResult<T, ParsingError>
    where
        T: serde::de::DeserializeOwned,
    {
        serde_json::from_slice(self).change_context(ParsingError::StructParseFailure(type_name))
    }
}

pub trait OptionExt<T> {
    /// Unwrap an option, reporting a missing-field validation error when
    /// the value is absent.
    fn get_required_value(self, field_name: &'static str) -> CustomResult<T, ValidationError>;
}

impl<T> OptionExt<T> for Option<T> {
    fn get_required_value(self, field_name: &'static str) -> CustomResult<T, ValidationError> {
        self.ok_or_else(|| report!(ValidationError::MissingRequiredField { field_name }))
    }
}

// SPDX-License-Identifier: MIT

use snafu::{FromString as _, Snafu};

pub mod fmt;

pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;
pub type BoxedErrorResult<T> = std::result::Result<T, BoxedError>;
pub type WhateverResult<T> = std::result::Result<T, Whatever>;

/// Snafu's `Whatever`, but `Send + Sync`
#[derive(Debug, Snafu)]
#[snafu(whatever, display("{message}"))]
pub struct Whatever {
    #[snafu(source(from(Box<dyn std::error::Error + Send + Sync>, Some)))]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,

    message: String,
}

impl Whatever {
    /// Wrap a typed error, keeping it as the source
    ///
    /// Module boundaries erase typed errors into [`Whatever`]; the display
    /// of the original error becomes the message, so nothing is lost in
    /// logs.
    pub fn from_error<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let message = err.to_string();
        Self::with_source(Box::new(err), message)
    }
}

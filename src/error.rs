/*
MIT License
Copyright (c) 2021 Germán Molina
Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:
The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.
THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/

use thiserror::Error;

/// The errors that can be produced while building geometry, rays and
/// light sources, or while casting rays.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HothouseError {
    /// Some input had the wrong shape, was not finite or
    /// was geometrically degenerate (e.g., a zero-length axis).
    #[error("invalid input: {0}")]
    Validation(String),

    /// The inputs are well formed but there is no answer for them. For instance,
    /// the sun is below the horizon.
    #[error("out of domain: {0}")]
    Domain(String),

    /// The intersection engine could not answer a query.
    #[error("intersection engine failed: {0}")]
    Oracle(String),

    /// A simulation case could not be read or parsed.
    #[error("could not load the simulation case: {0}")]
    Config(String),
}

impl HothouseError {
    pub(crate) fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    pub(crate) fn oracle<S: Into<String>>(msg: S) -> Self {
        Self::Oracle(msg.into())
    }
}

/// Shorthand for results produced by this crate
pub type Result<T> = std::result::Result<T, HothouseError>;

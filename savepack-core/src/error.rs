// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Error type shared by every pass of the codec.
//!
//! Error constructors sit on the hot path of every bounds check, so they are
//! `#[cold]` and `#[track_caller]`. Construct variants only through the static
//! functions below, never with the enum syntax directly.

use std::borrow::Cow;

use thiserror::Error;

/// Set SAVEPACK_PANIC_ON_ERROR=1 at compile time to panic where an error is created.
pub const PANIC_ON_ERROR: bool = option_env!("SAVEPACK_PANIC_ON_ERROR").is_some();

/// Error type for serialization passes, stream I/O and reference resolution.
///
/// ## Debug Mode: SAVEPACK_PANIC_ON_ERROR
///
/// ```bash
/// RUST_BACKTRACE=1 SAVEPACK_PANIC_ON_ERROR=1 cargo test
/// ```
///
/// With the flag set, every error created through a constructor panics at the
/// creation site, which gives a stack trace pointing at the faulty write.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Read or write past the end of a buffer.
    ///
    /// Do not construct this variant directly; use [`Error::buffer_out_of_bound`] instead.
    #[error("Buffer out of bound: {0} + {1} > {2}")]
    BufferOutOfBound(usize, usize, usize),

    /// A key hash was written twice in one context.
    ///
    /// Do not construct this variant directly; use [`Error::duplicate_key`] instead.
    #[error("Duplicate key {key:#010x} in context {context_id}")]
    DuplicateKey { key: i32, context_id: i32 },

    /// A sibling context id was pushed twice under the same parent.
    ///
    /// Do not construct this variant directly; use [`Error::duplicate_context`] instead.
    #[error("Duplicate context id {id} under parent {parent_id}")]
    DuplicateContext { id: i32, parent_id: i32 },

    /// Contexts were still open when the pass ended.
    ///
    /// Do not construct this variant directly; use [`Error::unbalanced_context`] instead.
    #[error("{0} context(s) still open at end of serialization")]
    UnbalancedContext(usize),

    /// Invalid or corrupted data encountered.
    ///
    /// Do not construct this variant directly; use [`Error::invalid_data`] instead.
    #[error("{0}")]
    InvalidData(Cow<'static, str>),

    /// A value could not be encoded.
    ///
    /// Do not construct this variant directly; use [`Error::encode_error`] instead.
    #[error("{0}")]
    EncodeError(Cow<'static, str>),

    /// Reference could not be built or resolved.
    ///
    /// Do not construct this variant directly; use [`Error::invalid_ref`] instead.
    #[error("{0}")]
    InvalidRef(Cow<'static, str>),

    /// Type-related failure, such as a missing formatter.
    ///
    /// Do not construct this variant directly; use [`Error::type_error`] instead.
    #[error("{0}")]
    TypeError(Cow<'static, str>),

    /// Operation not allowed in the current pass state.
    ///
    /// Do not construct this variant directly; use [`Error::not_allowed`] instead.
    #[error("{0}")]
    NotAllowed(Cow<'static, str>),

    /// Stream I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Object-graph (JSON) persistence failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic unknown error.
    ///
    /// Do not construct this variant directly; use [`Error::unknown`] instead.
    #[error("{0}")]
    Unknown(Cow<'static, str>),
}

impl Error {
    /// Creates a new [`Error::BufferOutOfBound`] with the given bounds.
    ///
    /// # Example
    /// ```
    /// use savepack_core::error::Error;
    ///
    /// let err = Error::buffer_out_of_bound(10, 20, 25);
    /// ```
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn buffer_out_of_bound(offset: usize, length: usize, capacity: usize) -> Self {
        let err = Error::BufferOutOfBound(offset, length, capacity);
        if PANIC_ON_ERROR {
            panic!("SAVEPACK_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::DuplicateKey`].
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn duplicate_key(key: i32, context_id: i32) -> Self {
        let err = Error::DuplicateKey { key, context_id };
        if PANIC_ON_ERROR {
            panic!("SAVEPACK_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::DuplicateContext`].
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn duplicate_context(id: i32, parent_id: i32) -> Self {
        let err = Error::DuplicateContext { id, parent_id };
        if PANIC_ON_ERROR {
            panic!("SAVEPACK_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::UnbalancedContext`] for `open` contexts left on the stack.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn unbalanced_context(open: usize) -> Self {
        let err = Error::UnbalancedContext(open);
        if PANIC_ON_ERROR {
            panic!("SAVEPACK_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::InvalidData`] from a string or static message.
    ///
    /// # Example
    /// ```
    /// use savepack_core::error::Error;
    ///
    /// let err = Error::invalid_data("Invalid data format");
    /// let err = Error::invalid_data(format!("Invalid record at offset {}", 42));
    /// ```
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn invalid_data<S: Into<Cow<'static, str>>>(s: S) -> Self {
        let err = Error::InvalidData(s.into());
        if PANIC_ON_ERROR {
            panic!("SAVEPACK_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::EncodeError`] from a string or static message.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn encode_error<S: Into<Cow<'static, str>>>(s: S) -> Self {
        let err = Error::EncodeError(s.into());
        if PANIC_ON_ERROR {
            panic!("SAVEPACK_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::InvalidRef`] from a string or static message.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn invalid_ref<S: Into<Cow<'static, str>>>(s: S) -> Self {
        let err = Error::InvalidRef(s.into());
        if PANIC_ON_ERROR {
            panic!("SAVEPACK_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::TypeError`] from a string or static message.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn type_error<S: Into<Cow<'static, str>>>(s: S) -> Self {
        let err = Error::TypeError(s.into());
        if PANIC_ON_ERROR {
            panic!("SAVEPACK_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::NotAllowed`] from a string or static message.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn not_allowed<S: Into<Cow<'static, str>>>(s: S) -> Self {
        let err = Error::NotAllowed(s.into());
        if PANIC_ON_ERROR {
            panic!("SAVEPACK_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::Unknown`] from a string or static message.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn unknown<S: Into<Cow<'static, str>>>(s: S) -> Self {
        let err = Error::Unknown(s.into());
        if PANIC_ON_ERROR {
            panic!("SAVEPACK_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Appends the Rust type name to a [`Error::TypeError`]; other errors pass through.
    #[inline(never)]
    pub fn enhance_type_error<T: ?Sized + 'static>(err: Error) -> Error {
        if let Error::TypeError(s) = err {
            let mut msg = s.to_string();
            msg.push_str(" (type: ");
            msg.push_str(std::any::type_name::<T>());
            msg.push(')');
            Error::type_error(msg)
        } else {
            err
        }
    }
}

/// Ensures a condition is true; otherwise returns an [`enum@Error`].
///
/// # Examples
/// ```
/// use savepack_core::ensure;
/// use savepack_core::error::Error;
///
/// fn check_len(n: usize) -> Result<(), Error> {
///     ensure!(n > 0, "length must be positive");
///     ensure!(n < 10, "length {} too large", n);
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $msg:literal) => {
        if !$cond {
            return Err($crate::error::Error::unknown($msg));
        }
    };
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        if !$cond {
            return Err($crate::error::Error::unknown(format!($fmt, $($arg)*)));
        }
    };
}

/// Returns early with a [`Error::NotAllowed`].
///
/// # Examples
/// ```
/// use savepack_core::not_allowed;
/// use savepack_core::error::Error;
///
/// fn end_pass(in_progress: bool) -> Result<(), Error> {
///     if !in_progress {
///         not_allowed!("pass {} has not begun", "write");
///     }
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! not_allowed {
    ($err:expr) => {
        return Err($crate::error::Error::not_allowed($err))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::error::Error::not_allowed(format!($fmt, $($arg)*)))
    };
}

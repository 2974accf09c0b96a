//! Replay mock - mock-result resolution engine for record-and-replay testing
//!
//! Agents save dependency calls while recording; during replay each call is
//! answered with the next recorded result for its transaction, encoded
//! deterministically.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::cargo)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::multiple_crate_versions
)]

pub mod category;
pub mod codec;
pub mod config;
pub mod error;
pub mod model;
pub mod replay;
pub mod service;
pub mod storage;

pub use category::Category;
pub use codec::{ResultCodec, EMPTY_INSTANCE};
pub use error::{MockError, Result};
pub use service::WorkingService;

//! Custom Error and Result types for this library

use std::{
    any::Any,
    sync::{MutexGuard, PoisonError},
};
use thiserror::Error;

use crate::{
    dissect::DissectionError, session::CaptureSessionBuilderError,
    store::PacketStore,
};

/// Custom Error type for this library
#[derive(Error, Debug)]
pub enum RWireLibError {
    /// A session operation received an argument outside its valid range
    #[error("invalid argument: {_0}")]
    InvalidArgument(String),

    /// A session operation was invoked in a state that does not allow it
    #[error("invalid operation: {_0}")]
    InvalidOperation(String),

    /// Error coming directly off the wire
    #[error("wire error: {_0}")]
    Wire(String),

    /// A frame could not be dissected into a decoded packet
    #[error(transparent)]
    Dissection(#[from] DissectionError),

    /// A filter expression failed syntax validation
    #[error("invalid filter expression: {_0}")]
    InvalidFilter(String),

    /// A capture file was structurally invalid
    #[error("capture file error: {_0}")]
    CaptureFile(String),

    /// Errors reading or writing capture files
    #[error("io error: {_0}")]
    Io(#[from] std::io::Error),

    /// Errors encoding or decoding persisted packet records
    #[error("record serialization error: {_0}")]
    Serialize(#[from] serde_json::Error),

    /// Error obtaining lock on the packet store
    #[error("failed to get lock on packet store: {_0}")]
    StoreLock(String),

    /// Generic thread error
    #[error("thread error: {_0}")]
    ThreadError(String),

    /// Error resulting from failure to build a capture session
    #[error("failed to build capture session: {_0}")]
    SessionBuild(#[from] CaptureSessionBuilderError),
}

impl From<Box<dyn Any + Send>> for RWireLibError {
    fn from(value: Box<dyn Any + Send>) -> Self {
        if let Some(s) = value.downcast_ref::<&'static str>() {
            Self::ThreadError(format!("Thread panicked with: {}", s))
        } else if let Some(s) = value.downcast_ref::<String>() {
            Self::ThreadError(format!("Thread panicked with: {}", s))
        } else {
            Self::ThreadError("Thread panicked with an unknown type".into())
        }
    }
}

impl<'a> From<PoisonError<MutexGuard<'a, PacketStore>>> for RWireLibError {
    fn from(value: PoisonError<MutexGuard<'a, PacketStore>>) -> Self {
        Self::StoreLock(value.to_string())
    }
}

/// Custom Result type for this library. All Errors exposed by this library
/// will be returned as [`RWireLibError`]
pub type Result<T> = std::result::Result<T, RWireLibError>;

/*
 * Copyright © 2025, United States Government, as represented by the Administrator of
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License. You may obtain a copy
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */

use thiserror::Error;
use crate::wire::{DecodeError,EncodeError};

pub type Result<T> = std::result::Result<T,ArenaTelemetryError>;

#[derive(Error,Debug)]
pub enum ArenaTelemetryError {

    #[error("IO error {0}")]
    IOError( #[from] std::io::Error),

    #[error("config RON error {0}")]
    ConfigError( #[from] ron::error::SpannedError),

    #[error("decode error {0}")]
    DecodeError( #[from] DecodeError),

    #[error("encode error {0}")]
    EncodeError( #[from] EncodeError),

    #[error("unknown network interface {0}")]
    InterfaceError(String),

    #[error("operation not valid in state {0}")]
    InvalidStateError(String),

    #[error("registry writer already taken")]
    WriterTakenError,

    #[error("telemetry thread panicked: {0}")]
    ThreadPanicError(String),
}

macro_rules! invalid_state {
    ($fmt:literal $(, $arg:expr )* ) => {
        ArenaTelemetryError::InvalidStateError( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use invalid_state;

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
use crate::{AgentStatus, TerminationEvent, DetectionEvent, TelemetryMsg};

/// binary datagram format as sent by the robot clients
///
/// layout (all integers are little endian i32):
///   0: message type (1: status, 2: termination, 3: detection)
///
///   status:
///     1..5:   position_x (mm)
///     5..9:   position_y (mm)
///     9..13:  heading
///    13..17:  velocity
///    17..21:  category
///    21..53:  id (NUL or space padded text)
///
///   termination, detection:
///     1..33:  id
///
/// robot clients send status datagrams with one trailing pad byte (54 bytes). Bytes past
/// the required length are ignored by the decoder

pub const MSG_TYPE_STATUS: u8 = 1;
pub const MSG_TYPE_TERMINATION: u8 = 2;
pub const MSG_TYPE_DETECTION: u8 = 3;

pub const TAG_LEN: usize = 1;
pub const ID_LEN: usize = 32;
const N_STATUS_FIELDS: usize = 5;

pub const STATUS_BODY_LEN: usize = N_STATUS_FIELDS * 4 + ID_LEN;
pub const ID_BODY_LEN: usize = ID_LEN;

pub const MIN_STATUS_LEN: usize = TAG_LEN + STATUS_BODY_LEN;
pub const MIN_ID_MSG_LEN: usize = TAG_LEN + ID_BODY_LEN;

/// what robot clients put on the wire for status messages (tag + 52 byte struct + pad byte)
pub const STATUS_DATAGRAM_LEN: usize = 54;

#[derive(Error,Debug,Clone,PartialEq,Eq)]
pub enum DecodeError {
    #[error("unknown message type {0}")]
    UnknownType(u8),

    /// `required` and `actual` are datagram lengths (including the tag byte)
    #[error("truncated message (type {tag:?}): got {actual} of {required} bytes")]
    Truncated { tag: Option<u8>, required: usize, actual: usize },
}

#[derive(Error,Debug,Clone,PartialEq,Eq)]
pub enum EncodeError {
    #[error("id \"{id}\" has {len} bytes, which exceeds the id field")]
    IdTooLong { id: String, len: usize },
}

/* #region decode ************************************************************************/

/// the single entry point to turn a received datagram into a typed message
pub fn decode (buf: &[u8])->Result<TelemetryMsg,DecodeError> {
    let Some((&tag, body)) = buf.split_first() else {
        return Err( DecodeError::Truncated{ tag: None, required: TAG_LEN, actual: 0 })
    };

    match tag {
        MSG_TYPE_STATUS => decode_status( body).map( TelemetryMsg::Status),
        MSG_TYPE_TERMINATION => decode_id_body( tag, body).map( |id| TelemetryMsg::Termination( TerminationEvent{id})),
        MSG_TYPE_DETECTION => decode_id_body( tag, body).map( |id| TelemetryMsg::Detection( DetectionEvent{id})),
        other => Err( DecodeError::UnknownType(other))
    }
}

fn decode_status (body: &[u8])->Result<AgentStatus,DecodeError> {
    let truncated = || truncated_error( MSG_TYPE_STATUS, body, STATUS_BODY_LEN);
    if body.len() < STATUS_BODY_LEN { return Err( truncated()) }

    let position_x = read_i32_le( body, 0).ok_or_else( truncated)?;
    let position_y = read_i32_le( body, 4).ok_or_else( truncated)?;
    let heading = read_i32_le( body, 8).ok_or_else( truncated)?;
    let velocity = read_i32_le( body, 12).ok_or_else( truncated)?;
    let category_code = read_i32_le( body, 16).ok_or_else( truncated)?;

    let id_offset = N_STATUS_FIELDS * 4;
    let id = id_from_field( &body[id_offset..id_offset + ID_LEN]);

    Ok( AgentStatus{ id, position_x, position_y, heading, velocity, category_code } )
}

fn decode_id_body (tag: u8, body: &[u8])->Result<String,DecodeError> {
    if body.len() < ID_BODY_LEN {
        Err( truncated_error( tag, body, ID_BODY_LEN))
    } else {
        Ok( id_from_field( &body[..ID_LEN]) )
    }
}

fn truncated_error (tag: u8, body: &[u8], body_len: usize)->DecodeError {
    DecodeError::Truncated{ tag: Some(tag), required: TAG_LEN + body_len, actual: TAG_LEN + body.len() }
}

/// little endian i32 at `offset`, or None if `buf` does not hold 4 bytes at that position.
/// The sign bit is taken from the most significant (last) byte
#[inline]
pub fn read_i32_le (buf: &[u8], offset: usize)->Option<i32> {
    let end = offset.checked_add(4)?;
    let bytes: [u8;4] = buf.get( offset..end)?.try_into().ok()?;
    Some( i32::from_le_bytes( bytes))
}

/// turn a fixed size id field into a map key. Senders write C strings, hence we cut at the
/// first NUL and strip trailing space padding. Invalid UTF-8 is replaced lossily
pub fn id_from_field (field: &[u8])->String {
    let len = field.iter().position( |b| *b == 0).unwrap_or( field.len());
    let text = &field[..len];
    let len = text.iter().rposition( |b| *b != b' ').map_or( 0, |i| i+1);
    String::from_utf8_lossy( &text[..len]).into_owned()
}

/* #endregion decode */

/* #region encode ************************************************************************/

pub fn encode (msg: &TelemetryMsg)->Result<Vec<u8>,EncodeError> {
    match msg {
        TelemetryMsg::Status(status) => encode_status( status),
        TelemetryMsg::Termination(event) => encode_id_msg( MSG_TYPE_TERMINATION, &event.id),
        TelemetryMsg::Detection(event) => encode_id_msg( MSG_TYPE_DETECTION, &event.id),
    }
}

pub fn encode_status (status: &AgentStatus)->Result<Vec<u8>,EncodeError> {
    let mut buf = Vec::with_capacity( STATUS_DATAGRAM_LEN);
    buf.push( MSG_TYPE_STATUS);
    for v in [status.position_x, status.position_y, status.heading, status.velocity, status.category_code] {
        buf.extend_from_slice( &v.to_le_bytes());
    }
    write_id_field( &mut buf, &status.id)?;
    buf.resize( STATUS_DATAGRAM_LEN, 0);
    Ok(buf)
}

pub fn encode_id_msg (tag: u8, id: &str)->Result<Vec<u8>,EncodeError> {
    let mut buf = Vec::with_capacity( MIN_ID_MSG_LEN);
    buf.push( tag);
    write_id_field( &mut buf, id)?;
    Ok(buf)
}

/// append `id` as NUL padded fixed size field
pub fn write_id_field (buf: &mut Vec<u8>, id: &str)->Result<(),EncodeError> {
    let bytes = id.as_bytes();
    if bytes.len() > ID_LEN {
        return Err( EncodeError::IdTooLong{ id: id.to_string(), len: bytes.len() })
    }
    buf.extend_from_slice( bytes);
    buf.resize( buf.len() + (ID_LEN - bytes.len()), 0);
    Ok(())
}

/* #endregion encode */

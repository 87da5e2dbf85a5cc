use std::io::Read;

use crate::errors::DeployError;

/// Acknowledgement status byte sent by the remote receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Warning,
    Error,
}

/// One acknowledgement: a status byte plus, for non-Ok statuses, a
/// newline-terminated message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    pub message: String,
}

impl Response {
    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}

fn read_byte(reader: &mut impl Read) -> Result<u8, DeployError> {
    let mut buf = [0u8; 1];
    let n = reader.read(&mut buf)?;
    if n == 0 {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "stream closed while awaiting acknowledgement",
        )
        .into());
    }
    Ok(buf[0])
}

/// Read exactly one acknowledgement from the remote stream.
///
/// `0x00` returns Ok with an empty message without reading further. `0x01`
/// and `0x02` read through the next line terminator; the message excludes
/// it. A stream that closes before the status byte, or before the expected
/// terminator, is an I/O failure. Any other status byte is malformed
/// framing.
pub fn parse_response(reader: &mut impl Read) -> Result<Response, DeployError> {
    let status = match read_byte(reader)? {
        0x00 => return Ok(Response {
            status: Status::Ok,
            message: String::new(),
        }),
        0x01 => Status::Warning,
        0x02 => Status::Error,
        other => {
            return Err(DeployError::protocol(format!(
                "invalid acknowledgement status byte 0x{:02x}",
                other
            )))
        }
    };

    let mut message = Vec::new();
    loop {
        let byte = read_byte(reader)?;
        if byte == b'\n' {
            break;
        }
        message.push(byte);
    }

    Ok(Response {
        status,
        message: String::from_utf8_lossy(&message).to_string(),
    })
}

/// Read one acknowledgement and fail with a protocol error unless it is Ok.
/// An empty remote message is replaced so callers never see blank error text.
pub fn check_response(reader: &mut impl Read) -> Result<(), DeployError> {
    let response = parse_response(reader)?;
    if response.is_ok() {
        return Ok(());
    }
    if response.message.is_empty() {
        return Err(DeployError::protocol(
            "remote receiver rejected the request without a message",
        ));
    }
    Err(DeployError::protocol(response.message))
}

use umbpoll_frame::{decode_frame, FrameHeader};

use crate::cmd::DecodeArgs;
use crate::exit::{decode_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_response, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let frame = parse_hex(&args.hex)?;
    let header = FrameHeader::parse(&frame).map_err(|err| decode_error("invalid frame", err))?;
    let response = decode_frame(&frame, args.checksum.into())
        .map_err(|err| decode_error("invalid frame", err))?;

    // A response travels back to the poller, so its source is the device.
    print_response(&response, header.source, "hex input", &frame, format);
    Ok(SUCCESS)
}

/// Accept `0110...`, `01 10 ...`, `0x01,0x10` or `01|10` style input.
fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let tokens: Vec<&str> = input
        .split(|c: char| c.is_whitespace() || c == ',' || c == '|')
        .filter(|token| !token.is_empty())
        .collect();

    let joined: String = tokens
        .iter()
        .map(|token| {
            let token = token
                .strip_prefix("0x")
                .or_else(|| token.strip_prefix("0X"))
                .unwrap_or(token);
            if tokens.len() > 1 && token.len() == 1 {
                format!("0{token}")
            } else {
                token.to_string()
            }
        })
        .collect();

    if joined.is_empty() {
        return Err(CliError::new(USAGE, "hex input is empty"));
    }
    hex::decode(&joined).map_err(|err| CliError::new(USAGE, format!("invalid hex input: {err}")))
}

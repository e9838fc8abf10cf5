use umbpoll_frame::PollRequest;

use crate::cmd::{parse_channels, EncodeArgs};
use crate::exit::{build_error, CliResult, SUCCESS};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let channels = parse_channels(&args.channels)?;
    let mut request = PollRequest::new(args.device_id, channels)
        .map_err(|err| build_error("invalid request", err))?;
    if let Some(source) = args.source {
        request = request.with_source(source);
    }

    print_frame(&request.to_bytes(), format);
    Ok(SUCCESS)
}

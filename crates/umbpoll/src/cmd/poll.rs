use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};
use umbpoll_frame::{
    decode_frame, FrameConfig, FrameReader, FrameWriter, PollRequest, PollResponse,
};
use umbpoll_transport::{resolve_address, CloseHandle, TcpTransport, UmbStream};

use crate::cmd::{parse_channels, parse_duration, PollArgs};
use crate::exit::{
    build_error, decode_error, frame_error, transport_error, CliError, CliResult, INTERNAL,
    INTERRUPTED, SUCCESS,
};
use crate::output::{print_response, OutputFormat};

pub fn run(args: PollArgs, format: OutputFormat) -> CliResult<i32> {
    let response_timeout = parse_duration(&args.timeout)?;
    let connect_timeout = parse_duration(&args.connect_timeout)?;
    let addr = resolve_address(&args.address, args.port)
        .map_err(|err| transport_error("invalid address", err))?;
    let channels = parse_channels(&args.channels)?;

    let mut request = PollRequest::new(args.device_id, channels)
        .map_err(|err| build_error("invalid request", err))?;
    if let Some(source) = args.source {
        request = request.with_source(source);
    }

    let interrupted = Arc::new(AtomicBool::new(false));
    let armed: ArmedHandle = Arc::default();
    install_ctrlc_handler(Arc::clone(&armed), Arc::clone(&interrupted))?;

    let stream = TcpTransport::connect(addr, Some(connect_timeout))
        .map_err(|err| transport_error("connect failed", err))?;
    let handle = stream
        .close_handle()
        .map_err(|err| transport_error("close handle failed", err))?;
    *lock(&armed) = Some(handle);

    let config = FrameConfig {
        read_timeout: Some(response_timeout),
        write_timeout: Some(response_timeout),
        checksum: args.checksum.into(),
    };
    let result = exchange(&stream, &request, config);
    lock(&armed).take();

    if let Err(err) = stream.close() {
        debug!(error = %err, "close after poll failed");
    }
    if interrupted.load(Ordering::SeqCst) {
        return Err(CliError::new(INTERRUPTED, "interrupted"));
    }

    let (frame, response) = result?;
    print_response(
        &response,
        request.device_id(),
        &addr.to_string(),
        &frame,
        format,
    );

    if let Err(err) = response.check_status() {
        warn!(
            device = %request.device_id(),
            status = response.status,
            "device reported non-zero status"
        );
        if args.strict_status {
            return Err(decode_error("poll failed", err));
        }
    }

    Ok(SUCCESS)
}

/// Send one request and read its response on `stream`.
fn exchange(
    stream: &UmbStream,
    request: &PollRequest,
    config: FrameConfig,
) -> CliResult<(Vec<u8>, PollResponse)> {
    let policy = config.checksum;

    let mut writer = FrameWriter::with_config_stream(stream, config.clone())
        .map_err(|err| frame_error("configure failed", err))?;
    writer
        .send_request(request)
        .map_err(|err| frame_error("send failed", err))?;
    info!(
        device = %request.device_id(),
        channels = request.channel_ids().len(),
        "poll request sent"
    );

    let mut reader = FrameReader::with_config_stream(stream, config)
        .map_err(|err| frame_error("configure failed", err))?;
    let frame = reader
        .read_frame()
        .map_err(|err| frame_error("receive failed", err))?;
    let response =
        decode_frame(&frame, policy).map_err(|err| decode_error("invalid response", err))?;

    Ok((frame.to_vec(), response))
}

/// The connection an interrupt should close, once one is open.
type ArmedHandle = Arc<Mutex<Option<CloseHandle>>>;

fn lock(armed: &Mutex<Option<CloseHandle>>) -> MutexGuard<'_, Option<CloseHandle>> {
    armed.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Record the interrupt and close the armed connection.
///
/// Returns `false` when no connection is armed (still connecting, or the
/// exchange is over); the caller then exits directly.
fn on_interrupt(armed: &Mutex<Option<CloseHandle>>, interrupted: &AtomicBool) -> bool {
    interrupted.store(true, Ordering::SeqCst);
    match lock(armed).as_ref() {
        Some(handle) => {
            let _ = handle.close();
            true
        }
        None => false,
    }
}

/// Installed before connecting, so an interrupt during the connect timeout
/// exits 130 as well. The handler holds the armed slot, not a socket: the
/// cloned stream is dropped when the exchange disarms it.
fn install_ctrlc_handler(armed: ArmedHandle, interrupted: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        if !on_interrupt(&armed, &interrupted) {
            std::process::exit(INTERRUPTED);
        }
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

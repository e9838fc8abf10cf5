use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use umbpoll_frame::{type_name, ChannelReading, ChannelValue, Identifier, PollResponse};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ChannelOutput {
    channel: u16,
    #[serde(rename = "type")]
    type_name: &'static str,
    type_tag: u8,
    value: Option<f64>,
}

#[derive(Serialize)]
struct ResponseOutput<'a> {
    device_id: u16,
    source: &'a str,
    status: u8,
    status_ok: bool,
    channels: Vec<ChannelOutput>,
    timestamp: String,
}

impl From<&ChannelReading> for ChannelOutput {
    fn from(reading: &ChannelReading) -> Self {
        let tag = reading.value.type_tag();
        Self {
            channel: reading.channel_id.get(),
            type_name: type_name(tag),
            type_tag: tag,
            value: reading.value.as_f64(),
        }
    }
}

/// Print a decoded response. `frame` is the wire form, used by `Raw`.
pub fn print_response(
    response: &PollResponse,
    device_id: Identifier,
    source: &str,
    frame: &[u8],
    format: OutputFormat,
) {
    match format {
        OutputFormat::Json => {
            let out = ResponseOutput {
                device_id: device_id.get(),
                source,
                status: response.status,
                status_ok: response.is_ok(),
                channels: response.channels.iter().map(ChannelOutput::from).collect(),
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CHANNEL", "TYPE", "VALUE"]);
            for reading in &response.channels {
                table.add_row(vec![
                    reading.channel_id.to_string(),
                    type_name(reading.value.type_tag()).to_string(),
                    format_value(&reading.value),
                ]);
            }
            println!("device {device_id} via {source}, status 0x{:02x}", response.status);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "device={} source={} status=0x{:02x} channels={}",
                device_id,
                source,
                response.status,
                response.channels.len()
            );
            for reading in &response.channels {
                println!(
                    "  channel={} type={} value={}",
                    reading.channel_id,
                    type_name(reading.value.type_tag()),
                    format_value(&reading.value)
                );
            }
        }
        OutputFormat::Raw => print_raw(frame),
    }
}

/// Print an encoded frame as hex (or raw bytes for `Raw`).
pub fn print_frame(frame: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = serde_json::json!({
                "frame": hex::encode(frame),
                "size": frame.len(),
            });
            println!("{out}");
        }
        OutputFormat::Table | OutputFormat::Pretty => println!("{}", format_hex_spaced(frame)),
        OutputFormat::Raw => print_raw(frame),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

pub fn format_value(value: &ChannelValue) -> String {
    match value {
        ChannelValue::UInt8(v) => v.to_string(),
        ChannelValue::Float32(v) => v.to_string(),
        ChannelValue::Unrecognized(tag) => format!("<unrecognized type 0x{tag:02x}>"),
    }
}

pub fn format_hex_spaced(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_spacing() {
        assert_eq!(format_hex_spaced(&[0x01, 0x10, 0xF0]), "01 10 F0");
        assert_eq!(format_hex_spaced(&[]), "");
    }

    #[test]
    fn values_render() {
        assert_eq!(format_value(&ChannelValue::UInt8(42)), "42");
        assert_eq!(format_value(&ChannelValue::Float32(21.5)), "21.5");
        assert_eq!(
            format_value(&ChannelValue::Unrecognized(0x20)),
            "<unrecognized type 0x20>"
        );
    }

    #[test]
    fn channel_output_serializes_unrecognized_as_null() {
        let reading = ChannelReading::new(7, ChannelValue::Unrecognized(0x30));
        let json = serde_json::to_value(ChannelOutput::from(&reading)).unwrap();
        assert_eq!(json["channel"], 7);
        assert_eq!(json["type"], "UNRECOGNIZED");
        assert!(json["value"].is_null());
    }
}

use std::fs::File;
use std::io::{stdout, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use gnss::framing::{read_frames, SyncOpts};
use gnss::{comnav, nmea, rtcm, ubx, Frame, Message, MessageId, MultiSynchronizer, ProtocolId};
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub enum Format {
    Json,
    Text,
}

impl clap::ValueEnum for Format {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Json, Self::Text]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        match self {
            Self::Json => Some(clap::builder::PossibleValue::new("json")),
            Self::Text => Some(clap::builder::PossibleValue::new("text")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Protocol {
    All,
    Nmea,
    Ubx,
    Rtcm3,
    ComNav,
}

impl clap::ValueEnum for Protocol {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::All, Self::Nmea, Self::Ubx, Self::Rtcm3, Self::ComNav]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        match self {
            Self::All => Some(clap::builder::PossibleValue::new("all")),
            Self::Nmea => Some(clap::builder::PossibleValue::new("nmea")),
            Self::Ubx => Some(clap::builder::PossibleValue::new("ubx")),
            Self::Rtcm3 => Some(clap::builder::PossibleValue::new("rtcm3")),
            Self::ComNav => Some(clap::builder::PossibleValue::new("comnav")),
        }
    }
}

/// Protocol ids for the selected protocols, all of them if `All` was given.
pub fn protocol_ids(selected: &[Protocol]) -> Vec<ProtocolId> {
    if selected.is_empty() || selected.contains(&Protocol::All) {
        return ProtocolId::ALL.to_vec();
    }
    let mut ids: Vec<ProtocolId> = selected
        .iter()
        .filter_map(|p| match p {
            Protocol::All => None,
            Protocol::Nmea => Some(ProtocolId::Nmea),
            Protocol::Ubx => Some(ProtocolId::Ubx),
            Protocol::Rtcm3 => Some(ProtocolId::Rtcm3),
            Protocol::ComNav => Some(ProtocolId::ComNav),
        })
        .collect();
    ids.sort();
    ids.dedup();
    ids
}

/// Decode a frame with the registry of its protocol.
pub fn decode_frame(frame: &Frame) -> gnss::Result<Box<dyn Message>> {
    match frame.protocol {
        ProtocolId::Nmea => nmea::decode(frame),
        ProtocolId::Ubx => ubx::decode(frame),
        ProtocolId::Rtcm3 => rtcm::decode(frame),
        ProtocolId::ComNav => comnav::decode(frame).map(|(_, msg)| msg),
    }
}

#[derive(Debug, Serialize)]
struct Row {
    index: usize,
    protocol: ProtocolId,
    message_id: MessageId,
    len: usize,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    decoded: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl Row {
    fn new(index: usize, frame: &Frame, decode: bool) -> Self {
        let mut row = Row {
            index,
            protocol: frame.protocol,
            message_id: frame.message_id,
            len: frame.len(),
            valid: frame.is_valid,
            name: None,
            decoded: None,
            error: None,
        };
        if decode {
            match decode_frame(frame) {
                Ok(msg) => {
                    row.name = Some(msg.name());
                    row.decoded = Some(format!("{msg:?}"));
                }
                Err(err) => {
                    debug!(protocol = %frame.protocol, id = %frame.message_id, "not decoded: {err}");
                    row.error = Some(err.to_string());
                }
            }
        }
        row
    }

    fn write_text<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        write!(
            w,
            "{:>8}  {:<6}  {:<12}  {:>5}  {}",
            self.index,
            self.protocol.name(),
            self.message_id.to_string(),
            self.len,
            if self.valid { "ok" } else { "unchecked" },
        )?;
        if let Some(name) = self.name {
            write!(w, "  {name}")?;
        }
        if let Some(decoded) = &self.decoded {
            write!(w, "  {decoded}")?;
        }
        if let Some(err) = &self.error {
            write!(w, "  error: {err}")?;
        }
        writeln!(w)
    }
}

pub fn frames(input: &Path, protocols: &[Protocol], format: &Format, decode: bool) -> Result<()> {
    let protocols = protocol_ids(protocols);
    info!("reading {input:?} for {protocols:?}");

    let src = BufReader::new(File::open(input).context("opening input")?);
    let source = MultiSynchronizer::for_protocols(&protocols, &SyncOpts::default());

    let mut out = BufWriter::new(stdout().lock());
    for (index, frame) in read_frames(src, source).enumerate() {
        let frame = frame.context("reading input")?;
        let row = Row::new(index, &frame, decode);
        match format {
            Format::Json => {
                serde_json::to_writer(&mut out, &row).context("serializing to json")?;
                writeln!(out).context("writing to stdout")?;
            }
            Format::Text => row.write_text(&mut out).context("writing to stdout")?,
        }
    }
    out.flush().context("writing to stdout")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_overrides_selection() {
        assert_eq!(
            protocol_ids(&[Protocol::Ubx, Protocol::All]),
            ProtocolId::ALL.to_vec()
        );
        assert_eq!(protocol_ids(&[]), ProtocolId::ALL.to_vec());
    }

    #[test]
    fn selection_is_deduplicated() {
        assert_eq!(
            protocol_ids(&[Protocol::Rtcm3, Protocol::Nmea, Protocol::Rtcm3]),
            vec![ProtocolId::Nmea, ProtocolId::Rtcm3]
        );
    }

    #[test]
    fn decode_gll_frame() {
        let dat = b"$GPGLL,4916.45,N,12311.12,W,225444,A*31\r\n";
        let mut sync = MultiSynchronizer::for_protocols(&[ProtocolId::Nmea], &SyncOpts::default());
        let frames = gnss::FrameSource::push_chunk(&mut sync, dat);
        let row = Row::new(0, &frames[0], true);
        assert_eq!(row.name, Some("GLL"));
        assert!(row.error.is_none());

        let mut text = Vec::new();
        row.write_text(&mut text).unwrap();
        let text = String::from_utf8(text).unwrap();
        assert!(text.contains("NMEA"), "{text}");
        assert!(text.contains("GLL"), "{text}");
    }
}

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{stdout, BufReader, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use gnss::framing::{read_frames, SyncOpts, SyncStats};
use gnss::{FrameSource, MessageId, MultiSynchronizer, ProtocolId};
use serde::Serialize;

use crate::frames::Format;

#[derive(Debug, Clone, Serialize)]
struct MessageSummary {
    message_id: MessageId,
    count: usize,
    /// Frames without a checksum, NMEA only.
    unchecked: usize,
}

#[derive(Debug, Clone, Serialize)]
struct ProtocolSummary {
    protocol: ProtocolId,
    stats: SyncStats,
    messages: Vec<MessageSummary>,
}

#[derive(Debug, Clone, Serialize)]
struct Info {
    filename: String,
    total_frames: usize,
    protocols: Vec<ProtocolSummary>,
}

fn summarize<R: Read>(filename: String, reader: R) -> Result<Info> {
    let mut frames = read_frames(reader, MultiSynchronizer::all(&SyncOpts::default()));

    let mut counts: BTreeMap<(ProtocolId, MessageId), MessageSummary> = BTreeMap::new();
    let mut total_frames = 0;
    for frame in frames.by_ref() {
        let frame = frame.context("reading input")?;
        total_frames += 1;
        let summary = counts
            .entry((frame.protocol, frame.message_id))
            .or_insert(MessageSummary {
                message_id: frame.message_id,
                count: 0,
                unchecked: 0,
            });
        summary.count += 1;
        if !frame.is_valid {
            summary.unchecked += 1;
        }
    }

    let mut protocols: Vec<ProtocolSummary> = frames
        .source()
        .protocol_stats()
        .into_iter()
        .map(|(protocol, stats)| ProtocolSummary {
            protocol,
            stats,
            messages: Vec::new(),
        })
        .collect();
    protocols.sort_by_key(|p| p.protocol);
    for ((protocol, _), summary) in counts {
        if let Some(p) = protocols.iter_mut().find(|p| p.protocol == protocol) {
            p.messages.push(summary);
        }
    }

    Ok(Info {
        filename,
        total_frames,
        protocols,
    })
}

pub fn info(fpath: &Path, format: &Format) -> Result<()> {
    let reader = BufReader::new(File::open(fpath).context("opening input")?);
    let info = summarize(fpath.to_string_lossy().to_string(), reader)?;

    match format {
        Format::Json => {
            serde_json::to_writer_pretty(stdout(), &info).context("serializing to json")
        }
        Format::Text => stdout()
            .write_all(render_text(&info).as_bytes())
            .context("writing to stdout"),
    }
}

fn render_text(info: &Info) -> String {
    let mut s = String::new();
    s.push_str(&format!("{}\n", info.filename));
    s.push_str(&format!("{}\n", "=".repeat(72)));
    s.push_str(&format!("Frames: {}\n", info.total_frames));
    for p in &info.protocols {
        s.push_str(&format!("{}\n", "-".repeat(72)));
        s.push_str(&format!(
            "{:<8} frames={} checksum_errors={} malformed={} skipped_bytes={}\n",
            p.protocol.name(),
            p.stats.frames,
            p.stats.checksum_errors,
            p.stats.malformed,
            p.stats.skipped_bytes,
        ));
        for m in &p.messages {
            s.push_str(&format!("  {:<14} {:>8}", m.message_id.to_string(), m.count));
            if m.unchecked > 0 {
                s.push_str(&format!("  ({} without checksum)", m.unchecked));
            }
            s.push('\n');
        }
    }
    s
}

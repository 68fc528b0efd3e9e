use std::collections::VecDeque;

use super::{Frame, Grammar, SyncEvent, SyncOpts, SyncStats, Synchronizer};
use crate::message::ProtocolId;

/// Object-safe view of anything that turns bytes into [SyncEvent]s.
pub trait FrameSource: Send {
    /// Consume one byte and return the next available event.
    fn feed(&mut self, byte: u8) -> Option<SyncEvent>;

    /// Next queued event without consuming input.
    fn poll(&mut self) -> Option<SyncEvent>;

    fn reset(&mut self);

    /// Statistics for each protocol handled by this source.
    fn protocol_stats(&self) -> Vec<(ProtocolId, SyncStats)>;

    fn push_chunk(&mut self, dat: &[u8]) -> Vec<Frame> {
        self.feed_chunk(dat)
            .into_iter()
            .filter_map(SyncEvent::into_frame)
            .collect()
    }

    fn feed_chunk(&mut self, dat: &[u8]) -> Vec<SyncEvent> {
        let mut events = Vec::new();
        for byte in dat {
            events.extend(self.feed(*byte));
            while let Some(event) = self.poll() {
                events.push(event);
            }
        }
        events
    }
}

impl<G: Grammar + Send> FrameSource for Synchronizer<G> {
    fn feed(&mut self, byte: u8) -> Option<SyncEvent> {
        Synchronizer::feed(self, byte)
    }

    fn poll(&mut self) -> Option<SyncEvent> {
        Synchronizer::poll(self)
    }

    fn reset(&mut self) {
        Synchronizer::reset(self);
    }

    fn protocol_stats(&self) -> Vec<(ProtocolId, SyncStats)> {
        vec![(self.protocol(), *self.stats())]
    }
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn feed(&mut self, byte: u8) -> Option<SyncEvent> {
        (**self).feed(byte)
    }

    fn poll(&mut self) -> Option<SyncEvent> {
        (**self).poll()
    }

    fn reset(&mut self) {
        (**self).reset();
    }

    fn protocol_stats(&self) -> Vec<(ProtocolId, SyncStats)> {
        (**self).protocol_stats()
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn feed(&mut self, byte: u8) -> Option<SyncEvent> {
        (**self).feed(byte)
    }

    fn poll(&mut self) -> Option<SyncEvent> {
        (**self).poll()
    }

    fn reset(&mut self) {
        (**self).reset();
    }

    fn protocol_stats(&self) -> Vec<(ProtocolId, SyncStats)> {
        (**self).protocol_stats()
    }
}

/// Offers every byte to several synchronizers, e.g., for a receiver port that interleaves
/// NMEA, UBX and RTCM traffic.
///
/// Events are returned in the order they complete. Each inner synchronizer sees the
/// other protocols' traffic as garbage, so its skipped byte count includes it.
#[derive(Default)]
pub struct MultiSynchronizer {
    sources: Vec<Box<dyn FrameSource>>,
    events: VecDeque<SyncEvent>,
}

impl MultiSynchronizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronizer for each supported protocol using `opts`.
    #[must_use]
    pub fn all(opts: &SyncOpts) -> Self {
        Self::new()
            .with(Synchronizer::with_opts(crate::nmea::Nmea, opts.clone()))
            .with(Synchronizer::with_opts(crate::ubx::Ubx::default(), opts.clone()))
            .with(Synchronizer::with_opts(crate::rtcm::Rtcm3, opts.clone()))
            .with(Synchronizer::with_opts(crate::comnav::ComNav, opts.clone()))
    }

    /// Synchronizer for each of `protocols` using `opts`.
    #[must_use]
    pub fn for_protocols(protocols: &[ProtocolId], opts: &SyncOpts) -> Self {
        let mut multi = Self::new();
        for protocol in protocols {
            let source: Box<dyn FrameSource> = match protocol {
                ProtocolId::Nmea => Box::new(Synchronizer::with_opts(crate::nmea::Nmea, opts.clone())),
                ProtocolId::Ubx => {
                    Box::new(Synchronizer::with_opts(crate::ubx::Ubx::default(), opts.clone()))
                }
                ProtocolId::Rtcm3 => Box::new(Synchronizer::with_opts(crate::rtcm::Rtcm3, opts.clone())),
                ProtocolId::ComNav => {
                    Box::new(Synchronizer::with_opts(crate::comnav::ComNav, opts.clone()))
                }
            };
            multi.add(source);
        }
        multi
    }

    #[must_use]
    pub fn with(mut self, source: impl FrameSource + 'static) -> Self {
        self.add(Box::new(source));
        self
    }

    pub fn add(&mut self, source: Box<dyn FrameSource>) {
        self.sources.push(source);
    }

    pub fn push(&mut self, byte: u8) -> Option<Frame> {
        let mut event = self.feed(byte);
        loop {
            match event {
                Some(SyncEvent::Frame(frame)) => return Some(frame),
                Some(SyncEvent::Discarded(_)) => event = self.poll(),
                None => return None,
            }
        }
    }
}

impl FrameSource for MultiSynchronizer {
    fn feed(&mut self, byte: u8) -> Option<SyncEvent> {
        for source in &mut self.sources {
            self.events.extend(source.feed(byte));
            while let Some(event) = source.poll() {
                self.events.push_back(event);
            }
        }
        self.events.pop_front()
    }

    fn poll(&mut self) -> Option<SyncEvent> {
        self.events.pop_front()
    }

    fn reset(&mut self) {
        self.events.clear();
        for source in &mut self.sources {
            source.reset();
        }
    }

    fn protocol_stats(&self) -> Vec<(ProtocolId, SyncStats)> {
        let mut all: Vec<(ProtocolId, SyncStats)> = Vec::new();
        for (protocol, stats) in self.sources.iter().flat_map(|s| s.protocol_stats()) {
            match all.iter_mut().find(|(p, _)| *p == protocol) {
                Some((_, existing)) => existing.merge(&stats),
                None => all.push((protocol, stats)),
            }
        }
        all
    }
}

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use lofty::prelude::AudioFile;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use tracing::debug;

use crate::catalog::TrackRef;
use crate::error::PlayerError;

use super::{Handle, HandleOpener, SharedHandle};

/// rodio-backed opener. Owns the output stream; every handle it produces
/// mixes into that stream.
///
/// Not movable across threads (the underlying device stream is not); the
/// session engine builds it on its own thread via an `OpenerFactory`.
pub struct RodioOpener {
    stream: Arc<OutputStream>,
}

impl RodioOpener {
    pub fn new() -> Result<Self, PlayerError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| PlayerError::Playback(format!("no audio output device: {e}")))?;
        // rodio logs to stderr when OutputStream is dropped. That's useful in
        // debugging, but noisy for library consumers.
        stream.log_on_drop(false);
        Ok(Self {
            stream: Arc::new(stream),
        })
    }
}

impl HandleOpener for RodioOpener {
    fn open(&self, track: &TrackRef) -> Result<SharedHandle, PlayerError> {
        let path = PathBuf::from(&track.id.0);
        let open_err = |reason: String| PlayerError::Open {
            id: track.id.clone(),
            reason,
        };

        let file = File::open(&path).map_err(|e| open_err(e.to_string()))?;
        let source = Decoder::new(BufReader::new(file)).map_err(|e| open_err(e.to_string()))?;

        // Catalog metadata first, then the container, then the decoder.
        let duration = track
            .duration
            .or_else(|| read_duration(&path))
            .or_else(|| source.total_duration())
            .unwrap_or(Duration::ZERO);

        let sink = Sink::connect_new(self.stream.mixer());
        sink.append(source);
        sink.pause();

        debug!(id = %track.id, ?duration, "opened sound handle");
        Ok(Arc::new(RodioHandle {
            path,
            stream: self.stream.clone(),
            state: Mutex::new(SinkState {
                sink: Some(sink),
                playing: false,
                started_at: None,
                accumulated: Duration::ZERO,
            }),
            duration,
        }))
    }
}

fn read_duration(path: &Path) -> Option<Duration> {
    lofty::read_from_path(path)
        .ok()
        .map(|tagged| tagged.properties().duration())
}

struct SinkState {
    /// `None` once released.
    sink: Option<Sink>,
    playing: bool,
    // Wall-clock start plus accumulated elapsed while paused; rodio sinks do
    // not report a play cursor themselves.
    started_at: Option<Instant>,
    accumulated: Duration,
}

impl SinkState {
    fn elapsed(&self) -> Duration {
        self.accumulated + self.started_at.map_or(Duration::ZERO, |st| st.elapsed())
    }
}

/// One open track: a rodio `Sink` plus position bookkeeping.
pub struct RodioHandle {
    path: PathBuf,
    stream: Arc<OutputStream>,
    state: Mutex<SinkState>,
    duration: Duration,
}

impl RodioHandle {
    fn lock(&self) -> Result<MutexGuard<'_, SinkState>, PlayerError> {
        self.state
            .lock()
            .map_err(|_| PlayerError::Playback("handle state poisoned".to_string()))
    }
}

impl Handle for RodioHandle {
    fn play(&self) -> Result<(), PlayerError> {
        let mut state = self.lock()?;
        let Some(sink) = state.sink.as_ref() else {
            return Err(PlayerError::Playback("handle released".to_string()));
        };
        if !state.playing {
            sink.play();
            state.started_at = Some(Instant::now());
            state.playing = true;
        }
        Ok(())
    }

    fn pause(&self) -> Result<(), PlayerError> {
        let mut state = self.lock()?;
        let Some(sink) = state.sink.as_ref() else {
            return Err(PlayerError::Playback("handle released".to_string()));
        };
        if state.playing {
            sink.pause();
            state.accumulated = state.elapsed();
            state.started_at = None;
            state.playing = false;
        }
        Ok(())
    }

    fn seek_to(&self, position: Duration) -> Result<(), PlayerError> {
        let mut state = self.lock()?;
        if state.sink.is_none() {
            return Err(PlayerError::Playback("handle released".to_string()));
        }
        // Unknown duration reads as zero; don't clamp against it.
        let position = if self.duration > Duration::ZERO {
            position.min(self.duration)
        } else {
            position
        };

        // Scrubbing: rebuild the sink and skip into the file.
        // `Source::skip_duration` works for the common formats. The old sink
        // keeps running until the replacement source is ready.
        let file = File::open(&self.path).map_err(|e| PlayerError::Playback(e.to_string()))?;
        let source = Decoder::new(BufReader::new(file))
            .map_err(|e| PlayerError::Playback(e.to_string()))?
            .skip_duration(position);

        if let Some(old) = state.sink.take() {
            old.stop();
        }
        let sink = Sink::connect_new(self.stream.mixer());
        sink.append(source);
        if state.playing {
            sink.play();
            state.started_at = Some(Instant::now());
        } else {
            sink.pause();
            state.started_at = None;
        }
        state.accumulated = position;
        state.sink = Some(sink);
        Ok(())
    }

    fn position(&self) -> Duration {
        match self.state.lock() {
            Ok(state) => {
                let elapsed = state.elapsed();
                if self.duration > Duration::ZERO {
                    elapsed.min(self.duration)
                } else {
                    elapsed
                }
            }
            Err(_) => Duration::ZERO,
        }
    }

    fn duration(&self) -> Duration {
        self.duration
    }

    fn finished(&self) -> bool {
        match self.state.lock() {
            Ok(state) => state.sink.as_ref().is_some_and(|s| s.empty()),
            Err(_) => false,
        }
    }

    fn release(&self) {
        if let Ok(mut state) = self.state.lock() {
            if let Some(sink) = state.sink.take() {
                sink.stop();
                state.playing = false;
                state.started_at = None;
                debug!(path = %self.path.display(), "released sound handle");
            }
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::errors::CaptureError;

/// The recording mode: voice only, or camera plus microphone.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Audio,
    Video,
}

impl Capability {
    /// The container MIME type stamped onto finished blobs.
    pub fn mime_type(self) -> &'static str {
        match self {
            Capability::Audio => "audio/webm",
            Capability::Video => "video/webm",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Audio => "audio",
            Capability::Video => "video",
        }
    }
}

/// A finished, contiguous piece of captured media.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MediaBlob {
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl MediaBlob {
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Where the recorder currently is in its lifecycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    Idle,
    Recording,
    Paused,
    Stopped,
}

/// A live device stream handed out by the platform. Dropping a stream
/// releases the underlying device.
pub trait CaptureStream {
    fn pause(&mut self);

    fn resume(&mut self);

    /// Finalizes the capture and returns every chunk produced so far.
    /// Consuming the stream releases the device unconditionally,
    /// whether or not the caller manages to assemble the chunks.
    fn finish(self: Box<Self>) -> Vec<Vec<u8>>;
}

/// The platform capture subsystem. The browser owns permissioning and
/// raw stream production; this seam is all the recorder sees of it.
pub trait CaptureDevice {
    fn open(&mut self, capability: Capability) -> Result<Box<dyn CaptureStream>, CaptureError>;
}

/// Drives a single capture session: `idle → recording → (paused ⇄
/// recording) → stopped`. Owns exactly one device stream and one
/// elapsed-time counter; instances never share either.
pub struct Recorder<D> {
    device: D,
    capability: Capability,
    phase: Phase,
    elapsed: u64,
    stream: Option<Box<dyn CaptureStream>>,
    blob: Option<MediaBlob>,
}

impl<D: CaptureDevice> Recorder<D> {
    pub fn new(device: D, capability: Capability) -> Self {
        Recorder {
            device,
            capability,
            phase: Phase::Idle,
            elapsed: 0,
            stream: None,
            blob: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// Whole seconds of active recording so far.
    pub fn elapsed(&self) -> u64 {
        self.elapsed
    }

    /// Elapsed time formatted for display, `MM:SS` zero-padded.
    pub fn elapsed_display(&self) -> String {
        format_elapsed(self.elapsed)
    }

    pub fn blob(&self) -> Option<&MediaBlob> {
        self.blob.as_ref()
    }

    /// Requests device access and begins recording. On failure the
    /// recorder stays idle. Starting anywhere but `Idle` is a no-op.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.phase != Phase::Idle {
            return Ok(());
        }

        let stream = self.device.open(self.capability)?;

        self.stream = Some(stream);
        self.elapsed = 0;
        self.phase = Phase::Recording;

        Ok(())
    }

    /// Toggles between `Recording` and `Paused`. Calling it from
    /// `Paused` resumes, so two calls in a row cancel out; this
    /// mirrors the single pause button in the interface. No-op when
    /// no capture is live.
    pub fn pause(&mut self) {
        match self.phase {
            Phase::Recording => {
                if let Some(stream) = self.stream.as_mut() {
                    stream.pause();
                }
                self.phase = Phase::Paused;
            }
            Phase::Paused => self.resume(),
            _ => {}
        }
    }

    /// Returns from `Paused` to `Recording`; no-op otherwise.
    pub fn resume(&mut self) {
        if self.phase == Phase::Paused {
            if let Some(stream) = self.stream.as_mut() {
                stream.resume();
            }
            self.phase = Phase::Recording;
        }
    }

    /// One second of wall clock. Elapsed time only advances while
    /// actively recording.
    pub fn tick(&mut self) {
        if self.phase == Phase::Recording {
            self.elapsed += 1;
        }
    }

    /// Finalizes the capture into a single contiguous blob tagged with
    /// the capability's MIME type and releases the device.
    pub fn stop(&mut self) {
        match self.phase {
            Phase::Recording | Phase::Paused => {}
            _ => return,
        }

        // finish() consumes the stream, so the device is released
        // before the chunks are assembled
        let chunks = match self.stream.take() {
            Some(stream) => stream.finish(),
            None => vec![],
        };

        self.blob = Some(MediaBlob {
            data: chunks.concat(),
            mime_type: self.capability.mime_type().to_owned(),
        });
        self.phase = Phase::Stopped;
    }

    /// Drops the produced blob and elapsed time and returns to idle,
    /// releasing any still-attached stream first.
    pub fn discard(&mut self) {
        self.stream = None;
        self.blob = None;
        self.elapsed = 0;
        self.phase = Phase::Idle;
    }

    /// Takes ownership of the finished blob, leaving the recorder
    /// idle and ready for another session.
    pub fn take_blob(&mut self) -> Option<MediaBlob> {
        let blob = self.blob.take();

        if blob.is_some() {
            self.discard();
        }

        blob
    }
}

/// Formats whole seconds as `MM:SS`, zero-padded.
pub fn format_elapsed(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;

    struct FakeStream {
        chunks: Vec<Vec<u8>>,
        paused: Arc<Mutex<Vec<bool>>>,
        released: Arc<AtomicBool>,
    }

    impl CaptureStream for FakeStream {
        fn pause(&mut self) {
            self.paused.lock().unwrap().push(true);
        }

        fn resume(&mut self) {
            self.paused.lock().unwrap().push(false);
        }

        fn finish(self: Box<Self>) -> Vec<Vec<u8>> {
            self.chunks.clone()
        }
    }

    impl Drop for FakeStream {
        fn drop(&mut self) {
            self.released.store(true, Ordering::SeqCst);
        }
    }

    struct FakeDevice {
        chunks: Vec<Vec<u8>>,
        deny: bool,
        opened: Vec<Capability>,
        paused: Arc<Mutex<Vec<bool>>>,
        released: Arc<AtomicBool>,
    }

    impl FakeDevice {
        fn new(chunks: Vec<Vec<u8>>) -> Self {
            FakeDevice {
                chunks,
                deny: false,
                opened: vec![],
                paused: Arc::new(Mutex::new(vec![])),
                released: Arc::new(AtomicBool::new(false)),
            }
        }

        fn denying() -> Self {
            let mut device = FakeDevice::new(vec![]);
            device.deny = true;
            device
        }
    }

    impl CaptureDevice for &mut FakeDevice {
        fn open(&mut self, capability: Capability) -> Result<Box<dyn CaptureStream>, CaptureError> {
            if self.deny {
                return Err(CaptureError::DeviceAccess {
                    reason: "permission denied".to_owned(),
                });
            }

            self.opened.push(capability);

            Ok(Box::new(FakeStream {
                chunks: self.chunks.clone(),
                paused: self.paused.clone(),
                released: self.released.clone(),
            }))
        }
    }

    #[test]
    fn start_transitions_to_recording_and_resets_elapsed() {
        let mut device = FakeDevice::new(vec![]);
        let mut recorder = Recorder::new(&mut device, Capability::Audio);

        recorder.start().unwrap();

        assert_eq!(recorder.phase(), Phase::Recording);
        assert_eq!(recorder.elapsed(), 0);
    }

    #[test]
    fn denied_device_access_leaves_recorder_idle() {
        let mut device = FakeDevice::denying();
        let mut recorder = Recorder::new(&mut device, Capability::Video);

        let error = recorder.start().unwrap_err();

        assert_eq!(
            error,
            CaptureError::DeviceAccess {
                reason: "permission denied".to_owned()
            }
        );
        assert_eq!(recorder.phase(), Phase::Idle);
    }

    #[test]
    fn ticks_advance_only_while_recording() {
        let mut device = FakeDevice::new(vec![]);
        let mut recorder = Recorder::new(&mut device, Capability::Audio);

        recorder.tick();
        assert_eq!(recorder.elapsed(), 0);

        recorder.start().unwrap();
        recorder.tick();
        recorder.tick();
        assert_eq!(recorder.elapsed(), 2);

        recorder.pause();
        recorder.tick();
        assert_eq!(recorder.elapsed(), 2);

        recorder.resume();
        recorder.tick();
        assert_eq!(recorder.elapsed(), 3);
        assert_eq!(recorder.elapsed_display(), "00:03");
    }

    #[test]
    fn pause_twice_toggles_back_to_recording() {
        // double invocation of the single pause control resumes; this
        // is the shipped behavior, asserted here on purpose
        let mut device = FakeDevice::new(vec![]);
        let mut recorder = Recorder::new(&mut device, Capability::Audio);

        recorder.start().unwrap();
        recorder.pause();
        assert_eq!(recorder.phase(), Phase::Paused);

        recorder.pause();
        assert_eq!(recorder.phase(), Phase::Recording);
    }

    #[test]
    fn pause_outside_live_capture_is_a_no_op() {
        let mut device = FakeDevice::new(vec![]);
        let mut recorder = Recorder::new(&mut device, Capability::Audio);

        recorder.pause();
        assert_eq!(recorder.phase(), Phase::Idle);

        recorder.start().unwrap();
        recorder.stop();
        recorder.pause();
        assert_eq!(recorder.phase(), Phase::Stopped);
    }

    #[test]
    fn stop_concatenates_chunks_and_releases_the_device() {
        let mut device = FakeDevice::new(vec![vec![1, 2], vec![3], vec![4, 5]]);
        let released = device.released.clone();
        let mut recorder = Recorder::new(&mut device, Capability::Audio);

        recorder.start().unwrap();
        recorder.stop();

        assert_eq!(recorder.phase(), Phase::Stopped);
        assert!(released.load(std::sync::atomic::Ordering::SeqCst));

        let blob = recorder.blob().unwrap();
        assert_eq!(blob.data, vec![1, 2, 3, 4, 5]);
        assert_eq!(blob.mime_type, "audio/webm");
        assert_eq!(blob.size(), 5);
    }

    #[test]
    fn stop_from_paused_still_finalizes() {
        let mut device = FakeDevice::new(vec![vec![9]]);
        let mut recorder = Recorder::new(&mut device, Capability::Video);

        recorder.start().unwrap();
        recorder.pause();
        recorder.stop();

        assert_eq!(recorder.phase(), Phase::Stopped);
        assert_eq!(recorder.blob().unwrap().mime_type, "video/webm");
    }

    #[test]
    fn discard_releases_the_stream_and_returns_to_idle() {
        let mut device = FakeDevice::new(vec![vec![1]]);
        let released = device.released.clone();
        let mut recorder = Recorder::new(&mut device, Capability::Audio);

        recorder.start().unwrap();
        recorder.tick();
        recorder.discard();

        assert!(released.load(std::sync::atomic::Ordering::SeqCst));
        assert_eq!(recorder.phase(), Phase::Idle);
        assert_eq!(recorder.elapsed(), 0);
        assert!(recorder.blob().is_none());
    }

    #[test]
    fn take_blob_resets_for_the_next_session() {
        let mut device = FakeDevice::new(vec![vec![7]]);
        let mut recorder = Recorder::new(&mut device, Capability::Audio);

        recorder.start().unwrap();
        recorder.stop();

        let blob = recorder.take_blob().unwrap();
        assert_eq!(blob.data, vec![7]);
        assert_eq!(recorder.phase(), Phase::Idle);

        recorder.start().unwrap();
        assert_eq!(recorder.phase(), Phase::Recording);
    }

    #[test]
    fn video_capability_requests_camera_and_microphone() {
        let mut device = FakeDevice::new(vec![]);
        {
            let mut recorder = Recorder::new(&mut device, Capability::Video);
            recorder.start().unwrap();
        }

        assert_eq!(device.opened, vec![Capability::Video]);
    }

    #[test]
    fn elapsed_formatting_is_zero_padded() {
        assert_eq!(format_elapsed(0), "00:00");
        assert_eq!(format_elapsed(9), "00:09");
        assert_eq!(format_elapsed(65), "01:05");
        assert_eq!(format_elapsed(600), "10:00");
        assert_eq!(format_elapsed(3601), "60:01");
    }
}

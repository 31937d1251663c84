//! camlabel – still-photo capture layer
//!
//! Wraps a `gstreamer` pipeline (`libcamerasrc`/`v4l2src` → `videoconvert` →
//! `jpegenc` → `appsink`) behind a small [`Camera`] handle.  Each capture
//! request pulls one JPEG-compressed sample off the sink and hands it back as
//! a [`Photo`] (bytes + dimensions + timestamp).  The session is configured
//! once at construction: fixed frame size, JPEG at maximum quality.
//!
//! Capture delivery is asynchronous – [`Camera::capture_photo`] resolves on a
//! runtime-managed blocking thread, so callers get the same "photo arrives on
//! a thread you don't own" contract the rest of the pipeline is built around.

use gst::prelude::*;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("GStreamer init failed: {0}")]
    GstInit(#[source] gst::glib::Error),
    #[error("no camera source available on this system")]
    NoCamera,
    #[error("Failed to parse pipeline: {0}")]
    ParsePipeline(#[source] gst::glib::Error),
    #[error("Pipeline is not a gst::Pipeline")]
    NotPipeline,
    #[error("AppSink element not found")]
    AppSinkNotFound,
    #[error("AppSink element downcast failed")]
    AppSinkDowncastFailed,
    #[error("Failed to set pipeline to Playing: {0}")]
    StateChange(#[source] gst::StateChangeError),
    #[error("Failed to pull sample: {0}")]
    PullSample(#[source] gst::glib::BoolError),
    #[error("Sample has no buffer")]
    MissingBuffer,
    #[error("Sample has no caps")]
    MissingCaps,
    #[error("Caps missing struct")]
    MissingStructure,
    #[error("Failed to get field value: {0}")]
    FieldError(String),
    #[error("Buffer map failed: {0}")]
    BufferMap(String),
    #[error("capture task aborted before delivering a photo")]
    CaptureTask,
}

pub type Result<T> = std::result::Result<T, CameraError>;

/// A single captured still: JPEG bytes plus capture metadata.
#[derive(Debug, Clone)]
pub struct Photo {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub pts: Duration,
}

/// Camera handle – owns the pipeline and *appsink*.
pub struct Camera {
    pipeline: gst::Pipeline,
    appsink: gst_app::AppSink,
}

impl Camera {
    /// Build and *Playing* a capture pipeline that delivers JPEG stills.
    ///
    /// Returns [`CameraError::NoCamera`] when no usable source element exists,
    /// leaving the decision of whether that is fatal to the caller.
    ///
    /// ```no_run
    /// use camlabel_camera::Camera;
    /// let cam = Camera::new(1280, 720).unwrap();
    /// let photo = cam.capture_photo_blocking().unwrap();
    /// println!("{} JPEG bytes ({}×{})", photo.jpeg.len(), photo.width, photo.height);
    /// ```
    pub fn new(width: u32, height: u32) -> Result<Self> {
        gst::init().map_err(CameraError::GstInit)?;

        let src = if gst::ElementFactory::find("libcamerasrc").is_some() {
            // Pi (libcamera) stack
            "libcamerasrc"
        } else if gst::ElementFactory::find("v4l2src").is_some() {
            // PC webcam
            "v4l2src device=/dev/video0"
        } else {
            return Err(CameraError::NoCamera);
        };

        let pipe_str = format!(
            "{src} ! videoconvert ! video/x-raw,width={w},height={h} \
            ! jpegenc quality=100 ! queue leaky=2 max-size-buffers=4 \
            ! appsink name=sink emit-signals=true sync=false",
            src = src, w = width, h = height
        );

        let pipeline = gst::parse::launch(&pipe_str)
            .map_err(CameraError::ParsePipeline)?
            .downcast::<gst::Pipeline>()
            .map_err(|_| CameraError::NotPipeline)?;

        let appsink = pipeline
            .by_name("sink")
            .ok_or(CameraError::AppSinkNotFound)?
            .downcast::<gst_app::AppSink>()
            .map_err(|_| CameraError::AppSinkDowncastFailed)?;

        pipeline
            .set_state(gst::State::Playing)
            .map_err(CameraError::StateChange)?;

        log::debug!("camera pipeline playing ({src}, {width}x{height}, jpeg q=100)");

        Ok(Self { pipeline, appsink })
    }

    /// Asynchronous retrieval – the pull runs on a blocking worker thread so
    /// the caller's task is never stalled on the sink.
    pub async fn capture_photo(&self) -> Result<Photo> {
        let appsink = self.appsink.clone();
        tokio::task::spawn_blocking(move || {
            let sample = appsink.pull_sample().map_err(CameraError::PullSample)?;
            Self::sample_to_photo(sample)
        })
        .await
        .map_err(|_| CameraError::CaptureTask)?
    }

    /// Blocking retrieval, for synchronous consumers and tests.
    pub fn capture_photo_blocking(&self) -> Result<Photo> {
        let sample = self
            .appsink
            .pull_sample()
            .map_err(CameraError::PullSample)?;

        Self::sample_to_photo(sample)
    }

    /// Convert a `gst::Sample` into our [`Photo`] wrapper.
    fn sample_to_photo(sample: gst::Sample) -> Result<Photo> {
        let buffer = sample.buffer().ok_or(CameraError::MissingBuffer)?;
        let caps   = sample.caps().ok_or(CameraError::MissingCaps)?;
        let s      = caps.structure(0).ok_or(CameraError::MissingStructure)?;
        let width  = s.get::<i32>("width").map_err(|e| CameraError::FieldError(e.to_string()))? as u32;
        let height = s.get::<i32>("height").map_err(|e| CameraError::FieldError(e.to_string()))? as u32;

        let pts = buffer
            .pts()
            .map(|t| Duration::from_nanos(t.nseconds()))
            .unwrap_or(Duration::ZERO);

        let map = buffer.map_readable().map_err(|e| CameraError::BufferMap(e.to_string()))?;
        let mut jpeg = Vec::with_capacity(map.size());
        jpeg.extend_from_slice(map.as_slice());
        drop(map);

        Ok(Photo { jpeg, width, height, pts })
    }
}

impl Drop for Camera {
    fn drop(&mut self) {
        let _ = self.pipeline.set_state(gst::State::Null);
    }
}

// ---------------------------------------------------------------------------
// Integration test (cargo test -- --nocapture) – skipped on CI without camera
// ---------------------------------------------------------------------------
#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    #[ignore]
    fn capture_one() {
        let cam = Camera::new(1280, 720).expect("create");
        let photo = cam.capture_photo_blocking().expect("photo");
        println!(
            "Received {} JPEG bytes ({}x{}) pts {:?}",
            photo.jpeg.len(),
            photo.width,
            photo.height,
            photo.pts
        );
        assert_eq!(photo.width, 1280);
        // JPEG SOI marker
        assert_eq!(&photo.jpeg[..2], &[0xff, 0xd8]);
    }

    #[tokio::test]
    #[serial]
    #[ignore]
    async fn capture_async() {
        let cam = Camera::new(1280, 720).expect("create");
        let photo = cam.capture_photo().await.expect("photo");
        assert!(!photo.jpeg.is_empty());
    }
}

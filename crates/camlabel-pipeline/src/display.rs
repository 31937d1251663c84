//! Display marshalling.
//!
//! Inference cycles finish on threads the pipeline does not own, and the
//! display surface must only ever be touched from the task that owns it.
//! [`spawn_display`] runs that owning task; everything else holds a cheap
//! [`DisplayHandle`] and queues updates through it.

use camlabel_classify::Prediction;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A surface that can show the current label and its confidence.
pub trait DisplaySurface: Send + 'static {
    fn set_title(&mut self, text: &str);
    fn set_probability(&mut self, text: &str);
}

/// Default surface: writes both lines to the log.
pub struct ConsoleDisplay;

impl DisplaySurface for ConsoleDisplay {
    fn set_title(&mut self, text: &str) {
        log::info!("{text}");
    }

    fn set_probability(&mut self, text: &str) {
        log::info!("{text}");
    }
}

#[derive(Debug, Clone)]
pub struct DisplayUpdate {
    pub label: String,
    pub probability: f64,
}

/// Clone-able sender side of the display queue.
#[derive(Clone)]
pub struct DisplayHandle {
    tx: mpsc::UnboundedSender<DisplayUpdate>,
}

impl DisplayHandle {
    /// Queue a prediction for display.  The display task may already be gone
    /// during shutdown, in which case the update is dropped.
    pub fn update(&self, prediction: &Prediction) {
        let _ = self.tx.send(DisplayUpdate {
            label: prediction.label.clone(),
            probability: prediction.probability_of(&prediction.label) as f64,
        });
    }
}

/// Spawn the display-owning task.  Updates are applied strictly in arrival
/// order, so when overlapping inference cycles race, the last one to
/// complete is the one left on screen.  The surface is handed back when the
/// last [`DisplayHandle`] is dropped.
pub fn spawn_display<S: DisplaySurface>(mut surface: S) -> (DisplayHandle, JoinHandle<S>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<DisplayUpdate>();

    let task = tokio::spawn(async move {
        while let Some(update) = rx.recv().await {
            surface.set_title(&update.label);
            surface.set_probability(&format!("Prob: {}", format_probability(update.probability)));
        }
        surface
    });

    (DisplayHandle { tx }, task)
}

/// Format a 0.0–1.0 probability as a percentage with three significant
/// digits, a trailing `%`, and an always-present decimal separator.
pub fn format_probability(probability: f64) -> String {
    let pct = (probability * 100.0).max(0.0);
    let decimals = if pct > 0.0 {
        (2 - pct.log10().floor() as i32).max(0) as usize
    } else {
        1
    };

    let mut out = format!("{pct:.decimals$}");
    if !out.contains('.') {
        out.push('.');
    }
    out.push('%');
    out
}

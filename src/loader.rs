use std::sync::mpsc;
use std::sync::mpsc::TryRecvError;
use std::thread::JoinHandle;

use tracing::debug;
use tracing::warn;

use crate::error::LoadError;
use crate::frame_source::FrameSource;
use crate::playback::LoadRequest;
use crate::playback::LoadResponse;

/// Commands sent from the UI thread to the background loader thread.
enum LoaderCommand {
    Load(LoadRequest),
    Stop,
}

/// Fetches frame records on a background thread so the UI keeps handling
/// input while a retrieval is outstanding.
pub struct FrameLoader {
    command_tx: mpsc::Sender<LoaderCommand>,
    /// Kept so requests that cannot reach the thread still get an answer.
    response_tx: mpsc::Sender<LoadResponse>,
    response_rx: mpsc::Receiver<LoadResponse>,
    handle: Option<JoinHandle<()>>,
}

impl FrameLoader {
    /// `on_ready` runs on the loader thread after each response is queued,
    /// typically to request a repaint.
    pub fn spawn<F>(source: Box<dyn FrameSource>, on_ready: F) -> Self
    where
        F: Fn() + Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::channel();
        let (response_tx, response_rx) = mpsc::channel();

        let thread_tx = response_tx.clone();
        let handle = std::thread::Builder::new()
            .name("frame-loader".to_string())
            .spawn(move || loader_thread(source, command_rx, thread_tx, on_ready))
            .map_err(|e| warn!("Failed to spawn frame loader thread: {e}"))
            .ok();

        Self { command_tx, response_tx, response_rx, handle }
    }

    /// Queue a request. If the loader thread is gone the failure is reported
    /// through [`FrameLoader::try_recv`] like any other load failure.
    pub fn request(&self, request: LoadRequest) {
        if self.command_tx.send(LoaderCommand::Load(request)).is_err() {
            warn!(?request, "Frame loader is not running");
            let _ = self.response_tx.send(LoadResponse { request, result: Err(LoadError::LoaderDisconnected) });
        }
    }

    pub fn try_recv(&self) -> Option<LoadResponse> {
        match self.response_rx.try_recv() {
            Ok(response) => Some(response),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}

impl Drop for FrameLoader {
    fn drop(&mut self) {
        let _ = self.command_tx.send(LoaderCommand::Stop);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn loader_thread<F>(
    source: Box<dyn FrameSource>,
    command_rx: mpsc::Receiver<LoaderCommand>,
    response_tx: mpsc::Sender<LoadResponse>,
    on_ready: F,
) where
    F: Fn(),
{
    while let Ok(command) = command_rx.recv() {
        match command {
            LoaderCommand::Load(request) => {
                debug!(frame = request.frame_number, address = %source.address(request.frame_number), "Attempting to load");
                let result = source.fetch(request.frame_number);
                if response_tx.send(LoadResponse { request, result }).is_err() {
                    break;
                }
                on_ready();
            }
            LoaderCommand::Stop => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use std::time::Instant;

    use super::*;
    use crate::playback::LoadCause;

    struct EchoSource;

    impl FrameSource for EchoSource {
        fn address(&self, frame_number: u32) -> String {
            format!("echo/{frame_number}")
        }

        fn fetch(&self, frame_number: u32) -> Result<String, LoadError> {
            if frame_number == 0 { Err(LoadError::EmptyContent(0)) } else { Ok(format!("frame {frame_number}")) }
        }
    }

    fn wait_for(loader: &FrameLoader) -> LoadResponse {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(response) = loader.try_recv() {
                return response;
            }
            assert!(Instant::now() < deadline, "loader did not respond");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn responses_carry_their_request() {
        let ready = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ready);
        let loader = FrameLoader::spawn(Box::new(EchoSource), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let request = LoadRequest { id: 7, frame_number: 12, cause: LoadCause::Tick };
        loader.request(request);
        let response = wait_for(&loader);
        assert_eq!(response.request, request);
        assert_eq!(response.result.unwrap(), "frame 12");

        loader.request(LoadRequest { id: 8, frame_number: 0, cause: LoadCause::StepBackward });
        assert!(matches!(wait_for(&loader).result, Err(LoadError::EmptyContent(0))));
        assert!(loader.try_recv().is_none());

        // Dropping joins the thread, so every callback has run.
        drop(loader);
        assert_eq!(ready.load(Ordering::SeqCst), 2);
    }
}

use crate::{LoadError, SceneGraph, TextureData};
use crossbeam_channel::{Receiver, TryRecvError};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Files making up the scene.
#[derive(Debug, Clone)]
pub struct AssetRequest {
    pub model: PathBuf,
    pub baked_texture: PathBuf,
}

/// Everything a single load delivers.
///
/// The texture and the model load independently: a texture that fails to
/// load is replaced by [`TextureData::placeholder`] and its error is kept
/// in `texture_error`, so the model still shows.
#[derive(Debug)]
pub struct LoadedAssets {
    pub scene: SceneGraph,
    pub baked_texture: TextureData,
    pub texture_error: Option<LoadError>,
    pub elapsed: Duration,
}

impl AssetRequest {
    /// Load synchronously on the calling thread.
    pub fn load(&self) -> Result<LoadedAssets, LoadError> {
        let _span = tracing::info_span!("asset_load", model = %self.model.display()).entered();
        let start = Instant::now();

        let (baked_texture, texture_error) = match TextureData::load(&self.baked_texture) {
            Ok(texture) => {
                tracing::debug!(
                    width = texture.width,
                    height = texture.height,
                    "baked texture decoded"
                );
                (texture, None)
            }
            Err(e) => {
                tracing::warn!("baked texture failed, using placeholder: {e}");
                (TextureData::placeholder(), Some(e))
            }
        };
        let scene = SceneGraph::load(&self.model)?;

        let elapsed = start.elapsed();
        tracing::info!(
            nodes = scene.len(),
            triangles = scene.triangle_count(),
            ms = elapsed.as_secs_f32() * 1000.0,
            "scene assets loaded"
        );
        Ok(LoadedAssets {
            scene,
            baked_texture,
            texture_error,
            elapsed,
        })
    }
}

/// A single-shot background load, polled from the frame loop.
pub struct PendingLoad {
    rx: Receiver<Result<LoadedAssets, LoadError>>,
    finished: bool,
}

impl PendingLoad {
    /// Start loading `request` on a worker thread.
    pub fn spawn(request: AssetRequest) -> Self {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let spawned = std::thread::Builder::new()
            .name("asset-loader".into())
            .spawn(move || {
                let _ = tx.send(request.load());
            });
        if let Err(e) = spawned {
            tracing::error!("failed to spawn asset loader thread: {e}");
        }
        Self {
            rx,
            finished: false,
        }
    }

    /// Non-blocking: `Some` exactly once, when the load completes or fails.
    pub fn poll(&mut self) -> Option<Result<LoadedAssets, LoadError>> {
        if self.finished {
            return None;
        }
        match self.rx.try_recv() {
            Ok(result) => {
                self.finished = true;
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.finished = true;
                Some(Err(LoadError::Disconnected))
            }
        }
    }

    /// Block until the load completes.
    pub fn wait(self) -> Result<LoadedAssets, LoadError> {
        self.rx.recv().map_err(|_| LoadError::Disconnected)?
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TRIANGLE_GLTF;
    use std::io::Write;

    fn write_assets(dir: &std::path::Path) -> AssetRequest {
        let model = dir.join("school.gltf");
        std::fs::File::create(&model)
            .unwrap()
            .write_all(TRIANGLE_GLTF.as_bytes())
            .unwrap();
        let baked_texture = dir.join("baked.png");
        image::RgbaImage::from_pixel(4, 4, image::Rgba([200, 100, 50, 255]))
            .save(&baked_texture)
            .unwrap();
        AssetRequest {
            model,
            baked_texture,
        }
    }

    #[test]
    fn background_load_delivers_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut pending = PendingLoad::spawn(write_assets(dir.path()));

        let start = Instant::now();
        let result = loop {
            if let Some(r) = pending.poll() {
                break r;
            }
            assert!(start.elapsed() < Duration::from_secs(10), "load timed out");
            std::thread::sleep(Duration::from_millis(5));
        };
        let assets = result.unwrap();
        assert_eq!(assets.scene.len(), 3);
        assert_eq!(assets.baked_texture.width, 4);
        assert!(assets.texture_error.is_none());
        assert!(pending.is_finished());
        assert!(pending.poll().is_none());
    }

    #[test]
    fn missing_texture_still_delivers_model() {
        let dir = tempfile::tempdir().unwrap();
        let mut request = write_assets(dir.path());
        request.baked_texture = dir.path().join("missing.jpg");
        let assets = PendingLoad::spawn(request).wait().unwrap();
        assert_eq!(assets.scene.len(), 3);
        assert_eq!(assets.baked_texture, TextureData::placeholder());
        assert!(matches!(assets.texture_error, Some(LoadError::Io { .. })));
    }

    #[test]
    fn missing_model_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut request = write_assets(dir.path());
        request.model = dir.path().join("missing.glb");
        let err = PendingLoad::spawn(request).wait().unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}

use std::collections::BTreeMap;

use super::{ColmapCamera, ColmapError};

/// A sink mirroring the exported cameras and images, such as a COLMAP database.
///
/// Ids are always chosen by the exporter and passed in, so the registry and the
/// text model agree on every id.
pub trait ImageRegistry {
    /// Register a camera under the given id.
    fn add_camera(&mut self, camera: &ColmapCamera) -> Result<(), ColmapError>;

    /// Register an image under the given id.
    fn add_image(&mut self, image_id: u32, camera_id: u32, name: &str) -> Result<(), ColmapError>;
}

/// A registry keeping everything in memory.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct InMemoryRegistry {
    /// Cameras keyed by id.
    pub cameras: BTreeMap<u32, ColmapCamera>,
    /// Images keyed by id, as `(camera_id, name)`.
    pub images: BTreeMap<u32, (u32, String)>,
}

impl ImageRegistry for InMemoryRegistry {
    fn add_camera(&mut self, camera: &ColmapCamera) -> Result<(), ColmapError> {
        if self.cameras.contains_key(&camera.camera_id) {
            return Err(ColmapError::RegistryError(format!(
                "camera {} already registered",
                camera.camera_id
            )));
        }
        self.cameras.insert(camera.camera_id, camera.clone());
        Ok(())
    }

    fn add_image(&mut self, image_id: u32, camera_id: u32, name: &str) -> Result<(), ColmapError> {
        if !self.cameras.contains_key(&camera_id) {
            return Err(ColmapError::RegistryError(format!(
                "image {name} references unknown camera {camera_id}"
            )));
        }
        if self.images.contains_key(&image_id) {
            return Err(ColmapError::RegistryError(format!(
                "image {image_id} already registered"
            )));
        }
        self.images.insert(image_id, (camera_id, name.to_string()));
        Ok(())
    }
}

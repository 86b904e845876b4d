//! Drawable resources looked up by id.
//!
//! The table is a composition local: install one with `with_resources`, and
//! widgets resolve ids through `painter_resource`.

use std::collections::HashMap;
use std::rc::Rc;

use crate::{Error, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageHandle {
    pub id: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug, Default)]
pub struct ResourceTable {
    images: HashMap<String, (ImageHandle, Rc<[u8]>)>,
}

impl ResourceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an RGBA8 image. Zero-sized images or pixel buffers of the
    /// wrong length are rejected.
    pub fn register_image(
        &mut self,
        id: impl Into<String>,
        width: u32,
        height: u32,
        rgba: Vec<u8>,
    ) -> Result<ImageHandle> {
        let id = id.into();
        if width == 0 || height == 0 {
            return Err(Error::InvalidResource {
                id,
                reason: "zero-sized image".into(),
            });
        }
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(Error::InvalidResource {
                id,
                reason: format!("expected {expected} bytes, got {}", rgba.len()),
            });
        }
        let handle = ImageHandle {
            id: id.clone(),
            width,
            height,
        };
        self.images.insert(id, (handle.clone(), rgba.into()));
        Ok(handle)
    }

    pub fn image(&self, id: &str) -> Result<ImageHandle> {
        self.images
            .get(id)
            .map(|(h, _)| h.clone())
            .ok_or_else(|| Error::ResourceNotFound(id.to_string()))
    }

    pub fn pixels(&self, id: &str) -> Option<Rc<[u8]>> {
        self.images.get(id).map(|(_, px)| px.clone())
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

pub fn painter_resource(id: &str) -> Result<ImageHandle> {
    crate::locals::resources().image(id)
}

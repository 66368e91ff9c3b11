use crate::{
    device::{Device, DeviceError, GraphicsApi},
    id::{FramebufferId, GpuHandle},
};

/// Largest accepted width or height of an offscreen target.
pub const MAX_FRAMEBUFFER_SIZE: u32 = 8192;

/// Offscreen colour + depth/stencil target.
#[derive(Debug)]
pub struct Framebuffer {
    handle: GpuHandle,
    color: GpuHandle,
    depth_stencil: GpuHandle,
    width: u32,
    height: u32,
    complete: bool,
}

impl Framebuffer {
    pub fn handle(&self) -> GpuHandle {
        self.handle
    }

    /// Texture the UI layer displays.
    pub fn color_attachment(&self) -> GpuHandle {
        self.color
    }

    pub fn depth_stencil_attachment(&self) -> GpuHandle {
        self.depth_stencil
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub(crate) fn release(self, api: &dyn GraphicsApi) {
        api.delete_framebuffer(self.handle);
        api.delete_texture(self.color);
        api.delete_renderbuffer(self.depth_stencil);
    }
}

fn valid_size(width: u32, height: u32) -> bool {
    (1..=MAX_FRAMEBUFFER_SIZE).contains(&width) && (1..=MAX_FRAMEBUFFER_SIZE).contains(&height)
}

impl Device {
    /// An incomplete target is logged and still returned; check
    /// [`Framebuffer::is_complete`].
    pub fn create_framebuffer(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<FramebufferId, DeviceError> {
        let api = self.api();
        let color = api.create_color_texture(width, height)?;
        let depth_stencil = match api.create_depth_stencil(width, height) {
            Ok(depth_stencil) => depth_stencil,
            Err(err) => {
                api.delete_texture(color);
                return Err(err);
            }
        };
        let handle = match api.create_framebuffer(color, depth_stencil) {
            Ok(handle) => handle,
            Err(err) => {
                api.delete_texture(color);
                api.delete_renderbuffer(depth_stencil);
                return Err(err);
            }
        };

        let complete = api.framebuffer_complete(handle);
        if complete {
            tracing::debug!(width, height, "framebuffer created");
        } else {
            tracing::error!(width, height, "framebuffer is not complete");
        }

        Ok(self.framebuffers.insert(Framebuffer {
            handle,
            color,
            depth_stencil,
            width,
            height,
            complete,
        }))
    }

    pub fn framebuffer(&self, id: FramebufferId) -> Option<&Framebuffer> {
        self.framebuffers.get(id)
    }

    /// Redirects draws into the target and sets the viewport to its size.
    pub fn bind_framebuffer(&self, id: FramebufferId) {
        let Some(framebuffer) = self.framebuffers.get(id) else {
            tracing::warn!("bind of a destroyed framebuffer");
            return;
        };
        self.api().bind_framebuffer(Some(framebuffer.handle));
        self.viewport(framebuffer.width, framebuffer.height);
    }

    pub fn unbind_framebuffer(&self) {
        self.api().bind_framebuffer(None);
    }

    /// Reallocates both attachments in place. Sizes outside
    /// `1..=MAX_FRAMEBUFFER_SIZE` leave the target untouched.
    pub fn resize_framebuffer(&mut self, id: FramebufferId, width: u32, height: u32) {
        if !valid_size(width, height) {
            tracing::warn!(
                width,
                height,
                "attempted to resize framebuffer to invalid dimensions"
            );
            return;
        }
        let api = self.api.as_ref();
        let Some(framebuffer) = self.framebuffers.get_mut(id) else {
            tracing::warn!("resize of a destroyed framebuffer");
            return;
        };

        framebuffer.width = width;
        framebuffer.height = height;
        api.resize_color_texture(framebuffer.color, width, height);
        api.resize_depth_stencil(framebuffer.depth_stencil, width, height);
        tracing::debug!(width, height, "framebuffer resized");
    }

    pub fn destroy_framebuffer(&mut self, id: FramebufferId) {
        if let Some(framebuffer) = self.framebuffers.remove(id) {
            framebuffer.release(self.api());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{GpuCommand, HeadlessApi};

    #[test]
    fn create_allocates_complete_target() {
        let mut device = Device::new(HeadlessApi::new());
        let id = device.create_framebuffer(1280, 720).unwrap();
        let framebuffer = device.framebuffer(id).unwrap();

        assert!(framebuffer.is_complete());
        assert_eq!((framebuffer.width(), framebuffer.height()), (1280, 720));
    }

    #[test]
    fn zero_sized_target_is_returned_incomplete() {
        let mut device = Device::new(HeadlessApi::new());
        let id = device.create_framebuffer(0, 720).unwrap();
        assert!(!device.framebuffer(id).unwrap().is_complete());
    }

    #[test]
    fn invalid_resize_keeps_previous_size() {
        let api = HeadlessApi::new();
        let log = api.log();
        let mut device = Device::new(api);
        let id = device.create_framebuffer(1280, 720).unwrap();
        let start = log.len();

        device.resize_framebuffer(id, 0, 600);
        device.resize_framebuffer(id, 9000, 600);
        device.resize_framebuffer(id, 800, MAX_FRAMEBUFFER_SIZE + 1);

        let framebuffer = device.framebuffer(id).unwrap();
        assert_eq!((framebuffer.width(), framebuffer.height()), (1280, 720));
        assert!(log.since(start).is_empty());
    }

    #[test]
    fn resize_reallocates_both_attachments() {
        let api = HeadlessApi::new();
        let log = api.log();
        let mut device = Device::new(api);
        let id = device.create_framebuffer(1280, 720).unwrap();
        let (color, depth_stencil) = {
            let framebuffer = device.framebuffer(id).unwrap();
            (framebuffer.color_attachment(), framebuffer.depth_stencil_attachment())
        };

        device.resize_framebuffer(id, 800, 600);

        let framebuffer = device.framebuffer(id).unwrap();
        assert_eq!((framebuffer.width(), framebuffer.height()), (800, 600));
        let commands = log.commands();
        assert!(commands.contains(&GpuCommand::ResizeTexture {
            handle: color,
            width: 800,
            height: 600,
        }));
        assert!(commands.contains(&GpuCommand::ResizeRenderbuffer {
            handle: depth_stencil,
            width: 800,
            height: 600,
        }));
        assert!(device.api().framebuffer_complete(framebuffer.handle()));
    }

    #[test]
    fn bind_sets_viewport_to_target_size() {
        let api = HeadlessApi::new();
        let log = api.log();
        let mut device = Device::new(api);
        let id = device.create_framebuffer(640, 480).unwrap();

        device.bind_framebuffer(id);

        assert_eq!(
            log.commands().last(),
            Some(&GpuCommand::Viewport {
                x: 0,
                y: 0,
                width: 640,
                height: 480,
            })
        );
    }

    #[test]
    fn failed_depth_stencil_releases_color_texture() {
        let api = HeadlessApi::new().with_object_budget(1);
        let log = api.log();
        let mut device = Device::new(api);

        assert!(device.create_framebuffer(64, 64).is_err());
        assert_eq!(
            log.count(|command| matches!(command, GpuCommand::DeleteTexture(_))),
            1
        );
    }

    #[test]
    fn failed_framebuffer_releases_both_attachments() {
        let api = HeadlessApi::new().with_object_budget(2);
        let log = api.log();
        let mut device = Device::new(api);

        assert!(device.create_framebuffer(64, 64).is_err());
        drop(device);
        assert_eq!(
            log.count(|command| matches!(
                command,
                GpuCommand::DeleteTexture(_) | GpuCommand::DeleteRenderbuffer(_)
            )),
            2
        );
    }

    #[test]
    fn drop_releases_all_three_objects() {
        let api = HeadlessApi::new();
        let log = api.log();
        let mut device = Device::new(api);
        device.create_framebuffer(64, 64).unwrap();
        drop(device);

        assert_eq!(
            log.count(|command| matches!(
                command,
                GpuCommand::DeleteFramebuffer(_)
                    | GpuCommand::DeleteTexture(_)
                    | GpuCommand::DeleteRenderbuffer(_)
            )),
            3
        );
    }
}

#[cfg(test)]
thread_local! {
    static LIVE: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
}

/// Depth textures created on this thread and not yet destroyed.
#[cfg(test)]
pub(crate) fn live_depth_textures() -> usize {
    LIVE.with(|n| n.get())
}

/// Persistent depth/stencil attachment matching the color target size.
///
/// The stencil aspect is never used by the pipelines but the combined format
/// is the one every backend supports as a render attachment.
pub struct DepthTexture {
    view: wgpu::TextureView,
    texture: wgpu::Texture,
}

impl DepthTexture {
    /// Only one depth format is supported.
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

    /// Depth clear value: 1.0 is the far plane.
    pub const CLEAR_VALUE: f32 = 1.0;

    pub const STENCIL_CLEAR_VALUE: u32 = 0;

    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("ember depth texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("ember depth texture view"),
            format: Some(Self::FORMAT),
            dimension: Some(wgpu::TextureViewDimension::D2),
            aspect: wgpu::TextureAspect::All,
            base_mip_level: 0,
            mip_level_count: Some(1),
            base_array_layer: 0,
            array_layer_count: Some(1),
            ..Default::default()
        });

        log::debug!("depth texture created ({width}x{height}, {:?})", Self::FORMAT);
        #[cfg(test)]
        LIVE.with(|n| n.set(n.get() + 1));

        Self { view, texture }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn width(&self) -> u32 {
        self.texture.width()
    }

    pub fn height(&self) -> u32 {
        self.texture.height()
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.texture.format()
    }
}

impl Drop for DepthTexture {
    // Destroying frees GPU memory now instead of whenever the last handle goes away.
    fn drop(&mut self) {
        self.texture.destroy();
        #[cfg(test)]
        LIVE.with(|n| n.set(n.get() - 1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_device;

    #[test]
    fn format_is_combined_depth_stencil() {
        assert_eq!(DepthTexture::FORMAT, wgpu::TextureFormat::Depth24PlusStencil8);
        assert!(DepthTexture::FORMAT.has_depth_aspect());
        assert!(DepthTexture::FORMAT.has_stencil_aspect());
    }

    #[test]
    fn clear_value_is_far_plane() {
        assert_eq!(DepthTexture::CLEAR_VALUE, 1.0);
    }

    #[test]
    fn texture_matches_requested_size() {
        let Some((device, _queue)) = test_device() else {
            return;
        };
        let depth = DepthTexture::new(&device, 800, 600);
        assert_eq!(depth.width(), 800);
        assert_eq!(depth.height(), 600);
        assert_eq!(depth.format(), DepthTexture::FORMAT);
        assert!(depth
            .texture()
            .usage()
            .contains(wgpu::TextureUsages::RENDER_ATTACHMENT));
    }

    #[test]
    fn dropping_destroys_without_panicking() {
        let Some((device, _queue)) = test_device() else {
            return;
        };
        let before = live_depth_textures();
        let depth = DepthTexture::new(&device, 64, 64);
        assert_eq!(live_depth_textures(), before + 1);
        drop(depth);
        assert_eq!(live_depth_textures(), before);
        let _ = device.poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: None,
        });
    }
}

// surfbridge/src/platform/egl/extensions.rs
//
//! The display extensions and capabilities a display advertises to its clients.

/// Which client-facing display extensions are available.
///
/// Most fields mirror a native extension one-to-one; the rest are emulated by the display
/// itself and are set regardless of what the native implementation offers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DisplayExtensions {
    pub create_context_robustness: bool,
    pub post_sub_buffer: bool,
    pub presentation_time: bool,
    pub display_texture_share_group: bool,
    pub display_semaphore_share_group: bool,
    pub swap_buffers_with_damage: bool,
    pub image: bool,
    pub image_base: bool,
    pub gl_texture_2d_image: bool,
    pub gl_texture_cubemap_image: bool,
    pub gl_texture_3d_image: bool,
    pub gl_renderbuffer_image: bool,
    pub pixel_format_float: bool,
    pub gl_colorspace: bool,
    pub gl_colorspace_display_p3_linear: bool,
    pub gl_colorspace_display_p3: bool,
    pub gl_colorspace_scrgb: bool,
    pub gl_colorspace_scrgb_linear: bool,
    pub gl_colorspace_display_p3_passthrough: bool,
    pub image_gl_colorspace: bool,
    pub image_native_buffer: bool,
    pub get_frame_timestamps: bool,
    pub fence_sync: bool,
    pub wait_sync: bool,
    pub get_native_client_buffer_android: bool,
    pub create_native_client_buffer_android: bool,
    pub native_fence_sync_android: bool,
    pub no_config_context: bool,
    /// True when the driver supports surfaceless contexts or contexts are virtualized.
    pub surfaceless_context: bool,
    pub framebuffer_target_android: bool,
    pub image_dma_buf_import: bool,
    pub image_dma_buf_import_modifiers: bool,
    pub robustness_video_memory_purge_nv: bool,
    pub external_context_and_surface: bool,
}

/// Display capabilities.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DisplayCaps {
    /// Non-power-of-two textures are supported. Always true, since ES 2.0 is the minimum.
    pub texture_npot: bool,
}

// surfbridge/src/formats.rs
//
//! Sized internal formats and their properties.

/// Per-channel sizes and encoding of a sized internal format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatInfo {
    /// The sized internal format, e.g. `RGBA8`. `NONE` if unknown.
    pub internal_format: u32,
    pub red_bits: u32,
    pub green_bits: u32,
    pub blue_bits: u32,
    pub alpha_bits: u32,
    pub depth_bits: u32,
    pub stencil_bits: u32,
    /// `UNSIGNED_NORMALIZED`, `FLOAT`, `INT`, `UNSIGNED_INT`, or `NONE`.
    pub component_type: u32,
    /// `LINEAR` or `SRGB`.
    pub color_encoding: u32,
}

impl FormatInfo {
    /// The properties of an unknown or absent format: every size is zero.
    pub const NONE: FormatInfo = FormatInfo {
        internal_format: glow::NONE,
        red_bits: 0,
        green_bits: 0,
        blue_bits: 0,
        alpha_bits: 0,
        depth_bits: 0,
        stencil_bits: 0,
        component_type: glow::NONE,
        color_encoding: glow::LINEAR,
    };

    const fn color(internal_format: u32,
                   sizes: [u32; 4],
                   component_type: u32,
                   color_encoding: u32)
                   -> FormatInfo {
        FormatInfo {
            internal_format,
            red_bits: sizes[0],
            green_bits: sizes[1],
            blue_bits: sizes[2],
            alpha_bits: sizes[3],
            depth_bits: 0,
            stencil_bits: 0,
            component_type,
            color_encoding,
        }
    }

    const fn depth_stencil(internal_format: u32,
                           depth_bits: u32,
                           stencil_bits: u32,
                           component_type: u32)
                           -> FormatInfo {
        FormatInfo {
            internal_format,
            red_bits: 0,
            green_bits: 0,
            blue_bits: 0,
            alpha_bits: 0,
            depth_bits,
            stencil_bits,
            component_type,
            color_encoding: glow::LINEAR,
        }
    }

    /// Looks up the properties of a sized internal format.
    ///
    /// Unsized and unknown formats yield `FormatInfo::NONE` (with `internal_format` preserved).
    pub fn from_internal_format(internal_format: u32) -> FormatInfo {
        use glow::{FLOAT, LINEAR, SRGB, UNSIGNED_INT, UNSIGNED_NORMALIZED};

        match internal_format {
            glow::R8 => FormatInfo::color(glow::R8, [8, 0, 0, 0], UNSIGNED_NORMALIZED, LINEAR),
            glow::RG8 => FormatInfo::color(glow::RG8, [8, 8, 0, 0], UNSIGNED_NORMALIZED, LINEAR),
            glow::RGB8 => {
                FormatInfo::color(glow::RGB8, [8, 8, 8, 0], UNSIGNED_NORMALIZED, LINEAR)
            }
            glow::RGBA8 => {
                FormatInfo::color(glow::RGBA8, [8, 8, 8, 8], UNSIGNED_NORMALIZED, LINEAR)
            }
            glow::SRGB8_ALPHA8 => {
                FormatInfo::color(glow::SRGB8_ALPHA8, [8, 8, 8, 8], UNSIGNED_NORMALIZED, SRGB)
            }
            glow::RGB565 => {
                FormatInfo::color(glow::RGB565, [5, 6, 5, 0], UNSIGNED_NORMALIZED, LINEAR)
            }
            glow::RGB5_A1 => {
                FormatInfo::color(glow::RGB5_A1, [5, 5, 5, 1], UNSIGNED_NORMALIZED, LINEAR)
            }
            glow::RGBA4 => {
                FormatInfo::color(glow::RGBA4, [4, 4, 4, 4], UNSIGNED_NORMALIZED, LINEAR)
            }
            glow::RGB10_A2 => {
                FormatInfo::color(glow::RGB10_A2, [10, 10, 10, 2], UNSIGNED_NORMALIZED, LINEAR)
            }
            glow::RGBA16F => FormatInfo::color(glow::RGBA16F, [16, 16, 16, 16], FLOAT, LINEAR),
            glow::RGBA32F => FormatInfo::color(glow::RGBA32F, [32, 32, 32, 32], FLOAT, LINEAR),
            glow::DEPTH_COMPONENT16 => {
                FormatInfo::depth_stencil(glow::DEPTH_COMPONENT16, 16, 0, UNSIGNED_NORMALIZED)
            }
            glow::DEPTH_COMPONENT24 => {
                FormatInfo::depth_stencil(glow::DEPTH_COMPONENT24, 24, 0, UNSIGNED_NORMALIZED)
            }
            glow::DEPTH_COMPONENT32F => {
                FormatInfo::depth_stencil(glow::DEPTH_COMPONENT32F, 32, 0, FLOAT)
            }
            glow::DEPTH24_STENCIL8 => {
                FormatInfo::depth_stencil(glow::DEPTH24_STENCIL8, 24, 8, UNSIGNED_NORMALIZED)
            }
            glow::DEPTH32F_STENCIL8 => {
                FormatInfo::depth_stencil(glow::DEPTH32F_STENCIL8, 32, 8, FLOAT)
            }
            glow::STENCIL_INDEX8 => {
                FormatInfo::depth_stencil(glow::STENCIL_INDEX8, 0, 8, UNSIGNED_INT)
            }
            _ => FormatInfo { internal_format, ..FormatInfo::NONE },
        }
    }

    /// Picks the render target format for an RGB color buffer with the given channel sizes.
    ///
    /// Returns `None` for channel layouts that have no matching sized format.
    pub fn color_format_for_sizes(red: i32, green: i32, blue: i32, alpha: i32) -> Option<u32> {
        match (red, green, blue, alpha) {
            (8, 8, 8, 8) => Some(glow::RGBA8),
            (8, 8, 8, 0) => Some(glow::RGB8),
            (5, 6, 5, 0) => Some(glow::RGB565),
            (5, 5, 5, 1) => Some(glow::RGB5_A1),
            (4, 4, 4, 4) => Some(glow::RGBA4),
            (10, 10, 10, 2) => Some(glow::RGB10_A2),
            _ => None,
        }
    }

    /// Picks the depth/stencil format for the given buffer sizes.
    ///
    /// `(0, 0)` yields `ZERO`; unsupported combinations yield `None`.
    pub fn depth_stencil_format_for_sizes(depth: i32, stencil: i32) -> Option<u32> {
        match (depth, stencil) {
            (0, 0) => Some(glow::ZERO),
            (16, 0) => Some(glow::DEPTH_COMPONENT16),
            (24, 0) => Some(glow::DEPTH_COMPONENT24),
            (24, 8) => Some(glow::DEPTH24_STENCIL8),
            (0, 8) => Some(glow::STENCIL_INDEX8),
            _ => None,
        }
    }
}

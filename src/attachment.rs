// surfbridge/src/attachment.rs
//
//! Framebuffer attachment points and the images bound to them.
//!
//! A `FramebufferAttachment` records which image (a texture level/layer, a renderbuffer, or the
//! image of a window or pbuffer surface) is bound to one attachment point of a framebuffer. It
//! doesn't own the image: the resource is told about each binding through
//! `FramebufferAttachmentObject::on_attach()` and `on_detach()` and manages its own lifetime.

use crate::context::ContextID;
use crate::formats::FormatInfo;
use crate::Error;

use euclid::default::{Point2D, Size2D};
use std::any::Any;
use std::fmt::{self, Debug, Formatter};
use std::sync::{Arc, Mutex, Weak};

/// Identifies a subresource of a texture: a mip level plus, where relevant, a cube face or a
/// layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageIndex {
    /// The texture target. For cube maps, the face target (`TEXTURE_CUBE_MAP_POSITIVE_X`..).
    pub ty: u32,
    pub mip_index: i32,
    /// The layer for array and 3D textures, the face index for cube maps, otherwise
    /// `ENTIRE_LEVEL`.
    pub layer_index: i32,
}

impl ImageIndex {
    pub const ENTIRE_LEVEL: i32 = -1;

    /// An index that refers to nothing. Used by renderbuffer and surface attachments.
    #[inline]
    pub const fn invalid() -> ImageIndex {
        ImageIndex {
            ty: glow::NONE,
            mip_index: ImageIndex::ENTIRE_LEVEL,
            layer_index: ImageIndex::ENTIRE_LEVEL,
        }
    }

    #[inline]
    pub const fn make_2d(mip_index: i32) -> ImageIndex {
        ImageIndex { ty: glow::TEXTURE_2D, mip_index, layer_index: ImageIndex::ENTIRE_LEVEL }
    }

    /// `face` must be one of the six `TEXTURE_CUBE_MAP_*` face targets.
    #[inline]
    pub fn make_cube(face: u32, mip_index: i32) -> ImageIndex {
        debug_assert!(is_cube_map_face_target(face));
        ImageIndex {
            ty: face,
            mip_index,
            layer_index: (face - glow::TEXTURE_CUBE_MAP_POSITIVE_X) as i32,
        }
    }

    #[inline]
    pub const fn make_2d_array(mip_index: i32, layer_index: i32) -> ImageIndex {
        ImageIndex { ty: glow::TEXTURE_2D_ARRAY, mip_index, layer_index }
    }

    #[inline]
    pub const fn make_3d(mip_index: i32, layer_index: i32) -> ImageIndex {
        ImageIndex { ty: glow::TEXTURE_3D, mip_index, layer_index }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.ty != glow::NONE
    }

    #[inline]
    pub fn has_layer(&self) -> bool {
        self.layer_index != ImageIndex::ENTIRE_LEVEL
    }
}

impl Default for ImageIndex {
    #[inline]
    fn default() -> ImageIndex {
        ImageIndex::invalid()
    }
}

fn is_cube_map_face_target(target: u32) -> bool {
    (glow::TEXTURE_CUBE_MAP_POSITIVE_X..=glow::TEXTURE_CUBE_MAP_NEGATIVE_Z).contains(&target)
}

/// Where in a resource an attachment points: the binding point plus the image index.
///
/// Only meaningful while the attachment is attached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttachmentTarget {
    /// The attachment point, e.g. `COLOR_ATTACHMENT0`, `DEPTH_ATTACHMENT` or `BACK`.
    pub binding: u32,
    pub texture_index: ImageIndex,
}

impl AttachmentTarget {
    #[inline]
    pub fn new(binding: u32, texture_index: ImageIndex) -> AttachmentTarget {
        AttachmentTarget { binding, texture_index }
    }
}

impl Default for AttachmentTarget {
    #[inline]
    fn default() -> AttachmentTarget {
        AttachmentTarget { binding: glow::NONE, texture_index: ImageIndex::invalid() }
    }
}

/// What kind of resource is attached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttachmentType {
    None,
    Texture,
    Renderbuffer,
    /// The image of a window or pbuffer surface (a default framebuffer).
    Surface,
}

impl AttachmentType {
    /// The value `FRAMEBUFFER_ATTACHMENT_OBJECT_TYPE` reports for this attachment type.
    pub fn object_type(self) -> u32 {
        match self {
            AttachmentType::None => glow::NONE,
            AttachmentType::Texture => glow::TEXTURE,
            AttachmentType::Renderbuffer => glow::RENDERBUFFER,
            AttachmentType::Surface => glow::FRAMEBUFFER_DEFAULT,
        }
    }
}

/// How the views of a multiview attachment are laid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MultiviewLayout {
    None,
    /// Each view is a viewport-offset region of a single image.
    SideBySide,
    /// Each view is a layer of an array texture.
    Layered,
}

/// The native object and subresource that rendering to an attachment ends up targeting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderTarget {
    /// The native handle or GL object name of the resource.
    pub native_object: usize,
    pub binding: u32,
    pub image_index: ImageIndex,
}

/// Kinds of change a resource broadcasts to the objects observing it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubjectMessage {
    /// The image contents changed.
    ContentsChanged,
    /// The image storage (size, format, samples) changed.
    StorageChanged,
    /// The resource is going away.
    SubjectDestroyed,
}

/// An observer of a `DirtyChannel`.
pub trait DirtyReceiver: Send + Sync {
    fn on_subject_state_change(&self, message: SubjectMessage);
}

/// A broadcast channel that resources use to notify the framebuffers they are attached to.
///
/// Receivers are held weakly; receivers that have gone away are pruned on the next signal.
#[derive(Default)]
pub struct DirtyChannel {
    receivers: Mutex<Vec<Weak<dyn DirtyReceiver>>>,
}

impl DirtyChannel {
    #[inline]
    pub fn new() -> DirtyChannel {
        DirtyChannel::default()
    }

    pub fn subscribe(&self, receiver: &Arc<dyn DirtyReceiver>) {
        let mut receivers = lock(&self.receivers);
        if !receivers.iter().any(|existing| same_receiver(existing, receiver)) {
            receivers.push(Arc::downgrade(receiver));
        }
    }

    pub fn unsubscribe(&self, receiver: &Arc<dyn DirtyReceiver>) {
        lock(&self.receivers).retain(|existing| !same_receiver(existing, receiver));
    }

    /// Sends `message` to every live receiver.
    ///
    /// The receiver list is not locked while receivers run, so they may subscribe or
    /// unsubscribe from inside the callback.
    pub fn signal(&self, message: SubjectMessage) {
        let live: Vec<Arc<dyn DirtyReceiver>> = {
            let mut receivers = lock(&self.receivers);
            receivers.retain(|receiver| receiver.strong_count() > 0);
            receivers.iter().filter_map(Weak::upgrade).collect()
        };
        for receiver in live {
            receiver.on_subject_state_change(message);
        }
    }

    pub fn receiver_count(&self) -> usize {
        lock(&self.receivers).iter().filter(|receiver| receiver.strong_count() > 0).count()
    }
}

impl Debug for DirtyChannel {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "DirtyChannel({} receivers)", self.receiver_count())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn same_receiver(existing: &Weak<dyn DirtyReceiver>, receiver: &Arc<dyn DirtyReceiver>) -> bool {
    existing.as_ptr() as *const () == Arc::as_ptr(receiver) as *const ()
}

/// A resource whose images can be bound to a framebuffer attachment point: a texture, a
/// renderbuffer, or a surface.
pub trait FramebufferAttachmentObject: Any {
    /// The client-visible object name.
    fn id(&self) -> u32;

    /// Called when an attachment starts referring to this resource.
    fn on_attach(&self, context: ContextID);

    /// Called when an attachment stops referring to this resource.
    fn on_detach(&self, context: ContextID);

    fn attachment_size(&self, image_index: &ImageIndex) -> Size2D<i32>;

    fn attachment_format(&self, binding: u32, image_index: &ImageIndex) -> FormatInfo;

    fn attachment_samples(&self, image_index: &ImageIndex) -> i32;

    /// Resolves the native object that rendering to the given image targets.
    fn attachment_render_target(&self,
                                context: ContextID,
                                binding: u32,
                                image_index: &ImageIndex)
                                -> Result<RenderTarget, Error>;

    /// The channel this resource signals when its image changes.
    fn dirty_channel(&self) -> &DirtyChannel;

    fn as_any(&self) -> &dyn Any;
}

/// The binding of one framebuffer attachment point.
///
/// Created empty. `attach()` binds a resource; `detach()` (or attaching `None`) unbinds it.
/// An attachment must be detached before it is dropped, or a debug assertion fires.
///
/// Two attachments are equal when they refer to the same resource (by identity) with the same
/// type, multiview state, and, for textures, the same image index.
pub struct FramebufferAttachment {
    ty: AttachmentType,
    target: AttachmentTarget,
    resource: Option<Arc<dyn FramebufferAttachmentObject>>,
    num_views: i32,
    multiview_layout: MultiviewLayout,
    base_view_index: i32,
    viewport_offsets: Vec<Point2D<i32>>,
}

impl FramebufferAttachment {
    /// Returns an empty attachment.
    pub fn new() -> FramebufferAttachment {
        FramebufferAttachment {
            ty: AttachmentType::None,
            target: AttachmentTarget::default(),
            resource: None,
            num_views: 1,
            multiview_layout: MultiviewLayout::None,
            base_view_index: 0,
            viewport_offsets: vec![Point2D::zero()],
        }
    }

    /// Returns an attachment already bound to `resource`.
    pub fn with_resource(context: ContextID,
                         ty: AttachmentType,
                         binding: u32,
                         texture_index: ImageIndex,
                         resource: Arc<dyn FramebufferAttachmentObject>)
                         -> FramebufferAttachment {
        let mut attachment = FramebufferAttachment::new();
        attachment.attach(context, ty, binding, texture_index, Some(resource));
        attachment
    }

    /// Binds `resource` to this attachment point, replacing whatever was bound.
    ///
    /// The new resource is notified before the old one, so re-attaching the same resource never
    /// drops its attach count to zero. Passing `None` detaches.
    pub fn attach(&mut self,
                  context: ContextID,
                  ty: AttachmentType,
                  binding: u32,
                  texture_index: ImageIndex,
                  resource: Option<Arc<dyn FramebufferAttachmentObject>>) {
        let resource = match resource {
            None => return self.detach(context),
            Some(resource) => resource,
        };

        debug_assert_ne!(ty, AttachmentType::None);
        self.ty = ty;
        self.target = AttachmentTarget::new(binding, texture_index);
        resource.on_attach(context);

        if let Some(old_resource) = self.resource.take() {
            old_resource.on_detach(context);
        }

        self.resource = Some(resource);
    }

    /// Unbinds the resource, if any, and resets the multiview state.
    pub fn detach(&mut self, context: ContextID) {
        self.ty = AttachmentType::None;
        if let Some(resource) = self.resource.take() {
            resource.on_detach(context);
        }
        self.num_views = 1;
        self.multiview_layout = MultiviewLayout::None;
        self.base_view_index = 0;
        self.viewport_offsets.clear();
        self.viewport_offsets.push(Point2D::zero());
        self.target = AttachmentTarget::default();
    }

    /// Makes this a side-by-side multiview attachment with one view per viewport offset.
    pub fn set_multiview_side_by_side(&mut self, viewport_offsets: Vec<Point2D<i32>>) {
        debug_assert!(self.is_attached());
        debug_assert!(!viewport_offsets.is_empty());
        self.num_views = viewport_offsets.len() as i32;
        self.multiview_layout = MultiviewLayout::SideBySide;
        self.base_view_index = 0;
        self.viewport_offsets = viewport_offsets;
    }

    /// Makes this a layered multiview attachment over `num_views` layers starting at
    /// `base_view_index`.
    pub fn set_multiview_layered(&mut self, num_views: i32, base_view_index: i32) {
        debug_assert!(self.is_attached() && self.ty == AttachmentType::Texture);
        debug_assert!(num_views > 0);
        self.num_views = num_views;
        self.multiview_layout = MultiviewLayout::Layered;
        self.base_view_index = base_view_index;
        self.viewport_offsets = vec![Point2D::zero(); num_views as usize];
    }

    #[inline]
    pub fn attachment_type(&self) -> AttachmentType {
        self.ty
    }

    #[inline]
    pub fn is_attached(&self) -> bool {
        self.ty != AttachmentType::None
    }

    #[inline]
    pub fn target(&self) -> &AttachmentTarget {
        &self.target
    }

    #[inline]
    pub fn binding(&self) -> u32 {
        self.target.binding
    }

    /// The client-visible name of the attached resource, or 0 if nothing is attached.
    pub fn id(&self) -> u32 {
        self.resource.as_ref().map_or(0, |resource| resource.id())
    }

    pub fn texture_image_index(&self) -> &ImageIndex {
        debug_assert_eq!(self.ty, AttachmentType::Texture);
        &self.target.texture_index
    }

    /// The cube map face this attachment refers to, or `NONE` if it isn't a cube map face.
    pub fn cube_map_face(&self) -> u32 {
        debug_assert_eq!(self.ty, AttachmentType::Texture);
        let index = &self.target.texture_index;
        if is_cube_map_face_target(index.ty) {
            index.ty
        } else {
            glow::NONE
        }
    }

    pub fn mip_level(&self) -> i32 {
        debug_assert_eq!(self.ty, AttachmentType::Texture);
        self.target.texture_index.mip_index
    }

    /// The layer of an array or 3D texture attachment; 0 for every other kind of texture.
    pub fn layer(&self) -> i32 {
        debug_assert_eq!(self.ty, AttachmentType::Texture);
        let index = &self.target.texture_index;
        match index.ty {
            glow::TEXTURE_2D_ARRAY | glow::TEXTURE_3D => index.layer_index,
            _ => 0,
        }
    }

    #[inline]
    pub fn num_views(&self) -> i32 {
        self.num_views
    }

    #[inline]
    pub fn multiview_layout(&self) -> MultiviewLayout {
        self.multiview_layout
    }

    #[inline]
    pub fn base_view_index(&self) -> i32 {
        self.base_view_index
    }

    #[inline]
    pub fn multiview_viewport_offsets(&self) -> &[Point2D<i32>] {
        &self.viewport_offsets
    }

    /// The attached resource, whatever its type.
    #[inline]
    pub fn resource(&self) -> Option<&Arc<dyn FramebufferAttachmentObject>> {
        self.resource.as_ref()
    }

    /// The attached resource, if it is a texture.
    pub fn texture(&self) -> Option<&Arc<dyn FramebufferAttachmentObject>> {
        self.resource_of_type(AttachmentType::Texture)
    }

    /// The attached resource, if it is a renderbuffer.
    pub fn renderbuffer(&self) -> Option<&Arc<dyn FramebufferAttachmentObject>> {
        self.resource_of_type(AttachmentType::Renderbuffer)
    }

    /// The attached resource, if it is a surface.
    pub fn surface(&self) -> Option<&Arc<dyn FramebufferAttachmentObject>> {
        self.resource_of_type(AttachmentType::Surface)
    }

    /// Downcasts the attached resource to a concrete type.
    pub fn resource_as<T: FramebufferAttachmentObject>(&self) -> Option<&T> {
        self.resource.as_ref().and_then(|resource| resource.as_any().downcast_ref::<T>())
    }

    fn resource_of_type(&self, ty: AttachmentType)
                        -> Option<&Arc<dyn FramebufferAttachmentObject>> {
        if self.ty == ty {
            self.resource.as_ref()
        } else {
            None
        }
    }

    /// The format of the attached image, or `FormatInfo::NONE` if nothing is attached.
    pub fn format(&self) -> FormatInfo {
        match self.resource {
            Some(ref resource) => {
                resource.attachment_format(self.target.binding, &self.target.texture_index)
            }
            None => FormatInfo::NONE,
        }
    }

    #[inline]
    pub fn red_size(&self) -> u32 {
        self.format().red_bits
    }

    #[inline]
    pub fn green_size(&self) -> u32 {
        self.format().green_bits
    }

    #[inline]
    pub fn blue_size(&self) -> u32 {
        self.format().blue_bits
    }

    #[inline]
    pub fn alpha_size(&self) -> u32 {
        self.format().alpha_bits
    }

    #[inline]
    pub fn depth_size(&self) -> u32 {
        self.format().depth_bits
    }

    #[inline]
    pub fn stencil_size(&self) -> u32 {
        self.format().stencil_bits
    }

    #[inline]
    pub fn component_type(&self) -> u32 {
        self.format().component_type
    }

    #[inline]
    pub fn color_encoding(&self) -> u32 {
        self.format().color_encoding
    }

    pub fn size(&self) -> Size2D<i32> {
        match self.resource {
            Some(ref resource) => resource.attachment_size(&self.target.texture_index),
            None => Size2D::zero(),
        }
    }

    pub fn samples(&self) -> i32 {
        match self.resource {
            Some(ref resource) => resource.attachment_samples(&self.target.texture_index),
            None => 0,
        }
    }

    /// Resolves the native render target of the attached image.
    pub fn render_target(&self, context: ContextID) -> Result<RenderTarget, Error> {
        let resource = self.resource.as_ref().ok_or(Error::NotAttached)?;
        resource.attachment_render_target(context, self.target.binding, &self.target.texture_index)
    }
}

impl Default for FramebufferAttachment {
    #[inline]
    fn default() -> FramebufferAttachment {
        FramebufferAttachment::new()
    }
}

impl PartialEq for FramebufferAttachment {
    fn eq(&self, other: &FramebufferAttachment) -> bool {
        let same_resource = match (&self.resource, &other.resource) {
            (Some(a), Some(b)) => Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const (),
            (None, None) => true,
            _ => false,
        };
        if !same_resource ||
                self.ty != other.ty ||
                self.num_views != other.num_views ||
                self.multiview_layout != other.multiview_layout ||
                self.base_view_index != other.base_view_index ||
                self.viewport_offsets != other.viewport_offsets {
            return false;
        }

        self.ty != AttachmentType::Texture ||
            self.target.texture_index == other.target.texture_index
    }
}

impl Debug for FramebufferAttachment {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("FramebufferAttachment")
         .field("type", &self.ty)
         .field("target", &self.target)
         .field("id", &self.id())
         .field("num_views", &self.num_views)
         .field("multiview_layout", &self.multiview_layout)
         .finish()
    }
}

impl Drop for FramebufferAttachment {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            debug_assert!(!self.is_attached(), "Must detach the attachment before dropping it!");
        }
    }
}
